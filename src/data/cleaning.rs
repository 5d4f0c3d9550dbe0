use crate::data::datatable::{DataTable, DataType, DataValue};
use std::collections::HashSet;
use tracing::debug;

/// A cleaning transform applied in place to a table.
///
/// Sessions hold an explicit ordered list of these and always recompute the
/// working table from the pristine load, so the result never depends on
/// which UI control happened to fire first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleaningOp {
    RemoveDuplicates,
    FillMissingNumeric,
}

impl CleaningOp {
    pub fn label(&self) -> &'static str {
        match self {
            CleaningOp::RemoveDuplicates => "Remove duplicates",
            CleaningOp::FillMissingNumeric => "Fill missing values",
        }
    }
}

/// Apply a list of cleaning ops in order.
pub fn apply_ops(table: &mut DataTable, ops: &[CleaningOp]) {
    for op in ops {
        apply_op(table, *op);
    }
}

pub fn apply_op(table: &mut DataTable, op: CleaningOp) {
    match op {
        CleaningOp::RemoveDuplicates => remove_duplicates(table),
        CleaningOp::FillMissingNumeric => fill_missing_numeric(table),
    }
}

/// Delete rows that exactly duplicate an earlier row across all columns,
/// keeping the first occurrence and the relative order of survivors.
/// Reapplying to an already-deduplicated table is a no-op.
pub fn remove_duplicates(table: &mut DataTable) {
    let before = table.row_count();
    let mut seen = HashSet::with_capacity(before);
    table.rows.retain(|row| seen.insert(row.key_string()));

    let removed = before - table.row_count();
    if removed > 0 {
        debug!(target: "clean", "Removed {} duplicate rows from '{}'", removed, table.name);
        // Null counts may have changed with the dropped rows
        table.infer_column_types();
    }
}

/// Replace null cells in numeric columns with the arithmetic mean of the
/// column's non-null values. Non-numeric columns are untouched. A numeric
/// column that is entirely null has no defined mean and is left as-is.
pub fn fill_missing_numeric(table: &mut DataTable) {
    let numeric_cols = table.numeric_column_indices();
    let mut filled_any = false;

    for col_idx in numeric_cols {
        let mut sum = 0.0;
        let mut count = 0usize;
        for row in &table.rows {
            if let Some(v) = row.get(col_idx).and_then(|v| v.as_f64()) {
                sum += v;
                count += 1;
            }
        }

        if count == 0 {
            // Mean undefined, leave the column missing
            continue;
        }

        let mean = sum / count as f64;
        let fill = mean_fill_value(&table.columns[col_idx].data_type, mean);

        for row in &mut table.rows {
            if let Some(cell) = row.get_mut(col_idx) {
                if cell.is_null() {
                    *cell = fill.clone();
                    filled_any = true;
                }
            }
        }
    }

    if filled_any {
        debug!(target: "clean", "Filled missing numeric values in '{}'", table.name);
        // Integer columns may have widened to Float, null counts drop to zero
        table.infer_column_types();
    }
}

/// An integral mean in an integer column stays an integer; anything else
/// widens the column to Float.
fn mean_fill_value(column_type: &DataType, mean: f64) -> DataValue {
    if *column_type == DataType::Integer && mean.fract() == 0.0 {
        DataValue::Integer(mean as i64)
    } else {
        DataValue::Float(mean)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::datatable::{DataColumn, DataRow};

    fn table_of(rows: Vec<Vec<DataValue>>, cols: &[&str]) -> DataTable {
        let mut table = DataTable::new("test");
        for c in cols {
            table.add_column(DataColumn::new(*c));
        }
        for r in rows {
            table.add_row(DataRow::new(r)).unwrap();
        }
        table.infer_column_types();
        table
    }

    #[test]
    fn test_remove_duplicates_keeps_first_and_order() {
        let mut table = table_of(
            vec![
                vec![DataValue::Integer(1), DataValue::String("a".into())],
                vec![DataValue::Integer(2), DataValue::String("b".into())],
                vec![DataValue::Integer(1), DataValue::String("a".into())],
                vec![DataValue::Integer(3), DataValue::String("c".into())],
            ],
            &["id", "label"],
        );

        remove_duplicates(&mut table);

        assert_eq!(table.row_count(), 3);
        assert_eq!(table.get_value(0, 0), Some(&DataValue::Integer(1)));
        assert_eq!(table.get_value(1, 0), Some(&DataValue::Integer(2)));
        assert_eq!(table.get_value(2, 0), Some(&DataValue::Integer(3)));
    }

    #[test]
    fn test_remove_duplicates_is_idempotent() {
        let mut table = table_of(
            vec![
                vec![DataValue::Integer(1)],
                vec![DataValue::Integer(1)],
                vec![DataValue::Integer(2)],
            ],
            &["id"],
        );

        remove_duplicates(&mut table);
        let once = table.clone();
        remove_duplicates(&mut table);

        assert_eq!(table.rows, once.rows);
    }

    #[test]
    fn test_rows_differing_only_in_null_are_not_duplicates() {
        let mut table = table_of(
            vec![
                vec![DataValue::Integer(1), DataValue::Null],
                vec![DataValue::Integer(1), DataValue::String(String::new())],
            ],
            &["id", "note"],
        );

        remove_duplicates(&mut table);
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_cells_embedding_the_key_separator_are_not_duplicates() {
        let mut table = table_of(
            vec![
                vec![
                    DataValue::String("x\u{1f}s:y".into()),
                    DataValue::String("z".into()),
                ],
                vec![
                    DataValue::String("x".into()),
                    DataValue::String("y\u{1f}s:z".into()),
                ],
            ],
            &["a", "b"],
        );

        remove_duplicates(&mut table);
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_fill_missing_uses_column_mean() {
        let mut table = table_of(
            vec![
                vec![DataValue::Integer(2)],
                vec![DataValue::Null],
                vec![DataValue::Integer(4)],
            ],
            &["value"],
        );

        fill_missing_numeric(&mut table);

        // Mean of {2, 4} is 3, integral so it stays an integer
        assert_eq!(table.get_value(1, 0), Some(&DataValue::Integer(3)));
        assert_eq!(table.columns[0].null_count, 0);
    }

    #[test]
    fn test_fill_missing_widens_to_float_when_mean_is_fractional() {
        let mut table = table_of(
            vec![
                vec![DataValue::Integer(1)],
                vec![DataValue::Integer(2)],
                vec![DataValue::Null],
            ],
            &["value"],
        );

        fill_missing_numeric(&mut table);

        assert_eq!(table.get_value(2, 0), Some(&DataValue::Float(1.5)));
        assert_eq!(table.columns[0].data_type, DataType::Float);
    }

    #[test]
    fn test_fill_preserves_column_mean() {
        let mut table = table_of(
            vec![
                vec![DataValue::Float(1.0)],
                vec![DataValue::Null],
                vec![DataValue::Float(3.0)],
                vec![DataValue::Null],
            ],
            &["value"],
        );

        fill_missing_numeric(&mut table);

        let values: Vec<f64> = table
            .rows
            .iter()
            .filter_map(|r| r.get(0).and_then(|v| v.as_f64()))
            .collect();
        assert_eq!(values.len(), 4);
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        assert_eq!(mean, 2.0);
    }

    #[test]
    fn test_entirely_missing_column_is_left_missing() {
        // Column is all-null, so its type infers as Null and the mean is
        // undefined; the cells stay null.
        let mut table = table_of(
            vec![vec![DataValue::Null], vec![DataValue::Null]],
            &["value"],
        );

        fill_missing_numeric(&mut table);

        assert_eq!(table.get_value(0, 0), Some(&DataValue::Null));
        assert_eq!(table.get_value(1, 0), Some(&DataValue::Null));
    }

    #[test]
    fn test_non_numeric_columns_untouched() {
        let mut table = table_of(
            vec![
                vec![DataValue::String("a".into()), DataValue::Integer(1)],
                vec![DataValue::Null, DataValue::Null],
            ],
            &["label", "value"],
        );

        fill_missing_numeric(&mut table);

        assert_eq!(table.get_value(1, 0), Some(&DataValue::Null));
        assert_eq!(table.get_value(1, 1), Some(&DataValue::Integer(1)));
    }

    #[test]
    fn test_ops_apply_in_list_order() {
        // Dedup first, then fill: the duplicate (1,5) must not weight the mean
        let mut table = table_of(
            vec![
                vec![DataValue::Integer(1), DataValue::Integer(5)],
                vec![DataValue::Integer(1), DataValue::Integer(5)],
                vec![DataValue::Integer(2), DataValue::Null],
            ],
            &["id", "value"],
        );

        apply_ops(
            &mut table,
            &[CleaningOp::RemoveDuplicates, CleaningOp::FillMissingNumeric],
        );

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.get_value(1, 1), Some(&DataValue::Integer(5)));
    }
}
