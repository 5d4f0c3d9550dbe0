use std::sync::Arc;

use crate::data::datatable::{DataColumn, DataRow, DataTable, DataValue};

/// A projection over a DataTable that exposes a subset of columns without
/// modifying the underlying data. Row order and row count are untouched.
#[derive(Clone)]
pub struct DataView {
    /// The underlying immutable data source
    source: Arc<DataTable>,

    /// Column indices that are visible, in selection order
    visible_columns: Vec<usize>,
}

impl DataView {
    /// Create a new view showing all columns of the table.
    pub fn new(source: Arc<DataTable>) -> Self {
        let col_count = source.column_count();
        Self {
            source,
            visible_columns: (0..col_count).collect(),
        }
    }

    /// Restrict the view to the named columns, in the given order. Names not
    /// present in the source are ignored, so the selection is always
    /// constrained to the table's current column set.
    pub fn with_column_names(mut self, names: &[String]) -> Self {
        self.visible_columns = names
            .iter()
            .filter_map(|name| self.source.get_column_index(name))
            .collect();
        self
    }

    pub fn row_count(&self) -> usize {
        self.source.row_count()
    }

    pub fn column_count(&self) -> usize {
        self.visible_columns.len()
    }

    pub fn column_names(&self) -> Vec<String> {
        self.visible_columns
            .iter()
            .filter_map(|&idx| self.source.columns.get(idx).map(|c| c.name.clone()))
            .collect()
    }

    /// Visible columns whose inferred type is numeric, in view order.
    pub fn numeric_columns(&self) -> Vec<&DataColumn> {
        self.visible_columns
            .iter()
            .filter_map(|&idx| self.source.columns.get(idx))
            .filter(|c| c.data_type.is_numeric())
            .collect()
    }

    /// Get a row with only the visible columns.
    pub fn get_row(&self, index: usize) -> Option<DataRow> {
        if index >= self.source.row_count() {
            return None;
        }

        let mut values = Vec::with_capacity(self.visible_columns.len());
        for &col_idx in &self.visible_columns {
            let value = self
                .source
                .get_value(index, col_idx)
                .cloned()
                .unwrap_or(DataValue::Null);
            values.push(value);
        }

        Some(DataRow::new(values))
    }

    /// Get a row rendered as strings (for display).
    pub fn get_row_as_strings(&self, index: usize) -> Option<Vec<String>> {
        self.get_row(index)
            .map(|row| row.values.iter().map(|v| v.to_string()).collect())
    }

    /// Numeric values of a visible column, nulls skipped, for charting.
    pub fn numeric_values(&self, column_name: &str) -> Vec<(usize, f64)> {
        let Some(col_idx) = self.source.get_column_index(column_name) else {
            return Vec::new();
        };
        if !self.visible_columns.contains(&col_idx) {
            return Vec::new();
        }

        self.source
            .rows
            .iter()
            .enumerate()
            .filter_map(|(row_idx, row)| {
                row.get(col_idx).and_then(|v| v.as_f64()).map(|v| (row_idx, v))
            })
            .collect()
    }

    /// Copy the projection out into an owned table (for export).
    pub fn materialize(&self) -> DataTable {
        let mut table = DataTable::new(self.source.name.clone());
        table.source_file = self.source.source_file.clone();
        table.source_size = self.source.source_size;

        for &col_idx in &self.visible_columns {
            if let Some(col) = self.source.columns.get(col_idx) {
                table.add_column(col.clone());
            }
        }

        for index in 0..self.source.row_count() {
            if let Some(row) = self.get_row(index) {
                // Width always matches the projected columns
                let _ = table.add_row(row);
            }
        }

        table
    }

    pub fn source(&self) -> &DataTable {
        &self.source
    }
}
