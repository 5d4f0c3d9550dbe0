/// XLSX workbook to DataTable loader. Only the first worksheet is read.
use crate::data::datatable::{DataColumn, DataRow, DataTable, DataValue};
use crate::data::file_format::IngestError;
use calamine::{Data, Reader, Xlsx};
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tracing::info;

pub struct ExcelLoader;

impl ExcelLoader {
    /// Decode XLSX bytes into a DataTable. The first row of the first sheet
    /// supplies the column names.
    pub fn load_bytes(bytes: &[u8], table_name: &str) -> Result<DataTable, IngestError> {
        let cursor = Cursor::new(bytes);
        let mut workbook: Xlsx<_> =
            Xlsx::new(cursor).map_err(|e| decode_err(table_name, &e))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| IngestError::Decode {
                file: table_name.to_string(),
                message: "No worksheet found".to_string(),
            })?
            .map_err(|e| decode_err(table_name, &e))?;

        let mut table = DataTable::new(table_name);
        let mut rows = range.rows();

        if let Some(header_row) = rows.next() {
            for cell in header_row {
                table.add_column(DataColumn::new(cell.to_string()));
            }

            for row in rows {
                let values: Vec<DataValue> = row.iter().map(cell_to_value).collect();
                table.add_row(DataRow::new(values)).map_err(|msg| {
                    IngestError::Decode {
                        file: table_name.to_string(),
                        message: msg,
                    }
                })?;
            }
        }

        table.infer_column_types();

        info!(
            target: "ingest",
            "XLSX load complete: {} rows, {} columns",
            table.row_count(),
            table.column_count()
        );

        Ok(table)
    }

    /// Load an XLSX file from disk, recording source filename and size.
    pub fn load_path<P: AsRef<Path>>(path: P) -> Result<DataTable, IngestError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.xlsx")
            .to_string();

        let bytes = fs::read(path).map_err(|e| decode_err(&name, &e))?;
        let size = bytes.len() as u64;

        let mut table = Self::load_bytes(&bytes, &name)?;
        table.source_file = Some(name);
        table.source_size = Some(size);
        Ok(table)
    }
}

/// Map a calamine cell to a DataValue. Integral floats come back as
/// integers because the workbook format stores all numbers as doubles.
fn cell_to_value(cell: &Data) -> DataValue {
    match cell {
        Data::Empty => DataValue::Null,
        Data::Int(i) => DataValue::Integer(*i),
        Data::Float(f) => {
            if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                DataValue::Integer(*f as i64)
            } else {
                DataValue::Float(*f)
            }
        }
        Data::Bool(b) => DataValue::Boolean(*b),
        Data::String(s) => {
            if s.is_empty() {
                DataValue::Null
            } else {
                DataValue::String(s.clone())
            }
        }
        Data::DateTime(_) => DataValue::DateTime(cell.to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => DataValue::DateTime(s.clone()),
        Data::Error(e) => DataValue::String(format!("{:?}", e)),
    }
}

fn decode_err(file: &str, err: &dyn std::fmt::Display) -> IngestError {
    IngestError::Decode {
        file: file.to_string(),
        message: err.to_string(),
    }
}
