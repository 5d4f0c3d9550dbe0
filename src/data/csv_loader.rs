/// Delimited-text (CSV) to DataTable loader
use crate::data::datatable::{DataColumn, DataRow, DataTable, DataValue};
use crate::data::file_format::IngestError;
use std::fs;
use std::path::Path;
use tracing::info;

pub struct CsvLoader;

impl CsvLoader {
    /// Decode CSV bytes into a DataTable. The first record is the header row
    /// and supplies the column names.
    pub fn load_bytes(bytes: &[u8], table_name: &str) -> Result<DataTable, IngestError> {
        let mut reader = csv::Reader::from_reader(bytes);

        let headers = reader
            .headers()
            .map_err(|e| decode_err(table_name, &e))?
            .clone();

        let mut table = DataTable::new(table_name);
        for header in headers.iter() {
            table.add_column(DataColumn::new(header.to_string()));
        }

        for result in reader.records() {
            let record = result.map_err(|e| decode_err(table_name, &e))?;
            let mut values = Vec::with_capacity(headers.len());
            for field in record.iter() {
                values.push(DataValue::from_string(field));
            }
            // Ragged records are a decode failure, not something to paper over
            table.add_row(DataRow::new(values)).map_err(|msg| {
                IngestError::Decode {
                    file: table_name.to_string(),
                    message: msg,
                }
            })?;
        }

        table.infer_column_types();

        info!(
            target: "ingest",
            "CSV load complete: {} rows, {} columns, ~{} KB",
            table.row_count(),
            table.column_count(),
            table.estimate_memory_size() / 1024
        );

        Ok(table)
    }

    /// Load a CSV file from disk, recording source filename and size.
    pub fn load_path<P: AsRef<Path>>(path: P) -> Result<DataTable, IngestError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.csv")
            .to_string();

        let bytes = fs::read(path).map_err(|e| decode_err(&name, &e))?;
        let size = bytes.len() as u64;

        let mut table = Self::load_bytes(&bytes, &name)?;
        table.source_file = Some(name);
        table.source_size = Some(size);
        Ok(table)
    }
}

fn decode_err(file: &str, err: &dyn std::fmt::Display) -> IngestError {
    IngestError::Decode {
        file: file.to_string(),
        message: err.to_string(),
    }
}
