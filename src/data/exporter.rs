use anyhow::{anyhow, Result};
use rust_xlsxwriter::Workbook;
use std::path::Path;
use tracing::info;

use crate::data::data_view::DataView;
use crate::data::datatable::{DataTable, DataValue};
use crate::data::file_format::FileFormat;

/// An export result held fully in memory: the serialized bytes, the derived
/// output filename, and the content type a download would carry.
#[derive(Debug, Clone)]
pub struct ExportArtifact {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: &'static str,
}

impl ExportArtifact {
    /// Write the buffer to `dir`, returning the full path.
    pub fn save_to_dir<P: AsRef<Path>>(&self, dir: P) -> Result<std::path::PathBuf> {
        let path = dir.as_ref().join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

/// Serializes projected tables into downloadable byte buffers
pub struct Exporter;

impl Exporter {
    /// Export a projected view to the target format. The output filename is
    /// the source filename with its extension swapped for the target's.
    pub fn export(view: &DataView, format: FileFormat) -> Result<ExportArtifact> {
        let table = view.materialize();
        Self::export_table(&table, format)
    }

    pub fn export_table(table: &DataTable, format: FileFormat) -> Result<ExportArtifact> {
        if table.row_count() == 0 {
            return Err(anyhow!("No data to export"));
        }

        let bytes = match format {
            FileFormat::Csv => Self::to_csv_bytes(table),
            FileFormat::Xlsx => Self::to_xlsx_bytes(table)?,
        };

        let source_name = table
            .source_file
            .clone()
            .unwrap_or_else(|| format!("{}.{}", table.name, format.extension()));
        let file_name = derive_output_name(&source_name, format);

        info!(
            target: "export",
            "Exported {} rows to {} ({} bytes)",
            table.row_count(),
            file_name,
            bytes.len()
        );

        Ok(ExportArtifact {
            bytes,
            file_name,
            content_type: format.content_type(),
        })
    }

    /// Comma-separated with a header row and no row-index column.
    fn to_csv_bytes(table: &DataTable) -> Vec<u8> {
        let mut out = String::new();

        let headers: Vec<String> = table
            .column_names()
            .iter()
            .map(|h| escape_csv_field(h))
            .collect();
        out.push_str(&headers.join(","));
        out.push('\n');

        for row_data in table.to_string_table() {
            let row: Vec<String> = row_data.iter().map(|s| escape_csv_field(s)).collect();
            out.push_str(&row.join(","));
            out.push('\n');
        }

        out.into_bytes()
    }

    /// Single worksheet with a header row and no row-index column. Numbers
    /// and booleans keep their types; everything else is written as text.
    fn to_xlsx_bytes(table: &DataTable) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();

        for (col_idx, name) in table.column_names().iter().enumerate() {
            worksheet.write_string(0, col_idx as u16, name.as_str())?;
        }

        for (row_idx, row) in table.rows.iter().enumerate() {
            let sheet_row = (row_idx + 1) as u32;
            for (col_idx, value) in row.values.iter().enumerate() {
                let col = col_idx as u16;
                match value {
                    DataValue::Integer(i) => {
                        worksheet.write_number(sheet_row, col, *i as f64)?;
                    }
                    DataValue::Float(f) => {
                        worksheet.write_number(sheet_row, col, *f)?;
                    }
                    DataValue::Boolean(b) => {
                        worksheet.write_boolean(sheet_row, col, *b)?;
                    }
                    DataValue::Null => {}
                    other => {
                        worksheet.write_string(sheet_row, col, other.to_string())?;
                    }
                }
            }
        }

        Ok(workbook.save_to_buffer()?)
    }
}

/// Swap the filename's extension for the target format's canonical one.
pub fn derive_output_name(source_name: &str, format: FileFormat) -> String {
    Path::new(source_name)
        .with_extension(format.extension())
        .file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.to_string())
        .unwrap_or_else(|| format!("export.{}", format.extension()))
}

/// Escape CSV fields that contain special characters
fn escape_csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        // Escape quotes by doubling them and wrap field in quotes
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::csv_loader::CsvLoader;
    use std::sync::Arc;

    fn sample_table() -> DataTable {
        let mut table = CsvLoader::load_bytes(b"id,value\n1,5\n2,7\n", "data").unwrap();
        table.source_file = Some("data.csv".to_string());
        table
    }

    #[test]
    fn test_csv_export_has_header_and_no_index() {
        let artifact =
            Exporter::export_table(&sample_table(), FileFormat::Csv).unwrap();
        let text = String::from_utf8(artifact.bytes).unwrap();
        assert_eq!(text, "id,value\n1,5\n2,7\n");
        assert_eq!(artifact.file_name, "data.csv");
        assert_eq!(artifact.content_type, "text/csv");
    }

    #[test]
    fn test_fields_with_commas_are_quoted() {
        assert_eq!(escape_csv_field("a,b"), "\"a,b\"");
        assert_eq!(escape_csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_csv_field("plain"), "plain");
    }

    #[test]
    fn test_xlsx_export_names_and_mime() {
        let artifact =
            Exporter::export_table(&sample_table(), FileFormat::Xlsx).unwrap();
        assert_eq!(artifact.file_name, "data.xlsx");
        assert_eq!(
            artifact.content_type,
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        // XLSX containers are zip archives
        assert_eq!(&artifact.bytes[0..2], b"PK");
    }

    #[test]
    fn test_empty_table_is_an_error() {
        let table = CsvLoader::load_bytes(b"a,b\n", "empty").unwrap();
        assert!(Exporter::export_table(&table, FileFormat::Csv).is_err());
    }

    #[test]
    fn test_projection_flows_through_export() {
        let view = DataView::new(Arc::new(sample_table()))
            .with_column_names(&["value".to_string()]);
        let artifact = Exporter::export(&view, FileFormat::Csv).unwrap();
        let text = String::from_utf8(artifact.bytes).unwrap();
        assert_eq!(text, "value\n5\n7\n");
    }

    #[test]
    fn test_output_name_swaps_extension_only() {
        assert_eq!(derive_output_name("data.csv", FileFormat::Xlsx), "data.xlsx");
        assert_eq!(
            derive_output_name("csv_report.csv", FileFormat::Xlsx),
            "csv_report.xlsx"
        );
        assert_eq!(
            derive_output_name("dir/nested.xlsx", FileFormat::Csv),
            "nested.csv"
        );
    }
}
