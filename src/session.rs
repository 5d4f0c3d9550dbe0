use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::data::cleaning::{self, CleaningOp};
use crate::data::csv_loader::CsvLoader;
use crate::data::data_view::DataView;
use crate::data::datatable::DataTable;
use crate::data::excel_loader::ExcelLoader;
use crate::data::exporter::{ExportArtifact, Exporter};
use crate::data::file_format::{FileFormat, IngestError};

/// A file as handed to the pipeline: raw bytes plus identity.
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn from_path<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload")
            .to_string();
        let bytes = std::fs::read(path)?;
        Ok(Self { name, bytes })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Decode one uploaded file into a table based on its extension.
pub fn ingest(file: &UploadedFile) -> Result<DataTable, IngestError> {
    let format = FileFormat::from_file_name(&file.name)?;
    let mut table = match format {
        FileFormat::Csv => CsvLoader::load_bytes(&file.bytes, &file.name)?,
        FileFormat::Xlsx => ExcelLoader::load_bytes(&file.bytes, &file.name)?,
    };
    table.source_file = Some(file.name.clone());
    table.source_size = Some(file.size());
    Ok(table)
}

/// Per-file pipeline state. Each input file gets its own session: pristine
/// table, ordered cleaning ops, column selection, chart toggle, and export
/// format. Sessions never share state, so N files are processed
/// independently instead of the last one winning.
pub struct FileSession {
    pub file_name: String,
    pub file_size: u64,

    /// The table exactly as decoded; never mutated after load
    pristine: Arc<DataTable>,

    /// Cleaning ops in application order; the UI toggles membership
    pub ops: Vec<CleaningOp>,

    /// Selected column names, in selection order; defaults to all
    pub selection: Vec<String>,

    pub show_chart: bool,
    pub export_format: FileFormat,
}

impl FileSession {
    pub fn new(table: DataTable) -> Self {
        let file_name = table
            .source_file
            .clone()
            .unwrap_or_else(|| table.name.clone());
        let file_size = table.source_size.unwrap_or(0);
        let selection = table.column_names();

        // Default target is the format the file did not arrive in
        let export_format = match FileFormat::from_file_name(&file_name) {
            Ok(FileFormat::Csv) => FileFormat::Xlsx,
            _ => FileFormat::Csv,
        };

        Self {
            file_name,
            file_size,
            pristine: Arc::new(table),
            ops: Vec::new(),
            selection,
            show_chart: false,
            export_format,
        }
    }

    pub fn pristine(&self) -> &DataTable {
        &self.pristine
    }

    /// Toggle a cleaning op: absent ops are appended, present ops removed.
    /// The list order is the application order.
    pub fn toggle_op(&mut self, op: CleaningOp) {
        if let Some(pos) = self.ops.iter().position(|o| *o == op) {
            self.ops.remove(pos);
        } else {
            self.ops.push(op);
        }
    }

    pub fn has_op(&self, op: CleaningOp) -> bool {
        self.ops.contains(&op)
    }

    /// Toggle a column in the selection. Removing keeps the order of the
    /// rest; re-adding appends at the end, mirroring a multiselect widget.
    pub fn toggle_column(&mut self, name: &str) {
        if let Some(pos) = self.selection.iter().position(|c| c == name) {
            self.selection.remove(pos);
        } else if self.pristine.get_column_index(name).is_some() {
            self.selection.push(name.to_string());
        }
    }

    pub fn select_all_columns(&mut self) {
        self.selection = self.pristine.column_names();
    }

    /// Recompute the working table: pristine copy with the op list applied
    /// in order. Interactions therefore always see a deterministic result,
    /// never one dependent on click history.
    pub fn current_table(&self) -> DataTable {
        let mut table = (*self.pristine).clone();
        cleaning::apply_ops(&mut table, &self.ops);
        table
    }

    /// The working table projected through the column selection.
    pub fn current_view(&self) -> DataView {
        DataView::new(Arc::new(self.current_table())).with_column_names(&self.selection)
    }

    /// Serialize the projected table to the session's export format.
    pub fn export(&self) -> Result<ExportArtifact> {
        Exporter::export(&self.current_view(), self.export_format)
    }
}

/// Load a batch of files into sessions. Unsupported or malformed files are
/// reported and skipped; the rest of the batch still loads.
pub fn load_sessions<P: AsRef<Path>>(paths: &[P]) -> (Vec<FileSession>, Vec<String>) {
    let mut sessions = Vec::new();
    let mut errors = Vec::new();

    for path in paths {
        let file = match UploadedFile::from_path(path) {
            Ok(f) => f,
            Err(e) => {
                warn!(target: "ingest", "Cannot read {}: {}", path.as_ref().display(), e);
                errors.push(format!("{}: {}", path.as_ref().display(), e));
                continue;
            }
        };

        match ingest(&file) {
            Ok(table) => {
                info!(
                    target: "ingest",
                    "Loaded {} ({} rows, {} columns)",
                    file.name,
                    table.row_count(),
                    table.column_count()
                );
                sessions.push(FileSession::new(table));
            }
            Err(e) => {
                warn!(target: "ingest", "Skipping {}: {}", file.name, e);
                errors.push(e.to_string());
            }
        }
    }

    (sessions, errors)
}
