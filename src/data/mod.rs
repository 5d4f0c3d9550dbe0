pub mod cleaning;
pub mod csv_loader;
pub mod data_view;
pub mod datatable;
pub mod excel_loader;
pub mod exporter;
pub mod file_format;

pub use cleaning::CleaningOp;
pub use data_view::DataView;
pub use datatable::{DataColumn, DataRow, DataTable, DataType, DataValue};
pub use exporter::{ExportArtifact, Exporter};
pub use file_format::{FileFormat, IngestError};
