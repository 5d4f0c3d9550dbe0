use std::path::Path;
use thiserror::Error;

/// Tabular file formats the pipeline can read and write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Xlsx,
}

impl FileFormat {
    /// Detect a format from a filename's extension (case-insensitive).
    pub fn from_file_name(name: &str) -> Result<Self, IngestError> {
        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(FileFormat::Csv),
            "xlsx" => Ok(FileFormat::Xlsx),
            _ => Err(IngestError::UnsupportedFormat {
                extension: if extension.is_empty() {
                    "(none)".to_string()
                } else {
                    format!(".{}", extension)
                },
            }),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Csv => "csv",
            FileFormat::Xlsx => "xlsx",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            FileFormat::Csv => "text/csv",
            FileFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FileFormat::Csv => "CSV",
            FileFormat::Xlsx => "Excel",
        }
    }
}

/// Failures while turning an uploaded file into a table. Unsupported or
/// malformed files are reported and skipped; the batch continues.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Unsupported file type: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("Failed to decode {file}: {message}")]
    Decode { file: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_known_extensions() {
        assert_eq!(FileFormat::from_file_name("data.csv").unwrap(), FileFormat::Csv);
        assert_eq!(
            FileFormat::from_file_name("report.XLSX").unwrap(),
            FileFormat::Xlsx
        );
    }

    #[test]
    fn test_rejects_unknown_extension() {
        let err = FileFormat::from_file_name("report.txt").unwrap_err();
        assert_eq!(err.to_string(), "Unsupported file type: .txt");
    }

    #[test]
    fn test_rejects_missing_extension() {
        assert!(FileFormat::from_file_name("README").is_err());
    }

    #[test]
    fn test_content_types() {
        assert_eq!(FileFormat::Csv.content_type(), "text/csv");
        assert_eq!(
            FileFormat::Xlsx.content_type(),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
    }
}
