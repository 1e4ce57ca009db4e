//! Facade error types

use thiserror::Error;

/// Result type for audit runs
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that stop an audit run before any check executes
#[derive(Debug, Error)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// XLSX ingestion failed
    #[error(transparent)]
    Xlsx(#[from] model_audit_xlsx::XlsxError),

    /// CSV ingestion failed
    #[error(transparent)]
    Csv(#[from] model_audit_csv::CsvError),

    /// Workbook construction failed
    #[error(transparent)]
    Core(#[from] model_audit_core::Error),

    /// The file extension is not one we can ingest
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    /// Options file could not be parsed
    #[error("Invalid audit options: {0}")]
    Config(#[from] serde_json::Error),
}
