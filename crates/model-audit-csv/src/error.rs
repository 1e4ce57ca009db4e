//! CSV error types

use thiserror::Error;

/// Result type for CSV operations
pub type CsvResult<T> = std::result::Result<T, CsvError>;

/// Errors that can occur while reading CSV
#[derive(Debug, Error)]
pub enum CsvError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV library error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A record is wider than a worksheet
    #[error("row {row} has {columns} fields, more than the {max} columns a sheet can hold")]
    TooManyColumns { row: usize, columns: usize, max: u16 },

    /// Core error
    #[error("Core error: {0}")]
    Core(#[from] model_audit_core::Error),
}
