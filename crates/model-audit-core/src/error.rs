//! Error types for model-audit-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building tables and workbooks
#[derive(Debug, Error)]
pub enum Error {
    /// Text that is not an A1 address
    #[error("Invalid cell address: {0}")]
    InvalidAddress(String),

    /// Row past the sheet limit
    #[error("Row index {0} out of bounds (max: {1})")]
    RowOutOfBounds(u32, u32),

    /// Column past the sheet limit
    #[error("Column index {0} out of bounds (max: {1})")]
    ColumnOutOfBounds(u16, u16),

    #[error("Invalid sheet name: {0}")]
    InvalidSheetName(String),

    /// Sheet names are unique ignoring case
    #[error("Sheet name already exists: {0}")]
    DuplicateSheetName(String),
}
