//! Formula error types

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur while tokenizing or rewriting formulas
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    /// Formula text could not be split into tokens
    #[error("Tokenize error at position {position}: {message}")]
    Tokenize { message: String, position: usize },

    /// Reference text is not a cell or range address
    #[error("Invalid reference: {0}")]
    InvalidReference(String),
}
