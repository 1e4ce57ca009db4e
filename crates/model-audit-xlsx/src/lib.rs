//! # model-audit-xlsx
//!
//! Reads an XLSX workbook twice over in a single pass: each sheet yields a
//! value table (the cached results Excel saved) and a formula table (the
//! formula text, or the literal for cells without one).

pub mod error;
pub mod reader;

pub use error::{XlsxError, XlsxResult};
pub use reader::XlsxReader;
