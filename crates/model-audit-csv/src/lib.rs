//! # model-audit-csv
//!
//! Reads a CSV file as a single-sheet workbook. Fields starting with `=`
//! are formula text; CSV stores no computed results, so those cells are
//! blank in the value table.

mod error;
mod options;
mod reader;

pub use error::{CsvError, CsvResult};
pub use options::CsvReadOptions;
pub use reader::CsvReader;
