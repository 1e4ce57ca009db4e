//! # model-audit-core
//!
//! Core data structures shared by the model-audit crates.
//!
//! - [`CellContent`] - what a cell holds in a value table or a formula table
//! - [`CellAddress`] - A1 addressing with `$` anchors
//! - [`CellTable`] - a rectangular, 0-indexed grid of cells
//! - [`Workbook`], [`Worksheet`] - ordered sheets, each with a value table and
//!   a formula table of identical dimensions
//!
//! ## Example
//!
//! ```rust
//! use model_audit_core::{CellContent, CellTable, Workbook};
//!
//! let values = CellTable::from_rows(vec![vec![CellContent::Number(110.0)]]);
//! let formulas = CellTable::from_rows(vec![vec![CellContent::formula("=PFNA!A1+100")]]);
//!
//! let mut workbook = Workbook::new();
//! workbook.add_sheet("Summary", values, formulas).unwrap();
//! assert_eq!(workbook.sheet_count(), 1);
//! ```

pub mod cell;
pub mod error;
pub mod table;
pub mod workbook;

pub use cell::{CellAddress, CellContent, CellError};
pub use error::{Error, Result};
pub use table::CellTable;
pub use workbook::{SkippedSheet, Workbook, Worksheet};

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;
