//! Cell addressing and content types

mod address;
mod content;

pub use address::CellAddress;
pub use content::{CellContent, CellError};
