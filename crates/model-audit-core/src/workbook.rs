//! Workbook: ordered sheets, each a value table and a formula table

use crate::error::{Error, Result};
use crate::table::CellTable;

/// A single sheet as seen by the auditor.
///
/// `values` holds the computed results, `formulas` holds the formula text
/// (or the literal, for cells without a formula). Both tables always have
/// the same dimensions.
#[derive(Debug, Clone)]
pub struct Worksheet {
    name: String,
    values: CellTable,
    formulas: CellTable,
}

impl Worksheet {
    /// Sheet name, case preserved
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Computed values
    pub fn values(&self) -> &CellTable {
        &self.values
    }

    /// Formula text, or literals for non-formula cells
    pub fn formulas(&self) -> &CellTable {
        &self.formulas
    }

    /// `(rows, cols)` shared by both tables
    pub fn dimensions(&self) -> (usize, usize) {
        self.values.dimensions()
    }
}

/// A sheet that ingestion could not read
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SkippedSheet {
    /// Sheet name as listed in the workbook
    pub name: String,
    /// Why the sheet was skipped
    pub reason: String,
}

/// An ordered collection of sheets.
///
/// Insertion order is kept; checks that look for "the first sheet named
/// like X" depend on it.
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    worksheets: Vec<Worksheet>,
    skipped: Vec<SkippedSheet>,
}

impl Workbook {
    /// Create an empty workbook
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sheet.
    ///
    /// The smaller of the two tables is padded with blanks so both end up
    /// with the same dimensions.
    pub fn add_sheet(
        &mut self,
        name: impl Into<String>,
        mut values: CellTable,
        mut formulas: CellTable,
    ) -> Result<&Worksheet> {
        let name = name.into();
        self.validate_sheet_name(&name)?;

        let rows = values.rows().max(formulas.rows());
        let cols = values.cols().max(formulas.cols());
        if values.dimensions() != (rows, cols) {
            values.resize(rows, cols);
        }
        if formulas.dimensions() != (rows, cols) {
            formulas.resize(rows, cols);
        }

        self.worksheets.push(Worksheet {
            name,
            values,
            formulas,
        });
        let index = self.worksheets.len() - 1;
        Ok(&self.worksheets[index])
    }

    /// Record a sheet that could not be read
    pub fn record_skipped(&mut self, name: impl Into<String>, reason: impl Into<String>) {
        self.skipped.push(SkippedSheet {
            name: name.into(),
            reason: reason.into(),
        });
    }

    /// Sheets that ingestion skipped
    pub fn skipped_sheets(&self) -> &[SkippedSheet] {
        &self.skipped
    }

    /// Get the number of worksheets
    pub fn sheet_count(&self) -> usize {
        self.worksheets.len()
    }

    /// Check if the workbook has no worksheets
    pub fn is_empty(&self) -> bool {
        self.worksheets.is_empty()
    }

    /// Get a worksheet by index
    pub fn worksheet(&self, index: usize) -> Option<&Worksheet> {
        self.worksheets.get(index)
    }

    /// Get a worksheet by exact name
    pub fn worksheet_by_name(&self, name: &str) -> Option<&Worksheet> {
        self.worksheets.iter().find(|ws| ws.name() == name)
    }

    /// Iterate over worksheets in insertion order
    pub fn worksheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.worksheets.iter()
    }

    /// Sheet names in insertion order
    pub fn sheet_names(&self) -> Vec<&str> {
        self.worksheets.iter().map(|ws| ws.name()).collect()
    }

    /// Total number of formula cells across all sheets
    pub fn formula_count(&self) -> usize {
        self.worksheets
            .iter()
            .map(|ws| ws.formulas().formula_count())
            .sum()
    }

    fn validate_sheet_name(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidSheetName("Sheet name cannot be empty".into()));
        }

        // Duplicates are case-insensitive, as in Excel
        let name_lower = name.to_lowercase();
        if self
            .worksheets
            .iter()
            .any(|ws| ws.name().to_lowercase() == name_lower)
        {
            return Err(Error::DuplicateSheetName(name.into()));
        }

        Ok(())
    }
}
