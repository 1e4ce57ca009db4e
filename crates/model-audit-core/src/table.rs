//! Rectangular cell grid

use crate::cell::CellContent;
use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};

static BLANK: CellContent = CellContent::Blank;

/// A rectangular, 0-indexed, row-major grid of [`CellContent`].
///
/// Reads outside the grid return [`CellContent::Blank`]; writes outside it
/// grow the grid.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellTable {
    rows: usize,
    cols: usize,
    cells: Vec<CellContent>,
}

impl CellTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table of the given size filled with blanks
    pub fn with_dimensions(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![CellContent::Blank; rows * cols],
        }
    }

    /// Build a table from ragged rows, padding short rows with blanks
    pub fn from_rows(rows: Vec<Vec<CellContent>>) -> Self {
        let cols = rows.iter().map(Vec::len).max().unwrap_or(0);
        let row_count = rows.len();
        let mut cells = Vec::with_capacity(row_count * cols);
        for mut row in rows {
            row.resize(cols, CellContent::Blank);
            cells.extend(row);
        }
        Self {
            rows: row_count,
            cols,
            cells,
        }
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`
    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Whether the table has no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Get a cell, or blank when outside the grid
    pub fn get(&self, row: usize, col: usize) -> &CellContent {
        if row < self.rows && col < self.cols {
            &self.cells[row * self.cols + col]
        } else {
            &BLANK
        }
    }

    /// Set a cell, growing the grid if needed
    pub fn set(&mut self, row: usize, col: usize, content: CellContent) -> Result<()> {
        if row >= MAX_ROWS as usize {
            return Err(Error::RowOutOfBounds(
                row.min(u32::MAX as usize) as u32,
                MAX_ROWS - 1,
            ));
        }
        if col >= MAX_COLS as usize {
            return Err(Error::ColumnOutOfBounds(
                col.min(u16::MAX as usize) as u16,
                MAX_COLS - 1,
            ));
        }
        if row >= self.rows || col >= self.cols {
            self.resize(self.rows.max(row + 1), self.cols.max(col + 1));
        }
        let idx = row * self.cols + col;
        self.cells[idx] = content;
        Ok(())
    }

    /// Resize the grid. Cells outside the new bounds are dropped, new cells
    /// are blank.
    pub fn resize(&mut self, rows: usize, cols: usize) {
        if cols == self.cols {
            self.cells.resize(rows * cols, CellContent::Blank);
            self.rows = rows;
            return;
        }

        let mut cells = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                cells.push(self.get(r, c).clone());
            }
        }
        self.rows = rows;
        self.cols = cols;
        self.cells = cells;
    }

    /// A full row as a slice. Empty when `row` is out of range.
    pub fn row(&self, row: usize) -> &[CellContent] {
        if row < self.rows {
            &self.cells[row * self.cols..(row + 1) * self.cols]
        } else {
            &[]
        }
    }

    /// Iterate over rows as slices
    pub fn iter_rows(&self) -> impl Iterator<Item = &[CellContent]> + '_ {
        (0..self.rows).map(move |r| self.row(r))
    }

    /// Iterate over non-blank cells as `(row, col, content)`
    pub fn iter_cells(&self) -> impl Iterator<Item = (usize, usize, &CellContent)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| !c.is_blank())
            .map(move |(i, c)| (i / self.cols, i % self.cols, c))
    }

    /// Number of cells holding formula text
    pub fn formula_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_formula()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_from_rows_pads() {
        let table = CellTable::from_rows(vec![
            vec![CellContent::Number(1.0)],
            vec![CellContent::Number(2.0), CellContent::text("x")],
        ]);
        assert_eq!(table.dimensions(), (2, 2));
        assert_eq!(table.get(0, 1), &CellContent::Blank);
        assert_eq!(table.get(1, 1), &CellContent::text("x"));
    }

    #[test]
    fn test_get_outside_is_blank() {
        let table = CellTable::with_dimensions(2, 2);
        assert!(table.get(10, 10).is_blank());
        assert!(table.row(5).is_empty());
    }

    #[test]
    fn test_set_grows() {
        let mut table = CellTable::new();
        table.set(0, 0, CellContent::Number(1.0)).unwrap();
        table.set(2, 3, CellContent::formula("=A1")).unwrap();
        assert_eq!(table.dimensions(), (3, 4));
        assert_eq!(table.get(0, 0), &CellContent::Number(1.0));
        assert_eq!(table.get(2, 3), &CellContent::formula("=A1"));
        assert_eq!(table.formula_count(), 1);
    }

    #[test]
    fn test_iter_cells_skips_blanks() {
        let table = CellTable::from_rows(vec![
            vec![CellContent::Blank, CellContent::Number(5.0)],
            vec![CellContent::text("a"), CellContent::Blank],
        ]);
        let cells: Vec<_> = table.iter_cells().map(|(r, c, _)| (r, c)).collect();
        assert_eq!(cells, vec![(0, 1), (1, 0)]);
    }
}
