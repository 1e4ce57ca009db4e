//! A1 cell addresses

use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};
use std::fmt;
use std::str::FromStr;

/// A single cell address such as `B7` or `$B$7`.
///
/// Row and column are 0-based. The anchor flags record a `$` in front of
/// the column or row; anchored parts do not move when a formula is copied
/// to another cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellAddress {
    pub row: u32,
    pub col: u16,
    pub row_absolute: bool,
    pub col_absolute: bool,
}

impl CellAddress {
    /// Unanchored address
    pub fn new(row: u32, col: u16) -> Self {
        Self {
            row,
            col,
            row_absolute: false,
            col_absolute: false,
        }
    }

    /// Parse A1 notation, with optional `$` anchors and any letter case.
    ///
    /// ```
    /// use model_audit_core::CellAddress;
    ///
    /// let addr = CellAddress::parse("c$12").unwrap();
    /// assert_eq!((addr.row, addr.col), (11, 2));
    /// assert!(addr.row_absolute && !addr.col_absolute);
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let text = s.trim();
        let invalid = |why: &str| Error::InvalidAddress(format!("{} in '{}'", why, text));

        let (col_absolute, rest) = match text.strip_prefix('$') {
            Some(rest) => (true, rest),
            None => (false, text),
        };

        let split = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        let (letters, rest) = rest.split_at(split);
        if letters.is_empty() {
            return Err(invalid("no column letters"));
        }
        let col = Self::letters_to_column(letters)?;

        let (row_absolute, digits) = match rest.strip_prefix('$') {
            Some(digits) => (true, digits),
            None => (false, rest),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("no row number"));
        }

        let row = match digits.parse::<u32>() {
            Ok(0) | Err(_) => return Err(invalid("row number out of range")),
            Ok(n) => n - 1,
        };
        if row >= MAX_ROWS {
            return Err(Error::RowOutOfBounds(row, MAX_ROWS - 1));
        }

        Ok(Self {
            row,
            col,
            row_absolute,
            col_absolute,
        })
    }

    /// 0 -> `A`, 25 -> `Z`, 26 -> `AA`
    pub fn column_to_letters(col: u16) -> String {
        let mut letters = Vec::with_capacity(3);
        let mut n = u32::from(col) + 1;
        while n > 0 {
            let rem = (n - 1) % 26;
            letters.push(b'A' + rem as u8);
            n = (n - 1) / 26;
        }
        letters.iter().rev().map(|&b| b as char).collect()
    }

    /// `A` -> 0, `aa` -> 26; at most three letters, up to `XFD`
    pub fn letters_to_column(letters: &str) -> Result<u16> {
        if letters.is_empty() || letters.len() > 3 {
            return Err(Error::InvalidAddress(format!(
                "bad column letters '{}'",
                letters
            )));
        }

        let mut col: u32 = 0;
        for b in letters.bytes() {
            if !b.is_ascii_alphabetic() {
                return Err(Error::InvalidAddress(format!(
                    "bad column letters '{}'",
                    letters
                )));
            }
            col = col * 26 + u32::from(b.to_ascii_uppercase() - b'A') + 1;
        }

        let col = col - 1;
        if col >= u32::from(MAX_COLS) {
            return Err(Error::ColumnOutOfBounds(
                u16::try_from(col).unwrap_or(u16::MAX),
                MAX_COLS - 1,
            ));
        }
        Ok(col as u16)
    }

    /// A1 text, anchors included
    pub fn to_a1_string(&self) -> String {
        format!(
            "{}{}{}{}",
            if self.col_absolute { "$" } else { "" },
            Self::column_to_letters(self.col),
            if self.row_absolute { "$" } else { "" },
            self.row + 1
        )
    }

    /// Shift the unanchored parts; `None` when the result leaves the sheet
    pub fn offset(&self, row_delta: i64, col_delta: i64) -> Option<Self> {
        let shift = |value: i64, delta: i64, anchored: bool, limit: i64| {
            let moved = if anchored { value } else { value + delta };
            (0..limit).contains(&moved).then_some(moved)
        };

        let row = shift(
            i64::from(self.row),
            row_delta,
            self.row_absolute,
            i64::from(MAX_ROWS),
        )?;
        let col = shift(
            i64::from(self.col),
            col_delta,
            self.col_absolute,
            i64::from(MAX_COLS),
        )?;

        Some(Self {
            row: row as u32,
            col: col as u16,
            ..*self
        })
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1_string())
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
