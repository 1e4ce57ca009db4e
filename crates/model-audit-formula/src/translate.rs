//! Shared formula translation
//!
//! XLSX files store a shared formula once, on its anchor cell. Every other
//! cell in the group holds only a pointer to it and gets the anchor formula
//! with its relative references moved by the distance between the cells.

use crate::error::FormulaResult;
use crate::reference::{classify, split_reference, ReferenceKind};
use crate::tokenizer::{render, tokenize};
use model_audit_core::{CellAddress, MAX_COLS, MAX_ROWS};

const REF_ERROR: &str = "#REF!";

/// Move the relative references of `formula` by `row_delta` rows and
/// `col_delta` columns.
///
/// Absolute (`$`) parts, external references, names and literals are left
/// as they are. A reference pushed off the sheet becomes `#REF!`.
///
/// ```rust
/// use model_audit_formula::translate;
///
/// let moved = translate("=SUM($A1:B1)*Rates!C$2", 2, 1).unwrap();
/// assert_eq!(moved, "=SUM($A3:C3)*Rates!D$2");
/// ```
pub fn translate(formula: &str, row_delta: i64, col_delta: i64) -> FormulaResult<String> {
    if row_delta == 0 && col_delta == 0 {
        return Ok(formula.to_string());
    }

    let mut tokens = tokenize(formula)?;
    for token in tokens.iter_mut().filter(|t| t.is_reference()) {
        let kind = classify(&token.value);
        if !matches!(kind, ReferenceKind::Cell | ReferenceKind::Range) {
            continue;
        }

        let at = if token.value.starts_with('@') { "@" } else { "" };
        let (sheet, local) = split_reference(&token.value);
        let shifted = match kind {
            ReferenceKind::Cell => shift_cell(&local, row_delta, col_delta),
            _ => shift_range(&local, row_delta, col_delta),
        };
        let local = shifted.unwrap_or_else(|| REF_ERROR.to_string());
        token.value = match sheet {
            Some(sheet) => format!("{}{}!{}", at, sheet, local),
            None => format!("{}{}", at, local),
        };
    }

    Ok(render(&tokens))
}

fn shift_cell(text: &str, row_delta: i64, col_delta: i64) -> Option<String> {
    let addr = CellAddress::parse(text).ok()?;
    addr.offset(row_delta, col_delta)
        .map(|moved| moved.to_a1_string())
}

fn shift_range(text: &str, row_delta: i64, col_delta: i64) -> Option<String> {
    let (left, right) = text.split_once(':')?;
    let shift_part = |part: &str| {
        shift_cell(part, row_delta, col_delta)
            .or_else(|| shift_column(part, col_delta))
            .or_else(|| shift_row(part, row_delta))
    };
    Some(format!("{}:{}", shift_part(left)?, shift_part(right)?))
}

fn shift_column(text: &str, delta: i64) -> Option<String> {
    let (absolute, letters) = match text.strip_prefix('$') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    if letters.is_empty() || !letters.bytes().all(|b| b.is_ascii_alphabetic()) {
        return None;
    }
    let col = CellAddress::letters_to_column(letters).ok()? as i64;
    if absolute {
        return Some(text.to_ascii_uppercase());
    }
    let moved = col + delta;
    if moved < 0 || moved >= MAX_COLS as i64 {
        return None;
    }
    Some(CellAddress::column_to_letters(moved as u16))
}

fn shift_row(text: &str, delta: i64) -> Option<String> {
    let (absolute, digits) = match text.strip_prefix('$') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let row: i64 = digits.parse().ok()?;
    if absolute {
        return Some(text.to_string());
    }
    let moved = row + delta;
    if moved < 1 || moved > MAX_ROWS as i64 {
        return None;
    }
    Some(moved.to_string())
}
