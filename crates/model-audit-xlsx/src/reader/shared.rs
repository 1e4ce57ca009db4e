//! Shared formula groups

use model_audit_formula::translate;
use std::collections::HashMap;

struct Anchor {
    formula: String,
    row: u32,
    col: u16,
}

/// Shared formula anchors of one worksheet, keyed by `si`
#[derive(Default)]
pub(super) struct SharedFormulas {
    anchors: HashMap<u32, Anchor>,
}

impl SharedFormulas {
    /// Remember the formula stored on the anchor cell of group `si`
    pub(super) fn insert_anchor(&mut self, si: u32, formula: &str, row: u32, col: u16) {
        self.anchors.insert(
            si,
            Anchor {
                formula: formula.to_string(),
                row,
                col,
            },
        );
    }

    /// Formula for a cell of group `si`, with `=` prefix
    pub(super) fn expand(&self, si: u32, row: u32, col: u16) -> Option<String> {
        let anchor = self.anchors.get(&si)?;
        let formula = with_equals(&anchor.formula);
        let row_delta = row as i64 - anchor.row as i64;
        let col_delta = col as i64 - anchor.col as i64;
        match translate(&formula, row_delta, col_delta) {
            Ok(moved) => Some(moved),
            Err(e) => {
                log::warn!(
                    "Could not translate shared formula {} to row {} col {}: {}",
                    si,
                    row + 1,
                    col + 1,
                    e
                );
                None
            }
        }
    }
}

pub(super) fn with_equals(formula: &str) -> String {
    if formula.starts_with('=') {
        formula.to_string()
    } else {
        format!("={}", formula)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_moves_relative_refs() {
        let mut shared = SharedFormulas::default();
        shared.insert_anchor(0, "A2*$B$1", 1, 2);
        assert_eq!(shared.expand(0, 1, 2).as_deref(), Some("=A2*$B$1"));
        assert_eq!(shared.expand(0, 4, 2).as_deref(), Some("=A5*$B$1"));
        assert_eq!(shared.expand(0, 1, 3).as_deref(), Some("=B2*$B$1"));
    }

    #[test]
    fn test_expand_unknown_group() {
        let shared = SharedFormulas::default();
        assert_eq!(shared.expand(7, 0, 0), None);
    }
}
