//! Reference classification and resolution
//!
//! A reference operand from the tokenizer is turned into a [`NodeId`], the
//! normalized identity used as a graph node. Ranges stay coarse: `A1:A5`
//! becomes a single node and is never expanded into its cells.

use crate::tokenizer::Token;
use model_audit_core::CellAddress;
use std::borrow::Borrow;
use std::fmt;

/// Prefix of node identities for references into other workbooks
pub const EXTERNAL_PREFIX: &str = "EXT_LINK:";

/// Normalized identity of a graph node.
///
/// Either `SheetName!CellOrRange` (sheet name case preserved, no `$`
/// anchors, upper-case column letters) or `EXT_LINK:<raw token>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct NodeId(String);

impl NodeId {
    /// Identity of a single cell (0-based row and column)
    pub fn cell(sheet: &str, row: u32, col: u16) -> Self {
        NodeId(format!(
            "{}!{}{}",
            sheet,
            CellAddress::column_to_letters(col),
            row + 1
        ))
    }

    /// Identity of a reference that lives in another workbook
    pub fn external(raw: &str) -> Self {
        NodeId(format!("{}{}", EXTERNAL_PREFIX, raw))
    }

    /// Identity from a sheet name and already-normalized reference text
    pub fn qualified(sheet: &str, reference: &str) -> Self {
        NodeId(format!("{}!{}", sheet, reference))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this node stands for an external workbook reference
    pub fn is_external(&self) -> bool {
        self.0.starts_with(EXTERNAL_PREFIX)
    }

    /// Sheet part of a local identity
    pub fn sheet(&self) -> Option<&str> {
        if self.is_external() {
            return None;
        }
        self.0.rsplit_once('!').map(|(sheet, _)| sheet)
    }

    /// Cell or range part of a local identity
    pub fn reference(&self) -> Option<&str> {
        if self.is_external() {
            return None;
        }
        self.0.rsplit_once('!').map(|(_, reference)| reference)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for NodeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> Self {
        id.0
    }
}

/// What a reference operand refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    /// A single cell: `A1`, `Sheet1!$B$2`
    Cell,
    /// A rectangular, whole-column or whole-row range: `A1:B5`, `A:C`, `1:3`
    Range,
    /// A reference qualified by another workbook: `[Budget.xlsx]Sheet1!A1`
    External,
    /// A defined name or anything else that is not an address
    Name,
    /// A table reference: `Table1[Amount]`
    Structured,
}

impl ReferenceKind {
    /// Whether references of this kind become graph edges
    pub fn is_tracked(self) -> bool {
        matches!(
            self,
            ReferenceKind::Cell | ReferenceKind::Range | ReferenceKind::External
        )
    }
}

/// Split `Sheet!A1` at the first `!` outside quotes and brackets
pub fn split_sheet(token: &str) -> (Option<&str>, &str) {
    let mut in_quote = false;
    let mut depth = 0usize;

    for (i, b) in token.bytes().enumerate() {
        match b {
            b'\'' => in_quote = !in_quote,
            b'[' if !in_quote => depth += 1,
            b']' if !in_quote => depth = depth.saturating_sub(1),
            b'!' if !in_quote && depth == 0 => return (Some(&token[..i]), &token[i + 1..]),
            _ => {}
        }
    }

    (None, token)
}

/// Split a reference operand into its sheet qualifier and local part.
///
/// A leading implicit-intersection `@` is dropped, and so is a qualifier
/// repeated on the second endpoint of a range: `Sheet1!A1:Sheet1!B2` gives
/// `(Some("Sheet1"), "A1:B2")`. A second endpoint on a different sheet is
/// left in the local part, which then no longer classifies as an address.
pub fn split_reference(token: &str) -> (Option<&str>, String) {
    let token = token.strip_prefix('@').unwrap_or(token);
    let (sheet, local) = split_sheet(token);

    let local = match (sheet, local.split_once(':')) {
        (Some(sheet), Some((start, end))) => match split_sheet(end) {
            (Some(repeated), end) if same_sheet(sheet, repeated) => format!("{}:{}", start, end),
            _ => local.to_string(),
        },
        _ => local.to_string(),
    };
    (sheet, local)
}

fn same_sheet(a: &str, b: &str) -> bool {
    unquote_sheet(a).to_lowercase() == unquote_sheet(b).to_lowercase()
}

/// Remove the quotes around a sheet name and unescape `''`
pub fn unquote_sheet(sheet: &str) -> String {
    let inner = sheet
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .unwrap_or(sheet);
    inner.replace("''", "'")
}

/// Classify a reference operand
pub fn classify(token: &str) -> ReferenceKind {
    let (sheet, local) = split_reference(token);

    match sheet {
        Some(sheet) if sheet.contains('[') => return ReferenceKind::External,
        None if token.contains('[') => return ReferenceKind::Structured,
        _ => {}
    }

    if is_cell(&local) {
        ReferenceKind::Cell
    } else if is_range(&local) {
        ReferenceKind::Range
    } else {
        ReferenceKind::Name
    }
}

fn is_cell(text: &str) -> bool {
    CellAddress::parse(text).is_ok() && !text.contains(char::is_whitespace)
}

fn is_range(text: &str) -> bool {
    let Some((left, right)) = text.split_once(':') else {
        return false;
    };
    (is_cell(left) && is_cell(right))
        || (is_column(left) && is_column(right))
        || (is_row(left) && is_row(right))
}

fn is_column(text: &str) -> bool {
    let letters = text.strip_prefix('$').unwrap_or(text);
    !letters.is_empty()
        && letters.bytes().all(|b| b.is_ascii_alphabetic())
        && CellAddress::letters_to_column(letters).is_ok()
}

fn is_row(text: &str) -> bool {
    let digits = text.strip_prefix('$').unwrap_or(text);
    !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && digits.parse::<u32>().map_or(false, |n| n >= 1)
}

/// Strip `$` anchors and upper-case column letters
pub fn normalize_local(local: &str) -> String {
    local
        .chars()
        .filter(|c| *c != '$')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Resolve a reference operand found in a formula on `current_sheet`.
///
/// Bracketed workbook qualifiers give `EXT_LINK:<token>`; otherwise the
/// sheet is the explicit qualifier (unquoted) or the current sheet.
pub fn resolve(token: &str, current_sheet: &str) -> NodeId {
    let token = token.strip_prefix('@').unwrap_or(token);
    if token.contains('[') && token.contains(']') {
        return NodeId::external(token);
    }

    let (sheet, local) = split_reference(token);
    let sheet = match sheet {
        Some(qualifier) => unquote_sheet(qualifier),
        None => current_sheet.to_string(),
    };
    NodeId::qualified(&sheet, &normalize_local(&local))
}

/// Resolve every tracked reference in a token stream.
///
/// One identity per tracked reference token, in order, duplicates kept.
pub fn resolve_all(tokens: &[Token], current_sheet: &str) -> Vec<NodeId> {
    tokens
        .iter()
        .filter(|t| t.is_reference())
        .filter(|t| classify(&t.value).is_tracked())
        .map(|t| resolve(&t.value, current_sheet))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::tokenize;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_classify() {
        assert_eq!(classify("A1"), ReferenceKind::Cell);
        assert_eq!(classify("Sheet1!$B$2"), ReferenceKind::Cell);
        assert_eq!(classify("A1:B5"), ReferenceKind::Range);
        assert_eq!(classify("'Q1 Data'!A:C"), ReferenceKind::Range);
        assert_eq!(classify("$1:$3"), ReferenceKind::Range);
        assert_eq!(classify("[1]Data!B2"), ReferenceKind::External);
        assert_eq!(classify("'[Budget.xlsx]Sheet1'!A1"), ReferenceKind::External);
        assert_eq!(classify("Table1[Amount]"), ReferenceKind::Structured);
        assert_eq!(classify("TaxRate"), ReferenceKind::Name);
        assert_eq!(classify("Sheet1!TaxRate"), ReferenceKind::Name);
        assert_eq!(classify("LOG10"), ReferenceKind::Cell);
        assert_eq!(classify("@A1"), ReferenceKind::Cell);
        assert_eq!(classify("Sheet1!A1:Sheet1!B2"), ReferenceKind::Range);
        assert_eq!(classify("Sheet1!A1:Other!B2"), ReferenceKind::Name);
    }

    #[test]
    fn test_split_reference() {
        assert_eq!(split_reference("A1"), (None, "A1".to_string()));
        assert_eq!(
            split_reference("'A'!A1:'a'!B2"),
            (Some("'A'"), "A1:B2".to_string())
        );
        assert_eq!(
            split_reference("'Q1!Data'!C3"),
            (Some("'Q1!Data'"), "C3".to_string())
        );
    }

    #[test]
    fn test_resolve_repeated_qualifier() {
        for (formula, expected) in [
            ("=SUM('A'!A1:'A'!B2)", "A!A1:B2"),
            ("=SUM(Sheet1!A1:Sheet1!B2)", "Sheet1!A1:B2"),
            ("=SUM('My Sheet'!$A$1:'My Sheet'!$B$2)", "My Sheet!A1:B2"),
        ] {
            let tokens = tokenize(formula).unwrap();
            let ids: Vec<String> = resolve_all(&tokens, "Calc")
                .into_iter()
                .map(String::from)
                .collect();
            assert_eq!(ids, vec![expected], "{}", formula);
        }
    }

    #[test]
    fn test_resolve_implicit_intersection() {
        let tokens = tokenize("=@A1+1").unwrap();
        let ids: Vec<String> = resolve_all(&tokens, "Calc")
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(ids, vec!["Calc!A1"]);
        assert_eq!(resolve("@Rates!$B$2", "Calc").as_str(), "Rates!B2");
    }

    #[test]
    fn test_resolve_unqualified() {
        assert_eq!(resolve("A1", "Summary").as_str(), "Summary!A1");
        assert_eq!(resolve("$b$2:c$9", "Summary").as_str(), "Summary!B2:C9");
    }

    #[test]
    fn test_resolve_qualified() {
        assert_eq!(resolve("PFNA!A1", "Summary").as_str(), "PFNA!A1");
        assert_eq!(resolve("'My Sheet'!B2", "Summary").as_str(), "My Sheet!B2");
        assert_eq!(resolve("'O''Brien'!C3", "Summary").as_str(), "O'Brien!C3");
    }

    #[test]
    fn test_resolve_external() {
        let id = resolve("'[Budget.xlsx]Sheet1'!A1", "Summary");
        assert_eq!(id.as_str(), "EXT_LINK:'[Budget.xlsx]Sheet1'!A1");
        assert!(id.is_external());
        assert_eq!(id.sheet(), None);
    }

    #[test]
    fn test_node_id_parts() {
        let id = NodeId::cell("My!Sheet", 4, 27);
        assert_eq!(id.as_str(), "My!Sheet!AB5");
        assert_eq!(id.sheet(), Some("My!Sheet"));
        assert_eq!(id.reference(), Some("AB5"));
    }

    #[test]
    fn test_resolve_all_counts_every_reference() {
        let tokens = tokenize("=A1+A1*SUM(B1:B3)+Other!C1+TaxRate+\"A1\"").unwrap();
        let ids: Vec<String> = resolve_all(&tokens, "Calc")
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(
            ids,
            vec!["Calc!A1", "Calc!A1", "Calc!B1:B3", "Other!C1"]
        );
    }
}
