//! Cell content types

use std::borrow::Cow;
use std::fmt;

/// What a single cell holds.
///
/// A value table holds the computed results of a sheet, a formula table
/// holds the formula text where a cell has one and the literal otherwise.
/// [`CellContent::Formula`] only ever appears in formula tables.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum CellContent {
    /// Empty cell
    #[default]
    Blank,

    /// Numeric value (dates included)
    Number(f64),

    /// Boolean value (TRUE/FALSE)
    Boolean(bool),

    /// String value
    Text(String),

    /// Error value (#VALUE!, #REF!, etc.)
    Error(CellError),

    /// Formula source text, always starting with `=`
    Formula(String),
}

impl CellContent {
    /// Create a text value
    pub fn text<S: Into<String>>(s: S) -> Self {
        CellContent::Text(s.into())
    }

    /// Create a formula, adding the leading `=` when missing
    pub fn formula<S: Into<String>>(text: S) -> Self {
        let text = text.into();
        if text.starts_with('=') {
            CellContent::Formula(text)
        } else {
            CellContent::Formula(format!("={}", text))
        }
    }

    /// Check if the cell is empty
    pub fn is_blank(&self) -> bool {
        matches!(self, CellContent::Blank)
    }

    /// Check if the cell contains formula text
    pub fn is_formula(&self) -> bool {
        matches!(self, CellContent::Formula(_))
    }

    /// Formula text including the leading `=`
    pub fn as_formula(&self) -> Option<&str> {
        match self {
            CellContent::Formula(text) => Some(text),
            _ => None,
        }
    }

    /// Numeric coercion used for period columns.
    ///
    /// Numbers pass through, booleans become 1/0, text that is a plain
    /// number once trimmed is parsed and everything else is 0. Thousands
    /// separators are not understood: `"1,500"` is 0.
    pub fn coerce_number(&self) -> f64 {
        match self {
            CellContent::Number(n) => *n,
            CellContent::Boolean(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            CellContent::Text(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .unwrap_or(0.0),
            _ => 0.0,
        }
    }

    /// Text used when matching row labels
    pub fn as_label(&self) -> Cow<'_, str> {
        match self {
            CellContent::Blank => Cow::Borrowed(""),
            CellContent::Text(s) | CellContent::Formula(s) => Cow::Borrowed(s),
            CellContent::Error(e) => Cow::Borrowed(e.as_str()),
            other => Cow::Owned(other.to_string()),
        }
    }
}

impl fmt::Display for CellContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellContent::Blank => Ok(()),
            CellContent::Number(n) => write!(f, "{}", n),
            CellContent::Boolean(b) => write!(f, "{}", if *b { "TRUE" } else { "FALSE" }),
            CellContent::Text(s) => write!(f, "{}", s),
            CellContent::Error(e) => write!(f, "{}", e),
            CellContent::Formula(s) => write!(f, "{}", s),
        }
    }
}

/// Spreadsheet error values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum CellError {
    /// #NULL! - Incorrect range operator
    Null,
    /// #DIV/0! - Division by zero
    Div0,
    /// #VALUE! - Wrong type of argument or operand
    Value,
    /// #REF! - Invalid cell reference
    Ref,
    /// #NAME? - Unrecognized formula name
    Name,
    /// #NUM! - Invalid numeric value
    Num,
    /// #N/A - Value not available
    Na,
    /// #GETTING_DATA - External data is loading
    GettingData,
    /// #SPILL! - Dynamic array cannot spill
    Spill,
    /// #CALC! - Calculation error
    Calc,
}

impl CellError {
    /// All error values, in display order
    pub const ALL: [CellError; 10] = [
        CellError::Null,
        CellError::Div0,
        CellError::Value,
        CellError::Ref,
        CellError::Name,
        CellError::Num,
        CellError::Na,
        CellError::GettingData,
        CellError::Spill,
        CellError::Calc,
    ];

    /// Get the display string for this error
    pub fn as_str(&self) -> &'static str {
        match self {
            CellError::Null => "#NULL!",
            CellError::Div0 => "#DIV/0!",
            CellError::Value => "#VALUE!",
            CellError::Ref => "#REF!",
            CellError::Name => "#NAME?",
            CellError::Num => "#NUM!",
            CellError::Na => "#N/A",
            CellError::GettingData => "#GETTING_DATA",
            CellError::Spill => "#SPILL!",
            CellError::Calc => "#CALC!",
        }
    }

    /// Parse an error string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "#NULL!" => Some(CellError::Null),
            "#DIV/0!" => Some(CellError::Div0),
            "#VALUE!" => Some(CellError::Value),
            "#REF!" => Some(CellError::Ref),
            "#NAME?" => Some(CellError::Name),
            "#NUM!" => Some(CellError::Num),
            "#N/A" => Some(CellError::Na),
            "#GETTING_DATA" => Some(CellError::GettingData),
            "#SPILL!" => Some(CellError::Spill),
            "#CALC!" => Some(CellError::Calc),
            _ => None,
        }
    }
}

impl fmt::Display for CellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formula_constructor_adds_equals() {
        assert_eq!(
            CellContent::formula("SUM(A1:A3)"),
            CellContent::Formula("=SUM(A1:A3)".into())
        );
        assert_eq!(
            CellContent::formula("=A1"),
            CellContent::Formula("=A1".into())
        );
    }

    #[test]
    fn test_coerce_number() {
        assert_eq!(CellContent::Number(12.5).coerce_number(), 12.5);
        assert_eq!(CellContent::text(" 1250.5 ").coerce_number(), 1250.5);
        assert_eq!(CellContent::text("1,250.5").coerce_number(), 0.0);
        assert_eq!(CellContent::text("$40").coerce_number(), 0.0);
        assert_eq!(CellContent::text("Total").coerce_number(), 0.0);
        assert_eq!(CellContent::Blank.coerce_number(), 0.0);
        assert_eq!(CellContent::Error(CellError::Ref).coerce_number(), 0.0);
        assert_eq!(CellContent::Boolean(true).coerce_number(), 1.0);
    }

    #[test]
    fn test_as_label() {
        assert_eq!(CellContent::text("Total Assets").as_label(), "Total Assets");
        assert_eq!(CellContent::Number(3.0).as_label(), "3");
        assert_eq!(CellContent::Blank.as_label(), "");
    }

    #[test]
    fn test_cell_error_roundtrip() {
        for err in CellError::ALL {
            assert_eq!(CellError::parse(err.as_str()), Some(err));
        }
        assert_eq!(CellError::parse("#div/0!"), Some(CellError::Div0));
        assert_eq!(CellError::parse("#BOGUS"), None);
    }
}
