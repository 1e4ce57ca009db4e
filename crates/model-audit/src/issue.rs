//! Audit findings

use crate::explain::{explain, Explanation};
use serde::Serialize;
use std::fmt;

/// How bad a finding is. Ordered `Medium < High < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Medium,
    High,
    Critical,
}

impl Severity {
    /// All severities, most severe first
    pub const DESCENDING: [Severity; 3] = [Severity::Critical, Severity::High, Severity::Medium];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::High => "High",
            Severity::Medium => "Medium",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Finding taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IssueKind {
    #[serde(rename = "External Link")]
    ExternalLink,
    #[serde(rename = "Calculation Error")]
    CalculationError,
    #[serde(rename = "Hard-coded Plug")]
    HardcodedPlug,
    #[serde(rename = "Accounting Mismatch")]
    AccountingMismatch,
    #[serde(rename = "Circular Reference")]
    CircularReference,
}

impl IssueKind {
    pub const ALL: [IssueKind; 5] = [
        IssueKind::ExternalLink,
        IssueKind::CalculationError,
        IssueKind::HardcodedPlug,
        IssueKind::AccountingMismatch,
        IssueKind::CircularReference,
    ];

    /// Display tag
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueKind::ExternalLink => "External Link",
            IssueKind::CalculationError => "Calculation Error",
            IssueKind::HardcodedPlug => "Hard-coded Plug",
            IssueKind::AccountingMismatch => "Accounting Mismatch",
            IssueKind::CircularReference => "Circular Reference",
        }
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One audit finding.
///
/// Immutable once built; the explanation is looked up at construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Issue {
    #[serde(rename = "type")]
    kind: IssueKind,
    severity: Severity,
    location: String,
    detail: String,
    #[serde(flatten)]
    explanation: Explanation,
}

impl Issue {
    /// Create an issue with the generic explanation for its kind
    pub fn new(
        kind: IssueKind,
        severity: Severity,
        location: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity,
            location: location.into(),
            detail: detail.into(),
            explanation: explain(kind, None),
        }
    }

    /// Create an issue whose explanation cause depends on the offending value
    pub fn with_error_value(
        kind: IssueKind,
        severity: Severity,
        location: impl Into<String>,
        detail: impl Into<String>,
        error_value: &str,
    ) -> Self {
        Self {
            kind,
            severity,
            location: location.into(),
            detail: detail.into(),
            explanation: explain(kind, Some(error_value)),
        }
    }

    pub fn kind(&self) -> IssueKind {
        self.kind
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }

    pub fn explanation(&self) -> &Explanation {
        &self.explanation
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} @ {}: {}",
            self.severity, self.kind, self.location, self.detail
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Critical > Severity::High);
        assert!(Severity::High > Severity::Medium);

        let mut sorted = vec![Severity::Medium, Severity::Critical, Severity::High];
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(sorted, Severity::DESCENDING.to_vec());
    }

    #[test]
    fn test_issue_serializes_with_tag_and_explanation() {
        let issue = Issue::new(
            IssueKind::ExternalLink,
            Severity::Medium,
            "EXT_LINK:[1]Prices!B2",
            "Dependency on external workbook/source detected.",
        );
        let json = serde_json::to_value(&issue).unwrap();

        assert_eq!(json["type"], "External Link");
        assert_eq!(json["severity"], "Medium");
        assert_eq!(json["location"], "EXT_LINK:[1]Prices!B2");
        assert!(json["why"].as_str().unwrap().contains("External links"));
        assert!(json.get("fix").is_some());
    }

    #[test]
    fn test_display() {
        let issue = Issue::new(
            IssueKind::AccountingMismatch,
            Severity::Critical,
            "Balance Sheet",
            "does not balance",
        );
        assert_eq!(
            issue.to_string(),
            "[Critical] Accounting Mismatch @ Balance Sheet: does not balance"
        );
    }
}
