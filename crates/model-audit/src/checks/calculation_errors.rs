use super::{AuditCheck, AuditContext};
use crate::issue::{Issue, IssueKind, Severity};
use model_audit_core::{CellContent, CellError};

/// Error codes reported as calculation errors
const FLAGGED_CODES: [CellError; 4] = [
    CellError::Ref,
    CellError::Name,
    CellError::Value,
    CellError::Div0,
];

/// Flags value cells holding `#REF!`, `#NAME?`, `#VALUE!` or `#DIV/0!`,
/// either as an error value or inside text
#[derive(Debug, Default)]
pub struct CalculationErrorCheck;

impl CalculationErrorCheck {
    /// The rendered value if the cell should be flagged
    fn flagged_value(content: &CellContent) -> Option<&str> {
        match content {
            CellContent::Error(err) if FLAGGED_CODES.contains(err) => Some(err.as_str()),
            CellContent::Text(s) if FLAGGED_CODES.iter().any(|code| s.contains(code.as_str())) => {
                Some(s.as_str())
            }
            _ => None,
        }
    }
}

impl AuditCheck for CalculationErrorCheck {
    fn name(&self) -> &'static str {
        "calculation-errors"
    }

    fn kind(&self) -> IssueKind {
        IssueKind::CalculationError
    }

    fn check(&self, context: &AuditContext<'_>, issues: &mut Vec<Issue>) {
        for sheet in context.workbook.worksheets() {
            for (row, col, content) in sheet.values().iter_cells() {
                let Some(value) = Self::flagged_value(content) else {
                    continue;
                };
                issues.push(Issue::with_error_value(
                    self.kind(),
                    Severity::High,
                    format!("{}!Row{}:Col{}", sheet.name(), row + 1, col + 1),
                    format!("Cell contains error value: {}", value),
                    value,
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::test_support::*;
    use model_audit_formula::DependencyGraph;
    use pretty_assertions::assert_eq;

    fn run(workbook: &model_audit_core::Workbook) -> Vec<Issue> {
        let graph = DependencyGraph::new();
        let context = AuditContext {
            workbook,
            graph: &graph,
            structure: None,
        };
        let mut issues = Vec::new();
        CalculationErrorCheck.check(&context, &mut issues);
        issues
    }

    #[test]
    fn test_error_values() {
        let workbook = single_sheet(
            "Model",
            vec![
                vec![num(1.0), CellContent::Error(CellError::Div0)],
                vec![CellContent::Error(CellError::Na), text("ok")],
            ],
        );
        let issues = run(&workbook);

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].location(), "Model!Row1:Col2");
        assert_eq!(issues[0].detail(), "Cell contains error value: #DIV/0!");
        assert_eq!(
            issues[0].explanation().cause,
            "A formula is dividing by zero or an empty cell."
        );
    }

    #[test]
    fn test_error_text() {
        let workbook = single_sheet("S", vec![vec![text("see #REF! above")]]);
        let issues = run(&workbook);

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].detail(), "Cell contains error value: see #REF! above");
        assert!(issues[0].explanation().cause.contains("deleted"));
    }
}
