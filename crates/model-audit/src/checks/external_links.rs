use super::{AuditCheck, AuditContext};
use crate::issue::{Issue, IssueKind, Severity};

/// Flags every external workbook node in the graph, once per node
#[derive(Debug, Default)]
pub struct ExternalLinkCheck;

impl AuditCheck for ExternalLinkCheck {
    fn name(&self) -> &'static str {
        "external-links"
    }

    fn kind(&self) -> IssueKind {
        IssueKind::ExternalLink
    }

    fn check(&self, context: &AuditContext<'_>, issues: &mut Vec<Issue>) {
        for node in context.graph.nodes().filter(|node| node.is_external()) {
            issues.push(Issue::new(
                self.kind(),
                Severity::Medium,
                node.as_str(),
                "Dependency on external workbook/source detected.",
            ));
        }
    }
}
