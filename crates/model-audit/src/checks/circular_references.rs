use super::{AuditCheck, AuditContext};
use crate::issue::{Issue, IssueKind, Severity};
use model_audit_formula::{find_cycles, CycleLimits, NodeId};

/// Raises one finding summarizing the graph's circular references
#[derive(Debug, Default)]
pub struct CircularReferenceCheck {
    limits: CycleLimits,
}

impl CircularReferenceCheck {
    /// Limits used when no precomputed structure is available
    pub fn new(limits: CycleLimits) -> Self {
        Self { limits }
    }

    fn render_cycle(cycle: &[NodeId]) -> String {
        let mut parts: Vec<&str> = cycle.iter().map(|n| n.as_str()).collect();
        if let Some(first) = cycle.first() {
            parts.push(first.as_str());
        }
        parts.join(" -> ")
    }
}

impl AuditCheck for CircularReferenceCheck {
    fn name(&self) -> &'static str {
        "circular-references"
    }

    fn kind(&self) -> IssueKind {
        IssueKind::CircularReference
    }

    fn check(&self, context: &AuditContext<'_>, issues: &mut Vec<Issue>) {
        let (count, truncated, samples) = match context.structure {
            Some(stats) => (
                stats.circular_references,
                stats.cycles_truncated,
                stats.cycle_samples.clone(),
            ),
            None => {
                let report = find_cycles(context.graph, &self.limits);
                (report.count, report.truncated, report.samples)
            }
        };

        if count == 0 {
            return;
        }

        let bound = if truncated { "at least " } else { "" };
        let examples: Vec<String> = samples
            .iter()
            .take(5)
            .map(|cycle| Self::render_cycle(cycle))
            .collect();

        let mut detail = format!("Detected {}{} circular reference chain(s).", bound, count);
        if !examples.is_empty() {
            detail.push_str(&format!(" Examples: {}", examples.join("; ")));
        }

        let location = samples
            .first()
            .and_then(|cycle| cycle.first())
            .map(|node| node.as_str().to_string())
            .unwrap_or_else(|| "Workbook".to_string());

        issues.push(Issue::new(self.kind(), Severity::High, location, detail));
    }
}
