//! Runs the audit checks over one workbook

use crate::checks::{
    AuditCheck, AuditContext, BalanceSheetCheck, CalculationErrorCheck, CircularReferenceCheck,
    ExternalLinkCheck, HardcodedPlugCheck,
};
use crate::issue::Issue;
use crate::options::AuditOptions;
use model_audit_core::Workbook;
use model_audit_formula::{DependencyGraph, StructureStats};

/// Linear pipeline of independent checks.
///
/// ```rust
/// use model_audit::{AuditOptions, Auditor};
/// use model_audit_core::Workbook;
/// use model_audit_formula::GraphBuilder;
///
/// let workbook = Workbook::new();
/// let graph = GraphBuilder::build_workbook(&workbook);
/// let issues = Auditor::new(&workbook, &graph, &AuditOptions::default()).run();
/// assert!(issues.is_empty());
/// ```
pub struct Auditor<'a> {
    workbook: &'a Workbook,
    graph: &'a DependencyGraph,
    structure: Option<&'a StructureStats>,
    checks: Vec<Box<dyn AuditCheck>>,
}

impl<'a> Auditor<'a> {
    /// Create an auditor with the standard checks configured from `options`
    pub fn new(workbook: &'a Workbook, graph: &'a DependencyGraph, options: &AuditOptions) -> Self {
        let mut checks: Vec<Box<dyn AuditCheck>> = vec![
            Box::new(ExternalLinkCheck),
            Box::new(CalculationErrorCheck),
            Box::new(HardcodedPlugCheck::new(options.plug.clone())),
            Box::new(BalanceSheetCheck::new(options.balance.clone())),
        ];
        if options.report_cycles {
            checks.push(Box::new(CircularReferenceCheck::new(options.cycles.clone())));
        }

        Self {
            workbook,
            graph,
            structure: None,
            checks,
        }
    }

    /// Reuse structural stats instead of enumerating cycles again
    pub fn with_structure(mut self, structure: &'a StructureStats) -> Self {
        self.structure = Some(structure);
        self
    }

    /// Append an extra check after the standard ones
    pub fn with_check(mut self, check: Box<dyn AuditCheck>) -> Self {
        self.checks.push(check);
        self
    }

    /// Run every check in order and return all findings
    pub fn run(&self) -> Vec<Issue> {
        let context = AuditContext {
            workbook: self.workbook,
            graph: self.graph,
            structure: self.structure,
        };

        let mut issues = Vec::new();
        for check in &self.checks {
            let before = issues.len();
            check.check(&context, &mut issues);
            tracing::debug!(
                check = check.name(),
                found = issues.len() - before,
                "audit check finished"
            );
        }

        tracing::info!(issues = issues.len(), "audit complete");
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::test_support::*;
    use crate::issue::{IssueKind, Severity};
    use model_audit_core::CellContent;
    use model_audit_formula::{analyze, GraphBuilder};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_checks_run_in_order() {
        let workbook = single_sheet(
            "Model",
            vec![vec![
                formula("='[Ext.xlsx]Feed'!A1"),
                CellContent::Error(model_audit_core::CellError::Ref),
                formula("=C1"),
            ]],
        );
        let graph = GraphBuilder::build_workbook(&workbook);
        let stats = analyze(&graph);

        let issues = Auditor::new(&workbook, &graph, &AuditOptions::default())
            .with_structure(&stats)
            .run();
        let kinds: Vec<_> = issues.iter().map(|i| i.kind()).collect();

        assert_eq!(
            kinds,
            vec![
                IssueKind::ExternalLink,
                IssueKind::CalculationError,
                IssueKind::CircularReference
            ]
        );
    }

    #[test]
    fn test_cycle_findings_can_be_disabled() {
        let workbook = single_sheet("S", vec![vec![formula("=A1")]]);
        let graph = GraphBuilder::build_workbook(&workbook);
        let options = AuditOptions {
            report_cycles: false,
            ..AuditOptions::default()
        };

        assert!(Auditor::new(&workbook, &graph, &options).run().is_empty());
    }

    struct AlwaysOne;

    impl AuditCheck for AlwaysOne {
        fn name(&self) -> &'static str {
            "always-one"
        }

        fn kind(&self) -> IssueKind {
            IssueKind::HardcodedPlug
        }

        fn check(&self, _context: &AuditContext<'_>, issues: &mut Vec<Issue>) {
            issues.push(Issue::new(self.kind(), Severity::High, "X", "y"));
        }
    }

    #[test]
    fn test_extra_check() {
        let workbook = single_sheet("S", vec![vec![num(1.0)]]);
        let graph = GraphBuilder::build_workbook(&workbook);
        let issues = Auditor::new(&workbook, &graph, &AuditOptions::default())
            .with_check(Box::new(AlwaysOne))
            .run();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].location(), "X");
    }
}
