use super::{AuditCheck, AuditContext};
use crate::issue::{Issue, IssueKind, Severity};
use crate::options::PlugHeuristic;
use model_audit_core::Worksheet;

/// Flags hard-coded values sitting in rows that are otherwise formulas.
///
/// Leading label and historical columns are skipped; blanks are ignored.
#[derive(Debug, Default)]
pub struct HardcodedPlugCheck {
    settings: PlugHeuristic,
}

impl HardcodedPlugCheck {
    pub fn new(settings: PlugHeuristic) -> Self {
        Self { settings }
    }

    fn is_excluded(&self, sheet_name: &str) -> bool {
        let lower = sheet_name.to_lowercase();
        self.settings
            .excluded_sheet_markers
            .iter()
            .any(|marker| lower.contains(&marker.to_lowercase()))
    }

    fn check_sheet(&self, sheet: &Worksheet, issues: &mut Vec<Issue>) {
        let skip = self.settings.skip_columns;

        for (row_index, row) in sheet.formulas().iter_rows().enumerate() {
            let mut formulas = 0usize;
            let mut plug_columns = Vec::new();

            for (col, content) in row.iter().enumerate().skip(skip) {
                if content.is_blank() {
                    continue;
                }
                if content.is_formula() {
                    formulas += 1;
                } else {
                    plug_columns.push(col + 1);
                }
            }

            let total = formulas + plug_columns.len();
            if total <= self.settings.min_cells || plug_columns.is_empty() {
                continue;
            }
            if formulas as f64 / total as f64 <= self.settings.formula_ratio {
                continue;
            }

            let columns: Vec<String> = plug_columns.iter().map(|c| c.to_string()).collect();
            issues.push(Issue::new(
                IssueKind::HardcodedPlug,
                Severity::High,
                format!("{}!Row{}", sheet.name(), row_index + 1),
                format!(
                    "Row has {} formulas and {} hardcodes in projection columns. Plug at col(s): [{}]",
                    formulas,
                    plug_columns.len(),
                    columns.join(", ")
                ),
            ));
        }
    }
}

impl AuditCheck for HardcodedPlugCheck {
    fn name(&self) -> &'static str {
        "hardcoded-plugs"
    }

    fn kind(&self) -> IssueKind {
        IssueKind::HardcodedPlug
    }

    fn check(&self, context: &AuditContext<'_>, issues: &mut Vec<Issue>) {
        for sheet in context.workbook.worksheets() {
            if self.is_excluded(sheet.name()) {
                tracing::debug!(sheet = sheet.name(), "skipping sheet for plug scan");
                continue;
            }
            self.check_sheet(sheet, issues);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::test_support::*;
    use model_audit_core::{CellContent, Workbook};
    use model_audit_formula::DependencyGraph;
    use pretty_assertions::assert_eq;

    fn run(workbook: &Workbook, settings: PlugHeuristic) -> Vec<Issue> {
        let graph = DependencyGraph::new();
        let context = AuditContext {
            workbook,
            graph: &graph,
            structure: None,
        };
        let mut issues = Vec::new();
        HardcodedPlugCheck::new(settings).check(&context, &mut issues);
        issues
    }

    /// Label and two historicals, then the given projection cells
    fn row(projection: Vec<CellContent>) -> Vec<CellContent> {
        let mut cells = vec![text("Revenue"), num(90.0), num(95.0)];
        cells.extend(projection);
        cells
    }

    #[test]
    fn test_plug_detected() {
        let f = || formula("=D1*1.05");
        let workbook = single_sheet(
            "Model",
            vec![row(vec![f(), f(), f(), f(), f(), f(), num(120.0)])],
        );
        let issues = run(&workbook, PlugHeuristic::default());

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].location(), "Model!Row1");
        assert_eq!(
            issues[0].detail(),
            "Row has 6 formulas and 1 hardcodes in projection columns. Plug at col(s): [10]"
        );
    }

    #[test]
    fn test_six_cells_with_one_hardcode() {
        let f = || formula("=D1*1.05");
        let workbook = single_sheet(
            "Model",
            vec![row(vec![f(), f(), f(), f(), f(), num(120.0)])],
        );
        let issues = run(&workbook, PlugHeuristic::default());

        assert_eq!(issues.len(), 1);
        assert_eq!(
            issues[0].detail(),
            "Row has 5 formulas and 1 hardcodes in projection columns. Plug at col(s): [9]"
        );
    }

    #[test]
    fn test_all_formulas_is_not_a_plug() {
        let f = || formula("=D1*1.05");
        let workbook = single_sheet("Model", vec![row(vec![f(), f(), f(), f(), f(), f()])]);
        assert!(run(&workbook, PlugHeuristic::default()).is_empty());
    }

    #[test]
    fn test_five_cells_is_not_enough() {
        let f = || formula("=D1");
        let workbook = single_sheet("Model", vec![row(vec![f(), f(), f(), f(), num(1.0)])]);
        assert!(run(&workbook, PlugHeuristic::default()).is_empty());
    }

    #[test]
    fn test_ratio_must_exceed_threshold() {
        let f = || formula("=D1");
        // 7 formulas of 10 is exactly 0.7
        let mut cells = vec![f(), f(), f(), f(), f(), f(), f()];
        cells.extend([num(1.0), num(2.0), num(3.0)]);
        let workbook = single_sheet("Model", vec![row(cells)]);
        assert!(run(&workbook, PlugHeuristic::default()).is_empty());
    }

    #[test]
    fn test_all_formulas_and_blanks() {
        let f = || formula("=D1");
        let workbook = single_sheet(
            "Model",
            vec![row(vec![
                f(),
                CellContent::Blank,
                f(),
                f(),
                f(),
                f(),
                f(),
            ])],
        );
        assert!(run(&workbook, PlugHeuristic::default()).is_empty());
    }

    #[test]
    fn test_excluded_sheets() {
        let f = || formula("=D1");
        let cells = vec![f(), f(), f(), f(), f(), f(), num(1.0)];
        let raw = single_sheet("Raw Data", vec![row(cells.clone())]);
        let cache = single_sheet("PriceCache", vec![row(cells)]);

        assert!(run(&raw, PlugHeuristic::default()).is_empty());
        assert!(run(&cache, PlugHeuristic::default()).is_empty());
    }

    #[test]
    fn test_skip_columns_setting() {
        let f = || formula("=A1");
        let workbook = single_sheet(
            "Model",
            vec![vec![num(1.0), f(), f(), f(), f(), f(), f()]],
        );
        assert!(run(&workbook, PlugHeuristic::default()).is_empty());

        let settings = PlugHeuristic {
            skip_columns: 0,
            ..PlugHeuristic::default()
        };
        let issues = run(&workbook, settings);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].detail().ends_with("Plug at col(s): [1]"));
    }
}
