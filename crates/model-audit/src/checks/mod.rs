//! Audit checks
//!
//! Each check is a total function over the workbook and graph: it appends
//! zero or more findings and never fails.

mod balance_sheet;
mod calculation_errors;
mod circular_references;
mod external_links;
mod hardcoded_plugs;

pub use balance_sheet::BalanceSheetCheck;
pub use calculation_errors::CalculationErrorCheck;
pub use circular_references::CircularReferenceCheck;
pub use external_links::ExternalLinkCheck;
pub use hardcoded_plugs::HardcodedPlugCheck;

use crate::issue::{Issue, IssueKind};
use model_audit_core::Workbook;
use model_audit_formula::{DependencyGraph, StructureStats};

/// Everything a check may read
#[derive(Debug, Clone, Copy)]
pub struct AuditContext<'a> {
    pub workbook: &'a Workbook,
    pub graph: &'a DependencyGraph,
    /// Precomputed structural stats, when the caller has them
    pub structure: Option<&'a StructureStats>,
}

/// A single audit check
pub trait AuditCheck: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Kind of finding this check raises
    fn kind(&self) -> IssueKind;

    /// Append findings to `issues`
    fn check(&self, context: &AuditContext<'_>, issues: &mut Vec<Issue>);
}

#[cfg(test)]
pub(crate) mod test_support {
    use model_audit_core::{CellContent, CellTable, Workbook};

    /// A workbook with one sheet whose value and formula tables are equal
    pub fn single_sheet(name: &str, rows: Vec<Vec<CellContent>>) -> Workbook {
        let table = CellTable::from_rows(rows);
        let mut workbook = Workbook::new();
        workbook.add_sheet(name, table.clone(), table).unwrap();
        workbook
    }

    pub fn num(n: f64) -> CellContent {
        CellContent::Number(n)
    }

    pub fn text(s: &str) -> CellContent {
        CellContent::text(s)
    }

    pub fn formula(s: &str) -> CellContent {
        CellContent::formula(s)
    }
}
