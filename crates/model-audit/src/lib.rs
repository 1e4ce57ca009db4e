//! # model-audit
//!
//! Audits spreadsheet financial models for structural and numerical
//! integrity problems.
//!
//! A run ingests a workbook ([`open_workbook`]), builds a dependency graph
//! of its formula cells, computes structural statistics, and runs a fixed
//! set of [`checks`] that each raise zero or more [`Issue`]s:
//!
//! - External links to other workbooks
//! - Calculation errors (`#REF!`, `#NAME?`, `#VALUE!`, `#DIV/0!`)
//! - Hard-coded plugs in rows of projection formulas
//! - Balance sheets where assets differ from liabilities and equity
//! - Circular references
//!
//! ## Example
//!
//! ```rust,no_run
//! use model_audit::{run_audit, AuditOptions, Severity};
//!
//! let report = run_audit("model.xlsx", &AuditOptions::default()).unwrap();
//! for issue in report.issues_with_severity(Severity::Critical) {
//!     println!("{}", issue);
//! }
//! ```

pub mod audit;
pub mod checks;
pub mod complexity;
pub mod error;
pub mod explain;
pub mod issue;
pub mod options;
pub mod pipeline;

pub use audit::Auditor;
pub use checks::{AuditCheck, AuditContext};
pub use complexity::{rate, ComplexityRating};
pub use error::{Error, Result};
pub use explain::{explain, Explanation};
pub use issue::{Issue, IssueKind, Severity};
pub use options::{AuditOptions, BalanceCheck, PlugHeuristic};
pub use pipeline::{audit_workbook, open_workbook, run_audit, AuditReport};

// Re-export the building blocks
pub use model_audit_core::{CellContent, CellTable, SkippedSheet, Workbook, Worksheet};
pub use model_audit_csv::{CsvError, CsvReadOptions, CsvReader};
pub use model_audit_formula::{
    analyze, analyze_with, find_cycles, CycleLimits, DependencyGraph, GraphBuilder, NodeId,
    StructureStats,
};
pub use model_audit_xlsx::{XlsxError, XlsxReader};
