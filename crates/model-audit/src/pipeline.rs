//! End-to-end audit pipeline: ingest, build, analyze, audit, rate

use crate::audit::Auditor;
use crate::complexity::{rate, ComplexityRating};
use crate::error::{Error, Result};
use crate::issue::{Issue, Severity};
use crate::options::AuditOptions;
use model_audit_core::{SkippedSheet, Workbook};
use model_audit_csv::{CsvReadOptions, CsvReader};
use model_audit_formula::{analyze_with, GraphBuilder, StructureStats};
use model_audit_xlsx::XlsxReader;
use serde::Serialize;
use std::path::Path;

/// Everything one audit run produces
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    /// Model name, usually the input file name
    pub model: String,
    pub sheet_count: usize,
    pub formula_cells: usize,
    pub skipped_sheets: Vec<SkippedSheet>,
    pub structure: StructureStats,
    pub complexity: ComplexityRating,
    pub issues: Vec<Issue>,
}

impl AuditReport {
    /// Findings of one severity, in the order they were raised
    pub fn issues_with_severity(&self, severity: Severity) -> impl Iterator<Item = &Issue> + '_ {
        self.issues.iter().filter(move |i| i.severity() == severity)
    }

    /// Number of findings of one severity
    pub fn count(&self, severity: Severity) -> usize {
        self.issues_with_severity(severity).count()
    }
}

/// Open a workbook, choosing the reader from the file extension
pub fn open_workbook<P: AsRef<Path>>(path: P) -> Result<Workbook> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match extension.as_deref() {
        Some("xlsx") | Some("xlsm") => Ok(XlsxReader::read_file(path)?),
        Some("csv") => Ok(CsvReader::read_file(path, &CsvReadOptions::default())?),
        _ => Err(Error::UnsupportedFormat(path.display().to_string())),
    }
}

/// Open and audit a file
pub fn run_audit<P: AsRef<Path>>(path: P, options: &AuditOptions) -> Result<AuditReport> {
    let path = path.as_ref();
    tracing::info!(path = %path.display(), "ingesting workbook");
    let workbook = open_workbook(path)?;

    let model = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("workbook")
        .to_string();
    Ok(audit_workbook(model, &workbook, options))
}

/// Audit a workbook already in memory
pub fn audit_workbook(
    model: impl Into<String>,
    workbook: &Workbook,
    options: &AuditOptions,
) -> AuditReport {
    let model = model.into();

    tracing::info!(
        model = %model,
        sheets = workbook.sheet_count(),
        skipped = workbook.skipped_sheets().len(),
        "building dependency graph"
    );
    let graph = GraphBuilder::build_workbook(workbook);

    tracing::info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "analyzing structure"
    );
    let structure = analyze_with(&graph, &options.cycles);

    tracing::info!("running audit checks");
    let issues = Auditor::new(workbook, &graph, options)
        .with_structure(&structure)
        .run();

    let complexity = rate(workbook.sheet_count(), graph.node_count(), graph.edge_count());

    AuditReport {
        model,
        sheet_count: workbook.sheet_count(),
        formula_cells: graph.formula_cell_count(),
        skipped_sheets: workbook.skipped_sheets().to_vec(),
        structure,
        complexity,
        issues,
    }
}
