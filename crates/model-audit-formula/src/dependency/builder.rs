//! Builds a [`DependencyGraph`] from formula tables

use super::{DependencyGraph, NodeStatus, ParseFailure};
use crate::reference::{resolve_all, NodeId};
use crate::tokenizer::tokenize;
use model_audit_core::{CellTable, Workbook, MAX_COLS, MAX_ROWS};

/// Incremental graph builder.
///
/// Every formula cell becomes a node, even when it reads nothing, and gets
/// one edge per distinct reference it makes. Cells whose formula cannot be
/// tokenized are kept as [`NodeStatus::ParseError`] nodes without edges.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    graph: DependencyGraph,
}

impl GraphBuilder {
    /// Create a builder with an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from `(sheet name, formula table)` pairs
    pub fn build<'a, I>(sheets: I) -> DependencyGraph
    where
        I: IntoIterator<Item = (&'a str, &'a CellTable)>,
    {
        let mut builder = Self::new();
        for (name, formulas) in sheets {
            builder.add_sheet(name, formulas);
        }
        builder.finish()
    }

    /// Build a graph from every sheet of a workbook
    pub fn build_workbook(workbook: &Workbook) -> DependencyGraph {
        Self::build(workbook.worksheets().map(|ws| (ws.name(), ws.formulas())))
    }

    /// Add every formula cell of one sheet
    pub fn add_sheet(&mut self, sheet: &str, formulas: &CellTable) -> &mut Self {
        let before = self.graph.formula_cell_count();
        for (row, col, content) in formulas.iter_cells() {
            let Some(formula) = content.as_formula() else {
                continue;
            };
            match (u32::try_from(row), u16::try_from(col)) {
                (Ok(row), Ok(col)) if row < MAX_ROWS && col < MAX_COLS => {
                    self.add_formula(sheet, row, col, formula);
                }
                _ => tracing::warn!(sheet, row, col, "formula cell outside sheet bounds skipped"),
            }
        }
        tracing::debug!(
            sheet,
            formula_cells = self.graph.formula_cell_count() - before,
            "added sheet to dependency graph"
        );
        self
    }

    /// Add one formula cell (0-based row and column)
    pub fn add_formula(&mut self, sheet: &str, row: u32, col: u16, formula: &str) -> &mut Self {
        if !formula.starts_with('=') {
            return self;
        }

        let node = NodeId::cell(sheet, row, col);
        self.graph.record_formula_cell();

        match tokenize(formula) {
            Ok(tokens) => {
                self.graph.add_node(node.clone(), NodeStatus::Formula);
                for target in resolve_all(&tokens, sheet) {
                    self.graph.add_dependency(target, node.clone());
                }
            }
            Err(error) => {
                tracing::debug!(cell = %node, %error, "formula could not be tokenized");
                self.graph.record_parse_failure(ParseFailure {
                    node,
                    formula: formula.to_string(),
                    error,
                });
            }
        }
        self
    }

    /// Finish building and return the graph
    pub fn finish(self) -> DependencyGraph {
        tracing::debug!(
            nodes = self.graph.node_count(),
            edges = self.graph.edge_count(),
            formula_cells = self.graph.formula_cell_count(),
            parse_failures = self.graph.parse_failures().len(),
            "dependency graph built"
        );
        self.graph
    }
}
