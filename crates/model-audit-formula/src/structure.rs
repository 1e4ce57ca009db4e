//! Structural analysis of a dependency graph

use crate::dependency::{find_cycles, CycleLimits, DependencyGraph, NodeStatus};
use crate::reference::NodeId;

/// Structural statistics of a dependency graph
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct StructureStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub formula_cells: usize,
    pub parse_errors: usize,
    /// Elementary cycles, self-loops included
    pub circular_references: usize,
    /// Set when cycle enumeration hit a limit and the count is a lower bound
    pub cycles_truncated: bool,
    pub cycle_samples: Vec<Vec<NodeId>>,
    /// Nodes that are read by something but feed nothing
    pub orphaned_calculations: Vec<NodeId>,
    /// `edges / (nodes + 1)`
    pub complexity_score: f64,
}

/// Analyze a graph with the default cycle limits
pub fn analyze(graph: &DependencyGraph) -> StructureStats {
    analyze_with(graph, &CycleLimits::default())
}

/// Analyze a graph.
///
/// Read-only: running it twice on the same graph gives the same result.
pub fn analyze_with(graph: &DependencyGraph, limits: &CycleLimits) -> StructureStats {
    let cycles = find_cycles(graph, limits);
    let orphaned_calculations = orphans(graph);
    let node_count = graph.node_count();
    let edge_count = graph.edge_count();

    let stats = StructureStats {
        node_count,
        edge_count,
        formula_cells: graph.formula_cell_count(),
        parse_errors: graph
            .nodes_with_status()
            .filter(|(_, status)| *status == NodeStatus::ParseError)
            .count(),
        circular_references: cycles.count,
        cycles_truncated: cycles.truncated,
        cycle_samples: cycles.samples,
        orphaned_calculations,
        complexity_score: edge_count as f64 / (node_count as f64 + 1.0),
    };

    tracing::debug!(
        nodes = stats.node_count,
        edges = stats.edge_count,
        cycles = stats.circular_references,
        orphans = stats.orphaned_calculations.len(),
        "structure analyzed"
    );
    stats
}

/// Out-degree 0 and in-degree at least 1, in node insertion order
pub fn orphans(graph: &DependencyGraph) -> Vec<NodeId> {
    (0..graph.node_count())
        .filter(|&idx| graph.successors_of(idx).is_empty() && graph.in_degree_of(idx) > 0)
        .map(|idx| graph.id_of(idx).clone())
        .collect()
}
