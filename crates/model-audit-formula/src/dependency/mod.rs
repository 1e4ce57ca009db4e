//! Dependency graph over formula cells
//!
//! An edge `A -> B` means the formula in B reads A. Nodes are interned in
//! insertion order so every traversal over the graph is deterministic.

mod builder;
mod cycles;

pub use builder::GraphBuilder;
pub use cycles::{find_cycles, CycleLimits, CycleReport};

use crate::error::FormulaError;
use crate::reference::NodeId;
use ahash::{AHashMap, AHashSet};

/// How a node entered the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum NodeStatus {
    /// Only ever seen as a reference target
    Referenced,
    /// A formula cell whose references were all resolved
    Formula,
    /// A formula cell whose text could not be tokenized
    ParseError,
}

/// A formula cell the builder could not tokenize
#[derive(Debug, Clone, PartialEq)]
pub struct ParseFailure {
    pub node: NodeId,
    pub formula: String,
    pub error: FormulaError,
}

#[derive(Debug, Clone)]
struct NodeData {
    id: NodeId,
    status: NodeStatus,
}

/// Directed dependency graph keyed by [`NodeId`]
#[derive(Debug, Default, Clone)]
pub struct DependencyGraph {
    nodes: Vec<NodeData>,
    index: AHashMap<NodeId, usize>,
    /// Node -> nodes that read it
    dependents: Vec<Vec<usize>>,
    /// Node -> nodes it reads
    precedents: Vec<Vec<usize>>,
    edges: AHashSet<(usize, usize)>,
    formula_cells: usize,
    parse_failures: Vec<ParseFailure>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node, or upgrade the status of an existing one.
    ///
    /// A node first seen as a reference target becomes a formula node once
    /// its own formula is processed; the reverse never happens.
    pub fn add_node(&mut self, id: NodeId, status: NodeStatus) -> usize {
        if let Some(&idx) = self.index.get(&id) {
            if status != NodeStatus::Referenced {
                self.nodes[idx].status = status;
            }
            return idx;
        }

        let idx = self.nodes.len();
        self.index.insert(id.clone(), idx);
        self.nodes.push(NodeData { id, status });
        self.dependents.push(Vec::new());
        self.precedents.push(Vec::new());
        idx
    }

    /// Add a dependency: `dependent` reads `precedent`.
    ///
    /// Returns `false` when the edge was already present.
    pub fn add_dependency(&mut self, precedent: NodeId, dependent: NodeId) -> bool {
        let from = self.add_node(precedent, NodeStatus::Referenced);
        let to = self.add_node(dependent, NodeStatus::Referenced);
        if !self.edges.insert((from, to)) {
            return false;
        }
        self.dependents[from].push(to);
        self.precedents[to].push(from);
        true
    }

    pub(crate) fn record_formula_cell(&mut self) {
        self.formula_cells += 1;
    }

    pub(crate) fn record_parse_failure(&mut self, failure: ParseFailure) {
        self.add_node(failure.node.clone(), NodeStatus::ParseError);
        self.parse_failures.push(failure);
    }

    /// Number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of distinct edges
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Formula cells processed while building the graph
    pub fn formula_cell_count(&self) -> usize {
        self.formula_cells
    }

    /// Formula cells that could not be tokenized
    pub fn parse_failures(&self) -> &[ParseFailure] {
        &self.parse_failures
    }

    /// Whether a node exists
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Status of a node
    pub fn status(&self, id: &str) -> Option<NodeStatus> {
        self.index.get(id).map(|&idx| self.nodes[idx].status)
    }

    /// Whether the edge `precedent -> dependent` exists
    pub fn has_edge(&self, precedent: &str, dependent: &str) -> bool {
        match (self.index.get(precedent), self.index.get(dependent)) {
            (Some(&from), Some(&to)) => self.edges.contains(&(from, to)),
            _ => false,
        }
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = &NodeId> + '_ {
        self.nodes.iter().map(|n| &n.id)
    }

    /// Nodes with their status, in insertion order
    pub fn nodes_with_status(&self) -> impl Iterator<Item = (&NodeId, NodeStatus)> + '_ {
        self.nodes.iter().map(|n| (&n.id, n.status))
    }

    /// Edges as `(precedent, dependent)` in insertion order of precedents
    pub fn edges(&self) -> impl Iterator<Item = (&NodeId, &NodeId)> + '_ {
        self.dependents.iter().enumerate().flat_map(move |(from, tos)| {
            tos.iter()
                .map(move |&to| (&self.nodes[from].id, &self.nodes[to].id))
        })
    }

    /// Nodes that read the given node
    pub fn dependents(&self, id: &str) -> impl Iterator<Item = &NodeId> + '_ {
        self.neighbours(&self.dependents, id)
    }

    /// Nodes the given node reads
    pub fn precedents(&self, id: &str) -> impl Iterator<Item = &NodeId> + '_ {
        self.neighbours(&self.precedents, id)
    }

    /// Number of nodes reading this node (0 for unknown nodes)
    pub fn out_degree(&self, id: &str) -> usize {
        self.index
            .get(id)
            .map_or(0, |&idx| self.dependents[idx].len())
    }

    /// Number of nodes this node reads (0 for unknown nodes)
    pub fn in_degree(&self, id: &str) -> usize {
        self.index
            .get(id)
            .map_or(0, |&idx| self.precedents[idx].len())
    }

    fn neighbours<'a>(
        &'a self,
        adjacency: &'a [Vec<usize>],
        id: &str,
    ) -> impl Iterator<Item = &'a NodeId> + 'a {
        self.index
            .get(id)
            .into_iter()
            .flat_map(move |&idx| adjacency[idx].iter().map(move |&n| &self.nodes[n].id))
    }

    // Index-level access for the traversal algorithms

    pub(crate) fn successors_of(&self, idx: usize) -> &[usize] {
        &self.dependents[idx]
    }

    pub(crate) fn in_degree_of(&self, idx: usize) -> usize {
        self.precedents[idx].len()
    }

    pub(crate) fn id_of(&self, idx: usize) -> &NodeId {
        &self.nodes[idx].id
    }
}
