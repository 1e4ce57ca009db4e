//! # model-audit-formula
//!
//! Formula analysis for model-audit.
//!
//! This crate provides:
//! - Formula tokenizing (text -> flat token stream)
//! - Reference classification and resolution into graph node identities
//! - Shared formula translation for XLSX ingestion
//! - A dependency graph over formula cells, its builder, and structural
//!   analysis (elementary cycles, orphans, density)
//!
//! ## Example
//!
//! ```rust
//! use model_audit_core::{CellContent, CellTable};
//! use model_audit_formula::{analyze, GraphBuilder};
//!
//! let inputs = CellTable::from_rows(vec![vec![CellContent::Number(10.0)]]);
//! let summary = CellTable::from_rows(vec![vec![CellContent::formula("=PFNA!A1+100")]]);
//!
//! let graph = GraphBuilder::build([("PFNA", &inputs), ("Summary", &summary)]);
//! assert!(graph.has_edge("PFNA!A1", "Summary!A1"));
//!
//! let stats = analyze(&graph);
//! assert_eq!(stats.circular_references, 0);
//! ```

pub mod dependency;
pub mod error;
pub mod reference;
pub mod structure;
pub mod tokenizer;
pub mod translate;

pub use dependency::{
    find_cycles, CycleLimits, CycleReport, DependencyGraph, GraphBuilder, NodeStatus,
    ParseFailure,
};
pub use error::{FormulaError, FormulaResult};
pub use reference::{classify, resolve, resolve_all, NodeId, ReferenceKind};
pub use structure::{analyze, analyze_with, StructureStats};
pub use tokenizer::{tokenize, OperandKind, Token, TokenKind};
pub use translate::translate;
