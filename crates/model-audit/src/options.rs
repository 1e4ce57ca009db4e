//! Audit options
//!
//! Every struct has a `Default` matching the stock heuristics and
//! deserializes with `#[serde(default)]`, so a config file only needs the
//! fields it changes.

use crate::error::Result;
use model_audit_formula::CycleLimits;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for the hard-coded plug heuristic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlugHeuristic {
    /// Leading columns ignored in each row (labels and historicals)
    pub skip_columns: usize,
    /// A row needs strictly more non-blank cells than this
    pub min_cells: usize,
    /// A row needs a formula share strictly above this
    pub formula_ratio: f64,
    /// Sheets whose lower-cased name contains one of these are skipped
    pub excluded_sheet_markers: Vec<String>,
}

impl Default for PlugHeuristic {
    fn default() -> Self {
        Self {
            skip_columns: 3,
            min_cells: 5,
            formula_ratio: 0.7,
            excluded_sheet_markers: vec!["raw".to_string(), "cache".to_string()],
        }
    }
}

/// Settings for the balance sheet check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceCheck {
    /// The first sheet whose lower-cased name contains one of these is used
    pub sheet_markers: Vec<String>,
    /// Total absolute variance allowed before a finding is raised
    pub tolerance: f64,
    /// A period is out of balance above this absolute variance
    pub period_threshold: f64,
    /// How many out-of-balance periods to list in the detail
    pub max_periods_listed: usize,
}

impl Default for BalanceCheck {
    fn default() -> Self {
        Self {
            sheet_markers: vec!["balance".to_string(), "bs".to_string()],
            tolerance: 1.0,
            period_threshold: 0.01,
            max_periods_listed: 5,
        }
    }
}

/// Options for a full audit run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditOptions {
    pub plug: PlugHeuristic,
    pub balance: BalanceCheck,
    /// Bounds on cycle enumeration
    pub cycles: CycleLimits,
    /// Raise a finding when the graph has cycles
    pub report_cycles: bool,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            plug: PlugHeuristic::default(),
            balance: BalanceCheck::default(),
            cycles: CycleLimits::default(),
            report_cycles: true,
        }
    }
}

impl AuditOptions {
    /// Parse options from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load options from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let options =
            AuditOptions::from_json(r#"{"plug": {"skip_columns": 1}, "report_cycles": false}"#)
                .unwrap();

        assert_eq!(options.plug.skip_columns, 1);
        assert_eq!(options.plug.min_cells, 5);
        assert_eq!(options.balance, BalanceCheck::default());
        assert_eq!(options.cycles, CycleLimits::default());
        assert!(!options.report_cycles);
    }

    #[test]
    fn test_cycle_limits_from_json() {
        let options =
            AuditOptions::from_json(r#"{"cycles": {"max_cycles": 10, "time_budget_ms": null}}"#)
                .unwrap();
        assert_eq!(options.cycles.max_cycles, 10);
        assert_eq!(options.cycles.time_budget_ms, None);
        assert_eq!(options.cycles.sample_limit, 5);
    }

    #[test]
    fn test_invalid_json() {
        assert!(AuditOptions::from_json("{ not json").is_err());
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"balance": {{"tolerance": 5.0}}}}"#).unwrap();

        let options = AuditOptions::from_json_file(file.path()).unwrap();
        assert_eq!(options.balance.tolerance, 5.0);
    }
}
