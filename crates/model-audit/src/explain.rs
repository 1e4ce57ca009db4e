//! Static explanations attached to every finding

use crate::issue::IssueKind;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;

/// Cause used when a calculation error's code is not in the table
pub const UNKNOWN_ERROR_CAUSE: &str = "Unknown error type.";

/// Why a finding matters, what usually causes it, and how to fix it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Explanation {
    pub why: &'static str,
    pub cause: &'static str,
    pub fix: &'static str,
}

enum Cause {
    Fixed(&'static str),
    /// First code contained in the offending value wins
    ByErrorCode(&'static [(&'static str, &'static str)]),
}

struct Entry {
    why: &'static str,
    cause: Cause,
    fix: &'static str,
}

const ERROR_CODE_CAUSES: &[(&str, &str)] = &[
    (
        "#REF!",
        "A formula references a cell that has been deleted, or a range that was invalidated.",
    ),
    (
        "#NAME?",
        "Excel doesn't recognize a function name (typo) or a named range that doesn't exist.",
    ),
    (
        "#VALUE!",
        "A formula has the wrong type of argument (e.g., text where a number is expected).",
    ),
    ("#DIV/0!", "A formula is dividing by zero or an empty cell."),
];

static EXPLANATIONS: Lazy<HashMap<IssueKind, Entry>> = Lazy::new(|| {
    let mut table = HashMap::new();
    table.insert(
        IssueKind::ExternalLink,
        Entry {
            why: "External links create dependencies on files that may not exist on other machines, \
                  causing #REF! errors when the model is shared. They also introduce version control \
                  risks if the source file changes without the model being updated.",
            cause: Cause::Fixed(
                "Usually created when copying data from another workbook using paste-link, or when \
                 formulas reference Bloomberg/FactSet/Capital IQ feeds directly.",
            ),
            fix: "Convert external links to static values (Paste Special > Values) for historical data. \
                  For live feeds, document the source and create a dedicated 'Data Inputs' sheet.",
        },
    );
    table.insert(
        IssueKind::CalculationError,
        Entry {
            why: "Excel errors propagate through the model: any cell referencing an error cell will \
                  also show an error. This can silently break valuation outputs and key metrics.",
            cause: Cause::ByErrorCode(ERROR_CODE_CAUSES),
            fix: "Trace the error back to its source using Excel's 'Trace Error' feature (Formulas > Error Checking). \
                  Fix the root cause rather than wrapping in IFERROR, which can hide real problems.",
        },
    );
    table.insert(
        IssueKind::HardcodedPlug,
        Entry {
            why: "A 'plug' is a hard-coded value inserted into a row of formulas to force a desired result. \
                  It breaks the logical flow of the model: changes to assumptions won't flow through \
                  correctly, and the model may produce misleading outputs without any warning.",
            cause: Cause::Fixed(
                "Often inserted when a model doesn't balance or produce expected results. Instead of \
                 fixing the underlying logic, an analyst may override a cell with a manual number. \
                 Also common in rushed model updates or when inheriting someone else's model.",
            ),
            fix: "1) Identify what the cell SHOULD be calculating. 2) Write the correct formula. \
                  3) If the formula produces unexpected results, trace upstream to find the real issue. \
                  Never use hard-coded values in projection periods unless they represent genuine assumptions.",
        },
    );
    table.insert(
        IssueKind::AccountingMismatch,
        Entry {
            why: "The fundamental accounting equation (Assets = Liabilities + Equity) must hold in every period. \
                  An imbalance means the model has a structural error: cash flows aren't routing correctly, \
                  or a balance sheet account is missing its corresponding entry.",
            cause: Cause::Fixed(
                "Common causes: (1) Working capital changes not flowing to cash flow statement, \
                 (2) Debt/equity issuances not hitting both cash and the liability/equity account, \
                 (3) Retained earnings not linking to net income, (4) Circular reference breaking the iteration.",
            ),
            fix: "Create a 'Balance Check' row that calculates Assets - Liabilities - Equity for each period. \
                  Find the first period where the imbalance appears and trace all entries in that period. \
                  Check that every cash movement has a corresponding balance sheet entry.",
        },
    );
    table.insert(
        IssueKind::CircularReference,
        Entry {
            why: "Circular references occur when a formula refers back to itself (directly or through a chain). \
                  While Excel can resolve some circular refs through iteration, they make models fragile \
                  and prone to convergence failures. They also make auditing extremely difficult.",
            cause: Cause::Fixed(
                "Most common in financial models: Interest expense depends on average debt, which depends on \
                 ending cash, which depends on net income, which includes interest expense. Also common \
                 with revolver/credit facility modeling.",
            ),
            fix: "Break the circularity by using beginning-of-period balances instead of averages, or by \
                  implementing a 'copy-paste values' macro that iterates until convergence. Document any \
                  intentional circular references clearly.",
        },
    );
    table
});

/// Look up the explanation for `kind`.
///
/// For calculation errors the cause depends on which code `error_value`
/// contains; without a value the cause is empty.
pub fn explain(kind: IssueKind, error_value: Option<&str>) -> Explanation {
    let Some(entry) = EXPLANATIONS.get(&kind) else {
        return Explanation::default();
    };

    let cause = match (&entry.cause, error_value) {
        (Cause::Fixed(cause), _) => *cause,
        (Cause::ByErrorCode(codes), Some(value)) => codes
            .iter()
            .find(|(code, _)| value.contains(code))
            .map(|(_, cause)| *cause)
            .unwrap_or(UNKNOWN_ERROR_CAUSE),
        (Cause::ByErrorCode(_), None) => "",
    };

    Explanation {
        why: entry.why,
        cause,
        fix: entry.fix,
    }
}
