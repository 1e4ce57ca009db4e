use super::{AuditCheck, AuditContext};
use crate::issue::{Issue, IssueKind, Severity};
use crate::options::BalanceCheck;
use model_audit_core::{CellTable, Workbook, Worksheet};

/// Checks that total assets equal total liabilities and equity in every
/// period of the balance sheet
#[derive(Debug, Default)]
pub struct BalanceSheetCheck {
    settings: BalanceCheck,
}

impl BalanceSheetCheck {
    pub fn new(settings: BalanceCheck) -> Self {
        Self { settings }
    }

    fn find_sheet<'a>(&self, workbook: &'a Workbook) -> Option<&'a Worksheet> {
        workbook.worksheets().find(|sheet| {
            let lower = sheet.name().to_lowercase();
            self.settings
                .sheet_markers
                .iter()
                .any(|marker| lower.contains(&marker.to_lowercase()))
        })
    }

    /// Rows holding the two totals; later matches win
    fn find_total_rows(values: &CellTable) -> (Option<usize>, Option<usize>) {
        let mut assets = None;
        let mut liabilities_and_equity = None;

        for col in 0..2 {
            for row in 0..values.rows() {
                let label = values.get(row, col).as_label().to_lowercase();
                if label.contains("total assets") {
                    assets = Some(row);
                }
                if label.contains("total liabilities") && label.contains("equity") {
                    liabilities_and_equity = Some(row);
                }
            }
        }

        (assets, liabilities_and_equity)
    }
}

impl AuditCheck for BalanceSheetCheck {
    fn name(&self) -> &'static str {
        "balance-sheet"
    }

    fn kind(&self) -> IssueKind {
        IssueKind::AccountingMismatch
    }

    fn check(&self, context: &AuditContext<'_>, issues: &mut Vec<Issue>) {
        let Some(sheet) = self.find_sheet(context.workbook) else {
            tracing::debug!("no balance sheet found");
            return;
        };
        let values = sheet.values();

        let (Some(assets), Some(liabilities)) = Self::find_total_rows(values) else {
            tracing::debug!(sheet = sheet.name(), "balance sheet totals not found");
            return;
        };

        let variances: Vec<(usize, f64)> = (2..values.cols())
            .map(|col| {
                let a = values.get(assets, col).coerce_number();
                let b = values.get(liabilities, col).coerce_number();
                (col, a - b)
            })
            .collect();

        let total: f64 = variances.iter().map(|(_, v)| v.abs()).sum();
        if total <= self.settings.tolerance {
            return;
        }

        let periods: Vec<usize> = variances
            .iter()
            .filter(|(_, v)| v.abs() > self.settings.period_threshold)
            .map(|(col, _)| *col)
            .collect();
        let listed: Vec<String> = periods
            .iter()
            .take(self.settings.max_periods_listed)
            .map(|c| c.to_string())
            .collect();
        let more = if periods.len() > self.settings.max_periods_listed {
            "..."
        } else {
            ""
        };

        issues.push(Issue::new(
            self.kind(),
            Severity::Critical,
            sheet.name(),
            format!(
                "Balance Sheet does not balance. Total Variance: ${}. Out-of-balance periods: [{}]{}",
                format_currency(total),
                listed.join(", "),
                more
            ),
        ));
    }
}

/// `1234567.891` -> `1,234,567.89`
fn format_currency(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}
