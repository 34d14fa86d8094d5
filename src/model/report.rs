use crate::metrics::SavingsMetrics;
use crate::model::{AccountBalances, Amount, CategoryBreakdown, Period};
use serde::Serialize;

/// Everything the report template sees, apart from the render timestamp which the renderer adds.
#[derive(Debug, Clone, Serialize)]
pub struct ReportData {
    pub month: String,
    pub title: String,
    pub spending: Spending,
    pub income: Income,
    pub savings: SavingsMetrics,
    pub balances: AccountBalances,
}

#[derive(Debug, Clone, Serialize)]
pub struct Spending {
    pub total: Amount,
    pub categories: CategoryBreakdown,
}

#[derive(Debug, Clone, Serialize)]
pub struct Income {
    pub total: Amount,
}

/// A rendered report, addressed and ready to hand to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportDocument {
    pub subject: String,
    pub html: String,
    pub to: Option<String>,
}

/// Builds the subject line used for the report email, e.g.
/// `Monthly Financial Report - March 2024`.
pub fn subject_line(title: &str, period: &Period) -> String {
    format!("{title} - {}", period.label())
}

/// The outcome handed back to whatever triggered a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportResult {
    pub success: bool,
    pub month: String,
}

impl ReportResult {
    pub(crate) fn sent(period: &Period) -> Self {
        Self {
            success: true,
            month: period.label(),
        }
    }
}
