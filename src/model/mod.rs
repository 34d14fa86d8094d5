//! Types describing the data that flows through one report run.

mod amount;
mod finance;
mod period;
mod report;

pub use amount::{Amount, AmountError};
pub use finance::{
    AccountBalances, BalanceRow, BudgetStatus, CategoryBreakdown, CategorySpend, SpendingSummary,
};
pub use period::Period;
pub use report::{subject_line, Income, ReportData, ReportDocument, ReportResult, Spending};
