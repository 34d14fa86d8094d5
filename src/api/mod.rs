//! Access to the external transaction service.
//!
//! The `FinanceApi` trait is the seam between the report pipeline and its data. `HttpFinanceApi`
//! talks to the real service; `FixtureFinanceApi` serves a fixed data set so that a complete report
//! can be produced and mailed without the service being reachable.

mod fixture;
mod http;

use crate::error::ReportError;
use crate::model::{
    AccountBalances, BudgetStatus, CategoryBreakdown, Period, SpendingSummary,
};
use crate::{Config, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use fixture::FixtureFinanceApi;
pub use http::{HttpFinanceApi, DEFAULT_TIMEOUT};

/// The number of spending categories a report shows.
pub const TOP_CATEGORIES: usize = 5;

/// The result type of `FinanceApi` calls. Errors are always `ReportError::Fetch` naming the
/// operation that failed.
pub type FetchResult<T> = std::result::Result<T, ReportError>;

/// Read operations offered by the transaction service. Each call is a single request; there is no
/// retrying at this level.
#[async_trait::async_trait]
pub trait FinanceApi: Send + Sync {
    /// Spending and income totals for `period`.
    async fn monthly_spending(&self, period: &Period) -> FetchResult<SpendingSummary>;

    /// Current balances of all accounts. These do not depend on the reporting period.
    async fn account_balances(&self) -> FetchResult<AccountBalances>;

    /// The `limit` largest spending categories for `period`, largest first.
    async fn top_spending_categories(
        &self,
        period: &Period,
        limit: usize,
    ) -> FetchResult<CategoryBreakdown>;

    /// Budget versus actual figures for `period`. Not part of the monthly report.
    async fn budget_status(&self, period: &Period) -> FetchResult<BudgetStatus>;
}

/// Names each `FinanceApi` read so that failures can say which one broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    #[serde(rename = "monthly spending")]
    MonthlySpending,
    #[serde(rename = "account balances")]
    AccountBalances,
    #[serde(rename = "top spending categories")]
    TopSpendingCategories,
    #[serde(rename = "budget status")]
    BudgetStatus,
}

serde_plain::derive_display_from_serialize!(Operation);
serde_plain::derive_fromstr_from_deserialize!(Operation);

/// Where a pipeline gets its data.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    serde::Serialize,
    serde::Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// The transaction service at the configured base URL.
    #[default]
    Live,
    /// A fixed, built-in data set. Needs no network access to the transaction service.
    Fixture,
}

serde_plain::derive_display_from_serialize!(Source);
serde_plain::derive_fromstr_from_deserialize!(Source);

/// Constructs the `FinanceApi` for `source`. A live source requires the API base URL to be
/// configured.
pub fn finance_api(config: &Config, source: Source) -> Result<Arc<dyn FinanceApi>> {
    Ok(match source {
        Source::Live => Arc::new(HttpFinanceApi::new(config.api_url()?, DEFAULT_TIMEOUT)?),
        Source::Fixture => Arc::new(FixtureFinanceApi),
    })
}
