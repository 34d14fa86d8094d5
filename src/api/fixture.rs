//! Implements the `FinanceApi` trait using a fixed, in-memory data set.
//!
//! Note: this is compiled into the production binary so that the whole report, top-to-bottom
//! including the email, can be exercised without the transaction service.

use crate::api::{FetchResult, FinanceApi};
use crate::model::{
    AccountBalances, Amount, BudgetStatus, CategoryBreakdown, CategorySpend, Period,
    SpendingSummary,
};
use rust_decimal::Decimal;
use serde_json::json;
use tracing::debug;

/// Serves the same figures for every period: 10,000 spent out of 20,000 earned.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureFinanceApi;

const TOTAL_SPENT: i64 = 10_000;
const TOTAL_INCOME: i64 = 20_000;

/// Seed categories, already largest first as the real service returns them.
const CATEGORIES: &[(&str, i64)] = &[
    ("Housing", 4_000),
    ("Food", 2_500),
    ("Grocery", 1_500),
    ("Transportation", 1_000),
    ("Entertainment", 1_000),
];

fn amount(value: i64) -> Amount {
    Amount::new(Decimal::from(value))
}

#[async_trait::async_trait]
impl FinanceApi for FixtureFinanceApi {
    async fn monthly_spending(&self, period: &Period) -> FetchResult<SpendingSummary> {
        debug!("Serving fixture spending for {period}");
        Ok(SpendingSummary::new(
            Some(amount(TOTAL_SPENT)),
            Some(amount(TOTAL_INCOME)),
        ))
    }

    async fn account_balances(&self) -> FetchResult<AccountBalances> {
        Ok(AccountBalances::new(json!({
            "Checking": 5230.12,
            "Savings": 15000.00,
            "Credit Card": -842.37
        })))
    }

    async fn top_spending_categories(
        &self,
        _period: &Period,
        limit: usize,
    ) -> FetchResult<CategoryBreakdown> {
        let categories = CATEGORIES
            .iter()
            .take(limit)
            .map(|(name, value)| CategorySpend::new(*name, amount(*value)))
            .collect();
        Ok(CategoryBreakdown::new(categories))
    }

    async fn budget_status(&self, period: &Period) -> FetchResult<BudgetStatus> {
        Ok(BudgetStatus::new(json!({
            "month": period.key(),
            "Housing": {"budgeted": 4000, "spent": 4000},
            "Food": {"budgeted": 3000, "spent": 2500},
            "Entertainment": {"budgeted": 800, "spent": 1000}
        })))
    }
}
