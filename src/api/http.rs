//! Implements the `FinanceApi` trait over HTTPS JSON requests to the transaction service.

use crate::api::{FetchResult, FinanceApi, Operation};
use crate::error::ReportError;
use crate::model::{
    AccountBalances, BudgetStatus, CategoryBreakdown, Period, SpendingSummary,
};
use crate::Result;
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

/// How long a single request may take, connect through body, before it fails.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// A client for the transaction service. It holds no state besides the base URL and the
/// underlying connection pool, so it can be shared freely between concurrent reads.
#[derive(Debug, Clone)]
pub struct HttpFinanceApi {
    client: Client,
    base_url: Url,
}

impl HttpFinanceApi {
    /// Create a client rooted at `base_url`. Every request made with it times out after `timeout`.
    pub fn new(base_url: &Url, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .user_agent(concat!("finreport/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: with_trailing_slash(base_url),
        })
    }

    /// Issues one GET for `path` (relative to the base URL) and decodes the JSON body. Any failure,
    /// including a non-2xx status, becomes a `ReportError::Fetch` for `operation`.
    async fn get_json<T>(
        &self,
        operation: Operation,
        path: &str,
        query: &[(&str, String)],
    ) -> FetchResult<T>
    where
        T: DeserializeOwned,
    {
        let outcome = async {
            let url = self
                .base_url
                .join(path)
                .with_context(|| format!("Invalid request path '{path}'"))?;
            debug!("GET {url} for {operation}");

            let response = self
                .client
                .get(url)
                .query(query)
                .send()
                .await?
                .error_for_status()?;
            let body = response.json::<T>().await?;
            Ok::<T, anyhow::Error>(body)
        }
        .await;

        outcome.map_err(|e| {
            error!("Error fetching {operation}: {e:#}");
            ReportError::fetch(operation, e)
        })
    }
}

#[async_trait::async_trait]
impl FinanceApi for HttpFinanceApi {
    async fn monthly_spending(&self, period: &Period) -> FetchResult<SpendingSummary> {
        let path = format!("spending/monthly/{}", period.key());
        self.get_json(Operation::MonthlySpending, &path, &[]).await
    }

    async fn account_balances(&self) -> FetchResult<AccountBalances> {
        self.get_json(Operation::AccountBalances, "accounts/balances", &[])
            .await
    }

    async fn top_spending_categories(
        &self,
        period: &Period,
        limit: usize,
    ) -> FetchResult<CategoryBreakdown> {
        let path = format!("spending/categories/{}", period.key());
        self.get_json(
            Operation::TopSpendingCategories,
            &path,
            &[("limit", limit.to_string())],
        )
        .await
    }

    async fn budget_status(&self, period: &Period) -> FetchResult<BudgetStatus> {
        let path = format!("budget/status/{}", period.key());
        self.get_json(Operation::BudgetStatus, &path, &[]).await
    }
}

/// `Url::join` replaces the last path segment unless the base ends in a slash, so
/// `https://host/api` must become `https://host/api/` before paths are joined onto it.
fn with_trailing_slash(url: &Url) -> Url {
    let mut url = url.clone();
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
