//! The report pipeline: fetch, compute, render, dispatch.
//!
//! A run either completes every stage and sends exactly one email, or stops at the first failing
//! stage and sends nothing. The error returned says which stage failed.

use crate::api::{FinanceApi, TOP_CATEGORIES};
use crate::email::{Dispatcher, Email};
use crate::error::ReportError;
use crate::metrics::compute_metrics;
use crate::model::{
    subject_line, Income, Period, ReportData, ReportDocument, ReportResult, Spending,
};
use crate::render::Renderer;
use chrono::{Local, NaiveDate};
use std::sync::Arc;
use tracing::{error, info};

/// Settings the pipeline reads from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSettings {
    pub title: String,
    pub recipient: Option<String>,
}

/// Generates and sends the monthly report. The pipeline is stateless between runs; the data
/// source it is built with decides whether a run uses live or fixture data.
#[derive(Clone)]
pub struct ReportPipeline {
    source: Arc<dyn FinanceApi>,
    renderer: Arc<Renderer>,
    dispatcher: Dispatcher,
    settings: ReportSettings,
}

impl ReportPipeline {
    pub fn new(
        source: Arc<dyn FinanceApi>,
        renderer: Arc<Renderer>,
        dispatcher: Dispatcher,
        settings: ReportSettings,
    ) -> Self {
        Self {
            source,
            renderer,
            dispatcher,
            settings,
        }
    }

    /// Generates the report for the previous calendar month and emails it.
    pub async fn generate_and_send_report(&self) -> Result<ReportResult, ReportError> {
        self.run_for(Local::now().date_naive()).await
    }

    /// Generates the report for the month preceding `today` and emails it.
    pub async fn run_for(&self, today: NaiveDate) -> Result<ReportResult, ReportError> {
        let period = Period::preceding(today);
        info!("Generating report for {period}");
        match self.run(&period).await {
            Ok(result) => {
                info!("Report for {period} sent successfully");
                Ok(result)
            }
            Err(e) => {
                error!("Error generating report for {period}: {e}");
                Err(e)
            }
        }
    }

    async fn run(&self, period: &Period) -> Result<ReportResult, ReportError> {
        let data = self.collect(period).await?;
        let document = self.render(period, &data).await?;

        self.dispatcher
            .send(Email {
                subject: document.subject,
                html: document.html,
                to: document.to,
            })
            .await
            .map_err(ReportError::Delivery)?;

        Ok(ReportResult::sent(period))
    }

    /// Fetches all three data slices concurrently. The first failure fails the whole fetch.
    async fn collect(&self, period: &Period) -> Result<ReportData, ReportError> {
        let (summary, balances, categories) = tokio::try_join!(
            self.source.monthly_spending(period),
            self.source.account_balances(),
            self.source.top_spending_categories(period, TOP_CATEGORIES),
        )?;

        let total_spent = summary.total_spent();
        let total_income = summary.total_income();
        let savings = compute_metrics(total_spent.value(), total_income.value());

        Ok(ReportData {
            month: period.label(),
            title: self.settings.title.clone(),
            spending: Spending {
                total: total_spent,
                categories,
            },
            income: Income {
                total: total_income,
            },
            savings,
            balances,
        })
    }

    async fn render(
        &self,
        period: &Period,
        data: &ReportData,
    ) -> Result<ReportDocument, ReportError> {
        let html = self
            .renderer
            .render(data)
            .await
            .map_err(ReportError::Render)?;
        Ok(ReportDocument {
            subject: subject_line(&self.settings.title, period),
            html,
            to: self.settings.recipient.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{FixtureFinanceApi, Operation};
    use crate::test::{template_dir, StubApi, TestMailer};
    use tempfile::TempDir;

    fn settings() -> ReportSettings {
        ReportSettings {
            title: "Monthly Financial Report".into(),
            recipient: Some("me@example.com".into()),
        }
    }

    fn april_10_2024() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 10).unwrap()
    }

    fn pipeline(source: Arc<dyn FinanceApi>, mailer: &TestMailer) -> ReportPipeline {
        ReportPipeline::new(
            source,
            Arc::new(Renderer::new(template_dir())),
            Dispatcher::new(mailer.transport(), "reports@example.com", None),
            settings(),
        )
    }

    #[tokio::test]
    async fn test_end_to_end() {
        let api = Arc::new(StubApi::new(10_000, 20_000));
        let mailer = TestMailer::new();

        let result = pipeline(api.clone(), &mailer)
            .run_for(april_10_2024())
            .await
            .unwrap();

        assert_eq!(
            result,
            ReportResult {
                success: true,
                month: "March 2024".into()
            }
        );
        assert_eq!(api.calls(), 3);
        assert_eq!(api.periods(), vec!["2024-03", "2024-03"]);

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].subject, "Monthly Financial Report - March 2024");
        assert_eq!(sent[0].to, "me@example.com");
        assert!(sent[0].html.contains("$10,000.00"));
        assert!(sent[0].html.contains("50.0%"));
    }

    #[tokio::test]
    async fn test_january_reports_december_of_previous_year() {
        let api = Arc::new(StubApi::new(1, 2));
        let mailer = TestMailer::new();
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();

        let result = pipeline(api.clone(), &mailer).run_for(today).await.unwrap();

        assert_eq!(result.month, "December 2024");
        assert_eq!(api.periods(), vec!["2024-12", "2024-12"]);
        assert_eq!(
            mailer.sent()[0].subject,
            "Monthly Financial Report - December 2024"
        );
    }

    #[tokio::test]
    async fn test_any_failed_fetch_fails_the_run_and_sends_nothing() {
        for operation in [
            Operation::MonthlySpending,
            Operation::AccountBalances,
            Operation::TopSpendingCategories,
        ] {
            let api = Arc::new(StubApi::new(10_000, 20_000).failing(operation));
            let mailer = TestMailer::new();

            let err = pipeline(api, &mailer)
                .run_for(april_10_2024())
                .await
                .unwrap_err();

            assert_eq!(err.operation(), Some(operation));
            assert!(err.to_string().contains(&operation.to_string()));
            assert_eq!(mailer.attempts(), 0, "sent after {operation} failed");
        }
    }

    #[tokio::test]
    async fn test_missing_totals_are_zero() {
        let api = Arc::new(StubApi::empty_summary());
        let mailer = TestMailer::new();

        pipeline(api, &mailer)
            .run_for(april_10_2024())
            .await
            .unwrap();

        let html = &mailer.sent()[0].html;
        assert!(html.contains("0.0%"));
        assert!(!html.contains("NaN"));
    }

    #[tokio::test]
    async fn test_render_failure_sends_nothing() {
        let api = Arc::new(StubApi::new(10_000, 20_000));
        let mailer = TestMailer::new();
        let empty = TempDir::new().unwrap();
        let pipeline = ReportPipeline::new(
            api.clone(),
            Arc::new(Renderer::new(empty.path())),
            Dispatcher::new(mailer.transport(), "reports@example.com", None),
            settings(),
        );

        let err = pipeline.run_for(april_10_2024()).await.unwrap_err();

        assert!(matches!(err, ReportError::Render(_)));
        assert_eq!(api.calls(), 3);
        assert_eq!(mailer.attempts(), 0);
    }

    #[tokio::test]
    async fn test_malformed_template_sends_nothing() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(crate::render::REPORT_TEMPLATE),
            "{{#each spending.categories}}<li>{{name}}</li>",
        )
        .unwrap();
        let mailer = TestMailer::new();
        let pipeline = ReportPipeline::new(
            Arc::new(StubApi::new(10_000, 20_000)),
            Arc::new(Renderer::new(dir.path())),
            Dispatcher::new(mailer.transport(), "reports@example.com", None),
            settings(),
        );

        let err = pipeline.run_for(april_10_2024()).await.unwrap_err();

        assert!(matches!(err, ReportError::Render(_)));
        assert_eq!(mailer.attempts(), 0);
    }

    #[tokio::test]
    async fn test_delivery_failure_fails_the_run() {
        let mailer = TestMailer::failing();
        let err = pipeline(Arc::new(StubApi::new(10_000, 20_000)), &mailer)
            .run_for(april_10_2024())
            .await
            .unwrap_err();

        assert!(matches!(err, ReportError::Delivery(_)));
        assert_eq!(mailer.attempts(), 1);
        assert!(mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_fixture_source_needs_no_network() {
        let mailer = TestMailer::new();
        let pipeline = pipeline(Arc::new(FixtureFinanceApi), &mailer);

        let result = pipeline.generate_and_send_report().await.unwrap();

        let expected = Period::preceding(Local::now().date_naive());
        assert_eq!(result.month, expected.label());
        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].subject,
            format!("Monthly Financial Report - {}", expected.label())
        );
        assert!(sent[0].html.contains("Housing"));
    }
}
