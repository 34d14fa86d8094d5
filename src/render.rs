//! Renders report data into an HTML document using a Handlebars template.

use crate::model::{Amount, BalanceRow, ReportData};
use crate::{utils, Result};
use anyhow::Context;
use chrono::{Local, NaiveDate};
use handlebars::{handlebars_helper, Handlebars};
use serde::Serialize;
use serde_json::Value;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::debug;

/// The directory, relative to the application root, that holds the report templates.
const TEMPLATE_DIR: &str = "templates";

/// The template used for the monthly report.
pub const REPORT_TEMPLATE: &str = "monthly_report.hbs";

handlebars_helper!(eq: |a: Json, b: Json| a == b);
handlebars_helper!(money: |v: Json| format_money(v));

/// Formats a number or an amount string as `$1,234.56`. Anything else renders as-is.
fn format_money(value: &Value) -> String {
    let parsed = match value {
        Value::Number(n) => Amount::from_str(&n.to_string()).ok(),
        Value::String(s) => Amount::from_str(s).ok(),
        _ => None,
    };
    match (parsed, value) {
        (Some(amount), _) => amount.to_string(),
        (None, Value::String(s)) => s.clone(),
        (None, Value::Null) => String::new(),
        (None, other) => other.to_string(),
    }
}

/// Where templates are loaded from when no directory is configured: `templates/` under the
/// working directory if it holds the report template, otherwise `templates/` next to the
/// executable.
pub fn default_template_dir() -> PathBuf {
    let candidates = [
        std::env::current_dir()
            .ok()
            .map(|dir| dir.join(TEMPLATE_DIR)),
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(TEMPLATE_DIR))),
    ];
    first_with_template(candidates.into_iter().flatten().collect())
}

/// The first directory in `candidates` that contains the report template. If none does, the first
/// candidate, so that the error names a sensible path.
fn first_with_template(candidates: Vec<PathBuf>) -> PathBuf {
    candidates
        .iter()
        .find(|dir| dir.join(REPORT_TEMPLATE).is_file())
        .or_else(|| candidates.first())
        .cloned()
        .unwrap_or_else(|| PathBuf::from(TEMPLATE_DIR))
}

/// Merges `ReportData` into the report template. Helpers are registered once, when the renderer is
/// created; the template file itself is read fresh for every render.
pub struct Renderer {
    registry: Handlebars<'static>,
    template_dir: PathBuf,
}

/// What the template sees: the report data plus the date the document was produced.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RenderContext<'a> {
    #[serde(flatten)]
    data: &'a ReportData,
    balance_rows: Vec<BalanceRow>,
    generated_on: String,
}

impl Renderer {
    /// Create a renderer that loads templates from `template_dir`.
    pub fn new(template_dir: impl Into<PathBuf>) -> Self {
        let mut registry = Handlebars::new();
        registry.register_helper("eq", Box::new(eq));
        registry.register_helper("money", Box::new(money));
        Self {
            registry,
            template_dir: template_dir.into(),
        }
    }

    pub fn template_path(&self) -> PathBuf {
        self.template_dir.join(REPORT_TEMPLATE)
    }

    /// Loads the report template and renders `data` into it. The "generated on" date is today's
    /// local date.
    pub async fn render(&self, data: &ReportData) -> Result<String> {
        let path = self.template_path();
        debug!("Loading template {}", path.display());
        let source = utils::read(&path)
            .await
            .context("Unable to load the report template")?;
        self.render_source(&source, data, Local::now().date_naive())
    }

    /// Renders `data` into the template text `source`. This is pure apart from its inputs.
    pub fn render_source(
        &self,
        source: &str,
        data: &ReportData,
        generated_on: NaiveDate,
    ) -> Result<String> {
        let context = RenderContext {
            data,
            balance_rows: data.balances.rows(),
            generated_on: generated_on.format("%B %d, %Y").to_string(),
        };
        self.registry
            .render_template(source, &context)
            .context("Unable to render the report template")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::AccountBalances;
    use crate::test::{report_data, template_dir};
    use serde_json::json;
    use tempfile::TempDir;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, 2).unwrap()
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(&json!(1500)), "$1,500.00");
        assert_eq!(format_money(&json!("-1000.00")), "-$1,000.00");
        assert_eq!(format_money(&json!("n/a")), "n/a");
        assert_eq!(format_money(&json!(null)), "");
        assert_eq!(format_money(&json!(true)), "true");
    }

    #[test]
    fn test_render_source_fields() {
        let renderer = Renderer::new(template_dir());
        let template = "{{title}}|{{month}}|{{spending.total}}|{{income.total}}|\
            {{savings.rate}}|{{savings.amount}}|{{generatedOn}}";
        let html = renderer
            .render_source(template, &report_data(), today())
            .unwrap();
        assert_eq!(
            html,
            "Monthly Financial Report|March 2024|$10,000.00|$20,000.00|50.0|10000.00|April 02, 2024"
        );
    }

    #[test]
    fn test_helpers_are_registered_once_and_reused() {
        let renderer = Renderer::new(template_dir());
        let template = "{{#each spending.categories}}{{#if (eq @index 0)}}*{{/if}}{{name}};{{/each}}";
        for _ in 0..2 {
            let out = renderer
                .render_source(template, &report_data(), today())
                .unwrap();
            assert_eq!(out, "*Housing;Food;");
        }
    }

    #[test]
    fn test_malformed_template_is_an_error() {
        let renderer = Renderer::new(template_dir());
        let result = renderer.render_source("{{#each spending.categories}}", &report_data(), today());
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_render_real_template() {
        let renderer = Renderer::new(template_dir());
        let html = renderer.render(&report_data()).await.unwrap();
        assert!(html.contains("<h1>Monthly Financial Report</h1>"));
        assert!(html.contains("March 2024"));
        assert!(html.contains("Housing"));
        assert!(html.contains("$10,000.00"));
        assert!(html.contains("50.0%"));
        assert!(html.contains("Checking"));
        assert!(html.contains("$5,230.12"));
    }

    #[tokio::test]
    async fn test_zero_balance_renders_as_money() {
        let renderer = Renderer::new(template_dir());
        let mut data = report_data();
        data.balances = AccountBalances::new(json!([
            {"name": "Checking", "balance": 0},
            {"name": "Savings", "balance": 1500}
        ]));

        let html = renderer.render(&data).await.unwrap();

        assert!(
            html.contains(r#"<td>Checking</td><td class="amount">$0.00</td>"#),
            "{html}"
        );
        assert!(html.contains(r#"<td>Savings</td><td class="amount">$1,500.00</td>"#));
        assert!(!html.contains("&quot;balance&quot;"));
    }

    #[test]
    fn test_first_with_template() {
        let empty = TempDir::new().unwrap();
        let filled = TempDir::new().unwrap();
        std::fs::write(filled.path().join(REPORT_TEMPLATE), "{{title}}").unwrap();

        let found = first_with_template(vec![empty.path().into(), filled.path().into()]);
        assert_eq!(found, filled.path());

        let fallback = first_with_template(vec![empty.path().into()]);
        assert_eq!(fallback, empty.path());

        assert_eq!(first_with_template(Vec::new()), PathBuf::from("templates"));
    }

    #[tokio::test]
    async fn test_missing_template_is_an_error() {
        let dir = TempDir::new().unwrap();
        let renderer = Renderer::new(dir.path());
        let err = renderer.render(&report_data()).await.unwrap_err();
        assert!(format!("{err:#}").contains(REPORT_TEMPLATE));
    }
}
