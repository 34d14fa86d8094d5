//! The `finreport report` command, and the pipeline constructors shared with `serve`.

use crate::api::{finance_api, Source};
use crate::args::ReportArgs;
use crate::commands::Out;
use crate::email::Dispatcher;
use crate::model::ReportResult;
use crate::pipeline::{ReportPipeline, ReportSettings};
use crate::render::{default_template_dir, Renderer};
use crate::{Config, Result};
use std::sync::Arc;

/// Handles `finreport report`: generates the report for last month, sends it, and exits.
pub async fn report(config: Config, args: ReportArgs) -> Result<Out<ReportResult>> {
    let result = match args.source() {
        Source::Live => generate_and_send_report(&config).await?,
        Source::Fixture => generate_and_send_mocked_report(&config).await?,
    };
    Ok(Out::new(
        format!("Report for {} generated and sent", result.month),
        result,
    ))
}

/// Runs the report once over data from the transaction service.
pub async fn generate_and_send_report(config: &Config) -> Result<ReportResult> {
    Ok(pipeline(config, Source::Live)?
        .generate_and_send_report()
        .await?)
}

/// Runs the report once over the built-in fixture data. Email settings are still required.
pub async fn generate_and_send_mocked_report(config: &Config) -> Result<ReportResult> {
    Ok(pipeline(config, Source::Fixture)?
        .generate_and_send_report()
        .await?)
}

/// Wires a pipeline for `source` from `config`: data source, template renderer, SMTP dispatcher.
pub(super) fn pipeline(config: &Config, source: Source) -> Result<ReportPipeline> {
    Ok(ReportPipeline::new(
        finance_api(config, source)?,
        Arc::new(Renderer::new(default_template_dir())),
        Dispatcher::from_config(config)?,
        ReportSettings {
            title: config.report_title().to_string(),
            recipient: config.email_recipient().map(str::to_string),
        },
    ))
}
