//! The `finreport serve` command: the scheduled job plus the HTTP trigger endpoints.

use crate::api::Source;
use crate::commands::report::pipeline;
use crate::commands::Out;
use crate::scheduler::Scheduler;
use crate::server::{self, Triggers};
use crate::{Config, Result};
use anyhow::Context;
use std::net::{Ipv4Addr, SocketAddr};
use tracing::{info, warn};

/// Handles `finreport serve`.
///
/// The schedule is validated first; an invalid expression returns an error before the scheduler,
/// the pipelines or the server exist. Runs until interrupted with Ctrl-C or until the server
/// fails.
pub async fn serve(config: Config) -> Result<Out<()>> {
    let scheduler = Scheduler::new(config.cron_schedule())?;

    let live = pipeline(&config, Source::Live)?;
    let mocked = pipeline(&config, Source::Fixture)?;

    let handle = scheduler.register(live.clone());
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, config.port()));
    let server = server::serve(addr, Triggers::new(live, mocked));

    let outcome = tokio::select! {
        result = server => result,
        signal = tokio::signal::ctrl_c() => {
            signal.context("Unable to listen for the interrupt signal")?;
            info!("Interrupted, shutting down");
            Ok(())
        }
    };

    if handle.is_running() {
        handle.stop();
    } else {
        warn!("The report schedule '{}' had already stopped", handle.expression());
    }
    outcome?;
    Ok(Out::new_message(format!(
        "Stopped the report schedule '{}'",
        handle.expression()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::error::ReportError;

    #[tokio::test]
    async fn test_invalid_schedule_fails_before_anything_starts() {
        // No email or API settings: the schedule has to be rejected before they are needed.
        let config = Config::new(Settings {
            cron_schedule: Some("not a schedule".into()),
            ..Settings::default()
        })
        .unwrap();

        let err = serve(config).await.err().unwrap();

        let report_error = err.downcast_ref::<ReportError>().unwrap();
        assert!(matches!(report_error, ReportError::Config(_)));
    }
}
