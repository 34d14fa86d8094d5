//! These structs provide the CLI interface for the finreport CLI.

use crate::api::Source;
use crate::config::Settings;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::filter::LevelFilter;

/// finreport: builds a monthly financial report and emails it.
///
/// Every month (by default at 08:00 on the 1st) the report for the previous calendar month is
/// assembled from the transaction service: spending and income totals, the top spending
/// categories, and current account balances. The savings rate is computed, the report is rendered
/// to HTML and sent to the configured recipient.
///
/// Every setting can be given as a flag, an environment variable, or a key in a JSON config file.
/// Flags win over environment variables, which win over the file.
#[derive(Debug, Parser, Clone)]
#[command(version)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the scheduler and the HTTP trigger endpoints until interrupted.
    ///
    /// The schedule is validated before anything else starts; an invalid expression stops the
    /// program immediately. The HTTP server offers:
    ///
    /// - GET /health
    ///
    /// - GET /test-report: generate and send the report for last month now
    ///
    /// - GET /test-report/mocked-data: the same, using built-in data instead of the transaction
    ///   service
    Serve,
    /// Generate and send the report for last month once, then exit.
    Report(ReportArgs),
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    #[clap(flatten)]
    config: ConfigArgs,
}

impl Common {
    pub fn new(log_level: LevelFilter, config: ConfigArgs) -> Self {
        Self { log_level, config }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn config(&self) -> &ConfigArgs {
        &self.config
    }
}

/// Configuration values. Any value not given here falls back to the config file, then to its
/// default.
#[derive(Debug, Parser, Clone, Default)]
pub struct ConfigArgs {
    /// Path to a JSON config file.
    #[arg(long = "config", env = "FINREPORT_CONFIG")]
    config_file: Option<PathBuf>,

    /// 5-field cron expression for scheduled runs. Default: "0 8 1 * *"
    #[arg(long, env = "CRON_SCHEDULE")]
    cron_schedule: Option<String>,

    /// Base URL of the transaction service.
    #[arg(long, env = "TRANSACTION_SERVICE_BASE_URL")]
    api_url: Option<String>,

    /// Email service name (gmail, outlook, yahoo, icloud) or an SMTP hostname.
    #[arg(long, env = "EMAIL_SERVICE")]
    email_service: Option<String>,

    /// Email account user name. Reports are sent from this address.
    #[arg(long, env = "EMAIL_USER")]
    email_user: Option<String>,

    /// Email account password.
    #[arg(long, env = "EMAIL_PASSWORD", hide_env_values = true)]
    email_password: Option<String>,

    /// Where reports are sent.
    #[arg(long, env = "EMAIL_RECIPIENT")]
    email_recipient: Option<String>,

    /// Title shown in the report and its subject line. Default: "Monthly Financial Report"
    #[arg(long, env = "REPORT_TITLE")]
    report_title: Option<String>,

    /// Port for the HTTP trigger endpoints. Default: 3000
    #[arg(long, env = "PORT")]
    port: Option<u16>,
}

impl ConfigArgs {
    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    /// The values given on the command line or in the environment.
    pub fn settings(&self) -> Settings {
        Settings {
            cron_schedule: self.cron_schedule.clone(),
            api_url: self.api_url.clone(),
            email_service: self.email_service.clone(),
            email_user: self.email_user.clone(),
            email_password: self.email_password.clone(),
            email_recipient: self.email_recipient.clone(),
            report_title: self.report_title.clone(),
            port: self.port,
        }
    }
}

/// Args for the `finreport report` command.
#[derive(Debug, Parser, Clone, Default)]
pub struct ReportArgs {
    /// Where the report data comes from: "live" (the transaction service) or "fixture" (built-in
    /// data for trying out the template and email settings).
    #[arg(long, value_enum, default_value_t = Source::Live)]
    source: Source,
}

impl ReportArgs {
    pub fn new(source: Source) -> Self {
        Self { source }
    }

    pub fn source(&self) -> Source {
        self.source
    }
}
