//! Configuration for finreport.
//!
//! Settings are layered. A JSON config file (optional) is read first, then values given as
//! command-line flags or environment variables replace the file's values, then defaults fill in
//! whatever is still missing. The resulting `Config` is immutable and is passed to every component
//! that needs it; nothing else reads the environment.

use crate::args::ConfigArgs;
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};
use std::path::Path;
use url::Url;

const APP_NAME: &str = "finreport";

/// Runs at 08:00 on the first day of every month.
pub const DEFAULT_CRON_SCHEDULE: &str = "0 8 1 * *";
pub const DEFAULT_REPORT_TITLE: &str = "Monthly Financial Report";
pub const DEFAULT_PORT: u16 = 3000;

/// The `Config` object represents the fully resolved configuration of the app.
#[derive(Debug, Clone)]
pub struct Config {
    cron_schedule: String,
    api_url: Option<Url>,
    email_service: Option<String>,
    email_user: Option<String>,
    email_password: Option<Secret>,
    email_recipient: Option<String>,
    report_title: String,
    port: u16,
}

impl Config {
    /// Loads the config file named by `args` (if any), applies the flag and environment overrides
    /// from `args`, and resolves the result.
    pub async fn load(args: &ConfigArgs) -> Result<Self> {
        let base = match args.config_file() {
            Some(path) => ConfigFile::load(path).await?.settings,
            None => Settings::default(),
        };
        Self::new(base.overlay(args.settings()))
    }

    /// Resolves `settings` into a `Config`, applying defaults and validating values.
    pub fn new(settings: Settings) -> Result<Self> {
        let api_url = match settings.api_url.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                Url::parse(raw).with_context(|| format!("Invalid API base URL '{raw}'"))?,
            ),
        };

        Ok(Self {
            cron_schedule: settings
                .cron_schedule
                .unwrap_or_else(|| DEFAULT_CRON_SCHEDULE.to_string()),
            api_url,
            email_service: settings.email_service,
            email_user: settings.email_user,
            email_password: settings.email_password.map(Secret),
            email_recipient: settings.email_recipient,
            report_title: settings
                .report_title
                .unwrap_or_else(|| DEFAULT_REPORT_TITLE.to_string()),
            port: settings.port.unwrap_or(DEFAULT_PORT),
        })
    }

    /// The 5-field cron expression for scheduled runs. It is validated by the scheduler.
    pub fn cron_schedule(&self) -> &str {
        &self.cron_schedule
    }

    /// The base URL of the transaction service. Required for live reports.
    pub fn api_url(&self) -> Result<&Url> {
        match &self.api_url {
            Some(url) => Ok(url),
            None => bail!(
                "The transaction service URL is not configured, set TRANSACTION_SERVICE_BASE_URL \
                or --api-url"
            ),
        }
    }

    /// The email service name (e.g. `gmail`) or SMTP host.
    pub fn email_service(&self) -> Result<&str> {
        required(self.email_service.as_deref(), "EMAIL_SERVICE", "--email-service")
    }

    /// The account used to log in to the email service. Reports are sent from this address.
    pub fn email_user(&self) -> Result<&str> {
        required(self.email_user.as_deref(), "EMAIL_USER", "--email-user")
    }

    pub fn email_password(&self) -> Result<&str> {
        required(
            self.email_password.as_ref().map(|s| s.0.as_str()),
            "EMAIL_PASSWORD",
            "--email-password",
        )
    }

    /// Where reports go when a caller does not name a recipient.
    pub fn email_recipient(&self) -> Option<&str> {
        self.email_recipient.as_deref()
    }

    pub fn report_title(&self) -> &str {
        &self.report_title
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

fn required<'a>(value: Option<&'a str>, env: &str, flag: &str) -> Result<&'a str> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => bail!("Missing configuration value, set {env} or {flag}"),
    }
}

/// A string that is never printed by `Debug`.
#[derive(Clone)]
struct Secret(String);

impl Debug for Secret {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("\"********\"")
    }
}

/// Unresolved configuration values. Every field is optional so that several sources can be merged
/// with `overlay` before defaults are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct Settings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron_schedule: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_user: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_recipient: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

impl Settings {
    /// Returns `self` with every value that is present in `top` replaced by `top`'s value.
    pub fn overlay(self, top: Settings) -> Settings {
        Settings {
            cron_schedule: top.cron_schedule.or(self.cron_schedule),
            api_url: top.api_url.or(self.api_url),
            email_service: top.email_service.or(self.email_service),
            email_user: top.email_user.or(self.email_user),
            email_password: top.email_password.or(self.email_password),
            email_recipient: top.email_recipient.or(self.email_recipient),
            report_title: top.report_title.or(self.report_title),
            port: top.port.or(self.port),
        }
    }
}

/// Represents the serialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "finreport",
///   "cron_schedule": "0 8 1 * *",
///   "api_url": "https://transactions.internal.example.com/api",
///   "email_service": "gmail",
///   "email_user": "reports@example.com",
///   "email_recipient": "me@example.com",
///   "report_title": "Monthly Financial Report"
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "finreport"
    app_name: String,

    #[serde(flatten)]
    settings: Settings,
}

impl ConfigFile {
    /// Loads a ConfigFile from `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or if it is not a finreport config.
    async fn load(path: &Path) -> Result<Self> {
        let config: ConfigFile = utils::deserialize(path)
            .await
            .with_context(|| format!("Failed to load config file at {}", path.display()))?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );

        Ok(config)
    }
}
