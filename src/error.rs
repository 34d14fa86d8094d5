use crate::api::Operation;

pub type Error = anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// The ways a report run can fail. Each variant corresponds to the stage that failed, so callers
/// can tell whether anything was rendered or sent before the failure.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Settings were missing or invalid, e.g. an unparseable cron expression.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// One of the external API reads failed. Nothing was rendered or sent.
    #[error("Failed to fetch {operation}: {source:#}")]
    Fetch {
        operation: Operation,
        #[source]
        source: anyhow::Error,
    },

    /// The template could not be loaded or merged. Nothing was sent.
    #[error("Failed to render report: {0:#}")]
    Render(#[source] anyhow::Error),

    /// The email transport rejected the message. The report was rendered but not delivered.
    #[error("Failed to send email: {0:#}")]
    Delivery(#[source] anyhow::Error),
}

impl ReportError {
    pub(crate) fn fetch(operation: Operation, source: impl Into<anyhow::Error>) -> Self {
        Self::Fetch {
            operation,
            source: source.into(),
        }
    }

    /// The API operation that failed, if this is a fetch error.
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Self::Fetch { operation, .. } => Some(*operation),
            _ => None,
        }
    }
}
