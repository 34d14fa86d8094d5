//! finreport assembles a monthly financial report from a transaction service, renders it to HTML
//! and emails it, on a cron schedule or on demand.

mod api;
pub mod args;
pub mod commands;
mod config;
mod email;
mod error;
mod metrics;
pub mod model;
mod pipeline;
mod render;
mod scheduler;
mod server;
mod utils;


pub use api::{Operation, Source};
pub use config::{Config, Settings};
pub use error::Error;
pub use error::ReportError;
pub use error::Result;
pub use metrics::SavingsMetrics;
