//! Runs the report pipeline on a cron schedule.
//!
//! A `Scheduler` can only be constructed from a valid expression, and it has to be consumed by
//! `register` to start firing, so an invalid schedule can never result in a registered job.

use crate::error::ReportError;
use crate::pipeline::ReportPipeline;
use chrono::{DateTime, Local, TimeZone};
use cron::Schedule;
use std::str::FromStr;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// A validated schedule that has not been registered yet.
#[derive(Debug, Clone)]
pub struct Scheduler {
    expression: String,
    schedule: Schedule,
}

impl Scheduler {
    /// Validates `expression`, a standard 5-field cron expression:
    /// `minute hour day-of-month month day-of-week`, where day-of-week 0 and 7 are both Sunday.
    pub fn new(expression: &str) -> Result<Self, ReportError> {
        let fields: Vec<&str> = expression.split_whitespace().collect();
        if fields.len() != 5 {
            return Err(ReportError::Config(format!(
                "Invalid cron schedule '{expression}': expected 5 fields, found {}",
                fields.len()
            )));
        }

        // The cron crate wants a leading seconds field and numbers Sunday as 1.
        let translated = format!(
            "0 {} {} {} {} {}",
            fields[0],
            fields[1],
            fields[2],
            fields[3],
            translate_day_of_week(fields[4])
        );
        let schedule = Schedule::from_str(&translated).map_err(|e| {
            ReportError::Config(format!("Invalid cron schedule '{expression}': {e}"))
        })?;

        Ok(Self {
            expression: expression.to_string(),
            schedule,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// The first firing strictly after `after`, if there is one.
    pub fn next_after<Tz: TimeZone>(&self, after: &DateTime<Tz>) -> Option<DateTime<Tz>> {
        self.schedule.after(after).next()
    }

    /// Starts firing `pipeline` on this schedule in a background task.
    ///
    /// Each firing generates the report for the previous month and logs the outcome; a failed run
    /// is not retried before the next firing. The next firing is computed only after a run
    /// finishes, so runs never overlap: a firing that falls inside a running report is skipped.
    pub fn register(self, pipeline: ReportPipeline) -> ScheduleHandle {
        self.register_with_clock(pipeline, Local::now)
    }

    /// Like `register`, but reads the current time from `clock`.
    pub(crate) fn register_with_clock<C>(self, pipeline: ReportPipeline, clock: C) -> ScheduleHandle
    where
        C: Fn() -> DateTime<Local> + Send + 'static,
    {
        info!("Setting up scheduler with CRON: {}", self.expression());
        let expression = self.expression.clone();
        let task = tokio::spawn(async move { self.run(pipeline, clock).await });
        ScheduleHandle { expression, task }
    }

    /// The firing that follows `now`, given the firing that started the previous run.
    ///
    /// Slots that passed while the previous run was in progress are skipped. If the clock reads
    /// earlier than `last_fired`, the search starts from `last_fired` so that no slot fires twice.
    fn next_firing<Tz: TimeZone>(
        &self,
        now: &DateTime<Tz>,
        last_fired: Option<&DateTime<Tz>>,
    ) -> Option<DateTime<Tz>> {
        match last_fired {
            Some(last) if last >= now => self.next_after(last),
            _ => self.next_after(now),
        }
    }

    async fn run<C>(self, pipeline: ReportPipeline, clock: C)
    where
        C: Fn() -> DateTime<Local>,
    {
        let mut last_fired: Option<DateTime<Local>> = None;
        loop {
            let now = clock();
            let Some(next) = self.next_firing(&now, last_fired.as_ref()) else {
                warn!("Schedule '{}' has no future firings", self.expression);
                return;
            };
            debug!("Next scheduled report at {next}");

            let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
            tokio::time::sleep(wait).await;
            last_fired = Some(next);

            info!("Running scheduled task: generating monthly financial report");
            match pipeline.generate_and_send_report().await {
                Ok(result) => info!("Monthly report for {} generated and sent", result.month),
                Err(e) => error!("Error in scheduled report generation: {e}"),
            }
        }
    }
}

/// A registered schedule. The job keeps firing for as long as the process runs, or until
/// `stop` is called.
#[derive(Debug)]
pub struct ScheduleHandle {
    expression: String,
    task: JoinHandle<()>,
}

impl ScheduleHandle {
    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stops future firings. A run that is in progress is abandoned.
    pub fn stop(&self) {
        self.task.abort();
    }
}

/// Renumbers standard day-of-week values (0-7, Sunday = 0 or 7) to the cron crate's numbering
/// (1-7, Sunday = 1). Names such as `MON` are left alone.
fn translate_day_of_week(field: &str) -> String {
    field
        .split(',')
        .flat_map(split_sunday_range)
        .map(|item| renumber(&item))
        .collect::<Vec<String>>()
        .join(",")
}

/// A range ending at 7 cannot be renumbered as-is (`1-7` would become `2-1`), so it is split into
/// a range ending at Saturday plus a separate Sunday: `1-7` becomes `1-6,0`.
fn split_sunday_range(item: &str) -> Vec<String> {
    let (base, step) = match item.split_once('/') {
        Some((base, step)) => (base, Some(step)),
        None => (item, None),
    };
    let Some((start, "7")) = base.split_once('-') else {
        return vec![item.to_string()];
    };
    let Ok(start) = start.parse::<u8>() else {
        return vec![item.to_string()];
    };
    let step_by = match step.map(str::parse::<u8>) {
        None => 1,
        Some(Ok(n)) if n > 0 => n,
        _ => return vec![item.to_string()],
    };
    if start > 7 {
        return vec![item.to_string()];
    }
    if start == 7 {
        return vec!["0".to_string()];
    }

    let mut items = vec![match step {
        Some(step) => format!("{start}-6/{step}"),
        None => format!("{start}-6"),
    }];
    if start != 0 && (7 - start) % step_by == 0 {
        items.push("0".to_string());
    }
    items
}

fn renumber(item: &str) -> String {
    let (base, step) = match item.split_once('/') {
        Some((base, step)) => (base, Some(step)),
        None => (item, None),
    };
    let base = base
        .split('-')
        .map(|part| match part.parse::<u8>() {
            Ok(day) if day <= 7 => ((day % 7) + 1).to_string(),
            _ => part.to_string(),
        })
        .collect::<Vec<String>>()
        .join("-");
    match step {
        Some(step) => format!("{base}/{step}"),
        None => base,
    }
}
