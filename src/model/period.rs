use chrono::{Datelike, NaiveDate};
use std::fmt::{Display, Formatter};

/// A calendar month that a report covers. It is always derived from a reference date, never
/// supplied directly, so there is exactly one way to name a reporting month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    /// The first day of the month.
    start: NaiveDate,
}

impl Period {
    /// The month containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        // Day 1 exists in every month, so with_day(1) cannot fail here.
        let start = date.with_day(1).unwrap_or(date);
        Self { start }
    }

    /// The calendar month before the one containing `today`. January rolls back to December of
    /// the previous year.
    pub fn preceding(today: NaiveDate) -> Self {
        let this_month = Self::containing(today);
        let last_day_of_previous = this_month.start.pred_opt().unwrap_or(this_month.start);
        Self::containing(last_day_of_previous)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    /// The machine-sortable key used in API paths, e.g. `2024-03`.
    pub fn key(&self) -> String {
        self.start.format("%Y-%m").to_string()
    }

    /// The display label used in the report and subject line, e.g. `March 2024`.
    pub fn label(&self) -> String {
        self.start.format("%B %Y").to_string()
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}
