use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
    pub display_name: Option<String>,
}

/// Inclusive range of calendar days requested from the weather archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl DateRange {
    /// The week ending yesterday: `end = today - 1`, `start = end - 7`.
    pub fn ending_yesterday(today: NaiveDate) -> Self {
        let end_date = today.checked_sub_days(Days::new(1)).unwrap_or(today);
        let start_date = end_date.checked_sub_days(Days::new(7)).unwrap_or(end_date);
        Self { start_date, end_date }
    }

    /// Same as [`DateRange::ending_yesterday`] using today's UTC date.
    pub fn last_week() -> Self {
        Self::ending_yesterday(chrono::Utc::now().date_naive())
    }

    pub fn start_iso(&self) -> String {
        self.start_date.format("%Y-%m-%d").to_string()
    }

    pub fn end_iso(&self) -> String {
        self.end_date.format("%Y-%m-%d").to_string()
    }
}

/// A geocoded search: the address typed by the user and where it resolved to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub address: String,
    pub coordinates: Coordinates,
}
