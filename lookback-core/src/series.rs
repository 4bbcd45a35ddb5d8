//! Projection of an archive into `[timestamp_ms, value]` pairs for charting.

use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::weather::{DailySeries, HourlySeries, WeatherArchive};

pub type Point = (i64, f64);

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DailyChart {
    pub temperature_min: Vec<Point>,
    pub temperature_max: Vec<Point>,
    pub precipitation: Vec<Point>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HourlyChart {
    pub temperature: Vec<Point>,
    pub humidity: Vec<Point>,
    pub wind_speed: Vec<Point>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Charts {
    pub daily: DailyChart,
    pub hourly: HourlyChart,
}

impl Charts {
    pub fn from_archive(archive: &WeatherArchive) -> Self {
        Self { daily: DailyChart::from_series(&archive.daily), hourly: HourlyChart::from_series(&archive.hourly) }
    }
}

impl DailyChart {
    pub fn from_series(daily: &DailySeries) -> Self {
        Self {
            temperature_min: pair(&daily.time, &daily.temperature_2m_min),
            temperature_max: pair(&daily.time, &daily.temperature_2m_max),
            precipitation: pair(&daily.time, &daily.precipitation_sum),
        }
    }
}

impl HourlyChart {
    pub fn from_series(hourly: &HourlySeries) -> Self {
        Self {
            temperature: pair(&hourly.time, &hourly.temperature_2m),
            humidity: pair(&hourly.time, &hourly.relative_humidity_2m),
            wind_speed: pair(&hourly.time, &hourly.wind_speed_10m),
        }
    }
}

/// Zips timestamps with values, skipping nulls and unparseable times.
fn pair(times: &[String], values: &[Option<f64>]) -> Vec<Point> {
    times
        .iter()
        .zip(values)
        .filter_map(|(time, value)| Some((timestamp_ms(time)?, (*value)?)))
        .collect()
}

/// Milliseconds since the epoch for `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM[:SS]`,
/// read as UTC wall time.
pub fn timestamp_ms(time: &str) -> Option<i64> {
    let datetime = NaiveDateTime::parse_from_str(time, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(time, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| NaiveDate::parse_from_str(time, "%Y-%m-%d").ok()?.and_hms_opt(0, 0, 0))?;
    Some(datetime.and_utc().timestamp_millis())
}
