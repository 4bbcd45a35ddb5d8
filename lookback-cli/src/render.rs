use std::sync::Arc;

use lookback_core::{
    LoadingTracker, Notification, NotificationBoard, NotificationQueue, SearchOutcome, Severity,
    series::{Charts, Point},
    weather::describe_weather_code,
};
use tokio::{
    sync::broadcast::error::RecvError,
    task::JoinHandle,
    time::{Instant, sleep_until},
};

/// Prints notifications to stderr as they arrive, and keeps the board of
/// visible ones so timed notifications are dropped when they expire.
///
/// The task ends once every handle to the queue is dropped.
pub fn spawn_notifications(queue: &NotificationQueue) -> JoinHandle<()> {
    let mut rx = queue.subscribe();

    tokio::spawn(async move {
        let mut board = NotificationBoard::new();

        loop {
            let next_expiry = board.next_expiry();
            let expiry = async {
                match next_expiry {
                    Some(at) => sleep_until(at).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                received = rx.recv() => match received {
                    Ok(notification) => {
                        eprintln!("{}", format_notification(&notification));
                        board.push(notification, Instant::now());
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "notifications dropped");
                    }
                    Err(RecvError::Closed) => break,
                },
                () = expiry => {
                    for gone in board.expire(Instant::now()) {
                        tracing::debug!(id = gone.id, "notification expired");
                    }
                }
            }
        }
    })
}

/// Shows a status line while requests are in flight.
pub fn spawn_loading(loading: &Arc<LoadingTracker>) -> JoinHandle<()> {
    let mut rx = loading.subscribe();

    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            if *rx.borrow_and_update() {
                eprintln!("… loading");
            }
        }
    })
}

pub fn format_notification(notification: &Notification) -> String {
    let marker = match notification.severity {
        Severity::Info => "ℹ",
        Severity::Success => "✔",
        Severity::Warning => "⚠",
        Severity::Error => "✖",
    };
    format!("{marker} [{}] {}", notification.severity, notification.message)
}

fn cell(value: Option<&Option<f64>>, unit: &str) -> String {
    match value.copied().flatten() {
        Some(v) => format!("{v:.1}{unit}"),
        None => "-".to_string(),
    }
}

pub fn print_outcome(outcome: &SearchOutcome, hourly: bool) {
    let location = &outcome.location;
    let coordinates = &location.coordinates;

    println!("{}", location.address);
    if let Some(name) = &coordinates.display_name {
        println!("  resolved to: {name}");
    }
    println!("  coordinates: {:.5}, {:.5}", coordinates.latitude, coordinates.longitude);
    println!("  period:      {} .. {}", outcome.range.start_iso(), outcome.range.end_iso());
    println!();

    let daily = &outcome.weather.daily;
    println!("{:<12} {:<24} {:>9} {:>9} {:>9}", "date", "condition", "min", "max", "rain");
    for (i, date) in daily.time.iter().enumerate() {
        let condition = daily
            .weather_code
            .get(i)
            .copied()
            .flatten()
            .map(describe_weather_code)
            .unwrap_or("-");
        println!(
            "{:<12} {:<24} {:>9} {:>9} {:>9}",
            date,
            condition,
            cell(daily.temperature_2m_min.get(i), "°C"),
            cell(daily.temperature_2m_max.get(i), "°C"),
            cell(daily.precipitation_sum.get(i), "mm"),
        );
    }

    let charts = Charts::from_archive(&outcome.weather);
    println!();
    println!("{}", summary(&charts));

    if hourly {
        let series = &outcome.weather.hourly;
        println!();
        println!("{:<18} {:>9} {:>9} {:>11}", "time", "temp", "humidity", "wind");
        for (i, time) in series.time.iter().enumerate() {
            println!(
                "{:<18} {:>9} {:>9} {:>11}",
                time,
                cell(series.temperature_2m.get(i), "°C"),
                cell(series.relative_humidity_2m.get(i), "%"),
                cell(series.wind_speed_10m.get(i), "km/h"),
            );
        }
    }
}

/// One-line week summary from the projected series.
pub fn summary(charts: &Charts) -> String {
    let lowest = extreme(&charts.daily.temperature_min, f64::min);
    let highest = extreme(&charts.daily.temperature_max, f64::max);
    // An empty f64 sum is -0.0, which would print as "-0.0mm".
    let rain = charts.daily.precipitation.iter().fold(0.0_f64, |acc, (_, v)| acc + v);

    match (lowest, highest) {
        (Some(lo), Some(hi)) => format!("week: {lo:.1}°C .. {hi:.1}°C, total rain {rain:.1}mm"),
        _ => format!("week: no temperature data, total rain {rain:.1}mm"),
    }
}

fn extreme(points: &[Point], pick: fn(f64, f64) -> f64) -> Option<f64> {
    points.iter().map(|(_, v)| *v).reduce(pick)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lookback_core::series::DailyChart;

    #[test]
    fn notification_line_shows_severity() {
        let n = Notification {
            id: 3,
            message: "Address not found".into(),
            severity: Severity::Error,
            duration_ms: 5000,
        };
        assert_eq!(format_notification(&n), "✖ [error] Address not found");
    }

    #[test]
    fn summary_uses_extremes_and_total_rain() {
        let charts = Charts {
            daily: DailyChart {
                temperature_min: vec![(0, 2.0), (1, -1.5)],
                temperature_max: vec![(0, 11.0), (1, 9.0)],
                precipitation: vec![(0, 1.2), (1, 2.0)],
            },
            ..Default::default()
        };

        assert_eq!(summary(&charts), "week: -1.5°C .. 11.0°C, total rain 3.2mm");
    }

    #[test]
    fn summary_without_temperatures() {
        assert_eq!(summary(&Charts::default()), "week: no temperature data, total rain 0.0mm");
    }

    #[test]
    fn dry_week_has_no_negative_zero_rain() {
        let charts = Charts {
            daily: DailyChart {
                temperature_min: vec![(0, 3.0)],
                temperature_max: vec![(0, 8.0)],
                precipitation: vec![],
            },
            ..Default::default()
        };

        assert_eq!(summary(&charts), "week: 3.0°C .. 8.0°C, total rain 0.0mm");
    }

    #[test]
    fn missing_cells_render_as_dash() {
        assert_eq!(cell(None, "°C"), "-");
        assert_eq!(cell(Some(&None), "°C"), "-");
        assert_eq!(cell(Some(&Some(4.26)), "mm"), "4.3mm");
    }
}
