//! Alert evaluation over two comparison windows.
//!
//! Stateless: the same windows and thresholds always give the same alerts,
//! in the same order (spike, drop, error rate).

use crate::analytics::WindowComparison;
use crate::config::AlertThresholds;
use chrono::Duration;
use serde::Serialize;

/// How loudly an alert should be surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    TrafficSpike,
    TrafficDrop,
    HighErrorRate,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::TrafficSpike => "traffic_spike",
            AlertKind::TrafficDrop => "traffic_drop",
            AlertKind::HighErrorRate => "high_error_rate",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            AlertKind::TrafficSpike => Severity::Info,
            AlertKind::TrafficDrop => Severity::Warning,
            AlertKind::HighErrorRate => Severity::Error,
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A produced alert. Never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub message: String,
    pub severity: Severity,
}

impl Alert {
    fn new(kind: AlertKind, message: String) -> Self {
        Self {
            kind,
            message,
            severity: kind.severity(),
        }
    }
}

/// Classify a window comparison against the thresholds.
///
/// Spike and drop need sessions in both windows; the error-rate check runs
/// on the current window alone.
pub fn evaluate(comparison: &WindowComparison, thresholds: &AlertThresholds) -> Vec<Alert> {
    let mut alerts = Vec::new();
    let period = describe_window(comparison.window());
    let current = &comparison.current;
    let previous = &comparison.previous;

    if current.session_count > 0 && previous.session_count > 0 {
        if let Some(growth) = comparison.session_growth() {
            if growth > thresholds.traffic_spike_pct {
                alerts.push(Alert::new(
                    AlertKind::TrafficSpike,
                    format!(
                        "Traffic spike detected: {}% increase in the last {}",
                        growth.round(),
                        period
                    ),
                ));
            }
            if growth < -thresholds.traffic_drop_pct {
                alerts.push(Alert::new(
                    AlertKind::TrafficDrop,
                    format!(
                        "Traffic drop detected: {}% decrease in the last {}",
                        growth.abs().round(),
                        period
                    ),
                ));
            }
        }
    }

    let error_rate = current.error_rate();
    if error_rate > thresholds.error_rate_pct {
        alerts.push(Alert::new(
            AlertKind::HighErrorRate,
            format!(
                "High error rate: {}% of sessions had errors",
                (error_rate * 10.0).round() / 10.0
            ),
        ));
    }

    tracing::debug!(
        current_sessions = current.session_count,
        previous_sessions = previous.session_count,
        current_errors = current.error_count,
        alerts = alerts.len(),
        "Evaluated alerts"
    );

    alerts
}

/// `hour`, `2 hours`, `30 minutes`, `45 seconds`.
fn describe_window(window: Duration) -> String {
    let secs = window.num_seconds();
    let (amount, unit) = if secs > 0 && secs % 3600 == 0 {
        (secs / 3600, "hour")
    } else if secs > 0 && secs % 60 == 0 {
        (secs / 60, "minute")
    } else {
        (secs, "second")
    };
    if amount == 1 {
        unit.to_string()
    } else {
        format!("{} {}s", amount, unit)
    }
}
