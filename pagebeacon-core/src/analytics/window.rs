//! Time-window aggregates for period-over-period comparison.
//!
//! `now` is always passed in. Two runs over the same events with the same
//! `now` produce the same windows.

use super::stats::{error_rate, growth_rate};
use crate::types::NormalizedEvent;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashSet;

/// Session and error counts over `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Distinct session ids seen in the window
    pub session_count: usize,
    /// Events in the window whose action reports an error
    pub error_count: usize,
}

impl AggregateWindow {
    /// Aggregate the events whose timestamp falls in `[start, end)`.
    ///
    /// Events without a parseable timestamp belong to no window.
    pub fn compute(events: &[NormalizedEvent], start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        let mut sessions: HashSet<&str> = HashSet::new();
        let mut error_count = 0;

        for event in events {
            let Some(ts) = event.event_time() else {
                continue;
            };
            if ts < start || ts >= end {
                continue;
            }
            if let Some(id) = event.session_id.as_deref() {
                sessions.insert(id);
            }
            if event.is_error() {
                error_count += 1;
            }
        }

        Self {
            start,
            end,
            session_count: sessions.len(),
            error_count,
        }
    }

    /// Errors per session in percent (denominator floors at 1).
    pub fn error_rate(&self) -> f64 {
        error_rate(self.error_count, self.session_count)
    }
}

/// The window ending at `now` and the one right before it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowComparison {
    pub current: AggregateWindow,
    pub previous: AggregateWindow,
}

impl WindowComparison {
    /// Build `[now - w, now)` and `[now - 2w, now - w)`.
    pub fn compute(events: &[NormalizedEvent], now: DateTime<Utc>, window: Duration) -> Self {
        let boundary = earlier(now, window);
        Self {
            current: AggregateWindow::compute(events, boundary, now),
            previous: AggregateWindow::compute(events, earlier(boundary, window), boundary),
        }
    }

    /// Session growth from previous to current, `None` with no baseline.
    pub fn session_growth(&self) -> Option<f64> {
        growth_rate(
            self.previous.session_count as f64,
            self.current.session_count as f64,
        )
    }

    /// Length of each window.
    pub fn window(&self) -> Duration {
        self.current.end.signed_duration_since(self.current.start)
    }
}

/// `at - window`, saturating at the earliest representable instant.
fn earlier(at: DateTime<Utc>, window: Duration) -> DateTime<Utc> {
    at.checked_sub_signed(window).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Action;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    fn event(session: &str, minutes_ago: i64, action: Action) -> NormalizedEvent {
        NormalizedEvent {
            session_id: Some(session.to_string()),
            event_timestamp: Some((now() - Duration::minutes(minutes_ago)).to_rfc3339()),
            action: Some(action),
            ..Default::default()
        }
    }

    #[test]
    fn test_window_is_half_open() {
        let events = vec![
            event("edge-start", 60, Action::PageLoad),
            event("inside", 30, Action::PageLoad),
            event("edge-end", 0, Action::PageLoad),
        ];
        let w = AggregateWindow::compute(&events, now() - Duration::hours(1), now());
        assert_eq!(w.session_count, 2);
    }

    #[test]
    fn test_window_counts_distinct_sessions_and_errors() {
        let events = vec![
            event("A", 10, Action::PageLoad),
            event("A", 9, Action::JsError),
            event("B", 5, Action::Other("API_ERROR".to_string())),
            event("C", 90, Action::JsError),
        ];
        let w = AggregateWindow::compute(&events, now() - Duration::hours(1), now());
        assert_eq!(w.session_count, 2);
        assert_eq!(w.error_count, 2);
        assert_eq!(w.error_rate(), 100.0);
    }

    #[test]
    fn test_comparison_windows() {
        let events = vec![
            event("A", 10, Action::PageLoad),
            event("B", 20, Action::PageLoad),
            event("C", 30, Action::PageLoad),
            event("X", 70, Action::PageLoad),
            event("Y", 80, Action::PageLoad),
            event("Z", 130, Action::PageLoad),
        ];
        let cmp = WindowComparison::compute(&events, now(), Duration::hours(1));

        assert_eq!(cmp.current.session_count, 3);
        assert_eq!(cmp.previous.session_count, 2);
        assert_eq!(cmp.session_growth(), Some(50.0));
        assert_eq!(cmp.window(), Duration::hours(1));
        assert_eq!(cmp.previous.end, cmp.current.start);
    }

    #[test]
    fn test_growth_without_baseline() {
        let events = vec![event("A", 10, Action::PageLoad)];
        let cmp = WindowComparison::compute(&events, now(), Duration::hours(1));
        assert_eq!(cmp.previous.session_count, 0);
        assert_eq!(cmp.session_growth(), None);
    }

    #[test]
    fn test_untimed_events_are_ignored() {
        let mut untimed = event("A", 10, Action::JsError);
        untimed.event_timestamp = Some("garbage".to_string());
        let w = AggregateWindow::compute(&[untimed], now() - Duration::hours(1), now());
        assert_eq!(w.session_count, 0);
        assert_eq!(w.error_count, 0);
    }

    #[test]
    fn test_huge_window_saturates() {
        let events = vec![event("A", 10, Action::PageLoad)];
        let cmp = WindowComparison::compute(&events, now(), Duration::seconds(10_000_000_000_000));

        assert_eq!(cmp.current.session_count, 1);
        assert_eq!(cmp.previous.start, DateTime::<Utc>::MIN_UTC);
        assert_eq!(cmp.previous.session_count, 0);
    }
}
