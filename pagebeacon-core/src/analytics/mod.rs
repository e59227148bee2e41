//! Aggregates over normalized events and reconstructed sessions.
//!
//! - [`stats`]: counts, summaries, histograms and the rate formulas
//! - [`window`]: half-open time windows for period-over-period comparison
//! - [`breakdown`]: per-dimension tables (action, hour, day, device, browser, ...)
//! - [`performance`]: load-time statistics per location and page
//!
//! Everything here is a pure function of its input. Zero denominators either
//! floor at 1 (rates over session counts) or yield `None` (growth, means).

pub mod breakdown;
pub mod performance;
pub mod stats;
pub mod window;

pub use breakdown::{
    action_counts, browser_breakdown, daily_activity, device_breakdown, hourly_sessions,
    locale_breakdown, page_visits, resolution_breakdown, BreakdownRow, Browser, CountRow,
    DailyActivity, DeviceType, HourlySessions,
};
pub use performance::{page_loads, LocationPerformance, PageLoadRow, PerformanceReport};
pub use stats::{
    average_session_duration, bounce_rate, error_rate, growth_rate, histogram, mean, median,
    positive_values, summarize, summarize_field, totals, EventTotals, Histogram,
    HistogramBucket, NumericField, NumericSummary,
};
pub use window::{AggregateWindow, WindowComparison};

use crate::sessions::Session;
use crate::types::NormalizedEvent;
use serde::Serialize;

/// Everything the overview report shows, computed in one pass per table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub totals: EventTotals,
    pub session_count: usize,
    /// Percent of sessions that bounced
    pub bounce_rate: f64,
    /// Seconds
    pub avg_session_duration: f64,
    pub actions: Vec<CountRow>,
    pub top_pages: Vec<CountRow>,
    pub hourly_sessions: Vec<HourlySessions>,
    pub daily_activity: Vec<DailyActivity>,
    pub devices: Vec<BreakdownRow>,
    pub browsers: Vec<BreakdownRow>,
    pub resolutions: Vec<BreakdownRow>,
    pub locales: Vec<BreakdownRow>,
    pub page_loads: Vec<PageLoadRow>,
}

impl Dashboard {
    pub fn compute(events: &[NormalizedEvent], sessions: &[Session]) -> Self {
        Self {
            totals: totals(events),
            session_count: sessions.len(),
            bounce_rate: bounce_rate(sessions),
            avg_session_duration: average_session_duration(sessions),
            actions: action_counts(events),
            top_pages: page_visits(events),
            hourly_sessions: hourly_sessions(events),
            daily_activity: daily_activity(events),
            devices: device_breakdown(events),
            browsers: browser_breakdown(events),
            resolutions: resolution_breakdown(events),
            locales: locale_breakdown(events),
            page_loads: page_loads(events),
        }
    }

    /// Most visited page, if any page was visited.
    pub fn top_page(&self) -> Option<&str> {
        self.top_pages.first().map(|row| row.label.as_str())
    }

    /// Browser with the most sessions.
    pub fn top_browser(&self) -> Option<&str> {
        self.browsers.first().map(|row| row.label.as_str())
    }
}
