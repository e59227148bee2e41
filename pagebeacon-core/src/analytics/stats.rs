//! Reducers over events and sessions.
//!
//! Numeric aggregates only look at values that are present and strictly
//! positive: a missing or zero `loadTime` means "not measured", not "instant".
//! Rates that would divide by zero return `None` (or floor their
//! denominator at 1 where the report format always wants a number).

use crate::sessions::Session;
use crate::types::NormalizedEvent;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Numeric event fields that can be aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericField {
    LoadTime,
    DomReadyTime,
    FirstPaint,
    FirstContentfulPaint,
    PageLoadTime,
}

impl NumericField {
    pub fn as_str(&self) -> &'static str {
        match self {
            NumericField::LoadTime => "load_time",
            NumericField::DomReadyTime => "dom_ready_time",
            NumericField::FirstPaint => "first_paint",
            NumericField::FirstContentfulPaint => "first_contentful_paint",
            NumericField::PageLoadTime => "page_load_time",
        }
    }

    pub fn extract(&self, event: &NormalizedEvent) -> Option<f64> {
        match self {
            NumericField::LoadTime => event.load_time,
            NumericField::DomReadyTime => event.dom_ready_time,
            NumericField::FirstPaint => event.first_paint,
            NumericField::FirstContentfulPaint => event.first_contentful_paint,
            NumericField::PageLoadTime => event.page_load_time,
        }
    }
}

impl std::fmt::Display for NumericField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for NumericField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "load_time" | "loadTime" => Ok(NumericField::LoadTime),
            "dom_ready_time" | "domReadyTime" => Ok(NumericField::DomReadyTime),
            "first_paint" | "firstPaint" => Ok(NumericField::FirstPaint),
            "first_contentful_paint" | "firstContentfulPaint" => {
                Ok(NumericField::FirstContentfulPaint)
            }
            "page_load_time" | "pageLoadTime" => Ok(NumericField::PageLoadTime),
            _ => Err(format!("unknown numeric field: {}", s)),
        }
    }
}

/// Present, finite, strictly positive values of `field`, in input order.
pub fn positive_values<'a, I>(events: I, field: NumericField) -> Vec<f64>
where
    I: IntoIterator<Item = &'a NormalizedEvent>,
{
    events
        .into_iter()
        .filter_map(|e| field.extract(e))
        .filter(|v| v.is_finite() && *v > 0.0)
        .collect()
}

/// Mean/min/max/median over a set of values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
}

/// Summarize `values` as given. `None` for an empty set.
pub fn summarize(values: &[f64]) -> Option<NumericSummary> {
    let median = median(values)?;
    let sum: f64 = values.iter().sum();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Some(NumericSummary {
        count: values.len(),
        mean: sum / values.len() as f64,
        min,
        max,
        median,
    })
}

/// Summarize the positive values of `field` across `events`.
pub fn summarize_field<'a, I>(events: I, field: NumericField) -> Option<NumericSummary>
where
    I: IntoIterator<Item = &'a NormalizedEvent>,
{
    summarize(&positive_values(events, field))
}

/// Arithmetic mean, `None` for an empty set.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Median: middle value of the sorted set, or the average of the two middle
/// values for an even count.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// One non-empty histogram bucket, covering `[start, start + width)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBucket {
    pub start: f64,
    pub count: usize,
}

/// Sparse fixed-width histogram, buckets ascending by start.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub bucket_width: f64,
    pub buckets: Vec<HistogramBucket>,
}

impl Histogram {
    pub fn total(&self) -> usize {
        self.buckets.iter().map(|b| b.count).sum()
    }
}

/// Bucket `values` by `floor(value / width) * width`.
///
/// Only observed buckets are emitted. Non-finite values are ignored; a
/// non-positive width yields an empty histogram.
pub fn histogram(values: &[f64], bucket_width: f64) -> Histogram {
    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    if bucket_width > 0.0 {
        for value in values.iter().filter(|v| v.is_finite()) {
            let index = (value / bucket_width).floor() as i64;
            *counts.entry(index).or_insert(0) += 1;
        }
    }

    Histogram {
        bucket_width,
        buckets: counts
            .into_iter()
            .map(|(index, count)| HistogramBucket {
                start: index as f64 * bucket_width,
                count,
            })
            .collect(),
    }
}

/// Percentage change from `previous` to `current`.
///
/// `None` when `previous` is zero: there is nothing to compare against.
pub fn growth_rate(previous: f64, current: f64) -> Option<f64> {
    if previous == 0.0 {
        return None;
    }
    Some((current - previous) / previous * 100.0)
}

/// Errors per session in percent; the session count floors at 1.
pub fn error_rate(error_count: usize, session_count: usize) -> f64 {
    error_count as f64 / session_count.max(1) as f64 * 100.0
}

/// Share of bouncing sessions in percent; the session count floors at 1.
pub fn bounce_rate(sessions: &[Session]) -> f64 {
    let bounces = sessions.iter().filter(|s| s.is_bounce).count();
    bounces as f64 / sessions.len().max(1) as f64 * 100.0
}

/// Average session duration in seconds; the session count floors at 1.
pub fn average_session_duration(sessions: &[Session]) -> f64 {
    let total: f64 = sessions.iter().map(Session::duration_secs).sum();
    total / sessions.len().max(1) as f64
}

/// Headline counts over an event set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventTotals {
    pub total_events: usize,
    pub distinct_sessions: usize,
    pub distinct_pages: usize,
    /// Distinct UTC calendar days among parseable event timestamps
    pub distinct_days: usize,
    pub error_events: usize,
}

pub fn totals(events: &[NormalizedEvent]) -> EventTotals {
    let mut sessions: HashSet<&str> = HashSet::new();
    let mut pages: HashSet<&str> = HashSet::new();
    let mut days: HashSet<NaiveDate> = HashSet::new();
    let mut error_events = 0;

    for event in events {
        if let Some(id) = event.session_id.as_deref() {
            sessions.insert(id);
        }
        if let Some(location) = event.location.as_deref() {
            pages.insert(location);
        }
        if let Some(ts) = event.event_time() {
            days.insert(ts.date_naive());
        }
        if event.is_error() {
            error_events += 1;
        }
    }

    EventTotals {
        total_events: events.len(),
        distinct_sessions: sessions.len(),
        distinct_pages: pages.len(),
        distinct_days: days.len(),
        error_events,
    }
}
