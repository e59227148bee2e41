//! Page performance aggregates.
//!
//! Timings come from `PERFORMANCE` beacons (and `loadTime` on `PAGE_LOAD`
//! beacons for the page-load table). Only samples with a positive
//! `loadTime` are considered.

use super::stats::{
    histogram, mean, positive_values, summarize, Histogram, NumericField, NumericSummary,
};
use crate::types::{Action, NormalizedEvent};
use serde::Serialize;
use std::collections::BTreeMap;

/// Label used for events without a location.
const UNKNOWN_LOCATION: &str = "(unknown)";

/// Load-time statistics for one location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationPerformance {
    pub location: String,
    pub load_time: NumericSummary,
    pub avg_dom_ready_time: Option<f64>,
    pub avg_first_contentful_paint: Option<f64>,
}

/// Load counts and timings per page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageLoadRow {
    pub location: String,
    pub page_title: Option<String>,
    pub loads: usize,
    pub avg_load_time: Option<f64>,
    pub avg_dom_ready_time: Option<f64>,
    pub avg_first_contentful_paint: Option<f64>,
}

/// Everything the performance view needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceReport {
    /// All samples together
    pub overall: Option<NumericSummary>,
    /// Slowest location first
    pub by_location: Vec<LocationPerformance>,
    pub load_time_distribution: Histogram,
}

impl PerformanceReport {
    pub fn compute(events: &[NormalizedEvent], bucket_width: f64) -> Self {
        let samples = performance_samples(events);
        let load_times = positive_values(samples.iter().copied(), NumericField::LoadTime);

        Self {
            overall: summarize(&load_times),
            by_location: by_location(&samples),
            load_time_distribution: histogram(&load_times, bucket_width),
        }
    }
}

/// `PERFORMANCE` events with a positive load time.
fn performance_samples(events: &[NormalizedEvent]) -> Vec<&NormalizedEvent> {
    events
        .iter()
        .filter(|e| e.is_action(&Action::Performance) && has_load_time(e))
        .collect()
}

fn has_load_time(event: &NormalizedEvent) -> bool {
    event.load_time.is_some_and(|t| t.is_finite() && t > 0.0)
}

fn by_location(samples: &[&NormalizedEvent]) -> Vec<LocationPerformance> {
    let mut groups: BTreeMap<&str, Vec<&NormalizedEvent>> = BTreeMap::new();
    for &event in samples {
        let location = event.location.as_deref().unwrap_or(UNKNOWN_LOCATION);
        groups.entry(location).or_default().push(event);
    }

    let mut rows: Vec<LocationPerformance> = groups
        .into_iter()
        .filter_map(|(location, group)| {
            let load_time =
                summarize(&positive_values(group.iter().copied(), NumericField::LoadTime))?;
            Some(LocationPerformance {
                location: location.to_string(),
                load_time,
                avg_dom_ready_time: avg(&group, NumericField::DomReadyTime),
                avg_first_contentful_paint: avg(&group, NumericField::FirstContentfulPaint),
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        b.load_time
            .mean
            .total_cmp(&a.load_time.mean)
            .then_with(|| a.location.cmp(&b.location))
    });
    rows
}

/// `PAGE_LOAD` events with a positive load time, grouped by
/// `(location, page_title)`, most loaded first.
pub fn page_loads(events: &[NormalizedEvent]) -> Vec<PageLoadRow> {
    let mut groups: BTreeMap<(&str, Option<&str>), Vec<&NormalizedEvent>> = BTreeMap::new();
    for event in events
        .iter()
        .filter(|e| e.is_action(&Action::PageLoad) && has_load_time(e))
    {
        let key = (
            event.location.as_deref().unwrap_or(UNKNOWN_LOCATION),
            event.page_title.as_deref(),
        );
        groups.entry(key).or_default().push(event);
    }

    let mut rows: Vec<PageLoadRow> = groups
        .into_iter()
        .map(|((location, title), group)| PageLoadRow {
            location: location.to_string(),
            page_title: title.map(str::to_string),
            loads: group.len(),
            avg_load_time: avg(&group, NumericField::LoadTime),
            avg_dom_ready_time: avg(&group, NumericField::DomReadyTime),
            avg_first_contentful_paint: avg(&group, NumericField::FirstContentfulPaint),
        })
        .collect();

    // Stable sort keeps the BTreeMap key order among equal counts.
    rows.sort_by(|a, b| b.loads.cmp(&a.loads));
    rows
}

fn avg(group: &[&NormalizedEvent], field: NumericField) -> Option<f64> {
    mean(&positive_values(group.iter().copied(), field))
}
