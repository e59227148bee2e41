//! Dimension breakdowns for the reporting views.
//!
//! Every function returns rows in a fixed order (count descending, then
//! label ascending) so results are stable across runs.

use super::stats::{mean, positive_values, NumericField};
use crate::types::NormalizedEvent;
use chrono::{NaiveDate, Timelike};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// A label with how often it occurred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountRow {
    pub label: String,
    pub count: usize,
}

/// Sessions, events and average load time for one dimension value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownRow {
    pub label: String,
    pub sessions: usize,
    pub events: usize,
    /// Mean of positive `loadTime` values in the group
    pub avg_load_time: Option<f64>,
}

/// Distinct sessions active during one hour of the day (UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourlySessions {
    pub hour: u32,
    pub sessions: usize,
}

/// Events and distinct sessions for one UTC calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub events: usize,
    pub sessions: usize,
}

/// Coarse device class derived from the user agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DeviceType {
    Mobile,
    Desktop,
}

impl DeviceType {
    pub fn from_user_agent(user_agent: Option<&str>) -> Self {
        match user_agent {
            Some(ua) if ua.contains("Mobile") => DeviceType::Mobile,
            _ => DeviceType::Desktop,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Mobile => "Mobile",
            DeviceType::Desktop => "Desktop",
        }
    }
}

/// Browser family derived from the user agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Browser {
    Edge,
    Opera,
    Chrome,
    Firefox,
    Safari,
    Other,
}

impl Browser {
    /// Classify a user agent string.
    ///
    /// Edge and Opera advertise `Chrome/` too, and Chrome advertises
    /// `Safari/`, so the checks run most-specific first.
    pub fn from_user_agent(user_agent: &str) -> Self {
        if user_agent.contains("Edg/") || user_agent.contains("Edge/") {
            Browser::Edge
        } else if user_agent.contains("OPR/") || user_agent.contains("Opera") {
            Browser::Opera
        } else if user_agent.contains("Chrome/") || user_agent.contains("CriOS/") {
            Browser::Chrome
        } else if user_agent.contains("Firefox/") || user_agent.contains("FxiOS/") {
            Browser::Firefox
        } else if user_agent.contains("Safari/") {
            Browser::Safari
        } else {
            Browser::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Edge => "Edge",
            Browser::Opera => "Opera",
            Browser::Chrome => "Chrome",
            Browser::Firefox => "Firefox",
            Browser::Safari => "Safari",
            Browser::Other => "Other",
        }
    }
}

/// Event count per action tag.
pub fn action_counts(events: &[NormalizedEvent]) -> Vec<CountRow> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for event in events {
        let label = event.action.as_ref().map_or("(none)", |a| a.as_str());
        *counts.entry(label).or_insert(0) += 1;
    }
    sorted_counts(counts)
}

/// How often each location was visited across session events.
pub fn page_visits(events: &[NormalizedEvent]) -> Vec<CountRow> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for event in events.iter().filter(|e| e.session_id.is_some()) {
        if let Some(location) = event.location.as_deref().filter(|l| !l.is_empty()) {
            *counts.entry(location).or_insert(0) += 1;
        }
    }
    sorted_counts(counts)
}

/// Distinct sessions per hour of day, hours without sessions omitted.
pub fn hourly_sessions(events: &[NormalizedEvent]) -> Vec<HourlySessions> {
    let mut hours: BTreeMap<u32, HashSet<&str>> = BTreeMap::new();
    for event in events {
        if let (Some(id), Some(ts)) = (event.session_id.as_deref(), event.event_time()) {
            hours.entry(ts.hour()).or_default().insert(id);
        }
    }
    hours
        .into_iter()
        .map(|(hour, sessions)| HourlySessions {
            hour,
            sessions: sessions.len(),
        })
        .collect()
}

/// Events and distinct sessions per day, oldest first.
pub fn daily_activity(events: &[NormalizedEvent]) -> Vec<DailyActivity> {
    let mut days: BTreeMap<NaiveDate, (usize, HashSet<&str>)> = BTreeMap::new();
    for event in events {
        let Some(ts) = event.event_time() else {
            continue;
        };
        let entry = days.entry(ts.date_naive()).or_default();
        entry.0 += 1;
        if let Some(id) = event.session_id.as_deref() {
            entry.1.insert(id);
        }
    }
    days.into_iter()
        .map(|(date, (events, sessions))| DailyActivity {
            date,
            events,
            sessions: sessions.len(),
        })
        .collect()
}

/// Mobile vs desktop, over events that carry a session id.
pub fn device_breakdown(events: &[NormalizedEvent]) -> Vec<BreakdownRow> {
    breakdown(events.iter().filter(|e| e.session_id.is_some()), |e| {
        Some(DeviceType::from_user_agent(e.user_agent.as_deref()).as_str().to_string())
    })
}

/// Browser family, over events that carry a user agent.
pub fn browser_breakdown(events: &[NormalizedEvent]) -> Vec<BreakdownRow> {
    breakdown(events.iter(), |e| {
        e.user_agent
            .as_deref()
            .map(|ua| Browser::from_user_agent(ua).as_str().to_string())
    })
}

/// `WxH` screen sizes, over events that carry both dimensions.
pub fn resolution_breakdown(events: &[NormalizedEvent]) -> Vec<BreakdownRow> {
    breakdown(events.iter(), |e| match (e.screen_width, e.screen_height) {
        (Some(w), Some(h)) => Some(format!("{}x{}", w, h)),
        _ => None,
    })
}

/// `language / timezone`, over session events that carry a language.
pub fn locale_breakdown(events: &[NormalizedEvent]) -> Vec<BreakdownRow> {
    breakdown(events.iter().filter(|e| e.session_id.is_some()), |e| {
        let language = e.language.as_deref()?;
        Some(format!(
            "{} / {}",
            language,
            e.timezone.as_deref().unwrap_or("unknown")
        ))
    })
}

fn breakdown<'a, I, F>(events: I, label_of: F) -> Vec<BreakdownRow>
where
    I: Iterator<Item = &'a NormalizedEvent>,
    F: Fn(&NormalizedEvent) -> Option<String>,
{
    let mut groups: HashMap<String, Vec<&'a NormalizedEvent>> = HashMap::new();
    for event in events {
        if let Some(label) = label_of(event) {
            groups.entry(label).or_default().push(event);
        }
    }

    let mut rows: Vec<BreakdownRow> = groups
        .into_iter()
        .map(|(label, group)| {
            let sessions: HashSet<&str> =
                group.iter().filter_map(|e| e.session_id.as_deref()).collect();
            BreakdownRow {
                label,
                sessions: sessions.len(),
                events: group.len(),
                avg_load_time: mean(&positive_values(group.iter().copied(), NumericField::LoadTime)),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.sessions
            .cmp(&a.sessions)
            .then_with(|| b.events.cmp(&a.events))
            .then_with(|| a.label.cmp(&b.label))
    });
    rows
}

fn sorted_counts(counts: HashMap<&str, usize>) -> Vec<CountRow> {
    let mut rows: Vec<CountRow> = counts
        .into_iter()
        .map(|(label, count)| CountRow {
            label: label.to_string(),
            count,
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    rows
}
