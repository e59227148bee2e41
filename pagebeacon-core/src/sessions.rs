//! Session reconstruction
//!
//! Sessions are never stored. Every run rebuilds them from the full event
//! set by grouping on `sessionId`:
//!
//! - events without a session id are left out of grouping entirely
//! - `start`/`end` are the earliest/latest parseable event timestamps
//! - the page flow lists distinct locations in the order they were first
//!   visited, after a stable sort by timestamp (ties keep input order)
//! - events whose timestamp does not parse are counted but take no part in
//!   ordering or duration; their pages and actions trail the timed ones in
//!   input order

use crate::config::SessionConfig;
use crate::types::NormalizedEvent;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Separator used when rendering flows.
pub const FLOW_SEPARATOR: &str = " → ";

/// A reconstructed session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub session_id: String,
    /// Earliest parseable event timestamp
    pub start: Option<DateTime<Utc>>,
    /// Latest parseable event timestamp
    pub end: Option<DateTime<Utc>>,
    /// Every event carrying this session id, timed or not
    pub event_count: usize,
    /// Distinct locations in first-visit order
    pub pages: Vec<String>,
    /// Action tags in event order (not deduplicated)
    pub actions: Vec<String>,
    pub is_bounce: bool,
}

impl Session {
    /// `end - start`, or `None` when no event timestamp parsed.
    pub fn duration(&self) -> Option<Duration> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Some(end.signed_duration_since(start)),
            _ => None,
        }
    }

    /// Duration in (fractional) seconds; zero when unknown.
    pub fn duration_secs(&self) -> f64 {
        self.duration()
            .map(|d| d.num_milliseconds() as f64 / 1000.0)
            .unwrap_or(0.0)
    }

    pub fn distinct_pages(&self) -> usize {
        self.pages.len()
    }

    /// Page flow, e.g. `/ → /pricing → /signup`.
    pub fn flow(&self) -> String {
        self.pages.join(FLOW_SEPARATOR)
    }

    /// Action flow, e.g. `PAGE_LOAD → PERFORMANCE → PAGE_HIDDEN`.
    pub fn action_flow(&self) -> String {
        self.actions.join(FLOW_SEPARATOR)
    }
}

/// Builds [`Session`]s from events.
#[derive(Debug, Clone)]
pub struct SessionReconstructor {
    bounce_threshold: Duration,
}

impl Default for SessionReconstructor {
    fn default() -> Self {
        Self::new(&SessionConfig::default())
    }
}

impl SessionReconstructor {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            bounce_threshold: config.bounce_threshold(),
        }
    }

    pub fn with_bounce_threshold(bounce_threshold: Duration) -> Self {
        Self { bounce_threshold }
    }

    /// Group events into sessions.
    ///
    /// Output is ordered by start time (sessions with no parseable timestamp
    /// last), then by session id, so the same input always yields the same
    /// table.
    pub fn reconstruct(&self, events: &[NormalizedEvent]) -> Vec<Session> {
        let mut groups: BTreeMap<&str, Vec<&NormalizedEvent>> = BTreeMap::new();
        for event in events {
            if let Some(id) = event.session_id.as_deref() {
                groups.entry(id).or_default().push(event);
            }
        }

        let mut sessions: Vec<Session> = groups
            .into_iter()
            .map(|(id, group)| self.build_session(id, &group))
            .collect();

        sessions.sort_by(|a, b| match (a.start, b.start) {
            (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.session_id.cmp(&b.session_id)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.session_id.cmp(&b.session_id),
        });

        tracing::debug!(
            events = events.len(),
            sessions = sessions.len(),
            "Reconstructed sessions"
        );

        sessions
    }

    fn build_session(&self, session_id: &str, group: &[&NormalizedEvent]) -> Session {
        let mut timed: Vec<(DateTime<Utc>, &NormalizedEvent)> = Vec::with_capacity(group.len());
        let mut untimed: Vec<&NormalizedEvent> = Vec::new();
        for &event in group {
            match event.event_time() {
                Some(ts) => timed.push((ts, event)),
                None => untimed.push(event),
            }
        }
        // Stable: equal timestamps keep input order.
        timed.sort_by_key(|(ts, _)| *ts);

        let start = timed.first().map(|(ts, _)| *ts);
        let end = timed.last().map(|(ts, _)| *ts);

        let ordered = timed.iter().map(|(_, e)| *e).chain(untimed);

        let mut seen: HashSet<&str> = HashSet::new();
        let mut pages = Vec::new();
        let mut actions = Vec::new();
        for event in ordered {
            if let Some(location) = event.location.as_deref().filter(|l| !l.is_empty()) {
                if seen.insert(location) {
                    pages.push(location.to_string());
                }
            }
            if let Some(action) = &event.action {
                actions.push(action.as_str().to_string());
            }
        }

        let duration = match (start, end) {
            (Some(s), Some(e)) => e.signed_duration_since(s),
            _ => Duration::zero(),
        };
        let is_bounce = pages.len() <= 1 && duration < self.bounce_threshold;

        Session {
            session_id: session_id.to_string(),
            start,
            end,
            event_count: group.len(),
            pages,
            actions,
            is_bounce,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Action;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
    }

    fn event(session: Option<&str>, offset_secs: i64, location: &str) -> NormalizedEvent {
        NormalizedEvent {
            action: Some(Action::PageLoad),
            session_id: session.map(str::to_string),
            event_timestamp: Some((t0() + Duration::seconds(offset_secs)).to_rfc3339()),
            location: Some(location.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_short_single_page_session_bounces() {
        let events = vec![event(Some("A"), 0, "/x"), event(Some("A"), 10, "/x")];
        let sessions = SessionReconstructor::with_bounce_threshold(Duration::seconds(30))
            .reconstruct(&events);

        assert_eq!(sessions.len(), 1);
        let s = &sessions[0];
        assert_eq!(s.session_id, "A");
        assert_eq!(s.event_count, 2);
        assert_eq!(s.duration(), Some(Duration::seconds(10)));
        assert_eq!(s.pages, vec!["/x"]);
        assert!(s.is_bounce);
    }

    #[test]
    fn test_second_page_prevents_bounce() {
        let events = vec![
            event(Some("A"), 0, "/x"),
            event(Some("A"), 10, "/x"),
            event(Some("A"), 40, "/y"),
        ];
        let sessions = SessionReconstructor::default().reconstruct(&events);

        let s = &sessions[0];
        assert_eq!(s.duration_secs(), 40.0);
        assert_eq!(s.distinct_pages(), 2);
        assert!(!s.is_bounce);
    }

    #[test]
    fn test_long_single_page_session_is_not_bounce() {
        let events = vec![event(Some("A"), 0, "/x"), event(Some("A"), 45, "/x")];
        let sessions = SessionReconstructor::default().reconstruct(&events);
        assert!(!sessions[0].is_bounce);
    }

    #[test]
    fn test_flow_follows_timestamps_not_input_order() {
        let events = vec![
            event(Some("A"), 30, "/checkout"),
            event(Some("A"), 0, "/"),
            event(Some("A"), 10, "/pricing"),
            event(Some("A"), 20, "/"),
        ];
        let sessions = SessionReconstructor::default().reconstruct(&events);

        assert_eq!(sessions[0].flow(), "/ → /pricing → /checkout");
        assert_eq!(sessions[0].start, Some(t0()));
        assert_eq!(sessions[0].end, Some(t0() + Duration::seconds(30)));
    }

    #[test]
    fn test_equal_timestamps_keep_input_order() {
        let events = vec![
            event(Some("A"), 5, "/b"),
            event(Some("A"), 5, "/a"),
            event(Some("A"), 5, "/c"),
        ];
        let sessions = SessionReconstructor::default().reconstruct(&events);
        assert_eq!(sessions[0].pages, vec!["/b", "/a", "/c"]);
    }

    #[test]
    fn test_events_without_session_are_excluded() {
        let events = vec![
            event(None, 0, "/orphan"),
            event(Some("B"), 0, "/b"),
            event(Some("A"), 5, "/a"),
        ];
        let sessions = SessionReconstructor::default().reconstruct(&events);

        let ids: Vec<_> = sessions.iter().map(|s| s.session_id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A"]);
    }

    #[test]
    fn test_unparseable_timestamp_counts_but_does_not_order() {
        let mut bad = event(Some("A"), 0, "/late");
        bad.event_timestamp = Some("not a time".to_string());
        let events = vec![bad, event(Some("A"), 0, "/a"), event(Some("A"), 8, "/a")];

        let sessions = SessionReconstructor::default().reconstruct(&events);
        let s = &sessions[0];

        assert_eq!(s.event_count, 3);
        assert_eq!(s.duration(), Some(Duration::seconds(8)));
        assert_eq!(s.pages, vec!["/a", "/late"]);
    }

    #[test]
    fn test_session_without_any_timestamp() {
        let mut only = event(Some("Z"), 0, "/x");
        only.event_timestamp = None;
        let sessions = SessionReconstructor::default().reconstruct(&[only]);

        assert_eq!(sessions[0].start, None);
        assert_eq!(sessions[0].duration(), None);
        assert_eq!(sessions[0].duration_secs(), 0.0);
        assert!(sessions[0].is_bounce);
    }

    #[test]
    fn test_action_flow() {
        let mut perf = event(Some("A"), 2, "/");
        perf.action = Some(Action::Performance);
        let mut hidden = event(Some("A"), 9, "/");
        hidden.action = Some(Action::PageHidden);
        let events = vec![hidden, event(Some("A"), 0, "/"), perf];

        let sessions = SessionReconstructor::default().reconstruct(&events);
        assert_eq!(
            sessions[0].action_flow(),
            "PAGE_LOAD → PERFORMANCE → PAGE_HIDDEN"
        );
    }
}
