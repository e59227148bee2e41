//! Core domain types for pagebeacon
//!
//! These types represent the canonical record produced by the ingestion
//! pipeline. Every downstream stage (sessions, aggregates, alerts) reads
//! [`NormalizedEvent`]s and never mutates them.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Beacon** | A client-emitted analytics event sent to the ingestion endpoint |
//! | **Action** | The tag carried by a beacon (`PAGE_LOAD`, `PERFORMANCE`, ...) |
//! | **Session** | A run of events sharing a session identifier |
//! | **Bounce** | A session with a single distinct page and a short duration |
//! | **Window** | A fixed time range over which aggregates are compared |

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================
// Actions
// ============================================

/// The action tag carried by a beacon.
///
/// The set of actions emitted by clients is open: anything not recognized
/// here is kept verbatim in [`Action::Other`], so a new action never needs a
/// schema change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Action {
    PageLoad,
    CustomEvent,
    Performance,
    JsError,
    SessionEnd,
    PageHidden,
    PageVisible,
    PageUnload,
    FormSubmit,
    Other(String),
}

impl Action {
    /// Returns the wire tag for this action
    pub fn as_str(&self) -> &str {
        match self {
            Action::PageLoad => "PAGE_LOAD",
            Action::CustomEvent => "CUSTOM_EVENT",
            Action::Performance => "PERFORMANCE",
            Action::JsError => "JS_ERROR",
            Action::SessionEnd => "SESSION_END",
            Action::PageHidden => "PAGE_HIDDEN",
            Action::PageVisible => "PAGE_VISIBLE",
            Action::PageUnload => "PAGE_UNLOAD",
            Action::FormSubmit => "FORM_SUBMIT",
            Action::Other(tag) => tag,
        }
    }

    /// Whether this action reports an error.
    ///
    /// Any tag containing `ERROR` counts, which covers `JS_ERROR` as well as
    /// ad-hoc tags such as `API_ERROR`.
    pub fn is_error(&self) -> bool {
        self.as_str().contains("ERROR")
    }
}

impl From<&str> for Action {
    fn from(tag: &str) -> Self {
        match tag {
            "PAGE_LOAD" => Action::PageLoad,
            "CUSTOM_EVENT" => Action::CustomEvent,
            "PERFORMANCE" => Action::Performance,
            "JS_ERROR" => Action::JsError,
            "SESSION_END" => Action::SessionEnd,
            "PAGE_HIDDEN" => Action::PageHidden,
            "PAGE_VISIBLE" => Action::PageVisible,
            "PAGE_UNLOAD" => Action::PageUnload,
            "FORM_SUBMIT" => Action::FormSubmit,
            other => Action::Other(other.to_string()),
        }
    }
}

impl From<String> for Action {
    fn from(tag: String) -> Self {
        match Action::from(tag.as_str()) {
            Action::Other(_) => Action::Other(tag),
            known => known,
        }
    }
}

impl From<Action> for String {
    fn from(action: Action) -> Self {
        match action {
            Action::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================
// Normalized events
// ============================================

/// The canonical analytics record.
///
/// Core fields (`action` through `screen_height`) are read directly from the
/// payload; the rest are optional. Every field is `None` when the payload did
/// not carry it, so a present `0` stays distinguishable from an absent value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedEvent {
    /// Verbatim text of the bracketed log prefix (opaque, not parsed)
    pub log_timestamp: Option<String>,

    // Core fields
    pub action: Option<Action>,
    pub app_id: Option<String>,
    /// ISO-8601 client timestamp, kept as sent
    pub event_timestamp: Option<String>,
    /// URL path the event was emitted from
    pub location: Option<String>,
    pub user_agent: Option<String>,
    pub screen_width: Option<i64>,
    pub screen_height: Option<i64>,

    // Optional fields
    pub page_title: Option<String>,
    pub session_id: Option<String>,
    pub session_start: Option<String>,
    pub referrer: Option<String>,
    pub page_load_time: Option<f64>,
    pub language: Option<String>,
    pub timezone: Option<String>,
    pub load_time: Option<f64>,
    pub dom_ready_time: Option<f64>,
    pub first_paint: Option<f64>,
    pub first_contentful_paint: Option<f64>,
    pub session_pages: Option<i64>,
    pub previous_page: Option<String>,
}

impl NormalizedEvent {
    /// Parsed event time, if `event_timestamp` is present and parseable.
    pub fn event_time(&self) -> Option<DateTime<Utc>> {
        self.event_timestamp.as_deref().and_then(parse_event_time)
    }

    /// Whether this event reports an error (see [`Action::is_error`]).
    pub fn is_error(&self) -> bool {
        self.action.as_ref().is_some_and(Action::is_error)
    }

    /// Whether the action matches the given one.
    pub fn is_action(&self, action: &Action) -> bool {
        self.action.as_ref() == Some(action)
    }
}

/// Parse a client timestamp.
///
/// Accepts RFC 3339 (what browsers send via `toISOString()`), plus naive
/// `YYYY-MM-DD HH:MM:SS` / `YYYY-MM-DDTHH:MM:SS[.fff]` forms which are taken
/// as UTC.
pub fn parse_event_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }

    const NAIVE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
