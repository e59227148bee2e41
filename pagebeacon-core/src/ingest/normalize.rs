//! Payload → [`NormalizedEvent`] mapping
//!
//! Beacon payloads have no enforced schema, so each field is pulled out of
//! the untyped map explicitly:
//!
//! - string fields accept JSON strings; numbers are stringified
//! - numeric fields accept JSON numbers and numeric strings
//! - `null`, missing keys and any other JSON type yield `None`
//!
//! Nothing here rejects a payload. A beacon missing every core field still
//! becomes a record with every field absent.

use crate::types::{Action, NormalizedEvent};
use serde_json::{Map, Value};

/// Map a decoded payload into the canonical record.
pub fn normalize(payload: &Map<String, Value>, log_timestamp: Option<String>) -> NormalizedEvent {
    NormalizedEvent {
        log_timestamp,

        action: string_field(payload, "action").map(Action::from),
        app_id: string_field(payload, "appId"),
        event_timestamp: string_field(payload, "timestamp")
            .or_else(|| string_field(payload, "eventTimestamp")),
        location: string_field(payload, "location"),
        user_agent: string_field(payload, "userAgent"),
        screen_width: integer_field(payload, "screenWidth"),
        screen_height: integer_field(payload, "screenHeight"),

        page_title: string_field(payload, "pageTitle"),
        session_id: string_field(payload, "sessionId"),
        session_start: string_field(payload, "sessionStart"),
        referrer: string_field(payload, "referrer"),
        page_load_time: number_field(payload, "pageLoadTime"),
        language: string_field(payload, "language"),
        timezone: string_field(payload, "timezone"),
        load_time: number_field(payload, "loadTime"),
        dom_ready_time: number_field(payload, "domReadyTime"),
        first_paint: number_field(payload, "firstPaint"),
        first_contentful_paint: number_field(payload, "firstContentfulPaint"),
        session_pages: integer_field(payload, "sessionPages"),
        previous_page: string_field(payload, "previousPage"),
    }
}

fn string_field(payload: &Map<String, Value>, key: &str) -> Option<String> {
    match payload.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number_field(payload: &Map<String, Value>, key: &str) -> Option<f64> {
    let value = match payload.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    value.is_finite().then_some(value)
}

fn integer_field(payload: &Map<String, Value>, key: &str) -> Option<i64> {
    match payload.get(key)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}
