//! Beacon payload construction.
//!
//! A beacon is a flat JSON object with camelCase keys. Caller metadata is
//! merged last and wins over the core fields.

use super::context::SessionContext;
use crate::types::Action;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// What the emitting page knows about itself.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageEnvironment {
    pub location: String,
    pub user_agent: Option<String>,
    pub screen_width: Option<i64>,
    pub screen_height: Option<i64>,
    pub page_title: Option<String>,
    pub language: Option<String>,
    pub timezone: Option<String>,
    /// Navigation start to load end, in milliseconds
    pub page_load_time: Option<f64>,
}

/// Browser timing sample for a `PERFORMANCE` beacon.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PerformanceTiming {
    pub load_time: f64,
    pub dom_ready_time: f64,
    pub first_paint: Option<f64>,
    pub first_contentful_paint: Option<f64>,
}

/// Builder for a single beacon payload.
#[derive(Debug, Clone)]
pub struct Beacon {
    fields: Map<String, Value>,
    metadata: Map<String, Value>,
}

impl Beacon {
    pub fn new(
        action: Action,
        app_id: &str,
        page: &PageEnvironment,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let mut fields = Map::new();
        fields.insert("action".into(), Value::String(action.into()));
        fields.insert("appId".into(), Value::String(app_id.to_string()));
        fields.insert(
            "timestamp".into(),
            Value::String(timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        if let Ok(Value::Object(env)) = serde_json::to_value(page) {
            fields.extend(env);
        }
        Self {
            fields,
            metadata: Map::new(),
        }
    }

    /// Attach the session fields and the resolved referrer.
    pub fn session(mut self, ctx: &SessionContext, referrer: &str) -> Self {
        self.fields
            .insert("sessionId".into(), Value::String(ctx.session_id.clone()));
        self.fields.insert(
            "sessionStart".into(),
            Value::String(ctx.started_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        self.fields
            .insert("referrer".into(), Value::String(referrer.to_string()));
        self
    }

    /// Add one metadata entry. Later entries replace earlier ones.
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }

    /// Metadata for a `CUSTOM_EVENT` beacon.
    pub fn custom_event(
        self,
        category: &str,
        action: &str,
        label: Option<&str>,
        value: Option<f64>,
    ) -> Self {
        let element = label.map(|l| format!("[data-track=\"{}\"]", l));
        self.with("eventCategory", category)
            .with("eventAction", action)
            .with("eventLabel", label)
            .with("eventValue", value)
            .with("eventElement", element)
    }

    /// Metadata for a `PERFORMANCE` beacon.
    pub fn performance(self, timing: &PerformanceTiming) -> Self {
        self.with("loadTime", timing.load_time)
            .with("domReadyTime", timing.dom_ready_time)
            .with("firstPaint", timing.first_paint)
            .with("firstContentfulPaint", timing.first_contentful_paint)
    }

    /// The final payload, metadata merged over the core fields.
    pub fn into_payload(self) -> Map<String, Value> {
        let mut payload = self.fields;
        payload.extend(self.metadata);
        payload
    }
}
