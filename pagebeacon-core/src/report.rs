//! Rendered report payloads for the daily and alert-check cadences.
//!
//! Payloads are plain subject/body text. Delivering them (mail, chat, ...)
//! is the caller's business. Render times are passed in so the output is
//! reproducible.

use crate::alerts::Alert;
use crate::analytics::{average_session_duration, bounce_rate, browser_breakdown, page_visits};
use crate::format::{format_count, format_percent};
use crate::sessions::Session;
use crate::types::NormalizedEvent;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A rendered notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportPayload {
    pub subject: String,
    pub body: String,
}

/// Headline numbers for the daily summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyReport {
    pub total_sessions: usize,
    /// Seconds
    pub avg_session_duration: f64,
    /// Percent
    pub bounce_rate: f64,
    pub top_page: Option<String>,
    pub top_browser: Option<String>,
}

impl DailyReport {
    pub fn compute(events: &[NormalizedEvent], sessions: &[Session]) -> Self {
        // Only session events feed the top tables.
        let session_events: Vec<NormalizedEvent> = events
            .iter()
            .filter(|e| e.session_id.is_some())
            .cloned()
            .collect();

        Self {
            total_sessions: sessions.len(),
            avg_session_duration: average_session_duration(sessions),
            bounce_rate: bounce_rate(sessions),
            top_page: page_visits(&session_events)
                .into_iter()
                .next()
                .map(|row| row.label),
            top_browser: browser_breakdown(&session_events)
                .into_iter()
                .next()
                .map(|row| row.label),
        }
    }

    pub fn render(&self, generated_at: DateTime<Utc>) -> ReportPayload {
        let body = format!(
            "Daily Analytics Summary\n\
             Date: {date}\n\
             \n\
             Key Metrics\n\
             - Total Sessions: {sessions}\n\
             - Avg. Session Duration: {duration} seconds\n\
             - Bounce Rate: {bounce}\n\
             - Top Page: {page}\n\
             - Most Used Browser: {browser}\n\
             \n\
             Report generated on {generated}",
            date = generated_at.format("%B %-d, %Y"),
            sessions = format_count(self.total_sessions),
            duration = self.avg_session_duration.round(),
            bounce = format_percent(self.bounce_rate),
            page = self.top_page.as_deref().unwrap_or("N/A"),
            browser = self.top_browser.as_deref().unwrap_or("N/A"),
            generated = generated_at.format("%Y-%m-%d %H:%M:%S"),
        );

        ReportPayload {
            subject: format!("Daily Analytics Report - {}", generated_at.format("%Y-%m-%d")),
            body,
        }
    }
}

/// Render an alert list. `None` when there is nothing to send.
pub fn render_alerts(alerts: &[Alert], checked_at: DateTime<Utc>) -> Option<ReportPayload> {
    if alerts.is_empty() {
        return None;
    }

    let lines: Vec<String> = alerts
        .iter()
        .map(|alert| format!("[{}] {}", alert.severity, alert.message))
        .collect();

    Some(ReportPayload {
        subject: format!("Analytics Alerts - {}", checked_at.format("%H:%M")),
        body: format!(
            "Analytics Alerts\n\n{}\n\nAlert check at {}",
            lines.join("\n"),
            checked_at.format("%Y-%m-%d %H:%M:%S")
        ),
    })
}
