//! Emitter-side session bookkeeping.
//!
//! A [`SessionContext`] is a plain value threaded through emission calls.
//! Expiry is decided from `(last_activity, now)` alone so callers control
//! the clock.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Referrer value when a session's first page has no document referrer.
pub const DIRECT_REFERRER: &str = "direct";

/// Referrer value when the page reloads itself within a session.
pub const SELF_REFERRER: &str = "self";

/// One recorded page view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageView {
    pub page: String,
    pub title: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// The emitter's view of the current session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub page_views: Vec<PageView>,
}

/// Whether a session idle since `last_activity` has expired at `now`.
pub fn is_expired(last_activity: DateTime<Utc>, now: DateTime<Utc>, timeout: Duration) -> bool {
    last_activity < now - timeout
}

/// `sess_<unix millis>_<9 random lowercase alphanumerics>`.
pub fn generate_session_id(now: DateTime<Utc>) -> String {
    let random = uuid::Uuid::new_v4().simple().to_string();
    format!("sess_{}_{}", now.timestamp_millis(), &random[..9])
}

impl SessionContext {
    /// Start a fresh session at `now`.
    pub fn start(now: DateTime<Utc>) -> Self {
        Self {
            session_id: generate_session_id(now),
            started_at: now,
            last_activity: now,
            page_views: Vec::new(),
        }
    }

    /// Continue `previous` unless it is missing or expired, then mark
    /// activity at `now`.
    ///
    /// The returned flag is true when a new session was started.
    pub fn resume_or_start(
        previous: Option<SessionContext>,
        now: DateTime<Utc>,
        timeout: Duration,
    ) -> (Self, bool) {
        match previous {
            Some(mut ctx) if !is_expired(ctx.last_activity, now, timeout) => {
                ctx.touch(now);
                (ctx, false)
            }
            _ => {
                let ctx = Self::start(now);
                tracing::debug!(session_id = %ctx.session_id, "Started new session");
                (ctx, true)
            }
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity = now;
    }

    pub fn is_expired(&self, now: DateTime<Utc>, timeout: Duration) -> bool {
        is_expired(self.last_activity, now, timeout)
    }

    /// Record a view of `page` unless it repeats the last recorded page.
    ///
    /// Returns true when a view was appended.
    pub fn record_page_view(
        &mut self,
        page: &str,
        title: Option<&str>,
        now: DateTime<Utc>,
    ) -> bool {
        if self.last_page() == Some(page) {
            return false;
        }
        self.page_views.push(PageView {
            page: page.to_string(),
            title: title.map(str::to_string),
            timestamp: now,
        });
        true
    }

    pub fn last_page(&self) -> Option<&str> {
        self.page_views.last().map(|v| v.page.as_str())
    }

    /// Referrer to report for `current_page`.
    ///
    /// Before any page view it is the document referrer (or `direct`);
    /// afterwards it is the previous page, or `self` on a reload.
    pub fn referrer(&self, current_page: &str, document_referrer: Option<&str>) -> String {
        match self.last_page() {
            None => document_referrer
                .filter(|r| !r.is_empty())
                .unwrap_or(DIRECT_REFERRER)
                .to_string(),
            Some(previous) if previous != current_page => previous.to_string(),
            Some(_) => SELF_REFERRER.to_string(),
        }
    }

    /// Number of page views recorded so far.
    pub fn page_count(&self) -> usize {
        self.page_views.len()
    }
}
