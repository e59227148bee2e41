//! The whole read side in one call: log text in, every derived view out.
//!
//! ```text
//! raw text ─► Importer ─► events ─► SessionReconstructor ─► sessions
//!                           │                                   │
//!                           └──────────► aggregates ◄───────────┘
//!                                           │
//!                                     alert evaluation
//! ```
//!
//! `now` is an input, so two runs over the same text and instant produce
//! equal results.

use crate::alerts::{self, Alert};
use crate::analytics::{Dashboard, PerformanceReport, WindowComparison};
use crate::config::Config;
use crate::ingest::{ImportReport, Importer};
use crate::report::DailyReport;
use crate::sessions::{Session, SessionReconstructor};
use crate::types::NormalizedEvent;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Everything derived from one log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    pub generated_at: DateTime<Utc>,
    pub import: ImportReport,
    #[serde(skip)]
    pub events: Vec<NormalizedEvent>,
    pub sessions: Vec<Session>,
    pub dashboard: Dashboard,
    pub performance: PerformanceReport,
    pub daily: DailyReport,
    pub comparison: WindowComparison,
    pub alerts: Vec<Alert>,
}

impl Analysis {
    pub fn run(text: &str, config: &Config, now: DateTime<Utc>) -> Self {
        let (events, import) = Importer::new(&config.import).collect(text);
        Self::from_events(events, import, config, now)
    }

    /// Derive every view from already-normalized events.
    pub fn from_events(
        events: Vec<NormalizedEvent>,
        import: ImportReport,
        config: &Config,
        now: DateTime<Utc>,
    ) -> Self {
        let sessions = SessionReconstructor::new(&config.sessions).reconstruct(&events);
        let dashboard = Dashboard::compute(&events, &sessions);
        let performance =
            PerformanceReport::compute(&events, config.aggregation.histogram_bucket_width_ms);
        let daily = DailyReport::compute(&events, &sessions);
        let comparison =
            WindowComparison::compute(&events, now, config.aggregation.comparison_window());
        let alerts = alerts::evaluate(&comparison, &config.alerts);

        tracing::info!(
            events = events.len(),
            sessions = sessions.len(),
            alerts = alerts.len(),
            "Analysis complete"
        );

        Self {
            generated_at: now,
            import,
            events,
            sessions,
            dashboard,
            performance,
            daily,
            comparison,
            alerts,
        }
    }
}
