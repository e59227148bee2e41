//! Integration tests for the pagebeacon ingestion pipeline
//!
//! These tests use `tests/fixtures/analytics.log` to verify the end-to-end
//! flow: import, storage, session reconstruction, aggregates and alerts.

use chrono::{DateTime, Duration, TimeZone, Utc};
use pagebeacon_core::alerts::{AlertKind, Severity};
use pagebeacon_core::analytics::WindowComparison;
use pagebeacon_core::config::AlertThresholds;
use pagebeacon_core::ingest::FailureReason;
use pagebeacon_core::report::render_alerts;
use pagebeacon_core::{
    alerts, Action, Analysis, Config, Database, ImportReport, Importer, SqliteSink,
};
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn fixture_log() -> String {
    std::fs::read_to_string(fixture_path("analytics.log")).unwrap()
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 10, 12, 0, 0).unwrap()
}

fn analysis() -> Analysis {
    pagebeacon_core::logging::init_test();
    Analysis::run(&fixture_log(), &Config::default(), now())
}

// ============================================
// Import
// ============================================

#[test]
fn test_import_report_counts() {
    let (events, report) = Importer::default().collect(&fixture_log());

    assert_eq!(report.total_lines, 16);
    assert_eq!(report.processed, 16);
    assert_eq!(report.successful, 14);
    assert_eq!(report.failed, 2);
    assert_eq!(events.len(), 14);

    let lines: Vec<usize> = report.errors.iter().map(|e| e.line_number).collect();
    assert_eq!(lines, vec![6, 9]);
    assert_eq!(
        report.errors[0].reason,
        FailureReason::Parse("malformed line: no JSON object found".to_string())
    );
    assert!(matches!(
        &report.errors[1].reason,
        FailureReason::Parse(message) if message.starts_with("invalid JSON")
    ));
}

#[test]
fn test_error_details_are_capped() {
    let text = "junk\n".repeat(15);
    let config = pagebeacon_core::config::ImportConfig {
        max_error_details: 10,
    };
    let report: ImportReport = Importer::new(&config).collect(&text).1;

    assert_eq!(report.failed, 15);
    assert_eq!(report.errors.len(), 10);
    assert_eq!(report.omitted_errors, 5);
    assert_eq!(report.success_rate(), 0.0);
}

#[test]
fn test_import_into_sqlite() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("nested/events.db");

    let db = Database::open(&db_path).unwrap();
    db.migrate().unwrap();

    let mut sink = SqliteSink::new(&db);
    let report = Importer::default().import(&fixture_log(), &mut sink);

    assert_eq!(report.successful, 14);
    assert_eq!(db.count_events().unwrap(), 14);
    assert!(db_path.exists());

    // What comes back out is exactly what the in-memory importer produced.
    let (expected, _) = Importer::default().collect(&fixture_log());
    assert_eq!(db.load_events().unwrap(), expected);
}

#[test]
fn test_reimport_appends() {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::open(&temp_dir.path().join("events.db")).unwrap();
    db.migrate().unwrap();

    for _ in 0..2 {
        let mut sink = SqliteSink::new(&db);
        Importer::default().import(&fixture_log(), &mut sink);
    }

    // Deduplication is the caller's job.
    assert_eq!(db.count_events().unwrap(), 28);
}

#[test]
fn test_fixture_event_fields() {
    let (events, _) = Importer::default().collect(&fixture_log());

    let first = &events[0];
    assert_eq!(first.log_timestamp.as_deref(), Some("2024-03-10 10:05:00"));
    assert_eq!(first.action, Some(Action::PageLoad));
    assert_eq!(first.screen_width, Some(1920));
    assert_eq!(first.page_load_time, Some(850.0));
    assert_eq!(first.previous_page.as_deref(), Some("direct"));

    let anonymous = events.last().unwrap();
    assert_eq!(anonymous.session_id, None);
    assert_eq!(anonymous.user_agent, None);
    assert_eq!(anonymous.screen_width, None);
}

// ============================================
// Sessions
// ============================================

#[test]
fn test_sessions_from_fixture() {
    let analysis = analysis();
    let sessions = &analysis.sessions;

    let ids: Vec<&str> = sessions.iter().map(|s| s.session_id.as_str()).collect();
    assert_eq!(ids, vec!["sess_a", "sess_b", "sess_c", "sess_d", "sess_e"]);

    let a = &sessions[0];
    assert_eq!(a.event_count, 4);
    assert_eq!(a.duration(), Some(Duration::seconds(91)));
    assert_eq!(a.flow(), "/ → /pricing");
    assert!(!a.is_bounce);

    let bounces: Vec<&str> = sessions
        .iter()
        .filter(|s| s.is_bounce)
        .map(|s| s.session_id.as_str())
        .collect();
    assert_eq!(bounces, vec!["sess_b", "sess_d"]);

    // One page for two minutes is engagement, not a bounce.
    assert!(!sessions[2].is_bounce);

    assert_eq!(
        sessions[4].action_flow(),
        "PAGE_LOAD → CUSTOM_EVENT → FORM_SUBMIT"
    );
}

// ============================================
// Aggregates
// ============================================

#[test]
fn test_dashboard_from_fixture() {
    let analysis = analysis();
    let d = &analysis.dashboard;

    assert_eq!(d.totals.total_events, 14);
    assert_eq!(d.totals.distinct_sessions, 5);
    assert_eq!(d.totals.distinct_days, 1);
    assert_eq!(d.totals.error_events, 1);
    assert_eq!(d.session_count, 5);
    assert_eq!(d.bounce_rate, 40.0);
    assert!((d.avg_session_duration - 69.2).abs() < 1e-9);

    assert_eq!(d.top_page(), Some("/"));
    assert_eq!(d.top_browser(), Some("Chrome"));
    assert_eq!(d.actions[0].label, "PAGE_LOAD");
    assert_eq!(d.actions[0].count, 7);

    let devices: Vec<(&str, usize)> = d
        .devices
        .iter()
        .map(|r| (r.label.as_str(), r.sessions))
        .collect();
    assert_eq!(devices, vec![("Desktop", 3), ("Mobile", 2)]);

    assert_eq!(d.resolutions[0].label, "1920x1080");
    assert_eq!(d.resolutions[0].sessions, 2);
}

#[test]
fn test_performance_from_fixture() {
    let analysis = analysis();
    let perf = &analysis.performance;

    let overall = perf.overall.unwrap();
    assert_eq!(overall.count, 3);
    assert_eq!(overall.mean, 1450.0);
    assert_eq!(overall.median, 1200.0);
    assert_eq!(overall.min, 850.0);
    assert_eq!(overall.max, 2300.0);

    let home = &perf.by_location[0];
    assert_eq!(home.location, "/");
    assert_eq!(home.load_time.mean, 1575.0);
    assert_eq!(home.avg_dom_ready_time, Some(760.0));
    assert_eq!(home.avg_first_contentful_paint, Some(310.0));

    let pricing = &perf.by_location[1];
    assert_eq!(pricing.avg_first_contentful_paint, None);

    let starts: Vec<f64> = perf
        .load_time_distribution
        .buckets
        .iter()
        .map(|b| b.start)
        .collect();
    assert_eq!(starts, vec![800.0, 1200.0, 2300.0]);
}

// ============================================
// Windows and alerts
// ============================================

#[test]
fn test_alerts_from_fixture() {
    let analysis = analysis();
    let cmp = &analysis.comparison;

    assert_eq!(cmp.current.session_count, 3);
    assert_eq!(cmp.previous.session_count, 2);
    assert_eq!(cmp.current.error_count, 1);
    assert_eq!(cmp.session_growth(), Some(50.0));

    // 50% growth is not above the spike threshold; 1 error in 3 sessions is.
    assert_eq!(analysis.alerts.len(), 1);
    assert_eq!(analysis.alerts[0].kind, AlertKind::HighErrorRate);
    assert_eq!(analysis.alerts[0].severity, Severity::Error);
    assert_eq!(
        analysis.alerts[0].message,
        "High error rate: 33.3% of sessions had errors"
    );

    let payload = render_alerts(&analysis.alerts, analysis.generated_at).unwrap();
    assert_eq!(payload.subject, "Analytics Alerts - 12:00");
}

#[test]
fn test_lower_spike_threshold_fires() {
    let (events, _) = Importer::default().collect(&fixture_log());
    let cmp = WindowComparison::compute(&events, now(), Duration::hours(1));
    let thresholds = AlertThresholds {
        traffic_spike_pct: 25.0,
        ..AlertThresholds::default()
    };

    let kinds: Vec<AlertKind> = alerts::evaluate(&cmp, &thresholds)
        .into_iter()
        .map(|a| a.kind)
        .collect();
    assert_eq!(kinds, vec![AlertKind::TrafficSpike, AlertKind::HighErrorRate]);
}

#[test]
fn test_quiet_hour_has_no_alerts() {
    let (events, _) = Importer::default().collect(&fixture_log());
    let later = now() + Duration::hours(5);
    let cmp = WindowComparison::compute(&events, later, Duration::hours(1));

    assert_eq!(cmp.current.session_count, 0);
    assert!(alerts::evaluate(&cmp, &AlertThresholds::default()).is_empty());
}

// ============================================
// Reports
// ============================================

#[test]
fn test_daily_report_from_fixture() {
    let analysis = analysis();
    let payload = analysis.daily.render(analysis.generated_at);

    assert_eq!(payload.subject, "Daily Analytics Report - 2024-03-10");
    assert!(payload.body.contains("- Total Sessions: 5"));
    assert!(payload.body.contains("- Avg. Session Duration: 69 seconds"));
    assert!(payload.body.contains("- Bounce Rate: 40%"));
    assert!(payload.body.contains("- Top Page: /"));
    assert!(payload.body.contains("- Most Used Browser: Chrome"));
}

#[test]
fn test_pipeline_is_idempotent() {
    let first = analysis();
    let second = analysis();
    assert_eq!(first, second);
}
