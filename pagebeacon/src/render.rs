//! Plain-text rendering for the CLI.

use pagebeacon_core::analytics::{BreakdownRow, CountRow, NumericSummary, WindowComparison};
use pagebeacon_core::format::{
    format_count, format_duration_secs, format_ms, format_one_decimal, format_percent,
};
use pagebeacon_core::report::ReportPayload;
use pagebeacon_core::{Analysis, ImportReport, Session};

/// Rows shown per breakdown table.
const TOP_ROWS: usize = 10;

pub fn import_report(report: &ImportReport) {
    println!("Import complete:");
    println!("  Total lines: {}", format_count(report.total_lines));
    println!("  Processed:   {}", format_count(report.processed));
    println!("  Successful:  {}", format_count(report.successful));
    println!("  Failed:      {}", format_count(report.failed));
    println!("  Success rate: {}", format_percent(report.success_rate()));

    if !report.errors.is_empty() {
        println!("\nErrors:");
        for failure in &report.errors {
            println!("  {}", failure);
        }
        if report.omitted_errors > 0 {
            println!("  ... and {} more", report.omitted_errors);
        }
    }
}

pub fn sessions(sessions: &[Session]) {
    if sessions.is_empty() {
        println!("No sessions found.");
        return;
    }

    println!(
        "{:<32} {:<19} {:>9} {:>6} {:>6} {:<6} Flow",
        "Session", "Start", "Duration", "Pages", "Events", "Bounce"
    );
    for s in sessions {
        println!(
            "{:<32} {:<19} {:>9} {:>6} {:>6} {:<6} {}",
            s.session_id,
            s.start
                .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string()),
            format_duration_secs(s.duration_secs()),
            s.distinct_pages(),
            s.event_count,
            if s.is_bounce { "yes" } else { "no" },
            s.flow()
        );
    }

    let bounces = sessions.iter().filter(|s| s.is_bounce).count();
    println!(
        "\n{} session(s), {} bounce(s)",
        format_count(sessions.len()),
        format_count(bounces)
    );
}

pub fn dashboard(analysis: &Analysis) {
    let d = &analysis.dashboard;
    println!(
        "Overview (generated {})",
        analysis.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("  Events:       {}", format_count(d.totals.total_events));
    println!("  Sessions:     {}", format_count(d.session_count));
    println!("  Pages:        {}", format_count(d.totals.distinct_pages));
    println!("  Days:         {}", format_count(d.totals.distinct_days));
    println!("  Error events: {}", format_count(d.totals.error_events));
    println!("  Bounce rate:  {}", format_percent(d.bounce_rate));
    println!("  Avg duration: {}", format_duration_secs(d.avg_session_duration));

    count_table("Top pages", &d.top_pages);
    count_table("Actions", &d.actions);

    if !d.hourly_sessions.is_empty() {
        println!("\nSessions by hour (UTC)");
        for row in &d.hourly_sessions {
            println!("  {:02}:00  {}", row.hour, format_count(row.sessions));
        }
    }

    if !d.daily_activity.is_empty() {
        println!("\nDaily activity");
        for row in &d.daily_activity {
            println!(
                "  {}  events {:>6}  sessions {:>5}",
                row.date,
                format_count(row.events),
                format_count(row.sessions)
            );
        }
    }

    breakdown_table("Devices", &d.devices);
    breakdown_table("Browsers", &d.browsers);
    breakdown_table("Screen resolutions", &d.resolutions);
    breakdown_table("Language / timezone", &d.locales);
}

pub fn performance(analysis: &Analysis) {
    let perf = &analysis.performance;
    let Some(overall) = &perf.overall else {
        println!("No performance samples.");
        return;
    };

    println!("Load time (all pages)");
    summary_line(overall);

    println!("\nBy page (slowest first)");
    for row in perf.by_location.iter().take(TOP_ROWS) {
        println!(
            "  {:<30} samples {:>5}  avg {:>8}  median {:>8}  dom {:>8}  fcp {:>8}",
            row.location,
            row.load_time.count,
            format_ms(Some(row.load_time.mean)),
            format_ms(Some(row.load_time.median)),
            format_ms(row.avg_dom_ready_time),
            format_ms(row.avg_first_contentful_paint)
        );
    }

    let histogram = &perf.load_time_distribution;
    println!(
        "\nDistribution ({}ms buckets)",
        format_one_decimal(histogram.bucket_width)
    );
    let widest = histogram
        .buckets
        .iter()
        .map(|b| b.count)
        .max()
        .unwrap_or(1)
        .max(1);
    for bucket in &histogram.buckets {
        let bar = "#".repeat((bucket.count * 40 + widest - 1) / widest);
        println!(
            "  {:>8}  {:>5}  {}",
            format_ms(Some(bucket.start)),
            bucket.count,
            bar
        );
    }

    let page_loads = &analysis.dashboard.page_loads;
    if !page_loads.is_empty() {
        println!("\nPage loads");
        for row in page_loads.iter().take(TOP_ROWS) {
            println!(
                "  {:<30} {:<24} loads {:>5}  avg {:>8}",
                row.location,
                row.page_title.as_deref().unwrap_or("-"),
                row.loads,
                format_ms(row.avg_load_time)
            );
        }
    }
}

pub fn comparison(comparison: &WindowComparison) {
    let fmt = "%Y-%m-%d %H:%M:%S";
    for (label, window) in [
        ("Current ", &comparison.current),
        ("Previous", &comparison.previous),
    ] {
        println!(
            "{} {} .. {}  sessions {:>5}  errors {:>5}",
            label,
            window.start.format(fmt),
            window.end.format(fmt),
            window.session_count,
            window.error_count
        );
    }
    match comparison.session_growth() {
        Some(growth) => println!("Growth: {}", format_percent(growth)),
        None => println!("Growth: n/a (no sessions in previous window)"),
    }
}

pub fn payload(payload: &ReportPayload) {
    println!("\nSubject: {}\n", payload.subject);
    println!("{}", payload.body);
}

fn summary_line(s: &NumericSummary) {
    println!(
        "  samples {}  mean {}  median {}  min {}  max {}",
        format_count(s.count),
        format_ms(Some(s.mean)),
        format_ms(Some(s.median)),
        format_ms(Some(s.min)),
        format_ms(Some(s.max))
    );
}

fn count_table(title: &str, rows: &[CountRow]) {
    if rows.is_empty() {
        return;
    }
    println!("\n{}", title);
    for row in rows.iter().take(TOP_ROWS) {
        println!("  {:<40} {:>7}", row.label, format_count(row.count));
    }
}

fn breakdown_table(title: &str, rows: &[BreakdownRow]) {
    if rows.is_empty() {
        return;
    }
    println!("\n{}", title);
    for row in rows.iter().take(TOP_ROWS) {
        println!(
            "  {:<28} sessions {:>6}  events {:>7}  avg load {:>8}",
            row.label,
            format_count(row.sessions),
            format_count(row.events),
            format_ms(row.avg_load_time)
        );
    }
}
