//! pagebeacon - analytics beacon log importer and reporter
//!
//! Reads beacon logs written by the collection endpoint, stores normalized
//! events, and prints sessions, reports, performance and alerts.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Database: $XDG_DATA_HOME/pagebeacon/events.db (~/.local/share/pagebeacon/events.db)
//! - Logs: $XDG_STATE_HOME/pagebeacon/pagebeacon.log (~/.local/state/pagebeacon/pagebeacon.log)
//! - Config: $XDG_CONFIG_HOME/pagebeacon/config.toml (~/.config/pagebeacon/config.toml)

mod render;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use pagebeacon_core::report::render_alerts;
use pagebeacon_core::{parse_event_time, Analysis, Config, Database, Importer, SqliteSink};

#[derive(Parser)]
#[command(name = "pagebeacon")]
#[command(about = "Import analytics beacon logs and report on them")]
#[command(version)]
struct Args {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Parse a log file and store every beacon in the event database
    Import {
        /// Beacon log file
        log: PathBuf,
    },
    /// Reconstruct sessions from a log file
    Sessions {
        /// Beacon log file
        log: PathBuf,
    },
    /// Overview tables and the daily report payload
    Report {
        /// Beacon log file
        log: PathBuf,

        /// Report time (RFC 3339); defaults to the current time
        #[arg(long, value_parser = parse_now)]
        now: Option<DateTime<Utc>>,
    },
    /// Load-time statistics per page
    Performance {
        /// Beacon log file
        log: PathBuf,
    },
    /// Compare the latest window against the one before and print alerts
    Alerts {
        /// Beacon log file
        log: PathBuf,

        /// End of the current window (RFC 3339); defaults to the current time
        #[arg(long, value_parser = parse_now)]
        now: Option<DateTime<Utc>>,
    },
}

fn parse_now(raw: &str) -> std::result::Result<DateTime<Utc>, String> {
    parse_event_time(raw).ok_or_else(|| format!("not a timestamp: {raw}"))
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Ensure XDG environment variables are set before using core library
    Config::ensure_xdg_env();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging
    let _log_guard =
        pagebeacon_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!("pagebeacon starting");

    match args.command {
        Command::Import { log } => run_import(&config, &log, args.format),
        Command::Sessions { log } => {
            let analysis = analyze(&config, &log, None)?;
            match args.format {
                OutputFormat::Text => render::sessions(&analysis.sessions),
                OutputFormat::Json => print_json(&analysis.sessions)?,
            }
            Ok(())
        }
        Command::Report { log, now } => {
            let analysis = analyze(&config, &log, now)?;
            let payload = analysis.daily.render(analysis.generated_at);
            match args.format {
                OutputFormat::Text => {
                    render::dashboard(&analysis);
                    render::payload(&payload);
                }
                OutputFormat::Json => print_json(&serde_json::json!({
                    "generated_at": analysis.generated_at,
                    "import": analysis.import,
                    "dashboard": analysis.dashboard,
                    "daily": analysis.daily,
                    "payload": payload,
                }))?,
            }
            Ok(())
        }
        Command::Performance { log } => {
            let analysis = analyze(&config, &log, None)?;
            match args.format {
                OutputFormat::Text => render::performance(&analysis),
                OutputFormat::Json => print_json(&serde_json::json!({
                    "performance": analysis.performance,
                    "page_loads": analysis.dashboard.page_loads,
                }))?,
            }
            Ok(())
        }
        Command::Alerts { log, now } => {
            let analysis = analyze(&config, &log, now)?;
            let payload = render_alerts(&analysis.alerts, analysis.generated_at);
            match args.format {
                OutputFormat::Text => {
                    render::comparison(&analysis.comparison);
                    match payload {
                        Some(payload) => render::payload(&payload),
                        None => println!("\nNo alerts triggered"),
                    }
                }
                OutputFormat::Json => print_json(&serde_json::json!({
                    "comparison": analysis.comparison,
                    "alerts": analysis.alerts,
                    "payload": payload,
                }))?,
            }
            Ok(())
        }
    }
}

/// Read a log file, replacing invalid UTF-8 so one bad byte only spoils its own line.
fn read_log(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(String::from_utf8(bytes).unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), "Log contains invalid UTF-8, decoding lossily");
        String::from_utf8_lossy(e.as_bytes()).into_owned()
    }))
}

fn analyze(config: &Config, log: &Path, now: Option<DateTime<Utc>>) -> Result<Analysis> {
    let text = read_log(log)?;
    let now = now.unwrap_or_else(Utc::now);
    tracing::info!(path = %log.display(), now = %now, "Analyzing log");
    Ok(Analysis::run(&text, config, now))
}

fn run_import(config: &Config, log: &Path, format: OutputFormat) -> Result<()> {
    let text = read_log(log)?;

    let db_path = Config::database_path();
    tracing::info!(path = %db_path.display(), "Opening database");
    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run database migrations")?;

    let pb = if format == OutputFormat::Text {
        ProgressBar::new(0)
    } else {
        ProgressBar::hidden()
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} lines")
            .context("invalid progress template")?
            .progress_chars("#>-"),
    );

    let mut sink = SqliteSink::new(&db);
    let report =
        Importer::new(&config.import).import_with_progress(&text, &mut sink, |done, total| {
            if done == 1 {
                pb.set_length(total as u64);
            }
            pb.set_position(done as u64);
        });
    pb.finish_and_clear();

    match format {
        OutputFormat::Text => {
            println!("Database: {}", db_path.display());
            render::import_report(&report);
        }
        OutputFormat::Json => print_json(&serde_json::json!({
            "database": db_path.display().to_string(),
            "report": report,
            "success_rate": report.success_rate(),
        }))?,
    }

    Ok(())
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
