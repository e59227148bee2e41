//! # pagebeacon-core
//!
//! Core library for pagebeacon - an analytics beacon ingestion pipeline.
//!
//! This library provides:
//! - A tolerant line parser and event normalizer for beacon logs
//! - Session reconstruction with bounce detection
//! - Aggregates, breakdowns and performance statistics
//! - Window comparison and alert evaluation
//! - Report payload rendering
//! - SQLite event storage, configuration and logging
//! - The emitter-side beacon model and HTTP delivery
//!
//! ## Architecture
//!
//! Every read-side stage is a pure function over its input:
//!
//! ```text
//! raw log text → Line Parser → Normalizer → Session Reconstructor → Aggregator → Alert Evaluator
//! ```
//!
//! Malformed lines are counted and skipped, never fatal. Sessions are rebuilt
//! from the full event set on every run.
//!
//! ## Example
//!
//! ```rust
//! use pagebeacon_core::{Analysis, Config};
//! use chrono::{TimeZone, Utc};
//!
//! let log = "[2024-01-01 10:00:00] {\"action\":\"PAGE_LOAD\",\"sessionId\":\"s1\",\
//!            \"timestamp\":\"2024-01-01T10:00:00Z\",\"location\":\"/\"}\n";
//! let now = Utc.with_ymd_and_hms(2024, 1, 1, 11, 0, 0).unwrap();
//!
//! let analysis = Analysis::run(log, &Config::default(), now);
//! assert_eq!(analysis.sessions.len(), 1);
//! assert!(analysis.sessions[0].is_bounce);
//! ```

// Re-export commonly used items at the crate root
pub use alerts::{Alert, AlertKind, Severity};
pub use config::Config;
pub use db::{Database, SqliteSink};
pub use error::{Error, LineError, Result};
pub use ingest::{EventSink, ImportReport, Importer, VecSink};
pub use pipeline::Analysis;
pub use sessions::{Session, SessionReconstructor};
pub use types::*;

// Public modules
pub mod alerts;
pub mod analytics;
pub mod config;
pub mod db;
pub mod error;
pub mod format;
pub mod ingest;
pub mod logging;
pub mod pipeline;
pub mod report;
pub mod sessions;
pub mod tracker;
pub mod types;
