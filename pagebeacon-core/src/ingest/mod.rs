//! Ingestion layer for beacon log files
//!
//! Turns raw log text into [`NormalizedEvent`]s and hands each one to an
//! [`EventSink`].
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────┐     ┌─────────────┐     ┌───────────┐
//! │  analytics.log  │ ──► │  parse_line  │ ──► │  normalize  │ ──► │ EventSink │
//! │  (raw lines)    │     │  (line.rs)   │     │             │     │           │
//! └─────────────────┘     └──────────────┘     └─────────────┘     └───────────┘
//!                                │                                       │
//!                                └──────────► ImportReport ◄─────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Nothing in a batch is fatal. Unparseable lines and sink failures are
//! recorded in the [`ImportReport`] with their 1-based line number and the
//! importer moves on to the next line. Blank lines are skipped without being
//! counted.
//!
//! ## Usage
//!
//! ```rust
//! use pagebeacon_core::ingest::{Importer, VecSink};
//!
//! let text = "[2024-01-01 10:00:00] {\"action\":\"PAGE_LOAD\"}\nnot a beacon\n";
//! let mut sink = VecSink::default();
//! let report = Importer::default().import(text, &mut sink);
//!
//! assert_eq!(report.successful, 1);
//! assert_eq!(report.failed, 1);
//! assert_eq!(sink.events.len(), 1);
//! ```

pub mod line;
pub mod normalize;

pub use line::{format_log_line, parse_line, ParsedLine};
pub use normalize::normalize;

use crate::config::ImportConfig;
use crate::error::{LineError, Result};
use crate::types::NormalizedEvent;
use serde::Serialize;

/// Destination for normalized events.
///
/// The sink owns persistence and identity; the importer only reports what
/// the sink said for each record.
pub trait EventSink {
    /// Persist one event.
    fn store(&mut self, event: &NormalizedEvent) -> Result<()>;
}

/// Sink that keeps events in memory, in input order.
#[derive(Debug, Default)]
pub struct VecSink {
    pub events: Vec<NormalizedEvent>,
}

impl EventSink for VecSink {
    fn store(&mut self, event: &NormalizedEvent) -> Result<()> {
        self.events.push(event.clone());
        Ok(())
    }
}

/// Parse and normalize a single line.
pub fn normalize_line(line: &str) -> std::result::Result<NormalizedEvent, LineError> {
    let parsed = parse_line(line)?;
    Ok(normalize(&parsed.payload, parsed.log_timestamp))
}

/// Why a line did not make it into the sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "message", rename_all = "snake_case")]
pub enum FailureReason {
    /// The line could not be parsed
    Parse(String),
    /// The sink rejected the record
    Storage(String),
}

/// A per-line failure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineFailure {
    /// 1-based line number in the input text
    pub line_number: usize,
    pub reason: FailureReason,
}

impl std::fmt::Display for LineFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.reason {
            FailureReason::Parse(message) => write!(f, "Line {}: {}", self.line_number, message),
            FailureReason::Storage(message) => write!(
                f,
                "Line {}: failed to store event: {}",
                self.line_number, message
            ),
        }
    }
}

/// Outcome of importing a batch of lines.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ImportReport {
    /// Non-blank lines in the input
    pub total_lines: usize,
    /// Lines the importer looked at
    pub processed: usize,
    /// Lines stored by the sink
    pub successful: usize,
    /// Lines that failed to parse or store
    pub failed: usize,
    /// First failures, up to the configured cap
    pub errors: Vec<LineFailure>,
    /// Failures beyond the cap (counted, not kept)
    pub omitted_errors: usize,
}

impl ImportReport {
    /// Percentage of non-blank lines that were stored.
    pub fn success_rate(&self) -> f64 {
        if self.total_lines == 0 {
            return 0.0;
        }
        self.successful as f64 / self.total_lines as f64 * 100.0
    }

    fn record_failure(&mut self, failure: LineFailure, cap: usize) {
        self.failed += 1;
        if self.errors.len() < cap {
            self.errors.push(failure);
        } else {
            self.omitted_errors += 1;
        }
    }
}

/// Batch importer.
#[derive(Debug, Clone)]
pub struct Importer {
    max_error_details: usize,
}

impl Default for Importer {
    fn default() -> Self {
        Self::new(&ImportConfig::default())
    }
}

impl Importer {
    pub fn new(config: &ImportConfig) -> Self {
        Self {
            max_error_details: config.max_error_details,
        }
    }

    /// Import every line of `text` into `sink`.
    pub fn import<S: EventSink + ?Sized>(&self, text: &str, sink: &mut S) -> ImportReport {
        self.import_with_progress(text, sink, |_, _| {})
    }

    /// Import with a progress callback.
    ///
    /// The callback receives `(lines_done, total_lines)` after each non-blank
    /// line.
    pub fn import_with_progress<S, F>(&self, text: &str, sink: &mut S, mut on_progress: F) -> ImportReport
    where
        S: EventSink + ?Sized,
        F: FnMut(usize, usize),
    {
        let total_lines = text.lines().filter(|l| !l.trim().is_empty()).count();
        let mut report = ImportReport {
            total_lines,
            ..Default::default()
        };

        for (index, raw) in text.lines().enumerate() {
            if raw.trim().is_empty() {
                continue;
            }
            let line_number = index + 1;
            report.processed += 1;

            match normalize_line(raw) {
                Ok(event) => match sink.store(&event) {
                    Ok(()) => report.successful += 1,
                    Err(e) => {
                        tracing::warn!(line = line_number, error = %e, "Failed to store event");
                        report.record_failure(
                            LineFailure {
                                line_number,
                                reason: FailureReason::Storage(e.to_string()),
                            },
                            self.max_error_details,
                        );
                    }
                },
                Err(e) => {
                    tracing::warn!(line = line_number, error = %e, "Skipping log line");
                    report.record_failure(
                        LineFailure {
                            line_number,
                            reason: FailureReason::Parse(e.to_string()),
                        },
                        self.max_error_details,
                    );
                }
            }

            on_progress(report.processed, total_lines);
        }

        tracing::info!(
            total = report.total_lines,
            successful = report.successful,
            failed = report.failed,
            "Import complete"
        );

        report
    }

    /// Parse `text` into memory, returning the events alongside the report.
    pub fn collect(&self, text: &str) -> (Vec<NormalizedEvent>, ImportReport) {
        let mut sink = VecSink::default();
        let report = self.import(text, &mut sink);
        (sink.events, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::types::Action;

    struct FlakySink {
        fail_on_call: usize,
        calls: usize,
        stored: Vec<NormalizedEvent>,
    }

    impl EventSink for FlakySink {
        fn store(&mut self, event: &NormalizedEvent) -> Result<()> {
            self.calls += 1;
            if self.calls == self.fail_on_call {
                return Err(Error::Config("disk full".to_string()));
            }
            self.stored.push(event.clone());
            Ok(())
        }
    }

    #[test]
    fn test_import_counts_and_line_numbers() {
        let text = concat!(
            "[2024-01-01 10:00:00] {\"action\":\"PAGE_LOAD\",\"sessionId\":\"A\"}\n",
            "\n",
            "garbage without braces\n",
            "[2024-01-01 10:00:05] {broken json}\n",
            "[2024-01-01 10:00:09] {\"action\":\"PERFORMANCE\",\"loadTime\":0}\n",
        );

        let (events, report) = Importer::default().collect(text);

        assert_eq!(report.total_lines, 4);
        assert_eq!(report.processed, 4);
        assert_eq!(report.successful, 2);
        assert_eq!(report.failed, 2);
        assert_eq!(report.errors[0].line_number, 3);
        assert_eq!(report.errors[1].line_number, 4);
        assert_eq!(
            report.errors[0].to_string(),
            "Line 3: malformed line: no JSON object found"
        );
        assert!(report.errors[1].to_string().starts_with("Line 4: invalid JSON"));
        assert_eq!(report.success_rate(), 50.0);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].action, Some(Action::PageLoad));
        assert_eq!(events[1].load_time, Some(0.0));
    }

    #[test]
    fn test_error_details_are_capped() {
        let text = "bad\n".repeat(15);
        let importer = Importer::new(&ImportConfig {
            max_error_details: 10,
        });
        let (_, report) = importer.collect(&text);

        assert_eq!(report.failed, 15);
        assert_eq!(report.errors.len(), 10);
        assert_eq!(report.omitted_errors, 5);
        assert_eq!(report.errors[9].line_number, 10);
    }

    #[test]
    fn test_storage_failure_does_not_block_later_lines() {
        let text = "{\"action\":\"A\"}\n{\"action\":\"B\"}\n{\"action\":\"C\"}\n";
        let mut sink = FlakySink {
            fail_on_call: 2,
            calls: 0,
            stored: Vec::new(),
        };

        let report = Importer::default().import(text, &mut sink);

        assert_eq!(report.successful, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.errors[0].line_number, 2);
        assert!(matches!(report.errors[0].reason, FailureReason::Storage(_)));
        assert_eq!(sink.stored.len(), 2);
    }

    #[test]
    fn test_progress_callback() {
        let text = "{\"action\":\"A\"}\n\n{\"action\":\"B\"}\n";
        let mut seen = Vec::new();
        Importer::default().import_with_progress(text, &mut VecSink::default(), |done, total| {
            seen.push((done, total))
        });
        assert_eq!(seen, vec![(1, 2), (2, 2)]);
    }

    #[test]
    fn test_empty_input() {
        let (events, report) = Importer::default().collect("");
        assert!(events.is_empty());
        assert_eq!(report, ImportReport::default());
        assert_eq!(report.success_rate(), 0.0);
    }
}
