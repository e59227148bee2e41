//! Raw log line parsing
//!
//! The collection endpoint appends one line per beacon:
//!
//! ```text
//! [2024-01-01 10:00:00] {"action":"PAGE_LOAD","appId":"x",...}
//! ```
//!
//! ## Known limitation
//!
//! The payload is taken to be everything from the FIRST `{` to the LAST `}`
//! on the line. Nested objects inside the payload are fine, but a line whose
//! trailing non-JSON text contains `}` yields a span that fails to decode
//! and is reported as [`LineError::InvalidJson`]. Lines accepted today must
//! keep being accepted, so the rule is left as is.

use crate::error::LineError;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// A log line split into its prefix and decoded payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedLine {
    /// Verbatim text inside the first `[...]` on the line
    pub log_timestamp: Option<String>,
    /// The embedded JSON object
    pub payload: Map<String, Value>,
}

/// Split one raw line into `(log_timestamp, payload)`.
pub fn parse_line(line: &str) -> Result<ParsedLine, LineError> {
    let (start, end) = match (line.find('{'), line.rfind('}')) {
        (Some(start), Some(end)) if end > start => (start, end),
        _ => return Err(LineError::MalformedLine),
    };

    // The span is brace-delimited, so valid JSON here is always an object.
    let payload: Map<String, Value> =
        serde_json::from_str(&line[start..=end]).map_err(|e| LineError::InvalidJson {
            message: e.to_string(),
        })?;

    Ok(ParsedLine {
        log_timestamp: extract_log_timestamp(line).map(str::to_string),
        payload,
    })
}

/// First non-empty `[...]` span on the line, without the brackets.
fn extract_log_timestamp(line: &str) -> Option<&str> {
    let mut search_from = 0;
    while let Some(offset) = line[search_from..].find('[') {
        let open = search_from + offset;
        let rest = &line[open + 1..];
        let close = rest.find(']')?;
        if close > 0 {
            return Some(&rest[..close]);
        }
        search_from = open + 1;
    }
    None
}

/// Render a received beacon as a log line, the inverse of [`parse_line`].
///
/// This is the format the collection endpoint appends to its log file.
pub fn format_log_line(received_at: DateTime<Utc>, payload: &Value) -> String {
    format!("[{}] {}", received_at.format("%Y-%m-%d %H:%M:%S"), payload)
}
