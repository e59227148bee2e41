//! Beacon emitter model
//!
//! The sending side of the pipeline: session bookkeeping, payload
//! construction and HTTP delivery. What this module emits is exactly what
//! [`crate::ingest`] reads back once the collection endpoint has written it
//! to the log with [`crate::ingest::format_log_line`].
//!
//! ```text
//! SessionContext ──► Beacon ──► BeaconSender ──► endpoint ──► analytics.log
//! ```

mod beacon;
mod context;
mod delivery;

pub use beacon::{Beacon, PageEnvironment, PerformanceTiming};
pub use context::{
    generate_session_id, is_expired, PageView, SessionContext, DIRECT_REFERRER, SELF_REFERRER,
};
pub use delivery::{BeaconSender, DeliveryOutcome, DEFAULT_TIMEOUT};
