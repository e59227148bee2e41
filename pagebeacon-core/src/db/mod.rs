//! Database layer for pagebeacon
//!
//! SQLite storage for normalized events:
//! - Schema migrations
//! - An [`EventSink`](crate::ingest::EventSink) implementation for the importer

pub mod repo;
pub mod schema;

pub use repo::{Database, SqliteSink};
