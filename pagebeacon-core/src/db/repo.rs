//! Event storage
//!
//! [`Database`] wraps one SQLite connection. [`SqliteSink`] adapts it to
//! the importer's [`EventSink`] so each normalized event becomes one row;
//! SQLite's rowid is the event's identity.

use crate::error::Result;
use crate::ingest::EventSink;
use crate::types::{Action, NormalizedEvent};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

const EVENT_COLUMNS: &str = "log_timestamp, action, app_id, event_timestamp, location, \
     user_agent, screen_width, screen_height, page_title, session_id, session_start, \
     referrer, page_load_time, language, timezone, load_time, dom_ready_time, first_paint, \
     first_contentful_paint, session_pages, previous_page";

/// SQLite-backed event store.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run migrations on this database
    pub fn migrate(&self) -> Result<()> {
        super::schema::run_migrations(&self.connection())
    }

    /// Get the underlying connection (for advanced use)
    pub fn connection(&self) -> MutexGuard<'_, Connection> {
        // A panic while holding the lock cannot leave a half-written row
        // behind: every write is a single statement.
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert one event, returning its row id.
    pub fn insert_event(&self, event: &NormalizedEvent) -> Result<i64> {
        let conn = self.connection();
        conn.execute(
            &format!(
                "INSERT INTO analytics_events ({}) VALUES \
                 (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)",
                EVENT_COLUMNS
            ),
            params![
                event.log_timestamp,
                event.action.as_ref().map(Action::as_str),
                event.app_id,
                event.event_timestamp,
                event.location,
                event.user_agent,
                event.screen_width,
                event.screen_height,
                event.page_title,
                event.session_id,
                event.session_start,
                event.referrer,
                event.page_load_time,
                event.language,
                event.timezone,
                event.load_time,
                event.dom_ready_time,
                event.first_paint,
                event.first_contentful_paint,
                event.session_pages,
                event.previous_page,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// All stored events in insertion order.
    pub fn load_events(&self) -> Result<Vec<NormalizedEvent>> {
        let conn = self.connection();
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM analytics_events ORDER BY id ASC",
            EVENT_COLUMNS
        ))?;

        let events = stmt
            .query_map([], |row| Self::row_to_event(row))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(events)
    }

    pub fn count_events(&self) -> Result<i64> {
        let conn = self.connection();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM analytics_events", [], |r| r.get(0))?;
        Ok(count)
    }

    fn row_to_event(row: &Row<'_>) -> rusqlite::Result<NormalizedEvent> {
        Ok(NormalizedEvent {
            log_timestamp: row.get(0)?,
            action: row.get::<_, Option<String>>(1)?.map(Action::from),
            app_id: row.get(2)?,
            event_timestamp: row.get(3)?,
            location: row.get(4)?,
            user_agent: row.get(5)?,
            screen_width: row.get(6)?,
            screen_height: row.get(7)?,
            page_title: row.get(8)?,
            session_id: row.get(9)?,
            session_start: row.get(10)?,
            referrer: row.get(11)?,
            page_load_time: row.get(12)?,
            language: row.get(13)?,
            timezone: row.get(14)?,
            load_time: row.get(15)?,
            dom_ready_time: row.get(16)?,
            first_paint: row.get(17)?,
            first_contentful_paint: row.get(18)?,
            session_pages: row.get(19)?,
            previous_page: row.get(20)?,
        })
    }
}

/// [`EventSink`] that writes every event to a [`Database`].
pub struct SqliteSink<'a> {
    db: &'a Database,
    stored: usize,
}

impl<'a> SqliteSink<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db, stored: 0 }
    }

    /// Events written through this sink.
    pub fn stored(&self) -> usize {
        self.stored
    }
}

impl EventSink for SqliteSink<'_> {
    fn store(&mut self, event: &NormalizedEvent) -> Result<()> {
        self.db.insert_event(event)?;
        self.stored += 1;
        Ok(())
    }
}
