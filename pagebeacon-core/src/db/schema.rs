//! Database schema and migrations
//!
//! Uses SQLite with embedded migrations managed via PRAGMA user_version.

use rusqlite::Connection;

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// SQL migrations, indexed by version number
const MIGRATIONS: &[&str] = &[
    // Version 1: one row per normalized beacon
    r#"
    CREATE TABLE IF NOT EXISTS analytics_events (
        id                     INTEGER PRIMARY KEY AUTOINCREMENT,
        log_timestamp          TEXT,
        action                 TEXT,
        app_id                 TEXT,
        event_timestamp        TEXT,
        location               TEXT,
        user_agent             TEXT,
        screen_width           INTEGER,
        screen_height          INTEGER,
        page_title             TEXT,
        session_id             TEXT,
        session_start          TEXT,
        referrer               TEXT,
        page_load_time         REAL,
        language               TEXT,
        timezone               TEXT,
        load_time              REAL,
        dom_ready_time         REAL,
        first_paint            REAL,
        first_contentful_paint REAL,
        session_pages          INTEGER,
        previous_page          TEXT,
        imported_at            DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
    );
    "#,
    // Version 2: lookup indexes for session and time queries
    r#"
    CREATE INDEX IF NOT EXISTS idx_analytics_events_session ON analytics_events(session_id);
    CREATE INDEX IF NOT EXISTS idx_analytics_events_ts ON analytics_events(event_timestamp);
    CREATE INDEX IF NOT EXISTS idx_analytics_events_action ON analytics_events(action);
    "#,
];

/// Run all pending migrations
pub fn run_migrations(conn: &Connection) -> crate::error::Result<()> {
    let current_version = get_schema_version(conn)?;

    tracing::debug!(
        current_version,
        target_version = SCHEMA_VERSION,
        "Checking database migrations"
    );

    for (i, migration) in MIGRATIONS.iter().enumerate() {
        let version = (i + 1) as i32;
        if version > current_version {
            tracing::info!(version, "Running migration");
            conn.execute_batch(migration)?;
            conn.pragma_update(None, "user_version", version)?;
        }
    }

    if current_version < SCHEMA_VERSION {
        tracing::info!(
            from = current_version,
            to = SCHEMA_VERSION,
            "Migrations complete"
        );
    }

    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> crate::error::Result<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |r| r.get(0))?;
    Ok(version)
}
