use anyhow::{Context, Result};
use rusqlite::Connection;
use std::path::Path;
use tracing::debug;

const SQLITE_URL_PREFIX: &str = "sqlite:///";
const IN_MEMORY: &str = ":memory:";

/// Row counts per table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TableCounts {
    pub activities: i64,
    pub campers: i64,
    pub signups: i64,
}

/// Resolve a database URL to something `Connection::open` understands.
/// Accepts `sqlite:///relative.db`, `sqlite:////abs/path.db`, `sqlite://`,
/// `:memory:` or a bare path.
pub fn database_path(url: &str) -> &str {
    if url == "sqlite://" {
        return IN_MEMORY;
    }
    url.strip_prefix(SQLITE_URL_PREFIX).unwrap_or(url)
}

/// Open (creating if needed) and prepare the camp database.
pub fn open_database(url: &str) -> Result<Connection> {
    let path = database_path(url);

    let conn = if path == IN_MEMORY {
        Connection::open_in_memory().context("Failed to open in-memory database")?
    } else {
        Connection::open(Path::new(path))
            .with_context(|| format!("Failed to open database: {}", path))?
    };

    setup_database(&conn)?;
    debug!(path, "database ready");

    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Referential integrity is off by default in SQLite
    conn.pragma_update(None, "foreign_keys", "ON")?;

    // WAL only applies to file databases; in-memory stays "memory"
    if conn.path().map(|p| !p.is_empty()).unwrap_or(false) {
        conn.pragma_update(None, "journal_mode", "WAL")?;
    }

    // ==========================================================================
    // Tables
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS activities (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT,
            difficulty INTEGER
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS campers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            age INTEGER
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS signups (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            time INTEGER,
            camper_id INTEGER NOT NULL
                REFERENCES campers(id) ON DELETE CASCADE,
            activity_id INTEGER NOT NULL
                REFERENCES activities(id) ON DELETE CASCADE
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_signups_camper ON signups(camper_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_signups_activity ON signups(activity_id)",
        [],
    )?;

    Ok(())
}

pub fn table_counts(conn: &Connection) -> Result<TableCounts> {
    let count = |table: &str| -> Result<i64> {
        let n = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
            row.get(0)
        })?;
        Ok(n)
    };

    Ok(TableCounts {
        activities: count("activities")?,
        campers: count("campers")?,
        signups: count("signups")?,
    })
}
