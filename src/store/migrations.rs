//! SQLite schema migrations for the article store.

use crate::error::StoreError;
use rusqlite::Connection;
use tracing::info;

/// Apply every migration that has not been recorded yet.
pub fn run_migrations(conn: &Connection) -> Result<(), StoreError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS migrations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            applied_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
        )",
        [],
    )?;

    run_migration(conn, "001_articles", CREATE_ARTICLES_TABLE)?;
    run_migration(conn, "002_articles_published_at_idx", CREATE_PUBLISHED_AT_INDEX)?;

    Ok(())
}

fn run_migration(conn: &Connection, name: &str, sql: &str) -> Result<(), StoreError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM migrations WHERE name = ?1)",
        [name],
        |row| row.get(0),
    )?;

    if !exists {
        info!(migration = name, "Running migration");
        conn.execute_batch(sql)?;
        conn.execute("INSERT INTO migrations (name) VALUES (?1)", [name])?;
    }

    Ok(())
}

// Timestamps are fixed-width RFC 3339 UTC text, so ORDER BY on the column is chronological.
const CREATE_ARTICLES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS articles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    url TEXT UNIQUE NOT NULL,
    source TEXT NOT NULL,
    content TEXT,
    description TEXT,
    image_url TEXT,
    published_at TEXT,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now')),
    last_scraped_at TEXT
);
"#;

const CREATE_PUBLISHED_AT_INDEX: &str = r#"
CREATE INDEX IF NOT EXISTS idx_articles_published_at ON articles (published_at DESC);
"#;
