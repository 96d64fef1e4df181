//! SQLite persistence for the research store.
//!
//! A `MarketStore` is a handle on the database *path*, not on a live
//! connection: every public operation opens its own connection, does its
//! work in a single transaction, and drops it. WAL mode plus a busy
//! timeout arbitrates concurrent callers; there is no pool and no
//! background thread.

use crate::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// Persistent store for cached analyses, documents, Q&A history,
/// searches, and telemetry. One SQLite file owns all five.
#[derive(Debug, Clone)]
pub struct MarketStore {
    db_path: PathBuf,
}

impl MarketStore {
    /// Open or create the database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let store = Self {
            db_path: path.to_path_buf(),
        };
        let conn = store.conn()?;
        init_schema(&conn)?;
        Ok(store)
    }

    /// Path of the underlying database file.
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Open a connection for one operation.
    pub(crate) fn conn(&self) -> Result<Connection> {
        let conn = Connection::open(&self.db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "busy_timeout", 5000)?;
        Ok(conn)
    }
}

/// Initialize database schema. Idempotent; runs on every open.
fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS analysis_cache (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            fingerprint TEXT NOT NULL UNIQUE,
            subject TEXT NOT NULL,
            kind TEXT NOT NULL,
            payload TEXT NOT NULL,
            source TEXT NOT NULL DEFAULT 'openai',
            created_at TEXT NOT NULL,
            expires_at TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_cache_subject ON analysis_cache(subject);

        CREATE TABLE IF NOT EXISTS documents (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            display_name TEXT NOT NULL,
            content_hash TEXT NOT NULL,
            byte_size INTEGER NOT NULL DEFAULT 0,
            page_count INTEGER NOT NULL DEFAULT 0,
            chunk_count INTEGER NOT NULL DEFAULT 0,
            chunk_handles TEXT NOT NULL DEFAULT '[]',
            chunk_spans TEXT,
            status TEXT NOT NULL DEFAULT 'processed',
            processed_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_documents_content_hash ON documents(content_hash);

        CREATE TABLE IF NOT EXISTS interactions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            document_id INTEGER NOT NULL REFERENCES documents(id),
            question TEXT NOT NULL,
            answer TEXT NOT NULL,
            query_tokens INTEGER NOT NULL DEFAULT 0,
            response_tokens INTEGER NOT NULL DEFAULT 0,
            cost_estimate REAL NOT NULL DEFAULT 0.0,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_interactions_document ON interactions(document_id);

        CREATE TABLE IF NOT EXISTS searches (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            subject TEXT NOT NULL,
            timeframe TEXT NOT NULL,
            payload TEXT NOT NULL,
            deals_found INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS telemetry (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            kind TEXT NOT NULL,
            payload TEXT,
            session_token TEXT,
            created_at TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

// Timestamps are stored as fixed-width RFC 3339 UTC text (microseconds,
// trailing Z), so string comparison in SQL matches chronological order.
// Cutoffs are always computed here and bound as parameters, never via
// datetime('now'), whose output format does not sort against ours.

pub(crate) fn encode_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn now_ts() -> String {
    encode_ts(Utc::now())
}

pub(crate) fn parse_ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

pub(crate) fn days_ago_ts(days: u32) -> String {
    encode_ts(Utc::now() - chrono::Duration::days(days as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_creates_file_and_schema() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("nested").join("test.db");

        let store = MarketStore::open(&db_path).unwrap();
        assert!(db_path.exists());

        // Reopening must be harmless
        let _again = MarketStore::open(&db_path).unwrap();

        let conn = store.conn().unwrap();
        let table_count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN
                 ('analysis_cache', 'documents', 'interactions', 'searches', 'telemetry')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(table_count, 5);
    }

    #[test]
    fn test_timestamps_sort_lexicographically() {
        let early = encode_ts(Utc::now());
        std::thread::sleep(std::time::Duration::from_millis(2));
        let late = now_ts();
        assert!(early < late);
        assert_eq!(parse_ts(&early).timestamp_micros(), {
            let dt = DateTime::parse_from_rfc3339(&early).unwrap();
            dt.timestamp_micros()
        });
    }
}
