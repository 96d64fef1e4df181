//! Merger and acquisition search history.
//!
//! Unlike the analysis cache there is no keying here: every search is
//! its own row, so repeated look-ups of the same subject build up a
//! trend line instead of overwriting each other.

use crate::db::{self, MarketStore};
use crate::Result;
use chrono::{DateTime, Utc};
use marketscope_types::SearchRecord;
use rusqlite::params;

impl MarketStore {
    /// Record one search result. Always inserts; returns the row id.
    pub fn append_search(
        &self,
        subject: &str,
        timeframe: &str,
        payload: &str,
        deals_found: u32,
    ) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO searches (subject, timeframe, payload, deals_found, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![subject, timeframe, payload, deals_found, db::now_ts()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// The most recent searches, newest first.
    pub fn recent_searches(&self, limit: u32) -> Result<Vec<SearchRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT * FROM searches ORDER BY created_at DESC, id DESC LIMIT ?1",
        )?;
        let records = stmt
            .query_map(params![limit], row_to_search)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Remove the search rows for a subject recorded at an exact
    /// instant. The pair pins down one entry from a history listing.
    pub fn delete_search(&self, subject: &str, created_at: DateTime<Utc>) -> Result<u64> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM searches WHERE subject = ?1 AND created_at = ?2",
            params![subject, db::encode_ts(created_at)],
        )?;
        Ok(removed as u64)
    }

    /// Drop searches older than `days`. Returns how many were removed.
    pub fn purge_searches_older_than(&self, days: u32) -> Result<u64> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM searches WHERE created_at < ?1",
            params![db::days_ago_ts(days)],
        )?;
        if removed > 0 {
            tracing::info!(
                target: "marketscope::searches",
                removed,
                days,
                "purged old searches"
            );
        }
        Ok(removed as u64)
    }
}

fn row_to_search(row: &rusqlite::Row) -> rusqlite::Result<SearchRecord> {
    let created_at: String = row.get("created_at")?;
    Ok(SearchRecord {
        id: row.get("id")?,
        subject: row.get("subject")?,
        timeframe: row.get("timeframe")?,
        payload: row.get("payload")?,
        deals_found: row.get("deals_found")?,
        created_at: db::parse_ts(&created_at),
    })
}
