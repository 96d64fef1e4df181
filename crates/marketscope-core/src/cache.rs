//! Analysis cache operations.
//!
//! Entries are keyed by the fingerprint of (subject, kind, parameters).
//! Writes replace whatever the fingerprint held before; reads filter out
//! expired rows but leave them on disk until a sweep removes them.

use crate::db::{self, MarketStore};
use crate::{Result, query_fingerprint};
use chrono::Utc;
use marketscope_types::{AnalysisSummary, CachedAnalysis, PopularSubject};
use rusqlite::{OptionalExtension, params};
use serde_json::Value;

/// Conventional time-to-live for cached analyses, in hours. The store
/// itself treats a missing ttl as "never expires"; this default is for
/// callers that want the dashboard's usual refresh cadence.
pub const DEFAULT_TTL_HOURS: u32 = 24;

impl MarketStore {
    /// Look up a cached analysis. Absent and expired entries both come
    /// back as `Ok(None)`; a miss is not an error.
    pub fn cached_analysis(
        &self,
        subject: &str,
        kind: &str,
        parameters: &Value,
    ) -> Result<Option<CachedAnalysis>> {
        let fingerprint = query_fingerprint(subject, kind, parameters)?;
        let conn = self.conn()?;
        let entry = conn
            .query_row(
                r#"
                SELECT id, fingerprint, subject, kind, payload, source, created_at, expires_at
                FROM analysis_cache
                WHERE fingerprint = ?1 AND (expires_at IS NULL OR expires_at > ?2)
                "#,
                params![fingerprint, db::now_ts()],
                row_to_cached,
            )
            .optional()?;
        Ok(entry)
    }

    /// Store an analysis under its fingerprint, replacing any previous
    /// entry for the same key. The entry's age resets: `created_at`
    /// becomes now and `expires_at` becomes now plus the ttl. `None`
    /// means the entry never expires; `Some(0)` writes one that is
    /// already expired.
    ///
    /// Returns the row id.
    pub fn store_analysis(
        &self,
        subject: &str,
        kind: &str,
        parameters: &Value,
        payload: &str,
        source: &str,
        ttl_hours: Option<u32>,
    ) -> Result<i64> {
        let fingerprint = query_fingerprint(subject, kind, parameters)?;
        let now = Utc::now();
        let expires_at =
            ttl_hours.map(|ttl| db::encode_ts(now + chrono::Duration::hours(ttl as i64)));

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT OR REPLACE INTO analysis_cache
                (fingerprint, subject, kind, payload, source, created_at, expires_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                fingerprint,
                subject,
                kind,
                payload,
                source,
                db::encode_ts(now),
                expires_at,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Delete every expired entry. Returns how many were removed.
    ///
    /// This is the only path that physically removes expired rows;
    /// ordinary reads just skip them.
    pub fn sweep_expired(&self) -> Result<u64> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM analysis_cache WHERE expires_at IS NOT NULL AND expires_at <= ?1",
            params![db::now_ts()],
        )?;
        if removed > 0 {
            tracing::info!(target: "marketscope::cache", removed, "swept expired cache entries");
        }
        Ok(removed as u64)
    }

    /// Subjects with live cache entries created inside the trailing
    /// window, busiest first, ties broken by most recent use.
    pub fn popular_subjects(&self, days: u32, limit: u32) -> Result<Vec<PopularSubject>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT subject, COUNT(*) AS hit_count, MAX(created_at) AS last_used_at
            FROM analysis_cache
            WHERE created_at > ?1 AND (expires_at IS NULL OR expires_at > ?2)
            GROUP BY subject
            ORDER BY hit_count DESC, last_used_at DESC
            LIMIT ?3
            "#,
        )?;
        let subjects = stmt
            .query_map(
                params![db::days_ago_ts(days), db::now_ts(), limit as i64],
                |row| {
                    Ok(PopularSubject {
                        subject: row.get("subject")?,
                        hit_count: row.get::<_, i64>("hit_count")? as u64,
                        last_used_at: db::parse_ts(&row.get::<_, String>("last_used_at")?),
                    })
                },
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(subjects)
    }

    /// Live cache entries for browsing, newest first, each carrying how
    /// many live entries exist for its (subject, kind) pair.
    pub fn analysis_history(&self, limit: u32) -> Result<Vec<AnalysisSummary>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT DISTINCT subject, kind, created_at,
                   COUNT(*) OVER (PARTITION BY subject, kind) AS access_count
            FROM analysis_cache
            WHERE expires_at IS NULL OR expires_at > ?1
            ORDER BY created_at DESC
            LIMIT ?2
            "#,
        )?;
        let entries = stmt
            .query_map(params![db::now_ts(), limit as i64], |row| {
                Ok(AnalysisSummary {
                    subject: row.get("subject")?,
                    kind: row.get("kind")?,
                    created_at: db::parse_ts(&row.get::<_, String>("created_at")?),
                    access_count: row.get::<_, i64>("access_count")? as u64,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Remove every cached analysis for a subject, live or expired.
    pub fn delete_subject_analyses(&self, subject: &str) -> Result<u64> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM analysis_cache WHERE subject = ?1",
            params![subject],
        )?;
        Ok(removed as u64)
    }

    /// Remove the cached analyses of one kind for a subject.
    pub fn delete_analysis(&self, subject: &str, kind: &str) -> Result<u64> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM analysis_cache WHERE subject = ?1 AND kind = ?2",
            params![subject, kind],
        )?;
        Ok(removed as u64)
    }

    /// Entries older than the given number of days, regardless of expiry.
    /// A health signal for the admin view.
    pub fn stale_cache_count(&self, days: u32) -> Result<u64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM analysis_cache WHERE created_at < ?1",
            params![db::days_ago_ts(days)],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}

fn row_to_cached(row: &rusqlite::Row) -> rusqlite::Result<CachedAnalysis> {
    let created_at: String = row.get("created_at")?;
    let expires_at: Option<String> = row.get("expires_at")?;

    Ok(CachedAnalysis {
        id: row.get("id")?,
        fingerprint: row.get("fingerprint")?,
        subject: row.get("subject")?,
        kind: row.get("kind")?,
        payload: row.get("payload")?,
        source: row.get("source")?,
        created_at: db::parse_ts(&created_at),
        expires_at: expires_at.map(|s| db::parse_ts(&s)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn create_test_store() -> (MarketStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = MarketStore::open(&temp_dir.path().join("test.db")).unwrap();
        (store, temp_dir)
    }

    #[test]
    fn test_store_and_fetch_round_trip() {
        let (store, _dir) = create_test_store();
        let params = json!({"region": "EU"});

        store
            .store_analysis(
                "EV Batteries",
                "global",
                &params,
                "overview text",
                "openai",
                Some(24),
            )
            .unwrap();

        let hit = store
            .cached_analysis("EV Batteries", "global", &params)
            .unwrap()
            .unwrap();
        assert_eq!(hit.subject, "EV Batteries");
        assert_eq!(hit.kind, "global");
        assert_eq!(hit.payload, "overview text");
        assert_eq!(hit.source, "openai");
        assert!(hit.expires_at.is_some());

        // Different parameters are a different key
        let miss = store
            .cached_analysis("EV Batteries", "global", &json!({"region": "US"}))
            .unwrap();
        assert!(miss.is_none());
    }

    #[test]
    fn test_absent_ttl_means_never_expires() {
        let (store, _dir) = create_test_store();
        store
            .store_analysis("Hydrogen", "overview", &json!({}), "text", "openai", None)
            .unwrap();

        let hit = store
            .cached_analysis("Hydrogen", "overview", &json!({}))
            .unwrap()
            .unwrap();
        assert!(hit.expires_at.is_none());

        // Never-expiring rows survive a sweep
        assert_eq!(store.sweep_expired().unwrap(), 0);
        assert!(
            store
                .cached_analysis("Hydrogen", "overview", &json!({}))
                .unwrap()
                .is_some()
        );
    }

    #[test]
    fn test_expired_entry_is_invisible_but_kept() {
        let (store, _dir) = create_test_store();
        let params = json!({});
        store
            .store_analysis("Lidar", "trends", &params, "flat", "openai", Some(0))
            .unwrap();

        assert!(
            store
                .cached_analysis("Lidar", "trends", &params)
                .unwrap()
                .is_none()
        );

        // Lazy expiry: the row is still on disk
        let conn = store.conn().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM analysis_cache", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_replace_keeps_one_row_and_resets_age() {
        let (store, _dir) = create_test_store();
        let params = json!({"depth": 2});

        store
            .store_analysis("Hydrogen", "market_size", &params, "v1", "openai", Some(1))
            .unwrap();
        let first = store
            .cached_analysis("Hydrogen", "market_size", &params)
            .unwrap()
            .unwrap();

        store
            .store_analysis("Hydrogen", "market_size", &params, "v2", "web", Some(48))
            .unwrap();
        let second = store
            .cached_analysis("Hydrogen", "market_size", &params)
            .unwrap()
            .unwrap();

        assert_eq!(second.payload, "v2");
        assert_eq!(second.source, "web");
        assert!(second.created_at >= first.created_at);
        assert!(second.expires_at.unwrap() > first.expires_at.unwrap());

        let conn = store.conn().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM analysis_cache", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_sweep_removes_exactly_the_expired() {
        let (store, _dir) = create_test_store();
        store
            .store_analysis("A", "trends", &json!({}), "1", "openai", Some(24))
            .unwrap();
        store
            .store_analysis("B", "trends", &json!({}), "2", "openai", Some(0))
            .unwrap();
        store
            .store_analysis("C", "trends", &json!({}), "3", "openai", Some(0))
            .unwrap();

        assert_eq!(store.sweep_expired().unwrap(), 2);
        assert_eq!(store.sweep_expired().unwrap(), 0);
        assert!(
            store
                .cached_analysis("A", "trends", &json!({}))
                .unwrap()
                .is_some()
        );
    }

    #[test]
    fn test_popular_subjects_ranking_skips_expired_and_old() {
        let (store, _dir) = create_test_store();
        store
            .store_analysis("EV Batteries", "competitors", &json!({}), "1", "openai", Some(24))
            .unwrap();
        store
            .store_analysis("EV Batteries", "market_size", &json!({}), "2", "openai", Some(24))
            .unwrap();
        store
            .store_analysis("Lidar", "competitors", &json!({}), "3", "openai", Some(24))
            .unwrap();
        // Expired entries do not count
        store
            .store_analysis("Lidar", "trends", &json!({}), "4", "openai", Some(0))
            .unwrap();

        // A live subject created outside the window
        let conn = store.conn().unwrap();
        conn.execute(
            "INSERT INTO analysis_cache (fingerprint, subject, kind, payload, source, created_at)
             VALUES ('fp-old', 'Forgotten', 'trends', 'old', 'openai', ?1)",
            params![db::days_ago_ts(40)],
        )
        .unwrap();

        let popular = store.popular_subjects(30, 10).unwrap();
        assert_eq!(popular.len(), 2);
        assert_eq!(popular[0].subject, "EV Batteries");
        assert_eq!(popular[0].hit_count, 2);
        assert_eq!(popular[1].subject, "Lidar");
        assert_eq!(popular[1].hit_count, 1);

        let limited = store.popular_subjects(30, 1).unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[test]
    fn test_analysis_history_lists_live_entries_only() {
        let (store, _dir) = create_test_store();
        store
            .store_analysis("EV Batteries", "competitors", &json!({"a": 1}), "1", "openai", Some(24))
            .unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        store
            .store_analysis("EV Batteries", "competitors", &json!({"a": 2}), "2", "openai", Some(24))
            .unwrap();
        store
            .store_analysis("Lidar", "trends", &json!({}), "3", "openai", Some(0))
            .unwrap();

        let history = store.analysis_history(20).unwrap();
        assert_eq!(history.len(), 2);
        assert!(history.iter().all(|h| h.subject == "EV Batteries"));
        assert!(history.iter().all(|h| h.access_count == 2));
        assert!(history[0].created_at >= history[1].created_at);
    }

    #[test]
    fn test_subject_and_kind_deletes() {
        let (store, _dir) = create_test_store();
        store
            .store_analysis("EV Batteries", "competitors", &json!({}), "1", "openai", Some(24))
            .unwrap();
        store
            .store_analysis("EV Batteries", "market_size", &json!({}), "2", "openai", Some(24))
            .unwrap();
        store
            .store_analysis("Lidar", "competitors", &json!({}), "3", "openai", Some(24))
            .unwrap();

        assert_eq!(store.delete_analysis("EV Batteries", "market_size").unwrap(), 1);
        assert_eq!(store.delete_subject_analyses("EV Batteries").unwrap(), 1);
        assert_eq!(store.delete_subject_analyses("EV Batteries").unwrap(), 0);
        assert!(
            store
                .cached_analysis("Lidar", "competitors", &json!({}))
                .unwrap()
                .is_some()
        );
    }

    #[test]
    fn test_stale_cache_count() {
        let (store, _dir) = create_test_store();
        store
            .store_analysis("Fresh", "trends", &json!({}), "1", "openai", Some(24))
            .unwrap();
        let conn = store.conn().unwrap();
        conn.execute(
            "INSERT INTO analysis_cache (fingerprint, subject, kind, payload, source, created_at)
             VALUES ('fp-stale', 'Stale', 'trends', 'old', 'openai', ?1)",
            params![db::days_ago_ts(10)],
        )
        .unwrap();

        assert_eq!(store.stale_cache_count(7).unwrap(), 1);
        assert_eq!(store.stale_cache_count(30).unwrap(), 0);
    }
}
