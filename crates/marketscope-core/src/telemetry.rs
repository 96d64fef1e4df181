//! Usage telemetry.
//!
//! Append-only events with a free-form JSON payload. Nothing here is
//! load-bearing for the dashboard; rows exist so the analytics tab can
//! aggregate them, and they age out via `purge_events_older_than`.

use crate::db::{self, MarketStore};
use crate::Result;
use marketscope_types::{DailyCount, KindCount, UsageSummary};
use rusqlite::params;
use serde_json::Value;

impl MarketStore {
    /// Record one event. `payload` is stored as JSON text when present;
    /// its shape is up to the caller and is never validated here.
    pub fn record_event(
        &self,
        kind: &str,
        payload: Option<&Value>,
        session_token: Option<&str>,
    ) -> Result<i64> {
        let payload_json = payload.map(serde_json::to_string).transpose()?;

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO telemetry (kind, payload, session_token, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![kind, payload_json, session_token, db::now_ts()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Aggregate activity over the trailing `days`-day window: total
    /// events, the ten most recent active days, a per-kind breakdown,
    /// and the single busiest day.
    pub fn usage_summary(&self, days: u32) -> Result<UsageSummary> {
        let cutoff = db::days_ago_ts(days);
        let conn = self.conn()?;

        let total_events: i64 = conn.query_row(
            "SELECT COUNT(*) FROM telemetry WHERE created_at > ?1",
            params![&cutoff],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(
            r#"
            SELECT DATE(created_at) AS day, COUNT(*) AS events
            FROM telemetry
            WHERE created_at > ?1
            GROUP BY DATE(created_at)
            ORDER BY day DESC
            LIMIT 10
            "#,
        )?;
        let daily = stmt
            .query_map(params![&cutoff], row_to_daily)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT kind, COUNT(*) AS events
            FROM telemetry
            WHERE created_at > ?1
            GROUP BY kind
            ORDER BY events DESC
            "#,
        )?;
        let by_kind = stmt
            .query_map(params![&cutoff], |row| {
                Ok(KindCount {
                    kind: row.get("kind")?,
                    events: row.get::<_, i64>("events")? as u64,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT DATE(created_at) AS day, COUNT(*) AS events
            FROM telemetry
            WHERE created_at > ?1
            GROUP BY DATE(created_at)
            ORDER BY events DESC
            LIMIT 1
            "#,
        )?;
        let peak_day = stmt
            .query_map(params![&cutoff], row_to_daily)?
            .collect::<std::result::Result<Vec<_>, _>>()?
            .into_iter()
            .next();

        Ok(UsageSummary {
            days,
            total_events: total_events as u64,
            daily,
            by_kind,
            peak_day,
        })
    }

    /// Drop events older than `days`. Returns how many were removed.
    pub fn purge_events_older_than(&self, days: u32) -> Result<u64> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM telemetry WHERE created_at < ?1",
            params![db::days_ago_ts(days)],
        )?;
        if removed > 0 {
            tracing::info!(
                target: "marketscope::telemetry",
                removed,
                days,
                "purged old telemetry events"
            );
        }
        Ok(removed as u64)
    }
}

fn row_to_daily(row: &rusqlite::Row) -> rusqlite::Result<DailyCount> {
    Ok(DailyCount {
        date: row.get("day")?,
        events: row.get::<_, i64>("events")? as u64,
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
    fn test_record_event_with_and_without_payload() {
        let (store, _dir) = create_test_store();

        let id = store
            .record_event(
                "market_analysis",
                Some(&json!({"subject": "EV Batteries"})),
                Some("session-1"),
            )
            .unwrap();
        assert!(id > 0);

        store.record_event("tab_switch", None, None).unwrap();

        let summary = store.usage_summary(7).unwrap();
        assert_eq!(summary.total_events, 2);
    }

    #[test]
    fn test_usage_summary_aggregates() {
        let (store, _dir) = create_test_store();

        for _ in 0..3 {
            store
                .record_event("market_analysis", None, Some("session-1"))
                .unwrap();
        }
        store
            .record_event("document_upload", None, Some("session-1"))
            .unwrap();

        let summary = store.usage_summary(7).unwrap();
        assert_eq!(summary.days, 7);
        assert_eq!(summary.total_events, 4);

        // Everything landed today, so one daily bucket holds all rows.
        assert_eq!(summary.daily.len(), 1);
        assert_eq!(summary.daily[0].events, 4);
        assert_eq!(summary.peak_day.as_ref().unwrap().events, 4);

        assert_eq!(summary.by_kind.len(), 2);
        assert_eq!(summary.by_kind[0].kind, "market_analysis");
        assert_eq!(summary.by_kind[0].events, 3);
        assert_eq!(summary.by_kind[1].kind, "document_upload");

        assert!((summary.daily_average() - 4.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_summary_window_excludes_old_events() {
        let (store, _dir) = create_test_store();

        store.record_event("market_analysis", None, None).unwrap();

        let conn = store.conn().unwrap();
        conn.execute(
            "INSERT INTO telemetry (kind, payload, session_token, created_at)
             VALUES ('market_analysis', NULL, NULL, ?1)",
            params![db::encode_ts(chrono::Utc::now() - chrono::Duration::days(40))],
        )
        .unwrap();
        drop(conn);

        let summary = store.usage_summary(30).unwrap();
        assert_eq!(summary.total_events, 1);

        let wide = store.usage_summary(60).unwrap();
        assert_eq!(wide.total_events, 2);
        assert_eq!(wide.daily.len(), 2);
    }

    #[test]
    fn test_purge_old_events() {
        let (store, _dir) = create_test_store();

        store.record_event("tab_switch", None, None).unwrap();

        let conn = store.conn().unwrap();
        conn.execute(
            "INSERT INTO telemetry (kind, payload, session_token, created_at)
             VALUES ('tab_switch', NULL, NULL, ?1)",
            params![db::encode_ts(chrono::Utc::now() - chrono::Duration::days(120))],
        )
        .unwrap();
        drop(conn);

        assert_eq!(store.purge_events_older_than(90).unwrap(), 1);
        assert_eq!(store.purge_events_older_than(90).unwrap(), 0);
        assert_eq!(store.usage_summary(365).unwrap().total_events, 1);
    }

    #[test]
    fn test_empty_store_summary() {
        let (store, _dir) = create_test_store();

        let summary = store.usage_summary(7).unwrap();
        assert_eq!(summary.total_events, 0);
        assert!(summary.daily.is_empty());
        assert!(summary.by_kind.is_empty());
        assert!(summary.peak_day.is_none());
        assert_eq!(summary.daily_average(), 0.0);
    }
}
