//! Store-wide maintenance: statistics, bulk deletion, compaction and
//! file-level backup.
//!
//! Bulk deletes are unconditional once called. The two-step confirm
//! flow the dashboard presents lives in [`crate::confirm::WipeGuard`],
//! outside the store, so tests and scripted maintenance can wipe
//! without ceremony.

use crate::db::MarketStore;
use crate::Result;
use marketscope_types::{DeleteScope, StoreStats};
use rusqlite::{params, Connection};
use std::fs;
use std::path::Path;

impl MarketStore {
    /// Row counts for every table plus the size of the store file.
    pub fn stats(&self) -> Result<StoreStats> {
        let conn = self.conn()?;

        let db_size_bytes = fs::metadata(self.db_path()).map(|m| m.len()).unwrap_or(0);

        Ok(StoreStats {
            analysis_count: count_rows(&conn, "analysis_cache")?,
            document_count: count_rows(&conn, "documents")?,
            interaction_count: count_rows(&conn, "interactions")?,
            search_count: count_rows(&conn, "searches")?,
            telemetry_count: count_rows(&conn, "telemetry")?,
            db_size_bytes,
        })
    }

    /// Delete every row in the given scope. Returns the number of rows
    /// removed. Document deletion clears the interaction log first so
    /// no orphaned child is ever visible, and `Everything` runs as one
    /// transaction for the same reason.
    pub fn bulk_delete(&self, scope: DeleteScope) -> Result<u64> {
        let mut conn = self.conn()?;

        let removed = match scope {
            DeleteScope::AnalysisCache => {
                conn.execute("DELETE FROM analysis_cache", [])? as u64
            }
            DeleteScope::Searches => conn.execute("DELETE FROM searches", [])? as u64,
            DeleteScope::Telemetry => conn.execute("DELETE FROM telemetry", [])? as u64,
            DeleteScope::Documents => {
                let tx = conn.transaction()?;
                let mut removed = tx.execute("DELETE FROM interactions", [])? as u64;
                removed += tx.execute("DELETE FROM documents", [])? as u64;
                tx.commit()?;
                removed
            }
            DeleteScope::Everything => {
                let tx = conn.transaction()?;
                let mut removed = tx.execute("DELETE FROM analysis_cache", [])? as u64;
                removed += tx.execute("DELETE FROM interactions", [])? as u64;
                removed += tx.execute("DELETE FROM documents", [])? as u64;
                removed += tx.execute("DELETE FROM searches", [])? as u64;
                removed += tx.execute("DELETE FROM telemetry", [])? as u64;
                tx.commit()?;
                removed
            }
        };

        tracing::info!(
            target: "marketscope::maintenance",
            scope = scope.label(),
            removed,
            "bulk delete"
        );
        Ok(removed)
    }

    /// Rewrite the store file to reclaim space freed by deletions.
    pub fn compact(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute("VACUUM", [])?;
        Ok(())
    }

    /// Write a compacted copy of the store to `dest`. The copy is a
    /// complete, openable store file.
    pub fn backup_to(&self, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        let conn = self.conn()?;
        conn.execute("VACUUM INTO ?1", params![dest.to_string_lossy()])?;
        tracing::info!(
            target: "marketscope::maintenance",
            dest = %dest.display(),
            "backup written"
        );
        Ok(())
    }
}

fn count_rows(conn: &Connection, table: &str) -> Result<u64> {
    let count: i64 =
        conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
    Ok(count as u64)
}
