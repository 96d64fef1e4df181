//! Maintenance and administration types.

use serde::{Deserialize, Serialize};

/// Row counts per entity plus the size of the database file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreStats {
    pub analysis_count: u64,
    pub document_count: u64,
    pub interaction_count: u64,
    pub search_count: u64,
    pub telemetry_count: u64,
    /// Size of the database file in bytes; 0 if it does not exist yet.
    pub db_size_bytes: u64,
}

impl StoreStats {
    /// Total rows across all entities.
    pub fn total_rows(&self) -> u64 {
        self.analysis_count
            + self.document_count
            + self.interaction_count
            + self.search_count
            + self.telemetry_count
    }

    /// Database file size in megabytes.
    pub fn db_size_mb(&self) -> f64 {
        self.db_size_bytes as f64 / (1024.0 * 1024.0)
    }
}

/// What a bulk delete (or an armed wipe) applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteScope {
    /// All cache entries, live and expired.
    AnalysisCache,
    /// All documents and, by cascade, their interactions.
    Documents,
    /// All saved searches.
    Searches,
    /// All telemetry events.
    Telemetry,
    /// The union of every scope above.
    Everything,
}

impl DeleteScope {
    /// Stable name used in prompts and log lines.
    pub fn label(&self) -> &'static str {
        match self {
            DeleteScope::AnalysisCache => "cache",
            DeleteScope::Documents => "documents",
            DeleteScope::Searches => "searches",
            DeleteScope::Telemetry => "telemetry",
            DeleteScope::Everything => "everything",
        }
    }
}
