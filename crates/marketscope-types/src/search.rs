//! Deal-search history types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One saved deal-search result set. Append-only: repeating a search
/// adds a new row rather than replacing the old one, which is what makes
/// trend queries over repeated look-ups possible.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRecord {
    pub id: i64,
    /// Market the search was about.
    pub subject: String,
    /// Free-form time window label, e.g. "last 2 years".
    pub timeframe: String,
    /// Result text as the search service returned it.
    pub payload: String,
    pub deals_found: u32,
    pub created_at: DateTime<Utc>,
}
