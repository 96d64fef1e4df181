//! Analysis cache types.
//!
//! Cached analyses are keyed by a deterministic fingerprint of
//! (subject, kind, parameters) and expire lazily: expired rows stay on
//! disk until a sweep removes them, but reads never return them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A cache entry as returned by a lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedAnalysis {
    /// Row id.
    pub id: i64,
    /// Deterministic digest of (subject, kind, parameters).
    pub fingerprint: String,
    /// What was analyzed, e.g. "EV Batteries".
    pub subject: String,
    /// Which kind of analysis, e.g. "competitors".
    pub kind: String,
    /// The analysis text artifact as the producing service returned it.
    pub payload: String,
    /// Which service produced the payload, e.g. "openai".
    pub source: String,
    /// When this entry was written (replaced entries get a fresh stamp).
    pub created_at: DateTime<Utc>,
    /// When this entry stops being served. None means it never expires.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Aggregate row for the "popular subjects" view: how often a subject
/// was cached inside a trailing window, counting live entries only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PopularSubject {
    pub subject: String,
    pub hit_count: u64,
    pub last_used_at: DateTime<Utc>,
}

/// Browsing row for live cache entries, newest first, with a per
/// (subject, kind) access count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSummary {
    pub subject: String,
    pub kind: String,
    pub created_at: DateTime<Utc>,
    pub access_count: u64,
}
