//! Interaction log types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One question→answer exchange against a document.
///
/// The log is append-only: rows are written once and never updated. The
/// cost estimate is derived from the token counts at write time and stored,
/// so later rate changes do not rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionRecord {
    /// Row id.
    pub id: i64,
    /// Document this exchange was about.
    pub document_id: i64,
    /// The user's question, verbatim.
    pub question: String,
    /// The answer text.
    pub answer: String,
    /// Caller-estimated prompt tokens.
    pub query_tokens: u32,
    /// Caller-estimated response tokens.
    pub response_tokens: u32,
    /// Derived cost in USD, fixed at append time.
    pub cost_estimate: f64,
    /// When the exchange was appended.
    pub created_at: DateTime<Utc>,
}

/// Ordering for interaction history reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryOrder {
    /// Display order: latest exchange first.
    NewestFirst,
    /// Replay order: restore a conversation from the beginning.
    OldestFirst,
}
