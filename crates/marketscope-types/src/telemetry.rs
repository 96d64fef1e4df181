//! Usage telemetry types.
//!
//! Events are schema-loose on purpose: `payload` is whatever JSON the
//! caller attaches, and aggregation happens at read time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One recorded usage event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub id: i64,
    /// Event kind, e.g. "market_analysis" or "document_upload".
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    /// Opaque token grouping events from one dashboard session.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Events on one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCount {
    /// YYYY-MM-DD.
    pub date: String,
    pub events: u64,
}

/// Events of one kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindCount {
    pub kind: String,
    pub events: u64,
}

/// Aggregated usage over a trailing window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageSummary {
    /// Window length the summary covers.
    pub days: u32,
    /// Total events inside the window.
    pub total_events: u64,
    /// Per-day counts, most recent days first.
    pub daily: Vec<DailyCount>,
    /// Per-kind counts, busiest kind first.
    pub by_kind: Vec<KindCount>,
    /// The single busiest day, if there was any activity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak_day: Option<DailyCount>,
}

impl UsageSummary {
    /// Average events per day over the window.
    pub fn daily_average(&self) -> f64 {
        if self.days == 0 {
            return 0.0;
        }
        self.total_events as f64 / self.days as f64
    }
}
