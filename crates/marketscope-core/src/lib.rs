//! Persistent store for the Marketscope dashboard.
//!
//! One SQLite file holds the analysis cache, the document dedup
//! registry with its Q&A log, the M&A search history, and usage
//! telemetry. Every operation opens its own short-lived connection;
//! the database's transaction isolation is the only concurrency guard,
//! so the store can be shared freely across request contexts.

mod broker;
mod cache;
mod confirm;
mod db;
mod documents;
mod error;
mod fingerprint;
mod interactions;
mod maintenance;
mod searches;
mod telemetry;

pub use broker::{AnalysisBroker, AnalysisProvider, FetchOutcome};
pub use cache::DEFAULT_TTL_HOURS;
pub use confirm::WipeGuard;
pub use db::MarketStore;
pub use documents::reconstruct_chunk_ranges;
pub use error::StoreError;
pub use fingerprint::{content_digest, query_fingerprint};

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
