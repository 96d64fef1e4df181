//! Document registry types.
//!
//! Documents are identified by the digest of their raw bytes, so the same
//! file uploaded twice (under any name) resolves to one processed record.
//! Chunks live in an external service; the store keeps only their opaque
//! handles and, when the chunker reports them, their exact page spans.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::InteractionRecord;

/// Processing outcome recorded for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    /// Fully processed; eligible for dedup reuse.
    Processed,
    /// Processing failed; kept for diagnostics, never reused.
    Failed,
}

/// Inclusive 1-based page range covered by one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSpan {
    pub start_page: u32,
    pub end_page: u32,
}

impl ChunkSpan {
    pub fn new(start_page: u32, end_page: u32) -> Self {
        Self {
            start_page,
            end_page,
        }
    }
}

/// A chunk handle paired with the page range it covers, as handed back
/// to callers restoring a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkRange {
    /// Opaque identifier of the externally stored chunk.
    pub handle: String,
    pub start_page: u32,
    pub end_page: u32,
}

/// A processed (or failed) document as stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Row id; interactions reference this.
    pub id: i64,
    /// Name the file was uploaded under. Not part of document identity.
    pub display_name: String,
    /// Digest of the raw bytes; the dedup key.
    pub content_hash: String,
    /// Size of the raw bytes.
    pub byte_size: u64,
    /// Total page count.
    pub page_count: u32,
    /// Number of chunks the document was split into.
    pub chunk_count: u32,
    /// Ordered opaque identifiers of the externally stored chunks.
    pub chunk_handles: Vec<String>,
    /// Exact page spans per chunk, when the chunker reported them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunk_spans: Option<Vec<ChunkSpan>>,
    /// Processing outcome.
    pub status: DocumentStatus,
    /// When processing finished.
    pub processed_at: DateTime<Utc>,
}

/// Payload for recording a newly ingested document. The store computes
/// the content hash and byte size from `content_bytes` itself.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub display_name: String,
    pub content_bytes: Vec<u8>,
    pub page_count: u32,
    pub chunk_handles: Vec<String>,
    pub chunk_spans: Option<Vec<ChunkSpan>>,
    pub status: DocumentStatus,
}

impl NewDocument {
    /// A successfully processed document without recorded spans.
    pub fn new(
        display_name: impl Into<String>,
        content_bytes: Vec<u8>,
        page_count: u32,
        chunk_handles: Vec<String>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            content_bytes,
            page_count,
            chunk_handles,
            chunk_spans: None,
            status: DocumentStatus::Processed,
        }
    }

    /// Attach the exact page spans the chunker produced, one per handle.
    pub fn with_spans(mut self, spans: Vec<ChunkSpan>) -> Self {
        self.chunk_spans = Some(spans);
        self
    }

    /// Mark this record as a failed processing attempt.
    pub fn failed(mut self) -> Self {
        self.status = DocumentStatus::Failed;
        self
    }
}

/// Browsing row for the document session list: a processed document plus
/// how much Q&A happened against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSession {
    pub document_id: i64,
    pub display_name: String,
    pub page_count: u32,
    pub chunk_count: u32,
    pub processed_at: DateTime<Utc>,
    pub qa_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_question_at: Option<DateTime<Utc>>,
}

/// Everything needed to resume work on a document: the record, its chunk
/// layout, and the conversation so far in replay order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionBundle {
    pub document: DocumentRecord,
    pub chunk_ranges: Vec<ChunkRange>,
    pub interactions: Vec<InteractionRecord>,
}
