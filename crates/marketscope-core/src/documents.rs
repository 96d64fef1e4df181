//! Document dedup registry.
//!
//! A document's identity is the digest of its raw bytes. Ingestion is a
//! two-step caller protocol: `find_document_by_content` first, then
//! `record_document` only on a miss. The store does not enforce the
//! dedup check, so two callers ingesting the same bytes concurrently can
//! both insert; the most recently processed row wins on the next lookup.

use crate::db::{self, MarketStore};
use crate::{Result, StoreError, content_digest};
use marketscope_types::{
    ChunkRange, ChunkSpan, DocumentRecord, DocumentSession, DocumentStatus, HistoryOrder,
    NewDocument, SessionBundle,
};
use rusqlite::{OptionalExtension, params};

impl MarketStore {
    /// The authoritative record for these exact bytes: the most recently
    /// processed row with a matching content hash. Failed attempts are
    /// never returned.
    pub fn find_document_by_content(&self, content_hash: &str) -> Result<Option<DocumentRecord>> {
        let conn = self.conn()?;
        let record = conn
            .query_row(
                r#"
                SELECT * FROM documents
                WHERE content_hash = ?1 AND status = 'processed'
                ORDER BY processed_at DESC, id DESC
                LIMIT 1
                "#,
                params![content_hash],
                row_to_document,
            )
            .optional()?;
        Ok(record)
    }

    /// Record an ingested document and return its id.
    ///
    /// The content hash and byte size are computed here from the raw
    /// bytes. No existing-hash check happens: the dedup decision belongs
    /// to the caller, and a duplicate row from a concurrent ingestion is
    /// accepted.
    pub fn record_document(&self, doc: &NewDocument) -> Result<i64> {
        if let Some(spans) = &doc.chunk_spans {
            validate_spans(spans, doc.page_count, doc.chunk_handles.len())?;
        }

        let content_hash = content_digest(&doc.content_bytes);
        let spans_json = doc
            .chunk_spans
            .as_ref()
            .map(|s| serde_json::to_string(s))
            .transpose()?;

        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO documents
                (display_name, content_hash, byte_size, page_count, chunk_count,
                 chunk_handles, chunk_spans, status, processed_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                doc.display_name,
                content_hash,
                doc.content_bytes.len() as i64,
                doc.page_count,
                doc.chunk_handles.len() as i64,
                serde_json::to_string(&doc.chunk_handles)?,
                spans_json,
                status_to_string(doc.status),
                db::now_ts(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Fetch a document by id. Absence here is an error: callers arrive
    /// with ids they got from the store.
    pub fn document(&self, id: i64) -> Result<DocumentRecord> {
        let conn = self.conn()?;
        conn.query_row(
            "SELECT * FROM documents WHERE id = ?1",
            params![id],
            row_to_document,
        )
        .optional()?
        .ok_or(StoreError::DocumentNotFound(id))
    }

    /// Delete a document and all interactions referencing it, in one
    /// transaction. A partially cascaded state is never visible.
    pub fn delete_document(&self, id: i64) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let interactions =
            tx.execute("DELETE FROM interactions WHERE document_id = ?1", params![id])?;
        let removed = tx.execute("DELETE FROM documents WHERE id = ?1", params![id])?;
        if removed == 0 {
            return Err(StoreError::DocumentNotFound(id));
        }

        tx.commit()?;
        tracing::info!(
            target: "marketscope::documents",
            document_id = id,
            interactions,
            "deleted document and its interactions"
        );
        Ok(())
    }

    /// Processed documents for browsing, newest first, each with its Q&A
    /// volume and the time of the latest question.
    pub fn document_sessions(&self, limit: u32) -> Result<Vec<DocumentSession>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT d.id, d.display_name, d.page_count, d.chunk_count, d.processed_at,
                   COUNT(i.id) AS qa_count,
                   MAX(i.created_at) AS last_question_at
            FROM documents d
            LEFT JOIN interactions i ON d.id = i.document_id
            WHERE d.status = 'processed'
            GROUP BY d.id
            ORDER BY d.processed_at DESC
            LIMIT ?1
            "#,
        )?;
        let sessions = stmt
            .query_map(params![limit as i64], |row| {
                let processed_at: String = row.get("processed_at")?;
                let last_question_at: Option<String> = row.get("last_question_at")?;
                Ok(DocumentSession {
                    document_id: row.get("id")?,
                    display_name: row.get("display_name")?,
                    page_count: row.get("page_count")?,
                    chunk_count: row.get("chunk_count")?,
                    processed_at: db::parse_ts(&processed_at),
                    qa_count: row.get::<_, i64>("qa_count")? as u64,
                    last_question_at: last_question_at.map(|s| db::parse_ts(&s)),
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(sessions)
    }

    /// Everything needed to resume work on a processed document: the
    /// record, its chunk ranges, and the conversation in replay order.
    /// Failed documents cannot be restored.
    pub fn restore_session(&self, id: i64) -> Result<SessionBundle> {
        let document = self.document(id)?;
        if document.status != DocumentStatus::Processed {
            return Err(StoreError::DocumentNotFound(id));
        }
        let chunk_ranges = reconstruct_chunk_ranges(&document);
        let interactions = self.interaction_history(id, HistoryOrder::OldestFirst)?;
        Ok(SessionBundle {
            document,
            chunk_ranges,
            interactions,
        })
    }
}

/// Pair each chunk handle with the page range it covers.
///
/// Spans recorded at ingestion are used verbatim. Rows without them fall
/// back to even division: `pages_per_chunk = page_count / chunk_count`,
/// chunk i covering `[i*ppc + 1, min((i+1)*ppc, page_count)]`. The
/// fallback is a lossy approximation when the original chunking was
/// uneven; that is why ingestion records exact spans when it can.
pub fn reconstruct_chunk_ranges(record: &DocumentRecord) -> Vec<ChunkRange> {
    if let Some(spans) = &record.chunk_spans {
        return record
            .chunk_handles
            .iter()
            .zip(spans.iter())
            .map(|(handle, span)| ChunkRange {
                handle: handle.clone(),
                start_page: span.start_page,
                end_page: span.end_page,
            })
            .collect();
    }

    let chunk_count = record.chunk_handles.len() as u32;
    if chunk_count == 0 || record.page_count == 0 {
        return Vec::new();
    }
    let pages_per_chunk = record.page_count / chunk_count;

    record
        .chunk_handles
        .iter()
        .enumerate()
        .map(|(i, handle)| {
            let i = i as u32;
            ChunkRange {
                handle: handle.clone(),
                start_page: i * pages_per_chunk + 1,
                end_page: ((i + 1) * pages_per_chunk).min(record.page_count),
            }
        })
        .collect()
}

fn validate_spans(spans: &[ChunkSpan], page_count: u32, chunk_count: usize) -> Result<()> {
    if spans.len() != chunk_count {
        return Err(StoreError::MalformedInput(format!(
            "expected {} chunk spans to match the chunk handles, got {}",
            chunk_count,
            spans.len()
        )));
    }
    let mut prev_start = 0u32;
    for span in spans {
        if span.start_page == 0 || span.start_page > span.end_page || span.end_page > page_count {
            return Err(StoreError::MalformedInput(format!(
                "chunk span {}-{} is outside pages 1-{}",
                span.start_page, span.end_page, page_count
            )));
        }
        if span.start_page <= prev_start {
            return Err(StoreError::MalformedInput(
                "chunk spans must be ordered by start page".to_string(),
            ));
        }
        prev_start = span.start_page;
    }
    Ok(())
}

fn status_to_string(status: DocumentStatus) -> &'static str {
    match status {
        DocumentStatus::Processed => "processed",
        DocumentStatus::Failed => "failed",
    }
}

fn string_to_status(s: &str) -> DocumentStatus {
    match s {
        "processed" => DocumentStatus::Processed,
        "failed" => DocumentStatus::Failed,
        _ => DocumentStatus::Failed,
    }
}

fn row_to_document(row: &rusqlite::Row) -> rusqlite::Result<DocumentRecord> {
    let handles: String = row.get("chunk_handles")?;
    let spans: Option<String> = row.get("chunk_spans")?;
    let status: String = row.get("status")?;
    let processed_at: String = row.get("processed_at")?;

    Ok(DocumentRecord {
        id: row.get("id")?,
        display_name: row.get("display_name")?,
        content_hash: row.get("content_hash")?,
        byte_size: row.get::<_, i64>("byte_size")? as u64,
        page_count: row.get("page_count")?,
        chunk_count: row.get("chunk_count")?,
        chunk_handles: serde_json::from_str(&handles).unwrap_or_default(),
        chunk_spans: spans.and_then(|s| serde_json::from_str(&s).ok()),
        status: string_to_status(&status),
        processed_at: db::parse_ts(&processed_at),
    })
}
