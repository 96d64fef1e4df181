//! Append-only Q&A log.
//!
//! Every exchange against a document lands here with a cost estimate
//! derived once, at write time. Rows are never updated; rate changes
//! only affect future appends.

use crate::db::{self, MarketStore};
use crate::{Result, StoreError};
use marketscope_types::{HistoryOrder, InteractionRecord};
use rusqlite::params;

/// USD per 1K question tokens.
const QUERY_RATE: f64 = 0.01;
/// USD per 1K answer tokens.
const RESPONSE_RATE: f64 = 0.03;

/// Cost of one exchange given the caller's token estimates.
fn cost_estimate(query_tokens: u32, response_tokens: u32) -> f64 {
    (query_tokens as f64 * QUERY_RATE + response_tokens as f64 * RESPONSE_RATE) / 1000.0
}

impl MarketStore {
    /// Append one question→answer exchange and return its row id.
    ///
    /// Fails with `DocumentNotFound` when the document does not exist;
    /// parents are created before children, never implicitly.
    pub fn append_interaction(
        &self,
        document_id: i64,
        question: &str,
        answer: &str,
        query_tokens: u32,
        response_tokens: u32,
    ) -> Result<i64> {
        let conn = self.conn()?;

        let parent_exists: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM documents WHERE id = ?1",
            params![document_id],
            |row| row.get(0),
        )?;
        if !parent_exists {
            return Err(StoreError::DocumentNotFound(document_id));
        }

        conn.execute(
            r#"
            INSERT INTO interactions
                (document_id, question, answer, query_tokens, response_tokens,
                 cost_estimate, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                document_id,
                question,
                answer,
                query_tokens,
                response_tokens,
                cost_estimate(query_tokens, response_tokens),
                db::now_ts(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// The exchanges for one document. Newest-first suits display;
    /// oldest-first replays the conversation in original order.
    pub fn interaction_history(
        &self,
        document_id: i64,
        order: HistoryOrder,
    ) -> Result<Vec<InteractionRecord>> {
        let sql = match order {
            HistoryOrder::NewestFirst => {
                "SELECT * FROM interactions WHERE document_id = ?1
                 ORDER BY created_at DESC, id DESC"
            }
            HistoryOrder::OldestFirst => {
                "SELECT * FROM interactions WHERE document_id = ?1
                 ORDER BY created_at ASC, id ASC"
            }
        };

        let conn = self.conn()?;
        let mut stmt = conn.prepare(sql)?;
        let records = stmt
            .query_map(params![document_id], row_to_interaction)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Remove every exchange for this document whose question matches
    /// exactly. Returns how many rows went away; zero is not an error.
    pub fn delete_interaction(&self, document_id: i64, question: &str) -> Result<u64> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM interactions WHERE document_id = ?1 AND question = ?2",
            params![document_id, question],
        )?;
        Ok(removed as u64)
    }

    /// Remove every exchange for this document.
    pub fn delete_document_interactions(&self, document_id: i64) -> Result<u64> {
        let conn = self.conn()?;
        let removed = conn.execute(
            "DELETE FROM interactions WHERE document_id = ?1",
            params![document_id],
        )?;
        Ok(removed as u64)
    }
}

fn row_to_interaction(row: &rusqlite::Row) -> rusqlite::Result<InteractionRecord> {
    let created_at: String = row.get("created_at")?;
    Ok(InteractionRecord {
        id: row.get("id")?,
        document_id: row.get("document_id")?,
        question: row.get("question")?,
        answer: row.get("answer")?,
        query_tokens: row.get("query_tokens")?,
        response_tokens: row.get("response_tokens")?,
        cost_estimate: row.get("cost_estimate")?,
        created_at: db::parse_ts(&created_at),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketscope_types::NewDocument;
    use tempfile::TempDir;

    fn create_test_store() -> (MarketStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = MarketStore::open(&temp_dir.path().join("test.db")).unwrap();
        (store, temp_dir)
    }

    fn create_test_document(store: &MarketStore) -> i64 {
        store
            .record_document(&NewDocument::new(
                "deck.pdf",
                b"deck bytes".to_vec(),
                10,
                vec!["file-0".to_string()],
            ))
            .unwrap()
    }

    #[test]
    fn test_append_and_read_back() {
        let (store, _dir) = create_test_store();
        let doc_id = create_test_document(&store);

        let id = store
            .append_interaction(doc_id, "What is CAGR?", "12%", 5, 3)
            .unwrap();
        assert!(id > 0);

        let history = store
            .interaction_history(doc_id, HistoryOrder::NewestFirst)
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].question, "What is CAGR?");
        assert_eq!(history[0].answer, "12%");
        assert_eq!(history[0].query_tokens, 5);
        assert_eq!(history[0].response_tokens, 3);
    }

    #[test]
    fn test_cost_formula() {
        // (5 * 0.01 + 3 * 0.03) / 1000
        assert!((cost_estimate(5, 3) - 0.00014).abs() < 1e-12);
        assert_eq!(cost_estimate(0, 0), 0.0);

        let (store, _dir) = create_test_store();
        let doc_id = create_test_document(&store);
        store
            .append_interaction(doc_id, "What is CAGR?", "12%", 5, 3)
            .unwrap();
        let stored = store
            .interaction_history(doc_id, HistoryOrder::NewestFirst)
            .unwrap()[0]
            .cost_estimate;
        assert!((stored - 0.00014).abs() < 1e-12);
    }

    #[test]
    fn test_append_to_missing_document_fails() {
        let (store, _dir) = create_test_store();
        let err = store
            .append_interaction(999, "q", "a", 1, 1)
            .unwrap_err();
        assert!(matches!(err, StoreError::DocumentNotFound(999)));
    }

    #[test]
    fn test_history_orders_both_ways() {
        let (store, _dir) = create_test_store();
        let doc_id = create_test_document(&store);

        for question in ["first", "second", "third"] {
            store
                .append_interaction(doc_id, question, "answer", 1, 1)
                .unwrap();
            std::thread::sleep(std::time::Duration::from_millis(2));
        }

        let display = store
            .interaction_history(doc_id, HistoryOrder::NewestFirst)
            .unwrap();
        let replay = store
            .interaction_history(doc_id, HistoryOrder::OldestFirst)
            .unwrap();

        assert_eq!(display[0].question, "third");
        assert_eq!(replay[0].question, "first");
        assert_eq!(replay.last().unwrap().question, "third");
    }

    #[test]
    fn test_delete_one_matches_question_exactly() {
        let (store, _dir) = create_test_store();
        let doc_id = create_test_document(&store);

        store.append_interaction(doc_id, "keep me", "a", 1, 1).unwrap();
        store.append_interaction(doc_id, "drop me", "a", 1, 1).unwrap();
        store.append_interaction(doc_id, "drop me", "b", 1, 1).unwrap();

        assert_eq!(store.delete_interaction(doc_id, "drop me").unwrap(), 2);
        assert_eq!(store.delete_interaction(doc_id, "drop me").unwrap(), 0);

        let history = store
            .interaction_history(doc_id, HistoryOrder::NewestFirst)
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].question, "keep me");
    }

    #[test]
    fn test_delete_all_for_document() {
        let (store, _dir) = create_test_store();
        let doc_id = create_test_document(&store);

        store.append_interaction(doc_id, "q1", "a", 1, 1).unwrap();
        store.append_interaction(doc_id, "q2", "a", 1, 1).unwrap();

        assert_eq!(store.delete_document_interactions(doc_id).unwrap(), 2);
        assert!(
            store
                .interaction_history(doc_id, HistoryOrder::NewestFirst)
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_cascade_delete_clears_history() {
        let (store, _dir) = create_test_store();
        let doc_id = create_test_document(&store);

        store.append_interaction(doc_id, "q1", "a", 1, 1).unwrap();
        store.append_interaction(doc_id, "q2", "a", 1, 1).unwrap();

        store.delete_document(doc_id).unwrap();

        let history = store
            .interaction_history(doc_id, HistoryOrder::NewestFirst)
            .unwrap();
        assert!(history.is_empty());
    }
}
