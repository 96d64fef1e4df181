//! `history` and `show` commands: the terminal rendition of the
//! dashboard's history browser.

use anyhow::Result;
use marketscope_core::MarketStore;

pub fn analyses(store: &MarketStore, limit: u32) -> Result<()> {
    let entries = store.analysis_history(limit)?;
    if entries.is_empty() {
        println!("No live analyses cached.");
        return Ok(());
    }

    println!("{:<32} {:<16} {:>5}  {}", "SUBJECT", "KIND", "HITS", "CREATED");
    for entry in entries {
        println!(
            "{:<32} {:<16} {:>5}  {}",
            entry.subject,
            entry.kind,
            entry.access_count,
            entry.created_at.format("%Y-%m-%d %H:%M")
        );
    }

    Ok(())
}

pub fn documents(store: &MarketStore, limit: u32) -> Result<()> {
    let sessions = store.document_sessions(limit)?;
    if sessions.is_empty() {
        println!("No processed documents.");
        return Ok(());
    }

    println!(
        "{:>5}  {:<32} {:>6} {:>7} {:>5}  {}",
        "ID", "NAME", "PAGES", "CHUNKS", "Q&A", "LAST QUESTION"
    );
    for session in sessions {
        let last_question = session
            .last_question_at
            .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:>5}  {:<32} {:>6} {:>7} {:>5}  {}",
            session.document_id,
            session.display_name,
            session.page_count,
            session.chunk_count,
            session.qa_count,
            last_question
        );
    }

    Ok(())
}

pub fn searches(store: &MarketStore, limit: u32) -> Result<()> {
    let searches = store.recent_searches(limit)?;
    if searches.is_empty() {
        println!("No search history.");
        return Ok(());
    }

    println!("{:<32} {:<20} {:>6}  {}", "SUBJECT", "TIMEFRAME", "DEALS", "SEARCHED");
    for search in searches {
        println!(
            "{:<32} {:<20} {:>6}  {}",
            search.subject,
            search.timeframe,
            search.deals_found,
            search.created_at.format("%Y-%m-%d %H:%M")
        );
    }

    Ok(())
}

pub fn show(store: &MarketStore, document_id: i64) -> Result<()> {
    let bundle = store.restore_session(document_id)?;
    let doc = &bundle.document;

    println!("{} (id {})", doc.display_name, doc.id);
    println!("  hash       {}", doc.content_hash);
    println!("  size       {} bytes, {} pages", doc.byte_size, doc.page_count);
    println!(
        "  processed  {}",
        doc.processed_at.format("%Y-%m-%d %H:%M:%S")
    );

    println!();
    println!("Chunks:");
    for range in &bundle.chunk_ranges {
        println!(
            "  {:<24} pages {:>4}..{}",
            range.handle, range.start_page, range.end_page
        );
    }

    if bundle.interactions.is_empty() {
        println!();
        println!("No questions asked yet.");
        return Ok(());
    }

    println!();
    println!("Q&A ({} exchanges):", bundle.interactions.len());
    for interaction in &bundle.interactions {
        println!();
        println!(
            "  [{}] ${:.5}",
            interaction.created_at.format("%Y-%m-%d %H:%M"),
            interaction.cost_estimate
        );
        println!("  Q: {}", interaction.question);
        println!("  A: {}", interaction.answer);
    }

    Ok(())
}
