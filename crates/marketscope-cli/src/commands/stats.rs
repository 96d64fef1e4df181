//! `stats` command.

use anyhow::Result;
use marketscope_core::MarketStore;

pub fn run(store: &MarketStore) -> Result<()> {
    let stats = store.stats()?;

    println!("Store: {}", store.db_path().display());
    println!();
    println!("  Cached analyses   {:>8}", stats.analysis_count);
    println!("  Documents         {:>8}", stats.document_count);
    println!("  Interactions      {:>8}", stats.interaction_count);
    println!("  Searches          {:>8}", stats.search_count);
    println!("  Telemetry events  {:>8}", stats.telemetry_count);
    println!("  Total rows        {:>8}", stats.total_rows());
    println!("  File size         {:>8.2} MB", stats.db_size_mb());

    Ok(())
}
