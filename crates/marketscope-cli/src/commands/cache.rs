//! `popular` and `sweep` commands.

use anyhow::Result;
use marketscope_core::MarketStore;

pub fn popular(store: &MarketStore, days: u32, limit: u32) -> Result<()> {
    let subjects = store.popular_subjects(days, limit)?;
    if subjects.is_empty() {
        println!("No live analyses in the last {days} days.");
        return Ok(());
    }

    println!("{:<36} {:>6}  {}", "SUBJECT", "HITS", "LAST USED");
    for entry in subjects {
        println!(
            "{:<36} {:>6}  {}",
            entry.subject,
            entry.hit_count,
            entry.last_used_at.format("%Y-%m-%d %H:%M")
        );
    }

    Ok(())
}

pub fn sweep(store: &MarketStore) -> Result<()> {
    let removed = store.sweep_expired()?;
    println!("Removed {removed} expired cache entries.");
    Ok(())
}
