//! `purge`, `wipe`, `compact` and `backup` commands.

use anyhow::Result;
use marketscope_core::{MarketStore, WipeGuard};
use marketscope_types::DeleteScope;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::time::Duration;

pub fn purge_searches(store: &MarketStore, days: u32) -> Result<()> {
    let removed = store.purge_searches_older_than(days)?;
    println!("Removed {removed} searches older than {days} days.");
    Ok(())
}

pub fn purge_telemetry(store: &MarketStore, days: u32) -> Result<()> {
    let removed = store.purge_events_older_than(days)?;
    println!("Removed {removed} telemetry events older than {days} days.");
    Ok(())
}

/// Two-step wipe: arm, prompt, commit. `--yes` keeps the arm/commit
/// protocol but skips the prompt.
pub fn wipe(
    store: &MarketStore,
    scope: DeleteScope,
    confirm_window_secs: u64,
    yes: bool,
) -> Result<()> {
    let mut guard = WipeGuard::with_window(Duration::from_secs(confirm_window_secs));
    guard.arm(scope);

    if !yes {
        let stats = store.stats()?;
        println!(
            "About to delete scope '{}' from {} ({} rows total).",
            scope.label(),
            store.db_path().display(),
            stats.total_rows()
        );
        print!("Type '{}' to confirm: ", scope.label());
        io::stdout().flush()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        if line.trim() != scope.label() {
            guard.disarm();
            println!("Aborted.");
            return Ok(());
        }
    }

    guard.commit(scope)?;
    let removed = store.bulk_delete(scope)?;
    println!("Removed {removed} rows.");
    Ok(())
}

pub fn compact(store: &MarketStore) -> Result<()> {
    let before = store.stats()?.db_size_bytes;
    store.compact()?;
    let after = store.stats()?.db_size_bytes;
    println!("Compacted: {before} -> {after} bytes.");
    Ok(())
}

pub fn backup(store: &MarketStore, dest: &Path) -> Result<()> {
    store.backup_to(dest)?;
    println!("Backup written to {}.", dest.display());
    Ok(())
}
