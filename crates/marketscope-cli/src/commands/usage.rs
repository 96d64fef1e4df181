//! `usage` command: telemetry summary.

use anyhow::Result;
use marketscope_core::MarketStore;

pub fn run(store: &MarketStore, days: u32) -> Result<()> {
    let summary = store.usage_summary(days)?;

    if summary.total_events == 0 {
        println!("No telemetry in the last {days} days.");
        return Ok(());
    }

    println!(
        "{} events in the last {} days ({:.1}/day average)",
        summary.total_events,
        summary.days,
        summary.daily_average()
    );
    if let Some(peak) = &summary.peak_day {
        println!("Peak day: {} ({} events)", peak.date, peak.events);
    }

    println!();
    println!("By kind:");
    for kind in &summary.by_kind {
        println!("  {:<28} {:>6}", kind.kind, kind.events);
    }

    println!();
    println!("Recent days:");
    for day in &summary.daily {
        println!("  {}  {:>6}", day.date, day.events);
    }

    Ok(())
}
