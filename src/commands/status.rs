use anyhow::Result;
use owo_colors::OwoColorize;
use watchsync_core::config::Config;
use watchsync_core::sync;

use super::{render_record, render_watermark};

pub fn run(config: &Config) -> Result<()> {
    println!("{}", "Paths".bold());
    println!("  Dataset:    {}", config.paths.canonical_dataset.display());
    println!("  Watermark:  {}", config.paths.watermark.display());
    println!("  Log:        {}", config.paths.log_file.display());
    println!();

    let plan = sync::plan(config)?;

    println!("Watermark: {}", render_watermark(&plan.watermark));
    println!(
        "Dataset:   {} records ({} unreadable)",
        plan.loaded,
        plan.skipped.len()
    );

    if plan.batch.is_empty() {
        println!("Everything up to date.");
        return Ok(());
    }

    println!("Pending:   {}", plan.batch.len().to_string().green());
    for localized in &plan.batch.records {
        println!("{}", render_record(localized));
    }
    println!("\nRun `watchsync sync` to publish them.");

    Ok(())
}
