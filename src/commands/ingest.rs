use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use watchsync_core::config::Config;
use watchsync_core::ingest;

pub fn run(config: &Config, input: Option<&Path>, output: Option<&Path>) -> Result<()> {
    let input = input.unwrap_or(&config.paths.raw_export);
    let output = output.unwrap_or(&config.paths.canonical_dataset);

    let report = ingest::run(input, output)
        .with_context(|| format!("Ingest of {} failed", input.display()))?;

    println!(
        "Read {} rows, wrote {} titles to {}",
        report.rows,
        report.records.to_string().green(),
        output.display()
    );
    if !report.skipped.is_empty() {
        println!(
            "{}",
            format!("Skipped {} rows (see log for reasons)", report.skipped.len()).yellow()
        );
    }

    Ok(())
}
