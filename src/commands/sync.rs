use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use watchsync_core::config::Config;
use watchsync_core::sync;

use super::{render_record, render_watermark};

pub async fn run(config: &Config, dry_run: bool) -> Result<()> {
    if dry_run {
        let plan = sync::plan(config)?;
        println!("Watermark: {}", render_watermark(&plan.watermark));

        if plan.batch.is_empty() {
            println!("No new events to create.");
            return Ok(());
        }

        println!("Would publish (publish_policy = \"{}\"):", config.sync.publish_policy);
        for localized in config.sync.publish_policy.select(&plan.batch) {
            println!("{}", render_record(localized));
        }
        if let Some(next) = plan.batch.high_water() {
            println!("Watermark would move to: {}", render_watermark(&next));
        }
        return Ok(());
    }

    let report = sync::run(config).await.context("Sync failed")?;

    if report.selected == 0 {
        println!("No new events to create.");
        return Ok(());
    }

    let outcome = &report.outcome;
    for title in &outcome.published {
        println!("   {} {}", "+".green(), title);
    }
    for (title, error) in &outcome.failed {
        println!("   {} {}: {}", "!".red(), title, error.red());
    }

    println!(
        "\nPublished {} of {} selected, {} failed",
        outcome.published.len(),
        report.selected,
        outcome.failed.len()
    );
    if outcome.not_attempted > 0 {
        println!(
            "{}",
            format!(
                "{} records were not published under publish_policy = \"{}\"",
                outcome.not_attempted, config.sync.publish_policy
            )
            .yellow()
        );
    }
    if let Some(watermark) = &report.new_watermark {
        println!("Watermark: {}", render_watermark(watermark));
    }

    Ok(())
}
