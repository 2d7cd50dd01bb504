use anyhow::{Context, Result};
use chrono::NaiveDate;
use watchsync_core::config::Config;
use watchsync_core::watermark::{Watermark, WatermarkStore};

use super::render_watermark;

pub fn show(config: &Config) -> Result<()> {
    let store = WatermarkStore::new(&config.paths.watermark);
    let watermark = store.read()?;

    println!("{}", render_watermark(&watermark));
    Ok(())
}

pub fn set(config: &Config, date: &str, title: &str) -> Result<()> {
    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", date))?;

    let store = WatermarkStore::new(&config.paths.watermark);
    let previous = store.read()?;
    if date < previous.date {
        tracing::warn!(from = %previous.date, to = %date, "moving watermark backwards");
    }

    let watermark = Watermark::new(date, title);
    store.write(&watermark)?;

    println!("Watermark: {}", render_watermark(&watermark));
    Ok(())
}

pub fn reset(config: &Config) -> Result<()> {
    let store = WatermarkStore::new(&config.paths.watermark);

    if store.clear()? {
        println!("Watermark removed; the next sync publishes every record.");
    } else {
        println!("No watermark stored at {}", store.path().display());
    }
    Ok(())
}
