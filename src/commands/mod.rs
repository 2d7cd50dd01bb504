pub mod config;
pub mod ingest;
pub mod status;
pub mod sync;
pub mod watermark;

use owo_colors::OwoColorize;
use watchsync_core::localize::LocalizedRecord;
use watchsync_core::watermark::Watermark;

/// One line per record: local start, duration and title.
pub fn render_record(localized: &LocalizedRecord) -> String {
    format!(
        "   {}  {:>4} min  {}",
        localized.interval.start_string().dimmed(),
        localized.record.duration_minutes,
        localized.record.title
    )
}

pub fn render_watermark(watermark: &Watermark) -> String {
    if watermark.is_initial() {
        return "none (every record counts as new)".dimmed().to_string();
    }
    if watermark.title.is_empty() {
        return watermark.date.to_string();
    }
    format!("{} ({})", watermark.date, watermark.title)
}
