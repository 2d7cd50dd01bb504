//! Cleans raw playback rows into typed records.

use chrono::{DateTime, Duration, Utc};

use crate::record::{NormalizedRecord, RawPlaybackRecord, parse_timestamp};
use crate::row::{RowOutcome, RowReport, Skip, SkipReason};

/// Title the export uses for sessions it could not attribute.
pub const UNAVAILABLE_TITLE: &str = "Not available";

/// Normalize a batch of raw rows. Row numbers in the report are 1-based
/// data rows (the header is not counted).
pub fn normalize<I>(rows: I) -> RowReport<NormalizedRecord>
where
    I: IntoIterator<Item = RawPlaybackRecord>,
{
    rows.into_iter()
        .enumerate()
        .map(|(index, raw)| normalize_row(index + 1, raw))
        .collect()
}

pub fn normalize_row(row: usize, raw: RawPlaybackRecord) -> RowOutcome<NormalizedRecord> {
    if raw.is_blank() {
        return RowOutcome::Skipped(Skip::new(row, None, SkipReason::Blank));
    }

    let title = raw
        .title
        .as_deref()
        .map(clean_title)
        .filter(|t| !t.is_empty());
    let Some(title) = title else {
        return RowOutcome::Skipped(Skip::new(row, None, SkipReason::MissingTitle));
    };
    if title == UNAVAILABLE_TITLE {
        return RowOutcome::Skipped(Skip::new(row, Some(&title), SkipReason::Unavailable));
    }

    let skip = |reason| RowOutcome::Skipped(Skip::new(row, Some(&title), reason));

    let playback_start = match raw.playback_start.as_deref().map(str::trim) {
        None | Some("") => return skip(SkipReason::MissingStart),
        Some(value) => match parse_timestamp(value) {
            Some(dt) => dt,
            None => return skip(SkipReason::InvalidStart(value.to_string())),
        },
    };

    let duration_minutes = match raw.seconds_viewed.as_deref().map(str::trim) {
        None | Some("") => return skip(SkipReason::MissingDuration),
        Some(value) => match parse_seconds(value).and_then(minutes_from_seconds) {
            Some(minutes) => minutes,
            None => return skip(SkipReason::InvalidDuration(value.to_string())),
        },
    };

    RowOutcome::Kept(NormalizedRecord {
        playback_end: end_of(playback_start, duration_minutes),
        title,
        playback_start,
        duration_minutes,
    })
}

/// Strip the quote characters some exports leave around titles.
pub fn clean_title(raw: &str) -> String {
    raw.trim().trim_matches('"').trim().to_string()
}

/// `start + minutes`, or `None` if the result is not representable.
pub fn end_of(start: DateTime<Utc>, duration_minutes: u32) -> Option<DateTime<Utc>> {
    start.checked_add_signed(Duration::minutes(i64::from(duration_minutes)))
}

/// Seconds viewed, accepting integer or float notation ("95", "95.0").
fn parse_seconds(value: &str) -> Option<u64> {
    if let Ok(seconds) = value.parse::<u64>() {
        return Some(seconds);
    }

    let seconds = value.parse::<f64>().ok()?;
    if !seconds.is_finite() || seconds < 0.0 || seconds > u64::MAX as f64 {
        return None;
    }
    Some(seconds.ceil() as u64)
}

/// Whole minutes, rounded up. Zero seconds stays zero.
fn minutes_from_seconds(seconds: u64) -> Option<u32> {
    u32::try_from(seconds.div_ceil(60)).ok()
}
