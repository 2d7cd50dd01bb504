//! CSV files: the raw viewing history export and the canonical dataset.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};
use crate::record::{
    CanonicalWatchRecord, PlaybackEnd, RawPlaybackRecord, format_timestamp, parse_timestamp,
};
use crate::row::{RowOutcome, RowReport, Skip, SkipReason};

const START_COLUMN: &str = "Playback Start Datetime (UTC)";
const END_COLUMN: &str = "Playback End Datetime (UTC)";
const TITLE_COLUMN: &str = "Title";
const DURATION_COLUMN: &str = "Duration Minutes";

#[derive(Serialize)]
struct CanonicalRow<'a> {
    #[serde(rename = "Playback Start Datetime (UTC)")]
    playback_start: String,
    #[serde(rename = "Playback End Datetime (UTC)")]
    playback_end: String,
    #[serde(rename = "Title")]
    title: &'a str,
    #[serde(rename = "Duration Minutes")]
    duration_minutes: u32,
}

#[derive(Deserialize)]
struct StoredCanonicalRow {
    #[serde(rename = "Playback Start Datetime (UTC)", default)]
    playback_start: Option<String>,
    #[serde(rename = "Playback End Datetime (UTC)", default)]
    playback_end: Option<String>,
    #[serde(rename = "Title", default)]
    title: Option<String>,
    #[serde(rename = "Duration Minutes", default)]
    duration_minutes: Option<String>,
}

fn open(path: &Path, what: &str) -> SyncResult<File> {
    File::open(path).map_err(|e| {
        SyncError::Dataset(format!("Could not open {} at {}: {}", what, path.display(), e))
    })
}

fn reader<R: Read>(input: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(input)
}

/// Read the raw export. Fails only if the file cannot be opened or has no
/// header; individual malformed rows are reported as skips.
pub fn read_raw_export(path: &Path) -> SyncResult<RowReport<RawPlaybackRecord>> {
    read_raw_from(open(path, "viewing history export")?)
}

pub fn read_raw_from<R: Read>(input: R) -> SyncResult<RowReport<RawPlaybackRecord>> {
    let mut reader = reader(input);
    let headers = reader.headers()?.clone();

    for column in [TITLE_COLUMN, START_COLUMN, "Seconds Viewed"] {
        if !headers.iter().any(|h| h == column) {
            tracing::warn!(column, "export is missing an expected column");
        }
    }

    Ok(reader
        .deserialize::<RawPlaybackRecord>()
        .enumerate()
        .map(|(index, row)| match row {
            Ok(raw) => RowOutcome::Kept(raw),
            Err(e) => RowOutcome::Skipped(Skip::new(
                index + 1,
                None,
                SkipReason::Malformed(e.to_string()),
            )),
        })
        .collect())
}

/// Serialize canonical records with a header row, in the given order.
pub fn write_canonical_to<W: Write>(output: W, records: &[CanonicalWatchRecord]) -> SyncResult<()> {
    let mut writer = csv::Writer::from_writer(output);

    if records.is_empty() {
        writer.write_record([START_COLUMN, END_COLUMN, TITLE_COLUMN, DURATION_COLUMN])?;
    }

    for record in records {
        writer.serialize(CanonicalRow {
            playback_start: format_timestamp(&record.playback_start),
            playback_end: record.playback_end.to_string(),
            title: &record.title,
            duration_minutes: record.duration_minutes,
        })?;
    }

    writer.flush()?;
    Ok(())
}

pub fn canonical_to_bytes(records: &[CanonicalWatchRecord]) -> SyncResult<Vec<u8>> {
    let mut buffer = Vec::new();
    write_canonical_to(&mut buffer, records)?;
    Ok(buffer)
}

/// Replace the canonical dataset at `path`.
pub fn write_canonical(path: &Path, records: &[CanonicalWatchRecord]) -> SyncResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let file = File::create(path).map_err(|e| {
        SyncError::Dataset(format!(
            "Could not write canonical dataset at {}: {}",
            path.display(),
            e
        ))
    })?;
    write_canonical_to(file, records)
}

/// Read the canonical dataset for a sync run.
///
/// Rows without a title, start or duration are skipped. An unreadable end
/// (including the `error` marker) is kept as [`PlaybackEnd::Invalid`].
pub fn read_canonical(path: &Path) -> SyncResult<RowReport<CanonicalWatchRecord>> {
    read_canonical_from(open(path, "canonical dataset")?)
}

pub fn read_canonical_from<R: Read>(input: R) -> SyncResult<RowReport<CanonicalWatchRecord>> {
    let mut reader = reader(input);
    reader.headers()?;

    Ok(reader
        .deserialize::<StoredCanonicalRow>()
        .enumerate()
        .map(|(index, row)| match row {
            Ok(stored) => canonical_row(index + 1, stored),
            Err(e) => RowOutcome::Skipped(Skip::new(
                index + 1,
                None,
                SkipReason::Malformed(e.to_string()),
            )),
        })
        .collect())
}

fn canonical_row(row: usize, stored: StoredCanonicalRow) -> RowOutcome<CanonicalWatchRecord> {
    let fields = [
        &stored.playback_start,
        &stored.playback_end,
        &stored.title,
        &stored.duration_minutes,
    ];
    if fields
        .iter()
        .all(|f| f.as_deref().is_none_or(|v| v.trim().is_empty()))
    {
        return RowOutcome::Skipped(Skip::new(row, None, SkipReason::Blank));
    }

    let Some(title) = stored.title.filter(|t| !t.trim().is_empty()) else {
        return RowOutcome::Skipped(Skip::new(row, None, SkipReason::MissingTitle));
    };
    let skip = |reason| RowOutcome::Skipped(Skip::new(row, Some(&title), reason));

    let playback_start = match stored.playback_start.as_deref().map(str::trim) {
        None | Some("") => return skip(SkipReason::MissingStart),
        Some(value) => match parse_timestamp(value) {
            Some(dt) => dt,
            None => return skip(SkipReason::InvalidStart(value.to_string())),
        },
    };

    let duration_minutes = match stored.duration_minutes.as_deref().map(str::trim) {
        None | Some("") => return skip(SkipReason::MissingDuration),
        Some(value) => match parse_minutes(value) {
            Some(minutes) => minutes,
            None => return skip(SkipReason::InvalidDuration(value.to_string())),
        },
    };

    let playback_end = stored
        .playback_end
        .as_deref()
        .map_or(PlaybackEnd::Invalid, PlaybackEnd::parse);

    RowOutcome::Kept(CanonicalWatchRecord {
        playback_start,
        playback_end,
        title,
        duration_minutes,
    })
}

/// Whole minutes; tolerates a `.0` suffix from spreadsheet round-trips.
fn parse_minutes(value: &str) -> Option<u32> {
    let value = value.strip_suffix(".0").unwrap_or(value);
    value.parse().ok()
}
