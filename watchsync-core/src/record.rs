//! Record types flowing through the pipeline.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

/// Timestamp layout used by every file watchsync reads or writes.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Marker written in place of a playback end that could not be computed.
pub const INVALID_END_MARKER: &str = "error";

/// One row of the viewing history export, exactly as read.
///
/// Every field is optional because exports contain blank and partial rows;
/// validation happens in [`crate::normalize`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawPlaybackRecord {
    #[serde(rename = "Title", default)]
    pub title: Option<String>,

    #[serde(rename = "Playback Start Datetime (UTC)", default)]
    pub playback_start: Option<String>,

    #[serde(rename = "Seconds Viewed", default)]
    pub seconds_viewed: Option<String>,
}

impl RawPlaybackRecord {
    pub fn is_blank(&self) -> bool {
        [&self.title, &self.playback_start, &self.seconds_viewed]
            .iter()
            .all(|field| field.as_deref().is_none_or(|v| v.trim().is_empty()))
    }
}

/// A single playback session after cleaning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRecord {
    pub title: String,
    pub playback_start: DateTime<Utc>,
    /// `None` when start + duration is not representable.
    pub playback_end: Option<DateTime<Utc>>,
    pub duration_minutes: u32,
}

/// End of a canonical record's playback window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEnd {
    At(DateTime<Utc>),
    Invalid,
}

impl PlaybackEnd {
    pub fn at(&self) -> Option<DateTime<Utc>> {
        match self {
            PlaybackEnd::At(dt) => Some(*dt),
            PlaybackEnd::Invalid => None,
        }
    }

    /// Parse a stored end column. Anything that is not a timestamp,
    /// including the `error` marker, reads back as invalid.
    pub fn parse(value: &str) -> Self {
        match parse_timestamp(value) {
            Some(dt) => PlaybackEnd::At(dt),
            None => PlaybackEnd::Invalid,
        }
    }
}

impl From<Option<DateTime<Utc>>> for PlaybackEnd {
    fn from(value: Option<DateTime<Utc>>) -> Self {
        value.map_or(PlaybackEnd::Invalid, PlaybackEnd::At)
    }
}

impl fmt::Display for PlaybackEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaybackEnd::At(dt) => write!(f, "{}", dt.format(TIMESTAMP_FORMAT)),
            PlaybackEnd::Invalid => f.write_str(INVALID_END_MARKER),
        }
    }
}

/// The single deduplicated record kept per title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalWatchRecord {
    pub playback_start: DateTime<Utc>,
    pub playback_end: PlaybackEnd,
    pub title: String,
    /// Longest single session, not the start/end span.
    pub duration_minutes: u32,
}

/// Parse a UTC timestamp, dropping any fractional-seconds suffix first.
///
/// Accepts `YYYY-MM-DD HH:MM:SS` and the `T`-separated variant, with an
/// optional trailing `Z` or ` UTC`.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    let value = value
        .strip_suffix(" UTC")
        .or_else(|| value.strip_suffix('Z'))
        .unwrap_or(value);
    let whole_seconds = value.split_once('.').map_or(value, |(whole, _)| whole);

    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(whole_seconds, fmt).ok())
        .map(|naive| naive.and_utc())
}

pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}
