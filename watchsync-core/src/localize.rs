//! Converts canonical UTC records into wall-clock intervals in the display
//! timezone.

use chrono::{DateTime, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

use crate::normalize::end_of;
use crate::record::{CanonicalWatchRecord, TIMESTAMP_FORMAT};
use crate::row::{RowOutcome, RowReport, Skip, SkipReason};

pub const DEFAULT_DISPLAY_TIMEZONE: Tz = chrono_tz::America::New_York;

/// Start and end of a viewing session on the display timezone's clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalizedInterval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl LocalizedInterval {
    pub fn start_string(&self) -> String {
        self.start.format(TIMESTAMP_FORMAT).to_string()
    }

    pub fn end_string(&self) -> String {
        self.end.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// A canonical record with its interval attached for the current run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalizedRecord {
    pub record: CanonicalWatchRecord,
    pub interval: LocalizedInterval,
}

#[derive(Debug, Clone, Copy)]
pub struct Localizer {
    zone: Tz,
}

impl Default for Localizer {
    fn default() -> Self {
        Localizer::new(DEFAULT_DISPLAY_TIMEZONE)
    }
}

impl Localizer {
    pub fn new(zone: Tz) -> Self {
        Localizer { zone }
    }

    pub fn zone(&self) -> Tz {
        self.zone
    }

    /// End is start + duration, not the stored playback end.
    pub fn interval(
        &self,
        start: DateTime<Utc>,
        duration_minutes: u32,
    ) -> Result<LocalizedInterval, SkipReason> {
        let out_of_range = || SkipReason::OutOfRange(self.zone.name().to_string());
        let end = end_of(start, duration_minutes).ok_or_else(out_of_range)?;

        Ok(LocalizedInterval {
            start: self.wall_clock(start).ok_or_else(out_of_range)?,
            end: self.wall_clock(end).ok_or_else(out_of_range)?,
        })
    }

    /// Local time for `instant`, or `None` when the offset pushes it past
    /// the representable range.
    fn wall_clock(&self, instant: DateTime<Utc>) -> Option<NaiveDateTime> {
        let offset = self.zone.offset_from_utc_datetime(&instant.naive_utc()).fix();
        instant.naive_utc().checked_add_offset(offset)
    }

    /// Localize every record. Failures are logged and skipped; the rest of
    /// the batch is still processed.
    pub fn localize(&self, records: Vec<CanonicalWatchRecord>) -> RowReport<LocalizedRecord> {
        tracing::info!(zone = self.zone.name(), records = records.len(), "adjusting timezones");

        records
            .into_iter()
            .enumerate()
            .map(|(index, record)| {
                match self.interval(record.playback_start, record.duration_minutes) {
                    Ok(interval) => RowOutcome::Kept(LocalizedRecord { record, interval }),
                    Err(reason) => {
                        tracing::error!(row = index + 1, title = %record.title, %reason, "error adjusting times");
                        RowOutcome::Skipped(Skip::new(index + 1, Some(&record.title), reason))
                    }
                }
            })
            .collect()
    }
}
