//! Change filter: picks the records that still need publishing.

use crate::localize::LocalizedRecord;
use crate::row::{Skip, SkipReason};
use crate::watermark::Watermark;

/// Sessions shorter than this are not worth a calendar entry.
pub const DEFAULT_MIN_DURATION_MINUTES: u32 = 10;

/// Records selected for one publish run, in dataset order.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    pub records: Vec<LocalizedRecord>,
    pub skipped: Vec<Skip>,
}

impl Batch {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Watermark for the newest record in the batch. When several records
    /// share the newest start, the first one in batch order wins.
    pub fn high_water(&self) -> Option<Watermark> {
        let newest = self.records.iter().fold(None, |best: Option<&LocalizedRecord>, rec| {
            match best {
                Some(b) if b.record.playback_start >= rec.record.playback_start => Some(b),
                _ => Some(rec),
            }
        })?;

        Some(Watermark::new(
            newest.record.playback_start.date_naive(),
            newest.record.title.clone(),
        ))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ChangeFilter {
    min_duration_minutes: u32,
}

impl Default for ChangeFilter {
    fn default() -> Self {
        ChangeFilter::new(DEFAULT_MIN_DURATION_MINUTES)
    }
}

impl ChangeFilter {
    pub fn new(min_duration_minutes: u32) -> Self {
        ChangeFilter {
            min_duration_minutes,
        }
    }

    /// Keep records that started on a UTC date strictly after the watermark
    /// date and lasted at least the minimum duration.
    ///
    /// Only records with a parsed start reach this stage; the dataset
    /// reader skips the others.
    pub fn select(&self, records: Vec<LocalizedRecord>, watermark: &Watermark) -> Batch {
        let mut batch = Batch::default();

        for (index, localized) in records.into_iter().enumerate() {
            let record = &localized.record;
            let started = record.playback_start.date_naive();

            let reason = if started <= watermark.date {
                Some(SkipReason::AlreadySynced {
                    started,
                    watermark: watermark.date,
                })
            } else if record.duration_minutes < self.min_duration_minutes {
                Some(SkipReason::TooShort {
                    actual: record.duration_minutes,
                    minimum: self.min_duration_minutes,
                })
            } else {
                None
            };

            match reason {
                Some(reason) => batch
                    .skipped
                    .push(Skip::new(index + 1, Some(&record.title), reason)),
                None => batch.records.push(localized),
            }
        }

        tracing::info!(
            selected = batch.records.len(),
            filtered = batch.skipped.len(),
            watermark = %watermark.date,
            "filtered records newer than watermark"
        );

        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::localize::Localizer;
    use crate::normalize::end_of;
    use crate::record::CanonicalWatchRecord;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn make_record(title: &str, day: u32, hour: u32, minutes: u32) -> LocalizedRecord {
        let start = Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap();
        LocalizedRecord {
            record: CanonicalWatchRecord {
                playback_start: start,
                playback_end: end_of(start, minutes).into(),
                title: title.to_string(),
                duration_minutes: minutes,
            },
            interval: Localizer::default().interval(start, minutes).unwrap(),
        }
    }

    fn watermark_on(day: u32) -> Watermark {
        Watermark::new(NaiveDate::from_ymd_opt(2024, 1, day).unwrap(), "prev")
    }

    fn titles(batch: &Batch) -> Vec<&str> {
        batch.records.iter().map(|r| r.record.title.as_str()).collect()
    }

    #[test]
    fn test_below_minimum_never_selected() {
        let batch = ChangeFilter::default().select(
            vec![make_record("Nine", 5, 10, 9), make_record("Ten", 5, 11, 10)],
            &Watermark::default(),
        );

        assert_eq!(titles(&batch), vec!["Ten"]);
        assert_eq!(
            batch.skipped[0].reason,
            SkipReason::TooShort {
                actual: 9,
                minimum: 10
            }
        );
    }

    #[test]
    fn test_watermark_date_is_exclusive() {
        let batch = ChangeFilter::default().select(
            vec![
                make_record("Before", 9, 10, 30),
                make_record("Same day", 10, 23, 30),
                make_record("Next day", 11, 0, 30),
            ],
            &watermark_on(10),
        );

        assert_eq!(titles(&batch), vec!["Next day"]);
        assert_eq!(batch.skipped.len(), 2);
    }

    #[test]
    fn test_uses_utc_date_not_local_date() {
        // 03:00 UTC on the 11th is still the 10th in New York.
        let batch = ChangeFilter::default()
            .select(vec![make_record("Late show", 11, 3, 30)], &watermark_on(10));

        assert_eq!(titles(&batch), vec!["Late show"]);
    }

    #[test]
    fn test_default_watermark_selects_everything_long_enough() {
        let batch = ChangeFilter::default().select(
            vec![make_record("A", 1, 10, 30), make_record("B", 2, 10, 5)],
            &Watermark::default(),
        );

        assert_eq!(titles(&batch), vec!["A"]);
    }

    #[test]
    fn test_custom_minimum() {
        let batch = ChangeFilter::new(0).select(vec![make_record("Zero", 2, 10, 0)], &watermark_on(1));
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn test_high_water_picks_newest_start() {
        let batch = ChangeFilter::default().select(
            vec![
                make_record("Middle", 3, 10, 30),
                make_record("Newest", 4, 8, 30),
                make_record("Oldest", 2, 10, 30),
            ],
            &Watermark::default(),
        );

        let high_water = batch.high_water().unwrap();
        assert_eq!(high_water.date, NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
        assert_eq!(high_water.title, "Newest");
    }

    #[test]
    fn test_high_water_tie_keeps_first() {
        let batch = ChangeFilter::default().select(
            vec![make_record("First", 4, 8, 30), make_record("Second", 4, 8, 45)],
            &Watermark::default(),
        );

        assert_eq!(batch.high_water().unwrap().title, "First");
    }

    #[test]
    fn test_empty_batch_has_no_high_water() {
        let batch = ChangeFilter::default().select(vec![], &Watermark::default());
        assert!(batch.is_empty());
        assert_eq!(batch.high_water(), None);
    }
}
