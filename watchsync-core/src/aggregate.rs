//! Collapses playback sessions into one canonical record per title.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::record::{CanonicalWatchRecord, NormalizedRecord};

struct Group {
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
    duration_minutes: u32,
}

impl Group {
    fn new(record: &NormalizedRecord) -> Self {
        Group {
            start: record.playback_start,
            end: record.playback_end,
            duration_minutes: record.duration_minutes,
        }
    }

    fn absorb(&mut self, record: &NormalizedRecord) {
        self.start = self.start.min(record.playback_start);
        self.end = match (self.end, record.playback_end) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        self.duration_minutes = self.duration_minutes.max(record.duration_minutes);
    }
}

/// Group by title and reduce each group to a single record:
/// earliest start, latest end, longest duration.
///
/// The result is ordered by start, newest first. Records starting at the
/// same instant are ordered by title so the output is deterministic.
pub fn aggregate(records: &[NormalizedRecord]) -> Vec<CanonicalWatchRecord> {
    let mut groups: BTreeMap<&str, Group> = BTreeMap::new();

    for record in records {
        groups
            .entry(record.title.as_str())
            .and_modify(|group| group.absorb(record))
            .or_insert_with(|| Group::new(record));
    }

    let mut canonical: Vec<CanonicalWatchRecord> = groups
        .into_iter()
        .map(|(title, group)| {
            if group.end.is_none() {
                tracing::warn!(title, "no representable playback end, marking it invalid");
            }
            CanonicalWatchRecord {
                playback_start: group.start,
                playback_end: group.end.into(),
                title: title.to_string(),
                duration_minutes: group.duration_minutes,
            }
        })
        .collect();

    canonical.sort_by(|a, b| {
        b.playback_start
            .cmp(&a.playback_start)
            .then_with(|| a.title.cmp(&b.title))
    });

    canonical
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::end_of;
    use crate::record::PlaybackEnd;
    use chrono::TimeZone;
    use std::collections::HashSet;

    fn make_record(title: &str, day: u32, hour: u32, minutes: u32) -> NormalizedRecord {
        let start = Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap();
        NormalizedRecord {
            title: title.to_string(),
            playback_start: start,
            playback_end: end_of(start, minutes),
            duration_minutes: minutes,
        }
    }

    #[test]
    fn test_one_record_per_title() {
        let records = vec![
            make_record("A", 1, 10, 30),
            make_record("B", 2, 10, 5),
            make_record("A", 3, 10, 20),
            make_record("C", 1, 9, 45),
            make_record("B", 1, 8, 50),
        ];

        let canonical = aggregate(&records);
        let titles: HashSet<&str> = canonical.iter().map(|r| r.title.as_str()).collect();

        assert_eq!(canonical.len(), 3);
        assert_eq!(titles.len(), canonical.len(), "titles must be unique");
    }

    #[test]
    fn test_reduces_start_end_and_duration() {
        // Second session is shorter but ends later than the first.
        let records = vec![make_record("A", 1, 10, 90), make_record("A", 2, 10, 30)];

        let canonical = aggregate(&records);
        let a = &canonical[0];

        assert_eq!(a.playback_start, Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap());
        assert_eq!(
            a.playback_end,
            PlaybackEnd::At(Utc.with_ymd_and_hms(2024, 1, 2, 10, 30, 0).unwrap())
        );
        assert_eq!(a.duration_minutes, 90);
    }

    #[test]
    fn test_sorted_newest_first_with_title_tiebreak() {
        let records = vec![
            make_record("Old", 1, 10, 30),
            make_record("Zed", 5, 10, 30),
            make_record("Abe", 5, 10, 30),
            make_record("Mid", 3, 10, 30),
        ];

        let titles: Vec<String> = aggregate(&records).into_iter().map(|r| r.title).collect();
        assert_eq!(titles, vec!["Abe", "Zed", "Mid", "Old"]);
    }

    #[test]
    fn test_end_never_before_start() {
        let records = vec![
            make_record("A", 4, 23, 0),
            make_record("A", 1, 10, 5),
            make_record("B", 2, 10, 0),
        ];

        for record in aggregate(&records) {
            let end = record.playback_end.at().unwrap();
            assert!(end >= record.playback_start, "{:?}", record);
        }
    }

    #[test]
    fn test_group_without_end_is_marked_invalid() {
        let start = DateTime::<Utc>::MAX_UTC;
        let records = vec![NormalizedRecord {
            title: "Edge".to_string(),
            playback_start: start,
            playback_end: None,
            duration_minutes: 10,
        }];

        let canonical = aggregate(&records);
        assert_eq!(canonical.len(), 1);
        assert_eq!(canonical[0].playback_end, PlaybackEnd::Invalid);
    }

    #[test]
    fn test_empty_input() {
        assert!(aggregate(&[]).is_empty());
    }

    mod properties {
        use super::*;
        use crate::dataset::canonical_to_bytes;
        use proptest::prelude::*;

        const TITLES: [&str; 5] = ["Reacher", "Severance", "The Boys", "Fallout", "Invincible"];

        fn arb_record() -> impl Strategy<Value = NormalizedRecord> {
            (0..TITLES.len(), 0i64..60 * 24 * 90, 0u32..400).prop_map(|(title, offset, minutes)| {
                let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
                    + chrono::Duration::minutes(offset);
                NormalizedRecord {
                    title: TITLES[title].to_string(),
                    playback_start: start,
                    playback_end: end_of(start, minutes),
                    duration_minutes: minutes,
                }
            })
        }

        proptest! {
            #[test]
            fn test_titles_are_unique(records in prop::collection::vec(arb_record(), 0..40)) {
                let canonical = aggregate(&records);
                let titles: HashSet<&str> = canonical.iter().map(|r| r.title.as_str()).collect();

                prop_assert_eq!(titles.len(), canonical.len());
                let inputs: HashSet<&str> = records.iter().map(|r| r.title.as_str()).collect();
                prop_assert_eq!(titles, inputs);
            }

            #[test]
            fn test_end_not_before_start(records in prop::collection::vec(arb_record(), 0..40)) {
                for record in aggregate(&records) {
                    let end = record.playback_end.at();
                    prop_assert!(end.is_some_and(|end| end >= record.playback_start), "{:?}", record);
                }
            }

            #[test]
            fn test_output_is_independent_of_input_order(
                records in prop::collection::vec(arb_record(), 0..40)
            ) {
                let mut reversed = records.clone();
                reversed.reverse();

                let forward = canonical_to_bytes(&aggregate(&records)).unwrap();
                prop_assert_eq!(&forward, &canonical_to_bytes(&aggregate(&records)).unwrap());
                prop_assert_eq!(&forward, &canonical_to_bytes(&aggregate(&reversed)).unwrap());
            }
        }
    }
}
