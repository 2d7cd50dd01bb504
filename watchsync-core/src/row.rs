//! Per-row outcomes.
//!
//! Stages that process a batch never fail as a whole because of one bad
//! row. Each row either survives or is skipped with a [`SkipReason`], and
//! the skips are collected so callers can count and log them.

use chrono::NaiveDate;
use thiserror::Error;

/// Why a row was left out of a stage's output.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    #[error("blank row")]
    Blank,

    #[error("malformed row: {0}")]
    Malformed(String),

    #[error("missing title")]
    MissingTitle,

    #[error("title is the \"Not available\" placeholder")]
    Unavailable,

    #[error("missing playback start")]
    MissingStart,

    #[error("unparseable playback start '{0}'")]
    InvalidStart(String),

    #[error("missing duration")]
    MissingDuration,

    #[error("invalid duration '{0}'")]
    InvalidDuration(String),

    #[error("interval cannot be represented in {0}")]
    OutOfRange(String),

    #[error("duration {actual} min is below the {minimum} min minimum")]
    TooShort { actual: u32, minimum: u32 },

    #[error("started {started}, not after watermark {watermark}")]
    AlreadySynced {
        started: NaiveDate,
        watermark: NaiveDate,
    },
}

/// A skipped row: 1-based position in the stage's input, plus the title
/// when one was readable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skip {
    pub row: usize,
    pub title: Option<String>,
    pub reason: SkipReason,
}

impl Skip {
    pub fn new(row: usize, title: Option<&str>, reason: SkipReason) -> Self {
        Skip {
            row,
            title: title.map(str::to_string),
            reason,
        }
    }
}

/// Result of processing a single row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome<T> {
    Kept(T),
    Skipped(Skip),
}

/// Rows that survived a stage, and the ones that did not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowReport<T> {
    pub kept: Vec<T>,
    pub skipped: Vec<Skip>,
}

impl<T> Default for RowReport<T> {
    fn default() -> Self {
        RowReport {
            kept: Vec::new(),
            skipped: Vec::new(),
        }
    }
}

impl<T> RowReport<T> {
    pub fn total(&self) -> usize {
        self.kept.len() + self.skipped.len()
    }

    /// Number of skips matching a predicate, e.g. `|r| matches!(r, SkipReason::Blank)`.
    pub fn skipped_where(&self, predicate: impl Fn(&SkipReason) -> bool) -> usize {
        self.skipped.iter().filter(|s| predicate(&s.reason)).count()
    }
}

impl<T> FromIterator<RowOutcome<T>> for RowReport<T> {
    fn from_iter<I: IntoIterator<Item = RowOutcome<T>>>(iter: I) -> Self {
        let mut report = RowReport::default();
        for outcome in iter {
            match outcome {
                RowOutcome::Kept(value) => report.kept.push(value),
                RowOutcome::Skipped(skip) => report.skipped.push(skip),
            }
        }
        report
    }
}

/// Emit one warning per skipped row.
pub fn log_skips(stage: &str, skips: &[Skip]) {
    for skip in skips {
        tracing::warn!(
            stage,
            row = skip.row,
            title = skip.title.as_deref().unwrap_or(""),
            reason = %skip.reason,
            "row skipped"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_outcomes_in_order() {
        let report: RowReport<u32> = vec![
            RowOutcome::Kept(1),
            RowOutcome::Skipped(Skip::new(2, None, SkipReason::Blank)),
            RowOutcome::Kept(3),
            RowOutcome::Skipped(Skip::new(4, Some("X"), SkipReason::MissingStart)),
        ]
        .into_iter()
        .collect();

        assert_eq!(report.kept, vec![1, 3]);
        assert_eq!(report.total(), 4);
        assert_eq!(report.skipped_where(|r| matches!(r, SkipReason::Blank)), 1);
        assert_eq!(report.skipped[1].title.as_deref(), Some("X"));
    }

    #[test]
    fn test_skip_reason_messages() {
        let reason = SkipReason::TooShort {
            actual: 9,
            minimum: 10,
        };
        assert_eq!(reason.to_string(), "duration 9 min is below the 10 min minimum");
    }
}
