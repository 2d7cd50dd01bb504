//! Ingest run: raw export in, canonical dataset out.

use std::path::Path;

use crate::aggregate::aggregate;
use crate::dataset;
use crate::error::SyncResult;
use crate::normalize::normalize;
use crate::row::{Skip, log_skips};

#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// Rows read from the export, including the ones later skipped.
    pub rows: usize,
    pub skipped: Vec<Skip>,
    /// Distinct titles written to the canonical dataset.
    pub records: usize,
}

/// Normalize and aggregate `input`, replacing the dataset at `output`.
pub fn run(input: &Path, output: &Path) -> SyncResult<IngestReport> {
    tracing::info!(input = %input.display(), "reading viewing history export");

    let raw = dataset::read_raw_export(input)?;
    let rows = raw.total();
    let mut skipped = raw.skipped;

    let normalized = normalize(raw.kept);
    skipped.extend(normalized.skipped);
    log_skips("ingest", &skipped);

    let records = aggregate(&normalized.kept);
    dataset::write_canonical(output, &records)?;

    tracing::info!(
        rows,
        skipped = skipped.len(),
        records = records.len(),
        output = %output.display(),
        "canonical dataset written"
    );

    Ok(IngestReport {
        rows,
        skipped,
        records: records.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::SkipReason;
    use tempfile::TempDir;

    #[test]
    fn test_ingest_writes_dataset() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("export.csv");
        let output = dir.path().join("out/clean.csv");
        std::fs::write(
            &input,
            "\
Title,Playback Start Datetime (UTC),Seconds Viewed
A,2024-01-01 10:00:00.000,600
A,2024-01-01 12:00:00.000,1200
Not available,2024-01-01 13:00:00.000,1200
,,
B,2023-12-31 10:00:00.000,60
",
        )
        .unwrap();

        let report = run(&input, &output).unwrap();

        assert_eq!(report.rows, 5);
        assert_eq!(report.records, 2);
        assert_eq!(report.skipped.len(), 2);
        assert!(report.skipped.iter().any(|s| s.reason == SkipReason::Unavailable));
        assert_eq!(
            std::fs::read_to_string(&output).unwrap(),
            "\
Playback Start Datetime (UTC),Playback End Datetime (UTC),Title,Duration Minutes
2024-01-01 10:00:00,2024-01-01 12:20:00,A,20
2023-12-31 10:00:00,2023-12-31 10:01:00,B,1
"
        );
    }

    #[test]
    fn test_missing_export_is_fatal() {
        let dir = TempDir::new().unwrap();
        let result = run(&dir.path().join("nope.csv"), &dir.path().join("out.csv"));
        assert!(result.is_err());
        assert!(!dir.path().join("out.csv").exists());
    }
}
