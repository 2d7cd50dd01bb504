//! Watermark store: the date and title of the newest published record.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Watermark {
    pub date: NaiveDate,
    pub title: String,
}

impl Default for Watermark {
    /// Earliest possible date, so every record counts as new.
    fn default() -> Self {
        Watermark {
            date: NaiveDate::MIN,
            title: String::new(),
        }
    }
}

impl Watermark {
    pub fn new(date: NaiveDate, title: impl Into<String>) -> Self {
        Watermark {
            date,
            title: title.into(),
        }
    }

    /// True when nothing has been published yet.
    pub fn is_initial(&self) -> bool {
        self.date == NaiveDate::MIN
    }
}

#[derive(Serialize, Deserialize)]
struct WatermarkRow {
    last_event_date: String,
    #[serde(default)]
    last_event_title: Option<String>,
}

/// Single-row CSV file holding the current [`Watermark`].
#[derive(Debug, Clone)]
pub struct WatermarkStore {
    path: PathBuf,
}

impl WatermarkStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        WatermarkStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current watermark, or the default when the file is missing or has
    /// no data row. A row that cannot be parsed is an error.
    pub fn read(&self) -> SyncResult<Watermark> {
        if !self.path.exists() {
            tracing::warn!(path = %self.path.display(), "watermark file not found, using default date");
            return Ok(Watermark::default());
        }

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)?;

        let Some(row) = reader.deserialize::<WatermarkRow>().next() else {
            tracing::warn!(path = %self.path.display(), "watermark file is empty, using default date");
            return Ok(Watermark::default());
        };

        let row = row.map_err(|e| {
            SyncError::Watermark(format!("Unreadable watermark in {}: {}", self.path.display(), e))
        })?;

        let date = NaiveDate::parse_from_str(row.last_event_date.trim(), DATE_FORMAT).map_err(|e| {
            SyncError::Watermark(format!(
                "Invalid last_event_date '{}' in {}: {}",
                row.last_event_date,
                self.path.display(),
                e
            ))
        })?;

        let watermark = Watermark::new(date, row.last_event_title.unwrap_or_default());
        tracing::info!(date = %watermark.date, title = %watermark.title, "last event date retrieved");
        Ok(watermark)
    }

    /// Replace the stored watermark with exactly one row.
    ///
    /// The new content goes to a temporary file next to the target and is
    /// renamed over it, so readers see either the old row or the new one.
    pub fn write(&self, watermark: &Watermark) -> SyncResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        {
            let mut writer = csv::Writer::from_writer(tmp.as_file_mut());
            writer.serialize(WatermarkRow {
                last_event_date: watermark.date.format(DATE_FORMAT).to_string(),
                last_event_title: Some(watermark.title.clone()),
            })?;
            writer.flush()?;
        }
        tmp.as_file_mut().sync_all()?;

        tmp.persist(&self.path).map_err(|e| SyncError::Io(e.error))?;

        tracing::info!(date = %watermark.date, title = %watermark.title, "updated last event log");
        Ok(())
    }

    /// Remove the stored watermark so the next run treats everything as new.
    pub fn clear(&self) -> SyncResult<bool> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
