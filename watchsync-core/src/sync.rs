//! Sync run: canonical dataset in, calendar events and a new watermark out.
//!
//! One run is strictly sequential: read the dataset, localize, read the
//! watermark, filter, then (only if the batch is non-empty) acquire a
//! token, publish and advance the watermark.

use crate::config::Config;
use crate::dataset;
use crate::error::SyncResult;
use crate::filter::{Batch, ChangeFilter};
use crate::graph::{EventTemplate, GraphClient};
use crate::localize::Localizer;
use crate::publish::{EventPublisher, PublishOutcome};
use crate::row::{Skip, log_skips};
use crate::watermark::{Watermark, WatermarkStore};

/// Everything decided before any external call is made.
#[derive(Debug, Clone)]
pub struct SyncPlan {
    /// Records read from the canonical dataset.
    pub loaded: usize,
    /// Rows dropped while reading or localizing the dataset.
    pub skipped: Vec<Skip>,
    pub watermark: Watermark,
    pub batch: Batch,
}

#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub selected: usize,
    pub outcome: PublishOutcome,
    /// The watermark written at the end of the run, if any.
    pub new_watermark: Option<Watermark>,
}

/// Read the dataset and watermark and compute the batch to publish.
pub fn plan(config: &Config) -> SyncResult<SyncPlan> {
    let localizer = Localizer::new(config.sync.display_zone()?);
    let filter = ChangeFilter::new(config.sync.min_duration_minutes);
    let store = WatermarkStore::new(&config.paths.watermark);

    let canonical = dataset::read_canonical(&config.paths.canonical_dataset)?;
    let loaded = canonical.total();
    tracing::info!(records = canonical.kept.len(), "CSV data loaded");

    let mut skipped = canonical.skipped;
    let localized = localizer.localize(canonical.kept);
    skipped.extend(localized.skipped);
    log_skips("load", &skipped);

    let watermark = store.read()?;
    let batch = filter.select(localized.kept, &watermark);

    Ok(SyncPlan {
        loaded,
        skipped,
        watermark,
        batch,
    })
}

/// Run one incremental sync.
///
/// A token failure aborts the run before anything is published or
/// written. Individual event failures do not: the watermark still
/// advances to the newest record in the batch.
pub async fn run(config: &Config) -> SyncResult<SyncReport> {
    let plan = plan(config)?;

    if plan.batch.is_empty() {
        tracing::info!("No new events to create.");
        return Ok(SyncReport::default());
    }

    let settings = config.graph()?.clone();
    let client = GraphClient::new(settings)?;
    let token = client.acquire_token().await?;

    let template = EventTemplate {
        subject_prefix: config.sync.subject_prefix.clone(),
        category: config.sync.category.clone(),
        time_zone: config.sync.timezone.clone(),
    };
    let publisher = EventPublisher::new(&client, &template, config.sync.publish_policy);
    let outcome = publisher.publish(&token, &plan.batch).await;

    let new_watermark = plan.batch.high_water();
    if let Some(watermark) = &new_watermark {
        WatermarkStore::new(&config.paths.watermark).write(watermark)?;
    }

    tracing::info!(
        selected = plan.batch.len(),
        published = outcome.published.len(),
        failed = outcome.failed.len(),
        not_attempted = outcome.not_attempted,
        "sync finished"
    );

    Ok(SyncReport {
        selected: plan.batch.len(),
        outcome,
        new_watermark,
    })
}
