//! Publishes a filtered batch as calendar events.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::filter::Batch;
use crate::graph::{AccessToken, EventTemplate, GraphClient};
use crate::localize::LocalizedRecord;

/// How much of a batch one run publishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishPolicy {
    /// One event per selected record.
    #[default]
    All,
    /// Only the first selected record. The watermark still moves to the
    /// newest record in the batch, so the rest are never published.
    First,
}

impl PublishPolicy {
    /// The records this policy publishes, in batch order.
    pub fn select<'a>(&self, batch: &'a Batch) -> &'a [LocalizedRecord] {
        match self {
            PublishPolicy::All => &batch.records,
            PublishPolicy::First => &batch.records[..batch.records.len().min(1)],
        }
    }
}

impl fmt::Display for PublishPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishPolicy::All => f.write_str("all"),
            PublishPolicy::First => f.write_str("first"),
        }
    }
}

/// What happened to each record of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishOutcome {
    pub published: Vec<String>,
    pub failed: Vec<(String, String)>,
    /// Selected but left out by the publish policy.
    pub not_attempted: usize,
}

pub struct EventPublisher<'a> {
    client: &'a GraphClient,
    template: &'a EventTemplate,
    policy: PublishPolicy,
}

impl<'a> EventPublisher<'a> {
    pub fn new(client: &'a GraphClient, template: &'a EventTemplate, policy: PublishPolicy) -> Self {
        EventPublisher {
            client,
            template,
            policy,
        }
    }

    /// Create one event per record, one request at a time. A failed
    /// request is logged and the next record is still attempted.
    pub async fn publish(&self, token: &AccessToken, batch: &Batch) -> PublishOutcome {
        let records = self.policy.select(batch);
        let mut outcome = PublishOutcome {
            not_attempted: batch.len() - records.len(),
            ..Default::default()
        };

        if outcome.not_attempted > 0 {
            tracing::warn!(
                policy = ?self.policy,
                skipped = outcome.not_attempted,
                "publish policy leaves records unpublished"
            );
        }

        for localized in records {
            let title = &localized.record.title;
            let event = self.template.render(localized);

            match self.client.create_event(token, &event).await {
                Ok(id) => {
                    tracing::info!(
                        title = %title,
                        start = %event.start.date_time,
                        end = %event.end.date_time,
                        id = id.as_deref().unwrap_or(""),
                        "event created"
                    );
                    outcome.published.push(title.clone());
                }
                Err(e) => {
                    tracing::error!(title = %title, error = %e, "failed to create event");
                    outcome.failed.push((title.clone(), e.to_string()));
                }
            }
        }

        outcome
    }
}
