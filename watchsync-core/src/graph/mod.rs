//! Microsoft Graph: client-credentials token exchange and event creation.

mod event;

pub use event::{DateTimeTimeZone, EventTemplate, GraphEvent, ItemBody};

use std::fmt;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use crate::config::GraphSettings;
use crate::error::{SyncError, SyncResult};

/// Scope for app-only access to every Graph resource the app is granted.
pub const GRAPH_SCOPE: &str = "https://graph.microsoft.com/.default";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Bearer token for one run. Never persisted; `Debug` does not print it.
#[derive(Clone)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        AccessToken(token.into())
    }

    fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Deserialize)]
struct CreatedEvent {
    id: Option<String>,
}

pub struct GraphClient {
    http: Client,
    settings: GraphSettings,
}

impl GraphClient {
    pub fn new(settings: GraphSettings) -> SyncResult<Self> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(GraphClient { http, settings })
    }

    /// Exchange the app's client credentials for a bearer token.
    pub async fn acquire_token(&self) -> SyncResult<AccessToken> {
        tracing::info!(tenant = %self.settings.tenant_id, "obtaining access token");

        let response = self
            .http
            .post(self.settings.token_url())
            .form(&[
                ("client_id", self.settings.client_id.as_str()),
                ("scope", GRAPH_SCOPE),
                ("client_secret", self.settings.client_secret.as_str()),
                ("grant_type", "client_credentials"),
            ])
            .send()
            .await
            .map_err(|e| SyncError::Auth(format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(SyncError::Auth(format!(
                "Token endpoint returned {}: {}",
                status, error_text
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| SyncError::Auth(format!("Failed to parse token response: {}", e)))?;

        let token = body
            .access_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SyncError::Auth("Token response has no access_token".into()))?;

        tracing::info!(expires_in = body.expires_in, "access token obtained");
        Ok(AccessToken::new(token))
    }

    /// Create one calendar event. Returns the provider-assigned id when the
    /// response carries one.
    pub async fn create_event(
        &self,
        token: &AccessToken,
        event: &GraphEvent,
    ) -> SyncResult<Option<String>> {
        let response = self
            .http
            .post(self.settings.events_url())
            .bearer_auth(token.secret())
            .json(event)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(SyncError::Calendar(format!(
                "Event creation failed ({}): {}",
                status, error_text
            )));
        }

        let created: Option<CreatedEvent> = response.json().await.ok();
        Ok(created.and_then(|c| c.id))
    }
}
