//! Webhook payloads and their delivery.
//!
//! Payloads are posted as JSON text without a JSON content type so browsers
//! embedding the same endpoint never need a preflight. Responses are not read.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::WebhookError;
use crate::quiz::accumulator::TrailEntry;
use crate::quiz::state::{ContactRecord, Flags, Scores};

/// Body of a webhook POST.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WebhookPayload {
    /// Contact stage committed.
    Lead {
        quiz_id: String,
        contact: ContactRecord,
        trail: Vec<TrailEntry>,
        flags: Flags,
        page: Option<String>,
        ts: DateTime<Utc>,
    },
    /// Run reached its result.
    Completion {
        quiz_id: String,
        result_id: String,
        result_label: String,
        scores: Scores,
        flags: Flags,
        trail: Vec<TrailEntry>,
        contact: Option<ContactRecord>,
        page: Option<String>,
        ts: DateTime<Utc>,
    },
}

impl WebhookPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Lead { .. } => "lead",
            Self::Completion { .. } => "completion",
        }
    }
}

/// A payload queued for a specific webhook URL.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub url: String,
    pub payload: WebhookPayload,
}

/// Sends one payload to one URL. One attempt, no retry.
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    async fn deliver(&self, url: &str, payload: &WebhookPayload) -> Result<(), WebhookError>;
}

/// reqwest-backed transport.
#[derive(Debug, Clone, Default)]
pub struct HttpWebhook {
    client: reqwest::Client,
}

impl HttpWebhook {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl WebhookTransport for HttpWebhook {
    async fn deliver(&self, url: &str, payload: &WebhookPayload) -> Result<(), WebhookError> {
        let body = serde_json::to_string(payload)?;
        let response = self
            .client
            .post(url)
            .body(body)
            .send()
            .await
            .map_err(|e| WebhookError::Request {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        tracing::debug!(
            url = %url,
            kind = payload.kind(),
            status = %response.status(),
            "Webhook delivered"
        );
        Ok(())
    }
}

/// Deliver and swallow failures, logging them.
pub async fn deliver_logged(transport: &dyn WebhookTransport, delivery: &Delivery) {
    if let Err(e) = transport.deliver(&delivery.url, &delivery.payload).await {
        tracing::warn!(
            url = %delivery.url,
            kind = delivery.payload.kind(),
            "Webhook delivery failed: {}",
            e
        );
    }
}
