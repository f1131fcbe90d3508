//! Publish sink: where the day's recommendation ends up.
//!
//! Publishing is recoverable-with-skip: the workflow logs a failure and
//! finishes the run without a published URL.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::config::MastodonConfig;

/// The published status, as reported by the sink.
#[derive(Debug, Clone, Deserialize)]
pub struct PublishedStatus {
    pub id: String,
    pub url: String,
}

/// Capability interface for the publishing target.
#[async_trait]
pub trait PublishSink: Send + Sync {
    async fn publish(&self, text: &str) -> Result<PublishedStatus>;
}

/// Posts a public status to a Mastodon instance.
pub struct MastodonPublisher {
    client: reqwest::Client,
    config: MastodonConfig,
}

impl MastodonPublisher {
    pub fn new(config: MastodonConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl PublishSink for MastodonPublisher {
    async fn publish(&self, text: &str) -> Result<PublishedStatus> {
        let url = format!(
            "{}/api/v1/statuses",
            self.config.instance.trim_end_matches('/')
        );

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.access_token)
            .json(&json!({
                "status": text,
                "visibility": "public",
            }))
            .send()
            .await
            .context("failed to reach Mastodon instance")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("failed to publish to Mastodon: HTTP {status} - {body}");
        }

        response
            .json::<PublishedStatus>()
            .await
            .context("failed to parse Mastodon status response")
    }
}
