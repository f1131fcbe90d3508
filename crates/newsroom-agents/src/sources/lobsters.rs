//! Lobsters hottest-stories client.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::types::{Article, Source};

use super::ArticleSource;

const LOBSTERS_HOTTEST_URL: &str = "https://lobste.rs/hottest.json";

#[derive(Debug, Deserialize)]
struct LobstersStory {
    short_id: String,
    title: String,
    /// Empty for text-only posts; falls back to the story page.
    #[serde(default)]
    url: String,
    #[serde(default)]
    score: Option<u32>,
    #[serde(default)]
    comment_count: Option<u32>,
    #[serde(default)]
    submitter_user: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

pub struct LobstersSource {
    client: reqwest::Client,
    url: String,
}

impl LobstersSource {
    pub fn new() -> Self {
        Self::with_url(LOBSTERS_HOTTEST_URL.to_string())
    }

    pub fn with_url(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

impl Default for LobstersSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArticleSource for LobstersSource {
    fn name(&self) -> &'static str {
        "lobsters"
    }

    async fn fetch(&self, limit: usize) -> Result<Vec<Article>> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .context("failed to fetch Lobsters hottest stories")?;
        if !response.status().is_success() {
            bail!("failed to fetch Lobsters: HTTP {}", response.status());
        }

        let stories: Vec<LobstersStory> = response
            .json()
            .await
            .context("failed to parse Lobsters stories")?;

        let articles: Vec<Article> = stories
            .into_iter()
            .take(limit)
            .map(|story| Article {
                url: if story.url.is_empty() {
                    format!("https://lobste.rs/s/{}", story.short_id)
                } else {
                    story.url
                },
                id: format!("lobsters-{}", story.short_id),
                title: story.title,
                source: Source::Lobsters,
                score: story.score,
                comments: story.comment_count,
                author: story.submitter_user,
                tags: story.tags,
            })
            .collect();

        debug!(count = articles.len(), "fetched Lobsters articles");
        Ok(articles)
    }
}
