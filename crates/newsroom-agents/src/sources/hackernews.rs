//! Hacker News top-stories client (Firebase JSON API).

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use tokio::task::JoinSet;
use tracing::debug;

use crate::types::{Article, Source};

use super::ArticleSource;

const HN_API_BASE: &str = "https://hacker-news.firebaseio.com/v0";

#[derive(Debug, Deserialize)]
struct HnItem {
    id: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    score: Option<u32>,
    #[serde(default)]
    descendants: Option<u32>,
    #[serde(default)]
    by: Option<String>,
    #[serde(rename = "type", default)]
    kind: String,
}

pub struct HackerNewsSource {
    client: reqwest::Client,
    base_url: String,
}

impl HackerNewsSource {
    pub fn new() -> Self {
        Self::with_base_url(HN_API_BASE.to_string())
    }

    pub fn with_base_url(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    async fn fetch_item(client: &reqwest::Client, base_url: &str, id: u64) -> Option<HnItem> {
        let url = format!("{base_url}/item/{id}.json");
        let response = client.get(&url).send().await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        response.json::<Option<HnItem>>().await.ok().flatten()
    }
}

impl Default for HackerNewsSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArticleSource for HackerNewsSource {
    fn name(&self) -> &'static str {
        "hackernews"
    }

    async fn fetch(&self, limit: usize) -> Result<Vec<Article>> {
        let url = format!("{}/topstories.json", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("failed to fetch HackerNews top stories")?;
        if !response.status().is_success() {
            bail!("failed to fetch HackerNews: HTTP {}", response.status());
        }

        let story_ids: Vec<u64> = response
            .json()
            .await
            .context("failed to parse HackerNews story ids")?;

        // Item fetches fan out concurrently; a failed item is skipped, not
        // fatal to the batch.
        let mut join_set = JoinSet::new();
        for (rank, id) in story_ids.into_iter().take(limit).enumerate() {
            let client = self.client.clone();
            let base_url = self.base_url.clone();
            join_set.spawn(async move { (rank, Self::fetch_item(&client, &base_url, id).await) });
        }

        let mut ranked: Vec<(usize, HnItem)> = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            if let Ok((rank, Some(item))) = joined {
                ranked.push((rank, item));
            }
        }
        ranked.sort_by_key(|(rank, _)| *rank);

        let articles: Vec<Article> = ranked
            .into_iter()
            .map(|(_, item)| item)
            .filter(|item| item.kind == "story")
            .map(|item| Article {
                id: format!("hn-{}", item.id),
                url: item
                    .url
                    .clone()
                    .unwrap_or_else(|| format!("https://news.ycombinator.com/item?id={}", item.id)),
                title: item.title,
                source: Source::HackerNews,
                score: item.score,
                comments: item.descendants,
                author: item.by,
                tags: Vec::new(),
            })
            .collect();

        debug!(count = articles.len(), "fetched HackerNews articles");
        Ok(articles)
    }
}
