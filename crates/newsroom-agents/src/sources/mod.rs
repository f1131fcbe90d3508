//! Article sources: where candidate articles come from.
//!
//! Each source maps its own wire format into [`Article`] with a stable,
//! source-prefixed id. Dedup against already-published URLs happens in the
//! workflow's fetch stage, before articles reach the discussion core.

pub mod hackernews;
pub mod lobsters;

pub use hackernews::HackerNewsSource;
pub use lobsters::LobstersSource;

use anyhow::Result;
use async_trait::async_trait;

use crate::types::Article;

/// Capability interface for a news feed client.
#[async_trait]
pub trait ArticleSource: Send + Sync {
    /// Short name for logging.
    fn name(&self) -> &'static str;

    /// Fetch up to `limit` current top articles.
    async fn fetch(&self, limit: usize) -> Result<Vec<Article>>;
}
