//! Best-effort article scraping and summarization.
//!
//! Scraping never fails the pipeline: any fetch or parse trouble is encoded
//! as a bracketed sentinel string in `content` and flows through the content
//! phase like real text. Summarization copies sentinels through without
//! spending a backend call on them.

use std::sync::LazyLock;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use crate::backend::{ChatMessage, GenerationBackend};
use crate::prompts::SUMMARIZER_PREAMBLE;
use crate::types::{Article, ArticleWithContent};

/// Scraped text beyond this length is truncated before prompting.
const MAX_CONTENT_LENGTH: usize = 8000;

/// How much article text the summarizer sees.
const SUMMARY_INPUT_LENGTH: usize = 4000;

const USER_AGENT: &str = "Mozilla/5.0 (compatible; NewsroomBot/1.0)";

static SCRIPT_STYLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(script|style|noscript)\b.*?</(script|style|noscript)>")
        .expect("SCRIPT_STYLE_RE regex should compile")
});

static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("TAG_RE regex should compile"));

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("WHITESPACE_RE regex should compile"));

/// Capability interface for the web-content scraper.
#[async_trait]
pub trait ContentFetcher: Send + Sync {
    /// Fetch the article body. Infallible by contract: failures come back
    /// as sentinel content, not errors.
    async fn fetch_content(&self, article: &Article) -> ArticleWithContent;
}

/// Reduce an HTML document to readable text.
///
/// Deliberately crude next to a real readability pass: drop script/style
/// blocks, strip tags, decode the common entities, collapse whitespace.
pub fn extract_text(html: &str) -> String {
    let without_blocks = SCRIPT_STYLE_RE.replace_all(html, " ");
    let without_tags = TAG_RE.replace_all(&without_blocks, " ");
    let decoded = without_tags
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ");
    WHITESPACE_RE.replace_all(&decoded, " ").trim().to_string()
}

fn truncate_content(mut content: String) -> String {
    if content.len() > MAX_CONTENT_LENGTH {
        let mut cut = MAX_CONTENT_LENGTH;
        while !content.is_char_boundary(cut) {
            cut -= 1;
        }
        content.truncate(cut);
        content.push_str("...[content truncated]");
    }
    content
}

/// HTTP scraper with a per-request timeout.
pub struct HttpScraper {
    client: reqwest::Client,
}

impl HttpScraper {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .user_agent(USER_AGENT)
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
        }
    }
}

impl Default for HttpScraper {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContentFetcher for HttpScraper {
    async fn fetch_content(&self, article: &Article) -> ArticleWithContent {
        let content = match self.client.get(&article.url).send().await {
            Ok(response) if !response.status().is_success() => {
                format!("[could not fetch article: HTTP {}]", response.status().as_u16())
            }
            Ok(response) => match response.text().await {
                Ok(html) => {
                    let text = extract_text(&html);
                    if text.is_empty() {
                        "[could not parse article content]".to_string()
                    } else {
                        truncate_content(text)
                    }
                }
                Err(e) => format!("[scrape failed: {e}]"),
            },
            Err(e) => format!("[scrape failed: {e}]"),
        };

        debug!(url = %article.url, bytes = content.len(), "scraped article");
        ArticleWithContent {
            article: article.clone(),
            content,
            summary: None,
        }
    }
}

/// Generate a 2-3 sentence summary of a scraped article.
///
/// Sentinel content is copied through as the summary; real content goes to
/// the backend once, truncated to the summarizer input budget.
pub async fn summarize(
    backend: &dyn GenerationBackend,
    article: &ArticleWithContent,
) -> Result<String> {
    if article.is_sentinel() {
        return Ok(article.content.clone());
    }

    let mut cut = SUMMARY_INPUT_LENGTH.min(article.content.len());
    while !article.content.is_char_boundary(cut) {
        cut -= 1;
    }

    let messages = [
        ChatMessage::system(SUMMARIZER_PREAMBLE),
        ChatMessage::user(format!(
            "Summarize the following article:\n\nTitle: {}\n\nContent: {}",
            article.article.title,
            &article.content[..cut],
        )),
    ];

    let summary = backend
        .invoke(&messages)
        .await
        .context("article summarization failed")?;
    Ok(summary.trim().to_string())
}
