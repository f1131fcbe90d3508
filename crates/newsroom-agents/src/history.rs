//! Published-article history: the URL-keyed dedup record.
//!
//! One JSON array on disk, one record per published article, append-only.
//! A missing or unreadable file reads as empty history rather than failing
//! the run; losing dedup is better than losing the day's meeting.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::warn;

use crate::types::{Article, HistoryRecord};

/// Load the history file. Missing or malformed files read as empty.
pub fn load_history(path: &Path) -> Vec<HistoryRecord> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => return Vec::new(),
    };
    match serde_json::from_str(&content) {
        Ok(records) => records,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "history file unreadable; treating as empty");
            Vec::new()
        }
    }
}

/// Append one record and persist the full history.
pub fn append_record(path: &Path, record: HistoryRecord) -> Result<()> {
    let mut records = load_history(path);
    records.push(record);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create history dir {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(&records).context("failed to encode history")?;
    std::fs::write(path, json)
        .with_context(|| format!("failed to write history {}", path.display()))
}

/// Drop articles whose URL was already published.
pub fn filter_new(articles: Vec<Article>, history: &[HistoryRecord]) -> Vec<Article> {
    let published: HashSet<&str> = history.iter().map(|r| r.url.as_str()).collect();
    articles
        .into_iter()
        .filter(|a| !published.contains(a.url.as_str()))
        .collect()
}
