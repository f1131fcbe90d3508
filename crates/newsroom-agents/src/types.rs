//! Shared data model for the editorial meeting pipeline.
//!
//! `Article` and `Persona` are read-only inputs to a discussion phase.
//! `Message`, `Vote`, and `DiscussionRound` are created incrementally during
//! a phase and never mutated after creation. Once a round is sealed, later
//! rounds reference but do not modify it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Role label for moderator messages in transcripts and prompts.
pub const MODERATOR_ROLE: &str = "Moderator";

/// Origin of a fetched article.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    HackerNews,
    Lobsters,
}

impl Source {
    /// Short label used in candidate lists and transcripts.
    pub fn label(self) -> &'static str {
        match self {
            Self::HackerNews => "HN",
            Self::Lobsters => "Lobsters",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A candidate article as fetched from a source. Immutable once fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// Stable, source-prefixed id (e.g. `hn-43210987`, `lobsters-abc123`).
    pub id: String,
    pub title: String,
    pub url: String,
    pub source: Source,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// An article plus its scraped full text and optional generated summary.
///
/// `content` holds either the scraped text or a bracketed sentinel string
/// (e.g. `[could not fetch article: HTTP 404]`) when scraping failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleWithContent {
    #[serde(flatten)]
    pub article: Article,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl ArticleWithContent {
    /// Wrap an article with empty content, before scraping.
    pub fn without_content(article: Article) -> Self {
        Self {
            article,
            content: String::new(),
            summary: None,
        }
    }

    /// Whether `content` is a sentinel rather than real article text.
    pub fn is_sentinel(&self) -> bool {
        self.content.starts_with('[')
    }
}

/// One utterance in a discussion. `role` is a persona nickname or
/// [`MODERATOR_ROLE`]; `round` is 1-based.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
    pub round: u32,
}

/// A structured vote extracted from a participant's free-text statement.
///
/// Votes whose article id could not be resolved against the candidate set
/// are discarded before they reach any tally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub persona: String,
    pub article_id: String,
    pub reason: String,
}

/// One sealed round: the moderator's framing message followed by the joined
/// participant responses, plus extracted votes on voting rounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscussionRound {
    pub round: u32,
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub votes: Option<Vec<Vote>>,
}

/// Vote-derived outcome of the title phase, consumed by the workflow's
/// transition function. The 0/1/many branch is a tagged three-way outcome,
/// never a raw length check on the article list.
#[derive(Debug, Clone)]
pub enum SelectionOutcome {
    /// No article received any vote.
    None,
    /// Exactly one article was voted for; content debate is skipped.
    Single(ArticleWithContent),
    /// Two or more articles advance to the content phase.
    Multiple(Vec<ArticleWithContent>),
}

impl SelectionOutcome {
    /// Classify a ranked selection list into the three-way outcome.
    pub fn from_selection(mut selected: Vec<ArticleWithContent>) -> Self {
        match selected.len() {
            0 => Self::None,
            1 => Self::Single(selected.remove(0)),
            _ => Self::Multiple(selected),
        }
    }
}

/// One published article, appended to the on-disk history and used to
/// dedup future fetches by URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    /// Publication date, `YYYY-MM-DD`.
    pub date: String,
    pub article_id: String,
    pub title: String,
    pub url: String,
    pub source: Source,
    pub summary: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(id: &str) -> ArticleWithContent {
        ArticleWithContent::without_content(Article {
            id: id.into(),
            title: format!("Article {id}"),
            url: format!("https://example.com/{id}"),
            source: Source::HackerNews,
            score: None,
            comments: None,
            author: None,
            tags: Vec::new(),
        })
    }

    #[test]
    fn test_selection_outcome_cardinality() {
        assert!(matches!(
            SelectionOutcome::from_selection(vec![]),
            SelectionOutcome::None
        ));
        assert!(matches!(
            SelectionOutcome::from_selection(vec![article("a")]),
            SelectionOutcome::Single(_)
        ));
        match SelectionOutcome::from_selection(vec![article("a"), article("b")]) {
            SelectionOutcome::Multiple(items) => assert_eq!(items.len(), 2),
            other => panic!("expected Multiple, got {other:?}"),
        }
    }

    #[test]
    fn test_sentinel_detection() {
        let mut a = article("x");
        assert!(!a.is_sentinel());
        a.content = "[could not fetch article: HTTP 404]".into();
        assert!(a.is_sentinel());
        a.content = "Real text".into();
        assert!(!a.is_sentinel());
    }

    #[test]
    fn test_source_serde_and_label() {
        let json = serde_json::to_string(&Source::HackerNews).unwrap();
        assert_eq!(json, "\"hackernews\"");
        assert_eq!(Source::Lobsters.label(), "Lobsters");
    }
}
