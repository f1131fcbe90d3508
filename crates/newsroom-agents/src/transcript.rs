//! Incremental Markdown transcript of one editorial run.
//!
//! The writer is an explicit handle threaded through the workflow, one per
//! run, single writer. Every append persists the cumulative document to
//! disk, so a crash mid-run leaves a partial but valid transcript on disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::types::{Article, ArticleWithContent, DiscussionRound, Message};

pub struct TranscriptWriter {
    path: PathBuf,
    content: String,
}

impl TranscriptWriter {
    /// Create the transcript file for `date` under `dir` (created if absent).
    pub fn create(dir: &Path, date: NaiveDate) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create transcript dir {}", dir.display()))?;
        let path = dir.join(format!("{}.md", date.format("%Y-%m-%d")));
        Ok(Self {
            path,
            content: format!("# Developer news discussion - {}\n\n", date.format("%Y-%m-%d")),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the header and candidate table. Call once, before any round.
    pub fn init(&mut self, articles: &[Article]) -> Result<()> {
        self.content.push_str("## Candidate articles\n\n");
        self.content
            .push_str(&format!("{} articles in the running\n\n", articles.len()));
        self.content.push_str(&format_article_table(articles));
        self.content.push_str("\n\n---\n\n");
        self.content.push_str("## First discussion: title triage\n\n");
        self.save()
    }

    /// Append one sealed round, including its vote tally when present.
    pub fn append_round(&mut self, round: &DiscussionRound, label: &str) -> Result<()> {
        self.content.push_str(&format!("### {label}\n\n"));
        self.content.push_str(&format_messages(&round.messages));

        if let Some(votes) = round.votes.as_ref().filter(|v| !v.is_empty()) {
            self.content.push_str("\n\n**Vote tally**:\n");
            let mut counts: HashMap<&str, usize> = HashMap::new();
            for vote in votes {
                *counts.entry(vote.article_id.as_str()).or_insert(0) += 1;
            }
            let mut sorted: Vec<(&str, usize)> = counts.into_iter().collect();
            sorted.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
            for (article_id, count) in sorted {
                self.content.push_str(&format!("- {article_id}: {count} vote(s)\n"));
            }
        }

        self.content.push_str("\n\n");
        self.save()
    }

    /// Append the articles advancing past the title vote.
    pub fn append_selection(&mut self, articles: &[ArticleWithContent]) -> Result<()> {
        if articles.len() == 1 {
            self.content.push_str("**Selected article**:\n");
        } else {
            self.content
                .push_str(&format!("**Top {} selected**:\n", articles.len()));
        }
        for article in articles {
            self.content.push_str(&format!("- {}\n", article.article.title));
        }
        self.content.push_str("\n---\n\n");
        if articles.len() > 1 {
            self.content
                .push_str("## Second discussion: content review\n\n");
        }
        self.save()
    }

    /// Append the generated per-article summaries ahead of the content rounds.
    pub fn append_summaries(&mut self, articles: &[ArticleWithContent]) -> Result<()> {
        self.content.push_str("### Article summaries\n\n");
        for article in articles {
            self.content.push_str(&format!("**{}**\n", article.article.title));
            self.content.push_str(&format!(
                "> {}\n\n",
                article.summary.as_deref().unwrap_or("(no summary)")
            ));
        }
        self.content.push_str("### Discussion\n\n");
        self.save()
    }

    /// Append the final pick and the text to publish.
    pub fn append_final(&mut self, article: &ArticleWithContent, summary: &str) -> Result<()> {
        self.content.push_str("---\n\n");
        self.content.push_str("## Today's pick\n\n");
        self.content
            .push_str(&format!("**\"{}\"**\n\n", article.article.title));
        self.content.push_str("### Published text\n\n");
        self.content.push_str(&format!("> {summary}\n\n"));
        self.content.push_str(&format!("{}\n", article.article.url));
        self.save()
    }

    fn save(&self) -> Result<()> {
        std::fs::write(&self.path, &self.content)
            .with_context(|| format!("failed to write transcript {}", self.path.display()))
    }
}

fn format_article_table(articles: &[Article]) -> String {
    let mut table = String::from("| # | Source | Title |\n|---|--------|-------|\n");
    for (i, article) in articles.iter().enumerate() {
        table.push_str(&format!(
            "| {} | {} | {} |\n",
            i + 1,
            article.source.label(),
            article.title
        ));
    }
    table
}

fn format_messages(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("**{}**:\n> {}", m.role, m.content.replace('\n', "\n> ")))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Source, Vote};

    fn article(id: &str, title: &str) -> Article {
        Article {
            id: id.into(),
            title: title.into(),
            url: format!("https://example.com/{id}"),
            source: Source::Lobsters,
            score: None,
            comments: None,
            author: None,
            tags: Vec::new(),
        }
    }

    fn round(n: u32, votes: Option<Vec<Vote>>) -> DiscussionRound {
        DiscussionRound {
            round: n,
            messages: vec![Message {
                role: "Pixel".into(),
                content: format!("statement in round {n}\nsecond line"),
                round: n,
            }],
            votes,
        }
    }

    #[test]
    fn test_each_append_is_durable_and_cumulative() {
        let dir = tempfile::tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 8, 4).unwrap();
        let mut writer = TranscriptWriter::create(dir.path(), date).unwrap();

        writer.init(&[article("hn-1", "First")]).unwrap();
        let after_init = std::fs::read_to_string(writer.path()).unwrap();
        assert!(after_init.contains("## Candidate articles"));
        assert!(after_init.contains("| 1 | Lobsters | First |"));

        writer.append_round(&round(1, None), "Round 1 - Nominations").unwrap();
        let after_round = std::fs::read_to_string(writer.path()).unwrap();
        assert!(after_round.contains(&after_init));
        assert!(after_round.contains("### Round 1 - Nominations"));
        assert!(after_round.contains("> statement in round 1\n> second line"));

        let winner = ArticleWithContent {
            article: article("hn-1", "First"),
            content: String::new(),
            summary: Some("worth it".into()),
        };
        writer.append_final(&winner, "read this").unwrap();
        let after_final = std::fs::read_to_string(writer.path()).unwrap();
        assert!(after_final.contains(&after_round));
        assert!(after_final.contains("## Today's pick"));
        assert!(after_final.contains("> read this"));
    }

    #[test]
    fn test_vote_tally_rendered_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 8, 4).unwrap();
        let mut writer = TranscriptWriter::create(dir.path(), date).unwrap();

        let votes = vec![
            Vote { persona: "a".into(), article_id: "hn-2".into(), reason: String::new() },
            Vote { persona: "b".into(), article_id: "hn-2".into(), reason: String::new() },
            Vote { persona: "c".into(), article_id: "hn-1".into(), reason: String::new() },
        ];
        writer.append_round(&round(3, Some(votes)), "Round 3 - Vote").unwrap();

        let text = std::fs::read_to_string(writer.path()).unwrap();
        let pos_2 = text.find("- hn-2: 2 vote(s)").unwrap();
        let pos_1 = text.find("- hn-1: 1 vote(s)").unwrap();
        assert!(pos_2 < pos_1);
    }

    #[test]
    fn test_selection_single_vs_multiple_wording() {
        let dir = tempfile::tempdir().unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 8, 4).unwrap();
        let mut writer = TranscriptWriter::create(dir.path(), date).unwrap();

        let one = vec![ArticleWithContent::without_content(article("hn-1", "Only"))];
        writer.append_selection(&one).unwrap();
        let text = std::fs::read_to_string(writer.path()).unwrap();
        assert!(text.contains("**Selected article**"));
        assert!(!text.contains("content review"));

        let two = vec![
            ArticleWithContent::without_content(article("hn-1", "One")),
            ArticleWithContent::without_content(article("hn-2", "Two")),
        ];
        writer.append_selection(&two).unwrap();
        let text = std::fs::read_to_string(writer.path()).unwrap();
        assert!(text.contains("**Top 2 selected**"));
        assert!(text.contains("## Second discussion: content review"));
    }
}
