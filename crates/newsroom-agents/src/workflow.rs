//! Workflow state machine: fetch → title discussion → (content discussion |
//! direct summary) → publish.
//!
//! States and legal transitions are explicit so every run is auditable: the
//! engine records each transition with its reason, and illegal edges are
//! rejected rather than silently taken. The branch after the title phase is
//! driven by the vote-derived [`SelectionOutcome`], never by raw article
//! counts.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::agents::{Moderator, Participant};
use crate::backend::{GenerationBackend, OpenAiBackend};
use crate::config::NewsroomConfig;
use crate::discussion::DiscussionOrchestrator;
use crate::history;
use crate::personas;
use crate::progress::{ProgressHook, TracingProgress};
use crate::publish::{MastodonPublisher, PublishSink};
use crate::scrape::{self, ContentFetcher, HttpScraper};
use crate::sources::{ArticleSource, HackerNewsSource, LobstersSource};
use crate::transcript::TranscriptWriter;
use crate::types::{
    Article, ArticleWithContent, DiscussionRound, HistoryRecord, Message, SelectionOutcome,
};

/// The set of workflow states. Every run starts at `Fetch` and terminates
/// at `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowState {
    Fetch,
    TitleDiscussion,
    ContentDiscussion,
    DirectSummary,
    Publish,
    Done,
}

impl WorkflowState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done)
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fetch => "Fetch",
            Self::TitleDiscussion => "TitleDiscussion",
            Self::ContentDiscussion => "ContentDiscussion",
            Self::DirectSummary => "DirectSummary",
            Self::Publish => "Publish",
            Self::Done => "Done",
        };
        f.write_str(name)
    }
}

/// Legal edges in the state graph:
/// ```text
/// Fetch → TitleDiscussion | Done
/// TitleDiscussion → ContentDiscussion | DirectSummary | Done
/// ContentDiscussion → Publish
/// DirectSummary → Publish
/// Publish → Done
/// ```
fn is_legal_transition(from: WorkflowState, to: WorkflowState) -> bool {
    use WorkflowState::*;

    matches!(
        (from, to),
        (Fetch, TitleDiscussion)
            | (Fetch, Done)
            | (TitleDiscussion, ContentDiscussion)
            | (TitleDiscussion, DirectSummary)
            | (TitleDiscussion, Done)
            | (ContentDiscussion, Publish)
            | (DirectSummary, Publish)
            | (Publish, Done)
    )
}

/// A single recorded state transition.
#[derive(Debug, Clone)]
pub struct TransitionRecord {
    pub from: WorkflowState,
    pub to: WorkflowState,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Error)]
#[error("illegal workflow transition: {from} → {to}")]
pub struct IllegalTransition {
    pub from: WorkflowState,
    pub to: WorkflowState,
}

/// External collaborators, threaded in explicitly so tests can swap any of
/// them for doubles.
pub struct Collaborators {
    pub discussion_backend: Arc<dyn GenerationBackend>,
    pub summary_backend: Arc<dyn GenerationBackend>,
    pub sources: Vec<Arc<dyn ArticleSource>>,
    pub scraper: Arc<dyn ContentFetcher>,
    /// Absent when publishing is not configured; the publish stage then
    /// composes the status but posts nothing.
    pub publisher: Option<Arc<dyn PublishSink>>,
    pub progress: Arc<dyn ProgressHook>,
}

impl Collaborators {
    /// Production wiring: live sources, HTTP scraper, OpenAI-compatible
    /// backends at the configured temperatures, Mastodon when configured.
    pub fn from_config(config: &NewsroomConfig) -> Self {
        Self {
            discussion_backend: Arc::new(OpenAiBackend::new(
                config.backend.clone(),
                config.discussion_temperature,
            )),
            summary_backend: Arc::new(OpenAiBackend::new(
                config.backend.clone(),
                config.summary_temperature,
            )),
            sources: vec![
                Arc::new(LobstersSource::new()),
                Arc::new(HackerNewsSource::new()),
            ],
            scraper: Arc::new(HttpScraper::new()),
            publisher: config
                .mastodon
                .clone()
                .map(|m| Arc::new(MastodonPublisher::new(m)) as Arc<dyn PublishSink>),
            progress: Arc::new(TracingProgress),
        }
    }
}

/// Everything a finished run can report. Populated progressively, so a run
/// that ends early carries whatever partial results exist.
#[derive(Default)]
pub struct RunReport {
    pub fetched: usize,
    pub title_rounds: Vec<DiscussionRound>,
    pub content_rounds: Vec<DiscussionRound>,
    pub selected: Vec<ArticleWithContent>,
    pub final_article: Option<ArticleWithContent>,
    pub summary: Option<String>,
    pub published_url: Option<String>,
    pub transcript_path: Option<PathBuf>,
    pub transitions: Vec<TransitionRecord>,
}

pub struct WorkflowEngine {
    config: NewsroomConfig,
    collaborators: Collaborators,
    state: WorkflowState,
    transitions: Vec<TransitionRecord>,
}

impl WorkflowEngine {
    pub fn new(config: NewsroomConfig, collaborators: Collaborators) -> Self {
        Self {
            config,
            collaborators,
            state: WorkflowState::Fetch,
            transitions: Vec::new(),
        }
    }

    pub fn state(&self) -> WorkflowState {
        self.state
    }

    fn advance(&mut self, to: WorkflowState, reason: Option<&str>) -> Result<(), IllegalTransition> {
        if !is_legal_transition(self.state, to) {
            return Err(IllegalTransition {
                from: self.state,
                to,
            });
        }
        debug!(from = %self.state, to = %to, "workflow transition");
        self.transitions.push(TransitionRecord {
            from: self.state,
            to,
            reason: reason.map(String::from),
        });
        self.state = to;
        Ok(())
    }

    /// Drive the run to its terminal state and report the partial or full
    /// results. The only fatal errors past fetch are a missing panel and a
    /// failed (non-extraction) backend call inside a phase.
    pub async fn run(mut self) -> Result<RunReport> {
        let mut report = RunReport::default();

        let articles = self.fetch_stage().await?;
        report.fetched = articles.len();
        if articles.is_empty() {
            info!("no new articles; ending run without a discussion");
            self.advance(WorkflowState::Done, Some("no new articles"))?;
            report.transitions = self.transitions;
            return Ok(report);
        }
        self.advance(WorkflowState::TitleDiscussion, None)?;

        let orchestrator = self.build_panel()?;
        let date = chrono::Local::now().date_naive();
        let mut transcript = TranscriptWriter::create(&self.config.transcripts_dir, date)?;
        transcript.init(&articles)?;
        report.transcript_path = Some(transcript.path().to_path_buf());
        info!(path = %transcript.path().display(), "transcript started");

        let title = orchestrator.run_title_phase(&articles, &mut transcript).await?;
        report.title_rounds = title.rounds.clone();

        let selected: Vec<ArticleWithContent> = title
            .selected
            .into_iter()
            .map(ArticleWithContent::without_content)
            .collect();

        match SelectionOutcome::from_selection(selected) {
            SelectionOutcome::None => {
                info!("no article received a vote; ending run");
                self.advance(WorkflowState::Done, Some("no article received a vote"))?;
            }
            SelectionOutcome::Single(article) => {
                info!("single article selected; skipping content debate");
                self.advance(WorkflowState::DirectSummary, Some("one voted article"))?;
                transcript.append_selection(std::slice::from_ref(&article))?;

                let (article, summary) = self
                    .direct_summary_stage(&orchestrator, article, &report.title_rounds, &mut transcript)
                    .await?;
                report.selected = vec![article.clone()];

                self.advance(WorkflowState::Publish, None)?;
                report.published_url = self.publish_stage(&article, &summary).await;
                report.final_article = Some(article);
                report.summary = Some(summary);
                self.advance(WorkflowState::Done, None)?;
            }
            SelectionOutcome::Multiple(shortlist) => {
                info!(count = shortlist.len(), "shortlist selected; entering content debate");
                self.advance(
                    WorkflowState::ContentDiscussion,
                    Some("multiple voted articles"),
                )?;
                transcript.append_selection(&shortlist)?;

                let enriched = self.scrape_and_summarize(shortlist).await?;
                transcript.append_summaries(&enriched)?;
                report.selected = enriched.clone();

                let content = orchestrator.run_content_phase(&enriched, &mut transcript).await?;
                report.content_rounds = content.rounds;

                self.advance(WorkflowState::Publish, None)?;
                report.published_url = self.publish_stage(&content.winner, &content.summary).await;
                report.final_article = Some(content.winner);
                report.summary = Some(content.summary);
                self.advance(WorkflowState::Done, None)?;
            }
        }

        report.transitions = self.transitions;
        Ok(report)
    }

    fn build_panel(&self) -> Result<DiscussionOrchestrator> {
        let personas = personas::load_personas(&self.config.personas_dir)?;
        let moderator = Moderator::new(
            Arc::clone(&self.collaborators.discussion_backend),
            &self.config.personas_dir,
        );
        let participants = personas
            .into_iter()
            .map(|p| Participant::new(Arc::clone(&self.collaborators.discussion_backend), p))
            .collect();
        Ok(DiscussionOrchestrator::new(
            moderator,
            participants,
            Arc::clone(&self.collaborators.progress),
        ))
    }

    /// Query every source concurrently, keep source order, then drop
    /// already-published URLs.
    async fn fetch_stage(&self) -> Result<Vec<Article>> {
        info!(limit = self.config.fetch_limit, "fetching candidate articles");

        let mut join_set = JoinSet::new();
        for (idx, source) in self.collaborators.sources.iter().enumerate() {
            let source = Arc::clone(source);
            let limit = self.config.fetch_limit;
            join_set.spawn(async move { (idx, source.fetch(limit).await) });
        }

        let mut batches: Vec<Vec<Article>> =
            (0..self.collaborators.sources.len()).map(|_| Vec::new()).collect();
        while let Some(joined) = join_set.join_next().await {
            let (idx, result) = joined.context("source fetch task panicked")?;
            batches[idx] = result?;
        }

        let all: Vec<Article> = batches.into_iter().flatten().collect();
        info!(count = all.len(), "articles fetched");

        let past = history::load_history(&self.config.history_path);
        let fresh = history::filter_new(all, &past);
        info!(count = fresh.len(), "new articles after history dedup");
        Ok(fresh)
    }

    /// Scrape the shortlist concurrently, then summarize each article.
    async fn scrape_and_summarize(
        &self,
        shortlist: Vec<ArticleWithContent>,
    ) -> Result<Vec<ArticleWithContent>> {
        info!(count = shortlist.len(), "scraping shortlisted articles");

        let mut join_set = JoinSet::new();
        for (idx, entry) in shortlist.iter().enumerate() {
            let scraper = Arc::clone(&self.collaborators.scraper);
            let article = entry.article.clone();
            join_set.spawn(async move { (idx, scraper.fetch_content(&article).await) });
        }

        let mut scraped: Vec<Option<ArticleWithContent>> =
            (0..shortlist.len()).map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            let (idx, article) = joined.context("scrape task panicked")?;
            scraped[idx] = Some(article);
        }

        let mut enriched = Vec::with_capacity(shortlist.len());
        for article in scraped.into_iter().flatten() {
            let summary =
                scrape::summarize(self.collaborators.summary_backend.as_ref(), &article).await?;
            debug!(title = %article.article.title, "summary generated");
            enriched.push(ArticleWithContent {
                summary: Some(summary),
                ..article
            });
        }
        Ok(enriched)
    }

    /// The single-winner shortcut: scrape and summarize the one selected
    /// article, then have the moderator recommend it straight from the
    /// title-phase transcript.
    async fn direct_summary_stage(
        &self,
        orchestrator: &DiscussionOrchestrator,
        article: ArticleWithContent,
        title_rounds: &[DiscussionRound],
        transcript: &mut TranscriptWriter,
    ) -> Result<(ArticleWithContent, String)> {
        info!(title = %article.article.title, "direct summary for single selection");

        let scraped = self.collaborators.scraper.fetch_content(&article.article).await;
        let summary =
            scrape::summarize(self.collaborators.summary_backend.as_ref(), &scraped).await?;
        let enriched = ArticleWithContent {
            summary: Some(summary),
            ..scraped
        };
        transcript.append_summaries(std::slice::from_ref(&enriched))?;

        let title_messages: Vec<Message> = title_rounds
            .iter()
            .flat_map(|r| r.messages.iter().cloned())
            .collect();
        let recommendation = orchestrator
            .moderator()
            .final_recommendation(&enriched, &title_messages)
            .await?;
        transcript.append_final(&enriched, &recommendation)?;

        Ok((enriched, recommendation))
    }

    /// Compose and post the status. Failure is logged and skipped; the
    /// history record is appended either way so tomorrow's fetch dedups
    /// today's pick.
    async fn publish_stage(&self, article: &ArticleWithContent, summary: &str) -> Option<String> {
        let text = format!("{}\n\n{}", summary, article.article.url);
        info!(chars = text.len(), "publish text composed");

        let mut published_url = None;
        if self.config.dry_run {
            info!("dry-run mode; skipping publish");
        } else if let Some(publisher) = &self.collaborators.publisher {
            match publisher.publish(&text).await {
                Ok(status) => {
                    info!(url = %status.url, "published");
                    published_url = Some(status.url);
                }
                Err(e) => warn!(error = %e, "publish failed; continuing"),
            }
        } else {
            info!("no publish sink configured; skipping publish");
        }

        let record = HistoryRecord {
            date: chrono::Local::now().format("%Y-%m-%d").to_string(),
            article_id: article.article.id.clone(),
            title: article.article.title.clone(),
            url: article.article.url.clone(),
            source: article.article.source,
            summary: summary.to_string(),
        };
        if let Err(e) = history::append_record(&self.config.history_path, record) {
            warn!(error = %e, "failed to append history record");
        } else {
            debug!("history record saved");
        }

        published_url
    }
}
