//! Workflow engine branch tests with collaborator doubles.
//!
//! Exercises the three post-title branches (no votes, one voted article,
//! several voted articles), the empty-fetch short circuit, and the
//! publish-failure-is-not-fatal policy.

use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;

use newsroom_agents::config::{Endpoint, NewsroomConfig};
use newsroom_agents::publish::{PublishSink, PublishedStatus};
use newsroom_agents::scrape::ContentFetcher;
use newsroom_agents::sources::ArticleSource;
use newsroom_agents::testing::ScriptedBackend;
use newsroom_agents::progress::SilentProgress;
use newsroom_agents::types::{Article, ArticleWithContent, Source};
use newsroom_agents::workflow::{Collaborators, WorkflowEngine, WorkflowState};

struct FakeSource {
    articles: Vec<Article>,
}

#[async_trait]
impl ArticleSource for FakeSource {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn fetch(&self, limit: usize) -> Result<Vec<Article>> {
        Ok(self.articles.iter().take(limit).cloned().collect())
    }
}

struct FakeScraper;

#[async_trait]
impl ContentFetcher for FakeScraper {
    async fn fetch_content(&self, article: &Article) -> ArticleWithContent {
        ArticleWithContent {
            article: article.clone(),
            content: format!("Scraped body for {}.", article.id),
            summary: None,
        }
    }
}

#[derive(Default)]
struct RecordingPublisher {
    posts: Mutex<Vec<String>>,
}

#[async_trait]
impl PublishSink for RecordingPublisher {
    async fn publish(&self, text: &str) -> Result<PublishedStatus> {
        self.posts.lock().unwrap().push(text.to_string());
        Ok(PublishedStatus {
            id: "1".into(),
            url: "https://social.example/@bot/1".into(),
        })
    }
}

struct FailingPublisher;

#[async_trait]
impl PublishSink for FailingPublisher {
    async fn publish(&self, _text: &str) -> Result<PublishedStatus> {
        bail!("instance rejected the status");
    }
}

fn articles(n: usize) -> Vec<Article> {
    (1..=n)
        .map(|i| Article {
            id: format!("hn-{i}"),
            title: format!("Article {i}"),
            url: format!("https://example.com/{i}"),
            source: Source::HackerNews,
            score: Some(10),
            comments: None,
            author: None,
            tags: Vec::new(),
        })
        .collect()
}

fn write_panel_files(dir: &std::path::Path) {
    let files = [
        ("frontend-engineer", "Pixel"),
        ("backend-architect", "Atlas"),
        ("devops-engineer", "Pager"),
        ("indie-hacker", "Bootstrap"),
        ("junior-developer", "Newbie"),
        ("product-manager", "Roadmap"),
        ("designer", "Sketch"),
        ("tech-geek", "Bits"),
    ];
    for (id, nickname) in files {
        let md = format!(
            "# {id}\n\n- nickname: {nickname}\n\n## Traits\n- opinionated\n\n\
             ## Interests\n- software\n\n## Voting preference\n- substance\n\n\
             ## Speaking style\n- direct\n"
        );
        std::fs::write(dir.join(format!("{id}.md")), md).unwrap();
    }
    std::fs::write(
        dir.join("moderator.md"),
        "# Editor\n\n- nickname: Anchor\n\n## Traits\n- decisive\n\n\
         ## Interests\n- shipping\n\n## Voting preference\n- substance\n\n\
         ## Speaking style\n- concise\n",
    )
    .unwrap();
}

/// A workspace with temp personas/history/transcripts plus a config wired
/// to them. The full 8-persona panel is written, so every fan-out consumes
/// 8 scripted responses.
struct TestRig {
    _root: tempfile::TempDir,
    config: NewsroomConfig,
    backend: Arc<ScriptedBackend>,
}

impl TestRig {
    fn new() -> Self {
        let root = tempfile::tempdir().unwrap();
        let personas_dir = root.path().join("personas");
        std::fs::create_dir_all(&personas_dir).unwrap();
        write_panel_files(&personas_dir);

        let config = NewsroomConfig {
            backend: Endpoint {
                url: "http://unused.invalid".into(),
                api_key: String::new(),
                model: "test-model".into(),
            },
            discussion_temperature: 0.7,
            summary_temperature: 0.3,
            personas_dir,
            history_path: root.path().join("data/history.json"),
            transcripts_dir: root.path().join("discussions"),
            fetch_limit: 25,
            dry_run: false,
            mastodon: None,
        };

        Self {
            _root: root,
            config,
            backend: Arc::new(ScriptedBackend::new()),
        }
    }

    fn collaborators(
        &self,
        source_articles: Vec<Article>,
        publisher: Option<Arc<dyn PublishSink>>,
    ) -> Collaborators {
        Collaborators {
            discussion_backend: self.backend.clone(),
            summary_backend: self.backend.clone(),
            sources: vec![Arc::new(FakeSource {
                articles: source_articles,
            })],
            scraper: Arc::new(FakeScraper),
            publisher,
            progress: Arc::new(SilentProgress),
        }
    }

    /// Queue one full title phase ending in the given extraction output.
    fn enqueue_title_phase(&self, extraction_json: &str) {
        self.backend.enqueue("Opening the title round.");
        self.backend.enqueue_n(8, "I nominate #1 and #2.");
        self.backend.enqueue("Debate, everyone.");
        self.backend.enqueue_n(8, "Standing by my picks.");
        self.backend.enqueue("Votes, please.");
        self.backend.enqueue_n(8, "Voting now.");
        self.backend.enqueue(extraction_json);
    }
}

fn transition_path(report: &newsroom_agents::workflow::RunReport) -> Vec<WorkflowState> {
    report.transitions.iter().map(|t| t.to).collect()
}

#[tokio::test]
async fn empty_fetch_ends_without_discussion() {
    let rig = TestRig::new();
    let collaborators = rig.collaborators(Vec::new(), None);
    let engine = WorkflowEngine::new(rig.config.clone(), collaborators);

    let report = engine.run().await.unwrap();

    assert_eq!(report.fetched, 0);
    assert!(report.final_article.is_none());
    assert_eq!(transition_path(&report), vec![WorkflowState::Done]);
    // No discussion ever started: the backend was never invoked.
    assert_eq!(rig.backend.call_count(), 0);
}

#[tokio::test]
async fn single_voted_article_takes_direct_summary_path() {
    let rig = TestRig::new();
    // Every extracted vote lands on article 1.
    rig.enqueue_title_phase(
        r#"[
            {"persona": "Pixel", "articleNumber": 1, "reason": "great"},
            {"persona": "Atlas", "articleNumber": 1, "reason": "agree"}
        ]"#,
    );
    // Direct summary: one summarization call, one recommendation call.
    rig.backend.enqueue("A crisp two-sentence summary.");
    rig.backend.enqueue("Warmly recommended by the panel.");

    let publisher = Arc::new(RecordingPublisher::default());
    let collaborators = rig.collaborators(articles(3), Some(publisher.clone()));
    let report = WorkflowEngine::new(rig.config.clone(), collaborators)
        .run()
        .await
        .unwrap();

    assert_eq!(
        transition_path(&report),
        vec![
            WorkflowState::TitleDiscussion,
            WorkflowState::DirectSummary,
            WorkflowState::Publish,
            WorkflowState::Done,
        ]
    );
    assert!(report.content_rounds.is_empty());

    let winner = report.final_article.unwrap();
    assert_eq!(winner.article.id, "hn-1");
    assert_eq!(winner.summary.as_deref(), Some("A crisp two-sentence summary."));
    assert_eq!(report.summary.as_deref(), Some("Warmly recommended by the panel."));
    assert_eq!(
        report.published_url.as_deref(),
        Some("https://social.example/@bot/1")
    );

    // Published text is "<recommendation>\n\n<url>".
    let posts = publisher.posts.lock().unwrap();
    assert_eq!(
        posts.as_slice(),
        ["Warmly recommended by the panel.\n\nhttps://example.com/1"]
    );

    // History now dedups the published URL.
    let history = newsroom_agents::history::load_history(&rig.config.history_path);
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].url, "https://example.com/1");

    // Transcript exists and records the pick.
    let transcript = std::fs::read_to_string(report.transcript_path.unwrap()).unwrap();
    assert!(transcript.contains("## Today's pick"));
}

#[tokio::test]
async fn multiple_voted_articles_run_content_phase_and_survive_publish_failure() {
    let rig = TestRig::new();
    rig.enqueue_title_phase(
        r#"[
            {"persona": "Pixel", "articleNumber": 1, "reason": "great"},
            {"persona": "Atlas", "articleNumber": 2, "reason": "better"}
        ]"#,
    );
    // Summaries for the two shortlisted articles, in shortlist order.
    rig.backend.enqueue("Summary of article one.");
    rig.backend.enqueue("Summary of article two.");
    // Content phase.
    rig.backend.enqueue("Opening the content round.");
    rig.backend.enqueue_n(8, "Judging the substance.");
    rig.backend.enqueue("Final votes, please.");
    rig.backend.enqueue_n(8, "Voting now.");
    rig.backend
        .enqueue(r#"[{"persona": "Pixel", "articleNumber": 2, "reason": "depth"}]"#);
    rig.backend.enqueue("Today's pick, with conviction.");

    let collaborators = rig.collaborators(articles(3), Some(Arc::new(FailingPublisher)));
    let report = WorkflowEngine::new(rig.config.clone(), collaborators)
        .run()
        .await
        .unwrap();

    assert_eq!(
        transition_path(&report),
        vec![
            WorkflowState::TitleDiscussion,
            WorkflowState::ContentDiscussion,
            WorkflowState::Publish,
            WorkflowState::Done,
        ]
    );

    // Both voted articles advanced with summaries attached.
    assert_eq!(report.selected.len(), 2);
    assert_eq!(
        report.selected[0].summary.as_deref(),
        Some("Summary of article one.")
    );

    // Content vote picked article 2; the failed publish is non-fatal.
    let winner = report.final_article.unwrap();
    assert_eq!(winner.article.id, "hn-2");
    assert!(report.published_url.is_none());
    assert_eq!(report.summary.as_deref(), Some("Today's pick, with conviction."));

    // History is still recorded after a failed publish.
    let history = newsroom_agents::history::load_history(&rig.config.history_path);
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].article_id, "hn-2");
}

#[tokio::test]
async fn zero_votes_ends_after_title_phase() {
    let rig = TestRig::new();
    rig.enqueue_title_phase("no json in sight");

    let collaborators = rig.collaborators(articles(3), None);
    let report = WorkflowEngine::new(rig.config.clone(), collaborators)
        .run()
        .await
        .unwrap();

    assert_eq!(
        transition_path(&report),
        vec![WorkflowState::TitleDiscussion, WorkflowState::Done]
    );
    assert!(report.final_article.is_none());
    assert!(report.selected.is_empty());
    assert_eq!(report.title_rounds.len(), 3);

    // No history written when nothing was picked.
    let history = newsroom_agents::history::load_history(&rig.config.history_path);
    assert!(history.is_empty());
}

#[tokio::test]
async fn history_dedup_filters_published_urls_from_fetch() {
    let rig = TestRig::new();
    newsroom_agents::history::append_record(
        &rig.config.history_path,
        newsroom_agents::types::HistoryRecord {
            date: "2026-08-03".into(),
            article_id: "hn-1".into(),
            title: "Article 1".into(),
            url: "https://example.com/1".into(),
            source: Source::HackerNews,
            summary: "old".into(),
        },
    )
    .unwrap();

    // Only already-published articles come back from the source: the run
    // ends at the fetch branch.
    let collaborators = rig.collaborators(articles(1), None);
    let report = WorkflowEngine::new(rig.config.clone(), collaborators)
        .run()
        .await
        .unwrap();

    assert_eq!(report.fetched, 0);
    assert_eq!(transition_path(&report), vec![WorkflowState::Done]);
}
