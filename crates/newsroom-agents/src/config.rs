use std::path::PathBuf;

/// OpenAI-compatible chat-completions endpoint configuration.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub url: String,
    pub api_key: String,
    pub model: String,
}

/// Mastodon publishing credentials. Absent when the env vars are unset, in
/// which case the publish stage is skipped.
#[derive(Debug, Clone)]
pub struct MastodonConfig {
    /// Instance base URL, e.g. `https://fosstodon.org`.
    pub instance: String,
    pub access_token: String,
}

/// Top-level configuration for one editorial run.
#[derive(Debug, Clone)]
pub struct NewsroomConfig {
    /// Generation backend endpoint shared by all agent roles.
    pub backend: Endpoint,
    /// Sampling temperature for discussion turns.
    pub discussion_temperature: f64,
    /// Sampling temperature for article summaries and extraction.
    pub summary_temperature: f64,
    /// Directory of persona Markdown files.
    pub personas_dir: PathBuf,
    /// Published-article history (JSON, URL-keyed dedup).
    pub history_path: PathBuf,
    /// Directory for per-day discussion transcripts.
    pub transcripts_dir: PathBuf,
    /// Per-source fetch limit.
    pub fetch_limit: usize,
    /// When set, the publish stage composes the status but does not post it.
    pub dry_run: bool,
    /// Mastodon publishing target (optional).
    pub mastodon: Option<MastodonConfig>,
}

impl Default for NewsroomConfig {
    fn default() -> Self {
        Self {
            backend: Endpoint {
                url: std::env::var("NEWSROOM_API_URL")
                    .unwrap_or_else(|_| "https://api.openai.com/v1".into()),
                api_key: std::env::var("NEWSROOM_API_KEY").unwrap_or_default(),
                model: std::env::var("NEWSROOM_MODEL")
                    .unwrap_or_else(|_| "gpt-4o-mini".into()),
            },
            discussion_temperature: 0.7,
            summary_temperature: 0.3,
            personas_dir: PathBuf::from("personas"),
            history_path: PathBuf::from("data/history.json"),
            transcripts_dir: PathBuf::from("discussions"),
            fetch_limit: 25,
            dry_run: std::env::var("NEWSROOM_DRY_RUN").map(|v| v == "true").unwrap_or(false),
            mastodon: Self::mastodon_from_env(),
        }
    }
}

impl NewsroomConfig {
    fn mastodon_from_env() -> Option<MastodonConfig> {
        let instance = std::env::var("MASTODON_INSTANCE").ok()?;
        let access_token = std::env::var("MASTODON_ACCESS_TOKEN").ok()?;
        Some(MastodonConfig {
            instance,
            access_token,
        })
    }
}
