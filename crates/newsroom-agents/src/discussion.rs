//! Discussion orchestration: multi-round fan-out, vote tallying, selection.
//!
//! One orchestrator drives one phase at a time. Every round opens with a
//! single moderator message, then fans out one backend call per participant
//! and joins them all before the round seals (join, not race): a failed call
//! fails the round, a slow one stalls it, and round *k+1* never starts
//! before round *k* is sealed. Sealed rounds are appended to the transcript
//! as they complete, so an interrupted run still leaves a valid record.

use std::future::Future;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::agents::{Moderator, Participant, Phase};
use crate::progress::ProgressHook;
use crate::transcript::TranscriptWriter;
use crate::types::{Article, ArticleWithContent, DiscussionRound, Message, MODERATOR_ROLE};
use crate::voting;

/// How many articles advance past the title vote.
const TITLE_SELECTION_SIZE: usize = 3;

/// Result of the title phase: sealed rounds plus the ranked selection.
pub struct TitlePhaseOutcome {
    pub rounds: Vec<DiscussionRound>,
    /// Vote-ranked winners, at most three. Empty when no article received
    /// a vote.
    pub selected: Vec<Article>,
}

/// Result of the content phase: sealed rounds, the winner, and the
/// moderator's recommendation text.
#[derive(Debug)]
pub struct ContentPhaseOutcome {
    pub rounds: Vec<DiscussionRound>,
    pub winner: ArticleWithContent,
    pub summary: String,
}

pub struct DiscussionOrchestrator {
    moderator: Moderator,
    participants: Vec<Arc<Participant>>,
    progress: Arc<dyn ProgressHook>,
}

impl DiscussionOrchestrator {
    pub fn new(
        moderator: Moderator,
        participants: Vec<Participant>,
        progress: Arc<dyn ProgressHook>,
    ) -> Self {
        Self {
            moderator,
            participants: participants.into_iter().map(Arc::new).collect(),
            progress,
        }
    }

    /// The phase moderator, also used by the workflow's direct-summary path.
    pub fn moderator(&self) -> &Moderator {
        &self.moderator
    }

    /// Issue one backend call per participant, join them all, and return the
    /// responses in panel order. Progress is reported per completion through
    /// the hook, in completion order.
    async fn fan_out<F, Fut>(&self, round: u32, label: &str, task: F) -> Result<Vec<Message>>
    where
        F: Fn(Arc<Participant>) -> Fut,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        self.progress
            .round_started(round, label, self.participants.len());

        let mut join_set = JoinSet::new();
        for (idx, participant) in self.participants.iter().enumerate() {
            let name = participant.name().to_string();
            let fut = task(Arc::clone(participant));
            join_set.spawn(async move { (idx, name, fut.await) });
        }

        let mut slots: Vec<Option<Message>> = (0..self.participants.len()).map(|_| None).collect();
        while let Some(joined) = join_set.join_next().await {
            let (idx, name, result) = joined.context("participant task panicked")?;
            let message = Message {
                role: name,
                content: result?,
                round,
            };
            self.progress.participant_done(round, label, &message);
            slots[idx] = Some(message);
        }

        Ok(slots.into_iter().flatten().collect())
    }

    fn seal_round(moderator_msg: Message, responses: Vec<Message>) -> DiscussionRound {
        let round = moderator_msg.round;
        let mut messages = Vec::with_capacity(responses.len() + 1);
        messages.push(moderator_msg);
        messages.extend(responses);
        DiscussionRound {
            round,
            messages,
            votes: None,
        }
    }

    /// Run the three title rounds (nomination, debate, vote) over the full
    /// candidate set and select up to three articles by vote.
    pub async fn run_title_phase(
        &self,
        articles: &[Article],
        transcript: &mut TranscriptWriter,
    ) -> Result<TitlePhaseOutcome> {
        let candidates = Arc::new(articles.to_vec());
        let mut context: Vec<Message> = Vec::new();

        // Round 1: nominations.
        let opening = self.moderator.open_discussion(articles, Phase::Title).await?;
        let responses = self
            .fan_out(1, "nomination", {
                let candidates = Arc::clone(&candidates);
                move |p| {
                    let candidates = Arc::clone(&candidates);
                    async move { p.nominate(&candidates).await }
                }
            })
            .await?;
        let round1 = Self::seal_round(
            Message {
                role: MODERATOR_ROLE.into(),
                content: opening,
                round: 1,
            },
            responses,
        );
        transcript.append_round(&round1, "Round 1 - Nominations")?;
        context.extend(round1.messages.iter().cloned());

        // Narrow the debate to the nominated subset, falling back to the
        // full candidate set when no positional reference resolves.
        let nominated: Vec<Article> = voting::extract_nominations(&round1.messages, articles)
            .into_iter()
            .cloned()
            .collect();
        let digest = Arc::new(voting::format_nominations(&round1.messages));
        let debate_set = if nominated.is_empty() {
            warn!("no nominations resolved; debating the full candidate set");
            Arc::clone(&candidates)
        } else {
            info!(count = nominated.len(), "nominations extracted");
            Arc::new(nominated)
        };

        // Round 2: debate.
        let guide = self.moderator.guide_debate(&context).await?;
        let responses = self
            .fan_out(2, "debate", {
                let debate_set = Arc::clone(&debate_set);
                let digest = Arc::clone(&digest);
                move |p| {
                    let debate_set = Arc::clone(&debate_set);
                    let digest = Arc::clone(&digest);
                    async move { p.debate(&debate_set, &digest).await }
                }
            })
            .await?;
        let round2 = Self::seal_round(
            Message {
                role: MODERATOR_ROLE.into(),
                content: guide,
                round: 2,
            },
            responses,
        );
        transcript.append_round(&round2, "Round 2 - Debate")?;
        context.extend(round2.messages.iter().cloned());

        // Round 3: vote over the full candidate set.
        let call = self.moderator.call_vote(&context).await?;
        let history = Arc::new(context.clone());
        let responses = self
            .fan_out(3, "vote", {
                let candidates = Arc::clone(&candidates);
                let history = Arc::clone(&history);
                move |p| {
                    let candidates = Arc::clone(&candidates);
                    let history = Arc::clone(&history);
                    async move { p.vote(&candidates, &history).await }
                }
            })
            .await?;
        let mut round3 = Self::seal_round(
            Message {
                role: MODERATOR_ROLE.into(),
                content: call,
                round: 3,
            },
            responses,
        );
        let votes = self.moderator.collect_votes(&round3.messages, articles).await;
        round3.votes = Some(votes);
        transcript.append_round(&round3, "Round 3 - Vote")?;

        let selected_ids = voting::select_top_ids(
            round3.votes.as_deref().unwrap_or(&[]),
            articles,
            TITLE_SELECTION_SIZE,
        );
        let selected: Vec<Article> = selected_ids
            .iter()
            .filter_map(|id| articles.iter().find(|a| &a.id == id).cloned())
            .collect();
        info!(count = selected.len(), "title vote complete");

        Ok(TitlePhaseOutcome {
            rounds: vec![round1, round2, round3],
            selected,
        })
    }

    /// Run the two content rounds (evaluation, vote) over the narrowed set
    /// and produce the winner plus the moderator's recommendation.
    pub async fn run_content_phase(
        &self,
        articles: &[ArticleWithContent],
        transcript: &mut TranscriptWriter,
    ) -> Result<ContentPhaseOutcome> {
        if articles.is_empty() {
            bail!("content phase reached with no candidate articles");
        }

        let bare: Vec<Article> = articles.iter().map(|a| a.article.clone()).collect();
        let shortlist = Arc::new(articles.to_vec());
        let mut context: Vec<Message> = Vec::new();

        // Round 1: content evaluation. The set is fixed, no nominations.
        let opening = self.moderator.open_discussion(&bare, Phase::Content).await?;
        let responses = self
            .fan_out(1, "content review", {
                let shortlist = Arc::clone(&shortlist);
                move |p| {
                    let shortlist = Arc::clone(&shortlist);
                    async move { p.evaluate(&shortlist).await }
                }
            })
            .await?;
        let round1 = Self::seal_round(
            Message {
                role: MODERATOR_ROLE.into(),
                content: opening,
                round: 1,
            },
            responses,
        );
        transcript.append_round(&round1, "Round 1 - Content review")?;
        context.extend(round1.messages.iter().cloned());

        // Round 2: final vote.
        let call = self.moderator.call_vote(&context).await?;
        let history = Arc::new(context.clone());
        let responses = self
            .fan_out(2, "final vote", {
                let shortlist = Arc::clone(&shortlist);
                let history = Arc::clone(&history);
                move |p| {
                    let shortlist = Arc::clone(&shortlist);
                    let history = Arc::clone(&history);
                    async move { p.vote_content(&shortlist, &history).await }
                }
            })
            .await?;
        let mut round2 = Self::seal_round(
            Message {
                role: MODERATOR_ROLE.into(),
                content: call,
                round: 2,
            },
            responses,
        );
        let votes = self.moderator.collect_votes(&round2.messages, &bare).await;
        round2.votes = Some(votes);
        transcript.append_round(&round2, "Round 2 - Final vote")?;
        context.extend(round2.messages.iter().cloned());

        let winner_id = voting::select_top_ids(round2.votes.as_deref().unwrap_or(&[]), &bare, 1)
            .into_iter()
            .next();
        let winner = match winner_id {
            Some(id) => articles
                .iter()
                .find(|a| a.article.id == id)
                .cloned()
                .unwrap_or_else(|| articles[0].clone()),
            None => {
                warn!("content vote produced no winner; falling back to first candidate");
                articles[0].clone()
            }
        };
        info!(title = %winner.article.title, "final article selected");

        let summary = self.moderator.final_recommendation(&winner, &context).await?;
        transcript.append_final(&winner, &summary)?;

        Ok(ContentPhaseOutcome {
            rounds: vec![round1, round2],
            winner,
            summary,
        })
    }
}
