//! The moderator: opens phases, guides transitions, extracts votes, and
//! writes the final recommendation.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::backend::{ChatMessage, GenerationBackend};
use crate::personas;
use crate::prompts::{self, DEFAULT_MODERATOR_PROMPT, EXTRACTION_PREAMBLE};
use crate::types::{Article, ArticleWithContent, Message, Vote, MODERATOR_ROLE};
use crate::voting;

use super::Phase;

pub struct Moderator {
    backend: Arc<dyn GenerationBackend>,
    system_prompt: String,
}

impl Moderator {
    /// Build the moderator for one phase, loading its persona from `dir`.
    ///
    /// Persona load failure is recoverable: the built-in default prompt is
    /// used and the phase proceeds.
    pub fn new(backend: Arc<dyn GenerationBackend>, dir: &Path) -> Self {
        let system_prompt = match personas::load_moderator(dir) {
            Ok(persona) => prompts::build_moderator_prompt(&persona),
            Err(e) => {
                debug!(error = %e, "moderator persona unavailable; using default prompt");
                DEFAULT_MODERATOR_PROMPT.to_string()
            }
        };
        Self {
            backend,
            system_prompt,
        }
    }

    async fn speak(&self, prompt: String) -> Result<String> {
        let messages = [
            ChatMessage::system(self.system_prompt.clone()),
            ChatMessage::user(prompt),
        ];
        self.backend
            .invoke(&messages)
            .await
            .context("moderator generation failed")
    }

    /// Open a phase with a framing message announcing the candidate set.
    pub async fn open_discussion(&self, articles: &[Article], phase: Phase) -> Result<String> {
        let context = match phase {
            Phase::Title => format!(
                "Today we have {} candidate articles. Based on the titles, pick \
                 out the ones most worth reading in depth.",
                articles.len()
            ),
            Phase::Content => format!(
                "We now have the full content of {} articles. Judge them on \
                 content quality and pick today's best.",
                articles.len()
            ),
        };

        let prompt = format!(
            "{context}\n\nCandidate articles:\n{list}\n\n\
             Declare the discussion open and invite the first round of statements.",
            list = prompts::format_candidate_list(articles),
        );

        self.speak(prompt).await
    }

    /// Guide the panel from the nomination round into the debate round.
    pub async fn guide_debate(&self, transcript: &[Message]) -> Result<String> {
        let context = prompts::format_transcript(transcript);
        let prompt = format!(
            "Here are the first-round nominations:\n\n{context}\n\n\
             Summarize the nominations and steer the panel into round two: \
             an open debate over the leading articles."
        );
        self.speak(prompt).await
    }

    /// Close the discussion and declare the voting round.
    pub async fn call_vote(&self, transcript: &[Message]) -> Result<String> {
        let context = prompts::format_transcript(transcript);
        let prompt = format!(
            "Here is the discussion so far:\n\n{context}\n\n\
             Summarize the key points and declare the final voting round. \
             Every participant casts exactly one vote."
        );
        self.speak(prompt).await
    }

    /// Convert the vote round's free-text statements into structured votes.
    ///
    /// Best-effort: a failed extraction call or unparseable output yields an
    /// empty vote set and the phase continues.
    pub async fn collect_votes(&self, messages: &[Message], candidates: &[Article]) -> Vec<Vote> {
        let statements: Vec<&Message> = messages
            .iter()
            .filter(|m| m.role != MODERATOR_ROLE)
            .collect();
        let statement_block = statements
            .iter()
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = format!(
            "Analyze the following vote statements and extract each \
             participant's choice.\n\n\
             Statements:\n{statement_block}\n\n\
             Article list:\n{list}\n\n\
             Reply with the votes as a JSON array in this exact shape:\n\
             [{{\"persona\": \"name\", \"articleNumber\": 1, \"reason\": \"why\"}}]\n\n\
             articleNumber must be a number matching the article list \
             (1, 2, 3...). Reply with the JSON only, nothing else.",
            list = prompts::format_title_list(candidates),
        );

        let request = [ChatMessage::system(EXTRACTION_PREAMBLE), ChatMessage::user(prompt)];
        match self.backend.invoke(&request).await {
            Ok(response) => voting::parse_votes(&response, candidates),
            Err(e) => {
                warn!(error = %e, "vote extraction call failed; treating as zero votes");
                Vec::new()
            }
        }
    }

    /// Write the final recommendation for the winning article, in the
    /// moderator's single voice, from the panel's (non-moderator) transcript.
    pub async fn final_recommendation(
        &self,
        article: &ArticleWithContent,
        transcript: &[Message],
    ) -> Result<String> {
        let discussion: Vec<Message> = transcript
            .iter()
            .filter(|m| m.role != MODERATOR_ROLE)
            .cloned()
            .collect();

        let prompt = format!(
            "Article title: {title}\n\
             Article link: {url}\n\
             Article summary: {summary}\n\n\
             Panel discussion:\n{discussion}\n\n\
             Drawing on the panel's views, write a recommendation for this \
             article in your own voice.\n\
             Requirements:\n\
             1. No more than {budget} characters.\n\
             2. Show your personal take; do not sound mechanical.\n\
             3. You may comment on the article's value or pick up a sharp \
                point from the discussion.\n\
             4. Sincere and pragmatic, like sharing a good read with a friend.\n\
             5. No hashtags, no emoji.\n\n\
             Reply with the recommendation text only.",
            title = article.article.title,
            url = article.article.url,
            summary = article.summary.as_deref().unwrap_or(""),
            discussion = prompts::format_transcript(&discussion),
            budget = prompts::RECOMMENDATION_CHAR_BUDGET,
        );

        Ok(self.speak(prompt).await?.trim().to_string())
    }
}
