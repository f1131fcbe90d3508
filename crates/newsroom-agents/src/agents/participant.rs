//! A persona-bound participant.
//!
//! Each operation builds one role- and context-specific prompt from the
//! persona's fixed system prompt plus the relevant transcript slice, invokes
//! the generation backend exactly once, and returns the raw text unmodified.
//! Participants hold no state beyond the persona prompt and never see each
//! other's internals, only the shared transcript they are handed.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::backend::{ChatMessage, GenerationBackend};
use crate::personas::Persona;
use crate::prompts;
use crate::types::{Article, ArticleWithContent, Message};

pub struct Participant {
    backend: Arc<dyn GenerationBackend>,
    persona: Persona,
    system_prompt: String,
}

impl Participant {
    pub fn new(backend: Arc<dyn GenerationBackend>, persona: Persona) -> Self {
        let system_prompt = prompts::build_persona_prompt(&persona);
        Self {
            backend,
            persona,
            system_prompt,
        }
    }

    /// The nickname used as this participant's transcript role.
    pub fn name(&self) -> &str {
        &self.persona.nickname
    }

    pub fn id(&self) -> &str {
        &self.persona.id
    }

    async fn respond(&self, prompt: String) -> Result<String> {
        let messages = [
            ChatMessage::system(self.system_prompt.clone()),
            ChatMessage::user(prompt),
        ];
        self.backend
            .invoke(&messages)
            .await
            .with_context(|| format!("generation failed for participant {}", self.persona.nickname))
    }

    /// Round 1 of the title phase: propose 2-3 candidates by position.
    pub async fn nominate(&self, articles: &[Article]) -> Result<String> {
        let prompt = format!(
            "Here is today's candidate article list:\n\n{list}\n\n\
             From your professional angle, pick the 2-3 articles that interest \
             you most. Requirements:\n\
             1. Name each article by its number (like #1 or #15).\n\
             2. Give a concrete reason why each nominated article matters.\n\
             3. Stay in character.",
            list = prompts::format_candidate_list(articles),
        );
        self.respond(prompt).await
    }

    /// Round 2 of the title phase: argue over the nominated subset, with
    /// the full nomination digest as context.
    pub async fn debate(
        &self,
        articles: &[Article],
        nominations_digest: &str,
    ) -> Result<String> {
        let prompt = format!(
            "Here is everyone's nominations and reasoning:\n\n{nominations_digest}\n\n\
             The nominated articles:\n{list}\n\n\
             React to the other nominations:\n\
             - you may back a nomination and add to its case\n\
             - you may push back on one and say why\n\
             - you may defend your own picks\n\n\
             Stay in character; keep it under 150 words.",
            list = prompts::format_title_list(articles),
        );
        self.respond(prompt).await
    }

    /// Final round of the title phase: cast one vote in free text.
    pub async fn vote(&self, articles: &[Article], transcript: &[Message]) -> Result<String> {
        let prompt = format!(
            "The discussion is over; time to vote. Candidate articles:\n\n{list}\n\n\
             The discussion so far:\n{context}\n\n\
             Cast your single vote: state the article number you choose and \
             your reason. Stay in character.",
            list = prompts::format_title_list(articles),
            context = prompts::format_transcript(transcript),
        );
        self.respond(prompt).await
    }

    /// Round 1 of the content phase: judge the narrowed set on substance.
    pub async fn evaluate(&self, articles: &[ArticleWithContent]) -> Result<String> {
        let summaries = articles
            .iter()
            .enumerate()
            .map(|(i, a)| {
                format!(
                    "{}. {}\nSummary: {}",
                    i + 1,
                    a.article.title,
                    a.summary.as_deref().unwrap_or("(no summary)")
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = format!(
            "Here are the content summaries of the shortlisted articles:\n\n\
             {summaries}\n\n\
             From your professional angle, assess the quality and value of \
             each. Stay in character; keep it under 100 words.",
        );
        self.respond(prompt).await
    }

    /// Final round of the content phase: vote for today's best.
    pub async fn vote_content(
        &self,
        articles: &[ArticleWithContent],
        transcript: &[Message],
    ) -> Result<String> {
        let titles: Vec<Article> = articles.iter().map(|a| a.article.clone()).collect();
        let prompt = format!(
            "After the content discussion, it is time for the final vote. \
             Candidate articles:\n\n{list}\n\n\
             The discussion so far:\n{context}\n\n\
             Cast your vote for today's best: state the article number and \
             your reason. Stay in character.",
            list = prompts::format_title_list(&titles),
            context = prompts::format_transcript(transcript),
        );
        self.respond(prompt).await
    }
}
