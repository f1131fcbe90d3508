//! System prompts and prompt-assembly helpers for the agent roles.

use crate::personas::Persona;
use crate::types::{Article, Message};

/// Character budget stated in the final-recommendation prompt.
pub const RECOMMENDATION_CHAR_BUDGET: usize = 500;

/// Built-in moderator system prompt, used whenever the moderator persona
/// file cannot be loaded.
pub const DEFAULT_MODERATOR_PROMPT: &str = "\
You are a seasoned tech-community moderator running a daily developer-news
editorial meeting.

Your responsibilities:
1. Guide the flow of discussion and make sure every participant gets heard.
2. Keep the pace and prevent the panel from drifting off topic.
3. After discussion, weigh the panel's views and drive a final decision.
4. Produce concise, pointed summaries.

Meeting format:
- Round 1: each participant nominates 2-3 articles with brief reasons.
- Round 2: the panel debates the nominated articles, for and against.
- Round 3: each participant casts one vote; results are tallied.

Stay neutral and respect every participant's point of view.";

/// Extraction-only system role used when converting vote statements into
/// structured records. Kept separate from the moderator persona so the
/// extraction step has no stylistic voice.
pub const EXTRACTION_PREAMBLE: &str =
    "You are a data extraction assistant. You read meeting statements and \
     extract voting information. You reply with JSON only.";

/// System role for the article summarization step.
pub const SUMMARIZER_PREAMBLE: &str = "\
You are a technical editor skilled at distilling articles. Summarize the
article in 2-3 sentences, highlighting its technical value and what is new.";

/// Build the fixed system prompt for one participant.
pub fn build_persona_prompt(persona: &Persona) -> String {
    let interests = persona
        .interests
        .iter()
        .map(|i| format!("- {i}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are \"{nickname}\", a {name}.\n\n\
         ## Your traits\n{description}\n\n\
         ## Areas you care about\n{interests}\n\n\
         ## Your voting preference\n{voting}\n\n\
         ## Your speaking style\n{style}\n\n\
         Always stay in character and speak in the first person, in your own \
         voice. Keep every statement tight and under 100 words.",
        nickname = persona.nickname,
        name = persona.name,
        description = persona.description,
        interests = interests,
        voting = persona.voting_preference,
        style = persona.speaking_style,
    )
}

/// Build the moderator system prompt from the moderator persona.
pub fn build_moderator_prompt(persona: &Persona) -> String {
    let interests = persona
        .interests
        .iter()
        .map(|i| format!("- {i}"))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are \"{nickname}\", a senior {name}, and the moderator of this \
         developer-news editorial meeting.\n\n\
         ## Your traits\n{description}\n\n\
         ## Areas you care about\n{interests}\n\n\
         ## Your content preferences\n{voting}\n\n\
         ## Your speaking style\n{style}\n\n\
         As moderator you must:\n\
         1. Guide the discussion and make sure every participant gets heard.\n\
         2. Weigh the panel's views after discussion and make the final call.\n\
         3. Write summaries that are concise, opinionated, and yours.\n\n\
         Keep your voice: sincere, pragmatic, with depth.",
        nickname = persona.nickname,
        name = persona.name,
        description = persona.description,
        interests = interests,
        voting = persona.voting_preference,
        style = persona.speaking_style,
    )
}

/// Format a numbered candidate list with source labels, as shown to agents.
pub fn format_candidate_list(articles: &[Article]) -> String {
    articles
        .iter()
        .enumerate()
        .map(|(i, a)| format!("{}. [{}] {}", i + 1, a.source.label(), a.title))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a numbered title-only list (used in vote prompts).
pub fn format_title_list(articles: &[Article]) -> String {
    articles
        .iter()
        .enumerate()
        .map(|(i, a)| format!("{}. {}", i + 1, a.title))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a transcript slice as `role: content` blocks.
pub fn format_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Source;

    fn persona() -> Persona {
        Persona {
            id: "tech-geek".into(),
            name: "Tech Geek".into(),
            nickname: "Bits".into(),
            description: "curious; blunt".into(),
            interests: vec!["compilers".into(), "kernels".into()],
            voting_preference: "novelty first".into(),
            speaking_style: "dry humor".into(),
        }
    }

    #[test]
    fn test_persona_prompt_contains_identity() {
        let prompt = build_persona_prompt(&persona());
        assert!(prompt.contains("\"Bits\""));
        assert!(prompt.contains("- compilers"));
        assert!(prompt.contains("novelty first"));
    }

    #[test]
    fn test_moderator_prompt_mentions_role() {
        let prompt = build_moderator_prompt(&persona());
        assert!(prompt.contains("moderator"));
        assert!(prompt.contains("Tech Geek"));
    }

    #[test]
    fn test_candidate_list_is_one_based_with_labels() {
        let articles = vec![
            Article {
                id: "hn-1".into(),
                title: "First".into(),
                url: "https://a".into(),
                source: Source::HackerNews,
                score: None,
                comments: None,
                author: None,
                tags: Vec::new(),
            },
            Article {
                id: "lobsters-x".into(),
                title: "Second".into(),
                url: "https://b".into(),
                source: Source::Lobsters,
                score: None,
                comments: None,
                author: None,
                tags: Vec::new(),
            },
        ];
        let list = format_candidate_list(&articles);
        assert_eq!(list, "1. [HN] First\n2. [Lobsters] Second");
    }
}
