//! Persona catalog: loading and parsing the panel's fixed identities.
//!
//! Each persona lives in one Markdown file under the personas directory:
//! a `# Name` heading, a `- nickname:` line, and `##` sections for traits,
//! interests, voting preference, and speaking style. The file set and order
//! are fixed per run; personas are immutable once loaded.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Participant persona files, in panel speaking order.
const PERSONA_FILES: &[&str] = &[
    "frontend-engineer",
    "backend-architect",
    "devops-engineer",
    "indie-hacker",
    "junior-developer",
    "product-manager",
    "designer",
    "tech-geek",
];

const MODERATOR_FILE: &str = "moderator";

/// A fixed textual identity bound to one participant or the moderator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    pub id: String,
    pub name: String,
    pub nickname: String,
    pub description: String,
    pub interests: Vec<String>,
    pub voting_preference: String,
    pub speaking_style: String,
}

/// Parse one persona Markdown document.
///
/// Unknown sections are ignored; missing sections leave the corresponding
/// field empty rather than failing, since persona authoring is outside this
/// crate's contract.
pub fn parse_persona_md(content: &str, id: &str) -> Persona {
    let mut persona = Persona {
        id: id.to_string(),
        name: String::new(),
        nickname: String::new(),
        description: String::new(),
        interests: Vec::new(),
        voting_preference: String::new(),
        speaking_style: String::new(),
    };

    let mut section = "";

    for line in content.lines() {
        let trimmed = line.trim();

        if let Some(name) = trimmed.strip_prefix("# ") {
            persona.name = name.to_string();
        } else if let Some(heading) = trimmed.strip_prefix("## ") {
            section = match heading {
                "Traits" => "traits",
                "Interests" => "interests",
                "Voting preference" => "voting",
                "Speaking style" => "style",
                _ => "",
            };
        } else if let Some(rest) = trimmed.strip_prefix("- nickname:") {
            persona.nickname = rest.trim().to_string();
        } else if let Some(item) = trimmed.strip_prefix("- ") {
            match section {
                "traits" => push_joined(&mut persona.description, item),
                "interests" => persona.interests.push(item.to_string()),
                "voting" => push_joined(&mut persona.voting_preference, item),
                "style" => push_joined(&mut persona.speaking_style, item),
                _ => {}
            }
        }
    }

    persona
}

fn push_joined(field: &mut String, item: &str) {
    if !field.is_empty() {
        field.push_str("; ");
    }
    field.push_str(item);
}

/// Load the fixed ordered participant set from `dir`.
pub fn load_personas(dir: &Path) -> Result<Vec<Persona>> {
    let mut personas = Vec::with_capacity(PERSONA_FILES.len());
    for id in PERSONA_FILES {
        let path = dir.join(format!("{id}.md"));
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read persona file {}", path.display()))?;
        personas.push(parse_persona_md(&content, id));
    }
    Ok(personas)
}

/// Load the moderator persona from `dir`.
///
/// Callers treat failure here as recoverable: the moderator falls back to a
/// built-in system prompt rather than failing the phase.
pub fn load_moderator(dir: &Path) -> Result<Persona> {
    let path = dir.join(format!("{MODERATOR_FILE}.md"));
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read moderator file {}", path.display()))?;
    Ok(parse_persona_md(&content, MODERATOR_FILE))
}
