//! Vote tallying, winner selection, and best-effort text extraction.
//!
//! Everything here is a replaceable policy over free-form generated text:
//! nomination references are scanned with a positional-reference regex, and
//! vote records are parsed out of a JSON substring the extraction call is
//! asked to produce. Both paths are intentionally lossy: on ambiguity the
//! result degrades to "nothing extracted" and the phase proceeds, with each
//! dropped record reported through `tracing::warn!` so the operator can see
//! what was lost.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::warn;

use crate::types::{Article, Message, Vote, MODERATOR_ROLE};

/// Positional candidate references: `#12` or the ordinal form `第12`.
static NOMINATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:#|第)(\d+)").expect("NOMINATION_RE regex should compile")
});

/// Count votes per article id. Only ids present in the candidate set count;
/// every candidate appears in the result, with zero for the unvoted.
pub fn tally_votes(votes: &[Vote], candidates: &[Article]) -> HashMap<String, usize> {
    let mut counts: HashMap<String, usize> = candidates
        .iter()
        .map(|a| (a.id.clone(), 0))
        .collect();
    for vote in votes {
        if let Some(count) = counts.get_mut(&vote.article_id) {
            *count += 1;
        }
    }
    counts
}

/// Rank candidates by vote count and return the top `top_n` ids.
///
/// Ordering is descending by count; ties break by the candidate set's
/// original order. Articles with zero votes are never selected, so the
/// result may be shorter than `top_n`, or empty.
pub fn select_top_ids(votes: &[Vote], candidates: &[Article], top_n: usize) -> Vec<String> {
    let counts = tally_votes(votes, candidates);

    let mut ranked: Vec<(usize, usize)> = candidates
        .iter()
        .enumerate()
        .filter_map(|(idx, a)| {
            let count = counts.get(&a.id).copied().unwrap_or(0);
            (count > 0).then_some((idx, count))
        })
        .collect();

    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked
        .into_iter()
        .take(top_n)
        .map(|(idx, _)| candidates[idx].id.clone())
        .collect()
}

/// Extract the candidates nominated in a round's free-text messages.
///
/// Scans non-moderator messages for positional references (`#3`, `第5`) and
/// maps each in-range reference back to the candidate at that 1-based
/// position. Duplicates collapse; result keeps candidate-set order. An empty
/// result means no reference resolved; callers fall back to the full set.
pub fn extract_nominations<'a>(messages: &[Message], candidates: &'a [Article]) -> Vec<&'a Article> {
    let mut nominated = vec![false; candidates.len()];

    for msg in messages {
        if msg.role == MODERATOR_ROLE {
            continue;
        }
        for cap in NOMINATION_RE.captures_iter(&msg.content) {
            if let Ok(n) = cap[1].parse::<usize>() {
                if n >= 1 && n <= candidates.len() {
                    nominated[n - 1] = true;
                }
            }
        }
    }

    candidates
        .iter()
        .zip(nominated)
        .filter_map(|(article, hit)| hit.then_some(article))
        .collect()
}

/// Format the round-1 nominations as a digest for the debate round.
pub fn format_nominations(messages: &[Message]) -> String {
    messages
        .iter()
        .filter(|m| m.role != MODERATOR_ROLE)
        .map(|m| format!("[{}'s nominations]\n{}", m.role, m.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Raw vote record as requested from the extraction call. The backend is
/// asked for `articleNumber`, but `articleId` shows up often enough that
/// both are accepted.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVote {
    #[serde(default)]
    persona: String,
    #[serde(default)]
    article_number: Option<i64>,
    #[serde(default)]
    article_id: Option<String>,
    #[serde(default)]
    reason: String,
}

/// Find the first balanced `[...]` substring of `text`.
///
/// Best-effort bracket matching; does not account for brackets inside JSON
/// string literals, which in practice the extraction prompt never produces.
pub fn first_json_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let mut depth = 0usize;
    for (offset, ch) in text[start..].char_indices() {
        match ch {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse the extraction call's output into resolved votes.
///
/// Fallback policy: no balanced array, unparseable JSON, or an unresolvable
/// record all degrade to fewer (possibly zero) votes. The phase never aborts
/// over extraction trouble.
pub fn parse_votes(response: &str, candidates: &[Article]) -> Vec<Vote> {
    let Some(json) = first_json_array(response) else {
        warn!("vote extraction output contained no JSON array; treating as zero votes");
        return Vec::new();
    };

    let raw: Vec<RawVote> = match serde_json::from_str(json) {
        Ok(raw) => raw,
        Err(e) => {
            warn!(error = %e, "vote extraction output failed to parse; treating as zero votes");
            return Vec::new();
        }
    };

    raw.into_iter()
        .filter_map(|record| resolve_vote(record, candidates))
        .collect()
}

/// Resolve one raw record to a concrete article id, or discard it.
fn resolve_vote(raw: RawVote, candidates: &[Article]) -> Option<Vote> {
    let by_position = |n: i64| -> Option<String> {
        (n >= 1 && n as usize <= candidates.len()).then(|| candidates[n as usize - 1].id.clone())
    };

    let article_id = match (raw.article_number, raw.article_id.as_deref()) {
        (Some(n), _) if by_position(n).is_some() => by_position(n),
        // A bare numeric id string is treated as a 1-based position too.
        (_, Some(id)) if id.chars().all(|c| c.is_ascii_digit()) && !id.is_empty() => {
            id.parse::<i64>().ok().and_then(by_position).or_else(|| Some(id.to_string()))
        }
        (_, Some(id)) if !id.is_empty() => Some(id.to_string()),
        _ => None,
    };

    match article_id {
        Some(article_id) => Some(Vote {
            persona: raw.persona,
            article_id,
            reason: raw.reason,
        }),
        None => {
            warn!(persona = %raw.persona, "discarding vote with no resolvable article");
            None
        }
    }
}
