//! Agent roles for the editorial meeting.
//!
//! Both roles wrap [`GenerationBackend`](crate::backend::GenerationBackend)
//! calls with role-specific prompts and are stateless between calls apart
//! from their fixed persona system prompt.

pub mod moderator;
pub mod participant;

pub use moderator::Moderator;
pub use participant::Participant;

/// Which discussion a prompt is framing: title triage or content quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Title,
    Content,
}
