//! Observability hook for round fan-out.
//!
//! Orchestration logic reports progress through this trait instead of
//! printing, so presentation can change without touching the round logic.

use crate::types::Message;

/// Receives progress callbacks while a round's participant calls resolve.
pub trait ProgressHook: Send + Sync {
    /// A round's fan-out has been issued for `participants` calls.
    fn round_started(&self, round: u32, label: &str, participants: usize) {
        let _ = (round, label, participants);
    }

    /// One participant's call resolved. Completion order, not panel order.
    fn participant_done(&self, round: u32, label: &str, message: &Message) {
        let _ = (round, label, message);
    }
}

/// Default hook: structured log lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressHook for TracingProgress {
    fn round_started(&self, round: u32, label: &str, participants: usize) {
        tracing::info!(round, label, participants, "round fan-out issued");
    }

    fn participant_done(&self, round: u32, label: &str, message: &Message) {
        tracing::info!(round, label, participant = %message.role, "participant turn complete");
    }
}

/// Hook that drops everything. Used in tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentProgress;

impl ProgressHook for SilentProgress {}
