//! Deterministic test doubles for orchestration tests.
//!
//! `ScriptedBackend` serves canned responses in FIFO order so discussion
//! phases can run without live API calls. Calls beyond the script fall back
//! to a default response when one is set, otherwise fail like an empty
//! backend reply.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::backend::{BackendError, ChatMessage, GenerationBackend};

#[derive(Default)]
pub struct ScriptedBackend {
    responses: Mutex<VecDeque<String>>,
    default_response: Option<String>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that answers every call with `response`.
    pub fn with_default(response: impl Into<String>) -> Self {
        Self {
            default_response: Some(response.into()),
            ..Self::default()
        }
    }

    /// Queue the next response.
    pub fn enqueue(&self, response: impl Into<String>) {
        self.responses
            .lock()
            .expect("script lock poisoned")
            .push_back(response.into());
    }

    /// Queue `count` copies of `response` (one fan-out round's worth).
    pub fn enqueue_n(&self, count: usize, response: impl Into<String>) {
        let response = response.into();
        for _ in 0..count {
            self.enqueue(response.clone());
        }
    }

    /// Number of invocations so far.
    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("calls lock poisoned").len()
    }

    /// Every message list the backend was invoked with, in call order.
    pub fn recorded_calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().expect("calls lock poisoned").clone()
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn invoke(&self, messages: &[ChatMessage]) -> Result<String, BackendError> {
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .push(messages.to_vec());

        let next = self
            .responses
            .lock()
            .expect("script lock poisoned")
            .pop_front();

        match next.or_else(|| self.default_response.clone()) {
            Some(response) => Ok(response),
            None => Err(BackendError::EmptyResponse),
        }
    }
}
