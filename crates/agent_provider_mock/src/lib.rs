//! Deterministic mock implementation of the shared `agent_provider` contract.
//!
//! This crate contains no transport/protocol logic and is intended for local
//! development and contract-level integration testing.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use agent_provider::{ChatMessage, ChatProvider, CompletionRequest, ProviderError, ProviderProfile};

/// Stable provider identifier used for explicit startup selection.
pub const MOCK_PROVIDER_ID: &str = "mock";

/// Deterministic mock provider used by `chat_agent` tests and offline runs.
///
/// Scripted replies are consumed in order. Once the script is exhausted the
/// provider answers with a fixed acknowledgement of the last user message.
#[derive(Debug)]
pub struct MockProvider {
    model_ids: Vec<String>,
    script: Mutex<VecDeque<Result<String, ProviderError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockProvider {
    /// Creates a mock provider with caller-provided replies and default model options.
    #[must_use]
    pub fn new(replies: Vec<String>) -> Self {
        Self::with_script(replies.into_iter().map(Ok).collect())
    }

    /// Creates a mock provider whose script may include failures.
    #[must_use]
    pub fn with_script(script: Vec<Result<String, ProviderError>>) -> Self {
        Self::with_models(
            script,
            vec!["mock".to_string(), "o1-mock".to_string()],
        )
    }

    /// Creates a mock provider with explicit model options.
    #[must_use]
    pub fn with_models(script: Vec<Result<String, ProviderError>>, model_ids: Vec<String>) -> Self {
        Self {
            model_ids: sanitize_model_ids(model_ids),
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queues one more reply at the end of the script.
    pub fn push_reply(&self, reply: impl Into<String>) {
        lock_unpoisoned(&self.script).push_back(Ok(reply.into()));
    }

    /// Queues one failure at the end of the script.
    pub fn push_failure(&self, error: ProviderError) {
        lock_unpoisoned(&self.script).push_back(Err(error));
    }

    /// Returns every request received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<CompletionRequest> {
        lock_unpoisoned(&self.requests).clone()
    }

    fn fallback_reply(request: &CompletionRequest) -> String {
        let last_user = request
            .messages
            .iter()
            .rev()
            .find(|message| message.role == agent_provider::ChatRole::User)
            .map(|message| message.content.as_str())
            .unwrap_or_default();
        format!("(mock) You said: {last_user}")
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl ChatProvider for MockProvider {
    fn profile(&self) -> ProviderProfile {
        ProviderProfile {
            provider_id: MOCK_PROVIDER_ID.to_string(),
            default_model: self.model_ids[0].clone(),
        }
    }

    fn available_models(&self) -> Vec<String> {
        self.model_ids.clone()
    }

    fn complete(&self, request: CompletionRequest) -> Result<ChatMessage, ProviderError> {
        let scripted = lock_unpoisoned(&self.script).pop_front();
        let reply = match scripted {
            Some(Ok(text)) => text,
            Some(Err(error)) => {
                lock_unpoisoned(&self.requests).push(request);
                return Err(error);
            }
            None => Self::fallback_reply(&request),
        };

        lock_unpoisoned(&self.requests).push(request);
        Ok(ChatMessage::assistant(reply.trim()))
    }
}

fn sanitize_model_ids(model_ids: Vec<String>) -> Vec<String> {
    let mut sanitized: Vec<String> = model_ids
        .into_iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect();

    if sanitized.is_empty() {
        sanitized.push("mock".to_string());
    }

    sanitized
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
