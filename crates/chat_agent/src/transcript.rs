//! Bounded conversation memory.

use std::collections::VecDeque;

use agent_provider::{ChatMessage, ChatRole};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_MAX_HISTORY: usize = 20;
pub const DEFAULT_SYSTEM_DIRECTIVE: &str = "You are a helpful assistant";

/// Model-name prefixes of reasoning models that reject system messages.
pub const REASONING_MODEL_PREFIXES: &[&str] = &["o1"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranscriptError {
    #[error("no interaction to remove (history holds {len} message(s))")]
    InsufficientHistory { len: usize },
    #[error("history bound must be at least 1")]
    InvalidBound,
}

pub fn is_reasoning_model(model: &str) -> bool {
    let model = model.trim().to_ascii_lowercase();
    REASONING_MODEL_PREFIXES
        .iter()
        .any(|prefix| model.starts_with(prefix))
}

/// Ordered messages of the active conversation.
///
/// Holds at most `bound` messages; every mutation that can grow the history
/// drops the oldest messages first. The system directive is stored apart from
/// the messages and never counts against the bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    messages: VecDeque<ChatMessage>,
    bound: usize,
    system_directive: ChatMessage,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HISTORY)
    }
}

impl Transcript {
    /// A bound of zero is raised to one.
    pub fn new(bound: usize) -> Self {
        Self::with_system_directive(bound, DEFAULT_SYSTEM_DIRECTIVE)
    }

    pub fn with_system_directive(bound: usize, directive: impl Into<String>) -> Self {
        Self {
            messages: VecDeque::new(),
            bound: bound.max(1),
            system_directive: ChatMessage::system(directive),
        }
    }

    /// Returns how many old messages were evicted to make room.
    pub fn append(&mut self, message: ChatMessage) -> usize {
        self.messages.push_back(message);
        self.enforce_bound()
    }

    /// Changes the bound and trims immediately; returns the evicted count.
    pub fn set_bound(&mut self, bound: usize) -> Result<usize, TranscriptError> {
        if bound == 0 {
            return Err(TranscriptError::InvalidBound);
        }
        self.bound = bound;
        Ok(self.enforce_bound())
    }

    /// Drops every message; the system directive stays.
    pub fn clear(&mut self) -> usize {
        let removed = self.messages.len();
        self.messages.clear();
        removed
    }

    /// Removes the final user message and assistant reply, returned in that order.
    pub fn undo_last_pair(&mut self) -> Result<(ChatMessage, ChatMessage), TranscriptError> {
        let len = self.messages.len();
        if len < 2 {
            return Err(TranscriptError::InsufficientHistory { len });
        }
        match (self.messages.pop_back(), self.messages.pop_back()) {
            (Some(reply), Some(prompt)) => Ok((prompt, reply)),
            _ => Err(TranscriptError::InsufficientHistory { len }),
        }
    }

    pub fn set_system_directive(&mut self, directive: impl Into<String>) {
        self.system_directive = ChatMessage::system(directive);
    }

    /// Messages for a completion request against `model`.
    pub fn render_for_send(&self, model: &str) -> Vec<ChatMessage> {
        let mut out = Vec::with_capacity(self.messages.len() + 1);
        if !is_reasoning_model(model) {
            out.push(self.system_directive.clone());
        }
        out.extend(self.messages.iter().cloned());
        out
    }

    /// Markdown export of every message but the last, which holds the
    /// end-of-session title reply.
    pub fn render_as_text(&self) -> String {
        let keep = self.messages.len().saturating_sub(1);
        let mut out = String::new();
        for message in self.messages.iter().take(keep) {
            let label = match message.role {
                ChatRole::User => "User",
                ChatRole::Assistant => "Assistant",
                ChatRole::System => "System",
            };
            out.push_str(&format!("**{label}**: \n{}\n\n", message.content));
        }
        out.trim_end().to_string()
    }

    /// Swaps in a restored history; the bound still applies.
    pub fn replace_messages(&mut self, messages: impl IntoIterator<Item = ChatMessage>) -> usize {
        self.messages = messages.into_iter().collect();
        self.enforce_bound()
    }

    /// Pops a trailing user message equal to `content` that never got a reply.
    pub fn rollback_pending_user(&mut self, content: &str) -> bool {
        let pending = self
            .messages
            .back()
            .is_some_and(|last| last.role == ChatRole::User && last.content == content);
        if pending {
            self.messages.pop_back();
        }
        pending
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.messages.iter().cloned().collect()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.back()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn bound(&self) -> usize {
        self.bound
    }

    pub fn system_directive(&self) -> &str {
        &self.system_directive.content
    }

    fn enforce_bound(&mut self) -> usize {
        let excess = self.messages.len().saturating_sub(self.bound);
        if excess > 0 {
            self.messages.drain(..excess);
            debug!(evicted = excess, bound = self.bound, "trimmed conversation history");
        }
        excess
    }
}
