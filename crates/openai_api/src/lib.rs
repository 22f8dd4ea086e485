//! Transport-only OpenAI Chat Completions client primitives.
//!
//! This crate owns request building, response decoding, error-body parsing and
//! the retry policy for the `chat/completions` endpoint. It carries no provider
//! abstraction and no terminal coupling.

pub mod client;
pub mod config;
pub mod error;
pub mod payload;
pub mod retry;
pub mod url;

pub use client::OpenAiApiClient;
pub use config::OpenAiApiConfig;
pub use error::OpenAiApiError;
pub use payload::{ChatCompletionMessage, ChatCompletionRequest, ChatCompletionResponse};
pub use reqwest::StatusCode;
pub use url::normalize_chat_completions_url;
