//! Terminal chat client over a remote chat-completion model.
//!
//! ## Bootstrap
//!
//! Settings come from the environment (a `.env` file in the working directory
//! is loaded first):
//!
//! - `CACHE_PATH` (required): existing directory for rotating
//!   `cached_chatlog_<YYYY-MM-DD_HH-MM>.jsonl` transcripts.
//! - `SAVE_PATH`: directory for the markdown export offered at exit.
//! - `CHATLOG_PROVIDER`: `openai` (default) or `mock` for offline runs.
//! - `OPENAI_API_KEY` (required for `openai`), `OPENAI_BASE_URL`.
//! - `CHATLOG_MODEL`, `CHATLOG_MODELS`, `CHATLOG_MAX_HISTORY`,
//!   `CHATLOG_MAX_CACHED_FILES`, `CHATLOG_SYSTEM_PROMPT`,
//!   `CHATLOG_TIMEOUT_SEC`, `CHATLOG_RESUME`.
//! - `CHATLOG_LOG`: tracing filter for diagnostics on stderr (default `warn`).
//!
//! ## Conversation memory
//!
//! [`transcript::Transcript`] keeps the most recent `max_history` messages plus
//! a standing system directive. The directive is prepended on every request
//! except for reasoning models (`o1*`), which reject system messages.
//!
//! After every turn the whole transcript is written to the current cache entry;
//! `/history_list` and `/load_history` browse and restore earlier sessions.

pub mod commands;
pub mod config;
pub mod export;
pub mod logging;
pub mod providers;
pub mod session;
pub mod transcript;
pub mod tui;
pub mod ui;
