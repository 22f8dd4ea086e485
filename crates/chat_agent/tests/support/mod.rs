#![allow(dead_code)]

use std::collections::VecDeque;
use std::io;
use std::path::Path;
use std::sync::Arc;

use agent_provider::ChatProvider;
use chat_agent::session::SessionController;
use chat_agent::transcript::Transcript;
use chat_agent::ui::ChatUi;
use session_store::{CacheEntryInfo, CacheOptions, LogCacheManager};
use time::macros::datetime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Welcome,
    ModelStatus(String),
    User(String),
    Bot(String),
    Info(String),
    Error(String),
    ModelList { models: Vec<String>, current: String },
    CacheEntries(Vec<String>),
    Help,
    Working(String),
    Prompt(String),
    Confirm(String),
}

/// Scripted console: replays queued input and records every call.
#[derive(Default)]
pub struct RecordingUi {
    pub messages: VecDeque<String>,
    pub lines: VecDeque<String>,
    pub confirmations: VecDeque<bool>,
    pub confirm_broken: bool,
    pub events: Vec<UiEvent>,
}

impl RecordingUi {
    pub fn with_messages<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            messages: messages.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn confirm(mut self, answer: bool) -> Self {
        self.confirmations.push_back(answer);
        self
    }

    /// Makes the save confirmation fail as a closed terminal would.
    pub fn broken_confirm(mut self) -> Self {
        self.confirm_broken = true;
        self
    }

    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.lines.push_back(line.into());
        self
    }

    pub fn errors(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                UiEvent::Error(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn infos(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                UiEvent::Info(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn bot_messages(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|event| match event {
                UiEvent::Bot(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl ChatUi for RecordingUi {
    fn welcome(&mut self) {
        self.events.push(UiEvent::Welcome);
    }

    fn model_status(&mut self, model: &str) {
        self.events.push(UiEvent::ModelStatus(model.to_string()));
    }

    fn user_message(&mut self, text: &str) {
        self.events.push(UiEvent::User(text.to_string()));
    }

    fn bot_message(&mut self, text: &str) {
        self.events.push(UiEvent::Bot(text.to_string()));
    }

    fn info(&mut self, text: &str) {
        self.events.push(UiEvent::Info(text.to_string()));
    }

    fn error(&mut self, text: &str) {
        self.events.push(UiEvent::Error(text.to_string()));
    }

    fn model_list(&mut self, models: &[String], current: &str) {
        self.events.push(UiEvent::ModelList {
            models: models.to_vec(),
            current: current.to_string(),
        });
    }

    fn cache_entries(&mut self, entries: &[CacheEntryInfo]) {
        self.events.push(UiEvent::CacheEntries(
            entries.iter().map(|entry| entry.name.clone()).collect(),
        ));
    }

    fn help(&mut self) {
        self.events.push(UiEvent::Help);
    }

    fn working(&mut self, model: &str) {
        self.events.push(UiEvent::Working(model.to_string()));
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.events.push(UiEvent::Prompt(prompt.to_string()));
        Ok(self.lines.pop_front())
    }

    fn read_message(&mut self) -> io::Result<Option<String>> {
        Ok(self.messages.pop_front())
    }

    fn confirm_save(&mut self, title: &str) -> io::Result<bool> {
        self.events.push(UiEvent::Confirm(title.to_string()));
        if self.confirm_broken {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "terminal closed"));
        }
        Ok(self.confirmations.pop_front().unwrap_or(false))
    }
}

pub const CURRENT_ENTRY: &str = "cached_chatlog_2026-03-01_12-30.jsonl";

pub fn cache_options() -> CacheOptions {
    CacheOptions::default().with_started_at(datetime!(2026-03-01 12:30:15 UTC))
}

pub fn cache_in(dir: &Path) -> LogCacheManager {
    LogCacheManager::initialize(dir, cache_options()).expect("cache should initialize")
}

pub fn session(
    cache_dir: &Path,
    provider: Arc<dyn ChatProvider>,
    model: &str,
) -> SessionController {
    SessionController::new(Transcript::default(), cache_in(cache_dir), provider, model)
}
