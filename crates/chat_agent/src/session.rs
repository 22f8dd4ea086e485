//! Turn loop tying the transcript, the log cache and the provider together.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use agent_provider::{ChatMessage, ChatProvider, CompletionRequest, ProviderError};
use session_store::LogCacheManager;
use tracing::{debug, info, warn};

use crate::commands::{parse_command, Command};
use crate::export::export_transcript;
use crate::transcript::{Transcript, TranscriptError};
use crate::ui::ChatUi;

pub const TITLE_PROMPT: &str = "Think deeply about the conversation and give it an appropriate title. The title should be short and concise, replace the spaces with '_'. Don't write as markdown format.";
pub const FALLBACK_REPLY: &str =
    "I'm sorry, but I'm unable to process your request at the moment.";
pub const GOODBYE: &str = "Goodbye!";
const LOAD_PROMPT: &str = "Enter the filename: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Exit,
}

/// Owns the live conversation for one process.
///
/// Every completed turn (and every command that changes the history) is
/// persisted to the current cache entry. Failures inside the loop are shown
/// through [`ChatUi::error`] and never end the session.
pub struct SessionController {
    transcript: Transcript,
    cache: LogCacheManager,
    provider: Arc<dyn ChatProvider>,
    model: String,
    models: Vec<String>,
    save_dir: Option<PathBuf>,
}

impl SessionController {
    pub fn new(
        transcript: Transcript,
        cache: LogCacheManager,
        provider: Arc<dyn ChatProvider>,
        model: impl Into<String>,
    ) -> Self {
        let models = provider.available_models();
        Self {
            transcript,
            cache,
            provider,
            model: model.into(),
            models,
            save_dir: None,
        }
    }

    pub fn with_save_dir(mut self, save_dir: Option<PathBuf>) -> Self {
        self.save_dir = save_dir;
        self
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn cache(&self) -> &LogCacheManager {
        &self.cache
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Runs until an exit command or end of input, then offers the export.
    pub fn run(&mut self, ui: &mut dyn ChatUi) -> io::Result<()> {
        ui.welcome();
        loop {
            ui.model_status(&self.model);
            let Some(input) = ui.read_message()? else {
                debug!("input closed");
                break;
            };
            if self.handle_input(&input, ui)? == LoopControl::Exit {
                break;
            }
        }

        self.finish(ui)
    }

    /// Dispatches one line of input: a slash command or a chat turn.
    pub fn handle_input(&mut self, input: &str, ui: &mut dyn ChatUi) -> io::Result<LoopControl> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(LoopControl::Continue);
        }

        match parse_command(input) {
            Some(command) => self.handle_command(command, ui),
            None => {
                self.send_turn(input, ui);
                Ok(LoopControl::Continue)
            }
        }
    }

    pub fn handle_command(&mut self, command: Command, ui: &mut dyn ChatUi) -> io::Result<LoopControl> {
        debug!(?command, "handling command");
        match command {
            Command::Exit => {
                ui.bot_message(GOODBYE);
                return Ok(LoopControl::Exit);
            }
            Command::ChangeModel(None) => {
                ui.error("Please specify the model name. Usage: /change_model <model_name>");
            }
            Command::ChangeModel(Some(model)) => {
                info!(from = %self.model, to = %model, "model changed");
                ui.info(&format!("Model has been changed to '{model}'."));
                self.model = model;
            }
            Command::ModelList => ui.model_list(&self.models, &self.model),
            Command::Undo => match self.transcript.undo_last_pair() {
                Ok(_) => {
                    ui.info("Last interaction has been removed from history.");
                    self.persist(ui);
                }
                Err(TranscriptError::InsufficientHistory { .. }) => {
                    ui.info("No interaction to remove.");
                }
                Err(error) => ui.error(&error.to_string()),
            },
            Command::HistoryList => match self.cache.list_entries() {
                Ok(entries) if entries.is_empty() => ui.info(&format!(
                    "No cached chat logs in {}.",
                    self.cache.cache_dir().display()
                )),
                Ok(entries) => ui.cache_entries(&entries),
                Err(error) => ui.error(&format!("Failed to list cached chat logs: {error}")),
            },
            Command::LoadHistory(identifier) => {
                let identifier = match identifier {
                    Some(identifier) => Some(identifier),
                    None => ui.read_line(LOAD_PROMPT)?,
                };
                match identifier.as_deref().map(str::trim) {
                    Some(identifier) if !identifier.is_empty() => self.resume(identifier, ui),
                    _ => ui.info("No file name given; history unchanged."),
                }
            }
            Command::ClearHistory => {
                self.transcript.clear();
                ui.info("Conversation history has been cleared.");
                self.persist(ui);
            }
            Command::Help => ui.help(),
            Command::SystemPrompt(None) => ui.info(&format!(
                "Current system prompt: {}",
                self.transcript.system_directive()
            )),
            Command::SystemPrompt(Some(text)) => {
                self.transcript.set_system_directive(text);
                ui.info("System prompt has been updated.");
            }
            Command::MaxHistory(None) => ui.info(&format!(
                "History keeps the latest {} messages.",
                self.transcript.bound()
            )),
            Command::MaxHistory(Some(raw)) => self.change_bound(&raw, ui),
            Command::Unknown(word) => ui.error(&format!(
                "Unknown command '{word}'. Type /help for a list of available commands."
            )),
        }

        Ok(LoopControl::Continue)
    }

    /// Replaces the transcript with a cached entry. Lookup or parse failures
    /// are reported and leave the transcript as it was.
    pub fn resume(&mut self, identifier: &str, ui: &mut dyn ChatUi) {
        match self.cache.load(identifier) {
            Ok(entry) => {
                let count = entry.records.len();
                let evicted = self.transcript.replace_messages(entry.records);
                let mut message = format!("Loaded {count} messages from {}.", entry.info.name);
                if evicted > 0 {
                    message.push_str(&format!(
                        " Kept the latest {}; {evicted} older messages were dropped.",
                        self.transcript.len()
                    ));
                }
                ui.info(&message);
                self.persist(ui);
            }
            Err(error) => {
                warn!(%identifier, %error, "loading cached chat log failed");
                ui.error(&error.to_string());
            }
        }
    }

    fn change_bound(&mut self, raw: &str, ui: &mut dyn ChatUi) {
        let Ok(bound) = raw.parse::<usize>() else {
            ui.error(&format!(
                "'{raw}' is not a number. Usage: /max_history <n> with n >= 1"
            ));
            return;
        };

        match self.transcript.set_bound(bound) {
            Ok(0) => ui.info(&format!("History now keeps the latest {bound} messages.")),
            Ok(evicted) => {
                ui.info(&format!(
                    "History now keeps the latest {bound} messages; {evicted} older messages were dropped."
                ));
                self.persist(ui);
            }
            Err(error) => ui.error(&format!("{error}. Usage: /max_history <n> with n >= 1")),
        }
    }

    fn send_turn(&mut self, text: &str, ui: &mut dyn ChatUi) {
        ui.user_message(text);
        ui.working(&self.model);

        match self.exchange(text) {
            Ok(reply) => ui.bot_message(&reply),
            Err(error) => {
                ui.error(&format!("The model request failed: {error}"));
                ui.bot_message(FALLBACK_REPLY);
            }
        }

        self.persist(ui);
    }

    /// Appends `text`, asks the provider, and appends the reply. On failure the
    /// pending user message is rolled back so the history stays in pairs.
    fn exchange(&mut self, text: &str) -> Result<String, ProviderError> {
        self.transcript.append(ChatMessage::user(text));
        let request = CompletionRequest::new(
            self.model.clone(),
            self.transcript.render_for_send(&self.model),
        );

        match self.provider.complete(request) {
            Ok(reply) => {
                let content = reply.content;
                self.transcript.append(ChatMessage::assistant(content.clone()));
                debug!(model = %self.model, history = self.transcript.len(), "turn completed");
                Ok(content)
            }
            Err(error) => {
                self.transcript.rollback_pending_user(text);
                warn!(model = %self.model, %error, "completion failed");
                Err(error)
            }
        }
    }

    fn persist(&self, ui: &mut dyn ChatUi) {
        match self.cache.save(&self.transcript.messages()) {
            Ok(report) if !report.is_clean() => {
                debug!(failed = report.failed.len(), "some cached chat logs could not be evicted");
            }
            Ok(_) => {}
            Err(error) => ui.error(&format!("Failed to save chat log: {error}")),
        }
    }

    /// End-of-session summary: asks the model for a title and offers to export
    /// the conversation under it. Skipped for an empty conversation.
    fn finish(&mut self, ui: &mut dyn ChatUi) -> io::Result<()> {
        if self.transcript.is_empty() {
            debug!("empty conversation; skipping summary");
            return Ok(());
        }

        ui.working(&self.model);
        let title = match self.exchange(TITLE_PROMPT) {
            Ok(title) => title,
            Err(error) => {
                ui.error(&format!("An error occurred while summarizing: {error}"));
                return Ok(());
            }
        };

        match ui.confirm_save(&title) {
            Ok(true) => {}
            Ok(false) => {
                ui.info("Conversation was not saved.");
                return Ok(());
            }
            Err(error) => {
                warn!(%error, "save confirmation failed");
                ui.error(&format!("Could not read the save confirmation: {error}"));
                return Ok(());
            }
        }

        match export_transcript(self.save_dir.as_deref(), &title, &self.transcript.render_as_text()) {
            Ok(path) => ui.info(&format!("Chat history saved to {}.", path.display())),
            Err(error) => ui.error(&error.to_string()),
        }
        Ok(())
    }
}
