use std::io;

use session_store::CacheEntryInfo;

/// Everything the session needs from a console.
///
/// Output methods are fire-and-forget. Input methods return `Ok(None)` at end
/// of input.
pub trait ChatUi {
    fn welcome(&mut self);
    fn model_status(&mut self, model: &str);
    fn user_message(&mut self, text: &str);
    fn bot_message(&mut self, text: &str);
    fn info(&mut self, text: &str);
    fn error(&mut self, text: &str);
    fn model_list(&mut self, models: &[String], current: &str);
    fn cache_entries(&mut self, entries: &[CacheEntryInfo]);
    fn help(&mut self);
    /// Shown while a provider call is in flight.
    fn working(&mut self, model: &str);

    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>>;
    /// Reads one chat turn, which may span several lines.
    fn read_message(&mut self) -> io::Result<Option<String>>;
    fn confirm_save(&mut self, title: &str) -> io::Result<bool>;
}
