//! Line-oriented terminal front end.

use std::io::{self, BufRead, StdinLock, Stdout, Write};
use std::time::SystemTime;

use chatlog_console::{Color, MarkdownRenderer, Palette, Panel, RenderConfig, Style, Table};
use session_store::CacheEntryInfo;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};
use tracing::debug;

use crate::commands::COMMAND_HELP;
use crate::ui::ChatUi;

const MESSAGE_PROMPT: &str = "Ask your question. (Press Ctrl+D to submit input)";
const TIP: &str =
    "Type your message and press Ctrl+D to send it. Lines starting with / are commands.";

const USER_BORDER: Style = Style::new().fg(Color::Cyan);
const BOT_BORDER: Style = Style::new().fg(Color::Magenta);
const ERROR_LABEL: Style = Style::new().fg(Color::Red).bold();
const INFO_LABEL: Style = Style::new().fg(Color::Yellow).bold();
const TABLE_HEADER: Style = Style::new().fg(Color::Blue).bold();

/// [`ChatUi`] over any line reader and writer.
pub struct TerminalUi<R, W> {
    input: R,
    output: W,
    palette: Palette,
    width: usize,
    markdown: MarkdownRenderer,
}

impl TerminalUi<StdinLock<'static>, Stdout> {
    pub fn stdio(config: RenderConfig) -> Self {
        Self::new(io::stdin().lock(), io::stdout(), config)
    }
}

impl<R: BufRead, W: Write> TerminalUi<R, W> {
    pub fn new(input: R, output: W, config: RenderConfig) -> Self {
        let palette = Palette::new(config.color);
        Self {
            input,
            output,
            palette,
            width: config.width,
            markdown: MarkdownRenderer::from_palette(&palette),
        }
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn emit<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut result = Ok(());
        for line in lines {
            result = writeln!(self.output, "{}", line.as_ref());
            if result.is_err() {
                break;
            }
        }
        if let Err(error) = result.and_then(|()| self.output.flush()) {
            debug!(%error, "terminal write failed");
        }
    }

    fn message_panel(&mut self, title: &str, border: Style, text: &str) {
        let body = self.markdown.render(text, self.width.saturating_sub(4));
        let lines = Panel::new()
            .title(title)
            .border(border)
            .render(&body, self.width, &self.palette);
        self.emit(lines);
    }

    fn command_table(&self) -> Vec<String> {
        let mut table = Table::new(["Command", "Description"])
            .title("Available Commands")
            .header_style(TABLE_HEADER)
            .column_style(0, Style::new().fg(Color::Cyan))
            .column_style(1, Style::new().fg(Color::Magenta));
        for entry in COMMAND_HELP {
            table.add_row([entry.usage, entry.description]);
        }
        table.render(self.width, &self.palette)
    }

    fn raw_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    fn prompt(&mut self, prompt: &str) -> io::Result<()> {
        write!(self.output, "{prompt}")?;
        self.output.flush()
    }
}

impl<R: BufRead, W: Write> ChatUi for TerminalUi<R, W> {
    fn welcome(&mut self) {
        let greeting = format!(
            "{}{}",
            self.palette.paint(Style::new().fg(Color::Cyan).bold(), "Welcome to the "),
            self.palette.paint(Style::new().fg(Color::Magenta).bold(), "ChatBot!")
        );
        let banner = Panel::new()
            .border(Style::new().fg(Color::Green).bold())
            .fit_content()
            .render(&[greeting], self.width, &self.palette);
        self.emit(banner);
        self.help();
    }

    fn model_status(&mut self, model: &str) {
        let model = self.palette.paint(Style::new().fg(Color::Green).bold(), model);
        self.emit([format!("Current answering model: {model}")]);
    }

    fn user_message(&mut self, text: &str) {
        self.message_panel("User", USER_BORDER, text);
    }

    fn bot_message(&mut self, text: &str) {
        self.message_panel("Assistant", BOT_BORDER, text);
    }

    fn info(&mut self, text: &str) {
        let label = self.palette.paint(INFO_LABEL, "Info:");
        self.emit([format!("{label} {text}")]);
    }

    fn error(&mut self, text: &str) {
        let label = self.palette.paint(ERROR_LABEL, "Error:");
        self.emit([format!("{label} {text}")]);
    }

    fn model_list(&mut self, models: &[String], current: &str) {
        let mut table = Table::new(["Model Name"])
            .title("Available Models")
            .header_style(TABLE_HEADER)
            .column_style(0, Style::new().fg(Color::Cyan));
        for model in models {
            if model == current {
                table.add_row([format!("{model} (current)")]);
            } else {
                table.add_row([model.as_str()]);
            }
        }
        let lines = table.render(self.width, &self.palette);
        self.emit(lines);
    }

    fn cache_entries(&mut self, entries: &[CacheEntryInfo]) {
        let mut table = Table::new(["#", "File", "Modified", "Size"])
            .title("Cached Chat Logs")
            .header_style(TABLE_HEADER)
            .column_style(1, Style::new().fg(Color::Cyan));
        for (index, entry) in entries.iter().enumerate() {
            table.add_row([
                (index + 1).to_string(),
                entry.name.clone(),
                format_modified(entry.modified),
                format_size(entry.size),
            ]);
        }
        let lines = table.render(self.width, &self.palette);
        self.emit(lines);
    }

    fn help(&mut self) {
        let mut lines = self.command_table();
        lines.push(String::new());
        lines.push(TIP.to_string());
        lines.push(String::new());
        self.emit(lines);
    }

    fn working(&mut self, model: &str) {
        let status = self
            .palette
            .paint(Style::new().fg(Color::Green).bold(), "Working on tasks...");
        let model = self.palette.paint(Style::new().dim(), &format!("({model})"));
        self.emit([format!("{status} {model}")]);
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.prompt(prompt)?;
        self.raw_line()
    }

    /// Collects lines until end of input. A first line starting with `/` is
    /// returned on its own so commands need no Ctrl+D.
    fn read_message(&mut self) -> io::Result<Option<String>> {
        self.emit([MESSAGE_PROMPT, "You:"]);

        let mut lines: Vec<String> = Vec::new();
        while let Some(line) = self.raw_line()? {
            if lines.is_empty() && line.trim_start().starts_with('/') {
                return Ok(Some(line.trim().to_string()));
            }
            lines.push(line);
        }

        if lines.is_empty() {
            return Ok(None);
        }
        Ok(Some(lines.join("\n").trim().to_string()))
    }

    fn confirm_save(&mut self, title: &str) -> io::Result<bool> {
        let prompt = format!(
            "Do you want to save this conversation summary: \"{title}\"? {} ",
            self.palette.paint(Style::new().fg(Color::Magenta).bold(), "[yes/no] (no):")
        );
        loop {
            let Some(answer) = self.read_line(&prompt)? else {
                return Ok(false);
            };
            match answer.trim().to_ascii_lowercase().as_str() {
                "yes" | "y" => return Ok(true),
                "no" | "n" | "" => return Ok(false),
                _ => self.error("Please select one of the available options: yes, no"),
            }
        }
    }
}

fn format_modified(modified: SystemTime) -> String {
    let offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);
    OffsetDateTime::from(modified)
        .to_offset(offset)
        .format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
        .unwrap_or_else(|_| "-".to_string())
}

fn format_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    if bytes < KIB {
        format!("{bytes} B")
    } else if bytes < KIB * KIB {
        format!("{:.1} KiB", bytes as f64 / KIB as f64)
    } else {
        format!("{:.1} MiB", bytes as f64 / (KIB * KIB) as f64)
    }
}
