#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Exit,
    ChangeModel(Option<String>),
    ModelList,
    Undo,
    HistoryList,
    LoadHistory(Option<String>),
    ClearHistory,
    Help,
    SystemPrompt(Option<String>),
    MaxHistory(Option<String>),
    Unknown(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandHelp {
    pub usage: &'static str,
    pub description: &'static str,
}

pub const COMMAND_HELP: &[CommandHelp] = &[
    CommandHelp {
        usage: "/change_model <model_name>",
        description: "Change the AI model.",
    },
    CommandHelp {
        usage: "/model_list",
        description: "List the available models.",
    },
    CommandHelp {
        usage: "/undo",
        description: "Remove the last interaction.",
    },
    CommandHelp {
        usage: "/history_list",
        description: "List cached chat logs.",
    },
    CommandHelp {
        usage: "/load_history [name]",
        description: "Restore a cached chat log by file name or prefix.",
    },
    CommandHelp {
        usage: "/clear_history",
        description: "Clear the conversation history.",
    },
    CommandHelp {
        usage: "/system_prompt [text]",
        description: "Show or replace the system prompt.",
    },
    CommandHelp {
        usage: "/max_history [n]",
        description: "Show or change how many messages are kept.",
    },
    CommandHelp {
        usage: "/help",
        description: "Show help message.",
    },
    CommandHelp {
        usage: "/exit or /quit or /bye",
        description: "Exit the chat.",
    },
];

/// Parses a `/`-prefixed line. The command word is case-insensitive;
/// `/system_prompt` takes the rest of the input verbatim, other commands take
/// the first following word.
pub fn parse_command(input: &str) -> Option<Command> {
    let trimmed = input.trim();
    if !trimmed.starts_with('/') {
        return None;
    }

    let (word, rest) = match trimmed.find(char::is_whitespace) {
        Some(index) => (&trimmed[..index], trimmed[index..].trim()),
        None => (trimmed, ""),
    };
    let rest = (!rest.is_empty()).then(|| rest.to_string());
    let first_arg = || {
        rest.as_deref()
            .and_then(|rest| rest.split_whitespace().next())
            .map(str::to_string)
    };

    let parsed = match word.to_ascii_lowercase().as_str() {
        "/exit" | "/quit" | "/bye" => Command::Exit,
        "/change_model" => Command::ChangeModel(first_arg()),
        "/model_list" => Command::ModelList,
        "/undo" => Command::Undo,
        "/history_list" => Command::HistoryList,
        "/load_history" => Command::LoadHistory(first_arg()),
        "/clear_history" => Command::ClearHistory,
        "/help" => Command::Help,
        "/system_prompt" => Command::SystemPrompt(rest),
        "/max_history" => Command::MaxHistory(first_arg()),
        _ => Command::Unknown(word.to_string()),
    };

    Some(parsed)
}
