//! Markdown export of a finished conversation.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

pub const SAVE_PATH_ENV_VAR: &str = "SAVE_PATH";
pub const EXPORT_EXTENSION: &str = "md";
pub const MAX_FILE_STEM_CHARS: usize = 80;
pub const FALLBACK_FILE_STEM: &str = "chat_log";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("SAVE_PATH environment variable not set")]
    MissingSaveDir,

    #[error("save directory {path} does not exist or is not a directory")]
    InvalidSaveDir { path: PathBuf },

    #[error("failed to save chat history to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Turns a model-written title into a safe file stem.
///
/// Markdown decoration and quotes are dropped, whitespace and path separators
/// become `_`, runs of `_` collapse, and the result is capped at
/// [`MAX_FILE_STEM_CHARS`] characters.
pub fn title_to_file_stem(title: &str) -> String {
    let mut stem = String::new();
    for ch in title.trim().chars() {
        let mapped = match ch {
            '*' | '#' | '`' | '"' | '\'' => continue,
            ch if ch.is_whitespace() || ch.is_control() => '_',
            '/' | '\\' | ':' | '?' | '<' | '>' | '|' => '_',
            ch => ch,
        };
        if mapped == '_' && stem.ends_with('_') {
            continue;
        }
        stem.push(mapped);
    }

    let stem: String = stem
        .trim_matches(|ch| ch == '_' || ch == '.')
        .chars()
        .take(MAX_FILE_STEM_CHARS)
        .collect();
    let stem = stem.trim_end_matches('_');
    if stem.is_empty() {
        FALLBACK_FILE_STEM.to_string()
    } else {
        stem.to_string()
    }
}

/// Writes `body` to `<save_dir>/<title stem>.md`, replacing any earlier file.
pub fn export_transcript(
    save_dir: Option<&Path>,
    title: &str,
    body: &str,
) -> Result<PathBuf, ExportError> {
    let dir = save_dir.ok_or(ExportError::MissingSaveDir)?;
    if !dir.is_dir() {
        return Err(ExportError::InvalidSaveDir {
            path: dir.to_path_buf(),
        });
    }

    let path = dir.join(format!("{}.{EXPORT_EXTENSION}", title_to_file_stem(title)));
    fs::write(&path, body).map_err(|source| ExportError::Write {
        path: path.clone(),
        source,
    })?;

    info!(path = %path.display(), bytes = body.len(), "conversation exported");
    Ok(path)
}
