use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache directory {path} does not exist or is not a directory")]
    InvalidCacheDir { path: PathBuf },

    #[error("no cached chat log matches '{identifier}' in {dir}")]
    NotFound { identifier: String, dir: PathBuf },

    #[error("cached chat log {path} is corrupt at line {line}: {source}")]
    CorruptEntry {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error while {operation} at {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error while reading line {line} in {path}: {source}")]
    IoLine {
        path: PathBuf,
        line: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize chat log record for {path}: {source}")]
    JsonSerialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to format session start timestamp: {0}")]
    ClockFormat(#[source] time::error::Format),
}

impl CacheError {
    #[must_use]
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    #[must_use]
    pub fn io_line(path: impl Into<PathBuf>, line: usize, source: std::io::Error) -> Self {
        Self::IoLine {
            path: path.into(),
            line,
            source,
        }
    }

    #[must_use]
    pub fn corrupt(path: impl Into<PathBuf>, line: usize, source: serde_json::Error) -> Self {
        Self::CorruptEntry {
            path: path.into(),
            line,
            source,
        }
    }

    #[must_use]
    pub fn json_serialize(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::JsonSerialize {
            path: path.into(),
            source,
        }
    }

    /// Startup-time misconfiguration; the only class of cache error that is fatal.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::InvalidCacheDir { .. })
    }

    /// Errors a caller should treat as "nothing to load" and fall back from.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::CorruptEntry { .. })
    }
}
