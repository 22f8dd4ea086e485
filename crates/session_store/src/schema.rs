use std::path::{Path, PathBuf};
use std::time::SystemTime;

use agent_provider::ChatMessage;

use crate::error::CacheError;

/// Directory listing row for one cache entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntryInfo {
    pub name: String,
    pub path: PathBuf,
    pub modified: SystemTime,
    pub size: u64,
}

/// A cache entry resolved by [`crate::LogCacheManager::load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedEntry {
    pub info: CacheEntryInfo,
    pub records: Vec<ChatMessage>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvictionFailure {
    pub name: String,
    pub message: String,
}

/// Outcome of one eviction pass; failures never abort the pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvictionReport {
    pub removed: Vec<String>,
    pub failed: Vec<EvictionFailure>,
}

impl EvictionReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

pub(crate) fn encode_records(path: &Path, records: &[ChatMessage]) -> Result<String, CacheError> {
    let mut out = String::new();
    for record in records {
        let line = serde_json::to_string(record)
            .map_err(|source| CacheError::json_serialize(path, source))?;
        out.push_str(&line);
        out.push('\n');
    }
    Ok(out)
}

pub(crate) fn parse_record_line(
    path: &Path,
    line_number: usize,
    line: &[u8],
) -> Result<ChatMessage, CacheError> {
    serde_json::from_slice::<ChatMessage>(line)
        .map_err(|source| CacheError::corrupt(path, line_number, source))
}
