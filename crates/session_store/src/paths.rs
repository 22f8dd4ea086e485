use time::macros::format_description;
use time::OffsetDateTime;

use crate::error::CacheError;

pub const CACHE_PATH_ENV_VAR: &str = "CACHE_PATH";
pub const CACHE_FILE_PREFIX: &str = "cached_chatlog_";
pub const CACHE_FILE_EXTENSION: &str = ".jsonl";
const TEMP_FILE_SUFFIX: &str = ".tmp";

/// Minute-granularity stamp, e.g. `2026-10-19_14-05`.
pub fn entry_timestamp(at: OffsetDateTime) -> Result<String, CacheError> {
    at.format(format_description!("[year]-[month]-[day]_[hour]-[minute]"))
        .map_err(CacheError::ClockFormat)
}

#[must_use]
pub fn cache_file_name(timestamp: &str) -> String {
    format!("{CACHE_FILE_PREFIX}{timestamp}{CACHE_FILE_EXTENSION}")
}

/// Matches the `cached_chatlog_*.jsonl` retention pattern.
#[must_use]
pub fn is_cache_file_name(name: &str) -> bool {
    name.len() >= CACHE_FILE_PREFIX.len() + CACHE_FILE_EXTENSION.len()
        && name.starts_with(CACHE_FILE_PREFIX)
        && name.ends_with(CACHE_FILE_EXTENSION)
}

/// Hidden sibling used for write-then-rename; never matches the cache pattern.
#[must_use]
pub fn temp_file_name(entry_name: &str) -> String {
    format!(".{entry_name}{TEMP_FILE_SUFFIX}")
}
