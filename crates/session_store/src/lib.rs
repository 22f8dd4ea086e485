//! Rotating NDJSON cache of chat transcripts.
//!
//! Each process writes one `cached_chatlog_<YYYY-MM-DD_HH-MM>.jsonl` entry in the
//! directory named by `CACHE_PATH`, one `{"role","content"}` object per line.
//! Saves replace the entry atomically and then evict the oldest entries beyond
//! the retention count.

mod error;
mod paths;
mod schema;
mod store;

pub use error::CacheError;
pub use paths::{
    cache_file_name, entry_timestamp, is_cache_file_name, CACHE_FILE_EXTENSION,
    CACHE_FILE_PREFIX, CACHE_PATH_ENV_VAR,
};
pub use schema::{CacheEntryInfo, EvictionFailure, EvictionReport, LoadedEntry};
pub use store::{CacheOptions, LogCacheManager, DEFAULT_MAX_CACHED_FILES};
