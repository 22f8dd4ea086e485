use std::cmp::Ordering;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use agent_provider::ChatMessage;
use time::OffsetDateTime;
use tracing::{debug, info, warn};

use crate::error::CacheError;
use crate::paths::{
    cache_file_name, entry_timestamp, is_cache_file_name, temp_file_name, CACHE_FILE_PREFIX,
};
use crate::schema::{
    encode_records, parse_record_line, CacheEntryInfo, EvictionFailure, EvictionReport,
    LoadedEntry,
};

pub const DEFAULT_MAX_CACHED_FILES: usize = 10;

#[derive(Debug, Clone)]
pub struct CacheOptions {
    pub max_cached_files: usize,
    pub started_at: OffsetDateTime,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self {
            max_cached_files: DEFAULT_MAX_CACHED_FILES,
            started_at: OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc()),
        }
    }
}

impl CacheOptions {
    /// Retention count; values below one are raised to one.
    #[must_use]
    pub fn with_max_cached_files(mut self, max_cached_files: usize) -> Self {
        self.max_cached_files = max_cached_files.max(1);
        self
    }

    #[must_use]
    pub fn with_started_at(mut self, started_at: OffsetDateTime) -> Self {
        self.started_at = started_at;
        self
    }
}

/// Rotating on-disk store of serialized transcripts.
///
/// Owns every `cached_chatlog_*.jsonl` file in one directory. The entry for the
/// running process is named once from the session start time and overwritten
/// on each save.
#[derive(Debug)]
pub struct LogCacheManager {
    dir: PathBuf,
    entry_name: String,
    max_cached_files: usize,
}

impl LogCacheManager {
    /// Validates the directory, fixes the current entry name and runs one eviction pass.
    pub fn initialize(dir: impl Into<PathBuf>, options: CacheOptions) -> Result<Self, CacheError> {
        let dir = dir.into();
        if !dir.is_dir() {
            return Err(CacheError::InvalidCacheDir { path: dir });
        }

        let entry_name = cache_file_name(&entry_timestamp(options.started_at)?);
        let manager = Self {
            dir,
            entry_name,
            max_cached_files: options.max_cached_files.max(1),
        };

        let report = manager.evict_excess();
        debug!(
            dir = %manager.dir.display(),
            entry = %manager.entry_name,
            removed = report.removed.len(),
            "log cache initialized"
        );

        Ok(manager)
    }

    #[must_use]
    pub fn cache_dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn current_entry_name(&self) -> &str {
        &self.entry_name
    }

    #[must_use]
    pub fn current_entry_path(&self) -> PathBuf {
        self.dir.join(&self.entry_name)
    }

    #[must_use]
    pub fn max_cached_files(&self) -> usize {
        self.max_cached_files
    }

    /// Replaces the current entry with `records`, then evicts old entries.
    ///
    /// Content is written to a hidden sibling, synced, and renamed over the
    /// entry, so a reader never observes a half-written file.
    pub fn save(&self, records: &[ChatMessage]) -> Result<EvictionReport, CacheError> {
        let target = self.current_entry_path();
        let temp = self.dir.join(temp_file_name(&self.entry_name));
        let payload = encode_records(&target, records)?;

        if let Err(source) = write_synced(&temp, payload.as_bytes()) {
            discard_temp(&temp);
            return Err(CacheError::io("writing temporary chat log", &temp, source));
        }

        match fs::metadata(&target) {
            Ok(_) => debug!(path = %target.display(), "replacing previous cached chat log"),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                info!(path = %target.display(), "no cached chat log found; creating it")
            }
            Err(error) => debug!(path = %target.display(), %error, "could not stat cached chat log"),
        }

        if let Err(source) = fs::rename(&temp, &target) {
            discard_temp(&temp);
            return Err(CacheError::io("replacing cached chat log", &target, source));
        }

        info!(path = %target.display(), records = records.len(), "chat log saved");
        Ok(self.evict_excess())
    }

    /// Loads an entry by exact name or name prefix.
    ///
    /// An exact name wins; otherwise the most recently modified prefix match
    /// is used. Identifiers without the `cached_chatlog_` prefix are matched
    /// against the timestamp part as well.
    pub fn load(&self, identifier: &str) -> Result<LoadedEntry, CacheError> {
        let identifier = identifier.trim();
        let not_found = || CacheError::NotFound {
            identifier: identifier.to_string(),
            dir: self.dir.clone(),
        };

        if identifier.is_empty() || identifier.contains(['/', '\\']) {
            return Err(not_found());
        }

        let entries = self.list_entries()?;
        let chosen = entries
            .iter()
            .find(|entry| entry.name == identifier)
            .or_else(|| {
                entries
                    .iter()
                    .filter(|entry| matches_prefix(&entry.name, identifier))
                    .max_by(|left, right| compare_by_age(left, right))
            })
            .cloned()
            .ok_or_else(not_found)?;

        let records = match read_records(&chosen.path) {
            Ok(records) => records,
            Err(CacheError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                return Err(not_found());
            }
            Err(error) => {
                warn!(path = %chosen.path.display(), %error, "failed to load cached chat log");
                return Err(error);
            }
        };

        info!(path = %chosen.path.display(), records = records.len(), "loaded cached chat log");
        Ok(LoadedEntry {
            info: chosen,
            records,
        })
    }

    /// Cache entries ordered by modification time, oldest first.
    pub fn list_entries(&self) -> Result<Vec<CacheEntryInfo>, CacheError> {
        let read_dir = fs::read_dir(&self.dir)
            .map_err(|source| CacheError::io("listing cache directory", &self.dir, source))?;

        let mut entries = Vec::new();
        for dir_entry in read_dir {
            let dir_entry = match dir_entry {
                Ok(dir_entry) => dir_entry,
                Err(error) => {
                    warn!(dir = %self.dir.display(), %error, "skipping unreadable directory entry");
                    continue;
                }
            };

            let Some(name) = dir_entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if !is_cache_file_name(&name) {
                continue;
            }

            let path = dir_entry.path();
            let metadata = match fs::metadata(&path) {
                Ok(metadata) => metadata,
                Err(error) if error.kind() == io::ErrorKind::NotFound => continue,
                Err(error) => {
                    warn!(path = %path.display(), %error, "skipping cache entry without metadata");
                    continue;
                }
            };
            if !metadata.is_file() {
                continue;
            }

            entries.push(CacheEntryInfo {
                name,
                path,
                modified: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
                size: metadata.len(),
            });
        }

        entries.sort_by(compare_by_age);
        Ok(entries)
    }

    /// Deletes the oldest entries until at most `max_cached_files` remain.
    ///
    /// The current entry is never a candidate. Only the oldest surplus entries
    /// are attempted; one that cannot be deleted is reported and the pass moves
    /// on to the next surplus entry without reaching into newer ones.
    pub fn evict_excess(&self) -> EvictionReport {
        self.evict_with(|path| fs::remove_file(path))
    }

    fn evict_with<F>(&self, mut remove: F) -> EvictionReport
    where
        F: FnMut(&Path) -> io::Result<()>,
    {
        let mut report = EvictionReport::default();
        let entries = match self.list_entries() {
            Ok(entries) => entries,
            Err(error) => {
                warn!(%error, "skipping cache eviction");
                report.failed.push(EvictionFailure {
                    name: self.dir.display().to_string(),
                    message: error.to_string(),
                });
                return report;
            }
        };

        let surplus = entries.len().saturating_sub(self.max_cached_files);
        let candidates = entries
            .into_iter()
            .filter(|entry| entry.name != self.entry_name)
            .take(surplus);

        for entry in candidates {
            match remove(&entry.path) {
                Ok(()) => {
                    info!(path = %entry.path.display(), "deleted oldest cached file");
                    report.removed.push(entry.name);
                }
                Err(error) if error.kind() == io::ErrorKind::NotFound => {
                    debug!(path = %entry.path.display(), "cached file already gone");
                    report.removed.push(entry.name);
                }
                Err(error) => {
                    warn!(path = %entry.path.display(), %error, "failed to delete cached file");
                    report.failed.push(EvictionFailure {
                        name: entry.name,
                        message: error.to_string(),
                    });
                }
            }
        }

        report
    }
}

fn matches_prefix(name: &str, identifier: &str) -> bool {
    name.starts_with(identifier)
        || (!identifier.starts_with(CACHE_FILE_PREFIX)
            && name[CACHE_FILE_PREFIX.len()..].starts_with(identifier))
}

fn compare_by_age(left: &CacheEntryInfo, right: &CacheEntryInfo) -> Ordering {
    left.modified
        .cmp(&right.modified)
        .then_with(|| left.name.cmp(&right.name))
}

fn write_synced(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    file.sync_all()
}

fn discard_temp(path: &Path) {
    if let Err(error) = fs::remove_file(path) {
        if error.kind() != io::ErrorKind::NotFound {
            warn!(path = %path.display(), %error, "failed to remove temporary chat log");
        }
    }
}

fn read_records(path: &Path) -> Result<Vec<ChatMessage>, CacheError> {
    let file =
        File::open(path).map_err(|source| CacheError::io("opening cached chat log", path, source))?;
    let reader = BufReader::new(file);

    // Raw bytes: a line that is not UTF-8 is a corrupt record, not a read failure.
    let mut records = Vec::new();
    for (line_index, line_result) in reader.split(b'\n').enumerate() {
        let line_number = line_index + 1;
        let line = line_result.map_err(|source| CacheError::io_line(path, line_number, source))?;
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        records.push(parse_record_line(path, line_number, &line)?);
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use filetime::FileTime;
    use time::macros::datetime;

    use super::*;

    const CURRENT: &str = "cached_chatlog_2026-02-14_09-05.jsonl";

    fn seed(dir: &Path, name: &str, mtime_secs: i64) {
        let path = dir.join(name);
        fs::write(&path, "").expect("seed entry");
        filetime::set_file_mtime(&path, FileTime::from_unix_time(mtime_secs, 0))
            .expect("mtime should be set");
    }

    fn manager(dir: &Path, max_cached_files: usize) -> LogCacheManager {
        LogCacheManager {
            dir: dir.to_path_buf(),
            entry_name: CURRENT.to_string(),
            max_cached_files,
        }
    }

    fn refuse(name: &'static str) -> impl FnMut(&Path) -> io::Result<()> {
        move |path: &Path| {
            if path.file_name().is_some_and(|file| file == name) {
                Err(io::Error::new(io::ErrorKind::PermissionDenied, "immutable"))
            } else {
                fs::remove_file(path)
            }
        }
    }

    fn names(manager: &LogCacheManager) -> Vec<String> {
        manager
            .list_entries()
            .expect("list")
            .into_iter()
            .map(|entry| entry.name)
            .collect()
    }

    #[test]
    fn undeletable_entry_never_costs_the_current_entry() {
        let dir = tempfile::tempdir().expect("tempdir");
        seed(dir.path(), "cached_chatlog_2020-01-01_10-00.jsonl", 1_600_000_000);
        seed(dir.path(), CURRENT, 1_700_000_000);
        let manager = manager(dir.path(), 1);

        let report = manager.evict_with(refuse("cached_chatlog_2020-01-01_10-00.jsonl"));

        assert!(report.removed.is_empty());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].name, "cached_chatlog_2020-01-01_10-00.jsonl");
        assert!(report.failed[0].message.contains("immutable"));
        assert!(dir.path().join(CURRENT).exists());
    }

    #[test]
    fn current_entry_is_kept_even_when_it_is_the_oldest() {
        let dir = tempfile::tempdir().expect("tempdir");
        seed(dir.path(), CURRENT, 1_600_000_000);
        seed(dir.path(), "cached_chatlog_2026-02-15_10-00.jsonl", 1_700_000_000);
        seed(dir.path(), "cached_chatlog_2026-02-16_10-00.jsonl", 1_700_000_060);
        let manager = manager(dir.path(), 2);

        let report = manager.evict_excess();

        assert_eq!(
            report.removed,
            vec!["cached_chatlog_2026-02-15_10-00.jsonl".to_string()]
        );
        assert_eq!(
            names(&manager),
            vec![
                CURRENT.to_string(),
                "cached_chatlog_2026-02-16_10-00.jsonl".to_string(),
            ]
        );
    }

    #[test]
    fn failed_deletion_does_not_stop_the_pass() {
        let dir = tempfile::tempdir().expect("tempdir");
        seed(dir.path(), "cached_chatlog_2026-01-01_10-00.jsonl", 1_700_000_000);
        seed(dir.path(), "cached_chatlog_2026-01-02_10-00.jsonl", 1_700_000_060);
        seed(dir.path(), "cached_chatlog_2026-01-03_10-00.jsonl", 1_700_000_120);
        seed(dir.path(), "cached_chatlog_2026-01-04_10-00.jsonl", 1_700_000_180);
        seed(dir.path(), CURRENT, 1_700_000_240);
        let manager = manager(dir.path(), 2);

        let report = manager.evict_with(refuse("cached_chatlog_2026-01-01_10-00.jsonl"));

        assert_eq!(
            report.removed,
            vec![
                "cached_chatlog_2026-01-02_10-00.jsonl".to_string(),
                "cached_chatlog_2026-01-03_10-00.jsonl".to_string(),
            ]
        );
        assert_eq!(report.failed.len(), 1);
        assert!(!report.is_clean());
        assert_eq!(
            names(&manager),
            vec![
                "cached_chatlog_2026-01-01_10-00.jsonl".to_string(),
                "cached_chatlog_2026-01-04_10-00.jsonl".to_string(),
                CURRENT.to_string(),
            ]
        );
    }

    #[test]
    fn save_keeps_its_entry_when_older_entries_are_stuck() {
        let dir = tempfile::tempdir().expect("tempdir");
        seed(dir.path(), "cached_chatlog_2020-01-01_10-00.jsonl", 1_600_000_000);
        let manager = LogCacheManager::initialize(
            dir.path(),
            CacheOptions::default()
                .with_max_cached_files(1)
                .with_started_at(datetime!(2026-02-14 09:05:30 UTC)),
        )
        .expect("init");
        let history = vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")];

        manager.save(&history).expect("save");
        fs::write(dir.path().join("cached_chatlog_2020-01-01_10-00.jsonl"), "")
            .expect("reseed stale entry");
        let report = manager.evict_with(refuse("cached_chatlog_2020-01-01_10-00.jsonl"));

        assert_eq!(report.failed.len(), 1);
        assert_eq!(
            manager.load(CURRENT).expect("current entry").records,
            history
        );
    }
}
