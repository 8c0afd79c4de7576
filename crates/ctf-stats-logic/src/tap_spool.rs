//! Directory-backed staging area for tap files.
//!
//! Generic over the secondary-index key type and the extractor closure, per
//! the composition-over-subclassing guidance: each protocol (HTTP, TCP)
//! instantiates its own `TapSpool<K, F>` with a key extractor rather than
//! subclassing a shared base type.

use std::{
    collections::{HashMap, HashSet},
    hash::Hash,
    path::{Path, PathBuf},
};

const MAX_LOAD_RETRIES: u32 = 3;

pub struct TapSpool<K, F> {
    dir: PathBuf,
    extract_key: F,
    cache: HashMap<String, serde_json::Value>,
    index: HashMap<K, String>,
    retry_counts: HashMap<String, u32>,
    scheduled_removal: HashSet<String>,
}

impl<K, F> TapSpool<K, F>
where
    K: Eq + Hash + Clone,
    F: Fn(&serde_json::Value) -> Option<K>,
{
    pub fn new(dir: impl Into<PathBuf>, extract_key: F) -> Self {
        Self {
            dir: dir.into(),
            extract_key,
            cache: HashMap::new(),
            index: HashMap::new(),
            retry_counts: HashMap::new(),
            scheduled_removal: HashSet::new(),
        }
    }

    /// Enumerates the directory once. New files are parsed as JSON and, on
    /// success, cached and indexed. Non-`.json` files and files that fail to
    /// parse `MAX_LOAD_RETRIES` times are scheduled for removal.
    pub fn refresh(&mut self) -> std::io::Result<()> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(err),
        };

        for entry in entries {
            let entry = entry?;
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(_) => continue,
            };
            if self.cache.contains_key(&name) || self.scheduled_removal.contains(&name) {
                continue;
            }
            if !name.ends_with(".json") {
                self.scheduled_removal.insert(name);
                continue;
            }
            self.load_one(name);
        }
        Ok(())
    }

    fn load_one(&mut self, name: String) {
        let path = self.dir.join(&name);
        let contents = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(err) => {
                tracing::warn!(file = %name, error = %err, "failed to read tap file");
                self.record_failure(name);
                return;
            }
        };
        match serde_json::from_str::<serde_json::Value>(&contents) {
            Ok(data) => {
                if let Some(key) = (self.extract_key)(&data) {
                    self.index.insert(key, name.clone());
                }
                self.cache.insert(name, data);
            }
            Err(err) => {
                tracing::warn!(file = %name, error = %err, "failed to parse tap file as JSON");
                self.record_failure(name);
            }
        }
    }

    fn record_failure(&mut self, name: String) {
        let count = self.retry_counts.entry(name.clone()).or_insert(0);
        *count += 1;
        if *count >= MAX_LOAD_RETRIES {
            tracing::error!(file = %name, retries = *count, "dropping tap file after repeated parse failures");
            self.retry_counts.remove(&name);
            self.scheduled_removal.insert(name);
        }
    }

    /// Removes the indexed name for `key` and returns it, leaving the
    /// cached data in place.
    pub fn pop_by_key(&mut self, key: &K) -> Option<String> {
        self.index.remove(key)
    }

    /// Removes the cached data for `name`, scheduling the file for removal.
    pub fn pop_filename(&mut self, name: &str) -> Option<serde_json::Value> {
        let data = self.cache.remove(name)?;
        self.scheduled_removal.insert(name.to_string());
        Some(data)
    }

    /// Deletes every file (or directory) scheduled for removal.
    pub fn cleanup(&mut self) {
        for name in self.scheduled_removal.drain() {
            let path = self.dir.join(&name);
            let meta = match std::fs::symlink_metadata(&path) {
                Ok(meta) => meta,
                Err(_) => continue,
            };
            let result = if meta.is_dir() {
                std::fs::remove_dir_all(&path)
            } else {
                std::fs::remove_file(&path)
            };
            if let Err(err) = result {
                tracing::warn!(path = %path.display(), error = %err, "failed to remove spooled tap file");
            }
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[cfg(test)]
    pub fn is_cached(&self, name: &str) -> bool {
        self.cache.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn extract_id(data: &serde_json::Value) -> Option<String> {
        data.get("id").and_then(|v| v.as_str()).map(String::from)
    }

    #[test]
    fn refresh_caches_and_indexes_json_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.json"), r#"{"id":"req-1"}"#).unwrap();
        let mut spool = TapSpool::new(dir.path(), extract_id);
        spool.refresh().unwrap();
        assert!(spool.is_cached("a.json"));
        assert_eq!(spool.pop_by_key(&"req-1".to_string()), Some("a.json".to_string()));
    }

    #[test]
    fn non_json_files_scheduled_for_removal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "nope").unwrap();
        let mut spool = TapSpool::new(dir.path(), extract_id);
        spool.refresh().unwrap();
        spool.cleanup();
        assert!(!dir.path().join("a.txt").exists());
    }

    #[test]
    fn malformed_json_dropped_after_max_retries() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.json"), "{not json").unwrap();
        let mut spool = TapSpool::new(dir.path(), extract_id);
        for _ in 0..MAX_LOAD_RETRIES {
            spool.refresh().unwrap();
        }
        spool.cleanup();
        assert!(!dir.path().join("bad.json").exists());
    }

    #[test]
    fn pop_filename_removes_cache_and_schedules_removal() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.json"), r#"{"id":"req-1"}"#).unwrap();
        let mut spool = TapSpool::new(dir.path(), extract_id);
        spool.refresh().unwrap();
        let data = spool.pop_filename("a.json").unwrap();
        assert_eq!(data["id"], "req-1");
        spool.cleanup();
        assert!(!dir.path().join("a.json").exists());
    }
}
