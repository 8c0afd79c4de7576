//! Tails an append-only line-delimited JSON log with a durable read offset.

use std::{
    fs::{self, File},
    io::{BufRead, BufReader, Seek, SeekFrom},
    path::{Path, PathBuf},
};

#[derive(Debug, Clone)]
pub struct LogEntry {
    pub data: serde_json::Value,
    pub end_position: u64,
}

pub struct AccessLogTail {
    path: PathBuf,
    position_path: PathBuf,
    last_position: u64,
}

impl AccessLogTail {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let position_path = sidecar_path(&path);
        let last_position = read_sidecar(&position_path).unwrap_or(0);
        Self {
            path,
            position_path,
            last_position,
        }
    }

    pub fn last_position(&self) -> u64 {
        self.last_position
    }

    /// Reads up to `max` new complete JSON lines from the last offset.
    /// Detects truncation (current file length < last_position) and resets
    /// to 0 before reading — a deliberate fix over the original's silent
    /// stall on log rotation.
    pub fn read_new_entries(&mut self, max: usize) -> std::io::Result<Vec<LogEntry>> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };

        let file_len = file.metadata()?.len();
        if file_len < self.last_position {
            tracing::warn!(
                path = %self.path.display(),
                last_position = self.last_position,
                file_len,
                "access log shrank below last read position, assuming rotation and resetting offset to 0"
            );
            self.last_position = 0;
        }

        let mut reader = BufReader::new(file);
        reader.seek(SeekFrom::Start(self.last_position))?;

        let mut entries = Vec::new();
        let mut pos = self.last_position;
        let mut line = String::new();
        while entries.len() < max {
            line.clear();
            let read = reader.read_line(&mut line)?;
            if read == 0 {
                break;
            }
            pos += read as u64;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            if !line.ends_with('\n') {
                // partial line at EOF, written but not yet newline-terminated; don't consume it.
                pos -= read as u64;
                break;
            }
            match serde_json::from_str::<serde_json::Value>(trimmed) {
                Ok(data) => entries.push(LogEntry {
                    data,
                    end_position: pos,
                }),
                Err(err) => {
                    tracing::warn!(error = %err, line = trimmed, "skipping malformed access log line");
                }
            }
        }

        Ok(entries)
    }

    pub fn write_last_processed_position(&mut self, pos: u64) -> std::io::Result<()> {
        self.last_position = pos;
        fs::write(&self.position_path, pos.to_string())
    }
}

fn sidecar_path(path: &Path) -> PathBuf {
    let mut s = path.as_os_str().to_owned();
    s.push(".pos");
    PathBuf::from(s)
}

fn read_sidecar(path: &Path) -> Option<u64> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_log(dir: &tempfile::TempDir, lines: &[&str]) -> PathBuf {
        let path = dir.path().join("access.log");
        let mut file = File::create(&path).unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        path
    }

    #[test]
    fn reads_new_complete_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_log(&dir, &[r#"{"a":1}"#, r#"{"a":2}"#]);
        let mut tail = AccessLogTail::new(&path);
        let entries = tail.read_new_entries(1000).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].data["a"], 1);
        assert_eq!(entries[1].data["a"], 2);
    }

    #[test]
    fn skips_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_log(&dir, &[r#"{"a":1}"#, "not json", r#"{"a":2}"#]);
        let mut tail = AccessLogTail::new(&path);
        let entries = tail.read_new_entries(1000).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn persists_and_restores_offset() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_log(&dir, &[r#"{"a":1}"#]);
        let mut tail = AccessLogTail::new(&path);
        let entries = tail.read_new_entries(1000).unwrap();
        tail.write_last_processed_position(entries[0].end_position)
            .unwrap();

        let mut reopened = AccessLogTail::new(&path);
        assert_eq!(reopened.last_position(), entries[0].end_position);
        assert!(reopened.read_new_entries(1000).unwrap().is_empty());
    }

    #[test]
    fn detects_truncation_and_resets_offset() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_log(&dir, &[r#"{"a":1}"#, r#"{"a":2}"#]);
        let mut tail = AccessLogTail::new(&path);
        let entries = tail.read_new_entries(1000).unwrap();
        tail.write_last_processed_position(entries.last().unwrap().end_position)
            .unwrap();

        // simulate rotation: truncate and write a single shorter line
        let mut file = File::create(&path).unwrap();
        writeln!(file, r#"{{"a":3}}"#).unwrap();
        drop(file);

        let entries = tail.read_new_entries(1000).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].data["a"], 3);
    }
}
