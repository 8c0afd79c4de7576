//! Service configuration: the YAML file consumed by the ingest engine and
//! hot-reloaded by [`ConfigWatcher`].
//!
//! Distinct from `ctf-stats-server::Settings`, which carries the server's
//! own bootstrap settings (addresses, log format) and is read once at
//! startup via the `config` crate.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::{Duration, SystemTime},
};

use arc_swap::ArcSwap;
use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::ConfigError;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    Http,
    Tcp,
    Udp,
    Ws,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct IgnoredPathStat {
    pub method: String,
    pub path: String,
}

fn default_session_cookie_names() -> Vec<String> {
    [
        "session",
        "sessid",
        "sid",
        "token",
        "auth",
        "sessionid",
        ".AspNetCore.Identity.Application",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_precision() -> i64 {
    100
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Service {
    pub name: String,
    pub port: u16,
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    #[serde(default)]
    pub ignore_path_stats: Vec<IgnoredPathStat>,
    #[serde(default)]
    pub ignore_query_param_stats: std::collections::HashMap<String, String>,
    #[serde(default)]
    pub ignore_header_stats: std::collections::HashMap<String, String>,
    #[serde(default = "default_session_cookie_names")]
    pub session_cookie_names: Vec<String>,
    #[serde(default = "default_precision")]
    pub tcp_connection_stats_precision: i64,
}

fn default_flag_format() -> String {
    "ctf{}".to_string()
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ConfigModel {
    #[serde(default = "default_flag_format")]
    pub flag_format: String,
    #[serde(default)]
    pub api_token_hash: Option<String>,
    #[serde(default)]
    pub services: Vec<Service>,
}

impl ConfigModel {
    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for svc in &self.services {
            if !seen.insert(svc.port) {
                return Err(ConfigError::DuplicatePort(svc.port));
            }
        }
        Ok(())
    }

    pub fn flag_regex(&self) -> Regex {
        flag_format_to_regex(&self.flag_format)
    }

    pub fn get_service_by_port(&self, port: u16) -> Option<&Service> {
        self.services.iter().find(|s| s.port == port)
    }
}

/// Expands the `ctf{}`-style surface syntax into a regex. A literal `{}`
/// suffix becomes `\{.*?\}`; anything else is treated as an already-valid
/// regex (matching `find_body_flags`'s handling of a custom `flag_format`).
pub fn flag_format_to_regex(flag_format: &str) -> Regex {
    let pattern = if let Some(prefix) = flag_format.strip_suffix("{}") {
        format!("{}\\{{.*?\\}}", regex::escape(prefix))
    } else {
        flag_format.to_string()
    };
    Regex::new(&pattern).unwrap_or_else(|_| Regex::new(r"ctf\{.*?\}").expect("fallback regex"))
}

fn parse(content: &str) -> Result<ConfigModel, ConfigError> {
    let value: serde_yaml::Value = serde_yaml::from_str(content)?;
    if !matches!(value, serde_yaml::Value::Mapping(_) | serde_yaml::Value::Null) {
        return Err(ConfigError::NotAMapping);
    }
    let model: ConfigModel = serde_yaml::from_value(value).map_err(ConfigError::from)?;
    model.validate()?;
    Ok(model)
}

/// Loads a `ConfigModel` from disk and wraps it in an atomically swappable
/// handle (`ArcSwap`). Cheap to clone; every holder observes the latest
/// successfully-reloaded config.
pub struct Config {
    path: PathBuf,
    current: Arc<ArcSwap<ConfigModel>>,
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = fs::read_to_string(&path)?;
        let model = parse(&content)?;
        Ok(Self {
            path,
            current: Arc::new(ArcSwap::from_pointee(model)),
        })
    }

    pub fn current(&self) -> Arc<ConfigModel> {
        self.current.load_full()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn reload(&self) -> Result<(), ConfigError> {
        let content = fs::read_to_string(&self.path)?;
        let model = parse(&content)?;
        self.current.store(Arc::new(model));
        Ok(())
    }

    /// Validates `content` and, if `create_backup`, copies the current file
    /// to `<dir>/config_backups/config_<timestamp>.yml` before overwriting
    /// it. The on-disk file is left untouched on validation failure.
    pub fn save(&self, content: &str, create_backup: bool) -> Result<(), ConfigError> {
        parse(content)?;

        if create_backup && self.path.exists() {
            let backups_dir = self.backups_dir();
            fs::create_dir_all(&backups_dir)?;
            let stamp = Utc::now().format("%Y%m%d_%H%M%S");
            let backup_path = backups_dir.join(format!("config_{stamp}.yml"));
            fs::copy(&self.path, &backup_path)?;
        }

        fs::write(&self.path, content)?;
        self.reload()
    }

    fn backups_dir(&self) -> PathBuf {
        self.path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("config_backups")
    }

    /// Lists backup revision file names, newest first.
    pub fn get_revisions(&self) -> std::io::Result<Vec<String>> {
        let dir = self.backups_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut names: Vec<String> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        names.sort_unstable_by(|a, b| b.cmp(a));
        Ok(names)
    }

    pub fn get_revision_content(&self, name: &str) -> Option<String> {
        if name.contains("..") || name.contains('/') {
            return None;
        }
        fs::read_to_string(self.backups_dir().join(name)).ok()
    }
}

/// Polls `config.path()`'s mtime every `refresh_delay` and reloads on
/// change, logging (never panicking) on reparse failure. Mirrors
/// `utils/watcher.py`'s `Watcher`, translated from a daemon thread into a
/// cancellable `tokio` task.
pub struct ConfigWatcher {
    config: Arc<Config>,
    refresh_delay: Duration,
}

impl ConfigWatcher {
    pub fn new(config: Arc<Config>, refresh_delay: Duration) -> Self {
        Self {
            config,
            refresh_delay,
        }
    }

    pub async fn run(self, cancel: CancellationToken) {
        let mut last_stamp = fs::metadata(self.config.path())
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.refresh_delay) => {}
            }

            let stamp = match fs::metadata(self.config.path()).and_then(|m| m.modified()) {
                Ok(stamp) => stamp,
                Err(_) => continue,
            };
            if stamp == last_stamp {
                continue;
            }
            last_stamp = stamp;

            match self.config.reload() {
                Ok(()) => tracing::info!("config reloaded due to file change"),
                Err(err) => tracing::error!(error = %err, "failed to reload config after file change"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("config.yml");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn rejects_duplicate_ports() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
services:
  - name: a
    port: 80
    type: http
  - name: b
    port: 80
    type: http
"#,
        );
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicatePort(80)));
    }

    #[test]
    fn save_then_reread_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "services: []\n");
        let config = Config::load(&path).unwrap();
        config
            .save("flag_format: \"flag{}\"\nservices: []\n", true)
            .unwrap();
        assert_eq!(config.current().flag_format, "flag{}");
        assert!(config.get_revisions().unwrap().len() == 1);
    }

    #[test]
    fn save_does_not_touch_file_on_invalid_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "services: []\n");
        let config = Config::load(&path).unwrap();
        let before = fs::read_to_string(&path).unwrap();
        let err = config.save("- not\n- a\n- mapping\n", false);
        assert!(err.is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), before);
    }

    #[test]
    fn flag_format_expands_braces() {
        let re = flag_format_to_regex("ctf{}");
        assert!(re.is_match("ctf{deadbeef}"));
        assert!(!re.is_match("notaflag"));
    }
}
