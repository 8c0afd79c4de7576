//! Periodic driver tying [`crate::ingest::HttpIngest`] and
//! [`crate::ingest::TcpIngest`] together and archiving consumed taps. As
//! spec.md §4.H, ported from `batch.py`'s `BatchProcessor` main loop (the
//! `ignored_taps` retry-timeout mechanism of that older variant is not
//! carried forward — see DESIGN.md).

use std::{collections::HashMap, io, path::PathBuf, sync::Arc, time::Duration};

use flate2::{write::GzEncoder, Compression};
use tokio_util::sync::CancellationToken;

use crate::{
    config::Config,
    ingest::{HttpIngest, TcpIngest},
    sessions::SessionTracker,
    store::Store,
};

const SLEEP_BETWEEN_BATCHES: Duration = Duration::from_secs(1);
const SLEEP_ON_ERROR: Duration = Duration::from_secs(5);

pub struct BatchRunner {
    http: HttpIngest,
    tcp: TcpIngest,
    sessions: SessionTracker,
    archive_dir: PathBuf,
    next_batch_count: u64,
}

impl BatchRunner {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        http_access_log: impl Into<PathBuf>,
        http_taps_dir: impl Into<PathBuf>,
        tcp_access_log: impl Into<PathBuf>,
        tcp_taps_dir: impl Into<PathBuf>,
        archive_dir: impl Into<PathBuf>,
        store: Arc<Store>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            http: HttpIngest::new(http_access_log, http_taps_dir, store.clone(), config.clone()),
            tcp: TcpIngest::new(tcp_access_log, tcp_taps_dir, store, config),
            sessions: SessionTracker::new(),
            archive_dir: archive_dir.into(),
            next_batch_count: 0,
        }
    }

    fn next_batch_id(&mut self) -> String {
        let now = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        let id = format!("batch_{now}_{}", self.next_batch_count);
        self.next_batch_count += 1;
        id
    }

    /// Runs one HTTP + TCP ingest pass, archiving any taps consumed.
    /// Returns the number of taps archived.
    pub async fn run_once(&mut self) -> io::Result<usize> {
        let batch_id = self.next_batch_id();
        let mut to_archive = HashMap::new();

        match self
            .http
            .process_new_access_log_entries(&batch_id, &mut self.sessions)
            .await
        {
            Ok(archived) => to_archive.extend(archived),
            Err(err) => tracing::error!(batch_id, error = %err, "http ingest failed for this batch"),
        }

        match self.tcp.process_new_access_log_entries(&batch_id).await {
            Ok(archived) => to_archive.extend(archived),
            Err(err) => tracing::error!(batch_id, error = %err, "tcp ingest failed for this batch"),
        }

        if to_archive.is_empty() {
            return Ok(0);
        }

        let count = to_archive.len();
        write_archive(&self.archive_dir, &batch_id, to_archive)?;
        Ok(count)
    }

    /// Runs batches until `cancel` fires, sleeping `SLEEP_BETWEEN_BATCHES`
    /// between passes (or `SLEEP_ON_ERROR` after a pass fails outright).
    pub async fn run(mut self, cancel: CancellationToken) {
        loop {
            let sleep_for = match self.run_once().await {
                Ok(count) => {
                    if count > 0 {
                        tracing::info!(taps_archived = count, "batch processed");
                    }
                    SLEEP_BETWEEN_BATCHES
                }
                Err(err) => {
                    tracing::error!(error = %err, "batch run failed");
                    SLEEP_ON_ERROR
                }
            };

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(sleep_for) => {}
            }
        }
    }
}

/// Writes one gzip tar archive per batch, one member per tap, re-serialized
/// as pretty-printed JSON rather than a copy of the raw tap file bytes.
fn write_archive(
    archive_dir: &std::path::Path,
    batch_id: &str,
    members: HashMap<String, serde_json::Value>,
) -> io::Result<()> {
    std::fs::create_dir_all(archive_dir)?;
    let archive_path = archive_dir.join(format!("{batch_id}.tar.gz"));
    let file = std::fs::File::create(&archive_path)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for (name, data) in members {
        let bytes = serde_json::to_vec_pretty(&data).unwrap_or_default();
        let mut header = tar::Header::new_gnu();
        header.set_size(bytes.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, &name, bytes.as_slice())?;
    }

    builder.into_inner()?.finish()?;
    Ok(())
}

/// Installs Ctrl-C + (on Unix) SIGTERM handlers that cancel `token`, the
/// same graceful-shutdown shape used elsewhere so the HTTP listener and the
/// batch runner wind down together.
pub fn install_shutdown_signal_handler(token: CancellationToken) {
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            let mut sigterm =
                match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(sig) => sig,
                    Err(err) => {
                        tracing::error!(error = %err, "failed to install SIGTERM handler");
                        let _ = ctrl_c.await;
                        token.cancel();
                        return;
                    }
                };
            tokio::select! {
                _ = ctrl_c => {}
                _ = sigterm.recv() => {}
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
        }

        tracing::info!("shutdown signal received");
        token.cancel();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_pretty_printed_members_into_gzip_tar() {
        let dir = tempfile::tempdir().unwrap();
        let mut members = HashMap::new();
        members.insert("a.json".to_string(), serde_json::json!({"x": 1}));
        write_archive(dir.path(), "batch_test_0", members).unwrap();

        let archive_path = dir.path().join("batch_test_0.tar.gz");
        assert!(archive_path.exists());

        let file = std::fs::File::open(&archive_path).unwrap();
        let decoder = flate2::read::GzDecoder::new(file);
        let mut archive = tar::Archive::new(decoder);
        let mut entries = archive.entries().unwrap();
        let mut entry = entries.next().unwrap().unwrap();
        assert_eq!(entry.path().unwrap().to_str().unwrap(), "a.json");
        let mut contents = String::new();
        std::io::Read::read_to_string(&mut entry, &mut contents).unwrap();
        assert!(contents.contains("\"x\": 1"));
    }
}
