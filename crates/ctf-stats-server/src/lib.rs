pub mod api;
pub mod auth;
pub mod server;
pub mod settings;

pub use server::run as run_server;
pub use settings::Settings;

use std::{path::Path, sync::Arc, time::Duration};

use ctf_stats_logic::{
    batch_runner::{install_shutdown_signal_handler, BatchRunner},
    config::{Config, ConfigWatcher},
    store::Store,
};
use tokio_util::sync::CancellationToken;

/// Wires the three concurrent tasks (API server, batch runner, config
/// watcher) under one [`CancellationToken`], as spec.md §5.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    settings::init_logs(&settings.tracing)?;

    let store = Arc::new(Store::connect(Path::new(&settings.db_path)).await?);
    let config = Arc::new(Config::load(&settings.config_path)?);

    let cancel = CancellationToken::new();
    install_shutdown_signal_handler(cancel.clone());

    let batch_runner = BatchRunner::new(
        &settings.http_access_log,
        &settings.http_taps_dir,
        &settings.tcp_access_log,
        &settings.tcp_taps_dir,
        &settings.archive_dir,
        store.clone(),
        config.clone(),
    );
    let batch_task = tokio::spawn(batch_runner.run(cancel.clone()));

    let config_watcher = ConfigWatcher::new(
        config.clone(),
        Duration::from_secs(settings.config_refresh_delay_secs),
    );
    let watcher_task = tokio::spawn(config_watcher.run(cancel.clone()));

    let state = api::AppState { store, config };
    let server_result = run_server(settings, state, cancel.clone()).await;

    cancel.cancel();
    batch_task.await.ok();
    watcher_task.await.ok();

    server_result
}
