//! HTTP launch, hand-rolled in the shape of
//! `blockscout_service_launcher::launcher::launch` (`http_serve`/`Metrics`)
//! but without the gRPC half or the launcher dependency itself — this
//! service is HTTP-only (see DESIGN.md). Shutdown is driven by the shared
//! [`CancellationToken`] rather than the launcher's
//! `LocalGracefulShutdownHandler`.

use std::collections::HashMap;

use actix_web::{middleware::Condition, web, App, HttpServer};
use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use tokio_util::sync::CancellationToken;

use crate::{api, auth::BearerAuth, settings::Settings};

const SHUTDOWN_TIMEOUT_SECS: u64 = 10;

fn build_metrics(service_name: &str, route: &str) -> PrometheusMetrics {
    let registry = prometheus::default_registry();
    let const_labels = HashMap::from([("service_name".to_string(), service_name.to_string())]);
    PrometheusMetricsBuilder::new(service_name)
        .registry(registry.clone())
        .endpoint(route)
        .const_labels(const_labels)
        .build()
        .expect("invalid prometheus metrics configuration")
}

async fn stop_on_cancel(handle: actix_web::dev::ServerHandle, cancel: CancellationToken) {
    cancel.cancelled().await;
    tracing::info!("shutdown signal received, stopping http server");
    handle.stop(true).await;
}

pub async fn run(
    settings: Settings,
    state: api::AppState,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let json_cfg = web::JsonConfig::default();
    let cors_settings = settings.http.cors.clone();
    let cors_enabled = cors_settings.enabled;
    let metrics = settings
        .metrics
        .enabled
        .then(|| build_metrics("ctf_stats_server", &settings.metrics.route));

    tracing::info!(addr = %settings.http.addr, "starting http server");
    let http_state = state.clone();
    let http_server = if let Some(m) = metrics.clone() {
        HttpServer::new(move || {
            let cors = cors_settings.build();
            App::new()
                .wrap(m.clone())
                .app_data(web::Data::new(http_state.clone()))
                .app_data(json_cfg.clone())
                .wrap(Condition::new(cors_enabled, cors))
                .service(
                    web::scope("")
                        .wrap(BearerAuth {
                            config: http_state.config.clone(),
                        })
                        .configure(api::configure_router),
                )
        })
        .shutdown_timeout(SHUTDOWN_TIMEOUT_SECS)
        .bind(settings.http.addr)?
        .run()
    } else {
        HttpServer::new(move || {
            let cors = cors_settings.build();
            App::new()
                .app_data(web::Data::new(http_state.clone()))
                .app_data(json_cfg.clone())
                .wrap(Condition::new(cors_enabled, cors))
                .service(
                    web::scope("")
                        .wrap(BearerAuth {
                            config: http_state.config.clone(),
                        })
                        .configure(api::configure_router),
                )
        })
        .shutdown_timeout(SHUTDOWN_TIMEOUT_SECS)
        .bind(settings.http.addr)?
        .run()
    };

    let http_handle = http_server.handle();
    let http_shutdown = tokio::spawn(stop_on_cancel(http_handle, cancel.clone()));
    let http_task = tokio::spawn(http_server);

    let metrics_task = metrics.map(|m| {
        let addr = settings.metrics.addr;
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tracing::info!(%addr, "starting metrics server");
            let server = HttpServer::new(move || App::new().wrap(m.clone()))
                .shutdown_timeout(SHUTDOWN_TIMEOUT_SECS)
                .bind(addr)?
                .run();
            let handle = server.handle();
            tokio::spawn(stop_on_cancel(handle, cancel));
            server.await
        })
    });

    http_task.await??;
    http_shutdown.await?;
    if let Some(metrics_task) = metrics_task {
        metrics_task.await??;
    }
    Ok(())
}
