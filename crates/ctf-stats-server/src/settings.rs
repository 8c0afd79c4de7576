//! Ambient server bootstrap settings (addresses, log format, file paths),
//! read once at startup. Distinct from [`ctf_stats_logic::config::Config`],
//! the hot-reloadable service configuration consumed by the ingest engine.
//!
//! Follows `blockscout_service_launcher::launcher::ConfigSettings`'s
//! layered-`config`-crate convention (file named by `<SERVICE>__CONFIG`,
//! then `<SERVICE>__*` environment overrides), hand-rolled here since this
//! workspace does not depend on that launcher crate (see DESIGN.md).

use std::{net::SocketAddr, str::FromStr};

use actix_cors::Cors;
use serde::{Deserialize, Serialize};

pub trait ConfigSettings {
    const SERVICE_NAME: &'static str;

    fn build() -> anyhow::Result<Self>
    where
        Self: serde::de::DeserializeOwned,
    {
        let config_path_name = format!("{}__CONFIG", Self::SERVICE_NAME);
        let config_path = std::env::var(&config_path_name);

        let mut builder = config::Config::builder();
        if let Ok(config_path) = config_path {
            builder = builder.add_source(config::File::with_name(&config_path));
        }
        builder = builder
            .add_source(config::Environment::with_prefix(Self::SERVICE_NAME).separator("__"));

        let settings: Self = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub http: HttpServerSettings,
    pub metrics: MetricsSettings,
    pub tracing: TracingSettings,
    /// Path to the `ctf-stats-logic::config::Config` YAML file.
    pub config_path: String,
    /// Path to the SQLite store file.
    pub db_path: String,
    /// Directory the batch runner archives consumed taps into.
    pub archive_dir: String,
    /// Directory the HTTP access log and its tap files live under.
    pub http_access_log: String,
    pub http_taps_dir: String,
    /// Directory the TCP access log and its tap files live under.
    pub tcp_access_log: String,
    pub tcp_taps_dir: String,
    /// How often the config file's mtime is polled for hot-reload.
    pub config_refresh_delay_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            http: HttpServerSettings::default(),
            metrics: MetricsSettings::default(),
            tracing: TracingSettings::default(),
            config_path: "config.yml".to_string(),
            db_path: "proxy_stats.db".to_string(),
            archive_dir: "archive".to_string(),
            http_access_log: "logs/http_access.log".to_string(),
            http_taps_dir: "taps/http".to_string(),
            tcp_access_log: "logs/tcp_access.log".to_string(),
            tcp_taps_dir: "taps/tcp".to_string(),
            config_refresh_delay_secs: 1,
        }
    }
}

impl ConfigSettings for Settings {
    const SERVICE_NAME: &'static str = "CTF_STATS";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpServerSettings {
    pub addr: SocketAddr,
    pub cors: CorsSettings,
}

impl Default for HttpServerSettings {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from_str("0.0.0.0:8050").unwrap(),
            cors: CorsSettings::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsSettings {
    pub enabled: bool,
    pub allowed_origin: String,
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origin: "*".to_string(),
        }
    }
}

impl CorsSettings {
    pub fn build(&self) -> Cors {
        if !self.enabled {
            return Cors::default();
        }
        let mut cors = Cors::default()
            .allow_any_header()
            .allow_any_method()
            .supports_credentials()
            .max_age(3600);
        cors = match self.allowed_origin.as_str() {
            "*" => cors.allow_any_origin(),
            origin => cors.allowed_origin(origin),
        };
        cors
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetricsSettings {
    pub enabled: bool,
    pub addr: SocketAddr,
    pub route: String,
}

impl Default for MetricsSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            addr: SocketAddr::from_str("0.0.0.0:6060").unwrap(),
            route: "/metrics".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TracingFormat {
    Default,
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TracingSettings {
    pub enabled: bool,
    pub format: TracingFormat,
}

impl Default for TracingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            format: TracingFormat::Default,
        }
    }
}

/// Mirrors `blockscout_service_launcher::tracing::init_logs`'s dev/json
/// switch, minus the jaeger exporter (this workspace carries no
/// `opentelemetry` dependency — see DESIGN.md).
pub fn init_logs(settings: &TracingSettings) -> anyhow::Result<()> {
    if !settings.enabled {
        return Ok(());
    }

    use tracing_subscriber::{filter::LevelFilter, fmt, layer::SubscriberExt, EnvFilter, Layer};

    let env_filter = || {
        EnvFilter::builder()
            .with_default_directive(LevelFilter::INFO.into())
            .from_env_lossy()
    };

    let layer = match settings.format {
        TracingFormat::Default => fmt::layer().with_filter(env_filter()).boxed(),
        TracingFormat::Json => fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .with_span_list(false)
            .with_filter(env_filter())
            .boxed(),
    };

    tracing_subscriber::registry().with(layer).try_init()?;
    Ok(())
}
