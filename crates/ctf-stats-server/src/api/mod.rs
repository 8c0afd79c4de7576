//! The dashboard read API (`DashboardReader`, spec.md §6), registered the
//! way `blockscout_service_launcher::launcher::HttpRouter` expects
//! (`configure_router` building an `actix_web::web::ServiceConfig`) but
//! without depending on the launcher crate itself (see DESIGN.md).

pub mod dto;
mod health;
mod requests;
mod services;
mod settings_routes;
mod sql;
mod stats;
mod tcp;

use std::sync::Arc;

use actix_web::{web, HttpResponse, ResponseError};
use ctf_stats_logic::{config::Config, store::Store};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub config: Arc<Config>,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<ctf_stats_logic::error::StoreError> for ApiError {
    fn from(err: ctf_stats_logic::error::StoreError) -> Self {
        use ctf_stats_logic::error::ErrorKind;
        match err.kind() {
            ErrorKind::Policy => ApiError::BadRequest(err.to_string()),
            _ => ApiError::Internal(err.into()),
        }
    }
}

impl From<sea_orm::DbErr> for ApiError {
    fn from(err: sea_orm::DbErr) -> Self {
        ApiError::Internal(err.into())
    }
}

impl ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse {
        let status = match self {
            ApiError::NotFound(_) => actix_web::http::StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => actix_web::http::StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => actix_web::http::StatusCode::INTERNAL_SERVER_ERROR,
        };
        HttpResponse::build(status).json(serde_json::json!({"detail": self.to_string()}))
    }
}

pub fn configure_router(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health::health_check))
            .route("/services", web::get().to(services::list_services))
            .route("/services/{port}", web::get().to(services::get_service))
            .route(
                "/services/{port}/requests",
                web::get().to(requests::list_requests),
            )
            .route("/requests/{id}", web::get().to(requests::get_request))
            .route(
                "/requests/{id}/raw",
                web::get().to(requests::get_request_raw),
            )
            .route("/services/{port}/paths", web::get().to(stats::path_stats))
            .route(
                "/services/{port}/queries",
                web::get().to(stats::query_stats),
            )
            .route(
                "/services/{port}/headers",
                web::get().to(stats::header_stats),
            )
            .route(
                "/services/{port}/tcp-connections",
                web::get().to(tcp::list_tcp_connections),
            )
            .route(
                "/tcp-connections/{id}",
                web::get().to(tcp::get_tcp_connection),
            )
            .route(
                "/services/{port}/tcp-connection-stats",
                web::get().to(tcp::tcp_connection_stats),
            )
            .route("/sql", web::post().to(sql::execute_sql))
            .route("/sql/schema", web::get().to(sql::sql_schema))
            .route("/config", web::get().to(settings_routes::get_config))
            .route("/config", web::post().to(settings_routes::save_config))
            .route(
                "/config/validate",
                web::post().to(settings_routes::validate_config),
            )
            .route(
                "/config/revision/{filename}",
                web::get().to(settings_routes::get_config_revision),
            )
            .route("/flags/recent", web::get().to(stats::recent_flag_stats))
            .route(
                "/services/{port}/flag-time-stats",
                web::get().to(stats::service_flag_time_stats),
            )
            .route("/flag-time-stats", web::get().to(stats::all_flag_time_stats))
            .route(
                "/services/{port}/request-time-stats",
                web::get().to(stats::service_request_time_stats),
            )
            .route(
                "/request-time-stats",
                web::get().to(stats::all_request_time_stats),
            ),
    );
}
