//! `GET /api/services`, `GET /api/services/{port}` — ported from
//! `dashboard/app.py`'s `get_services`/`get_service_by_port` (the original's
//! hand-optimized batch queries are replaced here with one query per
//! service; see DESIGN.md).

use std::collections::HashMap;

use actix_web::{web, HttpResponse};
use sea_orm::{ConnectionTrait, DbBackend, Statement};

use super::{dto, ApiError, AppState};

const FIVE_MINUTES_MS: i64 = 5 * 60 * 1000;

async fn fetch_service_stats(
    conn: &sea_orm::DatabaseConnection,
    port: u16,
    is_tcp: bool,
) -> Result<dto::ServiceStats, ApiError> {
    let port = i64::from(port);
    let now = chrono::Utc::now().timestamp_millis();
    let since = now - FIVE_MINUTES_MS;

    let totals = conn
        .query_one(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            "SELECT total_requests, total_blocked_requests, total_responses,
                    total_blocked_responses, total_flags_written, total_flags_retrieved,
                    total_flags_blocked, total_tcp_connections, total_tcp_bytes_in,
                    total_tcp_bytes_out
             FROM service_stats WHERE port = ?",
            [port.into()],
        ))
        .await?;

    let (
        total_requests,
        blocked_requests,
        total_responses,
        _blocked_responses,
        flags_written,
        flags_retrieved,
        flags_blocked,
        total_tcp_connections,
        total_tcp_bytes_in,
        total_tcp_bytes_out,
    ) = match &totals {
        Some(row) => (
            row.try_get::<i64>("", "total_requests")?,
            row.try_get::<i64>("", "total_blocked_requests")?,
            row.try_get::<i64>("", "total_responses")?,
            row.try_get::<i64>("", "total_blocked_responses")?,
            row.try_get::<i64>("", "total_flags_written")?,
            row.try_get::<i64>("", "total_flags_retrieved")?,
            row.try_get::<i64>("", "total_flags_blocked")?,
            row.try_get::<i64>("", "total_tcp_connections")?,
            row.try_get::<i64>("", "total_tcp_bytes_in")?,
            row.try_get::<i64>("", "total_tcp_bytes_out")?,
        ),
        None => (0, 0, 0, 0, 0, 0, 0, 0, 0, 0),
    };

    let status_rows = conn
        .query_all(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            "SELECT status_code, count FROM http_response_code_stats WHERE port = ?",
            [port.into()],
        ))
        .await?;

    let mut status_counts = HashMap::new();
    let (mut error_responses, mut success_responses, mut redirect_responses) = (0i64, 0i64, 0i64);
    for row in &status_rows {
        let status: i64 = row.try_get("", "status_code")?;
        let count: i64 = row.try_get("", "count")?;
        status_counts.insert(status, count);
        if status >= 400 {
            error_responses += count;
        } else if (200..300).contains(&status) {
            success_responses += count;
        } else if (300..400).contains(&status) {
            redirect_responses += count;
        }
    }

    let alerts_count: i64 = conn
        .query_one(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            "SELECT COUNT(*) as c FROM alerts WHERE port = ?",
            [port.into()],
        ))
        .await?
        .map(|row| row.try_get("", "c"))
        .transpose()?
        .unwrap_or(0);

    let requests_delta: i64 = conn
        .query_one(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            "SELECT SUM(count) as s FROM http_request_time_stats WHERE port = ? AND time >= ?",
            [port.into(), since.into()],
        ))
        .await?
        .and_then(|row| row.try_get::<Option<i64>>("", "s").ok())
        .flatten()
        .unwrap_or(0);

    let blocked_requests_delta: i64 = conn
        .query_one(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            "SELECT SUM(blocked_count) as s FROM http_request_time_stats WHERE port = ? AND time >= ?",
            [port.into(), since.into()],
        ))
        .await?
        .and_then(|row| row.try_get::<Option<i64>>("", "s").ok())
        .flatten()
        .unwrap_or(0);

    let flag_deltas = conn
        .query_one(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            "SELECT SUM(write_count) as w, SUM(read_count) as r FROM flag_time_stats WHERE port = ? AND time >= ?",
            [port.into(), since.into()],
        ))
        .await?;
    let (flags_written_delta, flags_retrieved_delta) = match flag_deltas {
        Some(row) => (
            row.try_get::<Option<i64>>("", "w")?.unwrap_or(0),
            row.try_get::<Option<i64>>("", "r")?.unwrap_or(0),
        ),
        None => (0, 0),
    };

    let tcp_stats = if is_tcp {
        Some(dto::TcpStats {
            total_connections: total_tcp_connections,
            total_bytes_in: total_tcp_bytes_in,
            total_bytes_out: total_tcp_bytes_out,
            avg_duration_ms: 0,
            total_flags_found: flags_written + flags_retrieved,
        })
    } else {
        None
    };

    Ok(dto::ServiceStats {
        total_requests,
        blocked_requests,
        requests_delta,
        blocked_requests_delta,
        total_responses,
        error_responses,
        success_responses,
        redirect_responses,
        status_counts,
        alerts_count,
        flags_written,
        flags_retrieved,
        flags_blocked,
        total_flags: flags_written + flags_retrieved,
        flags_written_delta,
        flags_retrieved_delta,
        tcp_stats,
    })
}

pub async fn list_services(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let config = state.config.current();
    let conn = state.store.connection();

    let mut services = Vec::with_capacity(config.services.len());
    for service in &config.services {
        let is_tcp = matches!(service.service_type, ctf_stats_logic::config::ServiceType::Tcp);
        let stats = fetch_service_stats(conn, service.port, is_tcp).await?;
        services.push(dto::ServiceListItem {
            name: service.name.clone(),
            port: service.port,
            service_type: service_type_name(service.service_type),
            stats,
        });
    }

    Ok(HttpResponse::Ok().json(dto::ServiceListResponse {
        services,
        timestamp: chrono::Utc::now().to_rfc3339(),
    }))
}

pub async fn get_service(
    state: web::Data<AppState>,
    port: web::Path<u16>,
) -> Result<HttpResponse, ApiError> {
    let port = port.into_inner();
    let config = state.config.current();
    let service = config
        .get_service_by_port(port)
        .ok_or_else(|| ApiError::NotFound(format!("Service not found on port {port}")))?;

    let is_tcp = matches!(service.service_type, ctf_stats_logic::config::ServiceType::Tcp);
    let stats = fetch_service_stats(state.store.connection(), port, is_tcp).await?;

    Ok(HttpResponse::Ok().json(dto::ServiceListItem {
        name: service.name.clone(),
        port,
        service_type: service_type_name(service.service_type),
        stats,
    }))
}

fn service_type_name(t: ctf_stats_logic::config::ServiceType) -> String {
    use ctf_stats_logic::config::ServiceType::*;
    match t {
        Http => "http",
        Tcp => "tcp",
        Udp => "udp",
        Ws => "ws",
    }
    .to_string()
}
