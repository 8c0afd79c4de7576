//! Path/query-param/header/flag/request time-series routes — ported from
//! `dashboard/app.py`'s `PathStats`/`QueryParamStats`/`HeaderStats` helper
//! classes and the `flag-time-stats`/`request-time-stats` routes.

use std::collections::BTreeMap;

use actix_web::{web, HttpResponse};
use sea_orm::{ConnectionTrait, DbBackend, Statement};
use serde::Deserialize;

use super::{dto, ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    #[serde(default = "default_window_minutes")]
    window_minutes: i64,
}

fn default_window_minutes() -> i64 {
    60
}

fn since_ms(window_minutes: i64) -> i64 {
    chrono::Utc::now().timestamp_millis() - window_minutes * 60 * 1000
}

pub async fn path_stats(
    state: web::Data<AppState>,
    port: web::Path<u16>,
    query: web::Query<WindowQuery>,
) -> Result<HttpResponse, ApiError> {
    let port = port.into_inner();
    let config = state.config.current();
    let service = config
        .get_service_by_port(port)
        .ok_or_else(|| ApiError::NotFound(format!("Service not found on port {port}")))?;

    let rows = state
        .store
        .connection()
        .query_all(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            "SELECT method, path, time, count FROM http_path_time_stats
             WHERE port = ? AND time >= ? ORDER BY method, path, time",
            [i64::from(port).into(), since_ms(query.window_minutes).into()],
        ))
        .await?;

    let mut grouped: BTreeMap<(String, String), Vec<dto::TimePoint>> = BTreeMap::new();
    for row in &rows {
        let method: String = row.try_get("", "method")?;
        let path: String = row.try_get("", "path")?;
        let time: i64 = row.try_get("", "time")?;
        let count: i64 = row.try_get("", "count")?;
        grouped
            .entry((method, path))
            .or_default()
            .push(dto::TimePoint {
                timestamp: time,
                count,
            });
    }

    let paths = grouped
        .into_iter()
        .map(|((method, path), time_series)| dto::PathStatItem {
            total_count: time_series.iter().map(|p| p.count).sum(),
            method,
            path,
            time_series,
        })
        .collect();

    let ignored_paths = service
        .ignore_path_stats
        .iter()
        .map(|p| format!("{} {}", p.method, p.path))
        .collect();

    Ok(HttpResponse::Ok().json(dto::PathStatsResponse {
        paths,
        service_name: service.name.clone(),
        service_port: port,
        ignored_paths,
        window_minutes: query.window_minutes,
    }))
}

pub async fn query_stats(
    state: web::Data<AppState>,
    port: web::Path<u16>,
    query: web::Query<WindowQuery>,
) -> Result<HttpResponse, ApiError> {
    let port = port.into_inner();
    let config = state.config.current();
    let service = config
        .get_service_by_port(port)
        .ok_or_else(|| ApiError::NotFound(format!("Service not found on port {port}")))?;

    let rows = state
        .store
        .connection()
        .query_all(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            "SELECT param, value, time, count FROM http_query_param_time_stats
             WHERE port = ? AND time >= ? ORDER BY param, value, time",
            [i64::from(port).into(), since_ms(query.window_minutes).into()],
        ))
        .await?;

    let mut grouped: BTreeMap<(String, String), Vec<dto::TimePoint>> = BTreeMap::new();
    for row in &rows {
        let param: String = row.try_get("", "param")?;
        let value: String = row.try_get("", "value")?;
        let time: i64 = row.try_get("", "time")?;
        let count: i64 = row.try_get("", "count")?;
        grouped
            .entry((param, value))
            .or_default()
            .push(dto::TimePoint {
                timestamp: time,
                count,
            });
    }

    let queries = grouped
        .into_iter()
        .map(|((param, value), time_series)| dto::QueryStatItem {
            total_count: time_series.iter().map(|p| p.count).sum(),
            param,
            value,
            time_series,
        })
        .collect();

    let ignored_queries = service
        .ignore_query_param_stats
        .keys()
        .cloned()
        .collect();

    Ok(HttpResponse::Ok().json(dto::QueryStatsResponse {
        queries,
        service_name: service.name.clone(),
        service_port: port,
        ignored_queries,
        window_minutes: query.window_minutes,
    }))
}

pub async fn header_stats(
    state: web::Data<AppState>,
    port: web::Path<u16>,
    query: web::Query<WindowQuery>,
) -> Result<HttpResponse, ApiError> {
    let port = port.into_inner();
    let config = state.config.current();
    let service = config
        .get_service_by_port(port)
        .ok_or_else(|| ApiError::NotFound(format!("Service not found on port {port}")))?;

    let rows = state
        .store
        .connection()
        .query_all(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            "SELECT name, value, time, count FROM http_header_time_stats
             WHERE port = ? AND time >= ? ORDER BY name, value, time",
            [i64::from(port).into(), since_ms(query.window_minutes).into()],
        ))
        .await?;

    let mut grouped: BTreeMap<(String, String), Vec<dto::TimePoint>> = BTreeMap::new();
    for row in &rows {
        let name: String = row.try_get("", "name")?;
        let value: String = row.try_get("", "value")?;
        let time: i64 = row.try_get("", "time")?;
        let count: i64 = row.try_get("", "count")?;
        grouped
            .entry((name, value))
            .or_default()
            .push(dto::TimePoint {
                timestamp: time,
                count,
            });
    }

    let headers = grouped
        .into_iter()
        .map(|((name, value), time_series)| dto::HeaderStatItem {
            total_count: time_series.iter().map(|p| p.count).sum(),
            name,
            value,
            time_series,
        })
        .collect();

    let ignored_headers = service.ignore_header_stats.keys().cloned().collect();

    Ok(HttpResponse::Ok().json(dto::HeaderStatsResponse {
        headers,
        service_name: service.name.clone(),
        service_port: port,
        ignored_headers,
        window_minutes: query.window_minutes,
    }))
}

pub async fn recent_flag_stats(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let window_minutes = 5;
    let rows = state
        .store
        .connection()
        .query_all(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            "SELECT port, time, write_count, read_count FROM flag_time_stats
             WHERE time >= ? ORDER BY time",
            [since_ms(window_minutes).into()],
        ))
        .await?;

    Ok(HttpResponse::Ok().json(dto::FlagTimeStatsResponse {
        stats: rows_to_flag_stats(&rows)?,
        window_minutes,
    }))
}

pub async fn service_flag_time_stats(
    state: web::Data<AppState>,
    port: web::Path<u16>,
    query: web::Query<WindowQuery>,
) -> Result<HttpResponse, ApiError> {
    let port = port.into_inner();
    state
        .config
        .current()
        .get_service_by_port(port)
        .ok_or_else(|| ApiError::NotFound(format!("Service not found on port {port}")))?;

    let rows = state
        .store
        .connection()
        .query_all(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            "SELECT port, time, write_count, read_count FROM flag_time_stats
             WHERE port = ? AND time >= ? ORDER BY time",
            [i64::from(port).into(), since_ms(query.window_minutes).into()],
        ))
        .await?;

    Ok(HttpResponse::Ok().json(dto::FlagTimeStatsResponse {
        stats: rows_to_flag_stats(&rows)?,
        window_minutes: query.window_minutes,
    }))
}

pub async fn all_flag_time_stats(
    state: web::Data<AppState>,
    query: web::Query<WindowQuery>,
) -> Result<HttpResponse, ApiError> {
    let rows = state
        .store
        .connection()
        .query_all(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            "SELECT port, time, write_count, read_count FROM flag_time_stats
             WHERE time >= ? ORDER BY port, time",
            [since_ms(query.window_minutes).into()],
        ))
        .await?;

    Ok(HttpResponse::Ok().json(dto::FlagTimeStatsResponse {
        stats: rows_to_flag_stats(&rows)?,
        window_minutes: query.window_minutes,
    }))
}

pub async fn service_request_time_stats(
    state: web::Data<AppState>,
    port: web::Path<u16>,
    query: web::Query<WindowQuery>,
) -> Result<HttpResponse, ApiError> {
    let port = port.into_inner();
    let service = state
        .config
        .current()
        .get_service_by_port(port)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("Service not found on port {port}")))?;

    if matches!(service.service_type, ctf_stats_logic::config::ServiceType::Tcp) {
        return Err(ApiError::BadRequest(
            "Request time stats are not available for tcp services".to_string(),
        ));
    }

    let rows = state
        .store
        .connection()
        .query_all(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            "SELECT port, time, count, blocked_count FROM http_request_time_stats
             WHERE port = ? AND time >= ? ORDER BY time",
            [i64::from(port).into(), since_ms(query.window_minutes).into()],
        ))
        .await?;

    Ok(HttpResponse::Ok().json(dto::RequestTimeStatsResponse {
        stats: rows_to_request_stats(&rows)?,
        window_minutes: query.window_minutes,
    }))
}

pub async fn all_request_time_stats(
    state: web::Data<AppState>,
    query: web::Query<WindowQuery>,
) -> Result<HttpResponse, ApiError> {
    let rows = state
        .store
        .connection()
        .query_all(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            "SELECT port, time, count, blocked_count FROM http_request_time_stats
             WHERE time >= ? ORDER BY port, time",
            [since_ms(query.window_minutes).into()],
        ))
        .await?;

    Ok(HttpResponse::Ok().json(dto::RequestTimeStatsResponse {
        stats: rows_to_request_stats(&rows)?,
        window_minutes: query.window_minutes,
    }))
}

fn rows_to_flag_stats(rows: &[sea_orm::QueryResult]) -> Result<Vec<dto::FlagTimeStatsItem>, ApiError> {
    rows.iter()
        .map(|row| {
            let write_count: i64 = row.try_get("", "write_count")?;
            let read_count: i64 = row.try_get("", "read_count")?;
            Ok(dto::FlagTimeStatsItem {
                port: row.try_get("", "port")?,
                time: row.try_get("", "time")?,
                write_count,
                read_count,
                total_count: write_count + read_count,
            })
        })
        .collect()
}

fn rows_to_request_stats(
    rows: &[sea_orm::QueryResult],
) -> Result<Vec<dto::RequestTimeStatsItem>, ApiError> {
    rows.iter()
        .map(|row| {
            Ok(dto::RequestTimeStatsItem {
                port: row.try_get("", "port")?,
                time: row.try_get("", "time")?,
                count: row.try_get("", "count")?,
                blocked_count: row.try_get("", "blocked_count")?,
            })
        })
        .collect()
}
