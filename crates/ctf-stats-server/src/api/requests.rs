//! `GET /api/services/{port}/requests`, `GET /api/requests/{id}`,
//! `GET /api/requests/{id}/raw` — ported from `dashboard/app.py`'s
//! `get_service_requests`/`get_request_detail`/`get_request_raw`.

use actix_web::{web, HttpResponse};
use sea_orm::{ConnectionTrait, DbBackend, Statement};
use serde::Deserialize;
use std::collections::HashMap;

use super::{dto, ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct ListRequestsQuery {
    #[serde(default = "default_page")]
    page: u64,
    #[serde(default = "default_page_size")]
    page_size: u64,
    filter_path: Option<String>,
    filter_method: Option<String>,
    filter_status: Option<i64>,
    filter_blocked: Option<bool>,
}

fn default_page() -> u64 {
    1
}
fn default_page_size() -> u64 {
    30
}

pub async fn list_requests(
    state: web::Data<AppState>,
    port: web::Path<u16>,
    query: web::Query<ListRequestsQuery>,
) -> Result<HttpResponse, ApiError> {
    let port = port.into_inner();
    let config = state.config.current();
    let service = config
        .get_service_by_port(port)
        .ok_or_else(|| ApiError::NotFound(format!("Service not found on port {port}")))?;

    let mut where_sql = "req.port = ?".to_string();
    let mut params: Vec<sea_orm::Value> = vec![i64::from(port).into()];

    if let Some(path) = &query.filter_path {
        where_sql.push_str(" AND req.path LIKE ?");
        params.push(format!("%{path}%").into());
    }
    if let Some(method) = &query.filter_method {
        where_sql.push_str(" AND req.method = ?");
        params.push(method.to_uppercase().into());
    }
    if let Some(status) = query.filter_status {
        where_sql.push_str(" AND resp.status = ?");
        params.push(status.into());
    }
    if let Some(blocked) = query.filter_blocked {
        where_sql.push_str(" AND req.is_blocked = ?");
        params.push((blocked as i64).into());
    }

    let conn = state.store.connection();

    let count_sql = format!(
        "SELECT COUNT(*) as c FROM http_requests req LEFT JOIN http_responses resp ON req.id = resp.request_id WHERE {where_sql}"
    );
    let total: i64 = conn
        .query_one(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            &count_sql,
            params.clone(),
        ))
        .await?
        .map(|row| row.try_get("", "c"))
        .transpose()?
        .unwrap_or(0);

    let page = query.page.max(1);
    let page_size = query.page_size.max(1);
    let offset = (page - 1) * page_size;

    let list_sql = format!(
        "SELECT req.id, req.start_time, req.method, req.path, resp.id as response_id,
                resp.status, req.is_blocked, req.user_agent,
                (SELECT COUNT(*) FROM flags f WHERE f.http_request_id = req.id) as req_flags,
                (SELECT COUNT(*) FROM flags f WHERE f.http_response_id = resp.id) as resp_flags,
                (SELECT COALESCE(SUM(s.count), 0) FROM session_links sl
                   JOIN sessions s ON sl.session_id = s.id WHERE sl.http_request_id = req.id) as total_links
         FROM http_requests req
         LEFT JOIN http_responses resp ON req.id = resp.request_id
         WHERE {where_sql}
         ORDER BY req.start_time DESC
         LIMIT ? OFFSET ?"
    );
    let mut list_params = params;
    list_params.push((page_size as i64).into());
    list_params.push((offset as i64).into());

    let rows = conn
        .query_all(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            &list_sql,
            list_params,
        ))
        .await?;

    let mut requests = Vec::with_capacity(rows.len());
    for row in &rows {
        requests.push(dto::RequestListItem {
            id: row.try_get("", "id")?,
            timestamp: row.try_get("", "start_time")?,
            method: row.try_get::<Option<String>>("", "method")?.unwrap_or_default(),
            path: row.try_get::<Option<String>>("", "path")?.unwrap_or_default(),
            status: row.try_get("", "status")?,
            is_blocked: row.try_get("", "is_blocked")?,
            user_agent: row.try_get::<Option<String>>("", "user_agent")?.unwrap_or_default(),
            request_flags: row.try_get("", "req_flags")?,
            response_flags: row.try_get("", "resp_flags")?,
            total_links: row.try_get("", "total_links")?,
        });
    }

    let total_pages = if total > 0 {
        (total + page_size as i64 - 1) / page_size as i64
    } else {
        0
    };

    Ok(HttpResponse::Ok().json(dto::RequestListResponse {
        requests,
        total,
        service_name: service.name.clone(),
        service_port: port,
        page,
        page_size,
        total_pages,
    }))
}

pub async fn get_request(
    state: web::Data<AppState>,
    request_id: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let request_id = request_id.into_inner();
    let conn = state.store.connection();

    let row = conn
        .query_one(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            "SELECT req.method, req.path, req.body, req.user_agent, req.start_time, req.port,
                    req.is_blocked, resp.id as response_id, resp.status, resp.body as response_body
             FROM http_requests req
             LEFT JOIN http_responses resp ON req.id = resp.request_id
             WHERE req.id = ?",
            [request_id.into()],
        ))
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Request not found: {request_id}")))?;

    let full_path: String = row.try_get::<Option<String>>("", "path")?.unwrap_or_default();
    let (path_part, query_string) = full_path
        .split_once('?')
        .map(|(p, q)| (p.to_string(), Some(q.to_string())))
        .unwrap_or((full_path.clone(), None));

    let mut query_params = HashMap::new();
    if let Some(qs) = query_string {
        for param in qs.split('&') {
            match param.split_once('=') {
                Some((k, v)) => {
                    query_params.insert(k.to_string(), v.to_string());
                }
                None => {
                    query_params.insert(param.to_string(), String::new());
                }
            }
        }
    }

    let request_headers = fetch_headers(conn, "request_id", request_id).await?;
    let request_flags = fetch_flags(conn, "http_request_id", request_id).await?;

    let linked_rows = conn
        .query_all(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            "SELECT DISTINCT sl2.http_request_id,
                    CASE WHEN sl2.http_request_id < ? THEN 'incoming' ELSE 'outgoing' END as direction,
                    s.key as session_key
             FROM session_links sl1
             JOIN session_links sl2 ON sl1.session_id = sl2.session_id
             JOIN sessions s ON s.id = sl1.session_id
             WHERE sl1.http_request_id = ? AND sl2.http_request_id != ?",
            [request_id.into(), request_id.into(), request_id.into()],
        ))
        .await?;

    let mut linked_requests = Vec::new();
    let mut session_key: Option<String> = None;
    for link_row in &linked_rows {
        let linked_id: i64 = link_row.try_get("", "http_request_id")?;
        let direction: String = link_row.try_get("", "direction")?;
        let key: Option<String> = link_row.try_get("", "session_key")?;
        if session_key.is_none() {
            session_key = key.clone();
        }

        let detail = conn
            .query_one(Statement::from_sql_and_values(
                DbBackend::Sqlite,
                "SELECT method, path, start_time FROM http_requests WHERE id = ?",
                [linked_id.into()],
            ))
            .await?;
        if let Some(detail) = detail {
            let method: String = detail.try_get::<Option<String>>("", "method")?.unwrap_or_default();
            let full_path: String = detail.try_get::<Option<String>>("", "path")?.unwrap_or_default();
            let path = full_path.split('?').next().unwrap_or_default().to_string();
            let start_time: i64 = detail.try_get("", "start_time")?;
            linked_requests.push(dto::LinkedRequestItem {
                id: linked_id,
                method,
                path,
                time: format_hms(start_time),
                direction,
                session_key: key,
            });
        }
    }

    let request_detail = dto::RequestDetail {
        id: request_id,
        method: row.try_get::<Option<String>>("", "method")?.unwrap_or_default(),
        path: path_part,
        port: row.try_get("", "port")?,
        timestamp: row.try_get("", "start_time")?,
        user_agent: row.try_get("", "user_agent")?,
        body: row.try_get("", "body")?,
        is_blocked: row.try_get("", "is_blocked")?,
        headers: request_headers,
        query_params,
        flags: request_flags,
        linked_requests,
    };

    let response_id: Option<i64> = row.try_get("", "response_id")?;
    let response = match response_id {
        Some(response_id) => Some(dto::ResponseDetail {
            id: response_id,
            status: row.try_get("", "status")?,
            body: row.try_get("", "response_body")?,
            headers: fetch_headers(conn, "response_id", response_id).await?,
            flags: fetch_flags(conn, "http_response_id", response_id).await?,
        }),
        None => None,
    };

    Ok(HttpResponse::Ok().json(dto::RequestDetailResponse {
        request: request_detail,
        response,
    }))
}

pub async fn get_request_raw(
    state: web::Data<AppState>,
    request_id: web::Path<i64>,
) -> Result<HttpResponse, ApiError> {
    let request_id = request_id.into_inner();
    let conn = state.store.connection();

    let row = conn
        .query_one(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            "SELECT req.method, req.path, req.body, resp.status, resp.body as response_body
             FROM http_requests req
             LEFT JOIN http_responses resp ON req.id = resp.request_id
             WHERE req.id = ?",
            [request_id.into()],
        ))
        .await?
        .ok_or_else(|| ApiError::NotFound("Raw request data not found".to_string()))?;

    let method: String = row.try_get::<Option<String>>("", "method")?.unwrap_or_default();
    let path: String = row.try_get::<Option<String>>("", "path")?.unwrap_or_default();
    let headers = fetch_headers(conn, "request_id", request_id).await?;

    let mut raw = format!("{method} {path} HTTP/1.1\r\n");
    for h in &headers {
        raw.push_str(&format!("{}: {}\r\n", h.name, h.value));
    }
    raw.push_str("\r\n");
    if let Some(body) = row.try_get::<Option<String>>("", "body")? {
        raw.push_str(&body);
    }

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(raw))
}

async fn fetch_headers(
    conn: &sea_orm::DatabaseConnection,
    column: &str,
    id: i64,
) -> Result<Vec<dto::HeaderItem>, ApiError> {
    let sql = format!("SELECT name, value FROM http_headers WHERE {column} = ? ORDER BY name");
    let rows = conn
        .query_all(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            &sql,
            [id.into()],
        ))
        .await?;
    rows.iter()
        .map(|row| {
            Ok(dto::HeaderItem {
                name: row.try_get("", "name")?,
                value: row.try_get("", "value")?,
            })
        })
        .collect()
}

async fn fetch_flags(
    conn: &sea_orm::DatabaseConnection,
    column: &str,
    id: i64,
) -> Result<Vec<dto::FlagItem>, ApiError> {
    let sql = format!("SELECT id, value, location FROM flags WHERE {column} = ?");
    let rows = conn
        .query_all(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            &sql,
            [id.into()],
        ))
        .await?;
    rows.iter()
        .map(|row| {
            Ok(dto::FlagItem {
                id: row.try_get("", "id")?,
                flag: row.try_get("", "value")?,
                location: row.try_get("", "location")?,
            })
        })
        .collect()
}

fn format_hms(start_time_ms: i64) -> String {
    use chrono::TimeZone;
    chrono::Utc
        .timestamp_millis_opt(start_time_ms)
        .single()
        .map(|dt| dt.format("%H:%M:%S").to_string())
        .unwrap_or_default()
}
