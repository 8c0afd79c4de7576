//! `POST /api/sql`, `GET /api/sql/schema` — ported from `dashboard/app.py`'s
//! `execute_sql`/`get_sql_schema`. Schema is introspected from `sqlite_master`
//! rather than read from a static file, since this backend has no such file
//! (the schema lives in `sea-orm-migration` code) — see DESIGN.md.

use std::time::Duration;

use actix_web::{web, HttpResponse};
use sea_orm::{ConnectionTrait, DbBackend, Statement};
use serde::Deserialize;

use super::{ApiError, AppState};

const DEFAULT_LIMIT: u64 = 1000;
const DEFAULT_TIMEOUT_SECS: f64 = 10.0;
const MAX_TIMEOUT_SECS: f64 = 60.0;

#[derive(Debug, Deserialize)]
pub struct SqlQueryBody {
    query: String,
    #[serde(default)]
    timeout: Option<f64>,
}

pub async fn execute_sql(
    state: web::Data<AppState>,
    body: web::Json<SqlQueryBody>,
) -> Result<HttpResponse, ApiError> {
    let timeout_secs = body.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS);
    if timeout_secs <= 0.0 || timeout_secs > MAX_TIMEOUT_SECS {
        return Err(ApiError::BadRequest(format!(
            "timeout must be between 0 and {MAX_TIMEOUT_SECS} seconds"
        )));
    }

    let result = state
        .store
        .execute_sql(
            &body.query,
            DEFAULT_LIMIT,
            Duration::from_secs_f64(timeout_secs),
        )
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "columns": result.columns,
        "rows": result.rows,
        "row_count": result.rows.len(),
        "query_time_ms": result.query_time_ms,
    })))
}

pub async fn sql_schema(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let rows = state
        .store
        .connection()
        .query_all(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            "SELECT name, sql FROM sqlite_master WHERE type = 'table' AND sql IS NOT NULL ORDER BY name",
            Vec::<sea_orm::Value>::new(),
        ))
        .await?;

    let mut schema = String::new();
    for row in &rows {
        let sql: String = row.try_get("", "sql")?;
        schema.push_str(&sql);
        schema.push_str(";\n\n");
    }

    Ok(HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body(schema))
}
