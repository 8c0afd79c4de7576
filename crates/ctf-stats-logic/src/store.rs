//! Embedded relational store: schema management, per-table inserts and
//! idempotent counter increments, and the read-only ad-hoc SQL path used by
//! the dashboard.

use std::{path::Path, time::Duration};

use ctf_stats_migration::{Migrator, MigratorTrait};
use regex::Regex;
use sea_orm::{
    sqlx::{Column, Row, TypeInfo},
    ActiveModelTrait, ActiveValue::Set, ConnectionTrait, Database, DatabaseConnection,
    DatabaseTransaction, DbBackend, EntityTrait, Statement, TransactionTrait,
};
use serde::Serialize;

use crate::error::StoreError;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum IncrementOutcome {
    New,
    Updated,
}

#[derive(Debug, Serialize)]
pub struct SqlExecutionResult {
    pub columns: Vec<String>,
    pub rows: Vec<serde_json::Map<String, serde_json::Value>>,
    pub query_time_ms: f64,
}

pub struct Store {
    db: DatabaseConnection,
}

impl Store {
    /// Opens (creating if absent) the SQLite file at `path`, runs pending
    /// migrations, and enables WAL mode for non-blocking reader/writer
    /// concurrency.
    pub async fn connect(path: &Path) -> Result<Self, StoreError> {
        let url = format!("sqlite://{}?mode=rwc", path.display());
        let db = Database::connect(url).await?;
        Migrator::up(&db, None).await?;
        db.execute_unprepared("PRAGMA journal_mode=WAL;").await?;
        db.execute_unprepared("PRAGMA foreign_keys=ON;").await?;
        Ok(Self { db })
    }

    /// Opens an in-memory store for tests. No WAL pragma: in-memory SQLite
    /// has a single connection and no rotation concerns.
    pub async fn connect_in_memory() -> Result<Self, StoreError> {
        let db = Database::connect("sqlite::memory:").await?;
        Migrator::up(&db, None).await?;
        Ok(Self { db })
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    pub async fn begin(&self) -> Result<DatabaseTransaction, StoreError> {
        Ok(self.db.begin().await?)
    }

    // ---- core row inserts -------------------------------------------------

    pub async fn insert_http_request(
        tx: &DatabaseTransaction,
        row: HttpRequestInsert,
    ) -> Result<i64, StoreError> {
        use ctf_stats_entity::http_requests::ActiveModel;
        let model = ActiveModel {
            port: Set(row.port),
            start_time: Set(row.start_time),
            method: Set(row.method),
            path: Set(row.path),
            user_agent: Set(row.user_agent),
            body: Set(row.body),
            is_blocked: Set(row.is_blocked),
            tap_id: Set(row.tap_id),
            batch_id: Set(row.batch_id),
            ..Default::default()
        };
        let res = model.insert(tx).await?;
        Ok(res.id)
    }

    pub async fn insert_http_response(
        tx: &DatabaseTransaction,
        row: HttpResponseInsert,
    ) -> Result<i64, StoreError> {
        use ctf_stats_entity::http_responses::ActiveModel;
        let model = ActiveModel {
            request_id: Set(row.request_id),
            status: Set(row.status),
            body: Set(row.body),
            ..Default::default()
        };
        let res = model.insert(tx).await?;
        Ok(res.id)
    }

    pub async fn insert_http_header(
        tx: &DatabaseTransaction,
        row: HttpHeaderInsert,
    ) -> Result<i64, StoreError> {
        use ctf_stats_entity::http_headers::ActiveModel;
        let model = ActiveModel {
            name: Set(row.name),
            value: Set(row.value),
            request_id: Set(row.request_id),
            response_id: Set(row.response_id),
            ..Default::default()
        };
        let res = model.insert(tx).await?;
        Ok(res.id)
    }

    pub async fn insert_tcp_connection(
        tx: &DatabaseTransaction,
        row: TcpConnectionInsert,
    ) -> Result<i64, StoreError> {
        use ctf_stats_entity::tcp_connections::ActiveModel;
        let model = ActiveModel {
            port: Set(row.port),
            connection_id: Set(row.connection_id),
            start_time: Set(row.start_time),
            duration_ms: Set(row.duration_ms),
            bytes_in: Set(row.bytes_in),
            bytes_out: Set(row.bytes_out),
            is_blocked: Set(row.is_blocked),
            tap_id: Set(row.tap_id),
            batch_id: Set(row.batch_id),
            ..Default::default()
        };
        let res = model.insert(tx).await?;
        Ok(res.id)
    }

    pub async fn insert_tcp_event(
        tx: &DatabaseTransaction,
        row: TcpEventInsert,
    ) -> Result<i64, StoreError> {
        use ctf_stats_entity::tcp_events::ActiveModel;
        let model = ActiveModel {
            connection_id: Set(row.connection_id),
            timestamp: Set(row.timestamp),
            event_type: Set(row.event_type),
            data: Set(row.data),
            data_size: Set(row.data_size),
            end_stream: Set(row.end_stream),
            truncated: Set(row.truncated),
            ..Default::default()
        };
        let res = model.insert(tx).await?;
        Ok(res.id)
    }

    pub async fn insert_flag(
        tx: &DatabaseTransaction,
        row: FlagInsert,
    ) -> Result<i64, StoreError> {
        use ctf_stats_entity::flags::ActiveModel;
        let model = ActiveModel {
            value: Set(row.value),
            http_request_id: Set(row.http_request_id),
            http_response_id: Set(row.http_response_id),
            tcp_connection_id: Set(row.tcp_connection_id),
            tcp_event_id: Set(row.tcp_event_id),
            location: Set(row.location),
            offset: Set(row.offset),
            ..Default::default()
        };
        let res = model.insert(tx).await?;
        Ok(res.id)
    }

    pub async fn insert_alert(
        tx: &DatabaseTransaction,
        row: AlertInsert,
    ) -> Result<i64, StoreError> {
        use ctf_stats_entity::alerts::ActiveModel;
        let model = ActiveModel {
            created: Set(row.created),
            port: Set(row.port),
            description: Set(row.description),
            http_request_id: Set(row.http_request_id),
            http_response_id: Set(row.http_response_id),
            tcp_connection_id: Set(row.tcp_connection_id),
            ..Default::default()
        };
        let res = model.insert(tx).await?;
        Ok(res.id)
    }

    // ---- sessions ----------------------------------------------------------

    /// Inserts a new session with `count=1`, or on conflict increments
    /// `count` and returns the existing id.
    pub async fn upsert_session(
        tx: &DatabaseTransaction,
        port: i64,
        key: &str,
    ) -> Result<i64, StoreError> {
        let updated = tx
            .query_one(Statement::from_sql_and_values(
                DbBackend::Sqlite,
                "UPDATE sessions SET count = count + 1 WHERE port = ? AND key = ? RETURNING id",
                [port.into(), key.into()],
            ))
            .await?;
        if let Some(row) = updated {
            return Ok(row.try_get("", "id")?);
        }

        let inserted = tx
            .query_one(Statement::from_sql_and_values(
                DbBackend::Sqlite,
                "INSERT INTO sessions (port, key, count) VALUES (?, ?, 1) RETURNING id",
                [port.into(), key.into()],
            ))
            .await?
            .ok_or_else(|| StoreError::RejectedQuery("session insert returned no row".into()))?;
        Ok(inserted.try_get("", "id")?)
    }

    pub async fn insert_session_link(
        tx: &DatabaseTransaction,
        session_id: i64,
        http_request_id: i64,
    ) -> Result<(), StoreError> {
        tx.execute(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            "INSERT OR IGNORE INTO session_links (session_id, http_request_id) VALUES (?, ?)",
            [session_id.into(), http_request_id.into()],
        ))
        .await?;
        Ok(())
    }

    // ---- counters ------------------------------------------------------------

    pub async fn increment_service_stats(
        tx: &DatabaseTransaction,
        row: &ServiceStatsIncrement,
    ) -> Result<IncrementOutcome, StoreError> {
        let updated = tx
            .execute(Statement::from_sql_and_values(
                DbBackend::Sqlite,
                "UPDATE service_stats SET \
                    total_requests = total_requests + ?, \
                    total_blocked_requests = total_blocked_requests + ?, \
                    total_responses = total_responses + ?, \
                    total_blocked_responses = total_blocked_responses + ?, \
                    total_flags_written = total_flags_written + ?, \
                    total_flags_retrieved = total_flags_retrieved + ?, \
                    total_flags_blocked = total_flags_blocked + ?, \
                    total_tcp_connections = total_tcp_connections + ?, \
                    total_tcp_bytes_in = total_tcp_bytes_in + ?, \
                    total_tcp_bytes_out = total_tcp_bytes_out + ? \
                 WHERE port = ?",
                [
                    row.total_requests.into(),
                    row.total_blocked_requests.into(),
                    row.total_responses.into(),
                    row.total_blocked_responses.into(),
                    row.total_flags_written.into(),
                    row.total_flags_retrieved.into(),
                    row.total_flags_blocked.into(),
                    row.total_tcp_connections.into(),
                    row.total_tcp_bytes_in.into(),
                    row.total_tcp_bytes_out.into(),
                    row.port.into(),
                ],
            ))
            .await?;

        if updated.rows_affected() > 0 {
            return Ok(IncrementOutcome::Updated);
        }

        tx.execute(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            "INSERT INTO service_stats (port, total_requests, total_blocked_requests, \
                total_responses, total_blocked_responses, total_flags_written, \
                total_flags_retrieved, total_flags_blocked, total_tcp_connections, \
                total_tcp_bytes_in, total_tcp_bytes_out) VALUES (?,?,?,?,?,?,?,?,?,?,?)",
            [
                row.port.into(),
                row.total_requests.into(),
                row.total_blocked_requests.into(),
                row.total_responses.into(),
                row.total_blocked_responses.into(),
                row.total_flags_written.into(),
                row.total_flags_retrieved.into(),
                row.total_flags_blocked.into(),
                row.total_tcp_connections.into(),
                row.total_tcp_bytes_in.into(),
                row.total_tcp_bytes_out.into(),
            ],
        ))
        .await?;
        Ok(IncrementOutcome::New)
    }

    pub async fn increment_http_response_code_stats(
        tx: &DatabaseTransaction,
        port: i64,
        status_code: i64,
        delta: i64,
    ) -> Result<IncrementOutcome, StoreError> {
        increment_counter(
            tx,
            "UPDATE http_response_code_stats SET count = count + ? WHERE port = ? AND status_code = ?",
            [delta.into(), port.into(), status_code.into()],
            "INSERT INTO http_response_code_stats (port, status_code, count) VALUES (?, ?, ?)",
            [port.into(), status_code.into(), delta.into()],
        )
        .await
    }

    pub async fn increment_http_path_stats(
        tx: &DatabaseTransaction,
        port: i64,
        path: &str,
        delta: i64,
    ) -> Result<IncrementOutcome, StoreError> {
        increment_counter(
            tx,
            "UPDATE http_path_stats SET count = count + ? WHERE port = ? AND path = ?",
            [delta.into(), port.into(), path.into()],
            "INSERT INTO http_path_stats (port, path, count) VALUES (?, ?, ?)",
            [port.into(), path.into(), delta.into()],
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn increment_tcp_connection_stats(
        tx: &DatabaseTransaction,
        port: i64,
        read_min: i64,
        read_max: i64,
        write_min: i64,
        write_max: i64,
        delta: i64,
    ) -> Result<IncrementOutcome, StoreError> {
        increment_counter(
            tx,
            "UPDATE tcp_connection_stats SET count = count + ? \
                WHERE port = ? AND read_min = ? AND read_max = ? AND write_min = ? AND write_max = ?",
            [
                delta.into(),
                port.into(),
                read_min.into(),
                read_max.into(),
                write_min.into(),
                write_max.into(),
            ],
            "INSERT INTO tcp_connection_stats (port, read_min, read_max, write_min, write_max, count) \
                VALUES (?, ?, ?, ?, ?, ?)",
            [
                port.into(),
                read_min.into(),
                read_max.into(),
                write_min.into(),
                write_max.into(),
                delta.into(),
            ],
        )
        .await
    }

    pub async fn increment_http_path_time_stats(
        tx: &DatabaseTransaction,
        port: i64,
        method: &str,
        path: &str,
        time: i64,
        delta: i64,
    ) -> Result<IncrementOutcome, StoreError> {
        increment_counter(
            tx,
            "UPDATE http_path_time_stats SET count = count + ? \
                WHERE port = ? AND method = ? AND path = ? AND time = ?",
            [delta.into(), port.into(), method.into(), path.into(), time.into()],
            "INSERT INTO http_path_time_stats (port, method, path, time, count) VALUES (?, ?, ?, ?, ?)",
            [port.into(), method.into(), path.into(), time.into(), delta.into()],
        )
        .await
    }

    pub async fn increment_http_query_param_time_stats(
        tx: &DatabaseTransaction,
        port: i64,
        param: &str,
        value: &str,
        time: i64,
        delta: i64,
    ) -> Result<IncrementOutcome, StoreError> {
        increment_counter(
            tx,
            "UPDATE http_query_param_time_stats SET count = count + ? \
                WHERE port = ? AND param = ? AND value = ? AND time = ?",
            [delta.into(), port.into(), param.into(), value.into(), time.into()],
            "INSERT INTO http_query_param_time_stats (port, param, value, time, count) VALUES (?, ?, ?, ?, ?)",
            [port.into(), param.into(), value.into(), time.into(), delta.into()],
        )
        .await
    }

    pub async fn increment_http_header_time_stats(
        tx: &DatabaseTransaction,
        port: i64,
        name: &str,
        value: &str,
        time: i64,
        delta: i64,
    ) -> Result<IncrementOutcome, StoreError> {
        increment_counter(
            tx,
            "UPDATE http_header_time_stats SET count = count + ? \
                WHERE port = ? AND name = ? AND value = ? AND time = ?",
            [delta.into(), port.into(), name.into(), value.into(), time.into()],
            "INSERT INTO http_header_time_stats (port, name, value, time, count) VALUES (?, ?, ?, ?, ?)",
            [port.into(), name.into(), value.into(), time.into(), delta.into()],
        )
        .await
    }

    pub async fn increment_http_request_time_stats(
        tx: &DatabaseTransaction,
        port: i64,
        time: i64,
        count_delta: i64,
        blocked_delta: i64,
    ) -> Result<IncrementOutcome, StoreError> {
        increment_counter(
            tx,
            "UPDATE http_request_time_stats SET count = count + ?, blocked_count = blocked_count + ? \
                WHERE port = ? AND time = ?",
            [count_delta.into(), blocked_delta.into(), port.into(), time.into()],
            "INSERT INTO http_request_time_stats (port, time, count, blocked_count) VALUES (?, ?, ?, ?)",
            [port.into(), time.into(), count_delta.into(), blocked_delta.into()],
        )
        .await
    }

    pub async fn increment_flag_time_stats(
        tx: &DatabaseTransaction,
        port: i64,
        time: i64,
        write_delta: i64,
        read_delta: i64,
    ) -> Result<IncrementOutcome, StoreError> {
        increment_counter(
            tx,
            "UPDATE flag_time_stats SET write_count = write_count + ?, read_count = read_count + ? \
                WHERE port = ? AND time = ?",
            [write_delta.into(), read_delta.into(), port.into(), time.into()],
            "INSERT INTO flag_time_stats (port, time, write_count, read_count) VALUES (?, ?, ?, ?)",
            [port.into(), time.into(), write_delta.into(), read_delta.into()],
        )
        .await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn increment_tcp_connection_time_stats(
        tx: &DatabaseTransaction,
        port: i64,
        read_min: i64,
        read_max: i64,
        write_min: i64,
        write_max: i64,
        time: i64,
        delta: i64,
    ) -> Result<IncrementOutcome, StoreError> {
        increment_counter(
            tx,
            "UPDATE tcp_connection_time_stats SET count = count + ? \
                WHERE port = ? AND read_min = ? AND read_max = ? AND write_min = ? AND write_max = ? AND time = ?",
            [
                delta.into(),
                port.into(),
                read_min.into(),
                read_max.into(),
                write_min.into(),
                write_max.into(),
                time.into(),
            ],
            "INSERT INTO tcp_connection_time_stats \
                (port, read_min, read_max, write_min, write_max, time, count) VALUES (?, ?, ?, ?, ?, ?, ?)",
            [
                port.into(),
                read_min.into(),
                read_max.into(),
                write_min.into(),
                write_max.into(),
                time.into(),
                delta.into(),
            ],
        )
        .await
    }

    // ---- ad-hoc read-only SQL -------------------------------------------

    /// Executes a read-only `SELECT`, rejecting anything else, appending a
    /// default `LIMIT` when absent, and bounding execution time.
    ///
    /// SQLite has no server-side query cancellation primitive: on timeout
    /// the query future is simply dropped (closing out the statement)
    /// rather than cooperatively cancelled mid-scan.
    pub async fn execute_sql(
        &self,
        query: &str,
        default_limit: u64,
        timeout: Duration,
    ) -> Result<SqlExecutionResult, StoreError> {
        let query = validate_select_only(query)?;
        let query = apply_default_limit(&query, default_limit);

        let db = &self.db;
        let started = std::time::Instant::now();
        let result = tokio::time::timeout(timeout, run_ad_hoc_query(db, &query)).await;

        let (columns, rows) = match result {
            Ok(inner) => inner?,
            Err(_) => return Err(StoreError::QueryTimeout(timeout)),
        };

        Ok(SqlExecutionResult {
            columns,
            rows,
            query_time_ms: started.elapsed().as_secs_f64() * 1000.0,
        })
    }
}

async fn increment_counter(
    tx: &DatabaseTransaction,
    update_sql: &str,
    update_params: impl IntoIterator<Item = sea_orm::Value>,
    insert_sql: &str,
    insert_params: impl IntoIterator<Item = sea_orm::Value>,
) -> Result<IncrementOutcome, StoreError> {
    let result = tx
        .execute(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            update_sql,
            update_params,
        ))
        .await?;

    if result.rows_affected() > 0 {
        return Ok(IncrementOutcome::Updated);
    }

    tx.execute(Statement::from_sql_and_values(
        DbBackend::Sqlite,
        insert_sql,
        insert_params,
    ))
    .await?;
    Ok(IncrementOutcome::New)
}

fn validate_select_only(query: &str) -> Result<String, StoreError> {
    let trimmed = query.trim();
    let body = trimmed.trim_end_matches(';').trim();
    if body.contains(';') {
        return Err(StoreError::RejectedQuery(
            "only a single statement is allowed".into(),
        ));
    }

    let leading_keyword: String = body
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase();
    if leading_keyword != "SELECT" && leading_keyword != "WITH" {
        return Err(StoreError::RejectedQuery(
            "only read-only SELECT statements are allowed".into(),
        ));
    }
    Ok(body.to_string())
}

fn apply_default_limit(query: &str, default_limit: u64) -> String {
    static LIMIT_RE: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    let re = LIMIT_RE.get_or_init(|| Regex::new(r"(?i)\blimit\b").unwrap());
    if re.is_match(query) {
        query.to_string()
    } else {
        format!("{query} LIMIT {default_limit}")
    }
}

async fn run_ad_hoc_query(
    db: &DatabaseConnection,
    query: &str,
) -> Result<(Vec<String>, Vec<serde_json::Map<String, serde_json::Value>>), StoreError> {
    let pool = db.get_sqlite_connection_pool();
    let sqlx_rows = sea_orm::sqlx::query(query)
        .fetch_all(pool)
        .await
        .map_err(|err| StoreError::RejectedQuery(err.to_string()))?;

    let columns: Vec<String> = sqlx_rows
        .first()
        .map(|row| row.columns().iter().map(|c| c.name().to_string()).collect())
        .unwrap_or_default();

    let rows = sqlx_rows.iter().map(sqlite_row_to_json).collect();
    Ok((columns, rows))
}

fn sqlite_row_to_json(
    row: &sea_orm::sqlx::sqlite::SqliteRow,
) -> serde_json::Map<String, serde_json::Value> {
    let mut map = serde_json::Map::new();
    for column in row.columns() {
        let name = column.name();
        let value = match column.type_info().name() {
            "INTEGER" | "BIGINT" | "INT" => row
                .try_get::<Option<i64>, _>(name)
                .ok()
                .flatten()
                .map(serde_json::Value::from)
                .unwrap_or(serde_json::Value::Null),
            "REAL" | "FLOAT" | "DOUBLE" => row
                .try_get::<Option<f64>, _>(name)
                .ok()
                .flatten()
                .map(serde_json::Value::from)
                .unwrap_or(serde_json::Value::Null),
            "BOOLEAN" => row
                .try_get::<Option<bool>, _>(name)
                .ok()
                .flatten()
                .map(serde_json::Value::from)
                .unwrap_or(serde_json::Value::Null),
            "BLOB" => row
                .try_get::<Option<Vec<u8>>, _>(name)
                .ok()
                .flatten()
                .map(|bytes| {
                    use base64::Engine;
                    serde_json::Value::from(base64::engine::general_purpose::STANDARD.encode(bytes))
                })
                .unwrap_or(serde_json::Value::Null),
            _ => row
                .try_get::<Option<String>, _>(name)
                .ok()
                .flatten()
                .map(serde_json::Value::from)
                .unwrap_or(serde_json::Value::Null),
        };
        map.insert(name.to_string(), value);
    }
    map
}

// ---- insert request structs (mirrors `db/models.py`'s `Row.Insert` nested types) ----

#[derive(Default)]
pub struct HttpRequestInsert {
    pub port: i64,
    pub start_time: i64,
    pub method: Option<String>,
    pub path: Option<String>,
    pub user_agent: Option<String>,
    pub body: Option<String>,
    pub is_blocked: bool,
    pub tap_id: Option<String>,
    pub batch_id: Option<String>,
}

#[derive(Default)]
pub struct HttpResponseInsert {
    pub request_id: i64,
    pub status: i64,
    pub body: Option<String>,
}

#[derive(Default)]
pub struct HttpHeaderInsert {
    pub name: String,
    pub value: String,
    pub request_id: Option<i64>,
    pub response_id: Option<i64>,
}

#[derive(Default)]
pub struct TcpConnectionInsert {
    pub port: i64,
    pub connection_id: i64,
    pub start_time: i64,
    pub duration_ms: i64,
    pub bytes_in: i64,
    pub bytes_out: i64,
    pub is_blocked: bool,
    pub tap_id: Option<String>,
    pub batch_id: Option<String>,
}

#[derive(Default)]
pub struct TcpEventInsert {
    pub connection_id: i64,
    pub timestamp: i64,
    pub event_type: String,
    pub data: Vec<u8>,
    pub data_size: i64,
    pub end_stream: bool,
    pub truncated: bool,
}

#[derive(Default)]
pub struct FlagInsert {
    pub value: String,
    pub http_request_id: Option<i64>,
    pub http_response_id: Option<i64>,
    pub tcp_connection_id: Option<i64>,
    pub tcp_event_id: Option<i64>,
    pub location: Option<String>,
    pub offset: Option<i64>,
}

#[derive(Default)]
pub struct AlertInsert {
    pub created: i64,
    pub port: i64,
    pub description: String,
    pub http_request_id: Option<i64>,
    pub http_response_id: Option<i64>,
    pub tcp_connection_id: Option<i64>,
}

#[derive(Default)]
pub struct ServiceStatsIncrement {
    pub port: i64,
    pub total_requests: i64,
    pub total_blocked_requests: i64,
    pub total_responses: i64,
    pub total_blocked_responses: i64,
    pub total_flags_written: i64,
    pub total_flags_retrieved: i64,
    pub total_flags_blocked: i64,
    pub total_tcp_connections: i64,
    pub total_tcp_bytes_in: i64,
    pub total_tcp_bytes_out: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn increment_creates_then_updates() {
        let store = Store::connect_in_memory().await.unwrap();
        let tx = store.begin().await.unwrap();

        let outcome = Store::increment_http_path_stats(&tx, 80, "/foo", 1)
            .await
            .unwrap();
        assert_eq!(outcome, IncrementOutcome::New);

        let outcome = Store::increment_http_path_stats(&tx, 80, "/foo", 1)
            .await
            .unwrap();
        assert_eq!(outcome, IncrementOutcome::Updated);
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn session_upsert_increments_count() {
        let store = Store::connect_in_memory().await.unwrap();
        let tx = store.begin().await.unwrap();
        let id1 = Store::upsert_session(&tx, 80, "s1").await.unwrap();
        let id2 = Store::upsert_session(&tx, 80, "s1").await.unwrap();
        assert_eq!(id1, id2);
        tx.commit().await.unwrap();
    }

    #[tokio::test]
    async fn execute_sql_rejects_non_select() {
        let store = Store::connect_in_memory().await.unwrap();
        let err = store
            .execute_sql("DELETE FROM http_requests", 1000, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::RejectedQuery(_)));
    }

    #[tokio::test]
    async fn execute_sql_applies_default_limit() {
        let store = Store::connect_in_memory().await.unwrap();
        let result = store
            .execute_sql("SELECT * FROM service_stats", 5, Duration::from_secs(1))
            .await
            .unwrap();
        assert!(result.rows.is_empty());
    }
}
