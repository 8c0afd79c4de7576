//! Response payloads for the dashboard read API, field-for-field ports of
//! `dashboard/models.py`'s pydantic models.

use std::collections::HashMap;

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct TcpStats {
    pub total_connections: i64,
    pub total_bytes_in: i64,
    pub total_bytes_out: i64,
    pub avg_duration_ms: i64,
    pub total_flags_found: i64,
}

#[derive(Debug, Serialize)]
pub struct ServiceStats {
    pub total_requests: i64,
    pub blocked_requests: i64,
    pub requests_delta: i64,
    pub blocked_requests_delta: i64,
    pub total_responses: i64,
    pub error_responses: i64,
    pub success_responses: i64,
    pub redirect_responses: i64,
    pub status_counts: HashMap<i64, i64>,
    pub alerts_count: i64,
    pub flags_written: i64,
    pub flags_retrieved: i64,
    pub flags_blocked: i64,
    pub total_flags: i64,
    pub flags_written_delta: i64,
    pub flags_retrieved_delta: i64,
    pub tcp_stats: Option<TcpStats>,
}

#[derive(Debug, Serialize)]
pub struct ServiceListItem {
    pub name: String,
    pub port: u16,
    #[serde(rename = "type")]
    pub service_type: String,
    pub stats: ServiceStats,
}

#[derive(Debug, Serialize)]
pub struct ServiceListResponse {
    pub services: Vec<ServiceListItem>,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
pub struct RequestListItem {
    pub id: i64,
    pub timestamp: i64,
    pub method: String,
    pub path: String,
    pub status: Option<i64>,
    pub is_blocked: bool,
    pub user_agent: String,
    pub request_flags: i64,
    pub response_flags: i64,
    pub total_links: i64,
}

#[derive(Debug, Serialize)]
pub struct RequestListResponse {
    pub requests: Vec<RequestListItem>,
    pub total: i64,
    pub service_name: String,
    pub service_port: u16,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize)]
pub struct HeaderItem {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct FlagItem {
    pub id: i64,
    pub flag: String,
    pub location: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LinkedRequestItem {
    pub id: i64,
    pub method: String,
    pub path: String,
    pub time: String,
    pub direction: String,
    pub session_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RequestDetail {
    pub id: i64,
    pub method: String,
    pub path: String,
    pub port: i64,
    pub timestamp: i64,
    pub user_agent: Option<String>,
    pub body: Option<String>,
    pub is_blocked: bool,
    pub headers: Vec<HeaderItem>,
    pub query_params: HashMap<String, String>,
    pub flags: Vec<FlagItem>,
    pub linked_requests: Vec<LinkedRequestItem>,
}

#[derive(Debug, Serialize)]
pub struct ResponseDetail {
    pub id: i64,
    pub status: i64,
    pub body: Option<String>,
    pub headers: Vec<HeaderItem>,
    pub flags: Vec<FlagItem>,
}

#[derive(Debug, Serialize)]
pub struct RequestDetailResponse {
    pub request: RequestDetail,
    pub response: Option<ResponseDetail>,
}

#[derive(Debug, Serialize)]
pub struct TimePoint {
    pub timestamp: i64,
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct PathStatItem {
    pub method: String,
    pub path: String,
    pub total_count: i64,
    pub time_series: Vec<TimePoint>,
}

#[derive(Debug, Serialize)]
pub struct PathStatsResponse {
    pub paths: Vec<PathStatItem>,
    pub service_name: String,
    pub service_port: u16,
    pub ignored_paths: Vec<String>,
    pub window_minutes: i64,
}

#[derive(Debug, Serialize)]
pub struct QueryStatItem {
    pub param: String,
    pub value: String,
    pub total_count: i64,
    pub time_series: Vec<TimePoint>,
}

#[derive(Debug, Serialize)]
pub struct QueryStatsResponse {
    pub queries: Vec<QueryStatItem>,
    pub service_name: String,
    pub service_port: u16,
    pub ignored_queries: Vec<String>,
    pub window_minutes: i64,
}

#[derive(Debug, Serialize)]
pub struct HeaderStatItem {
    pub name: String,
    pub value: String,
    pub total_count: i64,
    pub time_series: Vec<TimePoint>,
}

#[derive(Debug, Serialize)]
pub struct HeaderStatsResponse {
    pub headers: Vec<HeaderStatItem>,
    pub service_name: String,
    pub service_port: u16,
    pub ignored_headers: Vec<String>,
    pub window_minutes: i64,
}

#[derive(Debug, Serialize)]
pub struct TcpConnectionItem {
    pub id: i64,
    pub connection_id: i64,
    pub timestamp: i64,
    pub duration_ms: i64,
    pub bytes_in: i64,
    pub bytes_out: i64,
    pub flags_in: i64,
    pub flags_out: i64,
    pub is_blocked: bool,
}

#[derive(Debug, Serialize)]
pub struct TcpConnectionListResponse {
    pub connections: Vec<TcpConnectionItem>,
    pub total: i64,
    pub service_name: String,
    pub service_port: u16,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: i64,
}

#[derive(Debug, Serialize)]
pub struct TcpEventItem {
    pub id: i64,
    pub timestamp: i64,
    pub event_type: String,
    pub data_size: i64,
    pub data_bytes: Option<String>,
    pub truncated: bool,
    pub end_stream: bool,
    pub flags: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct TcpConnectionDetail {
    pub id: i64,
    pub connection_id: i64,
    pub port: i64,
    pub timestamp: i64,
    pub duration_ms: i64,
    pub bytes_in: i64,
    pub bytes_out: i64,
    pub events: Vec<TcpEventItem>,
    pub total_flags: i64,
    pub is_blocked: bool,
}

#[derive(Debug, Serialize)]
pub struct TcpConnectionStatsItem {
    pub read_min: i64,
    pub read_max: i64,
    pub write_min: i64,
    pub write_max: i64,
    pub count: i64,
    pub time_series: Vec<TimePoint>,
}

#[derive(Debug, Serialize)]
pub struct TcpConnectionStatsResponse {
    pub stats: Vec<TcpConnectionStatsItem>,
    pub service_name: String,
    pub service_port: u16,
    pub precision: i64,
    pub window_minutes: i64,
}

#[derive(Debug, Serialize)]
pub struct FlagTimeStatsItem {
    pub port: i64,
    pub time: i64,
    pub write_count: i64,
    pub read_count: i64,
    pub total_count: i64,
}

#[derive(Debug, Serialize)]
pub struct FlagTimeStatsResponse {
    pub stats: Vec<FlagTimeStatsItem>,
    pub window_minutes: i64,
}

#[derive(Debug, Serialize)]
pub struct RequestTimeStatsItem {
    pub port: i64,
    pub time: i64,
    pub count: i64,
    pub blocked_count: i64,
}

#[derive(Debug, Serialize)]
pub struct RequestTimeStatsResponse {
    pub stats: Vec<RequestTimeStatsItem>,
    pub window_minutes: i64,
}

#[derive(Debug, Serialize)]
pub struct ConfigRevision {
    pub filename: String,
    pub size: u64,
}

#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub content: String,
    pub revisions: Vec<ConfigRevision>,
}

#[derive(Debug, Serialize)]
pub struct ConfigValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
}
