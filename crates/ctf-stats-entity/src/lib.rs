pub mod alerts;
pub mod flag_time_stats;
pub mod flags;
pub mod http_header_time_stats;
pub mod http_headers;
pub mod http_path_stats;
pub mod http_path_time_stats;
pub mod http_query_param_time_stats;
pub mod http_request_time_stats;
pub mod http_requests;
pub mod http_response_code_stats;
pub mod http_responses;
pub mod service_stats;
pub mod session_links;
pub mod sessions;
pub mod tcp_connection_stats;
pub mod tcp_connection_time_stats;
pub mod tcp_connections;
pub mod tcp_events;
