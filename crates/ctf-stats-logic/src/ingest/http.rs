//! Correlates the HTTP access log with buffered `http_buffered_trace` tap
//! files and writes the resulting rows. Ported from
//! `tap_processor.py::TapProcessor` + `http.py`'s batch driver, generalized
//! to the newer split-chain HTTP/TCP variant.

use std::{collections::HashMap, path::PathBuf, sync::Arc};

use crate::{
    access_log::AccessLogTail,
    config::Config,
    error::IngestError,
    flags,
    ingest::common,
    sessions::SessionTracker,
    store::{
        AlertInsert, FlagInsert, HttpHeaderInsert, HttpRequestInsert, HttpResponseInsert,
        IncrementOutcome, ServiceStatsIncrement, Store,
    },
    tap_spool::TapSpool,
};

/// Hardwired header names never counted in `http_header_time_stats`,
/// regardless of per-port `ignore_header_stats`. As spec.md §4.F.
const IGNORED_HEADER_STATS: [&str; 4] = ["content-length", ":path", "cookie", "x-request-id"];

fn extract_request_id(data: &serde_json::Value) -> Option<String> {
    let trace = data.get("http_buffered_trace")?;
    for side in ["request", "response"] {
        let headers = trace.get(side)?.get("headers").unwrap_or(&serde_json::Value::Null);
        let pairs = common::headers_to_pairs(headers);
        if let Some(value) = common::header_value(&pairs, "x-request-id") {
            return Some(value.to_string());
        }
    }
    None
}

pub struct HttpIngest {
    access_log: AccessLogTail,
    tap_spool: TapSpool<String, fn(&serde_json::Value) -> Option<String>>,
    store: Arc<Store>,
    config: Arc<Config>,
}

impl HttpIngest {
    pub fn new(
        access_log_path: impl Into<PathBuf>,
        taps_dir: impl Into<PathBuf>,
        store: Arc<Store>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            access_log: AccessLogTail::new(access_log_path),
            tap_spool: TapSpool::new(taps_dir, extract_request_id as fn(&serde_json::Value) -> Option<String>),
            store,
            config,
        }
    }

    /// As spec.md §4.F: reads new access log entries, correlates each with
    /// its buffered tap by `x-request-id`, writes rows for every
    /// successfully-matched tap, and advances the read offset to the last
    /// entry regardless of how many taps matched.
    pub async fn process_new_access_log_entries(
        &mut self,
        batch_id: &str,
        sessions: &mut SessionTracker,
    ) -> Result<HashMap<String, serde_json::Value>, IngestError> {
        let entries = self.access_log.read_new_entries(1000)?;
        self.tap_spool.refresh()?;

        let mut to_archive = HashMap::new();

        for entry in &entries {
            let Some(stream_id) = entry.data.get("stream_id").and_then(|v| v.as_str()) else {
                tracing::warn!("access log entry missing stream_id");
                continue;
            };
            let Some(tap_name) = self.tap_spool.pop_by_key(&stream_id.to_string()) else {
                tracing::warn!(stream_id, "no tap file matched http access log entry");
                continue;
            };
            let Some(tap_data) = self.tap_spool.pop_filename(&tap_name) else {
                tracing::warn!(tap_name, "tap data not cached for matched file name");
                continue;
            };
            to_archive.insert(tap_name.clone(), tap_data.clone());

            if let Err(err) = self
                .process_tap(&tap_data, &tap_name, batch_id, &entry.data, sessions)
                .await
            {
                tracing::error!(tap_name, error = %err, "failed to process http tap, rolling back this tap only");
            }
        }

        if let Some(last) = entries.last() {
            self.access_log.write_last_processed_position(last.end_position)?;
        }

        self.tap_spool.cleanup();
        Ok(to_archive)
    }

    async fn process_tap(
        &self,
        tap_data: &serde_json::Value,
        tap_id: &str,
        batch_id: &str,
        log_entry: &serde_json::Value,
        sessions: &mut SessionTracker,
    ) -> Result<(), IngestError> {
        let config = self.config.current();
        let empty = serde_json::Value::Null;
        let trace = tap_data.get("http_buffered_trace").unwrap_or(&empty);
        let request = trace.get("request").unwrap_or(&empty);
        let response = trace.get("response").unwrap_or(&empty);

        let request_headers = common::headers_to_pairs(request.get("headers").unwrap_or(&empty));
        let response_headers = common::headers_to_pairs(response.get("headers").unwrap_or(&empty));
        let request_trailers = common::headers_to_pairs(request.get("trailers").unwrap_or(&empty));

        let method = log_entry
            .get("method")
            .and_then(|v| v.as_str())
            .or_else(|| common::header_value(&request_headers, ":method"))
            .unwrap_or_default()
            .to_string();
        let full_path = log_entry
            .get("path")
            .and_then(|v| v.as_str())
            .or_else(|| common::header_value(&request_headers, ":path"))
            .unwrap_or_default()
            .to_string();
        let (path, query) = common::split_path_query(&full_path);

        let status: i64 = log_entry
            .get("status")
            .and_then(|v| v.as_i64())
            .or_else(|| common::header_value(&response_headers, ":status").and_then(|s| s.parse().ok()))
            .unwrap_or(-1);

        let is_blocked = common::header_value(&request_trailers, "x-blocked") == Some("1");
        let user_agent = common::header_value(&request_headers, "user-agent").map(str::to_string);

        let start_time = log_entry
            .get("start_time")
            .and_then(|v| v.as_str())
            .and_then(common::parse_iso8601_ms)
            .unwrap_or_else(common::now_ms);
        let start_minute = (start_time / 60_000) * 60_000;

        let upstream_host = log_entry.get("upstream_host").and_then(|v| v.as_str()).unwrap_or_default();
        let port = common::parse_port_from_upstream_host(upstream_host);

        let req_body = common::decode_body(request.get("body"));
        let resp_body = common::decode_body(response.get("body"));

        let tx = self.store.begin().await?;

        let request_id = Store::insert_http_request(
            &tx,
            HttpRequestInsert {
                port: port.map(i64::from).unwrap_or(0),
                start_time,
                method: Some(method.clone()).filter(|m| !m.is_empty()),
                path: Some(full_path.clone()).filter(|p| !p.is_empty()),
                user_agent,
                body: req_body.clone(),
                is_blocked,
                tap_id: Some(tap_id.to_string()),
                batch_id: Some(batch_id.to_string()),
            },
        )
        .await?;

        let response_id = Store::insert_http_response(
            &tx,
            HttpResponseInsert {
                request_id,
                status,
                body: resp_body.clone(),
            },
        )
        .await?;

        for (name, value) in &request_headers {
            Store::insert_http_header(
                &tx,
                HttpHeaderInsert {
                    name: name.clone(),
                    value: value.clone(),
                    request_id: Some(request_id),
                    response_id: None,
                },
            )
            .await?;
        }
        for (name, value) in &response_headers {
            Store::insert_http_header(
                &tx,
                HttpHeaderInsert {
                    name: name.clone(),
                    value: value.clone(),
                    request_id: None,
                    response_id: Some(response_id),
                },
            )
            .await?;
        }

        let flag_re = config.flag_regex();
        let flags_written = req_body
            .as_deref()
            .map(|b| flags::scan(b.as_bytes(), &flag_re))
            .unwrap_or_default();
        let flags_retrieved = resp_body
            .as_deref()
            .map(|b| flags::scan(b.as_bytes(), &flag_re))
            .unwrap_or_default();

        for (offset, value) in &flags_written {
            Store::insert_flag(
                &tx,
                FlagInsert {
                    value: value.clone(),
                    http_request_id: Some(request_id),
                    location: Some("body".into()),
                    offset: Some(*offset as i64),
                    ..Default::default()
                },
            )
            .await?;
        }
        for (offset, value) in &flags_retrieved {
            Store::insert_flag(
                &tx,
                FlagInsert {
                    value: value.clone(),
                    http_response_id: Some(response_id),
                    location: Some("body".into()),
                    offset: Some(*offset as i64),
                    ..Default::default()
                },
            )
            .await?;
        }

        if let Some(port) = port {
            let port_i64 = i64::from(port);
            Store::increment_service_stats(
                &tx,
                &ServiceStatsIncrement {
                    port: port_i64,
                    total_requests: 1,
                    total_blocked_requests: i64::from(is_blocked),
                    total_responses: i64::from(!is_blocked),
                    total_flags_written: flags_written.len() as i64,
                    total_flags_retrieved: flags_retrieved.len() as i64,
                    ..Default::default()
                },
            )
            .await?;

            Store::increment_http_response_code_stats(&tx, port_i64, status, 1).await?;

            let path_outcome = Store::increment_http_path_stats(&tx, port_i64, &path, 1).await?;
            if path_outcome == IncrementOutcome::New {
                Store::insert_alert(
                    &tx,
                    AlertInsert {
                        created: common::now_ms(),
                        port: port_i64,
                        description: format!("New path: '{full_path}'"),
                        http_request_id: Some(request_id),
                        http_response_id: Some(response_id),
                        ..Default::default()
                    },
                )
                .await?;
            }

            let service = config.get_service_by_port(port);

            let ignored_path = service
                .map(|s| {
                    s.ignore_path_stats.iter().any(|rule| {
                        rule.method.eq_ignore_ascii_case(&method)
                            && regex::Regex::new(&rule.path)
                                .map(|re| re.is_match(&path))
                                .unwrap_or(false)
                    })
                })
                .unwrap_or(false);
            if !ignored_path {
                Store::increment_http_path_time_stats(&tx, port_i64, &method, &path, start_minute, 1).await?;
            }

            for (name, value) in common::parse_query_params(&query) {
                let ignored = service
                    .and_then(|s| s.ignore_query_param_stats.get(&name))
                    .and_then(|pattern| regex::Regex::new(pattern).ok())
                    .map(|re| re.is_match(&value))
                    .unwrap_or(false);
                if !ignored {
                    Store::increment_http_query_param_time_stats(&tx, port_i64, &name, &value, start_minute, 1)
                        .await?;
                }
            }

            for (name, value) in &request_headers {
                if IGNORED_HEADER_STATS.contains(&name.as_str()) {
                    continue;
                }
                let ignored = service
                    .and_then(|s| s.ignore_header_stats.get(name))
                    .and_then(|pattern| regex::Regex::new(pattern).ok())
                    .map(|re| re.is_match(value))
                    .unwrap_or(false);
                if !ignored {
                    Store::increment_http_header_time_stats(&tx, port_i64, name, value, start_minute, 1).await?;
                }
            }

            Store::increment_http_request_time_stats(&tx, port_i64, start_minute, 1, i64::from(is_blocked)).await?;
            if !flags_written.is_empty() || !flags_retrieved.is_empty() {
                Store::increment_flag_time_stats(
                    &tx,
                    port_i64,
                    start_minute,
                    flags_written.len() as i64,
                    flags_retrieved.len() as i64,
                )
                .await?;
            }

            // Session correlation: each cookie value observed (incoming on
            // the request, outgoing on the response) is its own session
            // key. The `session`/`session_link` tables record which
            // requests belong to which key directly (mirroring
            // `SessionLinkTable.insert`); `SessionTracker` additionally
            // keeps the before/after-in-session ordering used for
            // cross-request correlation queries.
            if let Some(service) = service {
                let cookie_values = common::header_values(&request_headers, "cookie");
                let set_cookie_values = common::header_values(&response_headers, "set-cookie");
                let session_in =
                    crate::sessions::extract_session_cookie(&cookie_values, &service.session_cookie_names);
                let session_out =
                    crate::sessions::extract_session_cookie(&set_cookie_values, &service.session_cookie_names);

                let mut linked_keys = Vec::new();
                if let Some(key) = &session_in {
                    linked_keys.push(key.clone());
                }
                if let Some(key) = &session_out {
                    if session_in.as_ref() != Some(key) {
                        linked_keys.push(key.clone());
                    }
                }
                for key in &linked_keys {
                    let session_id = Store::upsert_session(&tx, port_i64, key).await?;
                    Store::insert_session_link(&tx, session_id, request_id).await?;
                }
                if session_in.is_some() || session_out.is_some() {
                    sessions.add_request(port, request_id, start_time, session_in, session_out);
                }
            }
        }

        tx.commit().await?;
        Ok(())
    }
}
