//! Correlates the TCP access log with buffered `socket_buffered_trace` tap
//! files and writes the resulting rows. Ported from `tcp.py`.

use std::{collections::HashMap, path::PathBuf, sync::Arc};

use crate::{
    access_log::AccessLogTail,
    config::Config,
    error::IngestError,
    flags,
    ingest::common,
    store::{
        FlagInsert, ServiceStatsIncrement, Store, TcpConnectionInsert, TcpEventInsert,
    },
    tap_spool::TapSpool,
};

fn extract_trace_id(data: &serde_json::Value) -> Option<i64> {
    let trace_id = data.get("socket_buffered_trace")?.get("trace_id")?.as_str()?;
    if !trace_id.is_empty() && trace_id.chars().all(|c| c.is_ascii_digit()) {
        trace_id.parse().ok()
    } else {
        None
    }
}

#[derive(Clone, Copy, Eq, PartialEq)]
enum FlagLocation {
    Read,
    Write,
}

impl FlagLocation {
    fn as_str(self) -> &'static str {
        match self {
            FlagLocation::Read => "read",
            FlagLocation::Write => "write",
        }
    }
}

pub struct TcpIngest {
    access_log: AccessLogTail,
    tap_spool: TapSpool<i64, fn(&serde_json::Value) -> Option<i64>>,
    store: Arc<Store>,
    config: Arc<Config>,
}

impl TcpIngest {
    pub fn new(
        access_log_path: impl Into<PathBuf>,
        taps_dir: impl Into<PathBuf>,
        store: Arc<Store>,
        config: Arc<Config>,
    ) -> Self {
        Self {
            access_log: AccessLogTail::new(access_log_path),
            tap_spool: TapSpool::new(taps_dir, extract_trace_id as fn(&serde_json::Value) -> Option<i64>),
            store,
            config,
        }
    }

    pub async fn process_new_access_log_entries(
        &mut self,
        batch_id: &str,
    ) -> Result<HashMap<String, serde_json::Value>, IngestError> {
        let entries = self.access_log.read_new_entries(1000)?;
        self.tap_spool.refresh()?;

        let mut to_archive = HashMap::new();

        for entry in &entries {
            let Some(connection_id) = entry.data.get("connection_id").and_then(|v| v.as_i64()) else {
                tracing::warn!("access log entry missing connection_id");
                continue;
            };
            let Some(tap_name) = self.tap_spool.pop_by_key(&connection_id) else {
                tracing::warn!(connection_id, "no tap file matched tcp access log entry");
                continue;
            };
            let Some(tap_data) = self.tap_spool.pop_filename(&tap_name) else {
                tracing::warn!(tap_name, "tap data not cached for matched file name");
                continue;
            };
            to_archive.insert(tap_name.clone(), tap_data.clone());

            if let Err(err) = self.process_tap(&tap_data, &tap_name, batch_id, &entry.data).await {
                tracing::error!(tap_name, error = %err, "failed to process tcp tap, rolling back this tap only");
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
    ) -> Result<(), IngestError> {
        let config = self.config.current();
        let empty = serde_json::Value::Null;
        let events = tap_data
            .get("socket_buffered_trace")
            .and_then(|t| t.get("events"))
            .and_then(|e| e.as_array())
            .cloned()
            .unwrap_or_default();

        let upstream_host = log_entry.get("upstream_host").and_then(|v| v.as_str()).unwrap_or_default();
        let port = common::parse_port_from_upstream_host(upstream_host);

        let start_time = log_entry
            .get("start_time")
            .and_then(|v| v.as_str())
            .and_then(common::parse_iso8601_ms)
            .unwrap_or_else(common::now_ms);
        let start_minute = (start_time / 60_000) * 60_000;

        let connection_id_from_log = log_entry.get("connection_id").and_then(|v| v.as_i64()).unwrap_or(0);
        let bytes_in = log_entry.get("bytes_in").and_then(|v| v.as_i64()).unwrap_or(0);
        let bytes_out = log_entry.get("bytes_out").and_then(|v| v.as_i64()).unwrap_or(0);
        let duration_ms = log_entry.get("duration_ms").and_then(|v| v.as_i64()).unwrap_or(0);
        let is_blocked = log_entry.get("interceptor_message").and_then(|v| v.as_str()) == Some("blocked");

        let flag_re = config.flag_regex();
        let mut total_read_bytes: i64 = 0;
        let mut total_write_bytes: i64 = 0;
        let mut flags_found: Vec<(FlagLocation, i64, String)> = Vec::new();

        for event in &events {
            if let Some(read) = event.get("read") {
                let data_bytes = common::decode_bytes(read.get("data").unwrap_or(&empty));
                let before = total_read_bytes;
                total_read_bytes += data_bytes.len() as i64;
                for (offset, value) in flags::scan(&data_bytes, &flag_re) {
                    flags_found.push((FlagLocation::Read, before + offset as i64, value));
                }
            } else if let Some(write) = event.get("write") {
                let data_bytes = common::decode_bytes(write.get("data").unwrap_or(&empty));
                let before = total_write_bytes;
                total_write_bytes += data_bytes.len() as i64;
                for (offset, value) in flags::scan(&data_bytes, &flag_re) {
                    flags_found.push((FlagLocation::Write, before + offset as i64, value));
                }
            }
        }

        let tx = self.store.begin().await?;

        let tcp_connection_id = Store::insert_tcp_connection(
            &tx,
            TcpConnectionInsert {
                port: port.map(i64::from).unwrap_or(0),
                connection_id: connection_id_from_log,
                start_time,
                duration_ms,
                bytes_in,
                bytes_out,
                is_blocked,
                tap_id: Some(tap_id.to_string()),
                batch_id: Some(batch_id.to_string()),
            },
        )
        .await?;

        for event in &events {
            let timestamp = event
                .get("timestamp")
                .and_then(|v| v.as_str())
                .and_then(common::parse_iso8601_ms)
                .unwrap_or(start_time);

            if let Some(read) = event.get("read") {
                let data = read.get("data").unwrap_or(&empty);
                let data_bytes = common::decode_bytes(data);
                let truncated = data.get("truncated").and_then(|v| v.as_bool()).unwrap_or(false);
                Store::insert_tcp_event(
                    &tx,
                    TcpEventInsert {
                        connection_id: tcp_connection_id,
                        timestamp,
                        event_type: "read".to_string(),
                        data_size: data_bytes.len() as i64,
                        data: data_bytes,
                        end_stream: false,
                        truncated,
                    },
                )
                .await?;
            } else if let Some(write) = event.get("write") {
                let data = write.get("data").unwrap_or(&empty);
                let data_bytes = common::decode_bytes(data);
                let truncated = data.get("truncated").and_then(|v| v.as_bool()).unwrap_or(false);
                let end_stream = write.get("end_stream").and_then(|v| v.as_bool()).unwrap_or(false);
                Store::insert_tcp_event(
                    &tx,
                    TcpEventInsert {
                        connection_id: tcp_connection_id,
                        timestamp,
                        event_type: "write".to_string(),
                        data_size: data_bytes.len() as i64,
                        data: data_bytes,
                        end_stream,
                        truncated,
                    },
                )
                .await?;
            } else if event.get("closed").is_some() {
                Store::insert_tcp_event(
                    &tx,
                    TcpEventInsert {
                        connection_id: tcp_connection_id,
                        timestamp,
                        event_type: "closed".to_string(),
                        data: Vec::new(),
                        data_size: 0,
                        end_stream: true,
                        truncated: false,
                    },
                )
                .await?;
            }
        }

        for (location, offset, value) in &flags_found {
            Store::insert_flag(
                &tx,
                FlagInsert {
                    value: value.clone(),
                    tcp_connection_id: Some(tcp_connection_id),
                    location: Some(location.as_str().to_string()),
                    offset: Some(*offset),
                    ..Default::default()
                },
            )
            .await?;
        }

        if let Some(port) = port {
            let port_i64 = i64::from(port);
            let flags_written = flags_found.iter().filter(|(l, _, _)| *l == FlagLocation::Write).count() as i64;
            let flags_retrieved = flags_found.iter().filter(|(l, _, _)| *l == FlagLocation::Read).count() as i64;

            Store::increment_service_stats(
                &tx,
                &ServiceStatsIncrement {
                    port: port_i64,
                    total_tcp_connections: 1,
                    total_tcp_bytes_in: bytes_in,
                    total_tcp_bytes_out: bytes_out,
                    total_flags_written: flags_written,
                    total_flags_retrieved: flags_retrieved,
                    ..Default::default()
                },
            )
            .await?;

            if !flags_found.is_empty() {
                Store::increment_flag_time_stats(&tx, port_i64, start_minute, flags_written, flags_retrieved)
                    .await?;
            }

            let precision = config
                .get_service_by_port(port)
                .map(|s| s.tcp_connection_stats_precision)
                .unwrap_or(100)
                .max(1);
            let read_min = (total_read_bytes / precision) * precision;
            let read_max = read_min + precision;
            let write_min = (total_write_bytes / precision) * precision;
            let write_max = write_min + precision;

            Store::increment_tcp_connection_stats(&tx, port_i64, read_min, read_max, write_min, write_max, 1).await?;
            Store::increment_tcp_connection_time_stats(
                &tx,
                port_i64,
                read_min,
                read_max,
                write_min,
                write_max,
                start_minute,
                1,
            )
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
