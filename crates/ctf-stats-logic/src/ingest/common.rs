//! Shared tap/log-entry parsing helpers used by both the HTTP and TCP
//! ingest paths.

use base64::Engine;

/// Decodes a `{"as_bytes": "<base64>"}` body object, lossily as UTF-8.
pub fn decode_body(body: Option<&serde_json::Value>) -> Option<String> {
    let as_bytes = body?.get("as_bytes")?.as_str()?;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(as_bytes)
        .ok()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn decode_bytes(data: &serde_json::Value) -> Vec<u8> {
    data.get("as_bytes")
        .and_then(|v| v.as_str())
        .and_then(|s| base64::engine::general_purpose::STANDARD.decode(s).ok())
        .unwrap_or_default()
}

/// Flattens a tap's `[{"key": ..., "value": ...}, ...]` header array into
/// lowercase-keyed pairs, preserving duplicates (a header name may repeat).
pub fn headers_to_pairs(headers: &serde_json::Value) -> Vec<(String, String)> {
    headers
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|h| {
                    let key = h.get("key")?.as_str()?.to_lowercase();
                    let value = h.get("value")?.as_str()?.to_string();
                    Some((key, value))
                })
                .collect()
        })
        .unwrap_or_default()
}

pub fn header_value<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
}

pub fn header_values<'a>(headers: &'a [(String, String)], name: &str) -> Vec<&'a str> {
    headers
        .iter()
        .filter(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
        .collect()
}

/// Parses the port out of an `upstream_host` string by taking everything
/// after the last `:`. Mirrors `utils.py::try_get_port_from_upstream_host`.
pub fn parse_port_from_upstream_host(upstream_host: &str) -> Option<u16> {
    let idx = upstream_host.rfind(':')?;
    upstream_host[idx + 1..].parse().ok()
}

pub fn split_path_query(full_path: &str) -> (String, String) {
    match full_path.split_once('?') {
        Some((p, q)) => (p.to_string(), q.to_string()),
        None => (full_path.to_string(), String::new()),
    }
}

pub fn parse_query_params(query: &str) -> Vec<(String, String)> {
    if query.is_empty() {
        return Vec::new();
    }
    query
        .split('&')
        .filter(|s| !s.is_empty())
        .map(|pair| {
            let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
            (percent_decode(k), percent_decode(v))
        })
        .collect()
}

fn percent_decode(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b'%' if i + 2 < bytes.len() => {
                let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).ok();
                match hex.and_then(|h| u8::from_str_radix(h, 16).ok()) {
                    Some(byte) => {
                        out.push(byte);
                        i += 3;
                    }
                    None => {
                        out.push(bytes[i]);
                        i += 1;
                    }
                }
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Parses an RFC3339 timestamp (the access log's `start_time`/event
/// `timestamp` format) into epoch milliseconds.
pub fn parse_iso8601_ms(s: &str) -> Option<i64> {
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.timestamp_millis())
}

pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_port_from_upstream_host() {
        assert_eq!(parse_port_from_upstream_host("10.0.0.1:8080"), Some(8080));
        assert_eq!(parse_port_from_upstream_host("no-colon"), None);
    }

    #[test]
    fn splits_path_and_query() {
        assert_eq!(
            split_path_query("/foo?a=1&b=2"),
            ("/foo".to_string(), "a=1&b=2".to_string())
        );
        assert_eq!(split_path_query("/foo"), ("/foo".to_string(), String::new()));
    }

    #[test]
    fn decodes_percent_and_plus_in_query_params() {
        let params = parse_query_params("name=a+b&tag=%2Fx%2Fy");
        assert_eq!(params[0], ("name".to_string(), "a b".to_string()));
        assert_eq!(params[1], ("tag".to_string(), "/x/y".to_string()));
    }
}
