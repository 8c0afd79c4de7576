//! In-memory index mapping cookie-based session identity to requests, per
//! service port. Ported from `SessionsStorage`/`SessionRequests`.

use std::collections::HashMap;

pub type RequestId = i64;
pub type Port = u16;
pub type Timestamp = i64;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Link {
    pub from_request_id: RequestId,
    pub to_request_id: RequestId,
}

#[derive(Default)]
struct SessionRequests {
    /// Kept in `(timestamp, request_id)` order; inserts are binary-search
    /// inserts, the Rust equivalent of Python's `bisect.insort`.
    requests: Vec<(Timestamp, RequestId)>,
}

impl SessionRequests {
    fn add_request(&mut self, timestamp: Timestamp, request_id: RequestId) {
        let key = (timestamp, request_id);
        let idx = self.requests.partition_point(|&r| r < key);
        self.requests.insert(idx, key);
    }

    fn find_request_before(&self, timestamp: Timestamp) -> Option<RequestId> {
        let idx = self.requests.partition_point(|&(t, _)| t < timestamp);
        idx.checked_sub(1).map(|i| self.requests[i].1)
    }

    fn find_request_after(&self, timestamp: Timestamp) -> Option<RequestId> {
        let idx = self.requests.partition_point(|&(t, _)| t <= timestamp);
        self.requests.get(idx).map(|r| r.1)
    }
}

struct RequestInfo {
    start_time: Timestamp,
    session_in: Option<String>,
    session_out: Option<String>,
}

#[derive(Default)]
pub struct SessionTracker {
    requests: HashMap<(Port, RequestId), RequestInfo>,
    request_sessions: HashMap<(Port, String), SessionRequests>,
    response_sessions: HashMap<(Port, String), SessionRequests>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_request(
        &mut self,
        port: Port,
        request_id: RequestId,
        start_time: Timestamp,
        session_in: Option<String>,
        session_out: Option<String>,
    ) {
        if session_in.is_some() || session_out.is_some() {
            self.requests.insert(
                (port, request_id),
                RequestInfo {
                    start_time,
                    session_in: session_in.clone(),
                    session_out: session_out.clone(),
                },
            );
        }
        if let Some(session) = session_in {
            self.request_sessions
                .entry((port, session))
                .or_default()
                .add_request(start_time, request_id);
        }
        if let Some(session) = session_out {
            self.response_sessions
                .entry((port, session))
                .or_default()
                .add_request(start_time, request_id);
        }
    }

    pub fn get_links(&self, port: Port, request_id: RequestId) -> Vec<Link> {
        let mut links = Vec::new();
        let Some(info) = self.requests.get(&(port, request_id)) else {
            return links;
        };

        if let Some(session) = &info.session_in {
            if let Some(session_requests) = self.request_sessions.get(&(port, session.clone())) {
                if let Some(earlier) = session_requests.find_request_before(info.start_time) {
                    links.push(Link {
                        from_request_id: earlier,
                        to_request_id: request_id,
                    });
                }
            }
        }

        if let Some(session) = &info.session_out {
            if let Some(session_requests) = self.response_sessions.get(&(port, session.clone())) {
                if let Some(later) = session_requests.find_request_after(info.start_time) {
                    links.push(Link {
                        from_request_id: request_id,
                        to_request_id: later,
                    });
                }
            }
        }

        links
    }
}

/// Parses `Cookie`/`Set-Cookie` header values (name=value pairs only, not
/// full RFC 6265 attribute parsing — mirrors how the original only reads
/// `SimpleCookie`'s name/value mapping) and returns the value of the first
/// name found in `cookie_names`, scanning in `cookie_names` order within
/// each header value, then across header values in order.
pub fn extract_session_cookie(header_values: &[&str], cookie_names: &[String]) -> Option<String> {
    for header_value in header_values {
        let pairs = parse_cookie_pairs(header_value);
        for name in cookie_names {
            if let Some((_, value)) = pairs.iter().find(|(k, _)| k == name) {
                return Some(value.clone());
            }
        }
    }
    None
}

fn parse_cookie_pairs(header_value: &str) -> Vec<(String, String)> {
    header_value
        .split(';')
        .filter_map(|part| {
            let part = part.trim();
            let (name, value) = part.split_once('=')?;
            Some((name.trim().to_string(), value.trim().trim_matches('"').to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_earlier_request_via_session_in() {
        let mut tracker = SessionTracker::new();
        tracker.add_request(80, 1, 100, Some("s1".into()), None);
        tracker.add_request(80, 2, 200, Some("s1".into()), None);

        let links = tracker.get_links(80, 2);
        assert_eq!(
            links,
            vec![Link {
                from_request_id: 1,
                to_request_id: 2
            }]
        );
        assert!(tracker.get_links(80, 1).is_empty());
    }

    #[test]
    fn links_later_request_via_session_out() {
        let mut tracker = SessionTracker::new();
        tracker.add_request(80, 1, 100, None, Some("s1".into()));
        tracker.add_request(80, 2, 200, None, Some("s1".into()));

        let links = tracker.get_links(80, 1);
        assert_eq!(
            links,
            vec![Link {
                from_request_id: 1,
                to_request_id: 2
            }]
        );
    }

    #[test]
    fn different_ports_do_not_share_sessions() {
        let mut tracker = SessionTracker::new();
        tracker.add_request(80, 1, 100, Some("s1".into()), None);
        tracker.add_request(81, 2, 200, Some("s1".into()), None);
        assert!(tracker.get_links(81, 2).is_empty());
    }

    #[test]
    fn cookie_extraction_picks_first_matching_name() {
        let cookie_names = vec!["sid".to_string(), "session".to_string()];
        let value = extract_session_cookie(&["foo=bar; session=abc123"], &cookie_names);
        assert_eq!(value, Some("abc123".to_string()));
    }

    #[test]
    fn cookie_extraction_returns_none_when_absent() {
        let cookie_names = vec!["sid".to_string()];
        assert_eq!(extract_session_cookie(&["foo=bar"], &cookie_names), None);
    }
}
