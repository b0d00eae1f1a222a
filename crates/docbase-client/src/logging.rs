//! Pluggable query logging.
//!
//! The connector brackets every request/response cycle with exactly one
//! `start_query` / `stop_query` pair, including failure paths. Loggers are
//! shared collaborators; the connector never reads entries back.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde_json::Value;

/// Opaque handle pairing a `stop_query` with its `start_query`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryToken(u64);

pub trait QueryLogger: Send + Sync {
    fn start_query(
        &self,
        description: &str,
        params: Option<&Value>,
        payload: Option<&Value>,
    ) -> QueryToken;

    fn stop_query(&self, token: QueryToken);
}

/// One recorded request/response cycle.
#[derive(Debug, Clone)]
pub struct QueryLogEntry {
    pub description: String,
    pub params: Option<Value>,
    pub payload: Option<Value>,
    pub started_at: DateTime<Utc>,
    /// `None` while the query is still open.
    pub duration_ms: Option<f64>,
}

#[derive(Default)]
struct QueryLogState {
    entries: Vec<QueryLogEntry>,
    open: HashMap<QueryToken, (usize, Instant)>,
    next_token: u64,
}

/// Records executed queries with durations into an append-only list.
pub struct QueryLog {
    enabled: AtomicBool,
    state: Mutex<QueryLogState>,
}

impl Default for QueryLog {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryLog {
    pub fn new() -> Self {
        Self {
            enabled: AtomicBool::new(true),
            state: Mutex::new(QueryLogState::default()),
        }
    }

    /// A disabled log ignores start/stop calls entirely.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    /// Snapshot of everything recorded so far.
    pub fn queries(&self) -> Vec<QueryLogEntry> {
        self.state.lock().unwrap().entries.clone()
    }
}

impl QueryLogger for QueryLog {
    fn start_query(
        &self,
        description: &str,
        params: Option<&Value>,
        payload: Option<&Value>,
    ) -> QueryToken {
        if !self.enabled.load(Ordering::Relaxed) {
            return QueryToken(0);
        }
        let mut state = self.state.lock().unwrap();
        state.next_token += 1;
        let token = QueryToken(state.next_token);
        let index = state.entries.len();
        state.entries.push(QueryLogEntry {
            description: description.to_string(),
            params: params.cloned(),
            payload: payload.cloned(),
            started_at: Utc::now(),
            duration_ms: None,
        });
        state.open.insert(token, (index, Instant::now()));
        token
    }

    fn stop_query(&self, token: QueryToken) {
        if !self.enabled.load(Ordering::Relaxed) {
            return;
        }
        let mut state = self.state.lock().unwrap();
        if let Some((index, begun)) = state.open.remove(&token) {
            let elapsed = begun.elapsed().as_secs_f64() * 1000.0;
            if let Some(entry) = state.entries.get_mut(index) {
                entry.duration_ms = Some(elapsed);
            }
        }
    }
}

/// Prints query start/stop lines to stderr. Handy during development.
#[derive(Default)]
pub struct ConsoleLogger {
    next_token: AtomicU64,
    open: Mutex<HashMap<QueryToken, (String, Instant)>>,
}

impl ConsoleLogger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl QueryLogger for ConsoleLogger {
    fn start_query(
        &self,
        description: &str,
        params: Option<&Value>,
        _payload: Option<&Value>,
    ) -> QueryToken {
        let token = QueryToken(self.next_token.fetch_add(1, Ordering::Relaxed) + 1);
        match params {
            Some(params) => eprintln!("docbase query: {description} {params}"),
            None => eprintln!("docbase query: {description}"),
        }
        self.open
            .lock()
            .unwrap()
            .insert(token, (description.to_string(), Instant::now()));
        token
    }

    fn stop_query(&self, token: QueryToken) {
        if let Some((description, begun)) = self.open.lock().unwrap().remove(&token) {
            let elapsed = begun.elapsed().as_secs_f64() * 1000.0;
            eprintln!("docbase query done: {description} ({elapsed:.1} ms)");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn log_records_one_entry_per_cycle() {
        let log = QueryLog::new();
        let token = log.start_query("POST Person.json/search", Some(&json!({"limit": "1"})), None);
        log.stop_query(token);

        let queries = log.queries();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].description, "POST Person.json/search");
        assert_eq!(queries[0].params, Some(json!({"limit": "1"})));
        assert!(queries[0].duration_ms.is_some());
    }

    #[test]
    fn open_queries_have_no_duration_yet() {
        let log = QueryLog::new();
        let _token = log.start_query("GET Person.json/crud/", None, None);
        assert_eq!(log.queries()[0].duration_ms, None);
    }

    #[test]
    fn disabled_log_records_nothing() {
        let log = QueryLog::new();
        log.set_enabled(false);
        let token = log.start_query("GET Person.json/crud/", None, None);
        log.stop_query(token);
        assert!(log.queries().is_empty());
    }

    #[test]
    fn interleaved_queries_close_independently() {
        let log = QueryLog::new();
        let first = log.start_query("first", None, None);
        let second = log.start_query("second", None, None);
        log.stop_query(second);

        let queries = log.queries();
        assert!(queries[0].duration_ms.is_none());
        assert!(queries[1].duration_ms.is_some());

        log.stop_query(first);
        assert!(log.queries()[0].duration_ms.is_some());
    }
}
