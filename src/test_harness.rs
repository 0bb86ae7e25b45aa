//! Shared helpers for unit tests.
//!
//! [`RecordingTransport`] replays queued responses and records every request so tests can
//! assert both on state changes and on what went over the wire.

use crate::client::{HttpRequest, HttpResponse, Transport};
use crate::model::{ClientError, SourceFields};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::VecDeque;

/// Transport double: answers from a queue, records requests.
///
/// When the queue is empty every request fails with a transport error.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    replies: RefCell<VecDeque<Result<HttpResponse, ClientError>>>,
    requests: RefCell<Vec<HttpRequest>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a 200 response with `body`.
    pub fn reply_ok(&self, body: Value) -> &Self {
        self.reply(Ok(HttpResponse::json(200, &body)))
    }

    /// Queue an error status with `body`.
    pub fn reply_status(&self, status: u16, body: Value) -> &Self {
        self.reply(Ok(HttpResponse::json(status, &body)))
    }

    /// Queue a transport failure.
    pub fn reply_unreachable(&self) -> &Self {
        self.reply(Err(ClientError::Transport {
            reason: "connection refused".to_string(),
        }))
    }

    pub fn reply(&self, reply: Result<HttpResponse, ClientError>) -> &Self {
        self.replies.borrow_mut().push_back(reply);
        self
    }

    /// Every request sent so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests.borrow().last().cloned()
    }
}

impl Transport for RecordingTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ClientError> {
        self.requests.borrow_mut().push(request.clone());
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| {
                Err(ClientError::Transport {
                    reason: "no reply queued".to_string(),
                })
            })
    }
}

/// A `_search` response with `total` hits and the given `(id, source)` documents.
pub fn search_response(total: u64, docs: &[(&str, Value)]) -> Value {
    let hits: Vec<Value> = docs
        .iter()
        .map(|(id, source)| serde_json::json!({"_id": id, "_score": 1.0, "_source": source}))
        .collect();
    serde_json::json!({
        "took": 3,
        "hits": {"total": {"value": total, "relation": "eq"}, "hits": hits}
    })
}

/// An ElasticSearch error body with a root cause.
pub fn es_error(reason: &str) -> Value {
    serde_json::json!({
        "error": {"root_cause": [{"type": "index_not_found_exception", "reason": reason}]},
        "status": 404
    })
}

/// Unwrap a JSON object literal.
pub fn fields(value: Value) -> SourceFields {
    match value {
        Value::Object(map) => map,
        other => panic!("expected JSON object, got {other}"),
    }
}
