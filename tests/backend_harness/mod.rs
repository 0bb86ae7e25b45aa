//! Scripted ElasticSearch backend for acceptance tests.
//!
//! Answers requests from a queue and records them, so a test can drive the stores the
//! way the CLI does and then check both the resulting state and the wire traffic.

#![allow(dead_code)]

use rvt2_analyzer::client::{ElasticClient, HttpRequest, HttpResponse, Transport};
use rvt2_analyzer::model::ClientError;
use rvt2_analyzer::state::{Dispatcher, MessageBus};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::VecDeque;

pub const SERVER: &str = "http://es.test:9200";

#[derive(Default)]
pub struct ScriptedBackend {
    replies: RefCell<VecDeque<Result<HttpResponse, ClientError>>>,
    requests: RefCell<Vec<HttpRequest>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ok(&self, body: Value) {
        self.replies
            .borrow_mut()
            .push_back(Ok(HttpResponse::json(200, &body)));
    }

    pub fn status(&self, status: u16, body: Value) {
        self.replies
            .borrow_mut()
            .push_back(Ok(HttpResponse::json(status, &body)));
    }

    pub fn down(&self) {
        self.replies.borrow_mut().push_back(Err(ClientError::Transport {
            reason: "connection refused".to_string(),
        }));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }

    pub fn pending(&self) -> usize {
        self.replies.borrow().len()
    }
}

impl Transport for ScriptedBackend {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ClientError> {
        self.requests.borrow_mut().push(request.clone());
        self.replies.borrow_mut().pop_front().unwrap_or_else(|| {
            Err(ClientError::Transport {
                reason: format!("unscripted request to {}", request.url),
            })
        })
    }
}

/// A dispatcher over `backend` with debug notifications on.
pub fn dispatcher(backend: &ScriptedBackend) -> Dispatcher<&ScriptedBackend> {
    Dispatcher::new(
        ElasticClient::new(backend, SERVER, "_doc"),
        MessageBus::new(100),
        true,
    )
}

/// A `_search` answer in the ES 7 format.
pub fn hits(total: u64, docs: &[(&str, Value)]) -> Value {
    let hits: Vec<Value> = docs
        .iter()
        .map(|(id, source)| json!({"_id": id, "_score": 1.0, "_source": source}))
        .collect();
    json!({"hits": {"total": {"value": total, "relation": "eq"}, "hits": hits}})
}

/// A `_search` answer in the ES 6 format.
pub fn legacy_hits(total: u64, docs: &[(&str, Value)]) -> Value {
    let mut value = hits(total, docs);
    value["hits"]["total"] = json!(total);
    value
}
