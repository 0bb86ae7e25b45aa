//! JSON-over-HTTP client for the ElasticSearch backend.
//!
//! The client only sends requests and classifies failures. It never touches the message
//! bus: routing failures to notifications is the dispatcher's job
//! (see [`crate::state::Dispatcher`]).

pub mod http;

pub use http::HttpTransport;

use crate::model::{ClientError, DocId, IndexName};
use serde_json::{json, Value};
use std::fmt;
use std::rc::Rc;
use tracing::debug;

/// HTTP verb of a backend request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
}

impl Verb {
    /// Upper-case wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Verb::Get => "GET",
            Verb::Post => "POST",
            Verb::Put => "PUT",
            Verb::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully resolved request handed to a [`Transport`].
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// Verb.
    pub verb: Verb,
    /// Absolute URL.
    pub url: String,
    /// JSON body, if any.
    pub body: Option<Value>,
}

/// Raw answer from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// A response with a JSON body.
    pub fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            body: body.to_string().into_bytes(),
        }
    }

    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one request and returns the raw response.
///
/// Implementations report only transport-level failures as `Err`; any status code that
/// came back from a server is an `Ok` response.
pub trait Transport {
    /// Send `request` and wait for the answer.
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ClientError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ClientError> {
        (**self).send(request)
    }
}

impl<T: Transport + ?Sized> Transport for Rc<T> {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ClientError> {
        (**self).send(request)
    }
}

/// How a document body is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Create or replace the whole document (`PUT {index}/{doctype}/{id}`).
    Index,
    /// Partial update (`POST {index}/{doctype}/{id}/_update`).
    Update,
}

/// Client bound to one ElasticSearch server.
#[derive(Debug)]
pub struct ElasticClient<T> {
    transport: T,
    server: String,
    doctype: String,
}

impl<T: Transport> ElasticClient<T> {
    /// A client for `server` (e.g. `http://localhost:9200`).
    pub fn new(transport: T, server: impl Into<String>, doctype: impl Into<String>) -> Self {
        Self {
            transport,
            server: server.into(),
            doctype: doctype.into(),
        }
    }

    /// Base URL of the server.
    pub fn server(&self) -> &str {
        &self.server
    }

    /// Point the client at another server.
    pub fn set_server(&mut self, server: impl Into<String>) {
        self.server = server.into();
    }

    /// Document type segment used in document paths.
    pub fn doctype(&self) -> &str {
        &self.doctype
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send a request to `path` relative to the server and decode the JSON answer.
    ///
    /// An empty success body decodes to `Value::Null`.
    pub fn raw_request(
        &self,
        path: &str,
        verb: Verb,
        body: Option<&Value>,
    ) -> Result<Value, ClientError> {
        let response = self.send(path, verb, body)?;
        if response.body.is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(&response.body)?)
    }

    /// `POST {index}/_search`.
    pub fn search(&self, index: &IndexName, body: &Value) -> Result<Value, ClientError> {
        self.raw_request(&search_path(index), Verb::Post, Some(body))
    }

    /// Write a document in `mode`.
    pub fn write(
        &self,
        index: &IndexName,
        doc_id: &DocId,
        body: &Value,
        mode: WriteMode,
    ) -> Result<Value, ClientError> {
        let (path, verb) = self.write_target(index, doc_id, mode);
        self.raw_request(&path, verb, Some(body))
    }

    /// `DELETE {index}/{doctype}/{id}`.
    pub fn delete(&self, index: &IndexName, doc_id: &DocId) -> Result<Value, ClientError> {
        self.raw_request(&self.document_path(index, doc_id), Verb::Delete, None)
    }

    /// Path and verb used for a document write.
    pub fn write_target(&self, index: &IndexName, doc_id: &DocId, mode: WriteMode) -> (String, Verb) {
        match mode {
            WriteMode::Index => (self.document_path(index, doc_id), Verb::Put),
            WriteMode::Update => (
                format!("{}/_update", self.document_path(index, doc_id)),
                Verb::Post,
            ),
        }
    }

    /// `{index}/{doctype}/{id}`.
    pub fn document_path(&self, index: &IndexName, doc_id: &DocId) -> String {
        format!("{}/{}/{}", index, self.doctype, doc_id)
    }

    /// The debug description emitted before a non-silent request.
    pub fn describe(&self, path: &str, verb: Verb, body: Option<&Value>) -> Value {
        json!({
            "path": path,
            "type": verb.as_str(),
            "data": body.cloned().unwrap_or(Value::Null),
            "esserver": self.server,
        })
    }

    fn send(&self, path: &str, verb: Verb, body: Option<&Value>) -> Result<HttpResponse, ClientError> {
        let request = HttpRequest {
            verb,
            url: join_url(&self.server, path),
            body: body.cloned(),
        };
        debug!(verb = %verb, url = %request.url, "Sending backend request");

        let response = self.transport.send(&request)?;
        if response.is_success() {
            Ok(response)
        } else {
            let reason = backend_reason(&response.body);
            debug!(status = response.status, reason = %reason, "Backend request failed");
            Err(ClientError::Backend {
                status: response.status,
                reason,
            })
        }
    }
}

/// `{index}/_search`.
pub fn search_path(index: &IndexName) -> String {
    format!("{index}/_search")
}

/// Join a base URL and a relative path with exactly one slash.
pub fn join_url(server: &str, path: &str) -> String {
    format!(
        "{}/{}",
        server.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Reason string of a failed response.
///
/// ElasticSearch errors carry `error.root_cause[0].reason`; anything else is reported
/// verbatim.
pub fn backend_reason(body: &[u8]) -> String {
    match serde_json::from_slice::<Value>(body) {
        Ok(value) => value
            .pointer("/error/root_cause/0/reason")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| match value {
                Value::String(text) => text,
                other => other.to_string(),
            }),
        Err(_) => String::from_utf8_lossy(body).into_owned(),
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
