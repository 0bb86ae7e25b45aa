//! The single composition point between the backend client and the message bus.
//!
//! Stores never look at [`ClientError`]s themselves: every request goes through a
//! [`Dispatcher`], which emits a debug notification before non-silent requests and turns
//! failures into error notifications. Store operations therefore never fail; they report
//! an [`Outcome`] and leave the details on the bus.

use crate::client::{search_path, ElasticClient, Transport, Verb, WriteMode};
use crate::model::{ClientError, DocId, IndexName, NotificationKind, ValidationError};
use crate::state::messages::MessageBus;
use serde_json::Value;
use tracing::{debug, warn};

/// What a store operation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The request succeeded and state was updated.
    Completed,
    /// The request failed; an error notification was appended.
    Failed,
    /// Local validation failed; an error notification was appended and nothing was sent.
    Rejected,
    /// The operation was a polite no-op (e.g. an out-of-range page); nothing changed.
    Skipped,
}

impl Outcome {
    /// True for [`Outcome::Completed`].
    pub fn is_completed(self) -> bool {
        self == Outcome::Completed
    }
}

/// Backend client plus the notification sink it reports into.
#[derive(Debug)]
pub struct Dispatcher<T> {
    client: ElasticClient<T>,
    messages: MessageBus,
    /// Emit a debug notification before every non-silent request.
    debug_requests: bool,
}

impl<T: Transport> Dispatcher<T> {
    /// Wire `client` to `messages`.
    pub fn new(client: ElasticClient<T>, messages: MessageBus, debug_requests: bool) -> Self {
        Self {
            client,
            messages,
            debug_requests,
        }
    }

    /// The wrapped client.
    pub fn client(&self) -> &ElasticClient<T> {
        &self.client
    }

    /// Point every following request at another server.
    pub fn set_server(&mut self, server: impl Into<String>) {
        self.client.set_server(server);
    }

    /// The message bus.
    pub fn messages(&self) -> &MessageBus {
        &self.messages
    }

    /// The message bus, mutably (to pop or clear messages).
    pub fn messages_mut(&mut self) -> &mut MessageBus {
        &mut self.messages
    }

    /// Append a notification.
    pub fn notify(&mut self, kind: NotificationKind, text: impl Into<String>) {
        self.messages.append(kind, text);
    }

    /// Report a local validation failure.
    pub fn reject(&mut self, error: ValidationError) -> Outcome {
        warn!(error = %error, "Operation rejected");
        self.messages.append(NotificationKind::Error, error.to_string());
        Outcome::Rejected
    }

    /// Report a backend failure.
    pub fn report(&mut self, error: &ClientError) -> Outcome {
        warn!(error = ?error, "Backend request failed");
        self.messages.append(NotificationKind::Error, error.reason());
        Outcome::Failed
    }

    /// Send a request, emitting the debug notification first and reporting failures.
    ///
    /// Returns `None` when the request failed; the reason is already on the bus.
    pub fn request(&mut self, path: &str, verb: Verb, body: Option<&Value>) -> Option<Value> {
        if self.debug_requests {
            let description = self.client.describe(path, verb, body);
            self.messages
                .append(NotificationKind::Debug, description.to_string());
        }
        match self.client.raw_request(path, verb, body) {
            Ok(value) => Some(value),
            Err(error) => {
                self.report(&error);
                None
            }
        }
    }

    /// Send a request without debug notification and without reporting failures.
    ///
    /// Used for best-effort writes whose failures the analyst never sees.
    pub fn request_silent(
        &self,
        path: &str,
        verb: Verb,
        body: Option<&Value>,
    ) -> Result<Value, ClientError> {
        debug!(path, verb = %verb, "Silent backend request");
        self.client.raw_request(path, verb, body)
    }

    /// `POST {index}/_search`.
    pub fn search(&mut self, index: &IndexName, body: &Value) -> Option<Value> {
        self.request(&search_path(index), Verb::Post, Some(body))
    }

    /// Write a document.
    pub fn write(
        &mut self,
        index: &IndexName,
        doc_id: &DocId,
        body: &Value,
        mode: WriteMode,
    ) -> Option<Value> {
        let (path, verb) = self.client.write_target(index, doc_id, mode);
        self.request(&path, verb, Some(body))
    }

    /// Delete a document.
    pub fn delete(&mut self, index: &IndexName, doc_id: &DocId) -> Option<Value> {
        let path = self.client.document_path(index, doc_id);
        self.request(&path, Verb::Delete, None)
    }
}
