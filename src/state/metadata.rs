//! Shared CRUD over one metadata index.
//!
//! Cases and sources are both plain documents listed with a `_search`, created under
//! their `name`, partially updated and deleted by id. [`MetadataStore`] implements that
//! shape once; the case and source stores only add their own list queries and reload
//! policies.

use crate::client::{Transport, WriteMode};
use crate::model::{ClientError, DocId, IndexName, ResultDoc, SearchHits, SourceFields, ValidationError};
use crate::state::dispatcher::{Dispatcher, Outcome};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

/// Records of one metadata index.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    index: IndexName,
    records: Vec<ResultDoc>,
    reload_delay: Duration,
}

impl MetadataStore {
    /// Empty store over `index`, waiting `reload_delay` before reloading after a change.
    pub fn new(index: IndexName, reload_delay: Duration) -> Self {
        Self {
            index,
            records: Vec::new(),
            reload_delay,
        }
    }

    /// The metadata index.
    pub fn index(&self) -> &IndexName {
        &self.index
    }

    /// Loaded records.
    pub fn records(&self) -> &[ResultDoc] {
        &self.records
    }

    /// Replace the records with the hits of `body`. On failure the list stays empty.
    pub fn load<T: Transport>(&mut self, dispatcher: &mut Dispatcher<T>, body: &Value) -> Outcome {
        self.records.clear();
        let Some(response) = dispatcher.search(&self.index, body) else {
            return Outcome::Failed;
        };
        match SearchHits::from_response(response) {
            Ok(hits) => {
                debug!(index = %self.index, records = hits.docs.len(), "Metadata loaded");
                self.records = hits.docs;
                Outcome::Completed
            }
            Err(err) => dispatcher.report(&ClientError::from(err)),
        }
    }

    /// Index a new record under its `name` field.
    ///
    /// The caller reloads afterwards (see [`MetadataStore::wait_for_reload`]).
    pub fn create<T: Transport>(
        &mut self,
        dispatcher: &mut Dispatcher<T>,
        metadata: &SourceFields,
    ) -> Outcome {
        let Some(doc_id) = record_name(metadata) else {
            return dispatcher.reject(ValidationError::MissingName);
        };
        let body = Value::Object(metadata.clone());
        match dispatcher.write(&self.index, &doc_id, &body, WriteMode::Index) {
            Some(_) => {
                info!(index = %self.index, id = %doc_id, "Metadata record created");
                Outcome::Completed
            }
            None => Outcome::Failed,
        }
    }

    /// Save `partial` into record `idx` and merge it locally. A missing record is ignored.
    pub fn edit<T: Transport>(
        &mut self,
        dispatcher: &mut Dispatcher<T>,
        idx: usize,
        partial: SourceFields,
    ) -> Outcome {
        let Some(record) = self.records.get(idx) else {
            debug!(idx, len = self.records.len(), "No metadata record to edit");
            return Outcome::Skipped;
        };
        let doc_id = record.id().clone();
        let body = json!({ "doc": Value::Object(partial.clone()) });
        match dispatcher.write(&self.index, &doc_id, &body, WriteMode::Update) {
            Some(_) => {
                if let Some(record) = self.records.get_mut(idx) {
                    record.merge(&partial);
                }
                Outcome::Completed
            }
            None => Outcome::Failed,
        }
    }

    /// Delete the metadata of record `idx`. The data it describes is left alone.
    ///
    /// Returns the outcome and, when the delete went through, the removed record so the
    /// caller can decide what to reload.
    pub fn remove<T: Transport>(
        &mut self,
        dispatcher: &mut Dispatcher<T>,
        idx: usize,
    ) -> (Outcome, Option<ResultDoc>) {
        let Some(record) = self.records.get(idx).cloned() else {
            debug!(idx, len = self.records.len(), "No metadata record to remove");
            return (Outcome::Skipped, None);
        };
        match dispatcher.delete(&self.index, record.id()) {
            Some(_) => {
                info!(index = %self.index, id = %record.id(), "Metadata record removed");
                (Outcome::Completed, Some(record))
            }
            None => (Outcome::Failed, None),
        }
    }

    /// Give the backend time to refresh before listing again.
    pub fn wait_for_reload(&self) {
        if !self.reload_delay.is_zero() {
            std::thread::sleep(self.reload_delay);
        }
    }
}

fn record_name(metadata: &SourceFields) -> Option<DocId> {
    metadata
        .get("name")
        .and_then(Value::as_str)
        .and_then(|name| DocId::new(name).ok())
}
