//! Case metadata.

use crate::client::Transport;
use crate::model::{IndexName, ResultDoc, SourceFields};
use crate::state::dispatcher::{Dispatcher, Outcome};
use crate::state::metadata::MetadataStore;
use serde_json::{json, Value};
use std::time::Duration;

/// Cases registered in the cases index.
#[derive(Debug, Clone)]
pub struct CaseStore {
    store: MetadataStore,
    max_cases: usize,
}

impl CaseStore {
    /// Store over `index`, listing at most `max_cases` cases.
    pub fn new(index: IndexName, max_cases: usize, reload_delay: Duration) -> Self {
        Self {
            store: MetadataStore::new(index, reload_delay),
            max_cases,
        }
    }

    /// Loaded cases.
    pub fn cases(&self) -> &[ResultDoc] {
        self.store.records()
    }

    /// List every case, up to the configured maximum.
    pub fn load_cases<T: Transport>(&mut self, dispatcher: &mut Dispatcher<T>) -> Outcome {
        let body = list_body(self.max_cases);
        self.store.load(dispatcher, &body)
    }

    /// Register a case. It needs a `name`, used as its id.
    pub fn new_case<T: Transport>(
        &mut self,
        dispatcher: &mut Dispatcher<T>,
        metadata: &SourceFields,
    ) -> Outcome {
        let outcome = self.store.create(dispatcher, metadata);
        if outcome.is_completed() {
            self.reload(dispatcher);
        }
        outcome
    }

    /// Partially update case `idx`.
    pub fn edit_case<T: Transport>(
        &mut self,
        dispatcher: &mut Dispatcher<T>,
        idx: usize,
        partial: SourceFields,
    ) -> Outcome {
        self.store.edit(dispatcher, idx, partial)
    }

    /// Delete the metadata of case `idx`. Its sources and files are kept.
    pub fn remove_case<T: Transport>(&mut self, dispatcher: &mut Dispatcher<T>, idx: usize) -> Outcome {
        let (outcome, _) = self.store.remove(dispatcher, idx);
        if outcome.is_completed() {
            self.reload(dispatcher);
        }
        outcome
    }

    fn reload<T: Transport>(&mut self, dispatcher: &mut Dispatcher<T>) {
        self.store.wait_for_reload();
        self.load_cases(dispatcher);
    }
}

fn list_body(size: usize) -> Value {
    json!({
        "size": size,
        "query": { "match_all": {} }
    })
}
