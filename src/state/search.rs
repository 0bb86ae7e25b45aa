//! Search state store.
//!
//! Holds the last submitted query, the current page and the running flag for the
//! selected source index, and implements the search operations on top of a
//! [`Dispatcher`]:
//!
//! - run / re-run a query at an offset (pagination)
//! - bulk-tag every document matching a query
//! - partially edit one displayed result
//! - switch index (full reset)
//!
//! Invariant: `running` is true only between dispatch and response, and `results` is
//! emptied every time `running` becomes true or the index changes.

use crate::client::{Transport, Verb, WriteMode};
use crate::model::{
    ClientError, IndexName, NotificationKind, ResultDoc, SearchHits, SearchQuery, Sort, SourceFields,
    ValidationError,
};
use crate::query::{self, QueryParams};
use crate::state::dispatcher::{Dispatcher, Outcome};
use crate::state::root::RootState;
use serde_json::{json, Value};
use tracing::{debug, info};

/// Painless script appending `params.new_tag` to `tags` unless already present.
pub const TAG_UNION_SCRIPT: &str = "if (ctx._source.containsKey(\"tags\")) { \
if (!ctx._source[\"tags\"].contains(params.new_tag)) { ctx._source.tags.add(params.new_tag); } \
} else { ctx._source.tags = [params.new_tag] }";

// ===== SearchSettings =====

/// Fixed parameters of a search store, taken from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchSettings {
    /// Documents per page.
    pub page_size: usize,
    /// Index receiving the audit log of queries.
    pub queries_index: IndexName,
}

// ===== SearchState =====

/// Search state for one source index.
#[derive(Debug, Clone)]
pub struct SearchState {
    settings: SearchSettings,
    index: Option<IndexName>,
    last_query: Option<SearchQuery>,
    offset: usize,
    sort: Sort,
    total_hits: u64,
    results: Vec<ResultDoc>,
    running: bool,
}

impl SearchState {
    /// Initial state: no index, no query, first page, relevance sort.
    pub fn new(settings: SearchSettings) -> Self {
        Self {
            settings,
            index: None,
            last_query: None,
            offset: 0,
            sort: Sort::default(),
            total_hits: 0,
            results: Vec::new(),
            running: false,
        }
    }

    /// Selected source index.
    pub fn index(&self) -> Option<&IndexName> {
        self.index.as_ref()
    }

    /// The query that produced the current page.
    pub fn last_query(&self) -> Option<&SearchQuery> {
        self.last_query.as_ref()
    }

    /// Position of the first result of the current page.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Documents per page.
    pub fn page_size(&self) -> usize {
        self.settings.page_size
    }

    /// Sort used by the next query.
    pub fn sort(&self) -> &Sort {
        &self.sort
    }

    /// Total matches of the last successful query.
    pub fn total_hits(&self) -> u64 {
        self.total_hits
    }

    /// The current page, read-only.
    pub fn results(&self) -> &[ResultDoc] {
        &self.results
    }

    /// True while a query is in flight.
    pub fn running(&self) -> bool {
        self.running
    }

    /// Select another index. Everything else returns to its initial value.
    pub fn set_index(&mut self, index: IndexName) {
        info!(index = %index, "Switching search index");
        self.reset();
        self.index = Some(index);
    }

    /// Return to the initial state, deselecting the index.
    pub fn clean(&mut self) {
        self.reset();
        self.index = None;
    }

    /// Sort order for following queries.
    pub fn set_sort(&mut self, sort: Sort) {
        self.sort = sort;
    }

    fn reset(&mut self) {
        self.last_query = None;
        self.offset = 0;
        self.sort = Sort::default();
        self.total_hits = 0;
        self.results.clear();
        self.running = false;
    }

    fn set_running(&mut self, running: bool) {
        self.running = running;
        if running {
            self.results.clear();
        }
    }

    fn params(&self) -> QueryParams {
        QueryParams {
            page_size: self.settings.page_size,
            offset: self.offset,
            sort: self.sort.clone(),
        }
    }

    /// Run `query`, or the last query when `None`, starting at `new_offset`.
    ///
    /// A negative offset, an offset past the last known total, or a re-run without a
    /// previous query is a no-op ([`Outcome::Skipped`]): nothing is sent and no state
    /// changes.
    ///
    /// On failure the page stays empty (it was cleared when the query started) while
    /// `total_hits` keeps the last successful total, so paging bounds survive a failed
    /// request.
    pub fn run_query<T: Transport>(
        &mut self,
        dispatcher: &mut Dispatcher<T>,
        root: &RootState,
        query: Option<SearchQuery>,
        new_offset: i64,
    ) -> Outcome {
        let Ok(new_offset) = usize::try_from(new_offset) else {
            debug!(new_offset, "Negative offset, ignoring query");
            return Outcome::Skipped;
        };
        if new_offset as u64 > self.total_hits {
            debug!(new_offset, total = self.total_hits, "Offset out of range, ignoring query");
            return Outcome::Skipped;
        }
        let Some(query) = query.or_else(|| self.last_query.clone()) else {
            debug!("No previous query to repeat");
            return Outcome::Skipped;
        };
        let Some(index) = self.index.clone() else {
            return dispatcher.reject(ValidationError::NoIndex);
        };

        self.last_query = Some(query.clone());
        self.offset = new_offset;
        self.set_running(true);

        let body = query::build_for(&query, &self.params());
        let response = dispatcher.search(&index, &body);

        let outcome = match response.map(SearchHits::from_response) {
            Some(Ok(hits)) => {
                info!(
                    index = %index,
                    total = hits.total,
                    page = hits.docs.len(),
                    offset = new_offset,
                    "Query completed"
                );
                self.total_hits = hits.total;
                self.results = hits.docs;
                Outcome::Completed
            }
            Some(Err(err)) => dispatcher.report(&ClientError::from(err)),
            None => Outcome::Failed,
        };
        self.set_running(false);

        if outcome.is_completed() {
            self.write_audit(dispatcher, root, &query, &index);
        }
        outcome
    }

    /// Re-run the last query one page further.
    pub fn next_page<T: Transport>(
        &mut self,
        dispatcher: &mut Dispatcher<T>,
        root: &RootState,
    ) -> Outcome {
        let next = self.offset.saturating_add(self.settings.page_size);
        self.run_query(dispatcher, root, None, offset_arg(next))
    }

    /// Re-run the last query one page back, stopping at the first page.
    pub fn previous_page<T: Transport>(
        &mut self,
        dispatcher: &mut Dispatcher<T>,
        root: &RootState,
    ) -> Outcome {
        if self.offset == 0 {
            return Outcome::Skipped;
        }
        let previous = self.offset.saturating_sub(self.settings.page_size);
        self.run_query(dispatcher, root, None, offset_arg(previous))
    }

    /// Best-effort audit record of a completed query. Failures are only traced.
    fn write_audit<T: Transport>(
        &self,
        dispatcher: &Dispatcher<T>,
        root: &RootState,
        query: &SearchQuery,
        index: &IndexName,
    ) {
        let record = json!({
            "query": query.raw_text(),
            "query-type": query.query_type().as_str(),
            "offset": self.offset,
            "size": self.settings.page_size,
            "results": self.total_hits,
            "casename": root.casename(),
            "source": root.source(),
            "indice": index.as_str(),
            "timestamp": chrono::Utc::now().timestamp_millis(),
            "analyst": root.analyst(),
        });
        let path = format!(
            "{}/{}",
            self.settings.queries_index,
            dispatcher.client().doctype()
        );
        if let Err(err) = dispatcher.request_silent(&path, Verb::Post, Some(&record)) {
            debug!(error = ?err, "Query audit write failed");
        }
    }

    /// Add the single tag of `query` to every document matching it.
    ///
    /// The update is a union: documents that already carry the tag are left unchanged and
    /// documents without a `tags` field get a new list.
    pub fn tag_all<T: Transport>(
        &mut self,
        dispatcher: &mut Dispatcher<T>,
        query: &SearchQuery,
    ) -> Outcome {
        let [tag] = query.tags() else {
            return dispatcher.reject(ValidationError::TagCount {
                found: query.tags().len(),
            });
        };
        let Some(index) = self.index.clone() else {
            return dispatcher.reject(ValidationError::NoIndex);
        };

        let body = query::build_for(query, &self.params());
        let update = tag_update_body(&body, tag);
        let path = format!("{index}/_update_by_query");

        match dispatcher.request(&path, Verb::Post, Some(&update)) {
            Some(response) => {
                info!(index = %index, tag = %tag, updated = ?response.get("updated"), "Tagged results");
                dispatcher.notify(
                    NotificationKind::Info,
                    format!("Tag \"{tag}\" added to the results"),
                );
                Outcome::Completed
            }
            None => Outcome::Failed,
        }
    }

    /// Save `partial` into the document at `idx` and merge it into the displayed result.
    pub fn edit_result<T: Transport>(
        &mut self,
        dispatcher: &mut Dispatcher<T>,
        idx: usize,
        partial: SourceFields,
    ) -> Outcome {
        let Some(doc) = self.results.get(idx) else {
            return dispatcher.reject(ValidationError::NoSuchResult {
                idx,
                len: self.results.len(),
            });
        };
        let Some(index) = self.index.clone() else {
            return dispatcher.reject(ValidationError::NoIndex);
        };
        let doc_id = doc.id().clone();

        let body = json!({ "doc": Value::Object(partial.clone()) });
        match dispatcher.write(&index, &doc_id, &body, WriteMode::Update) {
            Some(_) => {
                if let Some(doc) = self.results.get_mut(idx) {
                    doc.merge(&partial);
                }
                Outcome::Completed
            }
            None => Outcome::Failed,
        }
    }
}

/// The `_update_by_query` body adding `tag` to everything `body` matches.
pub fn tag_update_body(body: &Value, tag: &str) -> Value {
    json!({
        "query": query::query_clause(body),
        "script": {
            "source": TAG_UNION_SCRIPT,
            "params": { "new_tag": tag }
        }
    })
}

fn offset_arg(offset: usize) -> i64 {
    i64::try_from(offset).unwrap_or(i64::MAX)
}

// ===== Tests =====

#[cfg(test)]
#[path = "search_tests.rs"]
mod tests;
