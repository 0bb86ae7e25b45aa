//! Source metadata and per-source statistics.
//!
//! A source is one piece of evidence (a disk image, a mailbox...) indexed into its own
//! ElasticSearch index. Its metadata lives in the sources index and points back to the
//! case it belongs to through `casename`.

use crate::client::{Transport, Verb};
use crate::model::{IndexName, ResultDoc, SourceFields};
use crate::state::dispatcher::{Dispatcher, Outcome};
use crate::state::metadata::MetadataStore;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

/// Key of the first statistics row.
pub const TOTAL_KEY: &str = "Total";

/// One row of the blindsearch statistics of a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlindsearchCount {
    /// Blindsearch name, or [`TOTAL_KEY`].
    pub key: String,
    /// Documents matched.
    pub count: u64,
}

/// Sources registered in the sources index.
#[derive(Debug, Clone)]
pub struct SourceStore {
    store: MetadataStore,
    max_sources: usize,
}

impl SourceStore {
    /// Store over `index`, listing at most `max_sources` sources per case.
    pub fn new(index: IndexName, max_sources: usize, reload_delay: Duration) -> Self {
        Self {
            store: MetadataStore::new(index, reload_delay),
            max_sources,
        }
    }

    /// Loaded sources.
    pub fn sources(&self) -> &[ResultDoc] {
        self.store.records()
    }

    /// List the sources of `casename`, most recently started first.
    pub fn load_sources<T: Transport>(
        &mut self,
        dispatcher: &mut Dispatcher<T>,
        casename: &str,
    ) -> Outcome {
        let body = json!({
            "sort": [{ "started": { "order": "desc" } }],
            "size": self.max_sources,
            "query": { "term": { "casename.keyword": { "value": casename } } }
        });
        self.store.load(dispatcher, &body)
    }

    /// Load the single source called `name`.
    pub fn load_source_by_name<T: Transport>(
        &mut self,
        dispatcher: &mut Dispatcher<T>,
        name: &str,
    ) -> Outcome {
        let body = json!({
            "query": { "term": { "name.keyword": { "value": name } } },
            "size": 1,
            "sort": [{ "started": { "order": "desc" } }]
        });
        self.store.load(dispatcher, &body)
    }

    /// Register a source. It needs a `name`; the list of its `casename` is reloaded.
    pub fn new_source<T: Transport>(
        &mut self,
        dispatcher: &mut Dispatcher<T>,
        metadata: &SourceFields,
    ) -> Outcome {
        let outcome = self.store.create(dispatcher, metadata);
        if outcome.is_completed() {
            self.reload(dispatcher, casename_of(metadata));
        }
        outcome
    }

    /// Partially update source `idx`.
    pub fn edit_source<T: Transport>(
        &mut self,
        dispatcher: &mut Dispatcher<T>,
        idx: usize,
        partial: SourceFields,
    ) -> Outcome {
        self.store.edit(dispatcher, idx, partial)
    }

    /// Delete the metadata of source `idx`. The source index itself is kept.
    pub fn remove_source<T: Transport>(
        &mut self,
        dispatcher: &mut Dispatcher<T>,
        idx: usize,
    ) -> Outcome {
        let (outcome, removed) = self.store.remove(dispatcher, idx);
        if let Some(record) = removed {
            let casename = casename_of(record.source()).map(str::to_string);
            self.reload(dispatcher, casename.as_deref());
        }
        outcome
    }

    /// Document count of `index` followed by the documents per blindsearch.
    ///
    /// Empty when the count itself fails. When only the aggregation fails the total
    /// row is still returned.
    pub fn get_stats<T: Transport>(
        &self,
        dispatcher: &mut Dispatcher<T>,
        index: &IndexName,
    ) -> Vec<BlindsearchCount> {
        let Some(count) = dispatcher.request(&format!("{index}/_count"), Verb::Get, None) else {
            return Vec::new();
        };
        let mut rows = vec![BlindsearchCount {
            key: TOTAL_KEY.to_string(),
            count: count.get("count").and_then(Value::as_u64).unwrap_or(0),
        }];

        let aggregation = json!({
            "aggs": { "blindsearches": { "terms": { "field": "blindsearches.keyword" } } }
        });
        let path = format!("{index}/_search?size=0");
        if let Some(response) = dispatcher.request(&path, Verb::Post, Some(&aggregation)) {
            let buckets = response
                .pointer("/aggregations/blindsearches/buckets")
                .and_then(Value::as_array)
                .map(Vec::as_slice)
                .unwrap_or_default();
            rows.extend(buckets.iter().filter_map(|bucket| {
                Some(BlindsearchCount {
                    key: bucket.get("key")?.as_str()?.to_string(),
                    count: bucket.get("doc_count")?.as_u64()?,
                })
            }));
        }
        rows
    }

    fn reload<T: Transport>(&mut self, dispatcher: &mut Dispatcher<T>, casename: Option<&str>) {
        let Some(casename) = casename else {
            debug!("Source has no casename, not reloading");
            return;
        };
        self.store.wait_for_reload();
        self.load_sources(dispatcher, casename);
    }
}

fn casename_of(metadata: &SourceFields) -> Option<&str> {
    metadata.get("casename").and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ElasticClient;
    use crate::model::NotificationKind;
    use crate::state::messages::MessageBus;
    use crate::test_harness::{fields, search_response, RecordingTransport};

    fn dispatcher(transport: &RecordingTransport) -> Dispatcher<&RecordingTransport> {
        Dispatcher::new(
            ElasticClient::new(transport, "http://es:9200", "_doc"),
            MessageBus::new(100),
            false,
        )
    }

    fn sources() -> SourceStore {
        SourceStore::new(IndexName::new("rvtindexer").expect("valid"), 100, Duration::ZERO)
    }

    #[test]
    fn load_sources_filters_by_case_newest_first() {
        let transport = RecordingTransport::new();
        transport.reply_ok(search_response(
            1,
            &[("disk-a", json!({"name": "disk-a", "casename": "c1"}))],
        ));
        let mut d = dispatcher(&transport);
        let mut store = sources();

        assert_eq!(store.load_sources(&mut d, "c1"), Outcome::Completed);

        let body = transport.last_request().and_then(|r| r.body).expect("body");
        assert_eq!(body["query"]["term"]["casename.keyword"]["value"], "c1");
        assert_eq!(body["sort"][0]["started"]["order"], "desc");
        assert_eq!(body["size"], 100);
        assert_eq!(store.sources()[0].id().as_str(), "disk-a");
    }

    #[test]
    fn load_source_by_name_asks_for_one_record() {
        let transport = RecordingTransport::new();
        transport.reply_ok(search_response(0, &[]));
        let mut d = dispatcher(&transport);
        let mut store = sources();

        store.load_source_by_name(&mut d, "disk-a");

        let body = transport.last_request().and_then(|r| r.body).expect("body");
        assert_eq!(body["query"]["term"]["name.keyword"]["value"], "disk-a");
        assert_eq!(body["size"], 1);
    }

    #[test]
    fn new_source_reloads_its_case() {
        let transport = RecordingTransport::new();
        transport.reply_ok(json!({"result": "created"}));
        transport.reply_ok(search_response(0, &[]));
        let mut d = dispatcher(&transport);
        let mut store = sources();

        let outcome = store.new_source(&mut d, &fields(json!({"name": "disk-b", "casename": "c1"})));

        assert_eq!(outcome, Outcome::Completed);
        let requests = transport.requests();
        assert_eq!(requests[0].url, "http://es:9200/rvtindexer/_doc/disk-b");
        assert_eq!(
            requests[1].body.as_ref().map(|b| b["query"]["term"]["casename.keyword"]["value"].clone()),
            Some(json!("c1"))
        );
    }

    #[test]
    fn new_source_without_name_is_rejected() {
        let transport = RecordingTransport::new();
        let mut d = dispatcher(&transport);
        let mut store = sources();

        let outcome = store.new_source(&mut d, &fields(json!({"casename": "c1"})));

        assert_eq!(outcome, Outcome::Rejected);
        assert_eq!(transport.request_count(), 0);
        assert_eq!(d.messages().len(NotificationKind::Error), 1);
    }

    #[test]
    fn remove_source_reloads_the_removed_sources_case() {
        let transport = RecordingTransport::new();
        transport.reply_ok(search_response(
            1,
            &[("disk-a", json!({"name": "disk-a", "casename": "c9"}))],
        ));
        transport.reply_ok(json!({"result": "deleted"}));
        transport.reply_ok(search_response(0, &[]));
        let mut d = dispatcher(&transport);
        let mut store = sources();
        store.load_sources(&mut d, "c9");

        assert_eq!(store.remove_source(&mut d, 0), Outcome::Completed);

        let requests = transport.requests();
        assert_eq!(requests[1].url, "http://es:9200/rvtindexer/_doc/disk-a");
        assert_eq!(
            requests[2].body.as_ref().map(|b| b["query"]["term"]["casename.keyword"]["value"].clone()),
            Some(json!("c9"))
        );
        assert!(store.sources().is_empty());
    }

    #[test]
    fn get_stats_lists_total_then_blindsearches() {
        let transport = RecordingTransport::new();
        transport.reply_ok(json!({"count": 1200}));
        transport.reply_ok(json!({
            "aggregations": {"blindsearches": {"buckets": [
                {"key": "passwords", "doc_count": 12},
                {"key": "bitcoin", "doc_count": 3}
            ]}}
        }));
        let mut d = dispatcher(&transport);
        let index = IndexName::new("c1-disk-a").expect("valid");

        let stats = sources().get_stats(&mut d, &index);

        assert_eq!(
            stats,
            vec![
                BlindsearchCount { key: "Total".to_string(), count: 1200 },
                BlindsearchCount { key: "passwords".to_string(), count: 12 },
                BlindsearchCount { key: "bitcoin".to_string(), count: 3 },
            ]
        );
        let requests = transport.requests();
        assert_eq!(requests[0].verb, Verb::Get);
        assert_eq!(requests[0].url, "http://es:9200/c1-disk-a/_count");
        assert_eq!(requests[1].url, "http://es:9200/c1-disk-a/_search?size=0");
    }

    #[test]
    fn get_stats_is_empty_when_count_fails() {
        let transport = RecordingTransport::new();
        transport.reply_unreachable();
        let mut d = dispatcher(&transport);
        let index = IndexName::new("missing").expect("valid");

        assert!(sources().get_stats(&mut d, &index).is_empty());
        assert_eq!(transport.request_count(), 1);
    }
}
