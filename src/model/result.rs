//! Documents returned by the search backend.

use super::identifiers::DocId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Field name → value mapping of a stored document.
pub type SourceFields = Map<String, Value>;

/// One hit of a search, as displayed to the analyst.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultDoc {
    id: DocId,
    source: SourceFields,
    /// Highlighted fragments per matched field.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub highlight: BTreeMap<String, Vec<String>>,
    /// Relevance score; absent when sorting on a field.
    pub score: Option<f64>,
}

impl ResultDoc {
    /// A document without highlight or score.
    pub fn new(id: DocId, source: SourceFields) -> Self {
        Self {
            id,
            source,
            highlight: BTreeMap::new(),
            score: None,
        }
    }

    /// Backend-assigned id.
    pub fn id(&self) -> &DocId {
        &self.id
    }

    /// Stored fields.
    pub fn source(&self) -> &SourceFields {
        &self.source
    }

    /// Shallow merge of `partial` into the stored fields. Last write wins per field.
    pub fn merge(&mut self, partial: &SourceFields) {
        for (key, value) in partial {
            self.source.insert(key.clone(), value.clone());
        }
    }

    /// String value of a field, if present and a string.
    pub fn field_str(&self, field: &str) -> Option<&str> {
        self.source.get(field).and_then(Value::as_str)
    }

    /// The `tags` field as strings. Non-string entries are skipped.
    pub fn tags(&self) -> Vec<&str> {
        self.source
            .get("tags")
            .and_then(Value::as_array)
            .map(|tags| tags.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

/// The hits section of a `_search` response.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHits {
    /// Total number of matching documents, not just this page.
    pub total: u64,
    /// The page of documents.
    pub docs: Vec<ResultDoc>,
}

#[derive(Deserialize)]
struct RawResponse {
    hits: RawHits,
}

#[derive(Deserialize)]
struct RawHits {
    total: RawTotal,
    #[serde(default)]
    hits: Vec<RawHit>,
}

/// ES >= 7 reports `{"value": n, "relation": ..}`, older versions a bare number.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawTotal {
    Object { value: u64 },
    Count(u64),
}

#[derive(Deserialize)]
struct RawHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_source", default)]
    source: SourceFields,
    #[serde(default)]
    highlight: BTreeMap<String, Vec<String>>,
    #[serde(rename = "_score", default)]
    score: Option<f64>,
}

impl SearchHits {
    /// Parse a raw `_search` response body.
    pub fn from_response(value: Value) -> Result<Self, serde_json::Error> {
        let raw: RawResponse = serde_json::from_value(value)?;
        let total = match raw.hits.total {
            RawTotal::Object { value } => value,
            RawTotal::Count(count) => count,
        };
        let docs = raw
            .hits
            .hits
            .into_iter()
            .map(|hit| {
                let id = DocId::new(hit.id).map_err(serde::de::Error::custom)?;
                Ok(ResultDoc {
                    id,
                    source: hit.source,
                    highlight: hit.highlight,
                    score: hit.score,
                })
            })
            .collect::<Result<Vec<_>, serde_json::Error>>()?;
        Ok(Self { total, docs })
    }
}
