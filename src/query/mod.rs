//! Query template registry.
//!
//! Pure functions turning analyst input into ElasticSearch `_search` bodies. Every
//! template emits pagination (`from`, `size`), a query clause, a highlight clause and a
//! single-key sort clause.

use crate::model::{QueryType, SearchQuery, Sort};
use serde_json::{json, Value};

/// Maximum number of highlighted fragments per field.
pub const HIGHLIGHT_FRAGMENTS: u32 = 3;

/// Maximum size of a highlighted fragment, in characters.
pub const HIGHLIGHT_FRAGMENT_SIZE: u32 = 50;

/// Page size used when none is configured.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// Fields highlighted by the string and simple templates.
const FULL_HIGHLIGHT_FIELDS: [&str; 4] = ["content", "path", "filename", "tags"];

/// Fields highlighted by the match template.
const CONTENT_HIGHLIGHT_FIELDS: [&str; 1] = ["content"];

/// Paging and ordering applied to a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParams {
    /// Number of documents per page.
    pub page_size: usize,
    /// Position of the first document of the page.
    pub offset: usize,
    /// Sort order.
    pub sort: Sort,
}

impl Default for QueryParams {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            offset: 0,
            sort: Sort::default(),
        }
    }
}

/// Build the `_search` body for `query_type`.
pub fn build(
    query_type: QueryType,
    raw_text: &str,
    page_size: usize,
    offset: usize,
    sort_field: &str,
    sort_descending: bool,
) -> Value {
    let params = QueryParams {
        page_size,
        offset,
        sort: Sort::new(sort_field, sort_descending),
    };
    build_with(query_type, raw_text, &params)
}

/// Build the `_search` body for a submitted query.
pub fn build_for(query: &SearchQuery, params: &QueryParams) -> Value {
    build_with(query.query_type(), query.raw_text(), params)
}

/// Build the `_search` body from explicit params.
pub fn build_with(query_type: QueryType, raw_text: &str, params: &QueryParams) -> Value {
    match query_type {
        QueryType::QueryString => query_string(raw_text, params),
        QueryType::SimpleQuery => simple_query(raw_text, params),
        QueryType::Match => match_content(raw_text, params),
    }
}

/// Lucene query string over every field, wildcards analyzed.
pub fn query_string(raw_text: &str, params: &QueryParams) -> Value {
    let clause = json!({
        "query_string": {
            "query": raw_text,
            "default_field": "*",
            "analyze_wildcard": true
        }
    });
    assemble(clause, &FULL_HIGHLIGHT_FIELDS, params)
}

/// Operator-based simple query, `or` by default.
pub fn simple_query(raw_text: &str, params: &QueryParams) -> Value {
    let clause = json!({
        "simple_query_string": {
            "query": raw_text,
            "default_operator": "or",
            "analyze_wildcard": true
        }
    });
    assemble(clause, &FULL_HIGHLIGHT_FIELDS, params)
}

/// Match against the `content` field only.
pub fn match_content(raw_text: &str, params: &QueryParams) -> Value {
    let clause = json!({ "match": { "content": raw_text } });
    assemble(clause, &CONTENT_HIGHLIGHT_FIELDS, params)
}

/// The `query` clause of a built body, used to scope bulk updates.
pub fn query_clause(body: &Value) -> Value {
    body.get("query").cloned().unwrap_or(Value::Null)
}

fn assemble(clause: Value, highlight_fields: &[&str], params: &QueryParams) -> Value {
    let fields: serde_json::Map<String, Value> = highlight_fields
        .iter()
        .map(|field| ((*field).to_string(), json!({})))
        .collect();

    let mut sort = serde_json::Map::new();
    sort.insert(
        params.sort.field.clone(),
        json!({ "order": params.sort.order() }),
    );

    json!({
        "from": params.offset,
        "size": params.page_size,
        "query": clause,
        "highlight": {
            "order": "score",
            "fields": fields,
            "require_field_match": false,
            "fragment_size": HIGHLIGHT_FRAGMENT_SIZE,
            "number_of_fragments": HIGHLIGHT_FRAGMENTS
        },
        "sort": sort
    })
}

#[cfg(test)]
#[path = "query_tests.rs"]
mod tests;
