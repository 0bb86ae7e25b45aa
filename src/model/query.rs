//! Search input as submitted by the analyst.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three query flavours understood by the template registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    /// Lucene query string with wildcard analysis over every field.
    #[default]
    QueryString,
    /// Operator-based simple query string.
    SimpleQuery,
    /// Single-field match against `content`.
    Match,
}

impl QueryType {
    /// Every flavour, in registry order.
    pub const ALL: [QueryType; 3] = [
        QueryType::QueryString,
        QueryType::SimpleQuery,
        QueryType::Match,
    ];

    /// Wire name used in the audit log and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            QueryType::QueryString => "query_string",
            QueryType::SimpleQuery => "simple_query",
            QueryType::Match => "match",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown query flavour name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown query type: {0} (expected query_string, simple_query or match)")]
pub struct UnknownQueryType(pub String);

impl FromStr for QueryType {
    type Err = UnknownQueryType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QueryType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownQueryType(s.to_string()))
    }
}

/// A submitted search. Immutable once submitted; pagination re-sends it verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    query_type: QueryType,
    raw_text: String,
    #[serde(default)]
    tags: Vec<String>,
}

impl SearchQuery {
    /// A query without tags.
    pub fn new(query_type: QueryType, raw_text: impl Into<String>) -> Self {
        Self {
            query_type,
            raw_text: raw_text.into(),
            tags: Vec::new(),
        }
    }

    /// The same query carrying the given tags (used by bulk tagging).
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// The template flavour.
    pub fn query_type(&self) -> QueryType {
        self.query_type
    }

    /// The text exactly as typed.
    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    /// Tags attached to the request, in order.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }
}

/// Sort order used when building the next query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    /// Field to sort on. `_score` sorts by relevance.
    pub field: String,
    /// Descending when true.
    pub descending: bool,
}

impl Sort {
    /// A sort on `field`.
    pub fn new(field: impl Into<String>, descending: bool) -> Self {
        Self {
            field: field.into(),
            descending,
        }
    }

    /// `"asc"` or `"desc"`.
    pub fn order(&self) -> &'static str {
        if self.descending {
            "desc"
        } else {
            "asc"
        }
    }
}

impl Default for Sort {
    fn default() -> Self {
        Self::new("_score", false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_type_parses_wire_names() {
        assert_eq!("query_string".parse::<QueryType>(), Ok(QueryType::QueryString));
        assert_eq!("simple_query".parse::<QueryType>(), Ok(QueryType::SimpleQuery));
        assert_eq!("match".parse::<QueryType>(), Ok(QueryType::Match));
    }

    #[test]
    fn query_type_rejects_unknown_name() {
        let err = "fuzzy".parse::<QueryType>().unwrap_err();
        assert_eq!(err, UnknownQueryType("fuzzy".to_string()));
    }

    #[test]
    fn query_type_serializes_as_wire_name() {
        let json = serde_json::to_string(&QueryType::SimpleQuery).unwrap();
        assert_eq!(json, "\"simple_query\"");
    }

    #[test]
    fn search_query_keeps_tag_order() {
        let q = SearchQuery::new(QueryType::Match, "invoice").with_tags(["b", "a"]);
        assert_eq!(q.tags(), ["b".to_string(), "a".to_string()]);
        assert_eq!(q.raw_text(), "invoice");
    }

    #[test]
    fn default_sort_is_relevance_ascending() {
        let sort = Sort::default();
        assert_eq!(sort.field, "_score");
        assert_eq!(sort.order(), "asc");
    }
}
