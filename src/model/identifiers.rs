//! Backend identifier newtypes with smart constructors.
//!
//! Identifiers validate non-empty strings at construction time.
//! Raw constructors are never exported - use smart constructors only.

use serde::Serialize;
use std::fmt;

/// Name of a searchable collection (an "indice") in the search backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct IndexName(String);

impl IndexName {
    /// Smart constructor: rejects empty or whitespace-only names.
    pub fn new(raw: impl Into<String>) -> Result<Self, InvalidIndexName> {
        let s = raw.into();
        if s.trim().is_empty() {
            Err(InvalidIndexName::Empty)
        } else {
            Ok(Self(s))
        }
    }

    /// The index name as sent on the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IndexName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Backend-assigned document identifier. Immutable once assigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DocId(String);

impl DocId {
    /// Smart constructor: rejects empty ids.
    pub fn new(raw: impl Into<String>) -> Result<Self, InvalidDocId> {
        let s = raw.into();
        if s.is_empty() {
            Err(InvalidDocId::Empty)
        } else {
            Ok(Self(s))
        }
    }

    /// The id as sent on the wire.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ===== Error Types =====

/// Rejected index name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidIndexName {
    /// The name was empty or whitespace.
    #[error("The indice's name is empty")]
    Empty,
}

/// Rejected document id.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidDocId {
    /// The id was empty.
    #[error("Document id cannot be empty")]
    Empty,
}

// ===== Tests =====

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_name_accepts_valid_string() {
        let name = IndexName::new("case1-source2");
        assert!(name.is_ok(), "Valid index name should be accepted");
    }

    #[test]
    fn index_name_rejects_empty_string() {
        assert_eq!(IndexName::new(""), Err(InvalidIndexName::Empty));
    }

    #[test]
    fn index_name_rejects_whitespace_only() {
        assert_eq!(IndexName::new("  \t"), Err(InvalidIndexName::Empty));
    }

    #[test]
    fn index_name_display_returns_inner_string() {
        let name = IndexName::new("rvtindexer").expect("valid index");
        assert_eq!(name.to_string(), "rvtindexer");
        assert_eq!(name.as_str(), "rvtindexer");
    }

    #[test]
    fn doc_id_rejects_empty_string() {
        assert!(matches!(DocId::new(""), Err(InvalidDocId::Empty)));
    }

    #[test]
    fn doc_id_keeps_original_value() {
        let id = DocId::new("AXb3-12").expect("valid id");
        assert_eq!(id.as_str(), "AXb3-12");
        assert_eq!(id.to_string(), "AXb3-12");
    }
}
