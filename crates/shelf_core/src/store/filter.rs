//! Document filters understood by every store adapter.

use super::{document_id, Document};

/// Field carrying the document identity.
pub const ID_FIELD: &str = "_id";

/// Predicate over stored documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `_id` equals the given string.
    IdEquals(String),
    /// Top-level field is missing or JSON `null`.
    Absent(&'static str),
    /// Every inner filter matches. An empty conjunction matches everything.
    And(Vec<Filter>),
}

impl Filter {
    pub fn id(id: impl Into<String>) -> Self {
        Self::IdEquals(id.into())
    }

    /// Evaluates the filter against an in-memory document.
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Self::IdEquals(id) => document_id(document) == Some(id.as_str()),
            Self::Absent(field) => document.get(*field).map_or(true, |value| value.is_null()),
            Self::And(filters) => filters.iter().all(|filter| filter.matches(document)),
        }
    }
}
