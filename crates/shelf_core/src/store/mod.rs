//! Document store capability consumed by the repository layer.
//!
//! # Responsibility
//! - Define the collection-scoped insert/find/replace/delete contract.
//! - Report write outcomes as acknowledgment and affected-document counts.
//!
//! # Invariants
//! - Stores never interpret entity lifecycle fields; soft-delete filtering
//!   is expressed by callers through [`Filter`].
//! - `replace` and `delete_by_filter` act on every matching document and
//!   report the full count, so duplicate ids stay observable.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use crate::db::DbError;

mod filter;
mod memory;
mod sqlite;

pub use filter::{Filter, ID_FIELD};
pub use memory::MemoryDocumentStore;
pub use sqlite::SqliteDocumentStore;

/// Schemaless JSON object as persisted by a store.
pub type Document = serde_json::Map<String, serde_json::Value>;

pub type StoreResult<T> = Result<T, StoreError>;

/// Database + collection pair addressing one collection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Namespace {
    pub database: String,
    pub collection: String,
}

impl Namespace {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }
}

impl Display for Namespace {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

/// Outcome of a single-document insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertOneResult {
    pub acknowledged: bool,
    /// `_id` of the stored document, when the store could report one.
    pub inserted_id: Option<String>,
}

/// Outcome of a replace-by-filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaceResult {
    pub modified_count: u64,
}

/// Outcome of a delete-by-filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteResult {
    pub deleted_count: u64,
}

/// Transport/engine failure raised by a store adapter.
#[derive(Debug)]
pub enum StoreError {
    Sqlite(rusqlite::Error),
    Db(DbError),
    Encoding(serde_json::Error),
    /// A stored body was valid JSON but not an object.
    NotAnObject(String),
    /// Internal lock was poisoned by a panicking writer.
    Poisoned(&'static str),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite error: {err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Encoding(err) => write!(f, "document encoding error: {err}"),
            Self::NotAnObject(location) => {
                write!(f, "stored document at {location} is not a JSON object")
            }
            Self::Poisoned(what) => write!(f, "{what} lock poisoned"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection is not migrated: expected schema version {expected_version}, found {actual_version}"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Sqlite(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Encoding(err) => Some(err),
            _ => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encoding(value)
    }
}

/// Collection-scoped document operations.
///
/// Implementations are externally owned and shared; callers never open or
/// close them. All calls block until the store answers.
pub trait DocumentStore {
    fn insert(&self, ns: &Namespace, document: Document) -> StoreResult<InsertOneResult>;
    fn replace(
        &self,
        ns: &Namespace,
        filter: &Filter,
        document: Document,
    ) -> StoreResult<ReplaceResult>;
    fn delete_by_filter(&self, ns: &Namespace, filter: &Filter) -> StoreResult<DeleteResult>;
    fn find_by_filter(&self, ns: &Namespace, filter: &Filter) -> StoreResult<Vec<Document>>;
    fn find_one_by_filter(&self, ns: &Namespace, filter: &Filter)
        -> StoreResult<Option<Document>>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for &S {
    fn insert(&self, ns: &Namespace, document: Document) -> StoreResult<InsertOneResult> {
        (**self).insert(ns, document)
    }

    fn replace(
        &self,
        ns: &Namespace,
        filter: &Filter,
        document: Document,
    ) -> StoreResult<ReplaceResult> {
        (**self).replace(ns, filter, document)
    }

    fn delete_by_filter(&self, ns: &Namespace, filter: &Filter) -> StoreResult<DeleteResult> {
        (**self).delete_by_filter(ns, filter)
    }

    fn find_by_filter(&self, ns: &Namespace, filter: &Filter) -> StoreResult<Vec<Document>> {
        (**self).find_by_filter(ns, filter)
    }

    fn find_one_by_filter(
        &self,
        ns: &Namespace,
        filter: &Filter,
    ) -> StoreResult<Option<Document>> {
        (**self).find_one_by_filter(ns, filter)
    }
}

impl<S: DocumentStore + ?Sized> DocumentStore for Arc<S> {
    fn insert(&self, ns: &Namespace, document: Document) -> StoreResult<InsertOneResult> {
        (**self).insert(ns, document)
    }

    fn replace(
        &self,
        ns: &Namespace,
        filter: &Filter,
        document: Document,
    ) -> StoreResult<ReplaceResult> {
        (**self).replace(ns, filter, document)
    }

    fn delete_by_filter(&self, ns: &Namespace, filter: &Filter) -> StoreResult<DeleteResult> {
        (**self).delete_by_filter(ns, filter)
    }

    fn find_by_filter(&self, ns: &Namespace, filter: &Filter) -> StoreResult<Vec<Document>> {
        (**self).find_by_filter(ns, filter)
    }

    fn find_one_by_filter(
        &self,
        ns: &Namespace,
        filter: &Filter,
    ) -> StoreResult<Option<Document>> {
        (**self).find_one_by_filter(ns, filter)
    }
}

/// Reads the `_id` of a document when it is a string.
pub fn document_id(document: &Document) -> Option<&str> {
    document.get(ID_FIELD).and_then(serde_json::Value::as_str)
}
