//! Generic entity persistence over a document store.
//!
//! Callers talk to a domain service, which forwards to a [`repo::Repository`]
//! implementation; [`repo::BaseRepository`] maps entities onto any
//! [`store::DocumentStore`] with soft delete, lifecycle stamping and
//! post-write verification.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use config::{BackendKind, BookStoreConfig, CollectionBinding, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::book::Book;
pub use model::entity::{Entity, EntityId, EntityMeta, Timestamp};
pub use repo::{BaseRepository, RepoError, RepoResult, Repository};
pub use service::book_service::BookService;
pub use store::{
    DeleteResult, Document, DocumentStore, Filter, InsertOneResult, MemoryDocumentStore,
    Namespace, ReplaceResult, SqliteDocumentStore, StoreError, StoreResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
