//! Generic entity repositories over a [`crate::store::DocumentStore`].
//!
//! # Responsibility
//! - Own id assignment, lifecycle stamping and soft-delete filtering.
//! - Verify every write through store counts and a read-back.
//!
//! # Invariants
//! - Zero matches on an id-scoped mutation is an error.
//! - More than one match is logged as a consistency anomaly and tolerated.

pub mod base_repo;

pub use base_repo::{BaseRepository, RepoError, RepoResult, Repository};
