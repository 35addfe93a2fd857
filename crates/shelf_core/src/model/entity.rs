//! Lifecycle metadata and the compile-time entity binding.
//!
//! # Invariants
//! - `id` is written by the repository at persist time and never again.
//! - `created_at` is set once; `updated_at` moves on every update or soft delete.
//! - Unset optional fields are omitted from stored documents.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Repository-assigned identity, stored under `_id`.
pub type EntityId = String;

/// Timestamp type used for all lifecycle fields.
pub type Timestamp = DateTime<Utc>;

/// Identity and lifecycle fields carried by every entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityMeta {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
    /// Soft-delete tombstone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<Timestamp>,
}

impl EntityMeta {
    /// Returns whether the entity is visible to read paths.
    pub fn is_live(&self) -> bool {
        self.deleted_at.is_none()
    }
}

/// A record the generic repository can persist.
///
/// Implementors flatten [`EntityMeta`] into their serialized form so the
/// repository can address `_id` and `deletedAt` in stored documents.
pub trait Entity: Serialize + DeserializeOwned {
    fn meta(&self) -> &EntityMeta;
    fn meta_mut(&mut self) -> &mut EntityMeta;

    fn id(&self) -> Option<&str> {
        self.meta().id.as_deref()
    }
}

/// Serialized names of lifecycle fields as they appear in documents.
pub mod fields {
    pub const DELETED_AT: &str = "deletedAt";
}
