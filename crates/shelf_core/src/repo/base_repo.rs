//! Base repository shared by every entity collection.
//!
//! # Responsibility
//! - Typed CRUD for one collection, parameterized by entity type.
//! - Re-read each written document so callers see the stored state.
//!
//! # Invariants
//! - `persist` always assigns a fresh UUIDv4 id.
//! - Read paths (`find_one`, `find_all`) never surface soft-deleted entities.
//! - No retries: the first failure ends the operation.

use crate::config::CollectionBinding;
use crate::model::entity::{fields, Entity, EntityId};
use crate::store::{document_id, Document, DocumentStore, Filter, Namespace, StoreError};
use chrono::Utc;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::marker::PhantomData;
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository failure. Each variant other than `Store`/`InvalidData` carries
/// the `<collection>::<id>` reference of the affected entity.
#[derive(Debug)]
pub enum RepoError {
    /// The store declined to confirm a write.
    WriteNotAcknowledged(String),
    /// The store acknowledged an insert without reporting an id.
    MissingInsertedId(String),
    /// A confirmed write could not be read back.
    PostWriteReadMiss(String),
    /// No document matched an id-scoped mutation.
    EntityNotFound(String),
    Store(StoreError),
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::WriteNotAcknowledged(reference) => {
                write!(f, "write of entity {reference} was not acknowledged")
            }
            Self::MissingInsertedId(reference) => {
                write!(f, "cannot get inserted entity id for {reference}")
            }
            Self::PostWriteReadMiss(reference) => {
                write!(f, "entity {reference} was written but could not be returned")
            }
            Self::EntityNotFound(reference) => write!(f, "entity not found: {reference}"),
            Self::Store(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid entity data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for RepoError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Entity-level persistence contract.
///
/// Services depend on this trait so the backing store stays swappable.
pub trait Repository<T: Entity> {
    fn persist(&self, entity: T) -> RepoResult<T>;
    fn update(&self, entity: T) -> RepoResult<T>;
    /// Physically removes the document.
    fn delete(&self, id: &str) -> RepoResult<bool>;
    /// Marks the document deleted while keeping it stored.
    fn logical_delete(&self, id: &str) -> RepoResult<bool>;
    fn find_all(&self) -> RepoResult<Vec<T>>;
    fn find_one(&self, id: &str) -> RepoResult<Option<T>>;
}

/// Document-store repository bound to one collection and entity type.
pub struct BaseRepository<S, T> {
    store: S,
    namespace: Namespace,
    _entity: PhantomData<fn() -> T>,
}

impl<S: DocumentStore, T: Entity> BaseRepository<S, T> {
    pub fn new(store: S, binding: &CollectionBinding) -> Self {
        Self {
            store,
            namespace: binding.namespace(),
            _entity: PhantomData,
        }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Formats `<collection>::<id>`, or `<collection>::` without an id.
    pub fn collection_reference(&self, id: Option<&str>) -> String {
        format!("{}::{}", self.namespace.collection, id.unwrap_or_default())
    }

    fn read_by_id(&self, id: &str) -> RepoResult<Option<T>> {
        self.store
            .find_one_by_filter(&self.namespace, &Filter::id(id))?
            .map(|document| self.decode(document))
            .transpose()
    }

    fn read_back(&self, id: &str) -> RepoResult<T> {
        self.read_by_id(id)?
            .ok_or_else(|| RepoError::PostWriteReadMiss(self.collection_reference(Some(id))))
    }

    fn encode(&self, entity: &T) -> RepoResult<Document> {
        match serde_json::to_value(entity) {
            Ok(serde_json::Value::Object(document)) => Ok(document),
            Ok(_) => Err(RepoError::InvalidData(format!(
                "{} entity does not serialize to an object",
                self.namespace.collection
            ))),
            Err(err) => Err(RepoError::InvalidData(format!(
                "cannot encode {} entity: {err}",
                self.namespace.collection
            ))),
        }
    }

    fn decode(&self, document: Document) -> RepoResult<T> {
        let reference = self.collection_reference(document_id(&document));
        serde_json::from_value(serde_json::Value::Object(document))
            .map_err(|err| RepoError::InvalidData(format!("cannot decode {reference}: {err}")))
    }

    fn replace_by_id(&self, id: &str, entity: &T, action: &'static str) -> RepoResult<()> {
        let reference = self.collection_reference(Some(id));
        let document = self.encode(entity)?;
        let result = self
            .store
            .replace(&self.namespace, &Filter::id(id), document)?;
        if result.modified_count < 1 {
            return Err(RepoError::EntityNotFound(reference));
        }
        if result.modified_count > 1 {
            warn!(
                "event=consistency_anomaly module=repo status=warn action={action} entity={reference} matched={}",
                result.modified_count
            );
        }
        Ok(())
    }
}

impl<S: DocumentStore, T: Entity> Repository<T> for BaseRepository<S, T> {
    fn persist(&self, mut entity: T) -> RepoResult<T> {
        let generated_id: EntityId = Uuid::new_v4().to_string();
        {
            let meta = entity.meta_mut();
            meta.id = Some(generated_id.clone());
            meta.created_at = Some(Utc::now());
        }

        let document = self.encode(&entity)?;
        let result = self.store.insert(&self.namespace, document)?;
        if !result.acknowledged {
            return Err(RepoError::WriteNotAcknowledged(
                self.collection_reference(Some(&generated_id)),
            ));
        }
        let inserted_id = result.inserted_id.ok_or_else(|| {
            RepoError::MissingInsertedId(self.collection_reference(Some(&generated_id)))
        })?;
        info!(
            "event=entity_persist module=repo status=ok entity={}",
            self.collection_reference(Some(&inserted_id))
        );

        self.read_back(&generated_id)
    }

    fn update(&self, mut entity: T) -> RepoResult<T> {
        entity.meta_mut().updated_at = Some(Utc::now());
        let Some(id) = entity.id().map(str::to_owned) else {
            return Err(RepoError::EntityNotFound(self.collection_reference(None)));
        };

        self.replace_by_id(&id, &entity, "update")?;
        info!(
            "event=entity_update module=repo status=ok entity={}",
            self.collection_reference(Some(&id))
        );

        self.read_back(&id)
    }

    fn delete(&self, id: &str) -> RepoResult<bool> {
        let reference = self.collection_reference(Some(id));
        let result = self
            .store
            .delete_by_filter(&self.namespace, &Filter::id(id))?;
        if result.deleted_count < 1 {
            return Err(RepoError::EntityNotFound(reference));
        }
        if result.deleted_count > 1 {
            warn!(
                "event=consistency_anomaly module=repo status=warn action=delete entity={reference} matched={}",
                result.deleted_count
            );
        }
        info!("event=entity_delete module=repo status=ok entity={reference}");
        Ok(true)
    }

    fn logical_delete(&self, id: &str) -> RepoResult<bool> {
        let Some(mut entity) = self.read_by_id(id)? else {
            return Err(RepoError::EntityNotFound(self.collection_reference(Some(id))));
        };

        let now = Utc::now();
        {
            let meta = entity.meta_mut();
            meta.updated_at = Some(now);
            meta.deleted_at = Some(now);
        }

        self.replace_by_id(id, &entity, "logical_delete")?;
        info!(
            "event=entity_logical_delete module=repo status=ok entity={}",
            self.collection_reference(Some(id))
        );
        Ok(true)
    }

    fn find_all(&self) -> RepoResult<Vec<T>> {
        self.store
            .find_by_filter(&self.namespace, &Filter::Absent(fields::DELETED_AT))?
            .into_iter()
            .map(|document| self.decode(document))
            .collect()
    }

    fn find_one(&self, id: &str) -> RepoResult<Option<T>> {
        Ok(self
            .read_by_id(id)?
            .filter(|entity| entity.meta().is_live()))
    }
}
