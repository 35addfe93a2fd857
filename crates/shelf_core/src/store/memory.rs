//! In-process document store.
//!
//! # Invariants
//! - Documents keep insertion order per namespace.
//! - `_id` is not enforced unique; duplicates are stored and counted.
//! - Each call holds the map lock for its whole duration.

use super::{
    document_id, DeleteResult, Document, DocumentStore, Filter, InsertOneResult, Namespace,
    ReplaceResult, StoreError, StoreResult,
};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

type Collections = HashMap<Namespace, Vec<Document>>;

/// Mutex-guarded map of namespace to ordered documents.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: Mutex<Collections>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a document as-is, bypassing any caller bookkeeping.
    ///
    /// Used to seed fixtures, including pathological duplicate ids.
    pub fn raw_insert(&self, ns: &Namespace, document: Document) -> StoreResult<()> {
        self.lock()?.entry(ns.clone()).or_default().push(document);
        Ok(())
    }

    /// Number of physically stored documents in `ns`, deleted or not.
    pub fn len(&self, ns: &Namespace) -> StoreResult<usize> {
        Ok(self.lock()?.get(ns).map_or(0, Vec::len))
    }

    pub fn is_empty(&self, ns: &Namespace) -> StoreResult<bool> {
        Ok(self.len(ns)? == 0)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Collections>> {
        self.collections
            .lock()
            .map_err(|_| StoreError::Poisoned("memory store"))
    }
}

impl DocumentStore for MemoryDocumentStore {
    fn insert(&self, ns: &Namespace, document: Document) -> StoreResult<InsertOneResult> {
        let inserted_id = document_id(&document).map(str::to_owned);
        self.lock()?.entry(ns.clone()).or_default().push(document);
        Ok(InsertOneResult {
            acknowledged: true,
            inserted_id,
        })
    }

    fn replace(
        &self,
        ns: &Namespace,
        filter: &Filter,
        document: Document,
    ) -> StoreResult<ReplaceResult> {
        let mut collections = self.lock()?;
        let mut modified_count = 0;
        if let Some(documents) = collections.get_mut(ns) {
            for slot in documents.iter_mut().filter(|doc| filter.matches(doc)) {
                *slot = document.clone();
                modified_count += 1;
            }
        }
        Ok(ReplaceResult { modified_count })
    }

    fn delete_by_filter(&self, ns: &Namespace, filter: &Filter) -> StoreResult<DeleteResult> {
        let mut collections = self.lock()?;
        let Some(documents) = collections.get_mut(ns) else {
            return Ok(DeleteResult { deleted_count: 0 });
        };
        let before = documents.len();
        documents.retain(|doc| !filter.matches(doc));
        Ok(DeleteResult {
            deleted_count: (before - documents.len()) as u64,
        })
    }

    fn find_by_filter(&self, ns: &Namespace, filter: &Filter) -> StoreResult<Vec<Document>> {
        Ok(self.lock()?.get(ns).map_or_else(Vec::new, |documents| {
            documents
                .iter()
                .filter(|doc| filter.matches(doc))
                .cloned()
                .collect()
        }))
    }

    fn find_one_by_filter(
        &self,
        ns: &Namespace,
        filter: &Filter,
    ) -> StoreResult<Option<Document>> {
        Ok(self
            .lock()?
            .get(ns)
            .and_then(|documents| documents.iter().find(|doc| filter.matches(doc)).cloned()))
    }
}
