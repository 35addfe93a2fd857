use serde_json::json;
use shelf_core::{
    BaseRepository, Book, CollectionBinding, DeleteResult, Document, DocumentStore, Filter,
    InsertOneResult, MemoryDocumentStore, Namespace, RepoError, ReplaceResult, Repository,
    StoreResult,
};
use std::cell::Cell;

/// How the scripted store misbehaves on its next calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fault {
    None,
    RejectInsert,
    DropInsertedId,
    BlindReads,
}

/// Memory store that can be told to fail the way a remote store might.
struct ScriptedStore {
    inner: MemoryDocumentStore,
    fault: Cell<Fault>,
}

impl ScriptedStore {
    fn new() -> Self {
        Self {
            inner: MemoryDocumentStore::new(),
            fault: Cell::new(Fault::None),
        }
    }
}

impl DocumentStore for ScriptedStore {
    fn insert(&self, ns: &Namespace, document: Document) -> StoreResult<InsertOneResult> {
        match self.fault.get() {
            Fault::RejectInsert => Ok(InsertOneResult {
                acknowledged: false,
                inserted_id: None,
            }),
            Fault::DropInsertedId => {
                let mut result = self.inner.insert(ns, document)?;
                result.inserted_id = None;
                Ok(result)
            }
            _ => self.inner.insert(ns, document),
        }
    }

    fn replace(
        &self,
        ns: &Namespace,
        filter: &Filter,
        document: Document,
    ) -> StoreResult<ReplaceResult> {
        self.inner.replace(ns, filter, document)
    }

    fn delete_by_filter(&self, ns: &Namespace, filter: &Filter) -> StoreResult<DeleteResult> {
        self.inner.delete_by_filter(ns, filter)
    }

    fn find_by_filter(&self, ns: &Namespace, filter: &Filter) -> StoreResult<Vec<Document>> {
        if self.fault.get() == Fault::BlindReads {
            return Ok(Vec::new());
        }
        self.inner.find_by_filter(ns, filter)
    }

    fn find_one_by_filter(
        &self,
        ns: &Namespace,
        filter: &Filter,
    ) -> StoreResult<Option<Document>> {
        if self.fault.get() == Fault::BlindReads {
            return Ok(None);
        }
        self.inner.find_one_by_filter(ns, filter)
    }
}

fn binding() -> CollectionBinding {
    CollectionBinding::new("library", "books").unwrap()
}

fn doc(value: serde_json::Value) -> Document {
    value.as_object().cloned().unwrap()
}

#[test]
fn unacknowledged_insert_fails_persist() {
    let store = ScriptedStore::new();
    store.fault.set(Fault::RejectInsert);
    let repo: BaseRepository<_, Book> = BaseRepository::new(&store, &binding());

    let err = repo.persist(Book::new("Dune")).unwrap_err();

    assert!(matches!(err, RepoError::WriteNotAcknowledged(reference) if reference.starts_with("books::")));
}

#[test]
fn acknowledged_insert_without_id_fails_persist() {
    let store = ScriptedStore::new();
    store.fault.set(Fault::DropInsertedId);
    let repo: BaseRepository<_, Book> = BaseRepository::new(&store, &binding());

    let err = repo.persist(Book::new("Dune")).unwrap_err();

    assert!(matches!(err, RepoError::MissingInsertedId(_)));
}

#[test]
fn persist_fails_when_insert_cannot_be_read_back() {
    let store = ScriptedStore::new();
    store.fault.set(Fault::BlindReads);
    let repo: BaseRepository<_, Book> = BaseRepository::new(&store, &binding());

    let err = repo.persist(Book::new("Dune")).unwrap_err();

    assert!(matches!(err, RepoError::PostWriteReadMiss(_)));
    assert_eq!(store.inner.len(repo.namespace()).unwrap(), 1);
}

#[test]
fn update_fails_when_replace_cannot_be_read_back() {
    let store = ScriptedStore::new();
    let repo: BaseRepository<_, Book> = BaseRepository::new(&store, &binding());
    let mut book = repo.persist(Book::new("Dune")).unwrap();

    store.fault.set(Fault::BlindReads);
    book.title = "Dune Messiah".to_string();
    let err = repo.update(book).unwrap_err();

    assert!(matches!(err, RepoError::PostWriteReadMiss(_)));
}

#[test]
fn duplicate_ids_are_tolerated_on_update_and_delete() {
    let store = MemoryDocumentStore::new();
    let repo: BaseRepository<_, Book> = BaseRepository::new(&store, &binding());
    let ns = repo.namespace().clone();
    store
        .raw_insert(&ns, doc(json!({"_id": "twin", "title": "left"})))
        .unwrap();
    store
        .raw_insert(&ns, doc(json!({"_id": "twin", "title": "right"})))
        .unwrap();

    let mut book = Book::new("merged");
    book.meta.id = Some("twin".to_string());
    let updated = repo.update(book).unwrap();
    assert_eq!(updated.title, "merged");

    assert!(repo.logical_delete("twin").unwrap());
    assert!(repo.delete("twin").unwrap());
    assert!(store.is_empty(&ns).unwrap());
}

#[test]
fn undecodable_document_surfaces_invalid_data() {
    let store = MemoryDocumentStore::new();
    let repo: BaseRepository<_, Book> = BaseRepository::new(&store, &binding());
    store
        .raw_insert(repo.namespace(), doc(json!({"_id": "bad", "title": 42})))
        .unwrap();

    let err = repo.find_one("bad").unwrap_err();

    assert!(matches!(err, RepoError::InvalidData(message) if message.contains("books::bad")));
}
