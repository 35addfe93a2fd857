use chrono::Utc;
use shelf_core::db::open_db_in_memory;
use shelf_core::{
    BaseRepository, Book, CollectionBinding, MemoryDocumentStore, RepoError, Repository,
    SqliteDocumentStore,
};
use std::collections::HashSet;

fn binding() -> CollectionBinding {
    CollectionBinding::new("library", "books").unwrap()
}

/// Runs `check` once against each bundled store adapter.
fn on_each_backend(check: impl Fn(&dyn Repository<Book>)) {
    let memory = MemoryDocumentStore::new();
    check(&BaseRepository::<_, Book>::new(&memory, &binding()));

    let conn = open_db_in_memory().unwrap();
    let sqlite = SqliteDocumentStore::try_new(&conn).unwrap();
    check(&BaseRepository::<_, Book>::new(sqlite, &binding()));
}

#[test]
fn persist_assigns_distinct_ids_and_creation_time() {
    on_each_backend(|repo| {
        let before = Utc::now();
        let first = repo.persist(Book::new("Dune")).unwrap();
        let second = repo.persist(Book::new("Dune")).unwrap();
        let after = Utc::now();

        let first_id = first.meta.id.clone().unwrap();
        let second_id = second.meta.id.clone().unwrap();
        assert!(!first_id.is_empty());
        assert_ne!(first_id, second_id);

        let created = first.meta.created_at.unwrap();
        assert!(before <= created && created <= after);
        assert_eq!(first.meta.updated_at, None);
        assert_eq!(first.meta.deleted_at, None);
    });
}

#[test]
fn persisted_entity_reads_back_equal() {
    on_each_backend(|repo| {
        let saved = repo
            .persist(Book::new("Hyperion").with_author("Dan Simmons"))
            .unwrap();

        let loaded = repo.find_one(saved.meta.id.as_deref().unwrap()).unwrap();

        assert_eq!(loaded, Some(saved));
    });
}

#[test]
fn find_one_is_empty_for_unknown_id() {
    on_each_backend(|repo| {
        assert!(repo.find_one("never-persisted").unwrap().is_none());
    });
}

#[test]
fn find_all_on_empty_collection_is_empty() {
    on_each_backend(|repo| {
        assert!(repo.find_all().unwrap().is_empty());
    });
}

#[test]
fn update_stamps_time_and_keeps_other_fields() {
    on_each_backend(|repo| {
        let mut book = repo.persist(Book::new("Dune")).unwrap();
        book.title = "Dune Messiah".to_string();
        book.published_year = Some(1969);

        let called_at = Utc::now();
        let updated = repo.update(book.clone()).unwrap();

        assert!(updated.meta.updated_at.unwrap() >= called_at);
        assert_eq!(updated.meta.id, book.meta.id);
        assert_eq!(updated.meta.created_at, book.meta.created_at);
        assert_eq!(updated.meta.deleted_at, None);
        assert_eq!(updated.title, "Dune Messiah");
        assert_eq!(updated.published_year, Some(1969));
    });
}

#[test]
fn update_of_unknown_id_is_not_found() {
    on_each_backend(|repo| {
        let mut ghost = Book::new("ghost");
        ghost.meta.id = Some("missing".to_string());

        let err = repo.update(ghost).unwrap_err();

        assert!(matches!(err, RepoError::EntityNotFound(reference) if reference == "books::missing"));
    });
}

#[test]
fn logical_delete_hides_entity_but_keeps_document() {
    on_each_backend(|repo| {
        let kept = repo.persist(Book::new("kept")).unwrap();
        let gone = repo.persist(Book::new("gone")).unwrap();
        let gone_id = gone.meta.id.clone().unwrap();

        assert!(repo.logical_delete(&gone_id).unwrap());

        assert!(repo.find_one(&gone_id).unwrap().is_none());
        let listed: HashSet<_> = repo
            .find_all()
            .unwrap()
            .into_iter()
            .filter_map(|book| book.meta.id)
            .collect();
        assert!(listed.contains(kept.meta.id.as_deref().unwrap()));
        assert!(!listed.contains(&gone_id));

        assert!(repo.delete(&gone_id).unwrap());
    });
}

#[test]
fn logical_delete_is_idempotent() {
    on_each_backend(|repo| {
        let book = repo.persist(Book::new("twice")).unwrap();
        let id = book.meta.id.unwrap();

        assert!(repo.logical_delete(&id).unwrap());
        assert!(repo.logical_delete(&id).unwrap());
        assert!(repo.find_one(&id).unwrap().is_none());
    });
}

#[test]
fn second_hard_delete_is_not_found() {
    on_each_backend(|repo| {
        let id = repo.persist(Book::new("once")).unwrap().meta.id.unwrap();

        assert!(repo.delete(&id).unwrap());
        let err = repo.delete(&id).unwrap_err();

        assert!(matches!(err, RepoError::EntityNotFound(_)));
        assert!(matches!(
            repo.logical_delete(&id),
            Err(RepoError::EntityNotFound(_))
        ));
    });
}

#[test]
fn update_after_hard_delete_is_not_found() {
    on_each_backend(|repo| {
        let book = repo.persist(Book::new("short-lived")).unwrap();
        repo.delete(book.meta.id.as_deref().unwrap()).unwrap();

        assert!(matches!(
            repo.update(book),
            Err(RepoError::EntityNotFound(_))
        ));
    });
}
