//! Book domain service.
//!
//! Every method forwards verbatim to the configured repository; inputs,
//! results and errors are the repository's own.

use crate::model::book::Book;
use crate::repo::{RepoResult, Repository};

/// Use-case façade over one book repository.
pub struct BookService<R: Repository<Book>> {
    repo: R,
}

impl<R: Repository<Book>> BookService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Stores a new book and returns it as persisted.
    pub fn create_book(&self, book: Book) -> RepoResult<Book> {
        self.repo.persist(book)
    }

    /// Hard-deletes a book by id.
    pub fn delete_book(&self, id: &str) -> RepoResult<bool> {
        self.repo.delete(id)
    }

    /// Soft-deletes a book by id.
    pub fn retire_book(&self, id: &str) -> RepoResult<bool> {
        self.repo.logical_delete(id)
    }

    /// Replaces a stored book with `book`.
    pub fn update_book(&self, book: Book) -> RepoResult<Book> {
        self.repo.update(book)
    }

    pub fn get_all_books(&self) -> RepoResult<Vec<Book>> {
        self.repo.find_all()
    }

    pub fn get_book(&self, id: &str) -> RepoResult<Option<Book>> {
        self.repo.find_one(id)
    }
}
