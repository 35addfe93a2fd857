//! CLI smoke probe for `shelf_core`.
//!
//! # Responsibility
//! - Wire a `BookService` to the backend named by `SHELF_BACKEND`.
//! - Run one create/update/list/retire/delete round and print `key=value` lines.
//!
//! Set `SHELF_LOG_DIR` (absolute) to also write core logs to disk.

use log::info;
use shelf_core::db::{open_db, open_db_in_memory};
use shelf_core::{
    BackendKind, BaseRepository, Book, BookService, BookStoreConfig, MemoryDocumentStore,
    Repository, SqliteDocumentStore,
};
use std::error::Error;
use std::process::ExitCode;

const ENV_LOG_DIR: &str = "SHELF_LOG_DIR";

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("shelf error={err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    println!("shelf_core version={}", shelf_core::core_version());

    if let Ok(log_dir) = std::env::var(ENV_LOG_DIR) {
        shelf_core::init_logging(shelf_core::default_log_level(), &log_dir)?;
    }

    let config = BookStoreConfig::from_env()?;
    println!(
        "backend={} namespace={}",
        config.backend,
        config.binding.namespace()
    );

    match config.backend {
        BackendKind::Memory => {
            let store = MemoryDocumentStore::new();
            let repo = BaseRepository::<_, Book>::new(&store, &config.binding);
            let service = BookService::new(repo);
            run_round(&service)?;
        }
        BackendKind::Sqlite => {
            let conn = match &config.db_path {
                Some(path) => open_db(path)?,
                None => open_db_in_memory()?,
            };
            let store = SqliteDocumentStore::try_new(&conn)?;
            let repo = BaseRepository::<_, Book>::new(store, &config.binding);
            let service = BookService::new(repo);
            run_round(&service)?;
        }
    }

    info!("event=cli_round module=cli status=ok backend={}", config.backend);
    Ok(())
}

fn run_round<R: Repository<Book>>(service: &BookService<R>) -> Result<(), Box<dyn Error>> {
    let created = service.create_book(Book::new("Dune").with_author("Frank Herbert"))?;
    let id = created.meta.id.clone().unwrap_or_default();
    println!("created id={id} title={}", created.title);

    let mut revised = created;
    revised.title = "Dune Messiah".to_string();
    let updated = service.update_book(revised)?;
    println!("updated id={id} title={}", updated.title);

    println!("live_count={}", service.get_all_books()?.len());

    service.retire_book(&id)?;
    println!(
        "retired id={id} visible={}",
        service.get_book(&id)?.is_some()
    );

    service.delete_book(&id)?;
    println!("deleted id={id}");
    Ok(())
}
