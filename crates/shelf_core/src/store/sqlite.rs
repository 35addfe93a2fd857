//! SQLite-backed document store.
//!
//! # Responsibility
//! - Persist JSON documents per namespace in the `documents` table.
//! - Translate [`Filter`] into SQL using SQLite JSON functions.
//!
//! # Invariants
//! - Only migrated connections are accepted.
//! - `doc_id` mirrors the body's `_id` on every write.
//! - Store order is insertion order (`seq`).

use super::{
    document_id, DeleteResult, Document, DocumentStore, Filter, InsertOneResult, Namespace,
    ReplaceResult, StoreError, StoreResult,
};
use crate::db::migrations::{current_version, latest_version};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

const DOCUMENTS_TABLE: &str = "documents";

/// Document store over a borrowed, migrated SQLite connection.
pub struct SqliteDocumentStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDocumentStore<'conn> {
    /// Wraps a connection produced by [`crate::db::open_db`] or
    /// [`crate::db::open_db_in_memory`].
    ///
    /// # Errors
    /// - `UninitializedConnection` when the schema version does not match.
    /// - `MissingRequiredTable` when `documents` is absent.
    pub fn try_new(conn: &'conn Connection) -> StoreResult<Self> {
        let expected_version = latest_version();
        let actual_version = current_version(conn)?;
        if actual_version != expected_version {
            return Err(StoreError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        let exists: i64 = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1
            );",
            [DOCUMENTS_TABLE],
            |row| row.get(0),
        )?;
        if exists == 0 {
            return Err(StoreError::MissingRequiredTable(DOCUMENTS_TABLE));
        }

        Ok(Self { conn })
    }

    fn select(
        &self,
        ns: &Namespace,
        filter: &Filter,
        limit: Option<u32>,
    ) -> StoreResult<Vec<Document>> {
        let mut binds = namespace_binds(ns);
        let mut sql = String::from(
            "SELECT seq, body FROM documents
             WHERE database_name = ? AND collection_name = ? AND ",
        );
        compile_filter(filter, &mut sql, &mut binds);
        sql.push_str(" ORDER BY seq ASC");
        if let Some(limit) = limit {
            sql.push_str(" LIMIT ?");
            binds.push(Value::Integer(i64::from(limit)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        let mut documents = Vec::new();
        while let Some(row) = rows.next()? {
            let seq: i64 = row.get(0)?;
            let body: String = row.get(1)?;
            documents.push(parse_body(ns, seq, &body)?);
        }
        Ok(documents)
    }
}

impl DocumentStore for SqliteDocumentStore<'_> {
    fn insert(&self, ns: &Namespace, document: Document) -> StoreResult<InsertOneResult> {
        let inserted_id = document_id(&document).map(str::to_owned);
        let body = serde_json::to_string(&document)?;

        let changed = self.conn.execute(
            "INSERT INTO documents (database_name, collection_name, doc_id, body)
             VALUES (?1, ?2, ?3, ?4);",
            rusqlite::params![
                ns.database.as_str(),
                ns.collection.as_str(),
                inserted_id.as_deref(),
                body,
            ],
        )?;

        Ok(InsertOneResult {
            acknowledged: changed == 1,
            inserted_id,
        })
    }

    fn replace(
        &self,
        ns: &Namespace,
        filter: &Filter,
        document: Document,
    ) -> StoreResult<ReplaceResult> {
        let body = serde_json::to_string(&document)?;
        let mut binds = vec![
            document_id(&document).map_or(Value::Null, |id| Value::Text(id.to_owned())),
            Value::Text(body),
        ];
        binds.extend(namespace_binds(ns));

        let mut sql = String::from(
            "UPDATE documents SET doc_id = ?, body = ?
             WHERE database_name = ? AND collection_name = ? AND ",
        );
        compile_filter(filter, &mut sql, &mut binds);

        let changed = self.conn.execute(&sql, params_from_iter(binds))?;
        Ok(ReplaceResult {
            modified_count: changed as u64,
        })
    }

    fn delete_by_filter(&self, ns: &Namespace, filter: &Filter) -> StoreResult<DeleteResult> {
        let mut binds = namespace_binds(ns);
        let mut sql = String::from(
            "DELETE FROM documents WHERE database_name = ? AND collection_name = ? AND ",
        );
        compile_filter(filter, &mut sql, &mut binds);

        let changed = self.conn.execute(&sql, params_from_iter(binds))?;
        Ok(DeleteResult {
            deleted_count: changed as u64,
        })
    }

    fn find_by_filter(&self, ns: &Namespace, filter: &Filter) -> StoreResult<Vec<Document>> {
        self.select(ns, filter, None)
    }

    fn find_one_by_filter(
        &self,
        ns: &Namespace,
        filter: &Filter,
    ) -> StoreResult<Option<Document>> {
        Ok(self.select(ns, filter, Some(1))?.into_iter().next())
    }
}

fn namespace_binds(ns: &Namespace) -> Vec<Value> {
    vec![
        Value::Text(ns.database.clone()),
        Value::Text(ns.collection.clone()),
    ]
}

fn compile_filter(filter: &Filter, sql: &mut String, binds: &mut Vec<Value>) {
    match filter {
        Filter::IdEquals(id) => {
            sql.push_str("doc_id = ?");
            binds.push(Value::Text(id.clone()));
        }
        Filter::Absent(field) => {
            // json_type yields NULL for a missing path and 'null' for a JSON null.
            sql.push_str("COALESCE(json_type(body, ?), 'null') = 'null'");
            binds.push(Value::Text(format!("$.\"{field}\"")));
        }
        Filter::And(filters) if filters.is_empty() => sql.push_str("1 = 1"),
        Filter::And(filters) => {
            sql.push('(');
            for (index, inner) in filters.iter().enumerate() {
                if index > 0 {
                    sql.push_str(" AND ");
                }
                compile_filter(inner, sql, binds);
            }
            sql.push(')');
        }
    }
}

fn parse_body(ns: &Namespace, seq: i64, body: &str) -> StoreResult<Document> {
    match serde_json::from_str::<serde_json::Value>(body)? {
        serde_json::Value::Object(document) => Ok(document),
        _ => {
            debug!("event=document_decode module=store status=error ns={ns} seq={seq}");
            Err(StoreError::NotAnObject(format!("{ns}#{seq}")))
        }
    }
}
