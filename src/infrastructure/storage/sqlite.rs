//! Sqlite-backed document store
//!
//! Documents live as JSON text in a single table keyed by
//! `(collection, uid)`; sorting and range counts go through `json_extract`.
//! One connection serves the whole process behind a mutex, opened once at
//! startup and dropped on shutdown.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection, ErrorCode};
use serde_json::Value;

use crate::application::errors::StoreError;
use crate::domain::entities::Document;
use crate::domain::traits::store::{document_uid, DocumentStore};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

fn backend(e: rusqlite::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn encode(document: &Document) -> Result<String, StoreError> {
    serde_json::to_string(document).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn decode(data: &str) -> Result<Document, StoreError> {
    let value: Value =
        serde_json::from_str(data).map_err(|e| StoreError::Serialization(e.to_string()))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(StoreError::Serialization(
            "stored document is not an object".to_string(),
        )),
    }
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(backend)?;
        Self::with_connection(conn)
    }

    /// Throwaway store for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(backend)?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                uid INTEGER NOT NULL,
                data TEXT NOT NULL,
                PRIMARY KEY (collection, uid)
            )",
            [],
        )
        .map_err(backend)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Backend("connection lock poisoned".to_string()))
    }
}

impl DocumentStore for SqliteStore {
    fn insert_one(&self, collection: &str, document: Document) -> Result<(), StoreError> {
        let uid = document_uid(&document)?;
        let data = encode(&document)?;
        let conn = self.conn()?;

        let result = conn.execute(
            "INSERT INTO documents (collection, uid, data) VALUES (?1, ?2, ?3)",
            params![collection, uid, data],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::Duplicate {
                    collection: collection.to_string(),
                    uid,
                })
            }
            Err(e) => Err(backend(e)),
        }
    }

    fn find_one(&self, collection: &str, uid: i64) -> Result<Option<Document>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT data FROM documents WHERE collection = ?1 AND uid = ?2")
            .map_err(backend)?;

        let mut rows = stmt.query(params![collection, uid]).map_err(backend)?;
        match rows.next().map_err(backend)? {
            Some(row) => {
                let data: String = row.get(0).map_err(backend)?;
                Ok(Some(decode(&data)?))
            }
            None => Ok(None),
        }
    }

    fn find_all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT data FROM documents WHERE collection = ?1")
            .map_err(backend)?;

        let rows = stmt
            .query_map(params![collection], |row| row.get::<_, String>(0))
            .map_err(backend)?;

        let mut documents = Vec::new();
        for data in rows {
            documents.push(decode(&data.map_err(backend)?)?);
        }
        Ok(documents)
    }

    fn find_sorted(
        &self,
        collection: &str,
        field: &str,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<Document>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT data FROM documents WHERE collection = ?1
                 ORDER BY CAST(json_extract(data, '$.' || ?2) AS INTEGER) DESC
                 LIMIT ?3 OFFSET ?4",
            )
            .map_err(backend)?;

        let rows = stmt
            .query_map(params![collection, field, limit, skip], |row| {
                row.get::<_, String>(0)
            })
            .map_err(backend)?;

        let mut documents = Vec::new();
        for data in rows {
            documents.push(decode(&data.map_err(backend)?)?);
        }
        Ok(documents)
    }

    fn replace_one(
        &self,
        collection: &str,
        uid: i64,
        document: Document,
    ) -> Result<bool, StoreError> {
        let data = encode(&document)?;
        let conn = self.conn()?;

        // UPDATE touches nothing when the row is absent, which is exactly
        // the no-upsert contract
        let changed = conn
            .execute(
                "UPDATE documents SET data = ?3 WHERE collection = ?1 AND uid = ?2",
                params![collection, uid, data],
            )
            .map_err(backend)?;
        Ok(changed > 0)
    }

    fn delete_one(&self, collection: &str, uid: i64) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        let deleted = conn
            .execute(
                "DELETE FROM documents WHERE collection = ?1 AND uid = ?2",
                params![collection, uid],
            )
            .map_err(backend)?;
        Ok(deleted > 0)
    }

    fn delete_all(&self, collection: &str) -> Result<u64, StoreError> {
        let conn = self.conn()?;
        let deleted = conn
            .execute("DELETE FROM documents WHERE collection = ?1", params![collection])
            .map_err(backend)?;
        Ok(deleted as u64)
    }

    fn count(&self, collection: &str) -> Result<u64, StoreError> {
        let conn = self.conn()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM documents WHERE collection = ?1",
                params![collection],
                |row| row.get(0),
            )
            .map_err(backend)?;
        Ok(count as u64)
    }

    fn count_greater_than(
        &self,
        collection: &str,
        field: &str,
        value: i64,
    ) -> Result<u64, StoreError> {
        let conn = self.conn()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM documents WHERE collection = ?1
                 AND CAST(json_extract(data, '$.' || ?2) AS INTEGER) > ?3",
                params![collection, field, value],
                |row| row.get(0),
            )
            .map_err(backend)?;
        Ok(count as u64)
    }

    fn exists(&self, collection: &str, uid: i64) -> Result<bool, StoreError> {
        let conn = self.conn()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM documents WHERE collection = ?1 AND uid = ?2",
                params![collection, uid],
                |row| row.get(0),
            )
            .map_err(backend)?;
        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn doc(uid: i64, score: i64) -> Document {
        let mut d = Document::new();
        d.insert("uid".to_string(), Value::from(uid));
        d.insert("score".to_string(), Value::from(score));
        d
    }

    #[test]
    fn insert_and_find() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_one("c", doc(1, 10)).unwrap();

        let stored = store.find_one("c", 1).unwrap().unwrap();
        assert_eq!(stored.get("score").unwrap().as_i64(), Some(10));
        assert!(store.find_one("c", 2).unwrap().is_none());
    }

    #[test]
    fn duplicate_uid_is_rejected() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_one("c", doc(1, 10)).unwrap();
        assert!(matches!(
            store.insert_one("c", doc(1, 20)),
            Err(StoreError::Duplicate { uid: 1, .. })
        ));
    }

    #[test]
    fn same_uid_in_two_collections_is_fine() {
        let store = SqliteStore::open_in_memory().unwrap();
        store.insert_one("a", doc(1, 10)).unwrap();
        store.insert_one("b", doc(1, 10)).unwrap();
        assert_eq!(store.count("a").unwrap(), 1);
        assert_eq!(store.count("b").unwrap(), 1);
    }

    #[test]
    fn sorted_query_uses_json_field() {
        let store = SqliteStore::open_in_memory().unwrap();
        for (uid, score) in [(1, 5), (2, 50), (3, 20)] {
            store.insert_one("c", doc(uid, score)).unwrap();
        }

        let page = store.find_sorted("c", "score", 0, 10).unwrap();
        let uids: Vec<i64> = page
            .iter()
            .map(|d| d.get("uid").unwrap().as_i64().unwrap())
            .collect();
        assert_eq!(uids, vec![2, 3, 1]);
    }

    #[test]
    fn count_greater_than_is_strict() {
        let store = SqliteStore::open_in_memory().unwrap();
        for (uid, score) in [(1, 5), (2, 5), (3, 1)] {
            store.insert_one("c", doc(uid, score)).unwrap();
        }
        assert_eq!(store.count_greater_than("c", "score", 5).unwrap(), 0);
        assert_eq!(store.count_greater_than("c", "score", 1).unwrap(), 2);
        assert_eq!(store.count_greater_than("c", "score", 0).unwrap(), 3);
    }

    #[test]
    fn replace_never_inserts() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(!store.replace_one("c", 1, doc(1, 10)).unwrap());
        store.insert_one("c", doc(1, 10)).unwrap();
        assert!(store.replace_one("c", 1, doc(1, 99)).unwrap());

        let stored = store.find_one("c", 1).unwrap().unwrap();
        assert_eq!(stored.get("score").unwrap().as_i64(), Some(99));
    }
}
