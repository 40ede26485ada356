//! In-memory document store, the test double for the sqlite store

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::application::errors::StoreError;
use crate::domain::entities::Document;
use crate::domain::traits::store::{document_uid, DocumentStore};

type Collections = HashMap<String, BTreeMap<i64, Document>>;

/// Document store held entirely in process memory
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Collections>, StoreError> {
        self.collections
            .read()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Collections>, StoreError> {
        self.collections
            .write()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
    }
}

fn field_value(document: &Document, field: &str) -> i64 {
    document.get(field).and_then(|v| v.as_i64()).unwrap_or(i64::MIN)
}

impl DocumentStore for MemoryStore {
    fn insert_one(&self, collection: &str, document: Document) -> Result<(), StoreError> {
        let uid = document_uid(&document)?;
        let mut collections = self.write()?;
        let docs = collections.entry(collection.to_string()).or_default();

        if docs.contains_key(&uid) {
            return Err(StoreError::Duplicate {
                collection: collection.to_string(),
                uid,
            });
        }
        docs.insert(uid, document);
        Ok(())
    }

    fn find_one(&self, collection: &str, uid: i64) -> Result<Option<Document>, StoreError> {
        let collections = self.read()?;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(&uid))
            .cloned())
    }

    fn find_all(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let collections = self.read()?;
        Ok(collections
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default())
    }

    fn find_sorted(
        &self,
        collection: &str,
        field: &str,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.read()?;
        let mut docs: Vec<Document> = collections
            .get(collection)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default();

        docs.sort_by_key(|d| Reverse(field_value(d, field)));
        Ok(docs
            .into_iter()
            .skip(skip as usize)
            .take(limit as usize)
            .collect())
    }

    fn replace_one(
        &self,
        collection: &str,
        uid: i64,
        document: Document,
    ) -> Result<bool, StoreError> {
        let mut collections = self.write()?;
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(false);
        };
        // Replace only - a missing document stays missing
        match docs.get_mut(&uid) {
            Some(slot) => {
                *slot = document;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn delete_one(&self, collection: &str, uid: i64) -> Result<bool, StoreError> {
        let mut collections = self.write()?;
        Ok(collections
            .get_mut(collection)
            .map(|docs| docs.remove(&uid).is_some())
            .unwrap_or(false))
    }

    fn delete_all(&self, collection: &str) -> Result<u64, StoreError> {
        let mut collections = self.write()?;
        Ok(collections
            .get_mut(collection)
            .map(|docs| {
                let removed = docs.len() as u64;
                docs.clear();
                removed
            })
            .unwrap_or(0))
    }

    fn count(&self, collection: &str) -> Result<u64, StoreError> {
        let collections = self.read()?;
        Ok(collections
            .get(collection)
            .map(|docs| docs.len() as u64)
            .unwrap_or(0))
    }

    fn count_greater_than(
        &self,
        collection: &str,
        field: &str,
        value: i64,
    ) -> Result<u64, StoreError> {
        let collections = self.read()?;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.values()
                    .filter(|d| field_value(d, field) > value)
                    .count() as u64
            })
            .unwrap_or(0))
    }

    fn exists(&self, collection: &str, uid: i64) -> Result<bool, StoreError> {
        let collections = self.read()?;
        Ok(collections
            .get(collection)
            .map(|docs| docs.contains_key(&uid))
            .unwrap_or(false))
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
    fn duplicate_uid_is_rejected() {
        let store = MemoryStore::new();
        store.insert_one("c", doc(1, 10)).unwrap();
        assert!(matches!(
            store.insert_one("c", doc(1, 20)),
            Err(StoreError::Duplicate { uid: 1, .. })
        ));
        // Original document untouched
        let stored = store.find_one("c", 1).unwrap().unwrap();
        assert_eq!(stored.get("score").unwrap().as_i64(), Some(10));
    }

    #[test]
    fn replace_never_inserts() {
        let store = MemoryStore::new();
        assert!(!store.replace_one("c", 1, doc(1, 10)).unwrap());
        assert!(store.find_one("c", 1).unwrap().is_none());
    }

    #[test]
    fn sorted_query_descends_with_skip_and_limit() {
        let store = MemoryStore::new();
        for (uid, score) in [(1, 5), (2, 50), (3, 20)] {
            store.insert_one("c", doc(uid, score)).unwrap();
        }

        let page = store.find_sorted("c", "score", 1, 2).unwrap();
        let uids: Vec<i64> = page
            .iter()
            .map(|d| d.get("uid").unwrap().as_i64().unwrap())
            .collect();
        assert_eq!(uids, vec![3, 1]);
    }

    #[test]
    fn collections_are_isolated() {
        let store = MemoryStore::new();
        store.insert_one("a", doc(1, 1)).unwrap();
        store.insert_one("b", doc(1, 1)).unwrap();

        store.delete_all("a").unwrap();
        assert_eq!(store.count("a").unwrap(), 0);
        assert_eq!(store.count("b").unwrap(), 1);
    }
}
