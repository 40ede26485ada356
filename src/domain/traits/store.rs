//! DocumentStore trait - abstraction over the document store engine

use crate::application::errors::StoreError;
use crate::domain::entities::Document;

/// Collection-scoped access to a document store.
///
/// Documents are keyed by their integer `uid` field; every implementation
/// enforces a unique index on `(collection, uid)` and reports a violation as
/// [`StoreError::Duplicate`] rather than expecting callers to pre-check.
///
/// All calls are blocking. The gateway issues them one at a time from the
/// bot's event loop; there is no batching and no cross-call transaction.
pub trait DocumentStore: Send + Sync {
    /// Insert a document into a collection. The document must carry a `uid`.
    fn insert_one(&self, collection: &str, document: Document) -> Result<(), StoreError>;

    /// Fetch the document keyed by `uid`, if present.
    fn find_one(&self, collection: &str, uid: i64) -> Result<Option<Document>, StoreError>;

    /// Fetch every document in a collection, in no defined order.
    fn find_all(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// Fetch documents sorted descending by the named integer field,
    /// skipping `skip` documents and returning at most `limit`.
    fn find_sorted(
        &self,
        collection: &str,
        field: &str,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<Document>, StoreError>;

    /// Replace the document keyed by `uid` wholesale. Returns false if no
    /// document existed; never inserts.
    fn replace_one(&self, collection: &str, uid: i64, document: Document)
        -> Result<bool, StoreError>;

    /// Delete the document keyed by `uid`. Returns false if none existed.
    fn delete_one(&self, collection: &str, uid: i64) -> Result<bool, StoreError>;

    /// Delete every document in a collection, returning how many went.
    fn delete_all(&self, collection: &str) -> Result<u64, StoreError>;

    /// Number of documents in a collection.
    fn count(&self, collection: &str) -> Result<u64, StoreError>;

    /// Number of documents whose named integer field is strictly greater
    /// than `value`.
    fn count_greater_than(
        &self,
        collection: &str,
        field: &str,
        value: i64,
    ) -> Result<u64, StoreError>;

    /// Presence check for `uid`.
    fn exists(&self, collection: &str, uid: i64) -> Result<bool, StoreError>;
}

/// Pull the `uid` key out of a document about to be stored.
pub(crate) fn document_uid(document: &Document) -> Result<i64, StoreError> {
    document
        .get("uid")
        .and_then(|v| v.as_i64())
        .ok_or_else(|| StoreError::Serialization("document has no integer uid".to_string()))
}
