//! Persistence gateway - the single access point to the document store
//!
//! All user and mute bookkeeping goes through [`Database`]. It owns the store
//! handle for the process lifetime; consumers get an `Arc<Database>` at
//! startup and never touch the store directly.
//!
//! Error policy: entity-shape failures (`NotFound`, `DuplicateKey`,
//! `Precondition`) go back to the caller typed, so commands can word a
//! specific reply. Anything unexpected from the store is logged here and
//! collapsed to [`DatabaseError::Unavailable`] - callers learn the operation
//! did not complete, nothing about the storage technology.

#[cfg(test)]
mod tests;

use std::sync::Arc;

use chrono::{DateTime, Timelike, Utc};

use crate::application::errors::{DatabaseError, StoreError};
use crate::domain::entities::{MuteRecord, UserRecord};
use crate::domain::traits::DocumentStore;
use crate::infrastructure::config::DatabaseConfig;

/// Storage key for the xp field. Existing collections use `exp`, so the
/// asymmetry with [`UserRecord::xp`] is kept on purpose.
const XP_FIELD: &str = "exp";
const KARMA_FIELD: &str = "karma";

pub struct Database {
    store: Arc<dyn DocumentStore>,
    users: String,
    mutes: String,
}

impl Database {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        users_collection: impl Into<String>,
        mutes_collection: impl Into<String>,
    ) -> Self {
        Self {
            store,
            users: users_collection.into(),
            mutes: mutes_collection.into(),
        }
    }

    pub fn from_config(store: Arc<dyn DocumentStore>, config: &DatabaseConfig) -> Self {
        Self::new(
            store,
            config.users_collection.clone(),
            config.mutes_collection.clone(),
        )
    }

    /// Log an unexpected store failure and hand back the generic signal.
    fn store_failure(&self, op: &str, e: StoreError) -> DatabaseError {
        tracing::error!("Store operation '{}' failed: {}", op, e);
        DatabaseError::Unavailable
    }

    // Users collection

    /// Add a new user with default stats.
    ///
    /// The store's unique index on `uid` is what rejects duplicates; nothing
    /// is pre-checked here.
    pub fn add_user(&self, uid: i64) -> Result<(), DatabaseError> {
        let record = UserRecord::new(uid);
        match self.store.insert_one(&self.users, record.to_document()) {
            Ok(()) => {
                tracing::info!("User {} added to the database", uid);
                Ok(())
            }
            Err(StoreError::Duplicate { .. }) => Err(DatabaseError::DuplicateKey(uid)),
            Err(e) => Err(self.store_failure("add_user", e)),
        }
    }

    /// Remove a user's record. No-op if none exists.
    pub fn delete_user(&self, uid: i64) -> Result<(), DatabaseError> {
        let deleted = self
            .store
            .delete_one(&self.users, uid)
            .map_err(|e| self.store_failure("delete_user", e))?;
        if deleted {
            tracing::info!("User {} removed from the database", uid);
        }
        Ok(())
    }

    pub fn get_user(&self, uid: i64) -> Result<UserRecord, DatabaseError> {
        let document = self
            .store
            .find_one(&self.users, uid)
            .map_err(|e| self.store_failure("get_user", e))?
            .ok_or(DatabaseError::NotFound(uid))?;

        UserRecord::from_document(&document).map_err(|e| {
            tracing::error!("Corrupt user document for uid {}: {}", uid, e);
            DatabaseError::Unavailable
        })
    }

    pub fn user_exists(&self, uid: i64) -> Result<bool, DatabaseError> {
        self.store
            .exists(&self.users, uid)
            .map_err(|e| self.store_failure("user_exists", e))
    }

    /// Replace every stored field of `uid` with the values in `record`.
    ///
    /// Full-overwrite semantics, and strictly an update: a missing uid is
    /// `NotFound`, never a silent insert.
    pub fn update_user(&self, uid: i64, record: &UserRecord) -> Result<(), DatabaseError> {
        let replaced = self
            .store
            .replace_one(&self.users, uid, record.to_document())
            .map_err(|e| self.store_failure("update_user", e))?;

        if replaced {
            Ok(())
        } else {
            Err(DatabaseError::NotFound(uid))
        }
    }

    /// Rank by xp: 1 + the number of users with strictly more xp. Tied users
    /// share a rank.
    pub fn get_user_xp_rank(&self, uid: i64) -> Result<u64, DatabaseError> {
        let user = self.get_user(uid)?;
        let greater = self
            .store
            .count_greater_than(&self.users, XP_FIELD, user.xp)
            .map_err(|e| self.store_failure("get_user_xp_rank", e))?;
        Ok(greater + 1)
    }

    /// Rank by karma, same contract as [`get_user_xp_rank`](Self::get_user_xp_rank).
    pub fn get_user_karma_rank(&self, uid: i64) -> Result<u64, DatabaseError> {
        let user = self.get_user(uid)?;
        let greater = self
            .store
            .count_greater_than(&self.users, KARMA_FIELD, user.karma)
            .map_err(|e| self.store_failure("get_user_karma_rank", e))?;
        Ok(greater + 1)
    }

    /// `count` users sorted descending by xp, starting at the 1-based
    /// `start_index`-th rank. Short pages are padded with placeholder
    /// records so the result always has length `count`.
    pub fn get_top_by_xp(&self, start_index: u64, count: u64) -> Result<Vec<UserRecord>, DatabaseError> {
        self.get_top(XP_FIELD, start_index, count)
    }

    /// Same as [`get_top_by_xp`](Self::get_top_by_xp), sorted by karma.
    pub fn get_top_by_karma(
        &self,
        start_index: u64,
        count: u64,
    ) -> Result<Vec<UserRecord>, DatabaseError> {
        self.get_top(KARMA_FIELD, start_index, count)
    }

    fn get_top(
        &self,
        field: &'static str,
        start_index: u64,
        count: u64,
    ) -> Result<Vec<UserRecord>, DatabaseError> {
        let total = self
            .store
            .count(&self.users)
            .map_err(|e| self.store_failure("get_top", e))?;

        // Out-of-range pages come from live chat input, so they are a
        // recoverable error rather than an assertion
        if start_index == 0 {
            return Err(DatabaseError::Precondition(
                "start index is 1-based".to_string(),
            ));
        }
        if start_index >= total {
            return Err(DatabaseError::Precondition(format!(
                "start index {} is past the user count {}",
                start_index, total
            )));
        }

        let documents = self
            .store
            .find_sorted(&self.users, field, start_index - 1, count)
            .map_err(|e| self.store_failure("get_top", e))?;

        let mut top = Vec::with_capacity(count as usize);
        for document in &documents {
            let record = UserRecord::from_document(document).map_err(|e| {
                tracing::error!("Corrupt user document in '{}' ranking: {}", field, e);
                DatabaseError::Unavailable
            })?;
            top.push(record);
        }

        while (top.len() as u64) < count {
            top.push(UserRecord::default());
        }

        Ok(top)
    }

    /// Drop every user record. Test and admin use only - nothing routes a
    /// chat command here.
    pub fn clear_all_users(&self) -> Result<(), DatabaseError> {
        let removed = self
            .store
            .delete_all(&self.users)
            .map_err(|e| self.store_failure("clear_all_users", e))?;
        tracing::info!("Cleared the users collection ({} records)", removed);
        Ok(())
    }

    // Mutes collection

    /// Record a mute. The expiration is truncated to whole seconds before
    /// storage; sub-second precision is deliberately discarded.
    pub fn add_mute(&self, uid: i64, expires_at: DateTime<Utc>) -> Result<(), DatabaseError> {
        let truncated = expires_at.with_nanosecond(0).unwrap_or(expires_at);
        let record = MuteRecord::new(uid, truncated);

        match self.store.insert_one(&self.mutes, record.to_document()) {
            Ok(()) => {
                tracing::info!("Mute {} until {} added to the database", uid, truncated);
                Ok(())
            }
            Err(StoreError::Duplicate { .. }) => Err(DatabaseError::DuplicateKey(uid)),
            Err(e) => Err(self.store_failure("add_mute", e)),
        }
    }

    /// Remove a mute record. No-op if none exists.
    pub fn delete_mute(&self, uid: i64) -> Result<(), DatabaseError> {
        let deleted = self
            .store
            .delete_one(&self.mutes, uid)
            .map_err(|e| self.store_failure("delete_mute", e))?;
        if deleted {
            tracing::info!("Mute {} removed from the database", uid);
        }
        Ok(())
    }

    /// Every mute record, in no defined order. Callers wanting chronological
    /// processing sort on their side.
    pub fn get_all_mutes(&self) -> Result<Vec<MuteRecord>, DatabaseError> {
        let documents = self
            .store
            .find_all(&self.mutes)
            .map_err(|e| self.store_failure("get_all_mutes", e))?;

        let mut mutes = Vec::with_capacity(documents.len());
        for document in &documents {
            let record = MuteRecord::from_document(document).map_err(|e| {
                tracing::error!("Corrupt mute document: {}", e);
                DatabaseError::Unavailable
            })?;
            mutes.push(record);
        }
        Ok(mutes)
    }

    pub fn mute_exists(&self, uid: i64) -> Result<bool, DatabaseError> {
        self.store
            .exists(&self.mutes, uid)
            .map_err(|e| self.store_failure("mute_exists", e))
    }

    /// Drop every mute record. Test and admin use only.
    pub fn clear_all_mutes(&self) -> Result<(), DatabaseError> {
        let removed = self
            .store
            .delete_all(&self.mutes)
            .map_err(|e| self.store_failure("clear_all_mutes", e))?;
        tracing::info!("Cleared the mutes collection ({} records)", removed);
        Ok(())
    }
}
