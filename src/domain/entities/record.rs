//! Stored record types - typed mirrors of the documents in the store

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::application::errors::RecordError;

/// Generic string-keyed document, the unit the store persists
pub type Document = serde_json::Map<String, Value>;

fn require_i64(data: &Document, key: &'static str) -> Result<i64, RecordError> {
    let value = data.get(key).ok_or(RecordError::MissingField(key))?;
    value.as_i64().ok_or(RecordError::InvalidField(key))
}

/// Per-user gamification stats, one document per registered member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub uid: i64,
    pub karma: i64,
    pub xp: i64,
    pub level: i64,
    pub udc: i64,
}

impl UserRecord {
    /// A freshly registered user starts at level 1 with zeroed counters
    pub fn new(uid: i64) -> Self {
        Self {
            uid,
            karma: 0,
            xp: 0,
            level: 1,
            udc: 0,
        }
    }

    /// Convert to a storable document.
    ///
    /// The `xp` field is persisted under the key `exp` - existing collections
    /// were written with that name, so it stays.
    pub fn to_document(&self) -> Document {
        let mut data = Document::new();
        data.insert("uid".to_string(), Value::from(self.uid));
        data.insert("karma".to_string(), Value::from(self.karma));
        data.insert("exp".to_string(), Value::from(self.xp));
        data.insert("level".to_string(), Value::from(self.level));
        data.insert("udc".to_string(), Value::from(self.udc));
        data
    }

    /// Rebuild from a stored document. Every key must be present - a document
    /// missing fields is corrupt, not a record with defaults.
    pub fn from_document(data: &Document) -> Result<Self, RecordError> {
        Ok(Self {
            uid: require_i64(data, "uid")?,
            karma: require_i64(data, "karma")?,
            xp: require_i64(data, "exp")?,
            level: require_i64(data, "level")?,
            udc: require_i64(data, "udc")?,
        })
    }
}

impl Default for UserRecord {
    /// The zero/placeholder record used to pad short leaderboard pages
    fn default() -> Self {
        Self {
            uid: 0,
            karma: 0,
            xp: 0,
            level: 0,
            udc: 0,
        }
    }
}

/// An active mute, one document per currently muted member.
///
/// Presence of the record means "muted"; expiry is enforced by whoever polls
/// [`get_all_mutes`](crate::infrastructure::database::Database::get_all_mutes),
/// not by this layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MuteRecord {
    pub uid: i64,
    pub expires_at: DateTime<Utc>,
}

impl MuteRecord {
    pub fn new(uid: i64, expires_at: DateTime<Utc>) -> Self {
        Self { uid, expires_at }
    }

    /// Convert to a storable document. The expiration is stored as epoch
    /// seconds, which discards any sub-second precision.
    pub fn to_document(&self) -> Document {
        let mut data = Document::new();
        data.insert("uid".to_string(), Value::from(self.uid));
        data.insert(
            "expiration_date".to_string(),
            Value::from(self.expires_at.timestamp()),
        );
        data
    }

    pub fn from_document(data: &Document) -> Result<Self, RecordError> {
        let secs = require_i64(data, "expiration_date")?;
        let expires_at = Utc
            .timestamp_opt(secs, 0)
            .single()
            .ok_or(RecordError::InvalidField("expiration_date"))?;

        Ok(Self {
            uid: require_i64(data, "uid")?,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn user_record_round_trip() {
        let record = UserRecord {
            uid: 123456,
            karma: -4,
            xp: 950,
            level: 7,
            udc: 2,
        };

        let restored = UserRecord::from_document(&record.to_document()).unwrap();
        assert_eq!(restored, record);
    }

    #[test]
    fn user_record_xp_stored_as_exp() {
        let doc = UserRecord::new(42).to_document();
        assert!(doc.contains_key("exp"));
        assert!(!doc.contains_key("xp"));
    }

    #[test]
    fn user_record_missing_field() {
        let mut doc = UserRecord::new(42).to_document();
        doc.remove("karma");

        let err = UserRecord::from_document(&doc).unwrap_err();
        assert!(matches!(err, RecordError::MissingField("karma")));
    }

    #[test]
    fn user_record_non_integer_field() {
        let mut doc = UserRecord::new(42).to_document();
        doc.insert("level".to_string(), Value::from("seven"));

        let err = UserRecord::from_document(&doc).unwrap_err();
        assert!(matches!(err, RecordError::InvalidField("level")));
    }

    #[test]
    fn placeholder_is_all_zero() {
        let placeholder = UserRecord::default();
        assert_eq!(placeholder.uid, 0);
        assert_eq!(placeholder.level, 0);
    }

    #[test]
    fn fresh_user_starts_at_level_one() {
        let user = UserRecord::new(99);
        assert_eq!(user.level, 1);
        assert_eq!(user.xp, 0);
    }

    #[test]
    fn mute_record_truncates_to_seconds() {
        let precise = Utc
            .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
            .unwrap()
            .with_nanosecond(734_521_000)
            .unwrap();
        let mute = MuteRecord::new(7, precise);

        let restored = MuteRecord::from_document(&mute.to_document()).unwrap();
        assert_eq!(restored.uid, 7);
        assert_eq!(
            restored.expires_at,
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn mute_record_missing_expiration() {
        let mut doc = MuteRecord::new(7, Utc::now()).to_document();
        doc.remove("expiration_date");

        let err = MuteRecord::from_document(&doc).unwrap_err();
        assert!(matches!(err, RecordError::MissingField("expiration_date")));
    }
}
