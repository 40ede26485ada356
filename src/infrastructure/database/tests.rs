//! Gateway tests, run against both store implementations

use std::sync::Arc;

use chrono::{TimeZone, Timelike, Utc};

use crate::application::errors::DatabaseError;
use crate::domain::entities::UserRecord;
use crate::domain::traits::DocumentStore;
use crate::infrastructure::database::Database;
use crate::infrastructure::storage::{MemoryStore, SqliteStore};

fn databases() -> Vec<Database> {
    let memory: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let sqlite: Arc<dyn DocumentStore> =
        Arc::new(SqliteStore::open_in_memory().expect("in-memory store"));
    vec![
        Database::new(memory, "users", "mutes"),
        Database::new(sqlite, "users", "mutes"),
    ]
}

#[test]
fn unknown_user_is_absent_and_not_found() {
    for db in databases() {
        assert!(!db.user_exists(123456).unwrap());
        assert_eq!(db.get_user(123456), Err(DatabaseError::NotFound(123456)));
    }
}

#[test]
fn added_user_has_default_stats() {
    for db in databases() {
        db.add_user(123456).unwrap();
        assert!(db.user_exists(123456).unwrap());

        let user = db.get_user(123456).unwrap();
        assert_eq!(user.uid, 123456);
        assert_eq!(user.karma, 0);
        assert_eq!(user.xp, 0);
        assert_eq!(user.level, 1);
        assert_eq!(user.udc, 0);
    }
}

#[test]
fn adding_twice_is_a_duplicate_and_keeps_the_original() {
    for db in databases() {
        db.add_user(1).unwrap();

        let mut changed = db.get_user(1).unwrap();
        changed.xp = 77;
        db.update_user(1, &changed).unwrap();

        assert_eq!(db.add_user(1), Err(DatabaseError::DuplicateKey(1)));
        assert_eq!(db.get_user(1).unwrap().xp, 77);
    }
}

#[test]
fn delete_user_is_idempotent() {
    for db in databases() {
        db.add_user(1).unwrap();
        db.delete_user(1).unwrap();
        assert!(!db.user_exists(1).unwrap());

        // Second delete is a no-op, not an error
        db.delete_user(1).unwrap();
    }
}

#[test]
fn update_replaces_every_field() {
    for db in databases() {
        db.add_user(1).unwrap();

        let record = UserRecord {
            uid: 1,
            karma: -3,
            xp: 450,
            level: 4,
            udc: 9,
        };
        db.update_user(1, &record).unwrap();
        assert_eq!(db.get_user(1).unwrap(), record);
    }
}

#[test]
fn update_of_missing_user_never_upserts() {
    for db in databases() {
        let record = UserRecord::new(42);
        assert_eq!(db.update_user(42, &record), Err(DatabaseError::NotFound(42)));
        assert!(!db.user_exists(42).unwrap());
    }
}

fn seed_ranked_users(db: &Database) {
    // A and B tie on xp, C trails
    for (uid, xp, karma) in [(1, 5, 2), (2, 5, 9), (3, 1, 4)] {
        db.add_user(uid).unwrap();
        let mut record = db.get_user(uid).unwrap();
        record.xp = xp;
        record.karma = karma;
        db.update_user(uid, &record).unwrap();
    }
}

#[test]
fn rank_counts_strictly_greater_values() {
    for db in databases() {
        seed_ranked_users(&db);

        // Two users above C's xp of 1
        assert_eq!(db.get_user_xp_rank(3).unwrap(), 3);
        // Tied users share the top rank
        assert_eq!(db.get_user_xp_rank(1).unwrap(), 1);
        assert_eq!(db.get_user_xp_rank(2).unwrap(), 1);

        assert_eq!(db.get_user_karma_rank(2).unwrap(), 1);
        assert_eq!(db.get_user_karma_rank(3).unwrap(), 2);
        assert_eq!(db.get_user_karma_rank(1).unwrap(), 3);
    }
}

#[test]
fn rank_of_unknown_user_is_not_found() {
    for db in databases() {
        seed_ranked_users(&db);
        assert_eq!(db.get_user_xp_rank(99), Err(DatabaseError::NotFound(99)));
        assert_eq!(db.get_user_karma_rank(99), Err(DatabaseError::NotFound(99)));
    }
}

#[test]
fn short_leaderboard_pages_are_padded_with_placeholders() {
    for db in databases() {
        for (uid, xp) in [(1, 10), (2, 30)] {
            db.add_user(uid).unwrap();
            let mut record = db.get_user(uid).unwrap();
            record.xp = xp;
            db.update_user(uid, &record).unwrap();
        }

        let page = db.get_top_by_xp(1, 5).unwrap();
        assert_eq!(page.len(), 5);
        assert_eq!(page[0].uid, 2);
        assert_eq!(page[1].uid, 1);
        for placeholder in &page[2..] {
            assert_eq!(placeholder, &UserRecord::default());
        }
    }
}

#[test]
fn leaderboard_pages_honor_the_start_index() {
    for db in databases() {
        seed_ranked_users(&db);

        let page = db.get_top_by_karma(2, 2).unwrap();
        assert_eq!(page[0].uid, 3);
        assert_eq!(page[1].uid, 1);
    }
}

#[test]
fn out_of_range_start_index_is_a_precondition_error() {
    for db in databases() {
        seed_ranked_users(&db);

        assert!(matches!(
            db.get_top_by_xp(0, 5),
            Err(DatabaseError::Precondition(_))
        ));
        assert!(matches!(
            db.get_top_by_xp(3, 5),
            Err(DatabaseError::Precondition(_))
        ));
    }
}

#[test]
fn empty_collection_has_no_valid_start_index() {
    for db in databases() {
        assert!(matches!(
            db.get_top_by_xp(1, 5),
            Err(DatabaseError::Precondition(_))
        ));
    }
}

#[test]
fn mute_expiration_is_stored_at_second_precision() {
    for db in databases() {
        let precise = Utc
            .with_ymd_and_hms(2024, 5, 1, 12, 0, 0)
            .unwrap()
            .with_nanosecond(734_521_000)
            .unwrap();

        db.add_mute(7, precise).unwrap();
        assert!(db.mute_exists(7).unwrap());

        let mutes = db.get_all_mutes().unwrap();
        assert_eq!(mutes.len(), 1);
        assert_eq!(mutes[0].uid, 7);
        assert_eq!(
            mutes[0].expires_at,
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
        );
    }
}

#[test]
fn double_mute_is_a_duplicate() {
    for db in databases() {
        let t = Utc::now();
        db.add_mute(7, t).unwrap();
        assert_eq!(db.add_mute(7, t), Err(DatabaseError::DuplicateKey(7)));
    }
}

#[test]
fn delete_mute_is_idempotent() {
    for db in databases() {
        db.add_mute(7, Utc::now()).unwrap();
        db.delete_mute(7).unwrap();
        assert!(!db.mute_exists(7).unwrap());

        db.delete_mute(7).unwrap();
    }
}

#[test]
fn clearing_one_collection_leaves_the_other_alone() {
    for db in databases() {
        db.add_user(1).unwrap();
        db.add_mute(1, Utc::now()).unwrap();

        db.clear_all_users().unwrap();
        assert!(!db.user_exists(1).unwrap());
        assert!(db.mute_exists(1).unwrap());

        db.add_user(2).unwrap();
        db.clear_all_mutes().unwrap();
        assert!(db.get_all_mutes().unwrap().is_empty());
        assert!(db.user_exists(2).unwrap());
    }
}

#[test]
fn user_and_mute_records_are_keyed_independently() {
    for db in databases() {
        db.add_user(5).unwrap();
        db.add_mute(5, Utc::now()).unwrap();

        db.delete_user(5).unwrap();
        // The mute references the uid but has no foreign-key tie
        assert!(db.mute_exists(5).unwrap());
    }
}
