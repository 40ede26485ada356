//! Cogs - compiled-in command groups
//!
//! Each cog registers its commands into the [`CommandService`] and holds a
//! handle to the persistence gateway. Handlers do argument parsing and reply
//! formatting only; every one of them boils down to a single gateway call.

pub mod leveling;
pub mod moderation;

use std::sync::Arc;

use crate::application::errors::{CommandError, DatabaseError};
use crate::application::services::CommandService;
use crate::domain::entities::Message;
use crate::infrastructure::database::Database;

/// Register every cog's commands.
pub fn register_all(commands: &mut CommandService, db: Arc<Database>) {
    moderation::register(commands, Arc::clone(&db));
    leveling::register(commands, db);
}

/// Map a gateway failure to a user-facing reply.
///
/// Entity-shape failures get specific wording; `Unavailable` stays generic
/// because the detail was already logged at the gateway boundary.
fn describe_failure(err: &DatabaseError) -> String {
    match err {
        DatabaseError::NotFound(uid) => format!("No database entry for user {}.", uid),
        DatabaseError::DuplicateKey(uid) => format!("User {} already has an entry.", uid),
        DatabaseError::Precondition(reason) => format!("Invalid request: {}.", reason),
        DatabaseError::Unavailable => {
            "The database did not respond. Please try again later.".to_string()
        }
    }
}

/// Resolve the uid a command targets: the first argument if given, the
/// caller otherwise.
fn target_uid(msg: &Message, args: &[String]) -> Result<i64, CommandError> {
    match args.first() {
        Some(raw) => raw
            .parse()
            .map_err(|_| CommandError::InvalidArgs(format!("'{}' is not a user id", raw))),
        None => msg
            .sender_uid()
            .ok_or_else(|| CommandError::InvalidArgs("no user id given".to_string())),
    }
}
