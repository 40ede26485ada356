//! Moderation cog - force-registration and mute bookkeeping

use std::sync::Arc;

use chrono::{Duration, Utc};

use super::{describe_failure, target_uid};
use crate::application::errors::CommandError;
use crate::application::services::CommandService;
use crate::domain::entities::{Command, Content};
use crate::infrastructure::database::Database;

pub fn register(commands: &mut CommandService, db: Arc<Database>) {
    register_dbadd(commands, Arc::clone(&db));
    register_mute(commands, Arc::clone(&db));
    register_unmute(commands, db);
}

/// `/dbadd [uid]` - force add a user to the database.
///
/// Normally registration happens elsewhere; this exists for members the bot
/// missed. Defaults to the caller when no uid is given.
fn register_dbadd(commands: &mut CommandService, db: Arc<Database>) {
    commands.register(
        Command::new("dbadd")
            .with_description("Force add a user to the database")
            .with_usage("/dbadd [uid]")
            .with_handler(move |msg| {
                let Content::Command { args, .. } = &msg.content else {
                    return Err(CommandError::InvalidArgs("not a command".to_string()));
                };
                let uid = target_uid(&msg, args)?;

                match db.add_user(uid) {
                    Ok(()) => Ok(format!("User {} added to the database.", uid)),
                    Err(e) => Ok(describe_failure(&e)),
                }
            }),
    );
}

/// `/mute <uid> <minutes>` - record a mute with an expiration.
///
/// Only the record is written here; the platform-side restriction and the
/// expiry sweep belong to whoever polls the mutes collection.
fn register_mute(commands: &mut CommandService, db: Arc<Database>) {
    commands.register(
        Command::new("mute")
            .with_description("Mute a user for a number of minutes")
            .with_usage("/mute <uid> <minutes>")
            .with_handler(move |msg| {
                let Content::Command { args, .. } = &msg.content else {
                    return Err(CommandError::InvalidArgs("not a command".to_string()));
                };
                if args.len() < 2 {
                    return Ok("Usage: /mute <uid> <minutes>".to_string());
                }

                let uid = target_uid(&msg, args)?;
                let minutes: i64 = args[1].parse().map_err(|_| {
                    CommandError::InvalidArgs(format!("'{}' is not a duration", args[1]))
                })?;
                if minutes <= 0 {
                    return Ok("Mute duration must be positive.".to_string());
                }

                let expires_at = Utc::now() + Duration::minutes(minutes);
                match db.add_mute(uid, expires_at) {
                    Ok(()) => Ok(format!("User {} muted for {} minutes.", uid, minutes)),
                    Err(e) => Ok(describe_failure(&e)),
                }
            }),
    );
}

/// `/unmute <uid>` - drop a mute record. Idempotent, like the gateway call.
fn register_unmute(commands: &mut CommandService, db: Arc<Database>) {
    commands.register(
        Command::new("unmute")
            .with_description("Unmute a user")
            .with_usage("/unmute <uid>")
            .with_handler(move |msg| {
                let Content::Command { args, .. } = &msg.content else {
                    return Err(CommandError::InvalidArgs("not a command".to_string()));
                };
                let uid = target_uid(&msg, args)?;

                match db.delete_mute(uid) {
                    Ok(()) => Ok(format!("User {} is no longer muted.", uid)),
                    Err(e) => Ok(describe_failure(&e)),
                }
            }),
    );
}
