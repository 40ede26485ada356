//! Leveling cog - rank lookups and the leaderboard

use std::sync::Arc;

use super::{describe_failure, target_uid};
use crate::application::errors::CommandError;
use crate::application::services::CommandService;
use crate::domain::entities::{Command, Content};
use crate::infrastructure::database::Database;

/// Leaderboard page size
const TOP_PAGE_SIZE: u64 = 10;

pub fn register(commands: &mut CommandService, db: Arc<Database>) {
    register_rank(commands, Arc::clone(&db));
    register_top(commands, db);
}

/// `/rank [uid]` - a user's stats plus xp and karma ranks.
fn register_rank(commands: &mut CommandService, db: Arc<Database>) {
    commands.register(
        Command::new("rank")
            .with_description("Show a user's level, xp and karma ranks")
            .with_usage("/rank [uid]")
            .with_handler(move |msg| {
                let Content::Command { args, .. } = &msg.content else {
                    return Err(CommandError::InvalidArgs("not a command".to_string()));
                };
                let uid = target_uid(&msg, args)?;

                let user = match db.get_user(uid) {
                    Ok(user) => user,
                    Err(e) => return Ok(describe_failure(&e)),
                };
                let xp_rank = match db.get_user_xp_rank(uid) {
                    Ok(rank) => rank,
                    Err(e) => return Ok(describe_failure(&e)),
                };
                let karma_rank = match db.get_user_karma_rank(uid) {
                    Ok(rank) => rank,
                    Err(e) => return Ok(describe_failure(&e)),
                };

                Ok(format!(
                    "User {} - level {}\nxp: {} (rank #{})\nkarma: {} (rank #{})",
                    user.uid, user.level, user.xp, xp_rank, user.karma, karma_rank
                ))
            }),
    );
}

/// `/top [start]` - one leaderboard page, sorted by xp.
fn register_top(commands: &mut CommandService, db: Arc<Database>) {
    commands.register(
        Command::new("top")
            .with_description("Show the xp leaderboard")
            .with_usage("/top [start]")
            .with_aliases(vec!["leaderboard".to_string()])
            .with_handler(move |msg| {
                let Content::Command { args, .. } = &msg.content else {
                    return Err(CommandError::InvalidArgs("not a command".to_string()));
                };

                let start: u64 = match args.first() {
                    Some(raw) => raw.parse().map_err(|_| {
                        CommandError::InvalidArgs(format!("'{}' is not a rank", raw))
                    })?,
                    None => 1,
                };

                let page = match db.get_top_by_xp(start, TOP_PAGE_SIZE) {
                    Ok(page) => page,
                    Err(e) => return Ok(describe_failure(&e)),
                };

                let mut reply = "Top users by xp:\n".to_string();
                for (i, user) in page.iter().enumerate() {
                    // Placeholder padding marks the end of the real entries
                    if user.uid == 0 {
                        break;
                    }
                    reply.push_str(&format!(
                        "#{} - user {} (level {}, {} xp)\n",
                        start + i as u64,
                        user.uid,
                        user.level,
                        user.xp
                    ));
                }
                Ok(reply)
            }),
    );
}
