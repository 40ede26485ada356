//! Domain entities - Core business objects with no external dependencies

pub mod command;
pub mod message;
pub mod record;
pub mod user;

pub use command::{Command, CommandRegistry};
pub use message::{Content, Message, MessageType};
pub use record::{Document, MuteRecord, UserRecord};
pub use user::User;
