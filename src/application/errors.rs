//! Application layer errors

use thiserror::Error;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Command execution errors
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Command not found: {0}")]
    NotFound(String),

    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

/// Gateway errors surfaced to command surfaces.
///
/// The first three name exactly what went wrong with the entity so a command
/// can reply with something specific. `Unavailable` deliberately carries no
/// detail: the underlying store failure is logged at the gateway boundary,
/// and callers only learn that the operation did not complete.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DatabaseError {
    #[error("no record for uid {0}")]
    NotFound(i64),

    #[error("record for uid {0} already exists")]
    DuplicateKey(i64),

    #[error("precondition violated: {0}")]
    Precondition(String),

    #[error("storage unavailable")]
    Unavailable,
}

/// Errors produced by a document store implementation
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("duplicate uid {uid} in collection '{collection}'")]
    Duplicate { collection: String, uid: i64 },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Errors converting between records and stored documents
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RecordError {
    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("invalid field: {0}")]
    InvalidField(&'static str),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
