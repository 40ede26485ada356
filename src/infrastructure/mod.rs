//! Infrastructure layer - External concerns
//!
//! This layer contains:
//! - Config: Configuration loading
//! - Storage: Document store implementations
//! - Database: The persistence gateway
//! - Adapters: Platform integrations (Telegram, console)

pub mod adapters;
pub mod config;
pub mod database;
pub mod storage;
