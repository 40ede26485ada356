//! Application layer - Use cases and business logic
//!
//! This layer contains:
//! - Services: Business logic orchestration
//! - Cogs: Chat command groups
//! - Errors: Domain-specific errors
//! - Messaging: Message parsing

pub mod cogs;
pub mod errors;
pub mod messaging;
pub mod services;
