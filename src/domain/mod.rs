//! Domain layer - Core business logic with no external dependencies
//!
//! This layer contains:
//! - Entities: Core business objects (records, messages, commands)
//! - Traits: Abstractions for infrastructure (Bot, DocumentStore)

pub mod entities;
pub mod traits;
