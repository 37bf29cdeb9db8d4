// Common types and utilities shared across the application

pub mod auth;
pub mod entity_ids;
pub mod id;
pub mod types;

pub use auth::{Actor, AuthError, Capability};
pub use entity_ids::*;
pub use id::{Id, V7};
pub use types::*;
