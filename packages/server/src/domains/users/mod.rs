//! User accounts: identity records, role selection, moderation.

pub mod models;

pub use models::{is_admin_email, normalize_email, normalize_phone, NewUser, PublicUser, User};
