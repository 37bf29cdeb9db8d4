pub mod admin;
pub mod auth;
pub mod error;
pub mod health;
pub mod profile;
pub mod video;

pub use error::ApiError;
pub use health::health_handler;

use axum::extract::Extension;

use crate::common::AuthError;
use crate::server::middleware::AuthUser;

/// Unwrap the optional auth extension, turning absence into a 401.
///
/// The auth middleware only inserts `AuthUser` for a valid artifact, so a
/// missing extension means the request was anonymous or carried garbage.
pub fn require_auth(auth: Option<Extension<AuthUser>>) -> Result<AuthUser, ApiError> {
    auth.map(|Extension(user)| user)
        .ok_or_else(|| AuthError::AuthenticationRequired.into())
}
