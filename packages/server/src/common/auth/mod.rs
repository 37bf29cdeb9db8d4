/// Authorization module for the marketplace
///
/// Provides a fluent API for authorization checks in handlers:
///
/// ```rust,ignore
/// use crate::common::auth::{Actor, Capability};
///
/// Actor::new(auth.user_id, auth.role)
///     .can(Capability::ModerateUsers)
///     .check()?;
/// ```
///
/// The whole policy lives in `capability::role_allows` - handlers never
/// branch on roles themselves.
mod builder;
mod capability;
mod errors;

pub use builder::{Actor, CapabilityBuilder};
pub use capability::{role_allows, Capability};
pub use errors::AuthError;
