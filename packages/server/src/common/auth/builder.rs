use super::{role_allows, AuthError, Capability};
use crate::common::entity_ids::UserId;
use crate::common::types::Role;

/// Entry point for authorization checks
///
/// Usage:
/// ```rust,ignore
/// Actor::new(auth.user_id, auth.role)
///     .can(Capability::ModerateUsers)
///     .check()?;
/// ```
pub struct Actor {
    actor_id: UserId,
    role: Role,
}

impl Actor {
    /// Create a new actor for authorization checks
    ///
    /// # Arguments
    /// * `actor_id` - The user ID of the actor
    /// * `role` - Role from the session claims (already validated during authentication)
    pub fn new(actor_id: UserId, role: Role) -> Self {
        Self { actor_id, role }
    }

    /// Specify what capability the actor needs
    pub fn can(self, capability: Capability) -> CapabilityBuilder {
        CapabilityBuilder {
            actor_id: self.actor_id,
            role: self.role,
            capability,
        }
    }
}

/// Builder after specifying capability
pub struct CapabilityBuilder {
    actor_id: UserId,
    role: Role,
    capability: Capability,
}

impl CapabilityBuilder {
    /// Perform the authorization check
    ///
    /// The role comes from the signed session artifact, so the check is a
    /// pure policy lookup - no database round trip.
    pub fn check(self) -> Result<(), AuthError> {
        if role_allows(self.role, self.capability) {
            Ok(())
        } else {
            tracing::debug!(
                actor = %self.actor_id,
                role = %self.role,
                capability = ?self.capability,
                "permission denied"
            );
            Err(AuthError::PermissionDenied(format!(
                "role {} lacks {:?}",
                self.role, self.capability
            )))
        }
    }
}
