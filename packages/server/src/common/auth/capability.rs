use crate::common::types::Role;

/// Capabilities on the Pawfinder platform
///
/// One variant per distinct permission the handlers need. The policy matrix
/// in [`role_allows`] is the single place that decides which roles hold
/// which capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// Edit own profile, choose a role during onboarding, register devices
    ManageOwnProfile,

    /// Publish service listings on the marketplace
    CreateListings,

    /// Suspend/unsuspend accounts
    ModerateUsers,

    /// Mark a service provider as verified
    VerifyProviders,
}

/// The authorization policy: which roles hold which capability.
///
/// Matching is exhaustive on both enums so a new role or capability cannot
/// be added without updating this function.
pub fn role_allows(role: Role, capability: Capability) -> bool {
    match capability {
        Capability::ManageOwnProfile => true,
        Capability::CreateListings => matches!(
            role,
            Role::Lover | Role::Vet | Role::Groomer | Role::Supplier | Role::Admin
        ),
        Capability::ModerateUsers => matches!(role, Role::Admin),
        Capability::VerifyProviders => matches!(role, Role::Admin),
    }
}
