// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic. Auth flows and
// handlers depend on these, tests substitute recorders/fakes.
//
// Naming convention: Base* for trait names (e.g., BasePushService)

use anyhow::Result;
use async_trait::async_trait;

// =============================================================================
// Verification-code delivery (SMS / email)
// =============================================================================

/// Delivers a freshly issued verification code to its target.
///
/// Delivery is best-effort: issuance never fails because delivery did
/// (callers log the error and move on - the code stays usable).
#[async_trait]
pub trait BaseCodeDelivery: Send + Sync {
    async fn deliver_code(&self, target: &str, code: &str) -> Result<()>;
}

// =============================================================================
// Push notifications (fire-and-forget)
// =============================================================================

#[async_trait]
pub trait BasePushService: Send + Sync {
    /// Send a push notification to a device token
    async fn send_notification(
        &self,
        push_token: &str,
        title: &str,
        body: &str,
        data: serde_json::Value,
    ) -> Result<()>;
}

// =============================================================================
// Video rooms (booking calls)
// =============================================================================

/// An ephemeral two-party video room.
#[derive(Debug, Clone)]
pub struct VideoRoom {
    pub sid: String,
    pub name: String,
}

#[async_trait]
pub trait BaseVideoRoomService: Send + Sync {
    /// Fetch or create the room with this unique name (idempotent).
    async fn ensure_room(&self, unique_name: &str) -> Result<VideoRoom>;
}

// =============================================================================
// External identity provider (OAuth user-info)
// =============================================================================

/// Profile claims returned by an identity provider's user-info endpoint.
#[derive(Debug, Clone, Default)]
pub struct ProviderUserInfo {
    pub email: Option<String>,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

#[async_trait]
pub trait BaseIdentityProvider: Send + Sync {
    /// Resolve a bearer access token to the provider's profile claims.
    ///
    /// Any failure (non-success response, timeout, parse error) is an
    /// upstream auth failure from the caller's point of view.
    async fn fetch_user_info(&self, access_token: &str) -> Result<ProviderUserInfo>;
}
