//! Server dependencies for handlers (using traits for testability)
//!
//! This module provides the central dependency container. Every external
//! service goes through a trait abstraction, constructed once at startup
//! and passed to handlers - never a module-level singleton.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use twilio::TwilioService;

use crate::domains::auth::JwtService;
use crate::kernel::traits::{
    BaseCodeDelivery, BaseIdentityProvider, BasePushService, BaseVideoRoomService, VideoRoom,
};

// =============================================================================
// Twilio adapters (implement the Base* infrastructure traits)
// =============================================================================

/// Delivers codes over SMS via Twilio.
pub struct TwilioCodeDelivery(pub Arc<TwilioService>);

impl TwilioCodeDelivery {
    pub fn new(service: Arc<TwilioService>) -> Self {
        Self(service)
    }
}

#[async_trait]
impl BaseCodeDelivery for TwilioCodeDelivery {
    async fn deliver_code(&self, target: &str, code: &str) -> Result<()> {
        if target.contains('@') {
            // No email channel configured; the caller logs this and the
            // code stays redeemable.
            anyhow::bail!("no email delivery channel configured for {}", target);
        }

        let body = format!("Your Pawfinder login code is {}", code);
        self.0
            .send_sms(target, &body)
            .await
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!("{}", e))
    }
}

/// No-op delivery for environments without Twilio credentials.
///
/// Issuance still succeeds; the code is only reachable through the debug
/// echo (TEST_LOGIN_ENABLED) or the database.
pub struct NoopCodeDelivery;

#[async_trait]
impl BaseCodeDelivery for NoopCodeDelivery {
    async fn deliver_code(&self, target: &str, _code: &str) -> Result<()> {
        tracing::warn!("SMS delivery disabled; code for {} not sent", target);
        Ok(())
    }
}

/// Provisions booking video rooms via Twilio Video.
pub struct TwilioVideoRooms(pub Arc<TwilioService>);

impl TwilioVideoRooms {
    pub fn new(service: Arc<TwilioService>) -> Self {
        Self(service)
    }
}

#[async_trait]
impl BaseVideoRoomService for TwilioVideoRooms {
    async fn ensure_room(&self, unique_name: &str) -> Result<VideoRoom> {
        let room = self
            .0
            .ensure_room(unique_name)
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        Ok(VideoRoom {
            sid: room.sid,
            name: room.unique_name,
        })
    }
}

// =============================================================================
// ServerDeps
// =============================================================================

/// Server dependencies accessible to handlers (using traits for testability)
#[derive(Clone)]
pub struct ServerDeps {
    pub db_pool: PgPool,
    pub code_delivery: Arc<dyn BaseCodeDelivery>,
    pub push_service: Arc<dyn BasePushService>,
    pub video_rooms: Arc<dyn BaseVideoRoomService>,
    pub identity_provider: Arc<dyn BaseIdentityProvider>,
    /// Session codec for artifact mint/validate
    pub jwt_service: Arc<JwtService>,
    /// Emails promoted to admin on account creation
    pub admin_emails: Vec<String>,
    /// Echo issued codes in API responses (debug builds only)
    pub test_login_enabled: bool,
}

impl ServerDeps {
    /// Create new ServerDeps with the given dependencies
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db_pool: PgPool,
        code_delivery: Arc<dyn BaseCodeDelivery>,
        push_service: Arc<dyn BasePushService>,
        video_rooms: Arc<dyn BaseVideoRoomService>,
        identity_provider: Arc<dyn BaseIdentityProvider>,
        jwt_service: Arc<JwtService>,
        admin_emails: Vec<String>,
        test_login_enabled: bool,
    ) -> Self {
        Self {
            db_pool,
            code_delivery,
            push_service,
            video_rooms,
            identity_provider,
            jwt_service,
            admin_emails,
            test_login_enabled,
        }
    }
}
