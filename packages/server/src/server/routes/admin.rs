//! Moderation routes. Capability-gated: the role in the session artifact is
//! checked against the central policy, never ad-hoc flags.

use axum::{
    extract::{Extension, Path},
    Json,
};
use tracing::warn;

use crate::common::{Actor, Capability, UserId};
use crate::domains::users::{PublicUser, User};
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;
use crate::server::routes::error::ApiError;
use crate::server::routes::require_auth;

pub async fn suspend_handler(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(user_id): Path<UserId>,
) -> Result<Json<PublicUser>, ApiError> {
    set_suspended(state, auth, user_id, true).await
}

pub async fn unsuspend_handler(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(user_id): Path<UserId>,
) -> Result<Json<PublicUser>, ApiError> {
    set_suspended(state, auth, user_id, false).await
}

async fn set_suspended(
    state: AppState,
    auth: Option<Extension<AuthUser>>,
    user_id: UserId,
    suspended: bool,
) -> Result<Json<PublicUser>, ApiError> {
    let auth = require_auth(auth)?;
    Actor::new(auth.user_id, auth.role)
        .can(Capability::ModerateUsers)
        .check()?;

    let user = User::set_suspended(user_id, suspended, &state.deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(user.public()))
}

/// Mark a provider account as verified and notify their device.
pub async fn verify_provider_handler(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(user_id): Path<UserId>,
) -> Result<Json<PublicUser>, ApiError> {
    let auth = require_auth(auth)?;
    Actor::new(auth.user_id, auth.role)
        .can(Capability::VerifyProviders)
        .check()?;

    let user = User::set_verified(user_id, true, &state.deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    // Fire-and-forget: verification succeeds whether or not the push lands.
    if let Some(push_token) = user.push_token.clone() {
        let push = state.deps.push_service.clone();
        tokio::spawn(async move {
            if let Err(e) = push
                .send_notification(
                    &push_token,
                    "You're verified!",
                    "Your provider account has been verified.",
                    serde_json::json!({ "type": "account_verified" }),
                )
                .await
            {
                warn!("verification push failed: {}", e);
            }
        });
    }

    Ok(Json(user.public()))
}
