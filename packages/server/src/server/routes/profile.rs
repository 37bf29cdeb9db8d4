//! Profile routes for the authenticated user.

use axum::{extract::Extension, Json};
use serde::Deserialize;
use serde_json::json;

use crate::common::Role;
use crate::domains::users::{PublicUser, User};
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;
use crate::server::routes::error::ApiError;
use crate::server::routes::require_auth;

pub async fn me_handler(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
) -> Result<Json<PublicUser>, ApiError> {
    let auth = require_auth(auth)?;
    let user = User::find_by_id(auth.user_id, &state.deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(user.public()))
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

pub async fn update_profile_handler(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    let auth = require_auth(auth)?;

    if let Some(name) = req.display_name.as_deref() {
        if name.trim().is_empty() {
            return Err(ApiError::bad_request("Display name cannot be empty"));
        }
    }

    let user = User::update_profile(auth.user_id, req.display_name, req.avatar_url, &state.deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(Json(user.public()))
}

#[derive(Deserialize)]
pub struct ChooseRoleRequest {
    pub role: Role,
}

/// One-shot role selection during onboarding.
///
/// The role lock is enforced in SQL; a second attempt matches no rows and
/// comes back as 403 regardless of the requested role.
pub async fn choose_role_handler(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Json(req): Json<ChooseRoleRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    let auth = require_auth(auth)?;

    // Self-service promotion to admin is never allowed.
    if req.role == Role::Admin {
        return Err(ApiError::forbidden("Role not selectable"));
    }

    let user = User::choose_role(auth.user_id, req.role, &state.deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::forbidden("Role already chosen"))?;
    Ok(Json(user.public()))
}

#[derive(Deserialize)]
pub struct PushTokenRequest {
    pub push_token: String,
}

pub async fn push_token_handler(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Json(req): Json<PushTokenRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let auth = require_auth(auth)?;
    User::set_push_token(auth.user_id, &req.push_token, &state.deps.db_pool).await?;
    Ok(Json(json!({ "status": "ok" })))
}
