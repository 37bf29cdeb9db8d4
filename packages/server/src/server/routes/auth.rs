//! Authentication routes: all four channels plus the token bridge.
//!
//! Every successful login converges on the same response shape: the session
//! artifact goes out both as an HTTP-only cookie (web) and in the JSON body
//! (native clients store it and send it as a bearer value).

use axum::{
    extract::Extension,
    http::header::SET_COOKIE,
    response::{AppendHeaders, IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;

use crate::common::UserId;
use crate::domains::auth::models::CodeKind;
use crate::domains::auth::otp::{SendCodeOutcome, VerifyLoginOutcome};
use crate::domains::auth::{bridge, oauth, otp, password};
use crate::domains::users::User;
use crate::server::app::AppState;
use crate::server::routes::error::ApiError;
use crate::server::routes::require_auth;
use crate::server::middleware::AuthUser;

/// Session artifact as cookie + body, public user alongside.
fn session_response(user: &User, artifact: String) -> Response {
    let headers = AppendHeaders([(SET_COOKIE, bridge::session_cookie(&artifact))]);
    (
        headers,
        Json(json!({ "user": user.public(), "token": artifact })),
    )
        .into_response()
}

// =============================================================================
// Password channel
// =============================================================================

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

pub async fn register_handler(
    Extension(state): Extension<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Response, ApiError> {
    if req.password.len() < 8 {
        return Err(ApiError::bad_request("Password must be at least 8 characters"));
    }
    let (user, artifact) = password::register(
        password::RegisterInput {
            email: req.email,
            password: req.password,
            display_name: req.display_name,
        },
        &state.deps,
    )
    .await?;
    Ok(session_response(&user, artifact))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login_handler(
    Extension(state): Extension<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, ApiError> {
    let (user, artifact) = password::login(&req.email, &req.password, &state.deps).await?;
    Ok(session_response(&user, artifact))
}

pub async fn logout_handler() -> Response {
    let headers = AppendHeaders([(SET_COOKIE, bridge::clear_session_cookie())]);
    (headers, Json(json!({ "status": "ok" }))).into_response()
}

// =============================================================================
// Phone OTP channel
// =============================================================================

#[derive(Deserialize)]
pub struct SendCodeRequest {
    pub target: String,
}

pub async fn send_code_handler(
    Extension(state): Extension<AppState>,
    Json(req): Json<SendCodeRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match otp::send_login_code(&req.target, &state.deps).await? {
        SendCodeOutcome::Sent => Ok(Json(json!({ "status": "sent" }))),
        SendCodeOutcome::SentWithEcho(code) => {
            Ok(Json(json!({ "status": "sent", "code": code })))
        }
    }
}

#[derive(Deserialize)]
pub struct VerifyCodeRequest {
    pub target: String,
    pub code: String,
}

pub async fn verify_code_handler(
    Extension(state): Extension<AppState>,
    Json(req): Json<VerifyCodeRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    match otp::verify_login_code(&req.target, &req.code, &state.deps).await? {
        VerifyLoginOutcome::Handoff {
            login_token,
            user_id,
        } => Ok(Json(
            json!({ "login_token": login_token, "user_id": user_id }),
        )),
        VerifyLoginOutcome::NeedsSignup => Ok(Json(json!({ "needs_signup": true }))),
    }
}

// =============================================================================
// Token bridge
// =============================================================================

/// Both halves of the handoff: the token value and the account the caller
/// believes it logs into (returned alongside the token at issuance).
#[derive(Deserialize)]
pub struct RedeemRequest {
    pub token: String,
    pub user_id: UserId,
}

pub async fn redeem_handler(
    Extension(state): Extension<AppState>,
    Json(req): Json<RedeemRequest>,
) -> Result<Response, ApiError> {
    let (user, artifact) =
        bridge::redeem_login_token(&req.token, req.user_id, &state.deps).await?;
    Ok(session_response(&user, artifact))
}

// =============================================================================
// External identity channels
// =============================================================================

#[derive(Deserialize)]
pub struct GoogleExchangeRequest {
    pub access_token: String,
    /// Native flows get a handoff token instead of a direct session, so the
    /// external browser that finished the OAuth dance can pass the login to
    /// the app shell.
    #[serde(default)]
    pub native: bool,
}

pub async fn google_exchange_handler(
    Extension(state): Extension<AppState>,
    Json(req): Json<GoogleExchangeRequest>,
) -> Result<Response, ApiError> {
    let (user, artifact) = oauth::exchange_google_access_token(&req.access_token, &state.deps).await?;

    if req.native {
        let target = user
            .email
            .as_deref()
            .ok_or_else(ApiError::internal)?
            .to_string();
        let handoff = bridge::issue_login_token(
            &target,
            CodeKind::MobileLoginToken,
            user.id,
            &state.deps.db_pool,
        )
        .await?;
        return Ok(
            Json(json!({ "handoff_token": handoff, "user_id": user.id })).into_response(),
        );
    }

    Ok(session_response(&user, artifact))
}

#[derive(Deserialize)]
pub struct AppleExchangeRequest {
    pub identity_token: String,
    /// Profile fields Apple only hands the client on first sign-in.
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

pub async fn apple_exchange_handler(
    Extension(state): Extension<AppState>,
    Json(req): Json<AppleExchangeRequest>,
) -> Result<Response, ApiError> {
    let hint = oauth::AppleProfileHint {
        email: req.email,
        full_name: req.full_name,
    };
    let (user, artifact) =
        oauth::exchange_apple_identity_token(&req.identity_token, &hint, &state.deps).await?;
    Ok(session_response(&user, artifact))
}

// =============================================================================
// Email verification (authenticated)
// =============================================================================

pub async fn send_email_verification_handler(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let auth = require_auth(auth)?;
    let user = User::find_by_id(auth.user_id, &state.deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    otp::send_email_verification(&user, &state.deps).await?;
    Ok(Json(json!({ "status": "sent" })))
}

#[derive(Deserialize)]
pub struct VerifyEmailRequest {
    pub code: String,
}

pub async fn verify_email_handler(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Json(req): Json<VerifyEmailRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let auth = require_auth(auth)?;
    let user = User::find_by_id(auth.user_id, &state.deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    otp::verify_email(&user, &req.code, &state.deps).await?;
    Ok(Json(json!({ "status": "verified" })))
}
