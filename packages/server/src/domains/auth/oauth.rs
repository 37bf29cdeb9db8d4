//! External identity channels: Google access-token exchange and Apple
//! identity-token exchange.
//!
//! Both converge on `User::find_or_create_by_email` - the provider proves
//! control of an email, and the account keyed by that email gets a session.

use anyhow::Result;
use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

use crate::domains::auth::error::AuthFlowError;
use crate::domains::users::{normalize_email, User};
use crate::kernel::{BaseIdentityProvider, ProviderUserInfo, ServerDeps};

const GOOGLE_USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

// =============================================================================
// Google
// =============================================================================

/// Google user-info client.
///
/// The native app completes the OAuth dance itself and hands us the access
/// token; the server's only job is to resolve it to profile claims.
pub struct GoogleAuth {
    client: Client,
    userinfo_url: String,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

impl GoogleAuth {
    pub fn new() -> Self {
        Self::with_userinfo_url(GOOGLE_USERINFO_URL.to_string())
    }

    /// Point the client at a different user-info endpoint (tests).
    pub fn with_userinfo_url(userinfo_url: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            userinfo_url,
        }
    }
}

impl Default for GoogleAuth {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseIdentityProvider for GoogleAuth {
    async fn fetch_user_info(&self, access_token: &str) -> Result<ProviderUserInfo> {
        let response = self
            .client
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            anyhow::bail!("userinfo request failed with status {}", response.status());
        }

        let info: GoogleUserInfo = response.json().await?;
        Ok(ProviderUserInfo {
            email: info.email,
            name: info.name,
            avatar_url: info.picture,
        })
    }
}

/// Exchange a Google access token for an account and session artifact.
///
/// Returns the user plus the minted artifact; the HTTP layer decides how to
/// deliver it (cookie vs. JSON body vs. handoff token).
pub async fn exchange_google_access_token(
    access_token: &str,
    deps: &ServerDeps,
) -> Result<(User, String), AuthFlowError> {
    let info = deps
        .identity_provider
        .fetch_user_info(access_token)
        .await
        .map_err(|e| AuthFlowError::UpstreamAuthFailure(e.to_string()))?;

    // An access token without an email claim cannot key an account.
    let email = info
        .email
        .ok_or_else(|| AuthFlowError::UpstreamAuthFailure("no email claim in userinfo".into()))?;
    let email = normalize_email(&email);

    let display_name = info
        .name
        .unwrap_or_else(|| display_name_from_email(&email));

    let (user, created) = User::find_or_create_by_email(
        &email,
        &display_name,
        info.avatar_url,
        &deps.admin_emails,
        &deps.db_pool,
    )
    .await?;

    if user.suspended {
        return Err(AuthFlowError::AccountSuspended);
    }

    let artifact = deps.jwt_service.mint(&user)?;
    info!(user_id = %user.id, created, "google exchange completed");
    Ok((user, artifact))
}

// =============================================================================
// Apple
// =============================================================================

/// Claims extracted from an Apple identity token.
#[derive(Debug, Deserialize)]
pub struct AppleClaims {
    pub sub: Option<String>,
    pub email: Option<String>,
}

/// Profile fields Apple only supplies client-side on the first sign-in.
#[derive(Debug, Default, Deserialize)]
pub struct AppleProfileHint {
    pub email: Option<String>,
    pub full_name: Option<String>,
}

/// Decode the claims of an Apple identity token without verifying its
/// signature.
///
/// The token has just been produced by Apple's own sign-in sheet on the
/// device, so the payload is trusted as-delivered. Structural failures
/// (not a JWT, undecodable payload, missing subject) are `MalformedToken`.
pub fn decode_apple_claims(identity_token: &str) -> Result<AppleClaims, AuthFlowError> {
    let mut validation = Validation::new(Algorithm::RS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let data =
        jsonwebtoken::decode::<AppleClaims>(identity_token, &DecodingKey::from_secret(&[]), &validation)
            .map_err(|e| AuthFlowError::MalformedToken(e.to_string()))?;

    if data.claims.sub.is_none() {
        return Err(AuthFlowError::MalformedToken("missing subject claim".into()));
    }
    Ok(data.claims)
}

/// Pick the account email: token claim first, then the client-side hint.
pub fn resolve_apple_email(
    claims: &AppleClaims,
    hint: &AppleProfileHint,
) -> Result<String, AuthFlowError> {
    claims
        .email
        .as_deref()
        .or(hint.email.as_deref())
        .map(normalize_email)
        .ok_or(AuthFlowError::EmailUnavailable)
}

/// Exchange an Apple identity token for an account and session artifact.
///
/// Apple omits the email from repeat sign-ins for users who hid it, so the
/// client forwards whatever profile fields it received alongside the token.
pub async fn exchange_apple_identity_token(
    identity_token: &str,
    hint: &AppleProfileHint,
    deps: &ServerDeps,
) -> Result<(User, String), AuthFlowError> {
    let claims = decode_apple_claims(identity_token)?;
    let email = resolve_apple_email(&claims, hint)?;

    let display_name = hint
        .full_name
        .clone()
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| display_name_from_email(&email));

    let (user, created) = User::find_or_create_by_email(
        &email,
        &display_name,
        None,
        &deps.admin_emails,
        &deps.db_pool,
    )
    .await?;

    if user.suspended {
        return Err(AuthFlowError::AccountSuspended);
    }

    let artifact = deps.jwt_service.mint(&user)?;
    info!(user_id = %user.id, created, "apple exchange completed");
    Ok((user, artifact))
}

/// Fallback display name when the provider gives none: the email local part.
fn display_name_from_email(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}
