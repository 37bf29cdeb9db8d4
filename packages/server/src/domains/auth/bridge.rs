//! Login-token bridge and session transport.
//!
//! Two contexts that cannot share a cookie jar (native app vs. embedded web
//! view, external browser vs. native shell) hand a session across via a
//! short-lived single-use token. The token proves a *completed* login; the
//! session artifact is only minted at redemption time, so suspension between
//! verification and redemption still blocks the login.

use chrono::Duration;
use tracing::info;

use crate::common::UserId;
use crate::domains::auth::error::AuthFlowError;
use crate::domains::auth::models::{CodeKind, VerificationCode};
use crate::domains::users::User;
use crate::kernel::ServerDeps;

/// Cookie carrying the session artifact for web clients.
pub const SESSION_COOKIE: &str = "pawfinder_session";

/// Lifetime of a login-handoff token.
pub const LOGIN_TOKEN_TTL_MINUTES: i64 = 5;

/// Session cookie lifetime, matching the artifact's own expiry.
const SESSION_MAX_AGE_SECONDS: i64 = 24 * 60 * 60;

/// Issue a single-use login token for an already-authenticated user.
///
/// `kind` distinguishes the bridge direction (phone OTP vs. mobile OAuth);
/// both redeem through the same endpoint. Reissuing for the same target
/// replaces any live token of that kind.
pub async fn issue_login_token(
    target: &str,
    kind: CodeKind,
    user_id: UserId,
    pool: &sqlx::PgPool,
) -> Result<String, AuthFlowError> {
    debug_assert!(matches!(
        kind,
        CodeKind::PhoneLoginToken | CodeKind::MobileLoginToken
    ));

    let record = VerificationCode::issue(
        target,
        kind,
        Duration::minutes(LOGIN_TOKEN_TTL_MINUTES),
        Some(user_id),
        pool,
    )
    .await?;
    Ok(record.code)
}

/// Redeem a login token for a session artifact.
///
/// The caller proves it knows both halves of the handoff: the token value
/// and the account it was issued for. Redemption is atomic (DELETE ...
/// RETURNING): under concurrent attempts exactly one caller wins, the rest
/// see `InvalidOrExpiredCode`. A wrong user id, a vanished account and an
/// already-used token all fail identically - nothing distinguishes "never
/// existed" from "already used" from "not yours".
pub async fn redeem_login_token(
    token: &str,
    user_id: UserId,
    deps: &ServerDeps,
) -> Result<(User, String), AuthFlowError> {
    VerificationCode::redeem_login_token(token, user_id, &deps.db_pool)
        .await?
        .ok_or(AuthFlowError::InvalidOrExpiredCode)?;

    let user = User::find_by_id(user_id, &deps.db_pool)
        .await?
        .ok_or(AuthFlowError::InvalidOrExpiredCode)?;

    if user.suspended {
        return Err(AuthFlowError::AccountSuspended);
    }

    let artifact = deps.jwt_service.mint(&user)?;
    info!(user_id = %user.id, "login token redeemed");
    Ok((user, artifact))
}

/// Set-Cookie value installing the session for web clients.
pub fn session_cookie(artifact: &str) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, artifact, SESSION_MAX_AGE_SECONDS
    )
}

/// Set-Cookie value clearing the session on logout.
pub fn clear_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0", SESSION_COOKIE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie_attributes() {
        let cookie = session_cookie("abc.def.ghi");
        assert!(cookie.starts_with("pawfinder_session=abc.def.ghi;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=86400"));
    }

    #[test]
    fn test_clear_cookie_expires_immediately() {
        let cookie = clear_session_cookie();
        assert!(cookie.starts_with("pawfinder_session=;"));
        assert!(cookie.contains("Max-Age=0"));
        assert!(cookie.contains("HttpOnly"));
    }
}
