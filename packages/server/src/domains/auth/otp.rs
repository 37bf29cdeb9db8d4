//! Phone-login OTP and email-verification flows.
//!
//! Codes are generated and checked locally against the database - the
//! external channel only *delivers* them. Delivery failure is logged and
//! never fails issuance, so a caller who already knows the code (dev/test)
//! can still complete the flow.

use chrono::Duration;
use tracing::{info, warn};

use crate::domains::auth::bridge;
use crate::domains::auth::error::AuthFlowError;
use crate::domains::auth::models::{CodeKind, VerificationCode};
use crate::domains::users::{normalize_email, normalize_phone, User};
use crate::kernel::ServerDeps;

/// How long a login OTP stays valid.
pub const OTP_TTL_MINUTES: i64 = 10;

/// How long an email-verification code stays valid.
pub const EMAIL_VERIFY_TTL_HOURS: i64 = 24;

/// Result of issuing a login code
#[derive(Debug)]
pub enum SendCodeOutcome {
    Sent,
    /// Debug builds with TEST_LOGIN_ENABLED echo the code to the caller.
    SentWithEcho(String),
}

/// Result of verifying a login code
#[derive(Debug)]
pub enum VerifyLoginOutcome {
    /// Code matched an existing account: redeem this short-lived token,
    /// presenting the same user id, to obtain the session artifact.
    Handoff {
        login_token: String,
        user_id: crate::common::UserId,
    },
    /// Code was correct but no account exists for the target - the client
    /// routes the user to registration. Deliberate exception to the
    /// no-enumeration rule: this is only reachable after proving control
    /// of the phone/email.
    NeedsSignup,
}

/// Normalize a login target: emails are lowercased, phones E.164-stripped.
pub fn normalize_target(target: &str) -> String {
    if target.contains('@') {
        normalize_email(target)
    } else {
        normalize_phone(target)
    }
}

async fn find_user_for_target(target: &str, deps: &ServerDeps) -> Result<Option<User>, AuthFlowError> {
    let user = if target.contains('@') {
        User::find_by_email(target, &deps.db_pool).await?
    } else {
        User::find_by_phone(target, &deps.db_pool).await?
    };
    Ok(user)
}

/// Issue and deliver a phone-login OTP.
///
/// Always reports success to the caller regardless of whether an account
/// exists for the target - existence is only revealed after a correct code.
pub async fn send_login_code(
    target: &str,
    deps: &ServerDeps,
) -> Result<SendCodeOutcome, AuthFlowError> {
    let target = normalize_target(target);
    let user = find_user_for_target(&target, deps).await?;

    let record = VerificationCode::issue(
        &target,
        CodeKind::PhoneLoginOtp,
        Duration::minutes(OTP_TTL_MINUTES),
        user.map(|u| u.id),
        &deps.db_pool,
    )
    .await?;

    // Best-effort delivery: the code is already stored and stays usable.
    if let Err(e) = deps.code_delivery.deliver_code(&target, &record.code).await {
        warn!("code delivery failed for {}: {}", target, e);
    } else {
        info!("login code sent to {}", target);
    }

    if cfg!(debug_assertions) && deps.test_login_enabled {
        return Ok(SendCodeOutcome::SentWithEcho(record.code));
    }
    Ok(SendCodeOutcome::Sent)
}

/// Verify a phone-login OTP.
///
/// On a match the code is consumed (single-use). Login requires a
/// pre-existing account; a correct code without one signals `NeedsSignup`.
/// On success a 5-minute single-use handoff token is issued instead of a
/// session, because the verifying context (native app) and the
/// session-holding context (web view) cannot share a cookie jar.
pub async fn verify_login_code(
    target: &str,
    code: &str,
    deps: &ServerDeps,
) -> Result<VerifyLoginOutcome, AuthFlowError> {
    let target = normalize_target(target);

    let record = VerificationCode::consume(&target, code, CodeKind::PhoneLoginOtp, &deps.db_pool)
        .await?
        .ok_or(AuthFlowError::InvalidOrExpiredCode)?;

    let user = match find_user_for_target(&target, deps).await? {
        Some(user) => user,
        None => {
            info!("verified code for unregistered target");
            return Ok(VerifyLoginOutcome::NeedsSignup);
        }
    };

    if user.suspended {
        return Err(AuthFlowError::AccountSuspended);
    }

    // Control of the phone is now proven
    if !target.contains('@') && user.phone_verified_at.is_none() {
        User::mark_phone_verified(user.id, &deps.db_pool).await?;
    }

    let login_token = bridge::issue_login_token(
        &target,
        CodeKind::PhoneLoginToken,
        user.id,
        &deps.db_pool,
    )
    .await?;

    info!(user_id = %user.id, code_id = %record.id, "phone login verified");
    Ok(VerifyLoginOutcome::Handoff {
        login_token,
        user_id: user.id,
    })
}

/// Issue and deliver an email-verification code for a logged-in user.
pub async fn send_email_verification(
    user: &User,
    deps: &ServerDeps,
) -> Result<(), AuthFlowError> {
    let email = user.email.as_deref().ok_or(AuthFlowError::EmailUnavailable)?;
    let email = normalize_email(email);

    let record = VerificationCode::issue(
        &email,
        CodeKind::EmailVerify,
        Duration::hours(EMAIL_VERIFY_TTL_HOURS),
        Some(user.id),
        &deps.db_pool,
    )
    .await?;

    if let Err(e) = deps.code_delivery.deliver_code(&email, &record.code).await {
        warn!("verification email delivery failed for user {}: {}", user.id, e);
    }

    Ok(())
}

/// Confirm an email-verification code and stamp the account.
pub async fn verify_email(
    user: &User,
    code: &str,
    deps: &ServerDeps,
) -> Result<(), AuthFlowError> {
    let email = user.email.as_deref().ok_or(AuthFlowError::EmailUnavailable)?;
    let email = normalize_email(email);

    VerificationCode::consume(&email, code, CodeKind::EmailVerify, &deps.db_pool)
        .await?
        .ok_or(AuthFlowError::InvalidOrExpiredCode)?;

    User::mark_email_verified(user.id, &deps.db_pool).await?;
    info!(user_id = %user.id, "email verified");
    Ok(())
}
