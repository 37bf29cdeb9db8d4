//! Email + password channel: registration and login.

use tracing::info;

use crate::domains::auth::error::AuthFlowError;
use crate::domains::users::{is_admin_email, normalize_email, NewUser, User};
use crate::kernel::ServerDeps;

/// Registration input (already deserialized by the HTTP layer).
#[derive(Debug)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

fn hash_password(password: &str) -> Result<String, AuthFlowError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| AuthFlowError::Internal(anyhow::anyhow!("password hashing failed: {}", e)))
}

/// Create an account with a password credential and mint its first session.
///
/// Duplicate emails surface as a conflict via the unique constraint rather
/// than a pre-check, so concurrent registrations cannot both succeed.
pub async fn register(
    input: RegisterInput,
    deps: &ServerDeps,
) -> Result<(User, String), AuthFlowError> {
    let email = normalize_email(&input.email);
    let password_hash = hash_password(&input.password)?;

    let role = if is_admin_email(&email, &deps.admin_emails) {
        Some(crate::common::Role::Admin)
    } else {
        None
    };

    let user = User::create(
        NewUser {
            email: Some(email),
            password_hash: Some(password_hash),
            display_name: input.display_name,
            role,
            ..Default::default()
        },
        &deps.db_pool,
    )
    .await
    .map_err(|e| {
        if AuthFlowError::is_unique_violation(&e) {
            AuthFlowError::Conflict("An account with this email already exists".to_string())
        } else {
            AuthFlowError::Database(e)
        }
    })?;

    let artifact = deps.jwt_service.mint(&user)?;
    info!(user_id = %user.id, "account registered");
    Ok((user, artifact))
}

/// Authenticate email + password and mint a session.
///
/// Unknown email, missing credential (provider-only account) and wrong
/// password all fail identically with `InvalidCredentials` - existence is
/// never revealed. Suspension is only reported once the password checks out.
pub async fn login(
    email: &str,
    password: &str,
    deps: &ServerDeps,
) -> Result<(User, String), AuthFlowError> {
    let email = normalize_email(email);

    let user = User::find_by_email(&email, &deps.db_pool)
        .await?
        .ok_or(AuthFlowError::InvalidCredentials)?;

    let hash = user
        .password_hash
        .as_deref()
        .ok_or(AuthFlowError::InvalidCredentials)?;

    if !bcrypt::verify(password, hash).unwrap_or(false) {
        return Err(AuthFlowError::InvalidCredentials);
    }

    if user.suspended {
        return Err(AuthFlowError::AccountSuspended);
    }

    let artifact = deps.jwt_service.mint(&user)?;
    info!(user_id = %user.id, "password login");
    Ok((user, artifact))
}
