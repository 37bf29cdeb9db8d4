use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::common::{Role, UserId};

/// User model - SQL persistence layer
///
/// Identity record for every account on the marketplace. A user always has
/// at least one of {email, phone} (enforced by a DB CHECK constraint and by
/// the construction paths below). `password_hash` is absent for accounts
/// created through an external identity provider.
#[derive(sqlx::FromRow, Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password_hash: Option<String>,
    pub display_name: String,
    pub avatar_url: Option<String>,

    pub role: Role,
    /// Role may change exactly once from the default during onboarding.
    /// Once locked, only an admin can change it.
    pub role_locked: bool,

    // Status
    pub verified: bool,
    pub suspended: bool,
    pub push_token: Option<String>,

    pub email_verified_at: Option<DateTime<Utc>>,
    pub phone_verified_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

/// Fields used when inserting a new user.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password_hash: Option<String>,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub role: Option<Role>,
}

impl User {
    /// Find user by ID
    pub async fn find_by_id(id: UserId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Find user by normalized email
    pub async fn find_by_email(email: &str, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Find user by normalized phone number
    pub async fn find_by_phone(phone: &str, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM users WHERE phone = $1")
            .bind(phone)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Insert a new user. New accounts default to the owner role, unverified.
    ///
    /// Returns the database error unmapped so callers can detect unique
    /// violations (duplicate email/phone) and surface a conflict.
    pub async fn create(new: NewUser, pool: &PgPool) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO users (id, email, phone, password_hash, display_name, avatar_url, role)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(UserId::new())
        .bind(new.email)
        .bind(new.phone)
        .bind(new.password_hash)
        .bind(new.display_name)
        .bind(new.avatar_url)
        .bind(new.role.unwrap_or(Role::Owner))
        .fetch_one(pool)
        .await
    }

    /// Find a user by email, creating one if absent.
    ///
    /// This is the convergence point for both external-identity channels:
    /// new accounts get the owner role (or admin, if the email is in the
    /// configured admin list) and start unverified.
    pub async fn find_or_create_by_email(
        email: &str,
        display_name: &str,
        avatar_url: Option<String>,
        admin_emails: &[String],
        pool: &PgPool,
    ) -> Result<(Self, bool)> {
        if let Some(user) = Self::find_by_email(email, pool).await? {
            return Ok((user, false));
        }

        let role = if is_admin_email(email, admin_emails) {
            Role::Admin
        } else {
            Role::Owner
        };

        let user = Self::create(
            NewUser {
                email: Some(email.to_string()),
                display_name: display_name.to_string(),
                avatar_url,
                role: Some(role),
                ..Default::default()
            },
            pool,
        )
        .await?;
        tracing::info!(user_id = %user.id, "created account for external identity");
        Ok((user, true))
    }

    /// Set the role once during onboarding.
    ///
    /// Guarded by `role_locked`: the UPDATE matches only unlocked rows, so a
    /// second attempt affects zero rows and returns `None`.
    pub async fn choose_role(id: UserId, role: Role, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "UPDATE users SET role = $2, role_locked = TRUE
             WHERE id = $1 AND role_locked = FALSE
             RETURNING *",
        )
        .bind(id)
        .bind(role)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Admin override: set the role regardless of the lock.
    pub async fn set_role(id: UserId, role: Role, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "UPDATE users SET role = $2, role_locked = TRUE WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(role)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Update display name and/or avatar
    pub async fn update_profile(
        id: UserId,
        display_name: Option<String>,
        avatar_url: Option<String>,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "UPDATE users SET
                 display_name = COALESCE($2, display_name),
                 avatar_url = COALESCE($3, avatar_url)
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(display_name)
        .bind(avatar_url)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Register the device push token for this account
    pub async fn set_push_token(id: UserId, token: &str, pool: &PgPool) -> Result<()> {
        sqlx::query("UPDATE users SET push_token = $2 WHERE id = $1")
            .bind(id)
            .bind(token)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Moderation: suspend or unsuspend an account
    pub async fn set_suspended(id: UserId, suspended: bool, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "UPDATE users SET suspended = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(suspended)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Moderation: mark a provider account as verified
    pub async fn set_verified(id: UserId, verified: bool, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "UPDATE users SET verified = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(verified)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Record a completed email verification (idempotent)
    pub async fn mark_email_verified(id: UserId, pool: &PgPool) -> Result<()> {
        sqlx::query(
            "UPDATE users SET email_verified_at = now()
             WHERE id = $1 AND email_verified_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Record a completed phone verification (idempotent)
    pub async fn mark_phone_verified(id: UserId, pool: &PgPool) -> Result<()> {
        sqlx::query(
            "UPDATE users SET phone_verified_at = now()
             WHERE id = $1 AND phone_verified_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }

    /// Public projection - everything the client may see, never the hash.
    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id,
            email: self.email.clone(),
            phone: self.phone.clone(),
            display_name: self.display_name.clone(),
            avatar_url: self.avatar_url.clone(),
            role: self.role,
            role_locked: self.role_locked,
            verified: self.verified,
            email_verified: self.email_verified_at.is_some(),
            phone_verified: self.phone_verified_at.is_some(),
            created_at: self.created_at,
        }
    }
}

/// Client-facing user shape (no password hash, no suspension internals)
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: UserId,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub role: Role,
    pub role_locked: bool,
    pub verified: bool,
    pub email_verified: bool,
    pub phone_verified: bool,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Utility Functions
// =============================================================================

/// Normalize a phone number to a loose E.164 form.
///
/// Strips spaces, dashes, dots and parentheses, keeps a single leading `+`.
/// Full E.164 validation is left to the SMS provider; this only guarantees a
/// stable lookup key so "+1 (555) 123-4567" and "+15551234567" match.
pub fn normalize_phone(phone: &str) -> String {
    let trimmed = phone.trim();
    let digits: String = trimmed.chars().filter(|c| c.is_ascii_digit()).collect();
    if trimmed.starts_with('+') {
        format!("+{}", digits)
    } else {
        digits
    }
}

/// Normalize an email address for storage and lookup (trim + lowercase).
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// Check if an email should be granted the admin role on account creation.
///
/// Case-insensitive match against the configured admin email list.
pub fn is_admin_email(email: &str, admin_emails: &[String]) -> bool {
    admin_emails
        .iter()
        .any(|admin| admin.eq_ignore_ascii_case(email))
}
