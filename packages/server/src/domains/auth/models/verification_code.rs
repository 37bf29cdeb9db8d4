use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use crate::common::{CodeId, UserId};

/// Length of an opaque login-handoff token.
const LOGIN_TOKEN_LEN: usize = 40;

/// Discriminates what a stored code proves and how it is consumed.
///
/// Stored as the Postgres enum type `code_kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "code_kind", rename_all = "snake_case")]
pub enum CodeKind {
    /// 6-digit code mailed to confirm an address belongs to the account.
    EmailVerify,
    /// 6-digit code texted for phone login.
    PhoneLoginOtp,
    /// Opaque 5-minute token bridging OTP verification to session creation.
    PhoneLoginToken,
    /// Opaque 5-minute token bridging an external-browser OAuth exchange
    /// back to the native shell.
    MobileLoginToken,
}

impl CodeKind {
    fn is_numeric(self) -> bool {
        matches!(self, CodeKind::EmailVerify | CodeKind::PhoneLoginOtp)
    }
}

/// VerificationCode - ephemeral proof records
///
/// Targets (phone numbers or emails) are hashed for privacy; we never store
/// raw identifiers in this table. Codes are single-use: consumption is a
/// DELETE, so a replay finds nothing.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VerificationCode {
    pub id: CodeId,
    /// Absent for phone-login codes issued before the account exists.
    pub user_id: Option<UserId>,
    pub target_hash: String,
    pub code: String,
    pub kind: CodeKind,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl VerificationCode {
    /// Issue a fresh code for (target, kind).
    ///
    /// Deletes any live code for the pair first, so exactly one live code
    /// exists per (target, kind) afterward. The delete-then-insert pair is
    /// deliberately not wrapped in a transaction: concurrent issuance for
    /// the same target resolves last-writer-wins, and lookups are by code
    /// value so a transient second live code is benign.
    pub async fn issue(
        target: &str,
        kind: CodeKind,
        ttl: Duration,
        user_id: Option<UserId>,
        pool: &PgPool,
    ) -> Result<Self> {
        let target_hash = hash_target(target);

        sqlx::query("DELETE FROM verification_codes WHERE target_hash = $1 AND kind = $2")
            .bind(&target_hash)
            .bind(kind)
            .execute(pool)
            .await?;

        let code = if kind.is_numeric() {
            generate_numeric_code()
        } else {
            generate_login_token()
        };

        let record = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO verification_codes (id, user_id, target_hash, code, kind, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(CodeId::new())
        .bind(user_id)
        .bind(target_hash)
        .bind(code)
        .bind(kind)
        .bind(Utc::now() + ttl)
        .fetch_one(pool)
        .await?;

        Ok(record)
    }

    /// Consume a live code matching (target, code, kind).
    ///
    /// Single statement (DELETE ... RETURNING): the first caller gets the
    /// row, anyone else gets `None`. Expired codes never match even when
    /// the value is correct.
    pub async fn consume(
        target: &str,
        code: &str,
        kind: CodeKind,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let record = sqlx::query_as::<_, Self>(
            r#"
            DELETE FROM verification_codes
            WHERE target_hash = $1 AND code = $2 AND kind = $3 AND expires_at > now()
            RETURNING *
            "#,
        )
        .bind(hash_target(target))
        .bind(code)
        .bind(kind)
        .fetch_optional(pool)
        .await?;
        Ok(record)
    }

    /// Redeem a login-handoff token.
    ///
    /// The caller presents both the token value and the account it claims
    /// to belong to; a mismatch on either matches zero rows. Accepts both
    /// bridge kinds (phone and mobile OAuth). Atomic per record: under
    /// concurrent redemption exactly one request gets the row back, every
    /// other sees zero rows affected.
    pub async fn redeem_login_token(
        token: &str,
        user_id: UserId,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let record = sqlx::query_as::<_, Self>(
            r#"
            DELETE FROM verification_codes
            WHERE code = $1
              AND user_id = $2
              AND kind IN ('phone_login_token', 'mobile_login_token')
              AND expires_at > now()
            RETURNING *
            "#,
        )
        .bind(token)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
        Ok(record)
    }

    /// Count live codes for (target, kind)
    pub async fn count_live(target: &str, kind: CodeKind, pool: &PgPool) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM verification_codes
             WHERE target_hash = $1 AND kind = $2 AND expires_at > now()",
        )
        .bind(hash_target(target))
        .bind(kind)
        .fetch_one(pool)
        .await?;
        Ok(count)
    }
}

// =============================================================================
// Utility Functions
// =============================================================================

/// Hash a verification target (phone number or email) using SHA256.
///
/// Targets are hashed for privacy - the codes table never holds raw
/// identifiers. The hash is the lookup key for issuance and consumption.
pub fn hash_target(target: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(target.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Generate a 6-digit numeric code, uniformly random, leading zeros kept.
fn generate_numeric_code() -> String {
    let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("{:06}", n)
}

/// Generate an opaque alphanumeric login-handoff token.
fn generate_login_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(LOGIN_TOKEN_LEN)
        .map(char::from)
        .collect()
}
