use thiserror::Error;

/// Errors surfaced by the authentication flows.
///
/// Every variant maps to a stable status classification at the HTTP layer
/// (see `server::routes::error`). Credential failures are deliberately
/// uniform: `InvalidCredentials` and `InvalidOrExpiredCode` never reveal
/// whether the email/phone exists.
#[derive(Error, Debug)]
pub enum AuthFlowError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Invalid or expired code")]
    InvalidOrExpiredCode,

    #[error("Account suspended")]
    AccountSuspended,

    #[error("Identity provider error: {0}")]
    UpstreamAuthFailure(String),

    #[error("Malformed identity token: {0}")]
    MalformedToken(String),

    #[error("No email available from provider or profile")]
    EmailUnavailable,

    #[error("Invalid session")]
    InvalidSession,

    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AuthFlowError {
    /// True for the unique-violation shape of a registration conflict.
    pub fn is_unique_violation(err: &sqlx::Error) -> bool {
        matches!(
            err,
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505")
        )
    }
}
