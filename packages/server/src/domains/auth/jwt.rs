use anyhow::Result;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::{Role, UserId};
use crate::domains::auth::error::AuthFlowError;
use crate::domains::users::User;

/// Session claims - data embedded in the artifact
///
/// Carries everything a handler needs to authorize a request (id, role,
/// display fields) so validation never touches the database.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    pub sub: String,       // Subject (user_id as string)
    pub user_id: UserId,   // User ID
    pub role: Role,        // Role at mint time
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub exp: i64,          // Expiration timestamp
    pub iat: i64,          // Issued at timestamp
    pub iss: String,       // Issuer
    pub jti: String,       // Unique token identifier
}

/// Session codec - mints and validates signed session artifacts
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
}

impl JwtService {
    /// Create new service with process-wide secret and issuer
    pub fn new(secret: &str, issuer: String) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
        }
    }

    /// Mint a session artifact for a user
    ///
    /// Artifact expires after 24 hours. Deterministic format: any holder of
    /// the secret can validate it without a database lookup.
    pub fn mint(&self, user: &User) -> Result<String> {
        let now = chrono::Utc::now();
        let exp = now + chrono::Duration::hours(24);

        let claims = SessionClaims {
            sub: user.id.to_string(),
            user_id: user.id,
            role: user.role,
            display_name: user.display_name.clone(),
            avatar_url: user.avatar_url.clone(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(Into::into)
    }

    /// Validate a session artifact
    ///
    /// Verifies signature, structure, issuer and the embedded validity
    /// window. Any failure is `InvalidSession` - callers never learn why.
    pub fn validate(&self, artifact: &str) -> Result<SessionClaims, AuthFlowError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);

        decode::<SessionClaims>(artifact, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| AuthFlowError::InvalidSession)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_user(role: Role) -> User {
        User {
            id: UserId::new(),
            email: Some("ana@example.com".to_string()),
            phone: None,
            password_hash: None,
            display_name: "Ana".to_string(),
            avatar_url: Some("https://cdn.example.com/ana.png".to_string()),
            role,
            role_locked: true,
            verified: true,
            suspended: false,
            push_token: None,
            email_verified_at: None,
            phone_verified_at: None,
            created_at: Utc::now(),
        }
    }

    fn test_service() -> JwtService {
        JwtService::new("test_secret_key", "test_issuer".to_string())
    }

    #[test]
    fn test_mint_and_validate_roundtrip() {
        let service = test_service();
        let user = test_user(Role::Groomer);

        let artifact = service.mint(&user).unwrap();
        let claims = service.validate(&artifact).unwrap();

        assert_eq!(claims.user_id, user.id);
        assert_eq!(claims.role, Role::Groomer);
        assert_eq!(claims.display_name, "Ana");
        assert_eq!(claims.avatar_url.as_deref(), Some("https://cdn.example.com/ana.png"));
        assert_eq!(claims.iss, "test_issuer");
        assert_eq!(claims.sub, user.id.to_string());
    }

    #[test]
    fn test_invalid_artifact() {
        let service = test_service();
        let result = service.validate("not_a_token");
        assert!(matches!(result, Err(AuthFlowError::InvalidSession)));
    }

    #[test]
    fn test_tampered_artifact_fails() {
        let service = test_service();
        let artifact = service.mint(&test_user(Role::Owner)).unwrap();

        // Flip one byte in the payload segment
        let mut bytes = artifact.into_bytes();
        let mid = bytes.len() / 2;
        bytes[mid] = if bytes[mid] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(bytes).unwrap();

        let result = service.validate(&tampered);
        assert!(matches!(result, Err(AuthFlowError::InvalidSession)));
    }

    #[test]
    fn test_wrong_secret() {
        let service1 = JwtService::new("secret1", "test_issuer".to_string());
        let service2 = JwtService::new("secret2", "test_issuer".to_string());

        let artifact = service1.mint(&test_user(Role::Owner)).unwrap();
        assert!(service2.validate(&artifact).is_err());
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let service1 = JwtService::new("secret", "issuer_a".to_string());
        let service2 = JwtService::new("secret", "issuer_b".to_string());

        let artifact = service1.mint(&test_user(Role::Owner)).unwrap();
        assert!(service2.validate(&artifact).is_err());
    }

    #[test]
    fn test_validity_window() {
        let service = test_service();
        let artifact = service.mint(&test_user(Role::Owner)).unwrap();
        let claims = service.validate(&artifact).unwrap();

        let now = chrono::Utc::now().timestamp();
        let expires_in = claims.exp - now;
        assert!(expires_in > 23 * 3600);
        assert!(expires_in <= 24 * 3600);
    }
}
