use axum::{middleware::Next, response::Response};
use std::sync::Arc;
use tracing::debug;

use crate::common::{Role, UserId};
use crate::domains::auth::bridge::SESSION_COOKIE;
use crate::domains::auth::JwtService;

/// Authenticated user information from the session artifact
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: UserId,
    pub role: Role,
    pub display_name: String,
}

/// Session authentication middleware
///
/// Extracts the artifact from the Authorization header (native clients) or
/// the session cookie (web clients), validates it, and adds AuthUser to
/// request extensions. Requests without a valid artifact continue without
/// AuthUser - individual handlers decide whether auth is required.
pub async fn jwt_auth_middleware(
    jwt_service: Arc<JwtService>,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let auth_user = extract_auth_user(&request, &jwt_service);

    if let Some(user) = auth_user {
        debug!("Authenticated user: {} ({})", user.user_id, user.role);
        request.extensions_mut().insert(user);
    } else {
        debug!("No valid session artifact");
    }

    next.run(request).await
}

/// Extract and validate the session artifact from a request.
///
/// Bearer wins over cookie when both are present, so a native client inside
/// a web view never silently runs as the cookie's user.
fn extract_auth_user(
    request: &axum::http::Request<axum::body::Body>,
    jwt_service: &JwtService,
) -> Option<AuthUser> {
    let artifact = bearer_artifact(request).or_else(|| cookie_artifact(request))?;
    let claims = jwt_service.validate(&artifact).ok()?;

    Some(AuthUser {
        user_id: claims.user_id,
        role: claims.role,
        display_name: claims.display_name,
    })
}

fn bearer_artifact(request: &axum::http::Request<axum::body::Body>) -> Option<String> {
    let auth_header = request.headers().get("authorization")?;
    let auth_str = auth_header.to_str().ok()?;

    // Handle both "Bearer <token>" and raw token
    Some(auth_str.strip_prefix("Bearer ").unwrap_or(auth_str).to_string())
}

fn cookie_artifact(request: &axum::http::Request<axum::body::Body>) -> Option<String> {
    let cookie_header = request.headers().get("cookie")?;
    let cookies = cookie_header.to_str().ok()?;

    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::users::User;
    use chrono::Utc;

    fn test_service() -> JwtService {
        JwtService::new("test_secret", "test_issuer".to_string())
    }

    fn test_user() -> User {
        User {
            id: UserId::new(),
            email: Some("ana@example.com".to_string()),
            phone: None,
            password_hash: None,
            display_name: "Ana".to_string(),
            avatar_url: None,
            role: Role::Owner,
            role_locked: false,
            verified: false,
            suspended: false,
            push_token: None,
            email_verified_at: None,
            phone_verified_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_extract_from_bearer_header() {
        let jwt_service = test_service();
        let user = test_user();
        let artifact = jwt_service.mint(&user).unwrap();

        let request = axum::http::Request::builder()
            .header("authorization", format!("Bearer {}", artifact))
            .body(axum::body::Body::empty())
            .unwrap();

        let auth_user = extract_auth_user(&request, &jwt_service).unwrap();
        assert_eq!(auth_user.user_id, user.id);
        assert_eq!(auth_user.role, Role::Owner);
    }

    #[test]
    fn test_extract_from_raw_header() {
        let jwt_service = test_service();
        let user = test_user();
        let artifact = jwt_service.mint(&user).unwrap();

        let request = axum::http::Request::builder()
            .header("authorization", artifact)
            .body(axum::body::Body::empty())
            .unwrap();

        assert!(extract_auth_user(&request, &jwt_service).is_some());
    }

    #[test]
    fn test_extract_from_cookie() {
        let jwt_service = test_service();
        let user = test_user();
        let artifact = jwt_service.mint(&user).unwrap();

        let request = axum::http::Request::builder()
            .header("cookie", format!("other=1; {}={}", SESSION_COOKIE, artifact))
            .body(axum::body::Body::empty())
            .unwrap();

        let auth_user = extract_auth_user(&request, &jwt_service).unwrap();
        assert_eq!(auth_user.user_id, user.id);
    }

    #[test]
    fn test_bearer_wins_over_cookie() {
        let jwt_service = test_service();
        let bearer_user = test_user();
        let cookie_user = test_user();
        let bearer = jwt_service.mint(&bearer_user).unwrap();
        let cookie = jwt_service.mint(&cookie_user).unwrap();

        let request = axum::http::Request::builder()
            .header("authorization", format!("Bearer {}", bearer))
            .header("cookie", format!("{}={}", SESSION_COOKIE, cookie))
            .body(axum::body::Body::empty())
            .unwrap();

        let auth_user = extract_auth_user(&request, &jwt_service).unwrap();
        assert_eq!(auth_user.user_id, bearer_user.id);
    }

    #[test]
    fn test_no_credentials() {
        let jwt_service = test_service();
        let request = axum::http::Request::builder()
            .body(axum::body::Body::empty())
            .unwrap();

        assert!(extract_auth_user(&request, &jwt_service).is_none());
    }

    #[test]
    fn test_invalid_artifact_ignored() {
        let jwt_service = test_service();
        let request = axum::http::Request::builder()
            .header("authorization", "Bearer invalid_token")
            .body(axum::body::Body::empty())
            .unwrap();

        assert!(extract_auth_user(&request, &jwt_service).is_none());
    }
}
