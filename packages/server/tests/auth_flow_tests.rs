//! Integration tests for the authentication flows.
//!
//! These exercise the real OTP/bridge/exchange paths against Postgres with
//! fake external services. All tests are `#[ignore]` and require
//! `TEST_DATABASE_URL`; run with `cargo test -- --ignored`.

mod common;

use common::{unique_email, unique_phone, TestHarness};

use server_core::domains::auth::models::{CodeKind, VerificationCode};
use server_core::domains::auth::otp::{SendCodeOutcome, VerifyLoginOutcome};
use server_core::domains::auth::{bridge, oauth, otp, password, AuthFlowError};
use server_core::domains::users::{NewUser, User};
use server_core::kernel::ProviderUserInfo;

async fn create_phone_user(harness: &TestHarness, phone: &str) -> User {
    User::create(
        NewUser {
            phone: Some(phone.to_string()),
            display_name: "Test User".to_string(),
            ..Default::default()
        },
        &harness.db_pool,
    )
    .await
    .expect("Failed to create user")
}

fn sent_code(harness: &TestHarness, target: &str) -> String {
    harness
        .code_delivery
        .last_code_for(target)
        .expect("no code delivered")
}

// ============================================================================
// OTP issuance and consumption
// ============================================================================

#[tokio::test]
#[ignore]
async fn reissue_leaves_exactly_one_live_code() {
    let harness = TestHarness::new().await.unwrap();
    let phone = unique_phone();

    for _ in 0..3 {
        otp::send_login_code(&phone, &harness.deps).await.unwrap();
    }

    let live = VerificationCode::count_live(&phone, CodeKind::PhoneLoginOtp, &harness.db_pool)
        .await
        .unwrap();
    assert_eq!(live, 1);

    // The surviving code is the latest one delivered.
    let code = sent_code(&harness, &phone);
    let record = VerificationCode::consume(&phone, &code, CodeKind::PhoneLoginOtp, &harness.db_pool)
        .await
        .unwrap();
    assert!(record.is_some());
}

#[tokio::test]
#[ignore]
async fn code_verifies_exactly_once() {
    let harness = TestHarness::new().await.unwrap();
    let phone = unique_phone();
    create_phone_user(&harness, &phone).await;

    otp::send_login_code(&phone, &harness.deps).await.unwrap();
    let code = sent_code(&harness, &phone);

    let first = otp::verify_login_code(&phone, &code, &harness.deps)
        .await
        .unwrap();
    assert!(matches!(first, VerifyLoginOutcome::Handoff { .. }));

    let replay = otp::verify_login_code(&phone, &code, &harness.deps).await;
    assert!(matches!(replay, Err(AuthFlowError::InvalidOrExpiredCode)));
}

#[tokio::test]
#[ignore]
async fn expired_code_rejected_despite_correct_value() {
    let harness = TestHarness::new().await.unwrap();
    let phone = unique_phone();
    create_phone_user(&harness, &phone).await;

    // Issue directly with a TTL already in the past.
    let record = VerificationCode::issue(
        &phone,
        CodeKind::PhoneLoginOtp,
        chrono::Duration::minutes(-1),
        None,
        &harness.db_pool,
    )
    .await
    .unwrap();

    let result = otp::verify_login_code(&phone, &record.code, &harness.deps).await;
    assert!(matches!(result, Err(AuthFlowError::InvalidOrExpiredCode)));
}

#[tokio::test]
#[ignore]
async fn wrong_code_rejected() {
    let harness = TestHarness::new().await.unwrap();
    let phone = unique_phone();
    create_phone_user(&harness, &phone).await;

    otp::send_login_code(&phone, &harness.deps).await.unwrap();

    let result = otp::verify_login_code(&phone, "000000x", &harness.deps).await;
    assert!(matches!(result, Err(AuthFlowError::InvalidOrExpiredCode)));
}

#[tokio::test]
#[ignore]
async fn unknown_target_with_correct_code_needs_signup() {
    let harness = TestHarness::new().await.unwrap();
    let phone = unique_phone();

    let outcome = otp::send_login_code(&phone, &harness.deps).await.unwrap();
    assert!(matches!(outcome, SendCodeOutcome::Sent));
    let code = sent_code(&harness, &phone);

    let result = otp::verify_login_code(&phone, &code, &harness.deps)
        .await
        .unwrap();
    assert!(matches!(result, VerifyLoginOutcome::NeedsSignup));

    // The code was still consumed on the way through.
    let replay = otp::verify_login_code(&phone, &code, &harness.deps).await;
    assert!(matches!(replay, Err(AuthFlowError::InvalidOrExpiredCode)));
}

// ============================================================================
// Login-token bridge
// ============================================================================

#[tokio::test]
#[ignore]
async fn full_phone_login_flow_mints_valid_session() {
    let harness = TestHarness::new().await.unwrap();
    let phone = unique_phone();
    let user = create_phone_user(&harness, &phone).await;

    otp::send_login_code(&phone, &harness.deps).await.unwrap();
    let code = sent_code(&harness, &phone);

    let (login_token, handoff_user_id) = match otp::verify_login_code(&phone, &code, &harness.deps)
        .await
        .unwrap()
    {
        VerifyLoginOutcome::Handoff {
            login_token,
            user_id,
        } => (login_token, user_id),
        other => panic!("expected handoff, got {:?}", other),
    };
    assert_eq!(handoff_user_id, user.id);

    let (redeemed, artifact) = bridge::redeem_login_token(&login_token, handoff_user_id, &harness.deps)
        .await
        .unwrap();
    assert_eq!(redeemed.id, user.id);

    let claims = harness.deps.jwt_service.validate(&artifact).unwrap();
    assert_eq!(claims.user_id, user.id);
    assert_eq!(claims.role, user.role);

    // Verification stamped the phone along the way.
    let reloaded = User::find_by_id(user.id, &harness.db_pool)
        .await
        .unwrap()
        .unwrap();
    assert!(reloaded.phone_verified_at.is_some());
}

#[tokio::test]
#[ignore]
async fn concurrent_redemption_has_one_winner() {
    let harness = TestHarness::new().await.unwrap();
    let phone = unique_phone();
    let user = create_phone_user(&harness, &phone).await;

    let token = bridge::issue_login_token(
        &phone,
        CodeKind::PhoneLoginToken,
        user.id,
        &harness.db_pool,
    )
    .await
    .unwrap();

    let (a, b) = tokio::join!(
        bridge::redeem_login_token(&token, user.id, &harness.deps),
        bridge::redeem_login_token(&token, user.id, &harness.deps),
    );

    let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(successes, 1, "exactly one concurrent redemption may win");
}

#[tokio::test]
#[ignore]
async fn redemption_with_wrong_user_fails_and_preserves_token() {
    let harness = TestHarness::new().await.unwrap();
    let phone = unique_phone();
    let user = create_phone_user(&harness, &phone).await;
    let other = create_phone_user(&harness, &unique_phone()).await;

    let token = bridge::issue_login_token(
        &phone,
        CodeKind::PhoneLoginToken,
        user.id,
        &harness.db_pool,
    )
    .await
    .unwrap();

    // A leaked token value alone is not enough: the presented user id must
    // match the account the token was issued for.
    let wrong = bridge::redeem_login_token(&token, other.id, &harness.deps).await;
    assert!(matches!(wrong, Err(AuthFlowError::InvalidOrExpiredCode)));

    // The failed attempt consumed nothing; the rightful holder still wins.
    let (redeemed, _) = bridge::redeem_login_token(&token, user.id, &harness.deps)
        .await
        .unwrap();
    assert_eq!(redeemed.id, user.id);
}

// ============================================================================
// External identity exchange
// ============================================================================

fn google_profile(email: &str) -> ProviderUserInfo {
    ProviderUserInfo {
        email: Some(email.to_string()),
        name: Some("Ana Lopez".to_string()),
        avatar_url: Some("https://lh3.example.com/ana".to_string()),
    }
}

#[tokio::test]
#[ignore]
async fn google_exchange_creates_then_reuses_account() {
    let email = unique_email("google");
    let harness = TestHarness::with_google_profile(google_profile(&email))
        .await
        .unwrap();

    let (first, _) = oauth::exchange_google_access_token("tok", &harness.deps)
        .await
        .unwrap();
    assert_eq!(first.email.as_deref(), Some(email.as_str()));
    assert_eq!(first.role, server_core::common::Role::Owner);
    assert!(!first.verified);

    let (second, _) = oauth::exchange_google_access_token("tok", &harness.deps)
        .await
        .unwrap();
    assert_eq!(second.id, first.id, "same email must reuse the account");
}

#[tokio::test]
#[ignore]
async fn google_exchange_surfaces_upstream_failure() {
    let harness = TestHarness::new().await.unwrap();

    let result = oauth::exchange_google_access_token("bad-token", &harness.deps).await;
    assert!(matches!(result, Err(AuthFlowError::UpstreamAuthFailure(_))));
}

#[tokio::test]
#[ignore]
async fn apple_exchange_uses_hint_email_on_repeat_signin() {
    let harness = TestHarness::new().await.unwrap();
    let email = unique_email("apple");

    // Token without an email claim, profile hint supplies it.
    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &serde_json::json!({ "sub": "001234.abcdef", "exp": 0 }),
        &jsonwebtoken::EncodingKey::from_secret(b"irrelevant"),
    )
    .unwrap();

    let hint = oauth::AppleProfileHint {
        email: Some(email.clone()),
        full_name: Some("Ana Lopez".to_string()),
    };
    let (user, _) = oauth::exchange_apple_identity_token(&token, &hint, &harness.deps)
        .await
        .unwrap();
    assert_eq!(user.email.as_deref(), Some(email.as_str()));
    assert_eq!(user.display_name, "Ana Lopez");
}

// ============================================================================
// Password channel
// ============================================================================

#[tokio::test]
#[ignore]
async fn register_login_and_duplicate_conflict() {
    let harness = TestHarness::new().await.unwrap();
    let email = unique_email("pw");

    let (user, artifact) = password::register(
        password::RegisterInput {
            email: email.clone(),
            password: "correct horse".to_string(),
            display_name: "Ana".to_string(),
        },
        &harness.deps,
    )
    .await
    .unwrap();
    assert!(harness.deps.jwt_service.validate(&artifact).is_ok());

    let (logged_in, _) = password::login(&email, "correct horse", &harness.deps)
        .await
        .unwrap();
    assert_eq!(logged_in.id, user.id);

    let wrong = password::login(&email, "wrong password", &harness.deps).await;
    assert!(matches!(wrong, Err(AuthFlowError::InvalidCredentials)));

    let dup = password::register(
        password::RegisterInput {
            email,
            password: "another pass".to_string(),
            display_name: "Imposter".to_string(),
        },
        &harness.deps,
    )
    .await;
    assert!(matches!(dup, Err(AuthFlowError::Conflict(_))));
}

// ============================================================================
// Suspension
// ============================================================================

#[tokio::test]
#[ignore]
async fn suspended_user_blocked_on_every_channel() {
    let email = unique_email("suspended");
    let phone = unique_phone();
    let harness = TestHarness::with_google_profile(google_profile(&email))
        .await
        .unwrap();

    // Account with password, phone and the google-visible email.
    let (user, _) = password::register(
        password::RegisterInput {
            email: email.clone(),
            password: "correct horse".to_string(),
            display_name: "Ana".to_string(),
        },
        &harness.deps,
    )
    .await
    .unwrap();
    sqlx::query("UPDATE users SET phone = $2 WHERE id = $1")
        .bind(user.id)
        .bind(&phone)
        .execute(&harness.db_pool)
        .await
        .unwrap();

    // Token issued before suspension lands.
    let pre_suspension_token = bridge::issue_login_token(
        &phone,
        CodeKind::PhoneLoginToken,
        user.id,
        &harness.db_pool,
    )
    .await
    .unwrap();

    User::set_suspended(user.id, true, &harness.db_pool)
        .await
        .unwrap();

    let pw = password::login(&email, "correct horse", &harness.deps).await;
    assert!(matches!(pw, Err(AuthFlowError::AccountSuspended)));

    otp::send_login_code(&phone, &harness.deps).await.unwrap();
    let code = sent_code(&harness, &phone);
    let phone_login = otp::verify_login_code(&phone, &code, &harness.deps).await;
    assert!(matches!(phone_login, Err(AuthFlowError::AccountSuspended)));

    let google = oauth::exchange_google_access_token("tok", &harness.deps).await;
    assert!(matches!(google, Err(AuthFlowError::AccountSuspended)));

    let redeem = bridge::redeem_login_token(&pre_suspension_token, user.id, &harness.deps).await;
    assert!(matches!(redeem, Err(AuthFlowError::AccountSuspended)));
}

// ============================================================================
// Email verification
// ============================================================================

#[tokio::test]
#[ignore]
async fn email_verification_flow_stamps_account() {
    let harness = TestHarness::new().await.unwrap();
    let email = unique_email("verify");

    let (user, _) = password::register(
        password::RegisterInput {
            email: email.clone(),
            password: "correct horse".to_string(),
            display_name: "Ana".to_string(),
        },
        &harness.deps,
    )
    .await
    .unwrap();
    assert!(user.email_verified_at.is_none());

    otp::send_email_verification(&user, &harness.deps)
        .await
        .unwrap();
    let code = sent_code(&harness, &email);

    otp::verify_email(&user, &code, &harness.deps).await.unwrap();

    let reloaded = User::find_by_id(user.id, &harness.db_pool)
        .await
        .unwrap()
        .unwrap();
    assert!(reloaded.email_verified_at.is_some());
}
