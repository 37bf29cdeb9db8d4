//! Test harness for database-backed integration tests.
//!
//! Connects to the database named by `TEST_DATABASE_URL` and runs
//! migrations once per test process. Tests that need it are marked
//! `#[ignore]` so the default `cargo test` run stays database-free:
//!
//! ```text
//! TEST_DATABASE_URL=postgres://... cargo test -- --ignored
//! ```

use anyhow::{Context, Result};
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::OnceCell;

use server_core::domains::auth::JwtService;
use server_core::kernel::{BaseIdentityProvider, ProviderUserInfo, ServerDeps};

use super::fakes::{FakeIdentityProvider, FakeVideoRooms, NoopPushService, RecordingCodeDelivery};

static MIGRATIONS: OnceCell<()> = OnceCell::const_new();

async fn test_pool() -> Result<PgPool> {
    let url = std::env::var("TEST_DATABASE_URL")
        .context("TEST_DATABASE_URL must be set for integration tests")?;

    let pool = PgPool::connect(&url)
        .await
        .context("Failed to connect to test database")?;

    MIGRATIONS
        .get_or_try_init(|| {
            let pool = pool.clone();
            async move {
                sqlx::migrate!("./migrations")
                    .run(&pool)
                    .await
                    .context("Failed to run migrations")
            }
        })
        .await?;

    Ok(pool)
}

/// Test infrastructure: a real database behind fake external services.
pub struct TestHarness {
    pub db_pool: PgPool,
    pub deps: Arc<ServerDeps>,
    pub code_delivery: Arc<RecordingCodeDelivery>,
}

impl TestHarness {
    pub async fn new() -> Result<Self> {
        Self::with_identity_provider(Arc::new(FakeIdentityProvider::failing())).await
    }

    /// Harness with a Google userinfo fake that returns `info`.
    pub async fn with_google_profile(info: ProviderUserInfo) -> Result<Self> {
        Self::with_identity_provider(Arc::new(FakeIdentityProvider::returning(info))).await
    }

    async fn with_identity_provider(
        identity_provider: Arc<dyn BaseIdentityProvider>,
    ) -> Result<Self> {
        let db_pool = test_pool().await?;
        let code_delivery = Arc::new(RecordingCodeDelivery::default());

        let deps = Arc::new(ServerDeps::new(
            db_pool.clone(),
            code_delivery.clone(),
            Arc::new(NoopPushService),
            Arc::new(FakeVideoRooms),
            identity_provider,
            Arc::new(JwtService::new("test_secret", "test_issuer".to_string())),
            vec![],
            false,
        ));

        Ok(Self {
            db_pool,
            deps,
            code_delivery,
        })
    }
}

/// Unique email per call so tests never collide on the unique constraint.
pub fn unique_email(prefix: &str) -> String {
    format!("{}+{}@example.com", prefix, uuid::Uuid::new_v4().simple())
}

/// Unique E.164-ish phone number per call.
pub fn unique_phone() -> String {
    let n = uuid::Uuid::new_v4().as_u128() % 1_000_000_000;
    format!("+1555{:09}", n)
}
