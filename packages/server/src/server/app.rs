//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use twilio::{TwilioOptions, TwilioService};

use crate::domains::auth::JwtService;
use crate::kernel::{
    BaseCodeDelivery, ExpoClient, NoopCodeDelivery, ServerDeps, TwilioCodeDelivery,
    TwilioVideoRooms,
};
use crate::server::middleware::jwt_auth_middleware;
use crate::server::routes::{admin, auth, health_handler, profile, video};
use crate::Config;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub deps: Arc<ServerDeps>,
}

/// Build the Axum application router.
///
/// Every external client is constructed here once and injected through
/// `ServerDeps` - handlers never reach for globals. Missing Twilio
/// credentials degrade SMS delivery to a logged no-op instead of failing
/// startup, so local development needs no secrets beyond the database.
pub fn build_app(pool: PgPool, config: &Config) -> Router {
    let jwt_service = Arc::new(JwtService::new(&config.jwt_secret, config.jwt_issuer.clone()));

    let twilio = match (
        config.twilio_account_sid.clone(),
        config.twilio_auth_token.clone(),
        config.twilio_messaging_from.clone(),
    ) {
        (Some(account_sid), Some(auth_token), Some(messaging_from)) => {
            Some(Arc::new(TwilioService::new(TwilioOptions {
                account_sid,
                auth_token,
                messaging_from,
            })))
        }
        _ => {
            tracing::warn!("Twilio credentials not configured; SMS delivery disabled");
            None
        }
    };

    let code_delivery: Arc<dyn BaseCodeDelivery> = match &twilio {
        Some(twilio) => Arc::new(TwilioCodeDelivery::new(twilio.clone())),
        None => Arc::new(NoopCodeDelivery),
    };

    // Video rooms share the Twilio account; without credentials the route
    // fails per-request rather than at startup.
    let video_rooms = Arc::new(TwilioVideoRooms::new(twilio.unwrap_or_else(|| {
        Arc::new(TwilioService::new(TwilioOptions::default()))
    })));

    let deps = Arc::new(ServerDeps::new(
        pool,
        code_delivery,
        Arc::new(ExpoClient::new(config.expo_access_token.clone())),
        video_rooms,
        Arc::new(crate::domains::auth::oauth::GoogleAuth::new()),
        jwt_service.clone(),
        config.admin_emails.clone(),
        config.test_login_enabled,
    ));

    let app_state = AppState { deps };

    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    // Auth endpoints are the abuse magnet: 5/sec with a burst of 10 per IP.
    let rate_limit_config = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(5)
            .burst_size(10)
            .use_headers()
            .finish()
            .expect("Rate limiter configuration is valid and should never fail"),
    );
    let rate_limit_layer = GovernorLayer {
        config: rate_limit_config,
    };

    let auth_routes = Router::new()
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/auth/logout", post(auth::logout_handler))
        .route("/auth/phone/send-code", post(auth::send_code_handler))
        .route("/auth/phone/verify", post(auth::verify_code_handler))
        .route("/auth/token/redeem", post(auth::redeem_handler))
        .route("/auth/oauth/google", post(auth::google_exchange_handler))
        .route("/auth/oauth/apple", post(auth::apple_exchange_handler))
        .route(
            "/auth/email/send-verification",
            post(auth::send_email_verification_handler),
        )
        .route("/auth/email/verify", post(auth::verify_email_handler))
        .layer(rate_limit_layer);

    let jwt_service_for_middleware = jwt_service.clone();

    auth_routes
        .route(
            "/me",
            get(profile::me_handler).patch(profile::update_profile_handler),
        )
        .route("/me/role", post(profile::choose_role_handler))
        .route("/me/push-token", post(profile::push_token_handler))
        .route("/admin/users/:id/suspend", post(admin::suspend_handler))
        .route("/admin/users/:id/unsuspend", post(admin::unsuspend_handler))
        .route("/admin/users/:id/verify", post(admin::verify_provider_handler))
        .route("/bookings/:id/video-room", post(video::video_room_handler))
        .route("/health", get(health_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(middleware::from_fn(move |req, next| {
            jwt_auth_middleware(jwt_service_for_middleware.clone(), req, next)
        }))
        .layer(Extension(app_state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
