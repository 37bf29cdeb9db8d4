//! Booking video-room provisioning.

use axum::{
    extract::{Extension, Path},
    Json,
};
use serde_json::json;

use crate::common::BookingId;
use crate::server::app::AppState;
use crate::server::middleware::AuthUser;
use crate::server::routes::error::ApiError;
use crate::server::routes::require_auth;

/// Fetch-or-create the video room for a booking.
///
/// Room names are derived from the booking id, so both parties land in the
/// same room no matter who asks first.
pub async fn video_room_handler(
    Extension(state): Extension<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(booking_id): Path<BookingId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_auth(auth)?;

    let room = state
        .deps
        .video_rooms
        .ensure_room(&format!("booking-{}", booking_id))
        .await?;

    Ok(Json(json!({ "sid": room.sid, "name": room.name })))
}
