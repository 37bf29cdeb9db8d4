use serde::Deserialize;

/// Response from the Messages API after queueing an SMS.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub sid: String,
    pub status: String,
    pub to: String,
}

/// A video room as returned by the Video Rooms API.
#[derive(Debug, Clone, Deserialize)]
pub struct Room {
    pub sid: String,
    pub unique_name: String,
    pub status: String,
}

/// Error body Twilio returns on non-2xx responses.
#[derive(Debug, Clone, Deserialize)]
pub struct TwilioErrorBody {
    pub code: Option<i64>,
    pub message: Option<String>,
    pub status: Option<i64>,
}
