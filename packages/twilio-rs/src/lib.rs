use std::collections::HashMap;
use std::time::Duration;

pub mod models;

use reqwest::{Client, StatusCode};
use thiserror::Error;

use crate::models::{MessageResponse, Room, TwilioErrorBody};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// Twilio error code 53113: "Room exists" when creating a room whose
// UniqueName is already in progress.
const ROOM_EXISTS_CODE: i64 = 53113;

#[derive(Debug, Error)]
pub enum TwilioError {
    #[error("twilio request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("twilio returned {status}: {message}")]
    Api { status: StatusCode, message: String },

    #[error("failed to parse twilio response: {0}")]
    Parse(String),
}

#[derive(Debug, Clone, Default)]
pub struct TwilioOptions {
    pub account_sid: String,
    pub auth_token: String,
    /// E.164 sender number for outbound SMS.
    pub messaging_from: String,
}

/// Thin client over the Twilio REST API.
///
/// Covers the two things the platform needs from Twilio: delivering SMS
/// messages (OTP codes) and provisioning ephemeral video rooms for bookings.
#[derive(Debug, Clone)]
pub struct TwilioService {
    options: TwilioOptions,
    client: Client,
}

impl TwilioService {
    pub fn new(options: TwilioOptions) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self { options, client }
    }

    /// Send an SMS to `recipient` via the Messages API.
    pub async fn send_sms(&self, recipient: &str, body: &str) -> Result<MessageResponse, TwilioError> {
        let url = format!(
            "https://api.twilio.com/2010-04-01/Accounts/{}/Messages.json",
            self.options.account_sid
        );

        let mut form: HashMap<&str, &str> = HashMap::new();
        form.insert("To", recipient);
        form.insert("From", &self.options.messaging_from);
        form.insert("Body", body);

        let response = self
            .client
            .post(url)
            .basic_auth(&self.options.account_sid, Some(&self.options.auth_token))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(api_error(status, response).await);
        }

        response
            .json::<MessageResponse>()
            .await
            .map_err(|e| TwilioError::Parse(e.to_string()))
    }

    /// Fetch or create the video room named `unique_name`.
    ///
    /// Creation is idempotent from the caller's perspective: if the room
    /// already exists, the existing room is fetched and returned.
    pub async fn ensure_room(&self, unique_name: &str) -> Result<Room, TwilioError> {
        let mut form: HashMap<&str, &str> = HashMap::new();
        form.insert("UniqueName", unique_name);
        form.insert("Type", "go");

        let response = self
            .client
            .post("https://video.twilio.com/v1/Rooms")
            .basic_auth(&self.options.account_sid, Some(&self.options.auth_token))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<Room>()
                .await
                .map_err(|e| TwilioError::Parse(e.to_string()));
        }

        // Room already in progress for this UniqueName - fetch it instead.
        let body = response.json::<TwilioErrorBody>().await.ok();
        if body.as_ref().and_then(|b| b.code) == Some(ROOM_EXISTS_CODE) {
            return self.fetch_room(unique_name).await;
        }

        let message = body
            .and_then(|b| b.message)
            .unwrap_or_else(|| "unknown error".to_string());
        Err(TwilioError::Api { status, message })
    }

    async fn fetch_room(&self, unique_name: &str) -> Result<Room, TwilioError> {
        let url = format!("https://video.twilio.com/v1/Rooms/{}", unique_name);

        let response = self
            .client
            .get(url)
            .basic_auth(&self.options.account_sid, Some(&self.options.auth_token))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(api_error(status, response).await);
        }

        response
            .json::<Room>()
            .await
            .map_err(|e| TwilioError::Parse(e.to_string()))
    }
}

async fn api_error(status: StatusCode, response: reqwest::Response) -> TwilioError {
    let message = match response.json::<TwilioErrorBody>().await {
        Ok(body) => body.message.unwrap_or_else(|| "unknown error".to_string()),
        Err(_) => "unknown error".to_string(),
    };
    TwilioError::Api { status, message }
}
