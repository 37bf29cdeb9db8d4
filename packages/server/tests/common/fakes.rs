//! In-process fakes for the infrastructure traits.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::Mutex;

use server_core::kernel::{
    BaseCodeDelivery, BaseIdentityProvider, BasePushService, BaseVideoRoomService,
    ProviderUserInfo, VideoRoom,
};

/// Records every delivered code so tests can read them back.
#[derive(Default)]
pub struct RecordingCodeDelivery {
    pub sent: Mutex<Vec<(String, String)>>,
}

impl RecordingCodeDelivery {
    pub fn last_code_for(&self, target: &str) -> Option<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(t, _)| t == target)
            .map(|(_, code)| code.clone())
    }
}

#[async_trait]
impl BaseCodeDelivery for RecordingCodeDelivery {
    async fn deliver_code(&self, target: &str, code: &str) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((target.to_string(), code.to_string()));
        Ok(())
    }
}

/// Push service that swallows everything.
pub struct NoopPushService;

#[async_trait]
impl BasePushService for NoopPushService {
    async fn send_notification(
        &self,
        _push_token: &str,
        _title: &str,
        _body: &str,
        _data: serde_json::Value,
    ) -> Result<()> {
        Ok(())
    }
}

/// Video rooms that echo the requested name back.
pub struct FakeVideoRooms;

#[async_trait]
impl BaseVideoRoomService for FakeVideoRooms {
    async fn ensure_room(&self, unique_name: &str) -> Result<VideoRoom> {
        Ok(VideoRoom {
            sid: format!("RM{}", unique_name),
            name: unique_name.to_string(),
        })
    }
}

/// Identity provider returning a programmable response.
///
/// `None` simulates an upstream failure (bad token, provider outage).
pub struct FakeIdentityProvider {
    pub info: Mutex<Option<ProviderUserInfo>>,
}

impl FakeIdentityProvider {
    pub fn returning(info: ProviderUserInfo) -> Self {
        Self {
            info: Mutex::new(Some(info)),
        }
    }

    pub fn failing() -> Self {
        Self {
            info: Mutex::new(None),
        }
    }
}

#[async_trait]
impl BaseIdentityProvider for FakeIdentityProvider {
    async fn fetch_user_info(&self, _access_token: &str) -> Result<ProviderUserInfo> {
        match self.info.lock().unwrap().clone() {
            Some(info) => Ok(info),
            None => anyhow::bail!("provider rejected the token"),
        }
    }
}
