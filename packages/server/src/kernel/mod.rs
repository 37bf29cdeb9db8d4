// Infrastructure layer: dependency container and external-service traits

pub mod deps;
pub mod push;
pub mod traits;

pub use deps::{NoopCodeDelivery, ServerDeps, TwilioCodeDelivery, TwilioVideoRooms};
pub use push::ExpoClient;
pub use traits::{
    BaseCodeDelivery, BaseIdentityProvider, BasePushService, BaseVideoRoomService,
    ProviderUserInfo, VideoRoom,
};
