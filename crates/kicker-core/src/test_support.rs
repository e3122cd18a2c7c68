//! Shared fixtures for unit tests

use kicker_api::{IdentityMode, NowPlayingItem, PlayState, RemoteCommand, Session};
use kicker_store::{SqliteStore, Store};
use kicker_util::{DeviceId, EntityId, ItemId, SessionId, UserId};

/// An unpaused session playing `item-{id}` that supports every remote command
pub fn playing(id: &str, user: &str, device: &str, item_type: &str) -> Session {
    Session {
        id: SessionId::new(id),
        user_id: Some(UserId::new(user)),
        user_name: None,
        device_id: Some(DeviceId::new(device)),
        device_name: None,
        now_playing_item: Some(NowPlayingItem {
            id: ItemId::new(format!("item-{}", id)),
            item_type: item_type.to_string(),
            name: None,
        }),
        play_state: PlayState::default(),
        supported_commands: vec![
            RemoteCommand::DisplayMessage.as_str().to_string(),
            RemoteCommand::PlayMediaSource.as_str().to_string(),
        ],
        supports_media_control: true,
    }
}

pub fn restrict(store: &SqliteStore, kind: IdentityMode, entity: &str, media_type: &str) {
    store
        .add_restriction(kind, &EntityId::new(entity), media_type)
        .unwrap();
}
