//! Shared types for the media server API

use kicker_util::{DeviceId, EntityId, ItemId, SessionId, UserId};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Which identifier quota is tracked against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityMode {
    #[default]
    User,
    Device,
}

impl IdentityMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityMode::User => "user",
            IdentityMode::Device => "device",
        }
    }
}

impl fmt::Display for IdentityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for IdentityMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(IdentityMode::User),
            "device" => Ok(IdentityMode::Device),
            other => Err(format!("Unknown identity mode: {}", other)),
        }
    }
}

/// Remote commands a client may advertise in `SupportedCommands`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteCommand {
    DisplayMessage,
    PlayMediaSource,
}

impl RemoteCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteCommand::DisplayMessage => "DisplayMessage",
            RemoteCommand::PlayMediaSource => "PlayMediaSource",
        }
    }
}

/// Playstate commands accepted by `/Sessions/{id}/Playing/{command}`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayStateCommand {
    Stop,
}

impl PlayStateCommand {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayStateCommand::Stop => "Stop",
        }
    }
}

/// Item currently playing in a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NowPlayingItem {
    pub id: ItemId,

    /// Item type as reported by the server ("Movie", "Episode", "Audio", ...)
    #[serde(rename = "Type")]
    pub item_type: String,

    #[serde(default)]
    pub name: Option<String>,
}

impl NowPlayingItem {
    /// Item type lower-cased; policy entries and exemptions are keyed on this
    pub fn media_type(&self) -> String {
        self.item_type.to_lowercase()
    }
}

/// Playback state of a session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlayState {
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_paused: bool,
}

/// Treat an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// An active session as reported by `GET /Sessions`
///
/// Only the fields the kicker reads are modelled; everything else in the
/// server's payload is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Session {
    pub id: SessionId,

    #[serde(default)]
    pub user_id: Option<UserId>,

    #[serde(default)]
    pub user_name: Option<String>,

    #[serde(default)]
    pub device_id: Option<DeviceId>,

    #[serde(default)]
    pub device_name: Option<String>,

    #[serde(default)]
    pub now_playing_item: Option<NowPlayingItem>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub play_state: PlayState,

    #[serde(default, deserialize_with = "null_as_default")]
    pub supported_commands: Vec<String>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub supports_media_control: bool,
}

impl Session {
    /// Identifier quota is tracked against under the given mode
    pub fn entity_id(&self, mode: IdentityMode) -> Option<EntityId> {
        match mode {
            IdentityMode::User => self.user_id.clone().map(EntityId::from),
            IdentityMode::Device => self.device_id.clone().map(EntityId::from),
        }
    }

    pub fn supports(&self, command: RemoteCommand) -> bool {
        self.supported_commands
            .iter()
            .any(|c| c == command.as_str())
    }

    pub fn is_paused(&self) -> bool {
        self.play_state.is_paused
    }
}
