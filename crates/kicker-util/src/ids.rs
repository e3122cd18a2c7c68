//! Strongly-typed identifiers for session-kicker
//!
//! All identifiers are opaque strings handed out by the media server.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id! {
    /// Unit of quota tracking: a user ID or a device ID, depending on the identity mode
    EntityId
}

string_id! {
    /// Media server user account
    UserId
}

string_id! {
    /// Playback session on the media server
    SessionId
}

string_id! {
    /// Client device registered with the media server
    DeviceId
}

string_id! {
    /// Library item (movie, episode, track, ...)
    ItemId
}

impl From<UserId> for EntityId {
    fn from(id: UserId) -> Self {
        Self(id.0)
    }
}

impl From<DeviceId> for EntityId {
    fn from(id: DeviceId) -> Self {
        Self(id.0)
    }
}
