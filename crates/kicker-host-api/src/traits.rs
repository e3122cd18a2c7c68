//! Media server adapter traits

use async_trait::async_trait;
use kicker_api::{PlayStateCommand, Session};
use kicker_util::{DeviceId, ItemId, SessionId};
use thiserror::Error;

/// Errors from media server operations
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Request failed: {0}")]
    Transport(String),

    #[error("{endpoint} returned HTTP {status}")]
    Status { endpoint: String, status: u16 },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type HostResult<T> = Result<T, HostError>;

/// Everything the kicker needs from a media server
///
/// Commands are fire-and-forget: `Ok(())` means the request was accepted by
/// the server, not that the client device obeyed it.
#[async_trait]
pub trait MediaServer: Send + Sync {
    /// Currently active sessions.
    ///
    /// Fails soft: transport errors, non-success statuses and unparseable
    /// bodies are logged by the adapter and yield an empty list.
    async fn list_sessions(&self) -> Vec<Session>;

    /// Remove a device registration, dropping its sessions
    async fn delete_device(&self, device_id: &DeviceId) -> HostResult<()>;

    /// Show a message on the session's client
    async fn send_message(&self, session_id: &SessionId, text: &str) -> HostResult<()>;

    /// Send a playstate command (stop, pause, ...)
    async fn set_play_state(
        &self,
        session_id: &SessionId,
        command: PlayStateCommand,
    ) -> HostResult<()>;

    /// Kill any transcode running for the device
    async fn stop_encoding(&self, session_id: &SessionId, device_id: &DeviceId) -> HostResult<()>;

    /// Start playing an item on the session's client
    async fn play_item(&self, session_id: &SessionId, item_id: &ItemId) -> HostResult<()>;
}
