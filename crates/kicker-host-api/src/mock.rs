//! Mock media server for testing

use async_trait::async_trait;
use kicker_api::{PlayStateCommand, Session};
use kicker_util::{DeviceId, ItemId, SessionId};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::{HostError, HostResult, MediaServer};

/// A call received by the mock, in arrival order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaCall {
    ListSessions,
    DeleteDevice {
        device_id: DeviceId,
    },
    SendMessage {
        session_id: SessionId,
        text: String,
    },
    SetPlayState {
        session_id: SessionId,
        command: PlayStateCommand,
    },
    StopEncoding {
        session_id: SessionId,
        device_id: DeviceId,
    },
    PlayItem {
        session_id: SessionId,
        item_id: ItemId,
    },
}

/// In-memory media server that records every call
pub struct MockMediaServer {
    sessions: Arc<Mutex<Vec<Session>>>,
    calls: Arc<Mutex<Vec<MediaCall>>>,

    /// Simulate an unreachable server: `list_sessions` returns nothing
    pub fail_list: Arc<Mutex<bool>>,

    /// Configure every command to fail
    pub fail_commands: Arc<Mutex<bool>>,

    /// Delay applied to every command (simulates a slow server)
    pub command_delay: Arc<Mutex<Option<Duration>>>,
}

impl MockMediaServer {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_list: Arc::new(Mutex::new(false)),
            fail_commands: Arc::new(Mutex::new(false)),
            command_delay: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_sessions(self, sessions: Vec<Session>) -> Self {
        self.set_sessions(sessions);
        self
    }

    /// Replace the active session list
    pub fn set_sessions(&self, sessions: Vec<Session>) {
        *self.sessions.lock().unwrap() = sessions;
    }

    /// All calls received so far
    pub fn calls(&self) -> Vec<MediaCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls received so far, excluding session listing
    pub fn commands(&self) -> Vec<MediaCall> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, MediaCall::ListSessions))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    pub fn set_fail_commands(&self, fail: bool) {
        *self.fail_commands.lock().unwrap() = fail;
    }

    pub fn set_command_delay(&self, delay: Option<Duration>) {
        *self.command_delay.lock().unwrap() = delay;
    }

    async fn command(&self, call: MediaCall) -> HostResult<()> {
        let delay = *self.command_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.calls.lock().unwrap().push(call);

        if *self.fail_commands.lock().unwrap() {
            return Err(HostError::Status {
                endpoint: "mock".into(),
                status: 500,
            });
        }
        Ok(())
    }
}

impl Default for MockMediaServer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaServer for MockMediaServer {
    async fn list_sessions(&self) -> Vec<Session> {
        self.calls.lock().unwrap().push(MediaCall::ListSessions);

        if *self.fail_list.lock().unwrap() {
            return Vec::new();
        }
        self.sessions.lock().unwrap().clone()
    }

    async fn delete_device(&self, device_id: &DeviceId) -> HostResult<()> {
        self.command(MediaCall::DeleteDevice {
            device_id: device_id.clone(),
        })
        .await
    }

    async fn send_message(&self, session_id: &SessionId, text: &str) -> HostResult<()> {
        self.command(MediaCall::SendMessage {
            session_id: session_id.clone(),
            text: text.to_string(),
        })
        .await
    }

    async fn set_play_state(
        &self,
        session_id: &SessionId,
        command: PlayStateCommand,
    ) -> HostResult<()> {
        self.command(MediaCall::SetPlayState {
            session_id: session_id.clone(),
            command,
        })
        .await
    }

    async fn stop_encoding(&self, session_id: &SessionId, device_id: &DeviceId) -> HostResult<()> {
        self.command(MediaCall::StopEncoding {
            session_id: session_id.clone(),
            device_id: device_id.clone(),
        })
        .await
    }

    async fn play_item(&self, session_id: &SessionId, item_id: &ItemId) -> HostResult<()> {
        self.command(MediaCall::PlayItem {
            session_id: session_id.clone(),
            item_id: item_id.clone(),
        })
        .await
    }
}
