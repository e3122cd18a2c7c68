//! Enforcement actuator
//!
//! Remote actions never block the poll loop: they run on an [`ActionTasks`]
//! registry and report their own failures through the log.

use kicker_api::{PlayStateCommand, RemoteCommand, Session};
use kicker_config::EnforcementPolicy;
use kicker_host_api::{HostResult, MediaServer};
use kicker_util::SessionId;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Pause between stopping playback and starting the replacement item
pub const REPLACEMENT_DELAY: Duration = Duration::from_secs(2);

/// One remote action of the enforcement sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnforcementStep {
    OverQuotaNotice,
    DeleteDevice,
    Stop,
    StopEncoding,
    PlayReplacement,
}

/// What the enforcement sequence did, in order
#[derive(Debug, Clone)]
pub struct EnforcementReport {
    pub session_id: SessionId,
    pub steps: Vec<(EnforcementStep, Result<(), String>)>,
}

impl EnforcementReport {
    fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            steps: Vec::new(),
        }
    }

    fn record(&mut self, step: EnforcementStep, result: HostResult<()>) {
        if let Err(e) = &result {
            warn!(
                session_id = %self.session_id,
                step = ?step,
                error = %e,
                "Enforcement step failed"
            );
        }
        self.steps.push((step, result.map_err(|e| e.to_string())));
    }

    /// Steps attempted, in order
    pub fn attempted(&self) -> Vec<EnforcementStep> {
        self.steps.iter().map(|(step, _)| *step).collect()
    }

    pub fn failures(&self) -> usize {
        self.steps.iter().filter(|(_, r)| r.is_err()).count()
    }
}

/// Run the over-quota sequence against one session.
///
/// Every step is attempted regardless of earlier failures. Devices without
/// media control are deleted instead of stopped when the policy asks for it.
pub async fn run_enforcement(
    server: &dyn MediaServer,
    session: &Session,
    policy: &EnforcementPolicy,
) -> EnforcementReport {
    let mut report = EnforcementReport::new(session.id.clone());

    if session.supports(RemoteCommand::DisplayMessage) {
        let result = server
            .send_message(&session.id, &policy.over_quota_message)
            .await;
        report.record(EnforcementStep::OverQuotaNotice, result);
    }

    if !session.supports_media_control
        && policy.delete_device_if_no_media_control
        && let Some(device_id) = &session.device_id
    {
        let result = server.delete_device(device_id).await;
        report.record(EnforcementStep::DeleteDevice, result);
        return report;
    }

    let result = server
        .set_play_state(&session.id, PlayStateCommand::Stop)
        .await;
    report.record(EnforcementStep::Stop, result);

    match &session.device_id {
        Some(device_id) => {
            let result = server.stop_encoding(&session.id, device_id).await;
            report.record(EnforcementStep::StopEncoding, result);
        }
        None => debug!(session_id = %session.id, "No device id, skipping encode stop"),
    }

    if let Some(item_id) = &policy.replacement_item
        && session.supports(RemoteCommand::PlayMediaSource)
    {
        tokio::time::sleep(REPLACEMENT_DELAY).await;
        let result = server.play_item(&session.id, item_id).await;
        report.record(EnforcementStep::PlayReplacement, result);
    }

    report
}

/// Send a one-off notice, logging failure
pub async fn send_notice(server: &dyn MediaServer, session_id: &SessionId, text: &str) {
    if let Err(e) = server.send_message(session_id, text).await {
        warn!(session_id = %session_id, error = %e, "Failed to send notice");
    }
}

/// Registry of in-flight background actions
///
/// Tasks are never awaited by the poll loop. Finished tasks are reaped once
/// per cycle so panics surface in the log instead of vanishing.
pub struct ActionTasks {
    tasks: JoinSet<()>,
}

impl ActionTasks {
    pub fn new() -> Self {
        Self {
            tasks: JoinSet::new(),
        }
    }

    pub fn spawn<F>(&mut self, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.spawn(action);
    }

    /// Spawn the enforcement sequence for a session
    pub fn spawn_enforcement(
        &mut self,
        server: Arc<dyn MediaServer>,
        session: Session,
        policy: Arc<EnforcementPolicy>,
    ) {
        self.spawn(async move {
            let report = run_enforcement(server.as_ref(), &session, &policy).await;
            info!(
                session_id = %report.session_id,
                steps = ?report.attempted(),
                failures = report.failures(),
                "Enforcement sequence finished"
            );
        });
    }

    /// Spawn a one-off notice to a session
    pub fn spawn_notice(&mut self, server: Arc<dyn MediaServer>, session_id: SessionId, text: String) {
        self.spawn(async move {
            send_notice(server.as_ref(), &session_id, &text).await;
        });
    }

    /// Number of actions not yet reaped
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Collect finished actions without waiting. Returns how many were reaped.
    pub fn reap(&mut self) -> usize {
        let mut reaped = 0;
        while let Some(result) = self.tasks.try_join_next() {
            Self::log_outcome(result);
            reaped += 1;
        }
        reaped
    }

    /// Wait for every in-flight action to finish
    pub async fn settle(&mut self) {
        while let Some(result) = self.tasks.join_next().await {
            Self::log_outcome(result);
        }
    }

    /// Abort whatever is still running
    pub fn shutdown(&mut self) {
        if !self.tasks.is_empty() {
            info!(in_flight = self.tasks.len(), "Aborting in-flight actions");
        }
        self.tasks.abort_all();
    }

    fn log_outcome(result: Result<(), tokio::task::JoinError>) {
        match result {
            Ok(()) => {}
            Err(e) if e.is_panic() => error!(error = %e, "Background action panicked"),
            Err(e) => debug!(error = %e, "Background action cancelled"),
        }
    }
}

impl Default for ActionTasks {
    fn default() -> Self {
        Self::new()
    }
}
