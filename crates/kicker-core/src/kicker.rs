//! Poll loop driver

use chrono::{DateTime, Local};
use kicker_api::{RemoteCommand, Session};
use kicker_config::{Config, EnforcementPolicy};
use kicker_host_api::MediaServer;
use kicker_store::Store;
use kicker_util::EntityId;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::{AccrualOutcome, AccrualStore, ActionTasks, BlacklistGate, GateDecision, KickerEvent, ResetScheduler};

/// The accrual-and-enforcement loop
///
/// Owns all mutable quota state. Remote actions are spawned on an internal
/// task registry and never awaited by a cycle.
pub struct Kicker {
    server: Arc<dyn MediaServer>,
    gate: BlacklistGate,
    accrual: AccrualStore,
    reset: ResetScheduler,
    tasks: ActionTasks,
    enforcement: Arc<EnforcementPolicy>,
    check_interval: Duration,
    max_watch_secs: u64,
    /// Last session that passed the gate; receives the quota-restored notice
    last_session: Option<Session>,
}

impl Kicker {
    pub fn new(
        config: &Config,
        server: Arc<dyn MediaServer>,
        store: Arc<dyn Store>,
        now: DateTime<Local>,
    ) -> Self {
        let gate = BlacklistGate::new(
            &config.quota,
            config.enforcement.replacement_item.clone(),
            store,
        );
        let reset = ResetScheduler::new(config.quota.reset_time, now);

        info!(
            identity_mode = %config.quota.identity_mode,
            max_watch_secs = config.quota.max_watch_time.as_secs(),
            check_interval_secs = config.service.check_interval.as_secs(),
            next_reset = ?reset.next_reset(),
            "Kicker initialized"
        );

        Self {
            server,
            gate,
            accrual: AccrualStore::new(),
            reset,
            tasks: ActionTasks::new(),
            enforcement: Arc::new(config.enforcement.clone()),
            check_interval: config.service.check_interval,
            max_watch_secs: config.quota.max_watch_time.as_secs(),
            last_session: None,
        }
    }

    /// Accrued watch time for an entity, `None` if unseen this period
    pub fn accrued(&self, entity_id: &EntityId) -> Option<Duration> {
        self.accrual.get(entity_id).map(Duration::from_secs)
    }

    pub fn accrual(&self) -> &AccrualStore {
        &self.accrual
    }

    pub fn next_reset(&self) -> Option<DateTime<Local>> {
        self.reset.next_reset()
    }

    /// Background actions not yet reaped
    pub fn pending_actions(&self) -> usize {
        self.tasks.len()
    }

    /// Run one cycle: fetch, gate, accrue, enforce, then check the reset.
    pub async fn run_cycle(&mut self, now: DateTime<Local>) -> Vec<KickerEvent> {
        let mut events = Vec::new();
        self.tasks.reap();

        let sessions = self.server.list_sessions().await;
        debug!(count = sessions.len(), "Fetched sessions");

        for session in sessions {
            self.process_session(session, &mut events);
        }

        if let Some(next_reset) = self.reset.poll(now) {
            let entities_cleared = self.accrual.clear();
            info!(entities_cleared, next_reset = %next_reset, "Watch quota reset");

            if let Some(session) = &self.last_session
                && session.supports(RemoteCommand::DisplayMessage)
            {
                self.tasks.spawn_notice(
                    self.server.clone(),
                    session.id.clone(),
                    self.enforcement.quota_restored_message.clone(),
                );
            }

            events.push(KickerEvent::QuotaReset {
                entities_cleared,
                next_reset,
            });
        }

        events
    }

    fn process_session(&mut self, session: Session, events: &mut Vec<KickerEvent>) {
        let GateDecision::Counted {
            entity_id,
            media_type,
        } = self.gate.evaluate(&session)
        else {
            return;
        };

        let delta = self.check_interval.as_secs();
        let observation = self.accrual.observe(&entity_id, self.max_watch_secs, delta);

        if observation.first_seen {
            info!(
                entity_id = %entity_id,
                session_id = %session.id,
                media_type = %media_type,
                "Entity is watching restricted content"
            );
            if session.supports(RemoteCommand::DisplayMessage) {
                self.tasks.spawn_notice(
                    self.server.clone(),
                    session.id.clone(),
                    self.enforcement.restricted_message.clone(),
                );
            }
            events.push(KickerEvent::EntityRestricted {
                entity_id: entity_id.clone(),
                session_id: session.id.clone(),
                media_type,
            });
        }

        match observation.outcome {
            AccrualOutcome::Accrued { total } => {
                debug!(entity_id = %entity_id, total_secs = total, "Watch time accrued");
                events.push(KickerEvent::WatchTimeAccrued {
                    entity_id,
                    total: Duration::from_secs(total),
                });
            }
            AccrualOutcome::OverQuota { total } => {
                info!(
                    entity_id = %entity_id,
                    session_id = %session.id,
                    watched_secs = total,
                    "Over quota, enforcing"
                );
                events.push(KickerEvent::QuotaExceeded {
                    entity_id,
                    session_id: session.id.clone(),
                    watched: Duration::from_secs(total),
                });
                self.tasks.spawn_enforcement(
                    self.server.clone(),
                    session.clone(),
                    self.enforcement.clone(),
                );
            }
        }

        self.last_session = Some(session);
    }

    /// Drive cycles every check interval until `shutdown` flips to true.
    ///
    /// `on_events` sees the events of every cycle that produced any.
    pub async fn run<F>(&mut self, mut shutdown: watch::Receiver<bool>, mut on_events: F)
    where
        F: FnMut(&[KickerEvent]),
    {
        let mut interval = tokio::time::interval(self.check_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Poll loop running");

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = interval.tick() => {
                    let events = self.run_cycle(kicker_util::now()).await;
                    if !events.is_empty() {
                        on_events(&events);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        self.shutdown();
        info!("Poll loop stopped");
    }

    /// Wait for every in-flight background action to finish
    pub async fn settle(&mut self) {
        self.tasks.settle().await;
    }

    /// Abort in-flight background actions
    pub fn shutdown(&mut self) {
        self.tasks.shutdown();
    }
}
