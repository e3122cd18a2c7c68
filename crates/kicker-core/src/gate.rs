//! Blacklist gate: which sessions count toward accrual

use kicker_api::Session;
use kicker_config::QuotaPolicy;
use kicker_store::Store;
use kicker_util::{EntityId, ItemId};
use std::sync::Arc;
use tracing::{debug, warn};

/// Why a session was not counted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NothingPlaying,
    ExemptType,
    Paused,
    /// Playing the replacement item the kicker itself started
    ReplacementItem,
    /// Session carries no identifier for the configured identity mode
    NoEntity,
    NotRestricted,
    PolicyLookupFailed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Skip(SkipReason),
    /// Session counts toward `entity_id`'s accrual
    Counted {
        entity_id: EntityId,
        media_type: String,
    },
}

pub struct BlacklistGate {
    quota: QuotaPolicy,
    replacement_item: Option<ItemId>,
    store: Arc<dyn Store>,
}

impl BlacklistGate {
    pub fn new(quota: &QuotaPolicy, replacement_item: Option<ItemId>, store: Arc<dyn Store>) -> Self {
        Self {
            quota: quota.clone(),
            replacement_item,
            store,
        }
    }

    /// Decide whether `session` counts this cycle.
    ///
    /// The cheap local checks run first; the store is only consulted for
    /// sessions that survive all of them.
    pub fn evaluate(&self, session: &Session) -> GateDecision {
        let Some(item) = &session.now_playing_item else {
            return GateDecision::Skip(SkipReason::NothingPlaying);
        };

        let media_type = item.media_type();
        if self.quota.is_exempt(&media_type) {
            return self.skip(session, SkipReason::ExemptType);
        }

        if session.is_paused() {
            return self.skip(session, SkipReason::Paused);
        }

        if self.replacement_item.as_ref() == Some(&item.id) {
            return self.skip(session, SkipReason::ReplacementItem);
        }

        let Some(entity_id) = session.entity_id(self.quota.identity_mode) else {
            return self.skip(session, SkipReason::NoEntity);
        };

        match self
            .store
            .is_restricted(self.quota.identity_mode, &entity_id, &media_type)
        {
            Ok(true) => GateDecision::Counted {
                entity_id,
                media_type,
            },
            Ok(false) => self.skip(session, SkipReason::NotRestricted),
            Err(e) => {
                warn!(
                    session_id = %session.id,
                    entity_id = %entity_id,
                    error = %e,
                    "Policy lookup failed, skipping session"
                );
                GateDecision::Skip(SkipReason::PolicyLookupFailed)
            }
        }
    }

    fn skip(&self, session: &Session, reason: SkipReason) -> GateDecision {
        debug!(session_id = %session.id, reason = ?reason, "Session not counted");
        GateDecision::Skip(reason)
    }
}
