//! Events emitted by the kicker

use chrono::{DateTime, Local};
use kicker_util::{EntityId, SessionId};
use std::time::Duration;

/// Events emitted by a poll cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KickerEvent {
    /// Entity seen playing restricted content for the first time this period
    EntityRestricted {
        entity_id: EntityId,
        session_id: SessionId,
        media_type: String,
    },

    /// Watch time credited to an entity
    WatchTimeAccrued {
        entity_id: EntityId,
        total: Duration,
    },

    /// Entity is over quota; the enforcement sequence was started for the session
    QuotaExceeded {
        entity_id: EntityId,
        session_id: SessionId,
        watched: Duration,
    },

    /// Daily reset passed and all accrual was cleared
    QuotaReset {
        entities_cleared: usize,
        next_reset: DateTime<Local>,
    },
}
