//! Audit event types

use chrono::{DateTime, Local};
use kicker_api::IdentityMode;
use kicker_util::{EntityId, SessionId};
use serde::{Deserialize, Serialize};

/// Types of audit events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEventType {
    /// Service started
    ServiceStarted,

    /// Service stopped
    ServiceStopped,

    /// Configuration loaded
    ConfigLoaded {
        identity_mode: IdentityMode,
        max_watch_secs: u64,
        reset_time: Option<String>,
    },

    /// Restriction added by an administrator
    RestrictionAdded {
        entity_kind: IdentityMode,
        entity_id: EntityId,
        media_type: String,
    },

    /// Restriction removed by an administrator
    RestrictionRemoved {
        entity_kind: IdentityMode,
        entity_id: EntityId,
        media_type: String,
    },

    /// Entity seen playing restricted content for the first time this period
    EntityRestricted {
        entity_id: EntityId,
        session_id: SessionId,
        media_type: String,
    },

    /// Over-quota enforcement sequence started for a session
    EnforcementIssued {
        entity_id: EntityId,
        session_id: SessionId,
        watched_secs: u64,
    },

    /// All accrued watch time cleared
    QuotaReset { entities_cleared: usize },
}

/// Full audit event with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID
    pub id: i64,

    /// Event timestamp
    pub timestamp: DateTime<Local>,

    /// Event type and details
    pub event: AuditEventType,
}

impl AuditEvent {
    pub fn new(event: AuditEventType) -> Self {
        Self {
            id: 0, // Will be set by store
            timestamp: kicker_util::now(),
            event,
        }
    }
}
