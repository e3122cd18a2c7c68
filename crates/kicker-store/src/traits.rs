//! Store trait definitions

use chrono::{DateTime, Local};
use kicker_api::IdentityMode;
use kicker_util::EntityId;
use serde::{Deserialize, Serialize};

use crate::{AuditEvent, StoreResult};

/// Main store trait
pub trait Store: Send + Sync {
    // Restrictions

    /// Whether `entity` may not watch `media_type`.
    ///
    /// `media_type` is compared case-insensitively.
    fn is_restricted(
        &self,
        entity_kind: IdentityMode,
        entity_id: &EntityId,
        media_type: &str,
    ) -> StoreResult<bool>;

    /// Add a restriction. Returns false if it already existed.
    fn add_restriction(
        &self,
        entity_kind: IdentityMode,
        entity_id: &EntityId,
        media_type: &str,
    ) -> StoreResult<bool>;

    /// Remove a restriction. Returns false if there was nothing to remove.
    fn remove_restriction(
        &self,
        entity_kind: IdentityMode,
        entity_id: &EntityId,
        media_type: &str,
    ) -> StoreResult<bool>;

    /// All restrictions, ordered by entity then media type
    fn list_restrictions(&self) -> StoreResult<Vec<Restriction>>;

    // Audit log

    /// Append an audit event
    fn append_audit(&self, event: AuditEvent) -> StoreResult<()>;

    /// Get recent audit events, newest first
    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>>;

    // Health

    /// Check if store is healthy
    fn is_healthy(&self) -> bool;
}

/// A (entity, media type) pair the entity may only watch within quota
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Restriction {
    pub entity_kind: IdentityMode,
    pub entity_id: EntityId,
    /// Always lower-cased
    pub media_type: String,
    pub created_at: DateTime<Local>,
}
