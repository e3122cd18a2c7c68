//! SQLite-based store implementation

use chrono::{DateTime, Local};
use kicker_api::IdentityMode;
use kicker_util::EntityId;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::{AuditEvent, Restriction, Store, StoreError, StoreResult};

/// SQLite-based store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    fn conn(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn()?;

        conn.execute_batch(
            r#"
            -- Restrictions (the blacklist)
            CREATE TABLE IF NOT EXISTS restrictions (
                entity_kind TEXT NOT NULL,
                entity_id TEXT NOT NULL,
                media_type TEXT NOT NULL,
                created_at TEXT NOT NULL,
                PRIMARY KEY (entity_kind, entity_id, media_type)
            );

            -- Audit log (append-only)
            CREATE TABLE IF NOT EXISTS audit_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                event_json TEXT NOT NULL
            );

            -- Indexes
            CREATE INDEX IF NOT EXISTS idx_audit_timestamp ON audit_log(timestamp);
            "#,
        )?;

        debug!("Store schema initialized");
        Ok(())
    }
}

impl Store for SqliteStore {
    fn is_restricted(
        &self,
        entity_kind: IdentityMode,
        entity_id: &EntityId,
        media_type: &str,
    ) -> StoreResult<bool> {
        let conn = self.conn()?;

        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM restrictions WHERE entity_kind = ? AND entity_id = ? AND media_type = ?",
                params![entity_kind.as_str(), entity_id.as_str(), media_type.to_lowercase()],
                |row| row.get(0),
            )
            .optional()?;

        Ok(found.is_some())
    }

    fn add_restriction(
        &self,
        entity_kind: IdentityMode,
        entity_id: &EntityId,
        media_type: &str,
    ) -> StoreResult<bool> {
        let conn = self.conn()?;
        let media_type = media_type.trim().to_lowercase();

        let inserted = conn.execute(
            r#"
            INSERT INTO restrictions (entity_kind, entity_id, media_type, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(entity_kind, entity_id, media_type) DO NOTHING
            "#,
            params![
                entity_kind.as_str(),
                entity_id.as_str(),
                media_type,
                kicker_util::now().to_rfc3339()
            ],
        )?;

        debug!(entity_kind = %entity_kind, entity_id = %entity_id, media_type = %media_type, inserted, "Restriction added");
        Ok(inserted > 0)
    }

    fn remove_restriction(
        &self,
        entity_kind: IdentityMode,
        entity_id: &EntityId,
        media_type: &str,
    ) -> StoreResult<bool> {
        let conn = self.conn()?;

        let removed = conn.execute(
            "DELETE FROM restrictions WHERE entity_kind = ? AND entity_id = ? AND media_type = ?",
            params![
                entity_kind.as_str(),
                entity_id.as_str(),
                media_type.trim().to_lowercase()
            ],
        )?;

        Ok(removed > 0)
    }

    fn list_restrictions(&self) -> StoreResult<Vec<Restriction>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT entity_kind, entity_id, media_type, created_at
            FROM restrictions
            ORDER BY entity_kind, entity_id, media_type
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut restrictions = Vec::new();
        for row in rows {
            let (kind, entity_id, media_type, created_at) = row?;
            let entity_kind = kind.parse::<IdentityMode>().map_err(StoreError::Serialization)?;
            let created_at = DateTime::parse_from_rfc3339(&created_at)
                .map(|dt| dt.with_timezone(&Local))
                .unwrap_or_else(|_| kicker_util::now());

            restrictions.push(Restriction {
                entity_kind,
                entity_id: EntityId::new(entity_id),
                media_type,
                created_at,
            });
        }

        Ok(restrictions)
    }

    fn append_audit(&self, mut event: AuditEvent) -> StoreResult<()> {
        let conn = self.conn()?;
        let event_json = serde_json::to_string(&event.event)?;

        conn.execute(
            "INSERT INTO audit_log (timestamp, event_json) VALUES (?, ?)",
            params![event.timestamp.to_rfc3339(), event_json],
        )?;

        event.id = conn.last_insert_rowid();
        debug!(event_id = event.id, "Audit event appended");

        Ok(())
    }

    fn get_recent_audits(&self, limit: usize) -> StoreResult<Vec<AuditEvent>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT id, timestamp, event_json FROM audit_log ORDER BY id DESC LIMIT ?",
        )?;

        let rows = stmt.query_map([limit as i64], |row| {
            let id: i64 = row.get(0)?;
            let timestamp_str: String = row.get(1)?;
            let event_json: String = row.get(2)?;
            Ok((id, timestamp_str, event_json))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (id, timestamp_str, event_json) = row?;
            let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
                .map(|dt| dt.with_timezone(&Local))
                .unwrap_or_else(|_| kicker_util::now());
            let event: crate::AuditEventType = serde_json::from_str(&event_json)?;

            events.push(AuditEvent {
                id,
                timestamp,
                event,
            });
        }

        Ok(events)
    }

    fn is_healthy(&self) -> bool {
        match self.conn.lock() {
            Ok(conn) => conn.query_row("SELECT 1", [], |_| Ok(())).is_ok(),
            Err(_) => {
                warn!("Store lock poisoned");
                false
            }
        }
    }
}
