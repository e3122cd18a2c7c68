//! Shared utilities for session-kicker
//!
//! This crate provides:
//! - ID types (EntityId, UserId, SessionId, DeviceId, ItemId)
//! - Wall-clock helpers (mockable `now()`, time-of-day, daily occurrences)
//! - Default paths for config and data directories

mod ids;
mod paths;
mod time;

pub use ids::*;
pub use paths::*;
pub use time::*;
