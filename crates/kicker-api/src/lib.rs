//! Media server data model for session-kicker
//!
//! This crate defines the types every other crate agrees on:
//! - Sessions as reported by the media server
//! - Remote commands a session can advertise
//! - Identity mode (track quota per user or per device)

mod types;

pub use types::*;
