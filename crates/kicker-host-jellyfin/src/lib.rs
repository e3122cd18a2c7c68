//! Jellyfin adapter for session-kicker
//!
//! Provides:
//! - Session listing via `GET /Sessions`, failing soft to an empty list
//! - Remote commands: messages, playstate, device removal, transcode kill, play-now

mod adapter;

pub use adapter::*;
