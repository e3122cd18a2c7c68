//! Media server adapter interface for session-kicker
//!
//! This crate defines the seam between the enforcement core and a concrete
//! media server. It contains no network code itself.

mod mock;
mod traits;

pub use mock::*;
pub use traits::*;
