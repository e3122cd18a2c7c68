//! Quota enforcement core for session-kicker
//!
//! This crate contains:
//! - The per-entity accrual counters and their state machine
//! - The blacklist gate deciding which sessions count
//! - The over-quota enforcement sequence and its background task registry
//! - The daily reset scheduler
//! - The poll loop driver (`Kicker`) tying them together

mod accrual;
mod enforcement;
mod events;
mod gate;
mod kicker;
mod reset;

#[cfg(test)]
mod test_support;

pub use accrual::*;
pub use enforcement::*;
pub use events::*;
pub use gate::*;
pub use kicker::*;
pub use reset::*;
