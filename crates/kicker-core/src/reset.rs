//! Daily reset scheduling

use chrono::{DateTime, Local};
use kicker_util::{WallClock, day_after, next_daily_occurrence};
use tracing::debug;

/// Tracks when accrual is next cleared.
///
/// Inert when no reset time is configured.
#[derive(Debug, Clone)]
pub struct ResetScheduler {
    at: Option<WallClock>,
    next_reset: Option<DateTime<Local>>,
}

impl ResetScheduler {
    /// First reset is today at `at`, or tomorrow if that has already passed
    pub fn new(at: Option<WallClock>, now: DateTime<Local>) -> Self {
        let next_reset = at.map(|at| next_daily_occurrence(at, now));
        if let Some(next) = next_reset {
            debug!(next_reset = %next, "Next reset scheduled");
        }
        Self { at, next_reset }
    }

    pub fn next_reset(&self) -> Option<DateTime<Local>> {
        self.next_reset
    }

    /// If the reset instant has passed, advance it and return the new one.
    ///
    /// The instant moves forward one calendar day at a time until it lies
    /// in the future, so a long stall yields a single reset.
    pub fn poll(&mut self, now: DateTime<Local>) -> Option<DateTime<Local>> {
        let at = self.at?;
        let mut next = self.next_reset?;
        if now < next {
            return None;
        }

        while next <= now {
            let advanced = day_after(next, at);
            if advanced <= next {
                break;
            }
            next = advanced;
        }

        self.next_reset = Some(next);
        debug!(next_reset = %next, "Next reset scheduled");
        Some(next)
    }
}
