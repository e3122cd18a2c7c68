//! Time utilities for session-kicker
//!
//! The quota reset is scheduled against wall-clock time, so everything here
//! works in `DateTime<Local>`.
//!
//! # Mock Time for Development
//!
//! In debug builds, the `KICKER_MOCK_TIME` environment variable can be set
//! to override the system time for all time-sensitive operations. This is useful
//! for exercising the daily reset without waiting for it.
//!
//! Format: `YYYY-MM-DD HH:MM:SS` (e.g., `2025-12-25 23:59:30`)
//!
//! Example:
//! ```bash
//! KICKER_MOCK_TIME="2025-12-25 23:59:30" cargo run -p kickerd
//! ```

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "KICKER_MOCK_TIME";

/// Offset between the mocked clock and the real one, fixed at first use so
/// mocked time keeps ticking.
static MOCK_TIME_OFFSET: OnceLock<Option<chrono::Duration>> = OnceLock::new();

const MOCK_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse a `KICKER_MOCK_TIME` value into a local instant
pub fn parse_mock_time(value: &str) -> Option<DateTime<Local>> {
    let naive = NaiveDateTime::parse_from_str(value.trim(), MOCK_TIME_FORMAT).ok()?;
    Local.from_local_datetime(&naive).single()
}

#[allow(clippy::disallowed_methods)] // Local::now() is only read here and in now()
fn mock_time_offset() -> Option<chrono::Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        if !cfg!(debug_assertions) {
            return None;
        }

        let value = std::env::var(MOCK_TIME_ENV_VAR).ok()?;
        let Some(mocked) = parse_mock_time(&value) else {
            tracing::warn!(
                mock_time = %value,
                expected_format = MOCK_TIME_FORMAT,
                "Ignoring unusable mock time"
            );
            return None;
        };

        let offset = mocked.signed_duration_since(chrono::Local::now());
        tracing::info!(
            mock_time = %value,
            offset_secs = offset.num_seconds(),
            "Mock time enabled"
        );
        Some(offset)
    })
}

pub fn is_mock_time_active() -> bool {
    mock_time_offset().is_some()
}

/// Current local time, shifted by `KICKER_MOCK_TIME` in debug builds
#[allow(clippy::disallowed_methods)]
pub fn now() -> DateTime<Local> {
    let real = chrono::Local::now();
    match mock_time_offset() {
        Some(offset) => real + offset,
        None => real,
    }
}

/// Format a DateTime with full date and time.
pub fn format_datetime_full(dt: &DateTime<Local>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Time of day, minute resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WallClock {
    pub hour: u8,
    pub minute: u8,
}

impl WallClock {
    pub const MIDNIGHT: WallClock = WallClock { hour: 0, minute: 0 };

    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self { hour, minute })
        } else {
            None
        }
    }

    /// Parse `HH:MM`
    pub fn parse(s: &str) -> Result<Self, String> {
        let (hour, minute) = s
            .trim()
            .split_once(':')
            .ok_or_else(|| "Expected HH:MM format".to_string())?;

        let hour: u8 = hour.parse().map_err(|_| "Invalid hour".to_string())?;
        let minute: u8 = minute.parse().map_err(|_| "Invalid minute".to_string())?;

        if hour >= 24 {
            return Err("Hour must be 0-23".into());
        }
        if minute >= 60 {
            return Err("Minute must be 0-59".into());
        }

        Ok(Self { hour, minute })
    }

    pub fn to_naive_time(self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour as u32, self.minute as u32, 0).unwrap_or(NaiveTime::MIN)
    }

    /// Returns seconds since midnight
    pub fn as_seconds_from_midnight(&self) -> u32 {
        (self.hour as u32) * 3600 + (self.minute as u32) * 60
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::MIDNIGHT
    }
}

impl fmt::Display for WallClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl PartialOrd for WallClock {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WallClock {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.as_seconds_from_midnight()
            .cmp(&other.as_seconds_from_midnight())
    }
}

/// Resolve a local date and time of day to an instant.
///
/// Inside a DST gap the local time does not exist; the UTC reading is used instead.
pub fn local_at(date: NaiveDate, at: WallClock) -> DateTime<Local> {
    let naive = date.and_time(at.to_naive_time());
    Local
        .from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| Local.from_utc_datetime(&naive))
}

/// Next occurrence of `at`: today if still ahead of `now`, otherwise tomorrow.
pub fn next_daily_occurrence(at: WallClock, now: DateTime<Local>) -> DateTime<Local> {
    let today = local_at(now.date_naive(), at);
    if now >= today {
        day_after(today, at)
    } else {
        today
    }
}

/// The same time of day on the calendar day after `instant`.
pub fn day_after(instant: DateTime<Local>, at: WallClock) -> DateTime<Local> {
    let date = instant.date_naive();
    let next = date.succ_opt().unwrap_or(date);
    local_at(next, at)
}

/// Helper to format durations in human-readable form
pub fn format_duration(d: Duration) -> String {
    let total_secs = d.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_wall_clock_ordering() {
        let morning = WallClock::new(8, 0).unwrap();
        let noon = WallClock::new(12, 0).unwrap();
        let evening = WallClock::new(18, 30).unwrap();

        assert!(morning < noon);
        assert!(noon < evening);
        assert!(WallClock::MIDNIGHT < morning);
    }

    #[test]
    fn test_parse_wall_clock() {
        assert_eq!(WallClock::parse("14:30").unwrap(), WallClock::new(14, 30).unwrap());
        assert_eq!(WallClock::parse("00:00").unwrap(), WallClock::MIDNIGHT);
        assert_eq!(WallClock::parse(" 23:59 ").unwrap(), WallClock::new(23, 59).unwrap());

        assert!(WallClock::parse("24:00").is_err());
        assert!(WallClock::parse("12:60").is_err());
        assert!(WallClock::parse("25:99").is_err());
        assert!(WallClock::parse("noon").is_err());
        assert!(WallClock::parse("").is_err());
    }

    #[test]
    fn test_wall_clock_display() {
        assert_eq!(WallClock::new(7, 5).unwrap().to_string(), "07:05");
    }

    #[test]
    fn test_next_occurrence_later_today() {
        let now = Local.with_ymd_and_hms(2025, 6, 10, 9, 0, 0).unwrap();
        let next = next_daily_occurrence(WallClock::new(21, 0).unwrap(), now);
        assert_eq!(next, Local.with_ymd_and_hms(2025, 6, 10, 21, 0, 0).unwrap());
    }

    #[test]
    fn test_next_occurrence_already_passed() {
        let now = Local.with_ymd_and_hms(2025, 6, 10, 9, 0, 0).unwrap();
        let next = next_daily_occurrence(WallClock::MIDNIGHT, now);
        assert_eq!(next, Local.with_ymd_and_hms(2025, 6, 11, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_next_occurrence_exactly_now_is_tomorrow() {
        let now = Local.with_ymd_and_hms(2025, 6, 10, 6, 30, 0).unwrap();
        let next = next_daily_occurrence(WallClock::new(6, 30).unwrap(), now);
        assert_eq!(next.day(), 11);
    }

    #[test]
    fn test_day_after_crosses_month() {
        let instant = Local.with_ymd_and_hms(2025, 6, 30, 0, 0, 0).unwrap();
        let next = day_after(instant, WallClock::MIDNIGHT);
        assert_eq!(next, Local.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(30)), "30s");
        assert_eq!(format_duration(Duration::from_secs(90)), "1m 30s");
        assert_eq!(format_duration(Duration::from_secs(3661)), "1h 1m 1s");
    }

    #[test]
    fn test_format_datetime_full() {
        let dt = Local.with_ymd_and_hms(2025, 12, 25, 14, 30, 45).unwrap();
        assert_eq!(format_datetime_full(&dt), "2025-12-25 14:30:45");
    }

    #[test]
    fn test_parse_mock_time() {
        let parsed = parse_mock_time("2025-12-25 23:59:30").unwrap();
        assert_eq!(parsed, Local.with_ymd_and_hms(2025, 12, 25, 23, 59, 30).unwrap());
        assert_eq!(parsed.year(), 2025);

        assert!(parse_mock_time("2025-12-25T23:59:30").is_none());
        assert!(parse_mock_time("tomorrow").is_none());
    }
}
