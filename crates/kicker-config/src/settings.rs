//! Validated configuration structures

use crate::schema::{
    RawConfig, RawEnforcementConfig, RawQuotaConfig, RawServerConfig, RawServiceConfig,
};
use kicker_api::IdentityMode;
use kicker_util::{ItemId, WallClock};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use tracing::error;

pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_WATCH_TIME: Duration = Duration::from_secs(3600);

pub const DEFAULT_RESTRICTED_MESSAGE: &str =
    "This content is restricted for you. Your watch time is now being counted.";
pub const DEFAULT_OVER_QUOTA_MESSAGE: &str = "You have used up your watch time for today.";
pub const DEFAULT_QUOTA_RESTORED_MESSAGE: &str = "Your watch quota is restored!";

/// Validated configuration ready for use by the service
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub service: ServiceConfig,
    pub quota: QuotaPolicy,
    pub enforcement: EnforcementPolicy,
}

impl Config {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            server: ServerConfig::from_raw(raw.server),
            service: ServiceConfig::from_raw(raw.service),
            quota: QuotaPolicy::from_raw(raw.quota),
            enforcement: EnforcementPolicy::from_raw(raw.enforcement),
        }
    }
}

/// Media server connection
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub url: String,
    pub api_key: String,
    pub request_timeout: Duration,
}

impl ServerConfig {
    fn from_raw(raw: RawServerConfig) -> Self {
        Self {
            url: raw
                .url
                .map(|u| u.trim().trim_end_matches('/').to_string())
                .unwrap_or_default(),
            api_key: raw.api_key.unwrap_or_default(),
            request_timeout: raw
                .request_timeout_seconds
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT),
        }
    }
}

/// Service-level configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub data_dir: PathBuf,
    /// Poll cadence, and the watch time credited for each poll a session is seen playing
    pub check_interval: Duration,
}

impl ServiceConfig {
    fn from_raw(raw: RawServiceConfig) -> Self {
        Self {
            data_dir: raw
                .data_dir
                .unwrap_or_else(kicker_util::default_data_dir),
            check_interval: raw
                .check_interval_seconds
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_CHECK_INTERVAL),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: kicker_util::default_data_dir(),
            check_interval: DEFAULT_CHECK_INTERVAL,
        }
    }
}

/// How watch time is counted and when it resets
#[derive(Debug, Clone)]
pub struct QuotaPolicy {
    pub max_watch_time: Duration,
    /// Lower-cased item types that never count
    pub exempt_item_types: HashSet<String>,
    pub identity_mode: IdentityMode,
    /// None disables the daily reset
    pub reset_time: Option<WallClock>,
}

impl QuotaPolicy {
    fn from_raw(raw: RawQuotaConfig) -> Self {
        let exempt_item_types = raw
            .exempt_item_types
            .unwrap_or_else(|| vec!["audio".into()])
            .into_iter()
            .map(|t| t.trim().to_lowercase())
            .collect();

        Self {
            max_watch_time: raw
                .max_watch_seconds
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_MAX_WATCH_TIME),
            exempt_item_types,
            identity_mode: raw.track_by.unwrap_or_default(),
            reset_time: raw.reset_time.as_deref().and_then(parse_reset_time),
        }
    }

    pub fn is_exempt(&self, media_type: &str) -> bool {
        self.exempt_item_types.contains(media_type)
    }
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self::from_raw(RawQuotaConfig::default())
    }
}

/// Remote actions taken against restricted and over-quota sessions
#[derive(Debug, Clone)]
pub struct EnforcementPolicy {
    pub restricted_message: String,
    pub over_quota_message: String,
    pub quota_restored_message: String,
    pub replacement_item: Option<ItemId>,
    pub delete_device_if_no_media_control: bool,
}

impl EnforcementPolicy {
    fn from_raw(raw: RawEnforcementConfig) -> Self {
        Self {
            restricted_message: raw
                .restricted_message
                .unwrap_or_else(|| DEFAULT_RESTRICTED_MESSAGE.into()),
            over_quota_message: raw
                .over_quota_message
                .unwrap_or_else(|| DEFAULT_OVER_QUOTA_MESSAGE.into()),
            quota_restored_message: raw
                .quota_restored_message
                .unwrap_or_else(|| DEFAULT_QUOTA_RESTORED_MESSAGE.into()),
            replacement_item: raw.replacement_item_id.map(ItemId::new),
            delete_device_if_no_media_control: raw.delete_device_if_no_media_control,
        }
    }
}

impl Default for EnforcementPolicy {
    fn default() -> Self {
        Self::from_raw(RawEnforcementConfig::default())
    }
}

/// Parse the daily reset time.
///
/// Empty input disables the reset. Anything that isn't a valid `HH:MM` is
/// logged and treated as midnight.
pub fn parse_reset_time(value: &str) -> Option<WallClock> {
    if value.trim().is_empty() {
        return None;
    }

    match WallClock::parse(value) {
        Ok(at) => Some(at),
        Err(reason) => {
            error!(
                reset_time = %value,
                reason = %reason,
                "Invalid time format for reset_time, defaulting to 00:00"
            );
            Some(WallClock::MIDNIGHT)
        }
    }
}
