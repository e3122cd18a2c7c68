//! Raw configuration schema (as parsed from TOML)

use kicker_api::IdentityMode;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Media server connection
    #[serde(default)]
    pub server: RawServerConfig,

    /// Service-level settings
    #[serde(default)]
    pub service: RawServiceConfig,

    /// Watch-time quota
    #[serde(default)]
    pub quota: RawQuotaConfig,

    /// What happens once a quota is used up
    #[serde(default)]
    pub enforcement: RawEnforcementConfig,
}

/// Media server connection settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServerConfig {
    /// Base URL, e.g. `http://localhost:8096`
    pub url: Option<String>,

    /// API key used as the access token
    pub api_key: Option<String>,

    /// Timeout for each request to the server
    pub request_timeout_seconds: Option<u64>,
}

/// Service-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServiceConfig {
    /// Data directory for the policy store
    pub data_dir: Option<PathBuf>,

    /// Seconds between polls; also the watch time credited per poll
    pub check_interval_seconds: Option<u64>,
}

/// Quota settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawQuotaConfig {
    /// Watch time allowed per period before enforcement starts
    pub max_watch_seconds: Option<u64>,

    /// Item types that never count against the quota (case-insensitive)
    pub exempt_item_types: Option<Vec<String>>,

    /// Track quota per "user" or per "device"
    pub track_by: Option<IdentityMode>,

    /// Daily reset time (HH:MM). Absent or empty disables the reset.
    pub reset_time: Option<String>,
}

/// Enforcement settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawEnforcementConfig {
    /// Shown once when an entity starts accruing restricted watch time
    pub restricted_message: Option<String>,

    /// Shown every time an over-quota session is stopped
    pub over_quota_message: Option<String>,

    /// Shown after the daily reset
    pub quota_restored_message: Option<String>,

    /// Item played in place of the stopped stream
    pub replacement_item_id: Option<String>,

    /// Delete devices that cannot be remote-controlled instead of stopping them
    #[serde(default)]
    pub delete_device_if_no_media_control: bool,
}
