//! Default paths for session-kicker
//!
//! Both paths follow the XDG base directory layout and need no root:
//! - Config: `$XDG_CONFIG_HOME/session-kicker/config.toml`, else `~/.config/...`
//! - Data: `$KICKER_DATA_DIR`, else `$XDG_DATA_HOME/session-kicker`, else `~/.local/share/...`

use std::path::PathBuf;

/// Environment variable for overriding the data directory
pub const KICKER_DATA_DIR_ENV: &str = "KICKER_DATA_DIR";

const APP_DIR: &str = "session-kicker";
const CONFIG_FILENAME: &str = "config.toml";

/// Database filename within the data directory
pub const DATABASE_FILENAME: &str = "session-kicker.db";

/// `$xdg_var/session-kicker`, or `$HOME/<home_fallback>/session-kicker`
fn xdg_app_dir(xdg_var: &str, home_fallback: &str) -> Option<PathBuf> {
    std::env::var_os(xdg_var)
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(home_fallback)))
        .map(|base| base.join(APP_DIR))
}

/// Where kickerd looks for its config file when none is given
pub fn default_config_path() -> PathBuf {
    xdg_app_dir("XDG_CONFIG_HOME", ".config")
        .unwrap_or_else(|| PathBuf::from("/etc").join(APP_DIR))
        .join(CONFIG_FILENAME)
}

/// Where the SQLite database lives when the config doesn't say
pub fn default_data_dir() -> PathBuf {
    if let Some(path) = std::env::var_os(KICKER_DATA_DIR_ENV) {
        return PathBuf::from(path);
    }

    xdg_app_dir("XDG_DATA_HOME", ".local/share")
        .unwrap_or_else(|| PathBuf::from("/var/lib").join(APP_DIR))
}
