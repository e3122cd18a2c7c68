//! Config validation CLI tool
//!
//! Checks a session-kicker configuration file and prints either the
//! effective settings or every problem found.

use kicker_config::{Config, ConfigError, CURRENT_CONFIG_VERSION};
use kicker_util::{default_config_path, format_duration};
use std::path::PathBuf;
use std::process::ExitCode;

fn print_summary(path: &std::path::Path, config: &Config) {
    println!("✓ {} is valid", path.display());
    println!();
    println!("  Server:            {}", config.server.url);
    println!(
        "  Poll interval:     {}",
        format_duration(config.service.check_interval)
    );
    println!(
        "  Max watch time:    {}",
        format_duration(config.quota.max_watch_time)
    );
    println!("  Tracking by:       {}", config.quota.identity_mode);

    let mut exempt: Vec<_> = config.quota.exempt_item_types.iter().collect();
    exempt.sort();
    println!("  Exempt item types: {:?}", exempt);

    match config.quota.reset_time {
        Some(at) => println!("  Daily reset:       {}", at),
        None => println!("  Daily reset:       disabled"),
    }
    if let Some(item) = &config.enforcement.replacement_item {
        println!("  Replacement item:  {}", item);
    }
    if config.enforcement.delete_device_if_no_media_control {
        println!("  Devices without media control will be deleted");
    }
}

fn print_error(path: &std::path::Path, error: &ConfigError) {
    eprintln!("✗ {} is not usable", path.display());
    eprintln!();
    match error {
        ConfigError::ValidationFailed { errors } => {
            eprintln!("{} problem(s):", errors.len());
            for err in errors {
                eprintln!("  - {}", err);
            }
        }
        ConfigError::UnsupportedVersion(found) => {
            eprintln!(
                "config_version = {} is not supported (expected {})",
                found, CURRENT_CONFIG_VERSION
            );
        }
        other => eprintln!("{}", other),
    }
}

fn main() -> ExitCode {
    let path = match std::env::args_os().nth(1) {
        Some(arg) if arg == "-h" || arg == "--help" => {
            eprintln!("Usage: validate-config [config-file]");
            eprintln!("Defaults to {}", default_config_path().display());
            return ExitCode::from(2);
        }
        Some(arg) => PathBuf::from(arg),
        None => default_config_path(),
    };

    match kicker_config::load_config(&path) {
        Ok(config) => {
            print_summary(&path, &config);
            ExitCode::SUCCESS
        }
        Err(e) => {
            print_error(&path, &e);
            ExitCode::from(1)
        }
    }
}
