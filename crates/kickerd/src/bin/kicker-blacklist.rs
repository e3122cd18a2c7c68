//! Blacklist administration tool
//!
//! Adds, removes and lists the (entity, media type) restrictions kickerd
//! enforces. Writes go straight to the service database; a running kickerd
//! picks them up on its next poll.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kicker_api::IdentityMode;
use kicker_store::{AuditEvent, AuditEventType, SqliteStore, Store};
use kicker_util::{DATABASE_FILENAME, EntityId, default_config_path};
use std::path::PathBuf;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "kicker-blacklist")]
#[command(about = "Manage session-kicker restrictions", long_about = None)]
struct Args {
    /// Configuration file used to locate the data directory and identity mode
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Data directory override (or set KICKER_DATA_DIR env var)
    #[arg(short, long, env = "KICKER_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Identity kind of the entity: user or device (default: the configured mode)
    #[arg(long)]
    by: Option<IdentityMode>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Restrict an entity from one or more media types
    Add {
        entity_id: String,
        #[arg(required = true)]
        media_types: Vec<String>,
    },
    /// Lift restrictions
    Remove {
        entity_id: String,
        #[arg(required = true)]
        media_types: Vec<String>,
    },
    /// Show every restriction
    List,
}

/// Data directory and identity mode, preferring explicit arguments over the config file
fn resolve(args: &Args) -> (PathBuf, IdentityMode) {
    let config = match kicker_config::load_config(&args.config) {
        Ok(config) => Some(config),
        Err(e) => {
            debug!(error = %e, path = %args.config.display(), "Config not usable, using defaults");
            None
        }
    };

    let data_dir = args
        .data_dir
        .clone()
        .or_else(|| config.as_ref().map(|c| c.service.data_dir.clone()))
        .unwrap_or_else(kicker_util::default_data_dir);

    let mode = args
        .by
        .or_else(|| config.as_ref().map(|c| c.quota.identity_mode))
        .unwrap_or_default();

    (data_dir, mode)
}

fn audit(store: &dyn Store, event: AuditEventType) {
    if let Err(e) = store.append_audit(AuditEvent::new(event)) {
        warn!(error = %e, "Failed to write audit event");
    }
}

fn run(args: Args) -> Result<()> {
    let (data_dir, mode) = resolve(&args);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

    let db_path = data_dir.join(DATABASE_FILENAME);
    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("Failed to open database {:?}", db_path))?;

    match args.command {
        Command::Add {
            entity_id,
            media_types,
        } => {
            let entity_id = EntityId::new(entity_id);
            for media_type in media_types {
                if store.add_restriction(mode, &entity_id, &media_type)? {
                    audit(
                        &store,
                        AuditEventType::RestrictionAdded {
                            entity_kind: mode,
                            entity_id: entity_id.clone(),
                            media_type: media_type.to_lowercase(),
                        },
                    );
                    println!("Restricted {} {} from {}", mode, entity_id, media_type);
                } else {
                    println!("{} {} is already restricted from {}", mode, entity_id, media_type);
                }
            }
        }
        Command::Remove {
            entity_id,
            media_types,
        } => {
            let entity_id = EntityId::new(entity_id);
            for media_type in media_types {
                if store.remove_restriction(mode, &entity_id, &media_type)? {
                    audit(
                        &store,
                        AuditEventType::RestrictionRemoved {
                            entity_kind: mode,
                            entity_id: entity_id.clone(),
                            media_type: media_type.to_lowercase(),
                        },
                    );
                    println!("Lifted {} restriction for {} {}", media_type, mode, entity_id);
                } else {
                    println!("No {} restriction for {} {}", media_type, mode, entity_id);
                }
            }
        }
        Command::List => {
            let restrictions = store.list_restrictions()?;
            if restrictions.is_empty() {
                println!("No restrictions");
            }
            for r in restrictions {
                println!(
                    "{:<6}  {:<36}  {:<10}  since {}",
                    r.entity_kind,
                    r.entity_id,
                    r.media_type,
                    kicker_util::format_datetime_full(&r.created_at)
                );
            }
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    run(Args::parse())
}
