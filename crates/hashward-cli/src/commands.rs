//! Subcommands and their execution against an integrity engine

use std::path::{Path, PathBuf};

use clap::Subcommand;
use hashward_core::{Clock, DataHash, IntegrityEngine, IntegrityStore, PublicKey};
use serde_json::{json, Value};
use tracing::debug;

use crate::error::{CliError, Result};

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Register a device, or update an existing one and reactivate it
    RegisterDevice {
        device_id: String,
        /// Human-readable name
        #[arg(long)]
        name: String,
        /// Compressed public key as 66 hex characters
        #[arg(long)]
        public_key: String,
    },

    /// Stop accepting submissions from a device
    DeactivateDevice { device_id: String },

    /// Show a registered device
    Device { device_id: String },

    /// Submit a content hash observed by a device
    Submit {
        data_id: String,
        #[arg(long)]
        device: String,
        /// SHA-256 as 64 hex characters
        #[arg(long, conflicts_with = "file", required_unless_present = "file")]
        hash: Option<String>,
        /// Hash the contents of this file instead
        #[arg(long)]
        file: Option<PathBuf>,
        /// Observation time in milliseconds since the epoch (default: now)
        #[arg(long)]
        timestamp: Option<i64>,
    },

    /// Check a hash against the accepted hash of a data item
    Verify {
        data_id: String,
        #[arg(long)]
        hash: String,
        /// Opaque proof bytes, passed through to the proof verifier
        #[arg(long, default_value = "")]
        proof: String,
    },

    /// Settle an open conflict by choosing one of its candidates
    Resolve {
        data_id: String,
        #[arg(long)]
        hash: String,
        /// Principal performing the resolution (default: the owner)
        #[arg(long)]
        caller: Option<String>,
    },

    /// Show the accepted hash of a data item
    Hash { data_id: String },

    /// Show the recent history of a data item
    History { data_id: String },

    /// Show the conflict record of a data item
    Conflict { data_id: String },
}

/// Run one command and return its JSON result.
pub fn run<S: IntegrityStore>(
    engine: &IntegrityEngine<S>,
    owner: &str,
    command: Command,
    clock: &dyn Clock,
) -> Result<Value> {
    debug!(owner, ?command, "running command");

    let output = match command {
        Command::RegisterDevice {
            device_id,
            name,
            public_key,
        } => {
            let key = PublicKey::from_hex(&public_key).ok_or_else(|| {
                CliError::Argument(format!(
                    "public key must be 66 hex characters: {}",
                    public_key
                ))
            })?;
            engine.register_device(owner, &device_id, &name, key.as_bytes())?;
            json!({ "device_id": device_id, "registered": true })
        }
        Command::DeactivateDevice { device_id } => {
            engine.deactivate_device(owner, &device_id)?;
            json!({ "device_id": device_id, "is_active": false })
        }
        Command::Device { device_id } => {
            serde_json::to_value(engine.get_device(owner, &device_id)?)?
        }
        Command::Submit {
            data_id,
            device,
            hash,
            file,
            timestamp,
        } => {
            let hash = match (hash, file) {
                (Some(hex), _) => parse_hash(&hex)?,
                (None, Some(path)) => hash_file(&path)?,
                (None, None) => {
                    return Err(CliError::Argument("either --hash or --file is required".into()))
                }
            };
            let timestamp = timestamp.unwrap_or_else(|| clock.now_millis());
            let outcome = engine.submit_hash(owner, &data_id, hash, &device, timestamp)?;
            let mut value = serde_json::to_value(outcome)?;
            value["hash"] = json!(hash);
            value
        }
        Command::Verify {
            data_id,
            hash,
            proof,
        } => {
            let hash = parse_hash(&hash)?;
            let verified = engine.verify_data(owner, &data_id, hash, proof.as_bytes())?;
            json!({ "data_id": data_id, "verified": verified })
        }
        Command::Resolve {
            data_id,
            hash,
            caller,
        } => {
            let caller = caller.as_deref().unwrap_or(owner);
            let record = engine.resolve_conflict(owner, &data_id, parse_hash(&hash)?, caller)?;
            serde_json::to_value(record)?
        }
        Command::Hash { data_id } => {
            serde_json::to_value(engine.get_data_hash(owner, &data_id)?)?
        }
        Command::History { data_id } => {
            serde_json::to_value(engine.get_integrity_history(owner, &data_id)?)?
        }
        Command::Conflict { data_id } => {
            serde_json::to_value(engine.get_conflict(owner, &data_id)?)?
        }
    };

    Ok(output)
}

fn parse_hash(hex: &str) -> Result<DataHash> {
    DataHash::from_hex(hex)
        .ok_or_else(|| CliError::Argument(format!("hash must be 64 hex characters: {}", hex)))
}

fn hash_file(path: &Path) -> Result<DataHash> {
    let content = std::fs::read(path).map_err(|source| CliError::Read {
        path: path.display().to_string(),
        source,
    })?;
    Ok(DataHash::digest(&content))
}
