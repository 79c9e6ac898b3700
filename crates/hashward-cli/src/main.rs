//! Hashward command-line tool
//!
//! Runs integrity engine operations against a SQLite database and prints
//! the result as JSON.
//!
//! Usage:
//!     hashward --owner alice register-device laptop --name Laptop --public-key 02ab...
//!     hashward --owner alice submit notes --device laptop --file notes.txt
//!     hashward --owner alice history notes

mod commands;
mod error;
mod logging;

use clap::Parser;
use hashward_core::{IntegrityEngine, SystemClock};
use hashward_sqlite::SqliteStore;
use tracing::info;

use crate::commands::Command;
use crate::error::Result;

#[derive(Parser, Debug)]
#[command(name = "hashward")]
#[command(about = "Multi-device data integrity tracking")]
#[command(version)]
struct Args {
    /// SQLite database path
    #[arg(long, env = "HASHWARD_DB", default_value = "hashward.db")]
    db: String,

    /// Owner whose records are read and written
    #[arg(long, env = "HASHWARD_OWNER")]
    owner: String,

    /// Log level (debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    logging::init_with_filter(&args.log_level);

    let output = execute(args)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn execute(args: Args) -> Result<serde_json::Value> {
    let store = SqliteStore::open(&args.db)?;
    info!(db = %args.db, owner = %args.owner, "opened integrity store");

    let engine = IntegrityEngine::new(store);
    commands::run(&engine, &args.owner, args.command, &SystemClock)
}
