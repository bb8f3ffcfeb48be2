//! CLI definitions for avocado
//!
//! This module contains all CLI argument parsing structures using clap.

use clap::{Args, Parser, Subcommand};

use crate::config;

#[derive(Parser)]
#[command(
    name = "avocado",
    version,
    about = "Migration runner for ArangoDB document databases",
    long_about = "Discovers numbered migration scripts, tracks applied migrations in a\nhistory collection inside the target database, and upgrades or downgrades\nthe database to a requested version."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Connection options shared by every command that talks to a database
#[derive(Args)]
pub struct ConnectionOpts {
    /// ArangoDB host address
    #[arg(long, env = "ARANGO_HOST", default_value = config::DEFAULT_HOST)]
    pub host: String,

    /// Name of the collection storing migration history
    #[arg(long, short = 'c', default_value = config::DEFAULT_HISTORY_COLLECTION)]
    pub collection: String,

    /// Username
    #[arg(long, short = 'u', default_value = config::DEFAULT_USERNAME)]
    pub username: String,

    /// Password
    #[arg(long, short = 'p', default_value = "")]
    pub password: String,

    /// Path to JSON file containing database credentials
    /// (overrides --username/--password)
    #[arg(long)]
    pub credentials_file: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new migration script from the template
    Create {
        /// Name of the migration script (prefixed with the next 4-digit number)
        name: String,

        /// Directory where the migration script will be created
        #[arg(long, short = 'd', default_value = config::DEFAULT_SCRIPT_DIR)]
        directory: String,
    },

    /// Run migrations against a single database
    Run {
        /// Database name
        #[arg(long, short = 'd', required = true)]
        dbname: String,

        #[command(flatten)]
        connection: ConnectionOpts,

        /// Path to directory containing migration scripts
        #[arg(long, short = 's', default_value = config::DEFAULT_SCRIPT_DIR)]
        script_directory: String,

        /// Resolve state and print the plan without executing it
        #[arg(long)]
        dry_run: bool,

        /// Target migration version, e.g. 0004. Omit to migrate to the
        /// newest discovered migration; downgrading to NNNN reverts
        /// everything above NNNN but never NNNN itself.
        target: Option<String>,
    },

    /// Run migrations for every tenant in a manifest, sequentially
    RunMulti {
        #[command(flatten)]
        connection: ConnectionOpts,

        /// Path to directory containing migration scripts
        #[arg(long, short = 's', default_value = config::DEFAULT_SCRIPT_DIR)]
        script_directory: String,

        /// Path to JSON file listing tenant databases
        #[arg(long, required = true)]
        tenants_file: String,

        /// Target migration version, e.g. 0004 (applies to every tenant)
        target: Option<String>,
    },

    /// Show discovered migrations and their applied state
    Status {
        /// Database name
        #[arg(long, short = 'd', required = true)]
        dbname: String,

        #[command(flatten)]
        connection: ConnectionOpts,

        /// Path to directory containing migration scripts
        #[arg(long, short = 's', default_value = config::DEFAULT_SCRIPT_DIR)]
        script_directory: String,
    },
}
