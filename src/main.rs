use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;
mod config;
mod domain;
mod error;
mod infrastructure;
mod services;
mod ui;

use cli::{Cli, Commands};
use commands::{create, run, run_multi, status};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging with LOGGING env var support
    // LOGGING=debug,info,warn,error or just LOGGING=debug
    let log_level = std::env::var("LOGGING")
        .or_else(|_| std::env::var("LOG_LEVEL"))
        .unwrap_or_else(|_| {
            if cli.verbose {
                "debug".to_string()
            } else {
                "info".to_string()
            }
        });

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_ansi(false) // Disable ANSI escape codes for cleaner output
        .init();

    // Execute command
    match cli.command {
        Commands::Create { name, directory } => {
            create::execute(name, directory).await?;
        }
        Commands::Run {
            dbname,
            connection,
            script_directory,
            dry_run,
            target,
        } => {
            run::execute(dbname, connection, script_directory, dry_run, target).await?;
        }
        Commands::RunMulti {
            connection,
            script_directory,
            tenants_file,
            target,
        } => {
            run_multi::execute(connection, script_directory, tenants_file, target).await?;
        }
        Commands::Status {
            dbname,
            connection,
            script_directory,
        } => {
            status::execute(dbname, connection, script_directory).await?;
        }
    }

    Ok(())
}
