//! Run migrations for a single database
//!
//! Flow: validate the target, resolve credentials, load and validate the
//! script directory, then connect and hand over to the runner. Ordering
//! matters: a malformed target must fail before any directory scan or
//! connection attempt.

use anyhow::Result;
use std::path::Path;

use crate::cli::ConnectionOpts;
use crate::commands::{parse_target, resolve_credentials};
use crate::config::Credentials;
use crate::domain::key::SequenceKey;
use crate::domain::plan::Direction;
use crate::error::MigrationError;
use crate::infrastructure::arango::Database;
use crate::infrastructure::history::HistoryStore;
use crate::services::loader::{self, MigrationSet};
use crate::services::runner::{RunSummary, Runner};
use crate::ui;

pub async fn execute(
    dbname: String,
    connection: ConnectionOpts,
    script_directory: String,
    dry_run: bool,
    target: Option<String>,
) -> Result<()> {
    let target = parse_target(target.as_deref())?;
    let credentials = resolve_credentials(&connection)?;

    let set = loader::load_directory(Path::new(&script_directory))?;
    if set.is_empty() {
        return Err(MigrationError::NoMigrationsFound {
            directory: script_directory,
        }
        .into());
    }

    let (db, history) = connect(&connection, &dbname, &credentials).await?;
    let runner = Runner::new(db, history);

    if dry_run {
        return print_plan(&runner, &set, target).await;
    }

    let summary = runner.migrate(&set, target).await?;
    report(&dbname, &summary);
    Ok(())
}

/// Connect and open the history collection. Connectivity failures are
/// reported with the server's status code before propagating.
pub(crate) async fn connect(
    connection: &ConnectionOpts,
    dbname: &str,
    credentials: &Credentials,
) -> Result<(Database, HistoryStore)> {
    let db = match Database::connect(
        &connection.host,
        dbname,
        &credentials.username,
        &credentials.password,
    )
    .await
    {
        Ok(db) => db,
        Err(e) => {
            match e.status_code() {
                Some(status) => ui::print_error(&format!(
                    "Failed to connect to {} database. Error code: {}",
                    dbname, status
                )),
                None => ui::print_error(&format!("Failed to connect to {} database: {}", dbname, e)),
            }
            return Err(e.into());
        }
    };

    let history = HistoryStore::open(&db, &connection.collection).await?;
    Ok((db, history))
}

/// Print the run outcome for one database
pub(crate) fn report(dbname: &str, summary: &RunSummary) {
    match summary.direction {
        None => ui::print_info(&format!(
            "Database {} is already at version {}",
            dbname, summary.latest
        )),
        Some(Direction::Upgrade) => ui::print_success(&format!(
            "Upgraded {}: {} migration(s) applied, {} skipped, version {} -> {}",
            dbname, summary.executed, summary.skipped, summary.latest, summary.target
        )),
        Some(Direction::Downgrade) => ui::print_success(&format!(
            "Downgraded {}: {} migration(s) reverted, version {} -> {}",
            dbname, summary.executed, summary.latest, summary.target
        )),
    }
}

/// Dry run: resolve state and show what a real run would do
async fn print_plan(
    runner: &Runner,
    set: &MigrationSet,
    target: Option<SequenceKey>,
) -> Result<()> {
    let (latest, target, plan) = runner.preview(set, target).await?;

    println!("Current version: {}", latest);
    println!("Target version:  {}", target);
    println!();

    match plan {
        None => ui::print_info("Nothing to do - target is already the latest applied migration"),
        Some(plan) if plan.is_empty() => {
            ui::print_warning("No migration scripts in the planned range")
        }
        Some(plan) => {
            println!("Planned {} operations:", plan.direction.label());
            for key in &plan.keys {
                let filename = set.get(*key).map(|m| m.filename()).unwrap_or_default();
                println!("  {} {}", key, filename);
            }
        }
    }

    Ok(())
}
