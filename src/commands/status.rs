//! Status command - read-only view of migration state
//!
//! Lists every discovered script with its applied timestamp, plus history
//! records that no longer have a script on disk.

use anyhow::Result;
use colored::Colorize;
use std::collections::HashMap;
use std::path::Path;

use crate::cli::ConnectionOpts;
use crate::commands::resolve_credentials;
use crate::domain::key::SequenceKey;
use crate::services::loader;
use crate::ui;

pub async fn execute(
    dbname: String,
    connection: ConnectionOpts,
    script_directory: String,
) -> Result<()> {
    let credentials = resolve_credentials(&connection)?;
    let set = loader::load_directory(Path::new(&script_directory))?;

    let (_, history) = super::run::connect(&connection, &dbname, &credentials).await?;
    let latest = history.latest_applied().await?;
    let applied: HashMap<SequenceKey, String> =
        history.applied_timestamps().await?.into_iter().collect();

    ui::print_header(&format!("Migration status: {}", dbname));

    println!("Current version: {}", latest.to_string().bold());
    match set.newest_key() {
        Some(newest) => println!("Newest script:   {}", newest.to_string().bold()),
        None => ui::print_warning(&format!("No migration scripts found in {}", script_directory)),
    }
    println!();

    for migration in set.migrations() {
        match applied.get(&migration.key()) {
            Some(ts) => println!(
                "  {} {}  applied {}",
                "✓".green(),
                migration.filename(),
                ts.dimmed()
            ),
            None => println!(
                "  {} {}  {}",
                "•".yellow(),
                migration.filename(),
                "pending".yellow()
            ),
        }
    }

    // history records with no matching script on disk
    let on_disk: Vec<SequenceKey> = set.keys();
    let mut orphans: Vec<(&SequenceKey, &String)> = applied
        .iter()
        .filter(|(key, _)| !on_disk.contains(*key))
        .collect();
    orphans.sort();
    for (key, ts) in orphans {
        println!(
            "  {} {}  applied {} {}",
            "!".red(),
            key,
            ts.dimmed(),
            "(no script on disk)".red()
        );
    }

    Ok(())
}
