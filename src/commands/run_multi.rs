//! Run migrations for every tenant in a manifest
//!
//! Tenants are processed strictly sequentially, one full migrate cycle per
//! tenant, in manifest order. A failing tenant is logged and does not block
//! the others; the process exits non-zero if any tenant failed.

use anyhow::Result;
use colored::Colorize;
use std::path::Path;
use tracing::error;

use crate::cli::ConnectionOpts;
use crate::commands::run;
use crate::commands::{parse_target, resolve_credentials};
use crate::config::{self, Credentials, Tenant};
use crate::domain::key::SequenceKey;
use crate::error::MigrationError;
use crate::services::loader::{MigrationSet, ScriptCache};
use crate::services::runner::{RunSummary, Runner};
use crate::ui;

pub async fn execute(
    connection: ConnectionOpts,
    script_directory: String,
    tenants_file: String,
    target: Option<String>,
) -> Result<()> {
    let target = parse_target(target.as_deref())?;
    let credentials = resolve_credentials(&connection)?;
    let tenants = config::load_tenants(&tenants_file)?;

    if tenants.is_empty() {
        ui::print_warning(&format!("No tenants listed in {}", tenants_file));
        return Ok(());
    }

    // one load per distinct directory for the whole invocation
    let mut cache = ScriptCache::new();
    let set = cache.get_or_load(Path::new(&script_directory))?;
    if set.is_empty() {
        return Err(MigrationError::NoMigrationsFound {
            directory: script_directory,
        }
        .into());
    }

    let mut failed = 0;
    for tenant in &tenants {
        println!();
        println!(
            "🗃️  {}",
            format!("Migrating tenant database {}...", tenant.database_name).bold()
        );

        match migrate_tenant(&connection, &credentials, tenant, &set, target).await {
            Ok(summary) => run::report(&tenant.database_name, &summary),
            Err(e) => {
                error!(db = %tenant.database_name, error = %e, "tenant migration failed");
                ui::print_error(&format!("Tenant {} failed: {:#}", tenant.database_name, e));
                failed += 1;
            }
        }
    }

    println!();
    if failed > 0 {
        anyhow::bail!("{} of {} tenant(s) failed", failed, tenants.len());
    }
    ui::print_success(&format!("All {} tenant(s) migrated", tenants.len()));
    Ok(())
}

async fn migrate_tenant(
    connection: &ConnectionOpts,
    credentials: &Credentials,
    tenant: &Tenant,
    set: &MigrationSet,
    target: Option<SequenceKey>,
) -> Result<RunSummary> {
    let (db, history) = run::connect(connection, &tenant.database_name, credentials).await?;
    let summary = Runner::new(db, history).migrate(set, target).await?;
    Ok(summary)
}
