//! Migration runner - plans and executes migration batches
//!
//! One planning+execution pass per call: resolve the effective target, read
//! the latest applied key from the history store, build the ordered plan,
//! then drive each migration's upgrade or downgrade with history bookkeeping.
//! Every await is sequential; there is no intra-process parallelism and no
//! batch-level transaction - a failing migration aborts the rest of the batch
//! and prior progress stays committed.

use tracing::{info, warn};

use crate::domain::key::SequenceKey;
use crate::domain::plan::{Direction, MigrationPlan};
use crate::error::{MigrationError, RunError};
use crate::infrastructure::arango::Database;
use crate::infrastructure::history::{self, HistoryStore};
use crate::services::loader::MigrationSet;

/// What a migration run did
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    /// None when the target already matched the latest applied key
    pub direction: Option<Direction>,
    pub executed: usize,
    pub skipped: usize,
    pub latest: SequenceKey,
    pub target: SequenceKey,
}

impl RunSummary {
    fn noop(at: SequenceKey) -> Self {
        Self {
            direction: None,
            executed: 0,
            skipped: 0,
            latest: at,
            target: at,
        }
    }
}

/// Drives migrations against one connected database
pub struct Runner {
    db: Database,
    history: HistoryStore,
}

impl Runner {
    pub fn new(db: Database, history: HistoryStore) -> Self {
        Self { db, history }
    }

    /// Resolve state and build the plan without executing anything.
    pub async fn preview(
        &self,
        set: &MigrationSet,
        requested: Option<SequenceKey>,
    ) -> Result<(SequenceKey, SequenceKey, Option<MigrationPlan>), RunError> {
        let target = resolve_target(set, requested)?;
        let latest = self.history.latest_applied().await?;
        Ok((latest, target, MigrationPlan::build(&set.keys(), latest, target)))
    }

    /// Bring the database to the requested target version.
    ///
    /// Running the same target twice performs no operations and leaves the
    /// history store untouched.
    pub async fn migrate(
        &self,
        set: &MigrationSet,
        requested: Option<SequenceKey>,
    ) -> Result<RunSummary, RunError> {
        info!(db = self.db.name(), "starting migration run");

        let target = resolve_target(set, requested)?;
        let latest = self.history.latest_applied().await?;

        let Some(plan) = MigrationPlan::build(&set.keys(), latest, target) else {
            info!(
                db = self.db.name(),
                %target,
                "target is already the latest applied migration, skipping"
            );
            return Ok(RunSummary::noop(latest));
        };

        info!(
            db = self.db.name(),
            %latest,
            %target,
            direction = plan.direction.label(),
            count = plan.len(),
            "built migration plan"
        );

        let (executed, skipped) = match plan.direction {
            Direction::Upgrade => self.run_upgrades(set, &plan).await?,
            Direction::Downgrade => self.run_downgrades(set, &plan).await?,
        };

        info!(db = self.db.name(), executed, skipped, "migration run complete");

        Ok(RunSummary {
            direction: Some(plan.direction),
            executed,
            skipped,
            latest,
            target,
        })
    }

    /// Apply candidates oldest first. The applied set is snapshotted once at
    /// batch start; already-applied candidates are skipped so a duplicate
    /// concurrent run cannot re-apply a migration (this narrows but does not
    /// eliminate the race - there is no distributed lock).
    async fn run_upgrades(
        &self,
        set: &MigrationSet,
        plan: &MigrationPlan,
    ) -> Result<(usize, usize), RunError> {
        if plan.is_empty() {
            warn!("no upgrade migrations to run");
            return Ok((0, 0));
        }

        let mut applied = self.history.all_applied().await?;
        let mut executed = 0;
        let mut skipped = 0;

        for key in &plan.keys {
            if applied.contains(key) {
                info!(%key, "migration has already been applied, skipping");
                skipped += 1;
                continue;
            }

            let migration = set.get(*key).expect("plan keys come from the loaded set");
            info!(%key, filename = migration.filename(), "running upgrade migration");

            migration
                .upgrade(&self.db)
                .await
                .map_err(|source| MigrationError::ExecutionFailed { key: *key, source })?;

            self.history
                .insert(*key, &history::generate_timestamp())
                .await?;
            applied.insert(*key);
            executed += 1;
        }

        Ok((executed, skipped))
    }

    /// Revert candidates newest first. No applied-set pre-check: a downgrade
    /// is run even when the forward pass partially failed, as best-effort
    /// recovery.
    async fn run_downgrades(
        &self,
        set: &MigrationSet,
        plan: &MigrationPlan,
    ) -> Result<(usize, usize), RunError> {
        if plan.is_empty() {
            warn!("no downgrade migrations to run");
            return Ok((0, 0));
        }

        let mut executed = 0;

        for key in &plan.keys {
            let migration = set.get(*key).expect("plan keys come from the loaded set");
            info!(%key, filename = migration.filename(), "running downgrade migration");

            migration
                .downgrade(&self.db)
                .await
                .map_err(|source| MigrationError::ExecutionFailed { key: *key, source })?;

            self.history.remove(*key).await?;
            executed += 1;
        }

        Ok((executed, 0))
    }
}

/// Effective target: the requested key, or the newest discovered migration.
fn resolve_target(
    set: &MigrationSet,
    requested: Option<SequenceKey>,
) -> Result<SequenceKey, MigrationError> {
    if let Some(target) = requested {
        return Ok(target);
    }
    set.newest_key()
        .ok_or_else(|| MigrationError::NoMigrationsFound {
            directory: set.directory().display().to_string(),
        })
}
