//! Migration planning - pure ordering and state reconciliation
//!
//! Given the keys discovered on disk, the latest applied key recorded in the
//! history store, and the requested target, compute the minimal correctly
//! ordered sequence of operations. No I/O here; the runner executes the plan.

use crate::domain::key::SequenceKey;

/// Which way a plan moves the database
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Upgrade,
    Downgrade,
}

impl Direction {
    pub fn label(self) -> &'static str {
        match self {
            Self::Upgrade => "upgrade",
            Self::Downgrade => "downgrade",
        }
    }
}

/// An ordered batch of migration keys to apply or revert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationPlan {
    pub direction: Direction,
    pub keys: Vec<SequenceKey>,
}

impl MigrationPlan {
    /// Build the plan for moving from `latest` to `target`.
    ///
    /// Returns None when `target == latest`: re-running the same target is a
    /// no-op by design. Candidates are the half-open interval strictly above
    /// the lower bound up to and including the upper bound - so downgrading to
    /// target T reverts everything above T but never T itself. Upgrades run
    /// oldest first, downgrades newest first.
    pub fn build(
        available: &[SequenceKey],
        latest: SequenceKey,
        target: SequenceKey,
    ) -> Option<Self> {
        if target == latest {
            return None;
        }

        let direction = if target > latest {
            Direction::Upgrade
        } else {
            Direction::Downgrade
        };

        let (low, high) = match direction {
            Direction::Upgrade => (latest, target),
            Direction::Downgrade => (target, latest),
        };

        let mut keys: Vec<SequenceKey> = available
            .iter()
            .copied()
            .filter(|k| low < *k && *k <= high)
            .collect();

        keys.sort_unstable();
        if direction == Direction::Downgrade {
            keys.reverse();
        }

        Some(Self { direction, keys })
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }
}
