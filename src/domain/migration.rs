//! Migration entity
//!
//! One versioned unit of database change: a sequence key plus the upgrade and
//! downgrade operations parsed from its script file.

use crate::domain::key::SequenceKey;
use crate::domain::script::MigrationScript;
use crate::error::{ScriptError, StoreError};
use crate::infrastructure::arango::Database;

/// A loaded migration, ordered by its sequence key
#[derive(Debug, Clone)]
pub struct Migration {
    key: SequenceKey,
    filename: String,
    script: MigrationScript,
}

impl Migration {
    /// Build a migration from a script file's name and contents.
    ///
    /// The sequence key is the filename prefix before the first underscore;
    /// the loader's filename pattern guarantees it is four digits.
    pub fn from_source(filename: &str, source: &str) -> Result<Self, ScriptError> {
        let prefix = filename.split('_').next().unwrap_or_default();
        let key = SequenceKey::parse(prefix).ok_or_else(|| ScriptError::InvalidKey {
            prefix: prefix.to_string(),
        })?;

        let script = MigrationScript::parse(source)?;

        Ok(Self {
            key,
            filename: filename.to_string(),
            script,
        })
    }

    pub fn key(&self) -> SequenceKey {
        self.key
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Apply this migration's forward steps.
    pub async fn upgrade(&self, db: &Database) -> Result<(), StoreError> {
        db.execute_steps(self.script.upgrade_steps()).await
    }

    /// Apply this migration's reverse steps.
    pub async fn downgrade(&self, db: &Database) -> Result<(), StoreError> {
        db.execute_steps(self.script.downgrade_steps()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = "upgrade = []\ndowngrade = []\n";

    #[test]
    fn test_key_is_extracted_from_filename_prefix() {
        let m = Migration::from_source("0042_add_users.toml", VALID).unwrap();
        assert_eq!(m.key().to_string(), "0042");
        assert_eq!(m.filename(), "0042_add_users.toml");
    }

    #[test]
    fn test_invalid_script_is_rejected() {
        let err = Migration::from_source("0001_bad.toml", "upgrade = []\n").unwrap_err();
        assert!(err.to_string().contains("downgrade"));
    }
}
