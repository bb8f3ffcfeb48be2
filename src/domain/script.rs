//! Migration script format
//!
//! A migration script is a TOML file with two step arrays, `upgrade` and
//! `downgrade`, executed in file order:
//!
//! ```toml
//! [[upgrade]]
//! create_collection = "users"
//!
//! [[upgrade]]
//! aql = "FOR u IN users UPDATE u WITH { active: true } IN users"
//!
//! [[downgrade]]
//! drop_collection = "users"
//! ```
//!
//! Both arrays must be present; empty arrays (`upgrade = []`) are valid no-ops.
//! Steps are opaque to the runner: it executes them in order and surfaces
//! whatever error they raise, without interpreting it.

use serde::Deserialize;

use crate::error::ScriptError;

/// One operation inside a migration script
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptStep {
    /// Create a document collection
    CreateCollection(String),
    /// Create an edge collection
    CreateEdgeCollection(String),
    /// Drop a collection
    DropCollection(String),
    /// Create a persistent index
    CreateIndex(IndexSpec),
    /// Drop a named index
    DropIndex(DropIndexSpec),
    /// Run an AQL statement
    Aql(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IndexSpec {
    pub collection: String,
    pub fields: Vec<String>,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub sparse: bool,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DropIndexSpec {
    pub collection: String,
    pub name: String,
}

/// Raw deserialization target; both tables are optional so validation can
/// report exactly which operations are missing.
#[derive(Debug, Deserialize)]
struct RawScript {
    upgrade: Option<Vec<ScriptStep>>,
    downgrade: Option<Vec<ScriptStep>>,
}

/// A parsed, validated migration script
#[derive(Debug, Clone)]
pub struct MigrationScript {
    upgrade: Vec<ScriptStep>,
    downgrade: Vec<ScriptStep>,
}

impl MigrationScript {
    /// Parse script source and validate that both operations are declared.
    pub fn parse(source: &str) -> Result<Self, ScriptError> {
        let raw: RawScript = toml::from_str(source)?;

        let mut missing = Vec::new();
        if raw.upgrade.is_none() {
            missing.push("upgrade");
        }
        if raw.downgrade.is_none() {
            missing.push("downgrade");
        }
        if !missing.is_empty() {
            return Err(ScriptError::MissingOperations { missing });
        }

        Ok(Self {
            upgrade: raw.upgrade.unwrap_or_default(),
            downgrade: raw.downgrade.unwrap_or_default(),
        })
    }

    pub fn upgrade_steps(&self) -> &[ScriptStep] {
        &self.upgrade
    }

    pub fn downgrade_steps(&self) -> &[ScriptStep] {
        &self.downgrade
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_script() {
        let script = MigrationScript::parse(
            r#"
            [[upgrade]]
            create_collection = "users"

            [[upgrade]]
            create_index = { collection = "users", fields = ["email"], unique = true }

            [[upgrade]]
            aql = "FOR u IN users UPDATE u WITH { active: true } IN users"

            [[downgrade]]
            drop_collection = "users"
            "#,
        )
        .unwrap();

        assert_eq!(script.upgrade_steps().len(), 3);
        assert_eq!(
            script.upgrade_steps()[0],
            ScriptStep::CreateCollection("users".to_string())
        );
        match &script.upgrade_steps()[1] {
            ScriptStep::CreateIndex(spec) => {
                assert_eq!(spec.collection, "users");
                assert_eq!(spec.fields, vec!["email".to_string()]);
                assert!(spec.unique);
                assert!(!spec.sparse);
            }
            other => panic!("unexpected step: {:?}", other),
        }
        assert_eq!(
            script.downgrade_steps(),
            &[ScriptStep::DropCollection("users".to_string())]
        );
    }

    #[test]
    fn test_empty_step_arrays_are_valid() {
        let script = MigrationScript::parse("upgrade = []\ndowngrade = []\n").unwrap();
        assert!(script.upgrade_steps().is_empty());
        assert!(script.downgrade_steps().is_empty());
    }

    #[test]
    fn test_missing_downgrade_is_named() {
        let err = MigrationScript::parse("upgrade = []\n").unwrap_err();
        match err {
            ScriptError::MissingOperations { missing } => {
                assert_eq!(missing, vec!["downgrade"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_missing_both_operations_names_both() {
        let err = MigrationScript::parse("").unwrap_err();
        match err {
            ScriptError::MissingOperations { missing } => {
                assert_eq!(missing, vec!["upgrade", "downgrade"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_step_kind_is_a_parse_error() {
        let err = MigrationScript::parse(
            r#"
            [[upgrade]]
            launch_missiles = "now"

            downgrade = []
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ScriptError::Parse(_)));
    }

    #[test]
    fn test_edge_collection_and_drop_index_steps() {
        let script = MigrationScript::parse(
            r#"
            [[upgrade]]
            create_edge_collection = "follows"

            [[downgrade]]
            drop_index = { collection = "users", name = "ix_email" }

            [[downgrade]]
            drop_collection = "follows"
            "#,
        )
        .unwrap();
        assert_eq!(
            script.upgrade_steps(),
            &[ScriptStep::CreateEdgeCollection("follows".to_string())]
        );
        assert_eq!(script.downgrade_steps().len(), 2);
    }
}
