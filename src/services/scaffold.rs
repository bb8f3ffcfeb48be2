//! Scaffolding for new migration scripts
//!
//! Creates the next script in a directory's sequence: prefix = highest
//! existing prefix + 1 (0001 when the directory is empty), body from a fixed
//! template with the generation date and filename interpolated.

use anyhow::{Context, Result};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::domain::key::SequenceKey;
use crate::error::MigrationError;
use crate::services::loader;

/// Create a new migration script and return its path.
///
/// The directory is created if missing. The provided name is sanitized the
/// same way the loader's filename pattern expects: lowercase, spaces and
/// dashes become underscores.
pub fn create_migration_script(name: &str, directory: &Path) -> Result<PathBuf> {
    let sanitized = sanitize_name(name);
    if sanitized.is_empty() {
        anyhow::bail!("Migration name must contain at least one alphanumeric character");
    }

    fs::create_dir_all(directory)
        .with_context(|| format!("Failed to create {}", directory.display()))?;

    let prefix = next_prefix(directory)?;
    let filename = format!("{}_{}.toml", prefix, sanitized);
    let path = directory.join(&filename);

    let date = Utc::now().format("%Y-%m-%d").to_string();
    fs::write(&path, render_template(&filename, &date))
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!(%filename, "created migration script");
    Ok(path)
}

/// The zero-padded prefix for the next script in the directory's sequence.
fn next_prefix(directory: &Path) -> Result<SequenceKey> {
    let filenames = loader::migration_filenames(directory)?;

    // filenames sort ascending, so the last one carries the highest prefix
    let last = match filenames.last() {
        None => return Ok(SequenceKey::ZERO.next().expect("0001 is in range")),
        Some(filename) => filename
            .split('_')
            .next()
            .and_then(SequenceKey::parse)
            .expect("loader pattern guarantees a 4-digit prefix"),
    };

    last.next()
        .ok_or(MigrationError::SequenceExhausted { last })
        .map_err(Into::into)
}

fn sanitize_name(name: &str) -> String {
    name.to_lowercase()
        .replace([' ', '-'], "_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

fn render_template(filename: &str, date: &str) -> String {
    format!(
        r#"# {filename}
# Created: {date}
#
# Steps run in file order. Step kinds:
#   create_collection = "name"
#   create_edge_collection = "name"
#   drop_collection = "name"
#   create_index = {{ collection = "name", fields = ["field"], unique = false }}
#   drop_index = {{ collection = "name", name = "index_name" }}
#   aql = "FOR doc IN name ..."

upgrade = []

downgrade = []
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::script::MigrationScript;

    #[test]
    fn test_first_script_in_an_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_migration_script("add_users", dir.path()).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            "0001_add_users.toml"
        );
        assert!(path.exists());
    }

    #[test]
    fn test_prefix_continues_the_sequence() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("0001_x.toml"), "upgrade = []\ndowngrade = []\n").unwrap();
        fs::write(dir.path().join("0002_y.toml"), "upgrade = []\ndowngrade = []\n").unwrap();

        let path = create_migration_script("add_index", dir.path()).unwrap();
        assert_eq!(
            path.file_name().unwrap().to_string_lossy(),
            "0003_add_index.toml"
        );
    }

    #[test]
    fn test_directory_is_created_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("migrations");
        let path = create_migration_script("initial", &nested).unwrap();
        assert!(path.starts_with(&nested));
    }

    #[test]
    fn test_template_interpolates_and_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_migration_script("add_users", dir.path()).unwrap();
        let contents = fs::read_to_string(&path).unwrap();

        assert!(contents.contains("0001_add_users.toml"));
        assert!(contents.contains("# Created: "));

        // the scaffold must itself be a valid (no-op) migration script
        let script = MigrationScript::parse(&contents).unwrap();
        assert!(script.upgrade_steps().is_empty());
        assert!(script.downgrade_steps().is_empty());
    }

    #[test]
    fn test_name_sanitization() {
        assert_eq!(sanitize_name("Add Users"), "add_users");
        assert_eq!(sanitize_name("fix-index"), "fix_index");
        assert_eq!(sanitize_name("weird!!chars"), "weirdchars");
        assert_eq!(sanitize_name("!!!"), "");
    }

    #[test]
    fn test_sequence_exhaustion() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("9999_last.toml"), "upgrade = []\ndowngrade = []\n").unwrap();

        let err = create_migration_script("one_more", dir.path()).unwrap_err();
        assert!(err.to_string().contains("9999"));
    }
}
