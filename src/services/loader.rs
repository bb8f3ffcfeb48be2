//! Migration script loader
//!
//! Scans a directory for files named `NNNN_description.toml`, loads each into
//! a Migration entity, and returns them sorted ascending by filename.
//! Identical directory contents always yield the same ordered sequence,
//! whatever order the filesystem lists them in.

use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use crate::domain::key::SequenceKey;
use crate::domain::migration::Migration;
use crate::error::MigrationError;

/// Filename pattern for migration scripts. Extension check is case-sensitive.
pub const FILENAME_PATTERN: &str = r"^\d{4}_[A-Za-z0-9_]+\.toml$";

/// The ordered migrations loaded from one directory
#[derive(Debug, Clone)]
pub struct MigrationSet {
    directory: PathBuf,
    migrations: Vec<Migration>,
}

impl MigrationSet {
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn migrations(&self) -> &[Migration] {
        &self.migrations
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    /// Highest discovered key - the effective target when none is requested
    pub fn newest_key(&self) -> Option<SequenceKey> {
        self.migrations.last().map(Migration::key)
    }

    pub fn keys(&self) -> Vec<SequenceKey> {
        self.migrations.iter().map(Migration::key).collect()
    }

    pub fn get(&self, key: SequenceKey) -> Option<&Migration> {
        self.migrations.iter().find(|m| m.key() == key)
    }
}

/// List migration script filenames in a directory, sorted ascending.
pub fn migration_filenames(directory: &Path) -> Result<Vec<String>, MigrationError> {
    if !directory.is_dir() {
        return Err(MigrationError::DirectoryNotFound {
            path: directory.display().to_string(),
        });
    }

    let pattern = Regex::new(FILENAME_PATTERN).expect("filename pattern is valid");

    let entries = fs::read_dir(directory).map_err(|source| MigrationError::ReadFailed {
        filename: directory.display().to_string(),
        source,
    })?;

    let mut filenames = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| MigrationError::ReadFailed {
            filename: directory.display().to_string(),
            source,
        })?;
        let filename = entry.file_name().to_string_lossy().to_string();
        if pattern.is_match(&filename) {
            filenames.push(filename);
        }
    }

    filenames.sort();
    Ok(filenames)
}

/// Load every migration script in a directory.
pub fn load_directory(directory: &Path) -> Result<MigrationSet, MigrationError> {
    let mut migrations = Vec::new();

    for filename in migration_filenames(directory)? {
        let path = directory.join(&filename);
        let source = fs::read_to_string(&path).map_err(|source| MigrationError::ReadFailed {
            filename: filename.clone(),
            source,
        })?;

        let migration = Migration::from_source(&filename, &source).map_err(|source| {
            MigrationError::InvalidScript {
                filename: filename.clone(),
                source,
            }
        })?;
        migrations.push(migration);
    }

    debug!(
        directory = %directory.display(),
        count = migrations.len(),
        "loaded migration scripts"
    );

    Ok(MigrationSet {
        directory: directory.to_path_buf(),
        migrations,
    })
}

/// Per-invocation cache of loaded migration directories, keyed by resolved
/// absolute path. `run-multi` reuses one loaded set across all tenants; the
/// cache dies with the invocation.
#[derive(Debug, Default)]
pub struct ScriptCache {
    loaded: HashMap<PathBuf, Arc<MigrationSet>>,
}

impl ScriptCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load(&mut self, directory: &Path) -> Result<Arc<MigrationSet>, MigrationError> {
        let resolved =
            fs::canonicalize(directory).map_err(|_| MigrationError::DirectoryNotFound {
                path: directory.display().to_string(),
            })?;

        if let Some(set) = self.loaded.get(&resolved) {
            return Ok(Arc::clone(set));
        }

        let set = Arc::new(load_directory(&resolved)?);
        self.loaded.insert(resolved, Arc::clone(&set));
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write as _;

    const VALID_SCRIPT: &str = "upgrade = []\ndowngrade = []\n";

    fn write_script(dir: &Path, filename: &str, contents: &str) {
        let mut file = File::create(dir.join(filename)).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
    }

    #[test]
    fn test_filenames_are_sorted_regardless_of_creation_order() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "0003_third.toml", VALID_SCRIPT);
        write_script(dir.path(), "0001_first.toml", VALID_SCRIPT);
        write_script(dir.path(), "0002_second.toml", VALID_SCRIPT);

        let filenames = migration_filenames(dir.path()).unwrap();
        assert_eq!(
            filenames,
            vec!["0001_first.toml", "0002_second.toml", "0003_third.toml"]
        );
    }

    #[test]
    fn test_non_matching_filenames_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "0001_valid.toml", VALID_SCRIPT);
        write_script(dir.path(), "001_too_short.toml", VALID_SCRIPT);
        write_script(dir.path(), "00012_too_long.toml", VALID_SCRIPT);
        write_script(dir.path(), "0002_wrong_ext.sql", VALID_SCRIPT);
        write_script(dir.path(), "0003_upper.TOML", VALID_SCRIPT);
        write_script(dir.path(), "0004-dashed.toml", VALID_SCRIPT);
        write_script(dir.path(), "notes.txt", "");

        let filenames = migration_filenames(dir.path()).unwrap();
        assert_eq!(filenames, vec!["0001_valid.toml"]);
    }

    #[test]
    fn test_missing_directory_fails() {
        let err = migration_filenames(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, MigrationError::DirectoryNotFound { .. }));
    }

    #[test]
    fn test_file_path_is_not_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "0001_valid.toml", VALID_SCRIPT);
        let err = migration_filenames(&dir.path().join("0001_valid.toml")).unwrap_err();
        assert!(matches!(err, MigrationError::DirectoryNotFound { .. }));
    }

    #[test]
    fn test_load_directory_builds_ordered_entities() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "0002_second.toml", VALID_SCRIPT);
        write_script(dir.path(), "0001_first.toml", VALID_SCRIPT);

        let set = load_directory(dir.path()).unwrap();
        assert_eq!(set.migrations().len(), 2);
        assert_eq!(
            set.keys().iter().map(|k| k.to_string()).collect::<Vec<_>>(),
            vec!["0001", "0002"]
        );
        assert_eq!(set.newest_key().unwrap().to_string(), "0002");
        assert!(set.get(SequenceKey::parse("0001").unwrap()).is_some());
        assert!(set.get(SequenceKey::parse("0003").unwrap()).is_none());
    }

    #[test]
    fn test_invalid_script_surfaces_filename_and_missing_operation() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "0001_broken.toml", "upgrade = []\n");

        let err = load_directory(dir.path()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("0001_broken.toml"));
        match err {
            MigrationError::InvalidScript { source, .. } => {
                assert!(source.to_string().contains("downgrade"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_cache_loads_each_directory_once() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "0001_first.toml", VALID_SCRIPT);

        let mut cache = ScriptCache::new();
        let first = cache.get_or_load(dir.path()).unwrap();
        let second = cache.get_or_load(dir.path()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_cache_misses_missing_directory() {
        let mut cache = ScriptCache::new();
        let err = cache.get_or_load(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, MigrationError::DirectoryNotFound { .. }));
    }
}
