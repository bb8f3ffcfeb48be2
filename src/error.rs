//! Centralized error types for avocado
//!
//! Uses thiserror for typed errors that can be matched on,
//! while still being compatible with anyhow for propagation.

use thiserror::Error;

use crate::domain::key::SequenceKey;

/// Top-level error type for migration runs
#[derive(Error, Debug)]
pub enum RunError {
    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Credentials file not found: {path}")]
    CredentialsFileNotFound { path: String },

    #[error("Invalid credentials file {path}: {message}")]
    InvalidCredentialsFile { path: String, message: String },

    #[error("Invalid credentials file {path}. Missing key: {key}")]
    MissingCredentialKey { path: String, key: &'static str },

    #[error("Tenants file not found: {path}")]
    TenantsFileNotFound { path: String },

    #[error("Invalid tenants file {path}: {message}")]
    InvalidTenantsFile { path: String, message: String },
}

/// Migration discovery, validation, and execution errors
#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("Migration directory not found: {path}")]
    DirectoryNotFound { path: String },

    #[error("Invalid target migration: {value}. Must be a 4-digit number, e.g. 0001")]
    InvalidTarget { value: String },

    #[error("No migrations found in {directory}")]
    NoMigrationsFound { directory: String },

    #[error("Failed to read {filename}: {source}")]
    ReadFailed {
        filename: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid migration script {filename}: {source}")]
    InvalidScript {
        filename: String,
        #[source]
        source: ScriptError,
    },

    #[error("Migration {key} failed: {source}")]
    ExecutionFailed {
        key: SequenceKey,
        #[source]
        source: StoreError,
    },

    #[error("Migration sequence exhausted: next prefix after {last} would exceed 9999")]
    SequenceExhausted { last: SequenceKey },
}

/// Migration script authoring errors
#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("{0}")]
    Parse(#[from] toml::de::Error),

    #[error("missing operations: {}", .missing.join(", "))]
    MissingOperations { missing: Vec<&'static str> },

    #[error("invalid sequence key prefix: {prefix}")]
    InvalidKey { prefix: String },
}

/// Errors talking to the database backing the history store
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Server returned {status}: {message}")]
    Server { status: u16, message: String },

    #[error("Unexpected response shape: {message}")]
    UnexpectedResponse { message: String },
}

impl StoreError {
    /// HTTP status code reported by the server, when the failure carries one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            Self::UnexpectedResponse { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_target_display() {
        let err = MigrationError::InvalidTarget {
            value: "00012".to_string(),
        };
        assert!(err.to_string().contains("00012"));
        assert!(err.to_string().contains("4-digit"));
    }

    #[test]
    fn test_missing_operations_lists_every_operation() {
        let err = ScriptError::MissingOperations {
            missing: vec!["upgrade", "downgrade"],
        };
        assert_eq!(err.to_string(), "missing operations: upgrade, downgrade");
    }

    #[test]
    fn test_error_conversion() {
        let migration_err = MigrationError::NoMigrationsFound {
            directory: "./migrations".to_string(),
        };
        let run_err: RunError = migration_err.into();
        assert!(matches!(run_err, RunError::Migration(_)));
    }

    #[test]
    fn test_server_error_status_code() {
        let err = StoreError::Server {
            status: 401,
            message: "not authorized".to_string(),
        };
        assert_eq!(err.status_code(), Some(401));
    }
}
