//! Defaults and configuration file loading
//!
//! Credentials and tenant manifests are plain JSON files loaded once per
//! invocation and passed down - no globals, no cross-invocation caching.

use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::io::ErrorKind;

use crate::error::ConfigError;

pub const DEFAULT_HOST: &str = "http://localhost:8529";
pub const DEFAULT_HISTORY_COLLECTION: &str = "migration_history";
pub const DEFAULT_USERNAME: &str = "root";
pub const DEFAULT_SCRIPT_DIR: &str = "./migrations";

/// Database credentials
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// One tenant database in a multi-tenant manifest. Extra fields in the
/// manifest are ignored; `databaseName` is the only one this tool needs.
#[derive(Debug, Clone, Deserialize)]
pub struct Tenant {
    #[serde(rename = "databaseName")]
    pub database_name: String,
}

/// Load credentials from a JSON file with `username` and `password` keys.
/// A missing key is a fatal configuration error naming the key.
pub fn load_credentials(path: &str) -> Result<Credentials, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ConfigError::CredentialsFileNotFound {
            path: path.to_string(),
        },
        _ => ConfigError::InvalidCredentialsFile {
            path: path.to_string(),
            message: e.to_string(),
        },
    })?;

    let value: Value =
        serde_json::from_str(&contents).map_err(|e| ConfigError::InvalidCredentialsFile {
            path: path.to_string(),
            message: e.to_string(),
        })?;

    let field = |key: &'static str| -> Result<String, ConfigError> {
        value
            .get(key)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(ConfigError::MissingCredentialKey {
                path: path.to_string(),
                key,
            })
    };

    Ok(Credentials {
        username: field("username")?,
        password: field("password")?,
    })
}

/// Load the tenant manifest: a JSON array of objects, each with at least a
/// `databaseName` field.
pub fn load_tenants(path: &str) -> Result<Vec<Tenant>, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => ConfigError::TenantsFileNotFound {
            path: path.to_string(),
        },
        _ => ConfigError::InvalidTenantsFile {
            path: path.to_string(),
            message: e.to_string(),
        },
    })?;

    serde_json::from_str(&contents).map_err(|e| ConfigError::InvalidTenantsFile {
        path: path.to_string(),
        message: e.to_string(),
    })
}
