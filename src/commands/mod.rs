//! Command implementations - thin glue from parsed arguments to services

pub mod create;
pub mod run;
pub mod run_multi;
pub mod status;

use crate::cli::ConnectionOpts;
use crate::config::{self, Credentials};
use crate::domain::key::SequenceKey;
use crate::error::{ConfigError, MigrationError};

/// Resolve credentials: the credentials file, when given, wins over the
/// inline username/password flags.
pub(crate) fn resolve_credentials(connection: &ConnectionOpts) -> Result<Credentials, ConfigError> {
    match &connection.credentials_file {
        Some(path) => config::load_credentials(path),
        None => Ok(Credentials {
            username: connection.username.clone(),
            password: connection.password.clone(),
        }),
    }
}

/// Validate the optional target argument. Runs before any directory scan or
/// connection attempt so a malformed target is a pure usage error.
pub(crate) fn parse_target(target: Option<&str>) -> Result<Option<SequenceKey>, MigrationError> {
    target
        .map(|value| {
            SequenceKey::parse(value).ok_or_else(|| MigrationError::InvalidTarget {
                value: value.to_string(),
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target_accepts_four_digit_keys() {
        let target = parse_target(Some("0004")).unwrap().unwrap();
        assert_eq!(target.to_string(), "0004");
        assert!(parse_target(None).unwrap().is_none());
        assert_eq!(parse_target(Some("0000")).unwrap().unwrap(), SequenceKey::ZERO);
    }

    #[test]
    fn test_parse_target_rejects_malformed_values() {
        for value in ["abc", "12", "00012", "1e03", ""] {
            let err = parse_target(Some(value)).unwrap_err();
            assert!(
                matches!(err, MigrationError::InvalidTarget { .. }),
                "expected InvalidTarget for {:?}",
                value
            );
        }
    }
}
