//! Typed errors for the configuration lifecycle.
//!
//! Every fallible operation in this crate returns one of these enums; no
//! error is swallowed and no operation retries on its own.

use std::num::ParseIntError;
use std::path::PathBuf;
use thiserror::Error;

/// Configuration lifecycle errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// log-outputs list is empty
    #[error("log-outputs cannot be empty")]
    EmptyLogOutputs,

    /// aws-region field is empty
    #[error("aws-region cannot be empty")]
    EmptyRegion,

    /// user-name field is empty
    #[error("user-name cannot be empty")]
    EmptyUserName,

    /// image-id field is empty
    #[error("image-id cannot be empty")]
    EmptyImageId,

    /// instance-type field is empty
    #[error("instance-type cannot be empty")]
    EmptyInstanceType,

    /// cluster-size field is non-positive
    #[error("cluster-size must be at least 1, got {0}")]
    InvalidClusterSize(u32),

    /// instance-type is not in the static catalog
    #[error("unknown instance type {0:?}")]
    UnknownInstanceType(String),

    /// Environment override holds a value that is not a boolean literal
    #[error("invalid boolean {value:?} in {var}")]
    InvalidBool { var: String, value: String },

    /// Environment override holds a value that is not an integer
    #[error("invalid integer {value:?} in {var}: {source}")]
    InvalidInt {
        var: String,
        value: String,
        #[source]
        source: ParseIntError,
    },

    /// Environment override holds a value that is not a duration literal
    #[error("invalid duration {value:?} in {var}: {source}")]
    InvalidDuration {
        var: String,
        value: String,
        #[source]
        source: humantime::DurationError,
    },

    /// Ingress-rule override entry is missing the `=` separator
    #[error("malformed ingress rule {entry:?} in {var}, expected port=cidr")]
    MalformedIngressRule { var: String, entry: String },

    /// The field behind this variable has no environment parser.
    /// This is a closed list, not an extensible mechanism.
    #[error("{var} cannot be set from the environment")]
    UnsupportedField { var: String },

    /// A backup target path already exists; backups never overwrite
    #[error("backup file already exists: {0}")]
    BackupExists(PathBuf),

    /// File read/write failure during load, sync, or backup
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to serialize or deserialize the record
    #[error("failed to parse config: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Propagated from the init-script plugin collaborator
    #[error(transparent)]
    Plugin(#[from] PluginError),
}

impl ConfigError {
    /// Create an IO error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Init-script plugin errors.
#[derive(Debug, Error)]
pub enum PluginError {
    /// Plugin name is not registered
    #[error("unknown plugin {0:?}")]
    Unknown(String),

    /// Input would break out of a double-quoted shell string
    #[error("{field} contains character {ch:?} unsafe for shell interpolation")]
    UnsafeShellInput { field: &'static str, ch: char },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            ConfigError::EmptyRegion.to_string(),
            "aws-region cannot be empty"
        );
        assert_eq!(
            ConfigError::InvalidClusterSize(0).to_string(),
            "cluster-size must be at least 1, got 0"
        );
        assert_eq!(
            ConfigError::UnknownInstanceType("m5.mega".to_string()).to_string(),
            "unknown instance type \"m5.mega\""
        );
        assert_eq!(
            ConfigError::UnsupportedField {
                var: "EC2_TESTER_INSTANCES".to_string()
            }
            .to_string(),
            "EC2_TESTER_INSTANCES cannot be set from the environment"
        );
    }

    #[test]
    fn test_parse_error_includes_var_and_value() {
        let err = ConfigError::InvalidBool {
            var: "EC2_TESTER_WAIT".to_string(),
            value: "yes".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("EC2_TESTER_WAIT"));
        assert!(msg.contains("yes"));
    }

    #[test]
    fn test_io_error_includes_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = ConfigError::io("/tmp/cluster.yaml", io_err);
        assert!(err.to_string().contains("/tmp/cluster.yaml"));
    }

    #[test]
    fn test_plugin_error_display() {
        assert_eq!(
            PluginError::Unknown("install-frobnicator".to_string()).to_string(),
            "unknown plugin \"install-frobnicator\""
        );
    }
}
