//! ec2-config - Lifecycle management for EC2 test-cluster configuration
//!
//! This crate owns the declarative configuration record describing an
//! ephemeral EC2 test cluster: compute fleet, networking, credentials,
//! add-on toggles, and derived artifact paths. The record is defaultable,
//! overridable from the process environment, validated with auto-derived
//! fields, durably persisted as YAML, and backed up before anything may
//! overwrite it. Actual cloud provisioning is a consumer of this crate,
//! not part of it.
//!
//! ## Modules
//!
//! - [`config`]: the record itself plus overlay, validation, persistence
//! - [`catalog`]: static catalog of recognized instance types
//! - [`plugins`]: named init-script plugin fragments
//! - [`error`]: typed errors for every lifecycle operation
//!
//! ## Typical flow
//!
//! ```no_run
//! use ec2_config::{Config, DEFAULT_ENV_PREFIX};
//!
//! # fn main() -> Result<(), ec2_config::ConfigError> {
//! let mut cfg = Config::new();
//! cfg.update_from_env(DEFAULT_ENV_PREFIX)?;
//! cfg.validate_and_set_defaults()?;
//! cfg.sync()?;
//! let backup = cfg.backup_config()?;
//! println!("saved {} (backup {})", cfg.config_path.display(), backup.display());
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod plugins;

pub use config::{
    env_var_name, BlockDeviceMapping, Config, Ebs, Instance, InstanceState, Ownership, Placement,
    SecurityGroup, DEFAULT_ENV_PREFIX,
};
pub use error::{ConfigError, PluginError};
