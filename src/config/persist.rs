//! Persistence and backup of the configuration record.
//!
//! The record lives in a single YAML file at its own `config-path`;
//! `sync` is the only writer of that file, and `backup_config` only ever
//! creates new, uniquely-named siblings.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Utc;
use tracing::{debug, info};

use super::Config;
use crate::error::ConfigError;

pub(super) fn absolute(path: &Path) -> Result<PathBuf, ConfigError> {
    std::path::absolute(path).map_err(|e| ConfigError::io(path, e))
}

pub(super) fn load(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading configuration");
    let raw = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
    let mut cfg: Config = serde_yaml::from_str(&raw)?;

    // support relocated files: the stored path may be stale or relative
    if !cfg.config_path.is_absolute() {
        cfg.config_path = absolute(path)?;
    }
    Ok(cfg)
}

pub(super) fn sync(cfg: &mut Config) -> Result<(), ConfigError> {
    if !cfg.config_path.is_absolute() {
        cfg.config_path = absolute(&cfg.config_path)?;
    }
    cfg.updated_at = Some(Utc::now());

    let out = serde_yaml::to_string(cfg)?;
    fs::write(&cfg.config_path, out).map_err(|e| ConfigError::io(cfg.config_path.clone(), e))?;
    debug!(path = %cfg.config_path.display(), "synced configuration");
    Ok(())
}

pub(super) fn backup_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    // back up the persisted bytes, not the in-memory state
    let data = fs::read(&cfg.config_path).map_err(|e| ConfigError::io(cfg.config_path.clone(), e))?;

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let backup = PathBuf::from(format!(
        "{}.{:X}.backup.yaml",
        cfg.config_path.display(),
        nanos
    ));

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&backup)
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                ConfigError::BackupExists(backup.clone())
            } else {
                ConfigError::io(backup.clone(), e)
            }
        })?;
    file.write_all(&data)
        .map_err(|e| ConfigError::io(backup.clone(), e))?;

    info!(path = %backup.display(), "backed up configuration");
    Ok(backup)
}
