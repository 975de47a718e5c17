//! Validator & defaulter for the configuration record.
//!
//! Checks required fields, generates the cluster identity, derives file
//! paths and remote-mirror keys, and composes the init script — each at
//! most once per record lifetime, so the pass is idempotent.

use std::path::PathBuf;

use chrono::{Datelike, Utc};
use rand::Rng;
use tracing::info;

use super::Config;
use crate::catalog;
use crate::error::ConfigError;
use crate::plugins;

/// Date-stamped prefix for generated cluster names.
const TAG_PREFIX: &str = "a8-ec2";

/// Remote object names, keyed under `<cluster-name>/`.
const CONFIG_OBJECT_NAME: &str = "a8-ec2config.yaml";
const LOG_OBJECT_NAME: &str = "a8-ec2.log";
const KEY_OBJECT_NAME: &str = "a8-ec2.key";

const SUFFIX_LEN: usize = 7;
const SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generate the date tag for today (UTC): `a8-ec2-YYMMDD`.
fn gen_tag(now: chrono::DateTime<Utc>) -> String {
    format!(
        "{TAG_PREFIX}-{:02}{:02}{:02}",
        now.year() - 2000,
        now.month(),
        now.day()
    )
}

/// Random lowercase-alphanumeric suffix from a single generator
/// instance. Reseeding per character would correlate output under fast
/// repeated calls.
fn rand_suffix(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
        .collect()
}

/// Allocate a fresh absolute temp-file path without keeping the file.
fn temp_path(prefix: &str) -> Result<PathBuf, ConfigError> {
    let file = tempfile::Builder::new()
        .prefix(prefix)
        .tempfile()
        .map_err(|e| ConfigError::io(std::env::temp_dir(), e))?;
    let path = file.path().to_path_buf();
    // only the path is wanted; drop the placeholder file
    file.close().map_err(|e| ConfigError::io(path.clone(), e))?;
    Ok(path)
}

pub(super) fn validate_and_set_defaults(cfg: &mut Config) -> Result<(), ConfigError> {
    // Work on a scratch copy so a failing step (notably the catalog
    // check, which runs last) leaves the record untouched.
    let mut c = cfg.clone();

    if c.log_outputs.is_empty() {
        return Err(ConfigError::EmptyLogOutputs);
    }
    if c.aws_region.is_empty() {
        return Err(ConfigError::EmptyRegion);
    }
    if c.user_name.is_empty() {
        return Err(ConfigError::EmptyUserName);
    }
    if c.image_id.is_empty() {
        return Err(ConfigError::EmptyImageId);
    }

    if !c.plugins.is_empty() && !c.init_script_created {
        let generated = plugins::create(&c.user_name, &c.custom_script, &c.plugins)?;
        // operator-supplied script text survives, after the generated part
        let previous = std::mem::take(&mut c.init_script);
        c.init_script = format!("{generated}\n{previous}");
        c.init_script_created = true;
    }

    if c.instance_type.is_empty() {
        return Err(ConfigError::EmptyInstanceType);
    }
    if c.cluster_size < 1 {
        return Err(ConfigError::InvalidClusterSize(c.cluster_size));
    }

    if c.cluster_name.is_empty() {
        c.tag = gen_tag(Utc::now());
        c.cluster_name = format!("{}-{}", c.tag, rand_suffix(SUFFIX_LEN));
        info!(cluster_name = %c.cluster_name, "generated cluster name");
    }

    if c.config_path.as_os_str().is_empty() {
        c.config_path = temp_path("a8-ec2config")?;
    } else if !c.config_path.is_absolute() {
        c.config_path = super::persist::absolute(&c.config_path)?;
    }
    c.config_path_bucket = format!("{}/{}", c.cluster_name, CONFIG_OBJECT_NAME);

    c.log_output_to_upload_path =
        std::env::temp_dir().join(format!("{}.log", c.cluster_name));
    let log_path = c.log_output_to_upload_path.display().to_string();
    if !c.log_outputs.iter().any(|out| *out == log_path) {
        // auto-insert the generated log file into the sink list
        c.log_outputs.push(log_path);
    }
    c.log_output_to_upload_path_bucket = format!("{}/{}", c.cluster_name, LOG_OBJECT_NAME);

    if c.key_name.is_empty() {
        c.key_name = c.cluster_name.clone();
    }
    c.key_path_bucket = format!("{}/{}", c.cluster_name, KEY_OBJECT_NAME);
    if c.key_path.as_os_str().is_empty() {
        c.key_path = temp_path("a8-ec2.key")?;
    } else if !c.key_path.is_absolute() {
        c.key_path = super::persist::absolute(&c.key_path)?;
    }

    if !catalog::is_valid_instance_type(&c.instance_type) {
        return Err(ConfigError::UnknownInstanceType(c.instance_type));
    }

    *cfg = c;
    Ok(())
}
