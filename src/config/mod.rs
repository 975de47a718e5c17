//! The test-cluster configuration record.
//!
//! A [`Config`] is the single source of truth for one ephemeral EC2 test
//! cluster: compute fleet, networking, credentials, add-on toggles, and
//! the derived artifact paths every provisioning step consumes. It is
//! created fresh from [`Config::new`] or loaded from YAML, overlaid with
//! environment overrides, validated (with defaulting side effects), and
//! persisted back out.
//!
//! ## Submodules
//!
//! - `env`: environment-variable overlay engine
//! - `validate`: validator & defaulter (name, path, script derivation)
//! - `persist`: load / sync / backup
//! - `ssh`: derived SSH command generator

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConfigError;

mod duration;
mod env;
mod persist;
mod ssh;
mod validate;

pub use env::env_var_name;

/// Default prefix for environment-variable overrides.
pub const DEFAULT_ENV_PREFIX: &str = "EC2_TESTER_";

/// Treat an explicit YAML `null` (a bare `key:` in a hand-edited file)
/// like an absent key.
fn null_to_default<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: Default + Deserialize<'de>,
    D: Deserializer<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Teardown responsibility for a shared cloud resource.
///
/// Only a lifecycle that actually created the resource may claim
/// ownership; teardown deletes owned resources and leaves the rest alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Ownership {
    /// The resource pre-existed; some other party tears it down.
    #[default]
    Unowned,
    /// This lifecycle created the resource and must tear it down.
    CreatedByThisLifecycle,
}

impl Ownership {
    /// True if this lifecycle is responsible for teardown.
    pub fn is_owned(self) -> bool {
        matches!(self, Ownership::CreatedByThisLifecycle)
    }
}

/// Declarative record of one test cluster's desired and observed state.
///
/// Field names serialize in kebab-case; the same names, upper-snake-cased
/// and prefixed, form the environment-override variable names (see
/// [`env_var_name`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// AWS account ID.
    #[serde(default)]
    pub aws_account_id: String,
    /// AWS region.
    #[serde(default)]
    pub aws_region: String,

    /// True to enable debug-level logging.
    #[serde(default)]
    pub log_debug: bool,
    /// Log output sinks: 'stderr', 'stdout', or file paths.
    /// The generated per-cluster log file path is appended automatically.
    #[serde(default, deserialize_with = "null_to_default")]
    pub log_outputs: Vec<String>,
    /// Local path of the primary log file mirrored to remote storage.
    /// Derived from the cluster name; leave empty.
    #[serde(default)]
    pub log_output_to_upload_path: PathBuf,
    #[serde(default)]
    pub log_output_to_upload_path_bucket: String,
    #[serde(default)]
    pub log_output_to_upload_path_url: String,
    /// True to mirror log and state files to remote storage.
    #[serde(default)]
    pub upload_tester_logs: bool,
    /// Days until mirrored objects expire. 0 keeps them forever.
    #[serde(default)]
    pub upload_bucket_expire_days: u32,

    /// Date-stamped prefix used to build the cluster name.
    #[serde(default)]
    pub tag: String,
    /// Unique cluster name; immutable once generated.
    #[serde(default)]
    pub cluster_name: String,

    /// Sleep before teardown begins.
    #[serde(default, with = "duration")]
    pub wait_before_down: Duration,
    /// True to tear the cluster down automatically when the test ends.
    #[serde(default)]
    pub down: bool,

    /// Path of this record's own serialized file. Derived if empty.
    #[serde(default)]
    pub config_path: PathBuf,
    #[serde(default)]
    pub config_path_bucket: String,
    #[serde(default)]
    pub config_path_url: String,
    /// Stamped by `sync`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,

    /// Machine image (AMI) ID.
    #[serde(default)]
    pub image_id: String,
    /// Login user for init scripts and SSH access.
    #[serde(default)]
    pub user_name: String,
    /// Ordered init-script plugins (see [`crate::plugins`]).
    #[serde(default, deserialize_with = "null_to_default")]
    pub plugins: Vec<String>,
    /// Generated init script. Configure plain text only; encoding for the
    /// user-data field is the provisioner's job.
    #[serde(default)]
    pub init_script: String,
    /// Set once the init script has been generated, so re-validation does
    /// not re-derive or duplicate it.
    #[serde(default)]
    pub init_script_created: bool,

    /// EC2 instance type; must exist in the catalog.
    #[serde(default)]
    pub instance_type: String,
    /// Number of instances to create.
    #[serde(default)]
    pub cluster_size: u32,

    /// Key-pair name. Defaults to the cluster name.
    #[serde(default)]
    pub key_name: String,
    /// Private-key file path. Derived if empty.
    #[serde(default)]
    pub key_path: PathBuf,
    #[serde(default)]
    pub key_path_bucket: String,
    #[serde(default)]
    pub key_path_url: String,
    /// True to skip key-pair creation entirely.
    #[serde(default)]
    pub key_create_skip: bool,
    /// Whether this lifecycle created the key pair.
    #[serde(default)]
    pub key_created: Ownership,

    /// VPC CIDR block.
    #[serde(default)]
    pub vpc_cidr: String,
    /// VPC ID to reuse. Leave empty to create one.
    #[serde(default)]
    pub vpc_id: String,
    /// Whether this lifecycle created the VPC.
    #[serde(default)]
    pub vpc_created: Ownership,
    /// Internet gateway ID.
    #[serde(default)]
    pub internet_gateway_id: String,
    /// Route table IDs.
    #[serde(default, deserialize_with = "null_to_default")]
    pub route_table_ids: Vec<String>,

    /// Subnet IDs to use. Fetched from the VPC if empty.
    #[serde(default, deserialize_with = "null_to_default")]
    pub subnet_ids: Vec<String>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub subnet_id_to_availability_zone: BTreeMap<String, String>,

    /// TCP port range to allowed CIDR, applied via security groups.
    #[serde(default, deserialize_with = "null_to_default")]
    pub ingress_rules_tcp: BTreeMap<String, String>,

    /// Security group IDs. Leave empty to create one.
    #[serde(default, deserialize_with = "null_to_default")]
    pub security_group_ids: Vec<String>,

    /// True to associate a public IP address with each instance.
    #[serde(default)]
    pub associate_public_ip_address: bool,

    /// Instances created from this configuration, keyed by instance ID.
    /// Always a valid mapping after load, possibly empty.
    #[serde(default, deserialize_with = "null_to_default")]
    pub instances: BTreeMap<String, Instance>,

    /// True to wait until all instances are ready.
    #[serde(default)]
    pub wait: bool,

    /// IAM instance profile with permissions to manage the fleet.
    #[serde(default)]
    pub instance_profile_name: String,

    /// Executed at the end of the generated init script.
    #[serde(default)]
    pub custom_script: String,
}

/// Observed attributes of one EC2 instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Instance {
    pub image_id: String,
    pub instance_id: String,
    pub instance_type: String,
    pub key_name: String,
    pub placement: Placement,
    pub private_dns_name: String,
    pub private_ip: String,
    pub public_dns_name: String,
    pub public_ip: String,
    pub state: InstanceState,
    pub subnet_id: String,
    pub vpc_id: String,
    pub block_device_mappings: Vec<BlockDeviceMapping>,
    pub ebs_optimized: bool,
    pub root_device_name: String,
    pub root_device_type: String,
    pub security_groups: Vec<SecurityGroup>,
    pub launch_time: Option<DateTime<Utc>>,
}

/// EC2 placement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Placement {
    pub availability_zone: String,
    pub tenancy: String,
}

/// Instance lifecycle state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct InstanceState {
    pub code: i64,
    pub name: String,
}

/// Block device mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct BlockDeviceMapping {
    pub device_name: String,
    pub ebs: Ebs,
}

/// EBS volume attachment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Ebs {
    pub delete_on_termination: bool,
    pub status: String,
    pub volume_id: String,
}

/// Attached security group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SecurityGroup {
    pub group_name: String,
    pub group_id: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Return a fresh baseline configuration.
    ///
    /// Every call allocates its own copy; mutating one record never
    /// affects another obtained from this factory.
    pub fn new() -> Self {
        Self {
            aws_account_id: String::new(),
            aws_region: "us-west-2".to_string(),

            log_debug: false,
            log_outputs: vec!["stderr".to_string()],
            log_output_to_upload_path: PathBuf::new(),
            log_output_to_upload_path_bucket: String::new(),
            log_output_to_upload_path_url: String::new(),
            upload_tester_logs: false,
            upload_bucket_expire_days: 2,

            tag: String::new(),
            cluster_name: String::new(),

            wait_before_down: Duration::from_secs(60),
            down: true,

            config_path: PathBuf::new(),
            config_path_bucket: String::new(),
            config_path_url: String::new(),
            updated_at: None,

            // Amazon Linux 2 AMI (HVM), SSD volume type
            image_id: "ami-032509850cf9ee54e".to_string(),
            user_name: "ec2-user".to_string(),
            plugins: vec![
                "update-amazon-linux-2".to_string(),
                "install-start-docker-amazon-linux-2".to_string(),
            ],
            init_script: String::new(),
            init_script_created: false,

            // 2 vCPU, 8 GB RAM
            instance_type: "m5.large".to_string(),
            cluster_size: 1,

            key_name: String::new(),
            key_path: PathBuf::new(),
            key_path_bucket: String::new(),
            key_path_url: String::new(),
            key_create_skip: false,
            key_created: Ownership::Unowned,

            vpc_cidr: "192.168.0.0/16".to_string(),
            vpc_id: String::new(),
            vpc_created: Ownership::Unowned,
            internet_gateway_id: String::new(),
            route_table_ids: Vec::new(),

            subnet_ids: Vec::new(),
            subnet_id_to_availability_zone: BTreeMap::new(),

            ingress_rules_tcp: BTreeMap::from([("22".to_string(), "0.0.0.0/0".to_string())]),

            security_group_ids: Vec::new(),

            associate_public_ip_address: true,

            instances: BTreeMap::new(),

            wait: true,

            instance_profile_name: String::new(),

            custom_script: String::new(),
        }
    }

    /// Overwrite fields from `<prefix><UPPER_SNAKE_CASE field key>`
    /// environment variables. Unset or empty variables leave the field
    /// untouched; a parse failure leaves the whole record unchanged.
    pub fn update_from_env(&mut self, env_prefix: &str) -> Result<(), ConfigError> {
        env::update_from_env(self, env_prefix)
    }

    /// Check required fields and fill in derived-but-unset ones.
    ///
    /// Idempotent: the cluster name is generated only while empty and the
    /// init script only while its created-flag is unset. On error the
    /// record is left untouched.
    pub fn validate_and_set_defaults(&mut self) -> Result<(), ConfigError> {
        validate::validate_and_set_defaults(self)
    }

    /// Load a record from the YAML file at `path`.
    ///
    /// Does not set defaults; call [`Config::validate_and_set_defaults`]
    /// separately so a reloaded record is not silently rewritten.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        persist::load(path.as_ref())
    }

    /// Persist the record to its own `config_path`, stamping
    /// `updated_at`. This is the sole write path for the authoritative
    /// copy.
    pub fn sync(&mut self) -> Result<(), ConfigError> {
        persist::sync(self)
    }

    /// Copy the currently persisted bytes to a fresh
    /// `<config-path>.<hex-nanos>.backup.yaml` file and return its path.
    /// Never overwrites an existing backup.
    pub fn backup_config(&self) -> Result<PathBuf, ConfigError> {
        persist::backup_config(self)
    }

    /// Render operator-facing SSH/SCP command templates for every
    /// instance in the inventory.
    pub fn ssh_commands(&self) -> String {
        ssh::ssh_commands(self)
    }
}
