//! Integration tests for environment-variable overrides.
//!
//! The process environment is global: every test uses its own unique
//! variable prefix and removes what it set, and all environment access
//! goes through one lock because setenv is not thread-safe against
//! concurrent getenv, even for disjoint variable names.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Result;
use ec2_config::{env_var_name, Config, ConfigError, Ownership};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Set prefixed variables, run the overlay, then clean up.
/// Holds [`ENV_LOCK`] for the whole call, reads included.
fn with_env<T>(
    prefix: &str,
    vars: &[(&str, &str)],
    f: impl FnOnce() -> T,
) -> T {
    let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    for (key, value) in vars {
        std::env::set_var(env_var_name(prefix, key), value);
    }
    let out = f();
    for (key, _) in vars {
        std::env::remove_var(env_var_name(prefix, key));
    }
    out
}

#[test]
fn test_overlay_noop_without_vars() -> Result<()> {
    with_env("ENV_OVERLAY_NOOP_", &[], || -> Result<()> {
        let mut cfg = Config::new();
        let before = cfg.clone();
        cfg.update_from_env("ENV_OVERLAY_NOOP_")?;
        assert_eq!(cfg, before);
        Ok(())
    })
}

#[test]
fn test_overlay_sets_every_supported_kind() -> Result<()> {
    let prefix = "ENV_OVERLAY_KINDS_";
    let vars = [
        ("aws-region", "eu-central-1"),
        ("cluster-size", "3"),
        ("down", "false"),
        ("wait", "1"),
        ("wait-before-down", "1m30s"),
        ("config-path", "/tmp/override.yaml"),
        ("plugins", "update-ubuntu,install-start-docker-ubuntu"),
        ("subnet-ids", "subnet-a,subnet-b"),
        ("security-group-ids", "sg-0123"),
        ("ingress-rules-tcp", "22=0.0.0.0/0,80=10.0.0.0/8"),
        ("key-created", "true"),
        ("vpc-created", "false"),
    ];

    with_env(prefix, &vars, || -> Result<()> {
        let mut cfg = Config::new();
        cfg.update_from_env(prefix)?;

        assert_eq!(cfg.aws_region, "eu-central-1");
        assert_eq!(cfg.cluster_size, 3);
        assert!(!cfg.down);
        assert!(cfg.wait);
        assert_eq!(cfg.wait_before_down, Duration::from_secs(90));
        assert_eq!(cfg.config_path, PathBuf::from("/tmp/override.yaml"));
        assert_eq!(
            cfg.plugins,
            vec![
                "update-ubuntu".to_string(),
                "install-start-docker-ubuntu".to_string()
            ]
        );
        assert_eq!(
            cfg.subnet_ids,
            vec!["subnet-a".to_string(), "subnet-b".to_string()]
        );
        assert_eq!(cfg.security_group_ids, vec!["sg-0123".to_string()]);
        assert_eq!(
            cfg.ingress_rules_tcp,
            BTreeMap::from([
                ("22".to_string(), "0.0.0.0/0".to_string()),
                ("80".to_string(), "10.0.0.0/8".to_string()),
            ])
        );
        assert_eq!(cfg.key_created, Ownership::CreatedByThisLifecycle);
        assert_eq!(cfg.vpc_created, Ownership::Unowned);
        Ok(())
    })
}

#[test]
fn test_overlay_is_idempotent() -> Result<()> {
    let prefix = "ENV_OVERLAY_IDEM_";
    let vars = [
        ("aws-region", "ap-northeast-2"),
        ("plugins", "update-ubuntu"),
    ];

    with_env(prefix, &vars, || -> Result<()> {
        let mut once = Config::new();
        once.update_from_env(prefix)?;

        let mut twice = Config::new();
        twice.update_from_env(prefix)?;
        twice.update_from_env(prefix)?;

        assert_eq!(once, twice);
        Ok(())
    })
}

#[test]
fn test_overlay_empty_value_leaves_field_untouched() -> Result<()> {
    let prefix = "ENV_OVERLAY_EMPTY_";
    with_env(prefix, &[("aws-region", "")], || -> Result<()> {
        let mut cfg = Config::new();
        cfg.update_from_env(prefix)?;
        assert_eq!(cfg.aws_region, "us-west-2");
        Ok(())
    })
}

#[test]
fn test_overlay_invalid_bool_names_var_and_value() {
    let prefix = "ENV_OVERLAY_BADBOOL_";
    with_env(prefix, &[("wait", "yes")], || {
        let mut cfg = Config::new();
        let err = cfg.update_from_env(prefix).unwrap_err();
        let msg = err.to_string();
        assert!(matches!(err, ConfigError::InvalidBool { .. }));
        assert!(msg.contains("ENV_OVERLAY_BADBOOL_WAIT"));
        assert!(msg.contains("yes"));
    })
}

#[test]
fn test_overlay_invalid_int() {
    let prefix = "ENV_OVERLAY_BADINT_";
    with_env(prefix, &[("cluster-size", "many")], || {
        let mut cfg = Config::new();
        assert!(matches!(
            cfg.update_from_env(prefix),
            Err(ConfigError::InvalidInt { .. })
        ));
    })
}

#[test]
fn test_overlay_invalid_duration() {
    let prefix = "ENV_OVERLAY_BADDUR_";
    with_env(prefix, &[("wait-before-down", "eventually")], || {
        let mut cfg = Config::new();
        assert!(matches!(
            cfg.update_from_env(prefix),
            Err(ConfigError::InvalidDuration { .. })
        ));
    })
}

#[test]
fn test_overlay_malformed_ingress_rule() {
    let prefix = "ENV_OVERLAY_BADRULE_";
    with_env(prefix, &[("ingress-rules-tcp", "22")], || {
        let mut cfg = Config::new();
        assert!(matches!(
            cfg.update_from_env(prefix),
            Err(ConfigError::MalformedIngressRule { .. })
        ));
    })
}

#[test]
fn test_overlay_rejects_unsupported_field() {
    let prefix = "ENV_OVERLAY_UNSUP_";
    with_env(prefix, &[("log-outputs", "stdout")], || {
        let mut cfg = Config::new();
        let err = cfg.update_from_env(prefix).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnsupportedField { ref var } if var == "ENV_OVERLAY_UNSUP_LOG_OUTPUTS"
        ));
    })
}

#[test]
fn test_overlay_failure_leaves_record_unchanged() {
    let prefix = "ENV_OVERLAY_ATOMIC_";
    let vars = [("aws-region", "eu-west-1"), ("down", "bogus")];
    with_env(prefix, &vars, || {
        let mut cfg = Config::new();
        let before = cfg.clone();
        assert!(cfg.update_from_env(prefix).is_err());
        assert_eq!(cfg, before, "partial overrides must not be applied");
    })
}
