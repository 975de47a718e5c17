//! Environment-variable overlay engine.
//!
//! A static table maps every serialized field of [`Config`] to a typed
//! setter. The overlay walks the table exactly once, so the set of
//! overridable fields (and the set of parseable kinds) is a closed list:
//! a variable targeting a field without a parser is an error, not a
//! silent no-op.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use super::{Config, Ownership};
use crate::error::ConfigError;

/// Compute the override variable name for an external field key:
/// hyphens become underscores, the result is upper-cased and prefixed.
///
/// This naming contract is part of the crate's interface; scripted
/// callers rely on it.
pub fn env_var_name(prefix: &str, key: &str) -> String {
    format!("{prefix}{}", key.replace('-', "_").to_ascii_uppercase())
}

/// Typed setter for one field. The variants are the complete set of
/// value shapes the overlay knows how to parse.
enum Setter {
    Str(fn(&mut Config, String)),
    Path(fn(&mut Config, PathBuf)),
    Bool(fn(&mut Config, bool)),
    /// Boolean literal mapped onto the ownership enum.
    Owned(fn(&mut Config, Ownership)),
    U32(fn(&mut Config, u32)),
    Dur(fn(&mut Config, Duration)),
    /// Comma-separated list, order preserved.
    List(fn(&mut Config, Vec<String>)),
    /// Comma-separated `key=value` pairs, split on the first `=`.
    RuleMap(fn(&mut Config, BTreeMap<String, String>)),
    /// Field exists in the record but cannot be set from the
    /// environment.
    Unsupported,
}

struct EnvField {
    key: &'static str,
    setter: Setter,
}

/// One entry per serialized field of [`Config`], in declaration order.
static FIELDS: &[EnvField] = &[
    EnvField {
        key: "aws-account-id",
        setter: Setter::Str(|c, v| c.aws_account_id = v),
    },
    EnvField {
        key: "aws-region",
        setter: Setter::Str(|c, v| c.aws_region = v),
    },
    EnvField {
        key: "log-debug",
        setter: Setter::Bool(|c, v| c.log_debug = v),
    },
    EnvField {
        key: "log-outputs",
        setter: Setter::Unsupported,
    },
    EnvField {
        key: "log-output-to-upload-path",
        setter: Setter::Path(|c, v| c.log_output_to_upload_path = v),
    },
    EnvField {
        key: "log-output-to-upload-path-bucket",
        setter: Setter::Str(|c, v| c.log_output_to_upload_path_bucket = v),
    },
    EnvField {
        key: "log-output-to-upload-path-url",
        setter: Setter::Str(|c, v| c.log_output_to_upload_path_url = v),
    },
    EnvField {
        key: "upload-tester-logs",
        setter: Setter::Bool(|c, v| c.upload_tester_logs = v),
    },
    EnvField {
        key: "upload-bucket-expire-days",
        setter: Setter::U32(|c, v| c.upload_bucket_expire_days = v),
    },
    EnvField {
        key: "tag",
        setter: Setter::Str(|c, v| c.tag = v),
    },
    EnvField {
        key: "cluster-name",
        setter: Setter::Str(|c, v| c.cluster_name = v),
    },
    EnvField {
        key: "wait-before-down",
        setter: Setter::Dur(|c, v| c.wait_before_down = v),
    },
    EnvField {
        key: "down",
        setter: Setter::Bool(|c, v| c.down = v),
    },
    EnvField {
        key: "config-path",
        setter: Setter::Path(|c, v| c.config_path = v),
    },
    EnvField {
        key: "config-path-bucket",
        setter: Setter::Str(|c, v| c.config_path_bucket = v),
    },
    EnvField {
        key: "config-path-url",
        setter: Setter::Str(|c, v| c.config_path_url = v),
    },
    EnvField {
        key: "updated-at",
        setter: Setter::Unsupported,
    },
    EnvField {
        key: "image-id",
        setter: Setter::Str(|c, v| c.image_id = v),
    },
    EnvField {
        key: "user-name",
        setter: Setter::Str(|c, v| c.user_name = v),
    },
    EnvField {
        key: "plugins",
        setter: Setter::List(|c, v| c.plugins = v),
    },
    EnvField {
        key: "init-script",
        setter: Setter::Str(|c, v| c.init_script = v),
    },
    EnvField {
        key: "init-script-created",
        setter: Setter::Bool(|c, v| c.init_script_created = v),
    },
    EnvField {
        key: "instance-type",
        setter: Setter::Str(|c, v| c.instance_type = v),
    },
    EnvField {
        key: "cluster-size",
        setter: Setter::U32(|c, v| c.cluster_size = v),
    },
    EnvField {
        key: "key-name",
        setter: Setter::Str(|c, v| c.key_name = v),
    },
    EnvField {
        key: "key-path",
        setter: Setter::Path(|c, v| c.key_path = v),
    },
    EnvField {
        key: "key-path-bucket",
        setter: Setter::Str(|c, v| c.key_path_bucket = v),
    },
    EnvField {
        key: "key-path-url",
        setter: Setter::Str(|c, v| c.key_path_url = v),
    },
    EnvField {
        key: "key-create-skip",
        setter: Setter::Bool(|c, v| c.key_create_skip = v),
    },
    EnvField {
        key: "key-created",
        setter: Setter::Owned(|c, v| c.key_created = v),
    },
    EnvField {
        key: "vpc-cidr",
        setter: Setter::Str(|c, v| c.vpc_cidr = v),
    },
    EnvField {
        key: "vpc-id",
        setter: Setter::Str(|c, v| c.vpc_id = v),
    },
    EnvField {
        key: "vpc-created",
        setter: Setter::Owned(|c, v| c.vpc_created = v),
    },
    EnvField {
        key: "internet-gateway-id",
        setter: Setter::Str(|c, v| c.internet_gateway_id = v),
    },
    EnvField {
        key: "route-table-ids",
        setter: Setter::Unsupported,
    },
    EnvField {
        key: "subnet-ids",
        setter: Setter::List(|c, v| c.subnet_ids = v),
    },
    EnvField {
        key: "subnet-id-to-availability-zone",
        setter: Setter::Unsupported,
    },
    EnvField {
        key: "ingress-rules-tcp",
        setter: Setter::RuleMap(|c, v| c.ingress_rules_tcp = v),
    },
    EnvField {
        key: "security-group-ids",
        setter: Setter::List(|c, v| c.security_group_ids = v),
    },
    EnvField {
        key: "associate-public-ip-address",
        setter: Setter::Bool(|c, v| c.associate_public_ip_address = v),
    },
    EnvField {
        key: "instances",
        setter: Setter::Unsupported,
    },
    EnvField {
        key: "wait",
        setter: Setter::Bool(|c, v| c.wait = v),
    },
    EnvField {
        key: "instance-profile-name",
        setter: Setter::Str(|c, v| c.instance_profile_name = v),
    },
    EnvField {
        key: "custom-script",
        setter: Setter::Str(|c, v| c.custom_script = v),
    },
];

/// Parse the boolean-literal family: 1/t/true and 0/f/false, any case.
fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

fn parse_rule_map(var: &str, raw: &str) -> Result<BTreeMap<String, String>, ConfigError> {
    let mut rules = BTreeMap::new();
    for entry in raw.split(',') {
        let (port, cidr) = entry
            .split_once('=')
            .ok_or_else(|| ConfigError::MalformedIngressRule {
                var: var.to_string(),
                entry: entry.to_string(),
            })?;
        rules.insert(port.to_string(), cidr.to_string());
    }
    Ok(rules)
}

/// Apply environment overrides to `cfg`.
///
/// Mutations happen on a scratch copy committed only when every set
/// variable parsed; a failure leaves `cfg` untouched.
pub(super) fn update_from_env(cfg: &mut Config, prefix: &str) -> Result<(), ConfigError> {
    let mut next = cfg.clone();

    for field in FIELDS {
        let var = env_var_name(prefix, field.key);
        let raw = match std::env::var(&var) {
            Ok(v) if !v.is_empty() => v,
            _ => continue, // absence is not an error
        };

        match field.setter {
            Setter::Str(set) => set(&mut next, raw),
            Setter::Path(set) => set(&mut next, PathBuf::from(raw)),
            Setter::Bool(set) => {
                let parsed = parse_bool(&raw).ok_or(ConfigError::InvalidBool {
                    var,
                    value: raw.clone(),
                })?;
                set(&mut next, parsed);
            }
            Setter::Owned(set) => {
                let parsed = parse_bool(&raw).ok_or(ConfigError::InvalidBool {
                    var,
                    value: raw.clone(),
                })?;
                let ownership = if parsed {
                    Ownership::CreatedByThisLifecycle
                } else {
                    Ownership::Unowned
                };
                set(&mut next, ownership);
            }
            Setter::U32(set) => {
                let parsed = raw.parse::<u32>().map_err(|source| ConfigError::InvalidInt {
                    var,
                    value: raw.clone(),
                    source,
                })?;
                set(&mut next, parsed);
            }
            Setter::Dur(set) => {
                let parsed =
                    humantime::parse_duration(&raw).map_err(|source| ConfigError::InvalidDuration {
                        var,
                        value: raw.clone(),
                        source,
                    })?;
                set(&mut next, parsed);
            }
            Setter::List(set) => {
                set(&mut next, raw.split(',').map(str::to_string).collect());
            }
            Setter::RuleMap(set) => {
                set(&mut next, parse_rule_map(&var, &raw)?);
            }
            Setter::Unsupported => {
                return Err(ConfigError::UnsupportedField { var });
            }
        }
    }

    *cfg = next;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_name_contract() {
        assert_eq!(
            env_var_name("EC2_TESTER_", "ingress-rules-tcp"),
            "EC2_TESTER_INGRESS_RULES_TCP"
        );
        assert_eq!(env_var_name("EC2_TESTER_", "wait"), "EC2_TESTER_WAIT");
        assert_eq!(env_var_name("X_", "aws-region"), "X_AWS_REGION");
    }

    #[test]
    fn test_parse_bool_family() {
        for raw in ["1", "t", "T", "true", "TRUE", "True"] {
            assert_eq!(parse_bool(raw), Some(true), "{raw}");
        }
        for raw in ["0", "f", "F", "false", "FALSE", "False"] {
            assert_eq!(parse_bool(raw), Some(false), "{raw}");
        }
        for raw in ["yes", "no", "tRuE", "2", ""] {
            assert_eq!(parse_bool(raw), None, "{raw}");
        }
    }

    #[test]
    fn test_parse_rule_map() {
        let rules = parse_rule_map("VAR", "22=0.0.0.0/0,1024-32768=192.168.0.0/16").unwrap();
        assert_eq!(rules.get("22").map(String::as_str), Some("0.0.0.0/0"));
        assert_eq!(
            rules.get("1024-32768").map(String::as_str),
            Some("192.168.0.0/16")
        );
    }

    #[test]
    fn test_parse_rule_map_splits_on_first_equals() {
        let rules = parse_rule_map("VAR", "22=a=b").unwrap();
        assert_eq!(rules.get("22").map(String::as_str), Some("a=b"));
    }

    #[test]
    fn test_parse_rule_map_malformed_entry() {
        let err = parse_rule_map("VAR", "22").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MalformedIngressRule { ref entry, .. } if entry == "22"
        ));
    }

    #[test]
    fn test_table_covers_every_serialized_field_exactly_once() {
        // The overlay must be total over the record's external keys.
        let value = serde_yaml::to_value(Config::new()).unwrap();
        let mapping = value.as_mapping().unwrap();

        let mut table_keys: Vec<&str> = FIELDS.iter().map(|f| f.key).collect();
        let before = table_keys.len();
        table_keys.sort_unstable();
        table_keys.dedup();
        assert_eq!(table_keys.len(), before, "duplicate table entries");

        for key in mapping.keys() {
            let key = key.as_str().unwrap();
            assert!(
                table_keys.binary_search(&key).is_ok(),
                "field {key} missing from the overlay table"
            );
        }
        // updated-at is skipped during serialization of a fresh record
        // but still has a (rejecting) table entry.
        assert_eq!(mapping.len() + 1, before);
    }
}
