//! Named init-script plugins.
//!
//! Each plugin contributes a bash fragment to the fleet's boot-time
//! script (the EC2 user-data field). Fragments are composed in the order
//! the configuration lists them, with any operator-supplied custom script
//! appended last.

use crate::error::PluginError;

/// Header shared by every generated init script.
const SCRIPT_HEADER: &str = "#!/usr/bin/env bash\nset -euo pipefail\n";

/// Validate that a value is safe to interpolate into a shell script.
///
/// Rejects characters that could break double-quoted bash strings or
/// enable injection (`"`, `\`, `` ` ``, `$`, newlines).
fn validate_shell_input(value: &str, field: &'static str) -> Result<(), PluginError> {
    const FORBIDDEN: &[char] = &['"', '\\', '`', '$', '\n', '\r'];
    if let Some(ch) = value.chars().find(|c| FORBIDDEN.contains(c)) {
        return Err(PluginError::UnsafeShellInput { field, ch });
    }
    Ok(())
}

/// Look up the script fragment for a plugin name.
fn fragment(name: &str, user_name: &str) -> Option<String> {
    match name {
        "update-amazon-linux-2" => Some(
            "\n# update Amazon Linux 2\nsudo yum update -y\n".to_string(),
        ),
        "install-start-docker-amazon-linux-2" => Some(format!(
            "\n# install and start Docker on Amazon Linux 2\n\
             sudo amazon-linux-extras install -y docker\n\
             sudo systemctl enable docker\n\
             sudo systemctl start docker\n\
             sudo usermod -aG docker {user_name}\n"
        )),
        "update-ubuntu" => Some(
            "\n# update Ubuntu\nsudo apt-get -y update\nsudo apt-get -y upgrade\n".to_string(),
        ),
        "install-start-docker-ubuntu" => Some(format!(
            "\n# install and start Docker on Ubuntu\n\
             sudo apt-get -y install docker.io\n\
             sudo systemctl enable docker\n\
             sudo systemctl start docker\n\
             sudo usermod -aG docker {user_name}\n"
        )),
        _ => None,
    }
}

/// Compose the init script from the named plugins.
///
/// The custom script, if any, runs after every plugin fragment.
pub fn create(
    user_name: &str,
    custom_script: &str,
    plugins: &[String],
) -> Result<String, PluginError> {
    validate_shell_input(user_name, "user-name")?;

    let mut script = String::from(SCRIPT_HEADER);
    for name in plugins {
        let body = fragment(name, user_name).ok_or_else(|| PluginError::Unknown(name.clone()))?;
        script.push_str(&body);
    }
    if !custom_script.is_empty() {
        script.push('\n');
        script.push_str(custom_script);
    }
    Ok(script)
}
