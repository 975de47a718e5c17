//! Operator-facing SSH/SCP command templates.

use std::fmt::Write;

use super::Config;

/// Render remote-access commands for every instance in the inventory.
///
/// Pure formatting; an empty inventory yields only the key-permission
/// preamble.
pub(super) fn ssh_commands(cfg: &Config) -> String {
    let key_path = cfg.key_path.display();
    let mut s = format!(
        "\n# change SSH key permission\nchmod 400 {key_path}\n"
    );

    for instance in cfg.instances.values() {
        let user = &cfg.user_name;
        let host = &instance.public_dns_name;
        let _ = write!(
            s,
            r#"# ssh into the machine
ssh -o "StrictHostKeyChecking no" -i {key_path} {user}@{host}
# download to local machine
scp -i {key_path} {user}@{host}:REMOTE_FILE_PATH LOCAL_FILE_PATH
# upload to remote machine
scp -i {key_path} LOCAL_FILE_PATH {user}@{host}:REMOTE_FILE_PATH

"#
        );
    }

    s.push('\n');
    s
}
