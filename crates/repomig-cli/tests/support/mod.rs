use std::fs;
use std::path::Path;

use assert_cmd::Command;

pub fn new_command_with_temp_home() -> (Command, tempfile::TempDir) {
    let temp_home = tempfile::tempdir().expect("temp home");
    let binary = assert_cmd::cargo::cargo_bin!("repomig");
    let mut command = Command::new(binary);
    command.env("HOME", temp_home.path());
    command.env("XDG_CONFIG_HOME", temp_home.path().join(".config"));
    (command, temp_home)
}

#[allow(dead_code)]
pub fn write_valid_config(home: &Path, endpoint: &str) {
    let config_dir = home.join(".config").join("repomig");
    fs::create_dir_all(&config_dir).expect("create config dir");
    fs::write(
        config_dir.join("config.toml"),
        format!(
            r#"
version = 1

[remote]
endpoint = "{endpoint}"

[poll]
interval_ms = 250
"#
        ),
    )
    .expect("write config");
}
