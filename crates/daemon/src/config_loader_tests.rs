// SPDX-License-Identifier: MIT

use super::*;
use serial_test::serial;
use tempfile::tempdir;

fn clear_env() {
    std::env::remove_var("LOOM_ROOT");
    std::env::remove_var("LOOM_LOG");
}

#[test]
#[serial]
fn missing_config_file_falls_back_to_defaults_rooted_at_the_given_path() {
    clear_env();
    let dir = tempdir().unwrap();
    let config = load(dir.path()).unwrap();
    assert_eq!(config.system.root, dir.path());
    assert_eq!(config.watcher.debounce_ms, 500);
}

#[test]
#[serial]
fn reads_watcher_tuning_from_the_config_file() {
    clear_env();
    let dir = tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join(".loom")).unwrap();
    std::fs::write(
        dir.path().join(".loom/config.toml"),
        "[watcher]\ndebounce_ms = 50\nstability_check = false\n",
    )
    .unwrap();

    let config = load(dir.path()).unwrap();
    assert_eq!(config.watcher.debounce_ms, 50);
    assert!(!config.watcher.stability_check);
}

#[test]
#[serial]
fn loom_root_env_var_overrides_the_given_path() {
    clear_env();
    let dir = tempdir().unwrap();
    let other = tempdir().unwrap();
    std::env::set_var("LOOM_ROOT", other.path());

    let config = load(dir.path()).unwrap();
    assert_eq!(config.system.root, other.path());
    clear_env();
}

#[test]
#[serial]
fn loom_log_env_var_overrides_the_config_file_log_level() {
    clear_env();
    let dir = tempdir().unwrap();
    std::env::set_var("LOOM_LOG", "trace");

    let config = load(dir.path()).unwrap();
    assert_eq!(config.system.log_level, "trace");
    clear_env();
}

#[test]
#[serial]
fn malformed_config_file_is_a_parse_error() {
    clear_env();
    let dir = tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join(".loom")).unwrap();
    std::fs::write(dir.path().join(".loom/config.toml"), "not = [valid\n").unwrap();

    assert!(matches!(load(dir.path()), Err(ConfigLoadError::Parse(_, _))));
}
