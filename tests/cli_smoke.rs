//! Behavioural smoke tests for the CLI entrypoint.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

const CONFIG_VARS: [&str; 5] = [
    "GRIDSCALE_USER_ID",
    "GRIDSCALE_TOKEN",
    "GRIDSCALE_URL",
    "GRIDSCALE_ACCOUNT",
    "GSCLOUD_CONFIG_PATH",
];

#[test]
fn cli_without_arguments_prints_help() {
    let mut cmd = cargo_bin_cmd!("gscloud");
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage: gscloud"));
}

#[test]
fn help_lists_the_resource_commands() {
    let mut cmd = cargo_bin_cmd!("gscloud");
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("server"))
        .stdout(predicate::str::contains("ssh-key"))
        .stdout(predicate::str::contains("make-config"));
}

#[test]
fn version_reports_the_crate_version() {
    let mut cmd = cargo_bin_cmd!("gscloud");
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with(format!(
            "Version:\t{}\n",
            env!("CARGO_PKG_VERSION")
        )))
        .stdout(predicate::str::contains("Git commit:\t"));
}

#[test]
fn api_commands_without_credentials_fail_with_guidance() {
    let home = TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}"));
    let mut cmd = cargo_bin_cmd!("gscloud");
    for name in CONFIG_VARS {
        cmd.env_remove(name);
    }
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path())
        .current_dir(home.path())
        .args(["server", "ls"])
        .assert()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains("configuration error"))
        .stderr(predicate::str::contains("GRIDSCALE_USER_ID"));
}

#[test]
fn unknown_subcommands_are_rejected() {
    let mut cmd = cargo_bin_cmd!("gscloud");
    cmd.args(["server", "explode"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn make_config_refuses_to_overwrite_without_force() {
    let home = TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}"));
    let path = home.path().join("gscloud.toml");
    std::fs::write(&path, "token = \"keep\"\n").unwrap_or_else(|err| panic!("seed: {err}"));

    let mut refused = cargo_bin_cmd!("gscloud");
    refused
        .env("GSCLOUD_CONFIG_PATH", &path)
        .current_dir(home.path())
        .arg("make-config")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--force"));

    let mut forced = cargo_bin_cmd!("gscloud");
    forced
        .env("GSCLOUD_CONFIG_PATH", &path)
        .current_dir(home.path())
        .args(["make-config", "--force"])
        .assert()
        .success()
        .stderr(predicate::str::contains("Written: "));

    let written = std::fs::read_to_string(&path).unwrap_or_else(|err| panic!("read: {err}"));
    assert!(written.contains("url = \"https://api.gridscale.io\""), "{written}");
}

#[test]
fn move_config_imports_the_legacy_accounts() {
    let home = TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}"));
    let legacy_dir = home.path().join("gscloud");
    std::fs::create_dir_all(&legacy_dir).unwrap_or_else(|err| panic!("mkdir: {err}"));
    std::fs::write(
        legacy_dir.join("config.yaml"),
        "accounts:\n  - name: default\n    userId: user-1\n    token: secret\n    url: https://api.gridscale.io\n",
    )
    .unwrap_or_else(|err| panic!("seed legacy: {err}"));
    let target = home.path().join("gscloud.toml");
    std::fs::write(&target, "token = \"keep\"\n").unwrap_or_else(|err| panic!("seed: {err}"));

    let run = |args: &[&str]| {
        let mut cmd = cargo_bin_cmd!("gscloud");
        for name in CONFIG_VARS {
            cmd.env_remove(name);
        }
        cmd.env("HOME", home.path())
            .env("XDG_CONFIG_HOME", home.path())
            .env("GSCLOUD_CONFIG_PATH", &target)
            .current_dir(home.path())
            .args(args)
            .assert()
    };

    run(&["move-config"])
        .code(1)
        .stderr(predicate::str::contains("--force"));
    run(&["move-config", "--force"])
        .success()
        .stderr(predicate::str::contains("Moved 1 account(s)"));

    let written = std::fs::read_to_string(&target).unwrap_or_else(|err| panic!("read: {err}"));
    assert!(written.contains("[[accounts]]"), "{written}");
    assert!(written.contains("user_id = \"user-1\""), "{written}");
}

#[test]
fn unknown_accounts_are_reported_before_any_call() {
    let home = TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}"));
    let path = home.path().join("gscloud.toml");
    std::fs::write(
        &path,
        "[[accounts]]\nname = \"default\"\nuser_id = \"u\"\ntoken = \"t\"\n",
    )
    .unwrap_or_else(|err| panic!("seed: {err}"));

    let mut cmd = cargo_bin_cmd!("gscloud");
    for name in CONFIG_VARS {
        cmd.env_remove(name);
    }
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path())
        .env("GSCLOUD_CONFIG_PATH", &path)
        .current_dir(home.path())
        .args(["info", "--account", "prod"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("account 'prod' is not configured (known: default)"));
}
