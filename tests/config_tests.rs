//! Configuration loading from files and `GRIDSCALE_*` environment variables.

#[path = "common/test_constants.rs"]
mod test_constants;

use std::time::Duration;

use camino::Utf8PathBuf;
use cap_std::{ambient_authority, fs_utf8::Dir};
use gscloud::test_support::EnvGuard;
use gscloud::{ConfigError, GridscaleConfig};
use tempfile::TempDir;

use test_constants::{TOKEN, USER_ID};

const CONFIG_VARS: [&str; 8] = [
    "GRIDSCALE_USER_ID",
    "GRIDSCALE_TOKEN",
    "GRIDSCALE_URL",
    "GRIDSCALE_ACCOUNT",
    "GRIDSCALE_SYNCHRONOUS",
    "GRIDSCALE_DELAY_INTERVAL_MS",
    "GRIDSCALE_MAX_RETRIES",
    "GRIDSCALE_REQUEST_TIMEOUT_SECS",
];

struct Sandbox {
    _tmp: TempDir,
    root: Utf8PathBuf,
}

impl Sandbox {
    fn new() -> Self {
        let tmp = TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}"));
        let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf())
            .unwrap_or_else(|path| panic!("temp dir should be utf8: {}", path.display()));
        Self { _tmp: tmp, root }
    }

    fn write(&self, name: &str, contents: &str) -> Utf8PathBuf {
        Dir::open_ambient_dir(&self.root, ambient_authority())
            .unwrap_or_else(|err| panic!("open temp dir: {err}"))
            .write(name, contents)
            .unwrap_or_else(|err| panic!("write {name}: {err}"));
        self.root.join(name)
    }
}

/// Environment with every configuration variable cleared and discovery
/// pointed at the sandbox.
async fn isolated_env(sandbox: &Sandbox, extra: &[(&str, Option<&str>)]) -> EnvGuard {
    let mut pairs: Vec<(&str, Option<&str>)> = vec![
        ("HOME", Some(sandbox.root.as_str())),
        ("XDG_CONFIG_HOME", Some(sandbox.root.as_str())),
        ("GSCLOUD_CONFIG_PATH", None),
    ];
    pairs.extend(CONFIG_VARS.iter().map(|name| (*name, None)));
    pairs.retain(|(key, _)| !extra.iter().any(|(other, _)| other == key));
    pairs.extend_from_slice(extra);
    EnvGuard::set_vars(&pairs).await
}

#[tokio::test]
async fn defaults_apply_without_any_source() {
    let sandbox = Sandbox::new();
    let _guard = isolated_env(&sandbox, &[]).await;

    let cfg = GridscaleConfig::load_without_cli_args()
        .unwrap_or_else(|err| panic!("load should succeed: {err}"));

    let settings = cfg
        .account_settings()
        .unwrap_or_else(|err| panic!("settings should resolve: {err}"));
    assert_eq!(settings.url, "https://api.gridscale.io");
    assert_eq!(settings.name, None);
    assert!(cfg.is_synchronous());
    assert_eq!(cfg.delay_interval_ms, 1000);
    assert_eq!(cfg.max_retries, 5);
    assert_eq!(cfg.request_timeout_secs, 60);
}

#[tokio::test]
async fn missing_credentials_explain_how_to_fix_them() {
    let sandbox = Sandbox::new();
    let _guard = isolated_env(&sandbox, &[]).await;

    let cfg = GridscaleConfig::load_without_cli_args()
        .unwrap_or_else(|err| panic!("load should succeed: {err}"));
    let err = cfg
        .client_config()
        .err()
        .unwrap_or_else(|| panic!("credentials are required"));

    let ConfigError::MissingField(message) = err else {
        panic!("expected MissingField, got {err:?}");
    };
    assert!(message.contains("GRIDSCALE_USER_ID"), "message: {message}");
    assert!(message.contains("gscloud.toml"), "message: {message}");
}

#[tokio::test]
async fn environment_variables_configure_the_client() {
    let sandbox = Sandbox::new();
    let _guard = isolated_env(
        &sandbox,
        &[
            ("GRIDSCALE_USER_ID", Some(USER_ID)),
            ("GRIDSCALE_TOKEN", Some(TOKEN)),
            ("GRIDSCALE_URL", Some("https://api.example.test")),
            ("GRIDSCALE_SYNCHRONOUS", Some("false")),
            ("GRIDSCALE_DELAY_INTERVAL_MS", Some("250")),
            ("GRIDSCALE_MAX_RETRIES", Some("2")),
        ],
    )
    .await;

    let client = GridscaleConfig::load_without_cli_args()
        .unwrap_or_else(|err| panic!("load should succeed: {err}"))
        .client_config()
        .unwrap_or_else(|err| panic!("config should validate: {err}"));

    assert_eq!(client.user_id, USER_ID);
    assert_eq!(client.token, TOKEN);
    assert_eq!(client.base_url, "https://api.example.test");
    assert!(!client.synchronous);
    assert_eq!(client.delay_interval, Duration::from_millis(250));
    assert_eq!(client.max_retries, 2);
    assert_eq!(client.request_timeout, Duration::from_secs(60));
}

#[tokio::test]
async fn configuration_file_is_read_and_environment_wins() {
    let sandbox = Sandbox::new();
    let path = sandbox.write(
        "custom.toml",
        &format!("user_id = \"{USER_ID}\"\ntoken = \"from-file\"\nmax_retries = 3\n"),
    );
    let _guard = isolated_env(
        &sandbox,
        &[
            ("GSCLOUD_CONFIG_PATH", Some(path.as_str())),
            ("GRIDSCALE_TOKEN", Some(TOKEN)),
        ],
    )
    .await;

    let cfg = GridscaleConfig::load_without_cli_args()
        .unwrap_or_else(|err| panic!("load should succeed: {err}"));

    assert_eq!(cfg.user_id, USER_ID);
    assert_eq!(cfg.token, TOKEN);
    assert_eq!(cfg.max_retries, 3);
}

#[tokio::test]
async fn unset_synchronous_mode_survives_a_partial_file() {
    let sandbox = Sandbox::new();
    let path = sandbox.write(
        "partial.toml",
        &format!("user_id = \"{USER_ID}\"\ntoken = \"{TOKEN}\"\n"),
    );
    let _guard = isolated_env(&sandbox, &[("GSCLOUD_CONFIG_PATH", Some(path.as_str()))]).await;

    let client = GridscaleConfig::load_without_cli_args()
        .unwrap_or_else(|err| panic!("load should succeed: {err}"))
        .client_config()
        .unwrap_or_else(|err| panic!("config should validate: {err}"));

    assert!(client.synchronous);
}

#[tokio::test]
async fn yaml_accounts_are_selected_by_name() {
    let sandbox = Sandbox::new();
    let path = sandbox.write(
        "gscloud.yaml",
        &format!(
            "accounts:\n  - name: default\n    userId: {USER_ID}\n    token: default-token\n    url: https://api.gridscale.io\n  - name: staging\n    userId: staging-user\n    token: {TOKEN}\n    url: https://staging.example.test\n"
        ),
    );
    let _guard = isolated_env(&sandbox, &[("GSCLOUD_CONFIG_PATH", Some(path.as_str()))]).await;
    let cfg = GridscaleConfig::load_without_cli_args()
        .unwrap_or_else(|err| panic!("load should succeed: {err}"));

    let fallback = cfg
        .client_config()
        .unwrap_or_else(|err| panic!("default account should validate: {err}"));
    assert_eq!(fallback.user_id, USER_ID);
    assert_eq!(fallback.token, "default-token");

    let staging = cfg
        .with_account(Some("staging".to_owned()))
        .client_config()
        .unwrap_or_else(|err| panic!("staging account should validate: {err}"));
    assert_eq!(staging.user_id, "staging-user");
    assert_eq!(staging.token, TOKEN);
    assert_eq!(staging.base_url, "https://staging.example.test");
}

#[tokio::test]
async fn account_variable_names_an_unknown_account() {
    let sandbox = Sandbox::new();
    let path = sandbox.write(
        "accounts.toml",
        "[[accounts]]\nname = \"default\"\nuser_id = \"u\"\ntoken = \"t\"\n",
    );
    let _guard = isolated_env(
        &sandbox,
        &[
            ("GSCLOUD_CONFIG_PATH", Some(path.as_str())),
            ("GRIDSCALE_ACCOUNT", Some("missing")),
        ],
    )
    .await;

    let err = GridscaleConfig::load_without_cli_args()
        .unwrap_or_else(|err| panic!("load should succeed: {err}"))
        .client_config()
        .err()
        .unwrap_or_else(|| panic!("unknown account should fail"));

    assert!(
        matches!(err, ConfigError::UnknownAccount { ref name, .. } if name == "missing"),
        "got {err:?}"
    );
}
