//! Tests for the starter configuration writer.

use super::*;
use rstest::{fixture, rstest};
use tempfile::TempDir;

struct ConfigFixture {
    _tmp: TempDir,
    path: Utf8PathBuf,
    store: ConfigStore,
}

#[fixture]
fn config_fixture() -> ConfigFixture {
    let tmp = TempDir::new().unwrap_or_else(|err| panic!("tempdir: {err}"));
    let path = Utf8PathBuf::from_path_buf(tmp.path().join(CONFIG_FILE_NAME))
        .unwrap_or_else(|err| panic!("temp path should be utf8: {}", err.display()));
    let root = path
        .parent()
        .unwrap_or_else(|| panic!("temp path should have a parent directory"));
    let discovery = ConfigDiscovery::builder(APP_NAME)
        .config_file_name(CONFIG_FILE_NAME)
        .dotfile_name(DOTFILE_NAME)
        .project_file_name(PROJECT_FILE_NAME)
        .clear_project_roots()
        .add_project_root(root)
        .build();
    ConfigFixture {
        store: ConfigStore::with_discovery(discovery),
        path,
        _tmp: tmp,
    }
}

fn parsed(path: &Utf8Path) -> toml::Value {
    let contents = read_config(path).unwrap_or_else(|err| panic!("read config: {err}"));
    toml::from_str(&contents).unwrap_or_else(|err| panic!("parse config: {err}"))
}

#[rstest]
fn writes_a_flat_starter_file(config_fixture: ConfigFixture) {
    let values = StarterConfig {
        user_id: "user".to_owned(),
        ..StarterConfig::default()
    };
    let written = config_fixture
        .store
        .write_starter(&values, false)
        .unwrap_or_else(|err| panic!("write starter: {err}"));

    assert_eq!(written, config_fixture.path);
    let value = parsed(&written);
    assert_eq!(value.get("user_id").and_then(toml::Value::as_str), Some("user"));
    assert_eq!(value.get("token").and_then(toml::Value::as_str), Some(""));
    assert_eq!(
        value.get("url").and_then(toml::Value::as_str),
        Some(DEFAULT_API_URL)
    );
}

#[rstest]
fn refuses_to_overwrite_without_force(config_fixture: ConfigFixture) {
    config_fixture
        .store
        .write_starter(&StarterConfig::default(), false)
        .unwrap_or_else(|err| panic!("seed config: {err}"));

    let Err(err) = config_fixture
        .store
        .write_starter(&StarterConfig::default(), false)
    else {
        panic!("overwrite should fail without force");
    };
    let ConfigStoreError::AlreadyExists { path } = err else {
        panic!("expected AlreadyExists, got {err}");
    };
    assert_eq!(path, config_fixture.path);
}

#[rstest]
fn overwrites_when_forced(config_fixture: ConfigFixture) {
    config_fixture
        .store
        .write_starter(&StarterConfig::default(), false)
        .unwrap_or_else(|err| panic!("seed config: {err}"));
    let values = StarterConfig {
        token: "fresh".to_owned(),
        ..StarterConfig::default()
    };
    config_fixture
        .store
        .write_starter(&values, true)
        .unwrap_or_else(|err| panic!("overwrite config: {err}"));

    let value = parsed(&config_fixture.path);
    assert_eq!(value.get("token").and_then(toml::Value::as_str), Some("fresh"));
}

#[rstest]
fn read_config_reports_missing_parent_dir(config_fixture: ConfigFixture) {
    let missing_path = config_fixture
        .path
        .parent()
        .unwrap_or_else(|| Utf8Path::new("."))
        .join("missing")
        .join(CONFIG_FILE_NAME);

    let Err(ConfigStoreError::Io { path, .. }) = read_config(&missing_path) else {
        panic!("expected io error");
    };
    assert_eq!(path.file_name(), Some("missing"));
}

fn legacy_file(fixture: &ConfigFixture, body: &str) -> Utf8PathBuf {
    let source = fixture
        .path
        .parent()
        .unwrap_or_else(|| Utf8Path::new("."))
        .join(LEGACY_FILE_NAME);
    std::fs::write(&source, body).unwrap_or_else(|err| panic!("seed legacy file: {err}"));
    source
}

const LEGACY_ACCOUNTS: &str = "\
accounts:
  - name: default
    userId: 11111111-2222-3333-4444-555555555555
    token: secret
    url: https://api.gridscale.io
  - name: staging
    userId: 66666666-7777-8888-9999-000000000000
    token: other
";

#[rstest]
fn imports_legacy_accounts_as_toml(config_fixture: ConfigFixture) {
    let source = legacy_file(&config_fixture, LEGACY_ACCOUNTS);

    let imported = config_fixture
        .store
        .import_accounts(&source, false)
        .unwrap_or_else(|err| panic!("import accounts: {err}"));

    assert_eq!(imported.path, config_fixture.path);
    assert_eq!(imported.names, ["default", "staging"]);
    let value = parsed(&imported.path);
    let accounts = value
        .get("accounts")
        .and_then(toml::Value::as_array)
        .unwrap_or_else(|| panic!("accounts array missing: {value}"));
    assert_eq!(accounts.len(), 2);
    let staging = accounts.get(1).unwrap_or_else(|| panic!("second account"));
    assert_eq!(
        staging.get("user_id").and_then(toml::Value::as_str),
        Some("66666666-7777-8888-9999-000000000000")
    );
    assert_eq!(staging.get("url").and_then(toml::Value::as_str), Some(""));
}

#[rstest]
fn import_keeps_an_existing_file_without_force(config_fixture: ConfigFixture) {
    config_fixture
        .store
        .write_starter(&StarterConfig::default(), false)
        .unwrap_or_else(|err| panic!("seed config: {err}"));
    let source = legacy_file(&config_fixture, LEGACY_ACCOUNTS);

    let Err(ConfigStoreError::AlreadyExists { path }) =
        config_fixture.store.import_accounts(&source, false)
    else {
        panic!("import should refuse to overwrite");
    };
    assert_eq!(path, config_fixture.path);
    assert!(parsed(&config_fixture.path).get("accounts").is_none());

    config_fixture
        .store
        .import_accounts(&source, true)
        .unwrap_or_else(|err| panic!("forced import: {err}"));
    assert!(parsed(&config_fixture.path).get("accounts").is_some());
}

#[rstest]
fn malformed_legacy_files_are_reported(config_fixture: ConfigFixture) {
    let source = legacy_file(&config_fixture, "accounts: [unterminated\n");

    let Err(ConfigStoreError::Parse { path, .. }) =
        config_fixture.store.import_accounts(&source, false)
    else {
        panic!("expected a parse error");
    };
    assert_eq!(path, source);
    assert!(!config_fixture.path.exists());
}
