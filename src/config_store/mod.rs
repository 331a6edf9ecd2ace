//! Writes `gscloud.toml` for `gscloud make-config` and imports the
//! `config.yaml` account lists of earlier releases for `gscloud move-config`.

use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use ortho_config::ConfigDiscovery;
use ortho_config::{serde_saphyr, toml};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::client::DEFAULT_API_URL;
use crate::config::AccountEntry;

const APP_NAME: &str = "gscloud";
const CONFIG_ENV_VAR: &str = "GSCLOUD_CONFIG_PATH";
const CONFIG_FILE_NAME: &str = "gscloud.toml";
const DOTFILE_NAME: &str = ".gscloud.toml";
const PROJECT_FILE_NAME: &str = "gscloud.toml";
/// File name used by earlier releases under `<config dir>/gscloud/`.
pub const LEGACY_FILE_NAME: &str = "config.yaml";

/// Errors raised while writing the configuration file.
#[derive(Debug, Error)]
pub enum ConfigStoreError {
    /// No configuration candidates are available.
    #[error("no configuration file candidates were discovered")]
    NoCandidates,
    /// A file system operation failed.
    #[error("failed to access {path}: {message}")]
    Io {
        /// Path that could not be accessed.
        path: Utf8PathBuf,
        /// Human-readable error message.
        message: String,
    },
    /// A legacy configuration file is not valid YAML.
    #[error("failed to parse {path}: {message}")]
    Parse {
        /// File being read.
        path: Utf8PathBuf,
        /// Parser message.
        message: String,
    },
    /// The TOML document could not be rendered.
    #[error("failed to render {path}: {message}")]
    Render {
        /// Path being written.
        path: Utf8PathBuf,
        /// Human-readable error message.
        message: String,
    },
    /// The path has no file name component.
    #[error("invalid configuration path {path}")]
    InvalidPath {
        /// Offending path.
        path: Utf8PathBuf,
    },
    /// A configuration file exists and overwrite is disabled.
    #[error("configuration file {path} already exists; rerun with --force to replace it")]
    AlreadyExists {
        /// Existing file.
        path: Utf8PathBuf,
    },
}

/// Values written into a starter configuration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StarterConfig {
    /// Account user identifier.
    pub user_id: String,
    /// API token.
    pub token: String,
    /// API base URL.
    pub url: String,
}

impl Default for StarterConfig {
    fn default() -> Self {
        Self {
            user_id: String::new(),
            token: String::new(),
            url: DEFAULT_API_URL.to_owned(),
        }
    }
}

impl StarterConfig {
    fn to_toml(&self) -> toml::Value {
        let mut table = toml::value::Table::new();
        table.insert("user_id".to_owned(), toml::Value::String(self.user_id.clone()));
        table.insert("token".to_owned(), toml::Value::String(self.token.clone()));
        table.insert("url".to_owned(), toml::Value::String(self.url.clone()));
        toml::Value::Table(table)
    }
}

/// Account list of a configuration file.
#[derive(Debug, Default, Deserialize, Serialize)]
struct AccountsFile {
    #[serde(default)]
    accounts: Vec<AccountEntry>,
}

/// Outcome of importing a legacy configuration.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ImportedAccounts {
    /// File the accounts were written to.
    pub path: Utf8PathBuf,
    /// Names of the imported accounts, in file order.
    pub names: Vec<String>,
}

/// Abstraction over configuration writers for dependency injection.
pub trait ConfigWriter {
    /// Writes `values` to the configuration file and returns its path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigStoreError::AlreadyExists`] when a file exists and
    /// `force` is false, and other variants when writing fails.
    fn write_starter(
        &self,
        values: &StarterConfig,
        force: bool,
    ) -> Result<Utf8PathBuf, ConfigStoreError>;

    /// Finds the legacy `config.yaml`, if one exists.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigStoreError::Io`] when a candidate cannot be checked.
    fn legacy_source(&self) -> Result<Option<Utf8PathBuf>, ConfigStoreError>;

    /// Copies the `accounts` list of the legacy file at `source` into the
    /// configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigStoreError::AlreadyExists`] when a configuration file
    /// exists and `force` is false, [`ConfigStoreError::Parse`] when `source`
    /// is not valid YAML, and other variants when reading or writing fails.
    fn import_accounts(
        &self,
        source: &Utf8Path,
        force: bool,
    ) -> Result<ImportedAccounts, ConfigStoreError>;
}

/// Writes `gscloud.toml` using `OrthoConfig`'s discovery search order.
#[derive(Clone, Debug)]
pub struct ConfigStore {
    discovery: ConfigDiscovery,
}

impl ConfigStore {
    /// Builds a store using the standard discovery settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            discovery: ConfigDiscovery::builder(APP_NAME)
                .env_var(CONFIG_ENV_VAR)
                .config_file_name(CONFIG_FILE_NAME)
                .dotfile_name(DOTFILE_NAME)
                .project_file_name(PROJECT_FILE_NAME)
                .build(),
        }
    }

    /// Builds a store using an explicit discovery configuration.
    #[must_use]
    pub const fn with_discovery(discovery: ConfigDiscovery) -> Self {
        Self { discovery }
    }

    /// The first existing candidate wins; otherwise the last candidate is
    /// created.
    fn resolve_target(&self) -> Result<ConfigTarget, ConfigStoreError> {
        let candidates = self.discovery.utf8_candidates();
        for candidate in &candidates {
            if path_exists(candidate)? {
                return Ok(ConfigTarget {
                    path: candidate.clone(),
                    exists: true,
                });
            }
        }
        let fallback = candidates
            .last()
            .cloned()
            .ok_or(ConfigStoreError::NoCandidates)?;
        Ok(ConfigTarget {
            path: fallback,
            exists: false,
        })
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigWriter for ConfigStore {
    fn write_starter(
        &self,
        values: &StarterConfig,
        force: bool,
    ) -> Result<Utf8PathBuf, ConfigStoreError> {
        let target = self.resolve_target()?;
        if target.exists && !force {
            return Err(ConfigStoreError::AlreadyExists { path: target.path });
        }
        write_config(&target.path, &values.to_toml())?;
        Ok(target.path)
    }

    fn legacy_source(&self) -> Result<Option<Utf8PathBuf>, ConfigStoreError> {
        let legacy = ConfigDiscovery::builder(APP_NAME)
            .config_file_name(LEGACY_FILE_NAME)
            .build();
        for candidate in legacy.utf8_candidates() {
            if candidate.file_name() == Some(LEGACY_FILE_NAME) && path_exists(&candidate)? {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    fn import_accounts(
        &self,
        source: &Utf8Path,
        force: bool,
    ) -> Result<ImportedAccounts, ConfigStoreError> {
        let target = self.resolve_target()?;
        if target.exists && !force {
            return Err(ConfigStoreError::AlreadyExists { path: target.path });
        }
        let contents = read_config(source)?;
        let legacy: AccountsFile =
            serde_saphyr::from_str(&contents).map_err(|err| ConfigStoreError::Parse {
                path: source.to_path_buf(),
                message: err.to_string(),
            })?;
        debug!(source = %source, accounts = legacy.accounts.len(), "importing legacy accounts");
        let rendered = toml::Value::try_from(&legacy).map_err(|err| ConfigStoreError::Render {
            path: target.path.clone(),
            message: err.to_string(),
        })?;
        write_config(&target.path, &rendered)?;
        Ok(ImportedAccounts {
            path: target.path,
            names: legacy.accounts.into_iter().map(|account| account.name).collect(),
        })
    }
}

#[derive(Clone, Debug)]
struct ConfigTarget {
    path: Utf8PathBuf,
    exists: bool,
}

fn split(path: &Utf8Path) -> Result<(&Utf8Path, &str), ConfigStoreError> {
    let parent = path.parent().unwrap_or_else(|| Utf8Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| ConfigStoreError::InvalidPath {
            path: path.to_path_buf(),
        })?;
    Ok((parent, file_name))
}

fn path_exists(path: &Utf8Path) -> Result<bool, ConfigStoreError> {
    let (parent, file_name) = split(path)?;
    match Dir::open_ambient_dir(parent, ambient_authority()) {
        Ok(dir) => dir
            .try_exists(file_name)
            .map_err(|err| ConfigStoreError::Io {
                path: path.to_path_buf(),
                message: err.to_string(),
            }),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(ConfigStoreError::Io {
            path: parent.to_path_buf(),
            message: err.to_string(),
        }),
    }
}

fn read_config(path: &Utf8Path) -> Result<String, ConfigStoreError> {
    let (parent, file_name) = split(path)?;
    let dir =
        Dir::open_ambient_dir(parent, ambient_authority()).map_err(|err| ConfigStoreError::Io {
            path: parent.to_path_buf(),
            message: err.to_string(),
        })?;
    dir.read_to_string(file_name)
        .map_err(|err| ConfigStoreError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
}

fn write_config(path: &Utf8Path, value: &toml::Value) -> Result<(), ConfigStoreError> {
    let (parent, file_name) = split(path)?;
    Dir::create_ambient_dir_all(parent, ambient_authority()).map_err(|err| {
        ConfigStoreError::Io {
            path: parent.to_path_buf(),
            message: err.to_string(),
        }
    })?;
    let dir =
        Dir::open_ambient_dir(parent, ambient_authority()).map_err(|err| ConfigStoreError::Io {
            path: parent.to_path_buf(),
            message: err.to_string(),
        })?;
    let rendered = toml::to_string_pretty(value).map_err(|err| ConfigStoreError::Render {
        path: path.to_path_buf(),
        message: err.to_string(),
    })?;
    dir.write(file_name, rendered)
        .map_err(|err| ConfigStoreError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
}

#[cfg(test)]
mod tests;
