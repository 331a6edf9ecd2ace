//! Configuration loading via `ortho-config`.
//!
//! Credentials come either from the top-level `user_id`, `token` and `url`
//! keys or from a named entry of the `accounts` list. Top-level values, which
//! `GRIDSCALE_*` environment variables also set, win over the selected entry.

use std::ffi::OsString;
use std::time::Duration;

use ortho_config::OrthoConfig;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::{ClientConfig, DEFAULT_API_URL};

/// Name of the configuration file searched for by discovery.
pub const CONFIG_FILE_NAME: &str = "gscloud.toml";

/// Account selected when none is named.
pub const DEFAULT_ACCOUNT: &str = "default";

/// One named set of credentials in the `accounts` list.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct AccountEntry {
    /// Name selected with `--account` or `GRIDSCALE_ACCOUNT`.
    pub name: String,
    /// Account user identifier.
    #[serde(default, alias = "userId")]
    pub user_id: String,
    /// API token.
    #[serde(default)]
    pub token: String,
    /// API base URL; the public endpoint when empty.
    #[serde(default)]
    pub url: String,
}

/// API credentials and client tuning, merged from defaults, configuration
/// files and `GRIDSCALE_*` environment variables.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(
    prefix = "GRIDSCALE",
    discovery(
        app_name = "gscloud",
        env_var = "GSCLOUD_CONFIG_PATH",
        config_file_name = "gscloud.toml",
        dotfile_name = ".gscloud.toml",
        project_file_name = "gscloud.toml"
    )
)]
pub struct GridscaleConfig {
    /// Account user identifier sent as `X-Auth-UserID`.
    #[ortho_config(default = String::new())]
    pub user_id: String,
    /// API token sent as `X-Auth-Token`.
    #[ortho_config(default = String::new())]
    pub token: String,
    /// API base URL.
    pub url: Option<String>,
    /// Name of the entry in `accounts` to use.
    pub account: Option<String>,
    /// Named credential sets.
    #[ortho_config(skip_cli, default = Vec::new())]
    pub accounts: Vec<AccountEntry>,
    /// Wait for asynchronous requests to finish before returning. Unset
    /// means yes.
    pub synchronous: Option<bool>,
    /// Base delay between retries and completion polls, in milliseconds.
    #[ortho_config(default = 1000)]
    pub delay_interval_ms: u64,
    /// Retries after the first attempt.
    #[ortho_config(default = 5)]
    pub max_retries: u32,
    /// Timeout of one HTTP exchange, in seconds.
    #[ortho_config(default = 60)]
    pub request_timeout_secs: u64,
}

/// Credentials and endpoint after account selection.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct AccountSettings {
    /// Selected entry of `accounts`, if one applied.
    pub name: Option<String>,
    /// Account user identifier.
    pub user_id: String,
    /// API token.
    pub token: String,
    /// API base URL.
    pub url: String,
}

struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }
}

fn prefer(top_level: &str, entry: Option<&str>) -> String {
    if top_level.trim().is_empty() {
        entry.unwrap_or_default().to_owned()
    } else {
        top_level.to_owned()
    }
}

impl GridscaleConfig {
    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "missing {}: set {} or add {} to {CONFIG_FILE_NAME} (run `gscloud make-config`)",
                metadata.description, metadata.env_var, metadata.toml_key
            )));
        }
        Ok(())
    }

    /// Loads configuration without parsing CLI arguments. Values merge
    /// defaults, configuration files and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([OsString::from("gscloud")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Selects `account` when given, keeping the loaded choice otherwise.
    #[must_use]
    pub fn with_account(mut self, account: Option<String>) -> Self {
        if account.is_some() {
            self.account = account;
        }
        self
    }

    /// Whether mutating calls wait for completion.
    #[must_use]
    pub const fn is_synchronous(&self) -> bool {
        !matches!(self.synchronous, Some(false))
    }

    /// Entry of `accounts` matching the selected name. An explicitly named
    /// account must exist; the implicit `default` may be absent.
    fn selected_account(&self) -> Result<Option<&AccountEntry>, ConfigError> {
        let name = self.account.as_deref().unwrap_or(DEFAULT_ACCOUNT);
        match self.accounts.iter().find(|entry| entry.name == name) {
            Some(entry) => Ok(Some(entry)),
            None if self.account.is_none() => Ok(None),
            None => Err(ConfigError::UnknownAccount {
                name: name.to_owned(),
                known: self.accounts.iter().map(|entry| entry.name.clone()).collect(),
            }),
        }
    }

    /// Resolves credentials and endpoint for the selected account.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownAccount`] when a named account is not
    /// configured.
    pub fn account_settings(&self) -> Result<AccountSettings, ConfigError> {
        let entry = self.selected_account()?;
        let url = self
            .url
            .clone()
            .or_else(|| {
                entry
                    .map(|account| account.url.clone())
                    .filter(|url| !url.trim().is_empty())
            })
            .unwrap_or_else(|| DEFAULT_API_URL.to_owned());
        Ok(AccountSettings {
            name: entry.map(|account| account.name.clone()),
            user_id: prefer(&self.user_id, entry.map(|account| account.user_id.as_str())),
            token: prefer(&self.token, entry.map(|account| account.token.as_str())),
            url,
        })
    }

    /// Checks required fields and the API URL of the selected account.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] naming the environment variable
    /// and file key to set, [`ConfigError::InvalidUrl`], or
    /// [`ConfigError::UnknownAccount`].
    pub fn validate(&self) -> Result<AccountSettings, ConfigError> {
        let settings = self.account_settings()?;
        Self::require_field(
            &settings.user_id,
            &FieldMetadata::new("gridscale user ID", "GRIDSCALE_USER_ID", "user_id"),
        )?;
        Self::require_field(
            &settings.token,
            &FieldMetadata::new("gridscale API token", "GRIDSCALE_TOKEN", "token"),
        )?;
        Self::require_field(
            &settings.url,
            &FieldMetadata::new("API URL", "GRIDSCALE_URL", "url"),
        )?;
        Url::parse(&settings.url).map_err(|err| ConfigError::InvalidUrl {
            url: settings.url.clone(),
            message: err.to_string(),
        })?;
        Ok(settings)
    }

    /// Validates and converts into the settings consumed by
    /// [`Client::new`](crate::client::Client::new).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when validation fails.
    pub fn client_config(&self) -> Result<ClientConfig, ConfigError> {
        let settings = self.validate()?;
        Ok(ClientConfig::new(settings.user_id, settings.token)
            .base_url(settings.url)
            .synchronous(self.is_synchronous())
            .delay_interval(Duration::from_millis(self.delay_interval_ms))
            .max_retries(self.max_retries)
            .request_timeout(Duration::from_secs(self.request_timeout_secs)))
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// A required field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// The API URL does not parse.
    #[error("invalid API URL '{url}': {message}")]
    InvalidUrl {
        /// Offending value.
        url: String,
        /// Parser message.
        message: String,
    },
    /// The named account is not in the `accounts` list.
    #[error("account '{name}' is not configured (known: {})", .known.join(", "))]
    UnknownAccount {
        /// Requested name.
        name: String,
        /// Names that are configured.
        known: Vec<String>,
    },
    /// The `ortho-config` loader failed.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
