//! Core library for the `gscloud` command-line client of the gridscale
//! cloud.
//!
//! The crate exposes an authenticated API [`Client`] whose calls retry
//! transient failures and, in synchronous mode, wait until the platform
//! reports that a mutating request has finished. Resource operations live in
//! [`objects`] as traits implemented by the client. The [`commands`] module
//! holds the handlers behind the `gscloud` binary.

pub mod client;
pub mod commands;
pub mod config;
pub mod config_store;
pub mod context;
pub mod objects;
pub mod render;
pub mod retry;
pub mod test_support;
pub mod timestamp;
pub mod types;

pub use client::{ApiError, ApiFuture, Client, ClientConfig, RequestError};
pub use config::{ConfigError, GridscaleConfig};
pub use config_store::{
    ConfigStore, ConfigStoreError, ConfigWriter, ImportedAccounts, StarterConfig,
};
pub use context::{CallContext, ContextError};
pub use render::{Format, OutputOptions, RenderError};
