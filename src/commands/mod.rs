//! Command handlers behind the `gscloud` CLI.
//!
//! Handlers are generic over the operations traits in [`crate::objects`] so
//! they run unchanged against [`Client`](crate::client::Client) or a test
//! double. Results go to the console's standard output; progress notes such
//! as `Removed <id>` go to its error stream.

use std::fmt::Display;
use std::io::{self, Write};

use camino::Utf8PathBuf;
use chrono::{DateTime, Local, SecondsFormat, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::client::ApiError;
use crate::config_store::ConfigStoreError;
use crate::render::{OutputOptions, RenderError, Table, render};

pub mod image;
pub mod info;
pub mod ip;
pub mod kubernetes;
pub mod make_config;
pub mod network;
pub mod postgresql;
pub mod request;
pub mod server;
pub mod sshkey;
pub mod storage;

/// Errors raised by command handlers.
#[derive(Debug, Error)]
pub enum CommandError {
    /// An API call failed; `context` says which step.
    #[error("{context}: {source}")]
    Api {
        /// Step that failed.
        context: &'static str,
        /// Underlying failure.
        source: ApiError,
    },
    /// Writing output failed.
    #[error(transparent)]
    Render(#[from] RenderError),
    /// A command argument is unusable.
    #[error("{0}")]
    InvalidArgument(String),
    /// A local input file could not be read.
    #[error("failed to read {path}: {message}")]
    ReadFile {
        /// File path.
        path: Utf8PathBuf,
        /// Reason.
        message: String,
    },
    /// Writing the configuration file failed.
    #[error(transparent)]
    ConfigStore(#[from] ConfigStoreError),
}

impl From<io::Error> for CommandError {
    fn from(value: io::Error) -> Self {
        Self::Render(RenderError::Io(value))
    }
}

/// Attaches a step description to API failures.
pub(crate) trait ApiContext<T> {
    fn context(self, context: &'static str) -> Result<T, CommandError>;
}

impl<T> ApiContext<T> for Result<T, ApiError> {
    fn context(self, context: &'static str) -> Result<T, CommandError> {
        self.map_err(|source| CommandError::Api { context, source })
    }
}

/// Output sinks plus the global output switches.
#[derive(Debug)]
pub struct Console<O, E> {
    out: O,
    err: E,
    options: OutputOptions,
}

impl<O: Write, E: Write> Console<O, E> {
    /// Wraps the output and error streams.
    pub const fn new(out: O, err: E, options: OutputOptions) -> Self {
        Self { out, err, options }
    }

    /// Output switches in effect.
    #[must_use]
    pub const fn options(&self) -> OutputOptions {
        self.options
    }

    /// Writes a listing as JSON, identifiers or a table.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Render`] when writing fails.
    pub fn render<T: Serialize + ?Sized>(&mut self, table: &Table, value: &T) -> Result<(), CommandError> {
        render(&mut self.out, self.options, table, value)?;
        Ok(())
    }

    /// Writes a table whatever the format switch says.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Render`] when writing fails.
    pub fn table(&mut self, table: &Table) -> Result<(), CommandError> {
        table.write_table(&mut self.out, self.options.no_header)?;
        Ok(())
    }

    /// Writes one line of result output.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Render`] when writing fails.
    pub fn print(&mut self, line: impl Display) -> Result<(), CommandError> {
        writeln!(self.out, "{line}")?;
        Ok(())
    }

    /// Writes one progress note to the error stream.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Render`] when writing fails.
    pub fn note(&mut self, line: impl Display) -> Result<(), CommandError> {
        writeln!(self.err, "{line}")?;
        Ok(())
    }

    /// Returns the streams, for inspection in tests.
    #[must_use]
    pub fn into_parts(self) -> (O, E) {
        (self.out, self.err)
    }
}

/// Renders a timestamp in local time as RFC 3339; empty when unknown.
pub(crate) fn local_time(value: Option<DateTime<Utc>>) -> String {
    value.map_or_else(String::new, |time| {
        time.with_timezone(&Local)
            .to_rfc3339_opts(SecondsFormat::Secs, true)
    })
}
