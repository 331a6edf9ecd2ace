//! Authenticated HTTP client for the gridscale API.
//!
//! [`Client`] binds an immutable [`ClientConfig`] to a pooled
//! `reqwest::Client`. Every resource operation goes through the transport
//! executor in [`transport`], which retries transient failures and, in
//! synchronous mode, waits for the asynchronous completion of mutating calls
//! through the tracker in [`tracker`].

mod error;
pub mod tracker;
pub mod transport;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;

pub use error::{ApiError, RequestError};
pub use tracker::{RequestState, RequestStatus, RequestStatusProperties};
pub use transport::{Decision, Operation, classify_network_failure, classify_status};

/// Default API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.gridscale.io";
/// Default number of retries for transient failures.
pub const DEFAULT_MAX_RETRIES: u32 = 5;
/// Default base delay between retries and completion polls.
pub const DEFAULT_DELAY_INTERVAL: Duration = Duration::from_millis(1000);
/// Default timeout for a single physical HTTP exchange.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Future returned by client operations.
pub type ApiFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send + 'a>>;

/// User agent sent when none is configured.
#[must_use]
pub fn default_user_agent() -> String {
    format!(
        "gscloud/{} ({})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS
    )
}

/// Immutable settings shared by every call made through a [`Client`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientConfig {
    /// Base URL that operation URIs are appended to.
    pub base_url: String,
    /// Value of the `X-Auth-UserID` header.
    pub user_id: String,
    /// Value of the `X-Auth-Token` header.
    pub token: String,
    /// Value of the `User-Agent` header.
    pub user_agent: String,
    /// Wait for asynchronous completion of mutating calls.
    pub synchronous: bool,
    /// Base delay for retry backoff and completion polling.
    pub delay_interval: Duration,
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Timeout for a single physical HTTP exchange.
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Configuration with default URL, retry budget, delay and timeout.
    #[must_use]
    pub fn new(user_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_owned(),
            user_id: user_id.into(),
            token: token.into(),
            user_agent: default_user_agent(),
            synchronous: true,
            delay_interval: DEFAULT_DELAY_INTERVAL,
            max_retries: DEFAULT_MAX_RETRIES,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Sets the base URL.
    #[must_use]
    pub fn base_url(mut self, value: impl Into<String>) -> Self {
        self.base_url = value.into();
        self
    }

    /// Enables or disables synchronous mode.
    #[must_use]
    pub const fn synchronous(mut self, value: bool) -> Self {
        self.synchronous = value;
        self
    }

    /// Sets the retry and polling delay.
    #[must_use]
    pub const fn delay_interval(mut self, value: Duration) -> Self {
        self.delay_interval = value;
        self
    }

    /// Sets the retry budget.
    #[must_use]
    pub const fn max_retries(mut self, value: u32) -> Self {
        self.max_retries = value;
        self
    }

    /// Sets the per-exchange timeout.
    #[must_use]
    pub const fn request_timeout(mut self, value: Duration) -> Self {
        self.request_timeout = value;
        self
    }

    /// Overrides the user agent.
    #[must_use]
    pub fn user_agent(mut self, value: impl Into<String>) -> Self {
        self.user_agent = value.into();
        self
    }
}

/// Handle to the gridscale API. Cheap to clone; clones share the
/// connection pool and configuration.
#[derive(Clone, Debug)]
pub struct Client {
    config: Arc<ClientConfig>,
    http: reqwest::Client,
}

impl Client {
    /// Builds a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidArgument`] when the base URL does not parse
    /// or the credentials are blank, and when the HTTP stack cannot be
    /// initialised.
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        Url::parse(&config.base_url).map_err(|err| {
            ApiError::InvalidArgument(format!("invalid API URL '{}': {err}", config.base_url))
        })?;
        if config.user_id.trim().is_empty() {
            return Err(ApiError::InvalidArgument("user id must not be empty".to_owned()));
        }
        if config.token.trim().is_empty() {
            return Err(ApiError::InvalidArgument("API token must not be empty".to_owned()));
        }
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| ApiError::InvalidArgument(format!("failed to build HTTP client: {err}")))?;
        Ok(Self {
            config: Arc::new(config),
            http,
        })
    }

    /// Configuration the client was built with.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Whether mutating calls wait for asynchronous completion.
    #[must_use]
    pub fn is_synchronous(&self) -> bool {
        self.config.synchronous
    }

    fn url(&self, uri: &str) -> String {
        format!("{}{uri}", self.config.base_url.trim_end_matches('/'))
    }
}

/// Joins a base path with further segments using `/`.
pub(crate) fn join_path(base: &str, segments: &[&str]) -> String {
    let mut path = base.trim_end_matches('/').to_owned();
    for segment in segments {
        path.push('/');
        path.push_str(segment.trim_matches('/'));
    }
    path
}

/// Rejects identifiers that are not UUIDs before any network call.
pub(crate) fn require_uuid(value: &str, name: &str) -> Result<(), ApiError> {
    uuid::Uuid::parse_str(value)
        .map(drop)
        .map_err(|_| ApiError::invalid_uuid(name))
}
