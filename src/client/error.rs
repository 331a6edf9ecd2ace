//! Error taxonomy for API calls.

use serde::Deserialize;
use thiserror::Error;

use crate::context::ContextError;
use crate::retry::RetryError;

const EMPTY_DESCRIPTION: &str = "no error message received from server";

/// Error reported by the API in a non-2xx response.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct RequestError {
    /// Short error title from the payload.
    #[serde(default)]
    pub title: String,
    /// Human readable description from the payload.
    #[serde(default)]
    pub description: String,
    /// HTTP status code of the response.
    #[serde(skip)]
    pub status_code: u16,
    /// Value of the `X-Request-Id` response header.
    #[serde(skip)]
    pub request_id: String,
}

impl RequestError {
    /// Builds an error from a response, reading `{title, description}` from
    /// the body when it is valid JSON. An unreadable body leaves both empty.
    #[must_use]
    pub fn from_response(status_code: u16, request_id: impl Into<String>, body: &[u8]) -> Self {
        let payload: Self = serde_json::from_slice(body).unwrap_or_default();
        Self {
            status_code,
            request_id: request_id.into(),
            ..payload
        }
    }

    /// Whether the status indicates the server may succeed if asked again.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.status_code >= 500 || self.status_code == 424
    }
}

impl std::fmt::Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let message = if self.description.is_empty() {
            EMPTY_DESCRIPTION
        } else {
            self.description.as_str()
        };
        write!(
            f,
            "Status code: {}. Error: {}. Request UUID: {}. ",
            self.status_code, message, self.request_id
        )?;
        if self.status_code >= 500 {
            f.write_str("Please report this error along with the request UUID.")?;
        }
        Ok(())
    }
}

impl std::error::Error for RequestError {}

/// Errors returned by the API client.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ApiError {
    /// Input rejected before any network call.
    #[error("{0}")]
    InvalidArgument(String),
    /// Request body could not be serialized.
    #[error("failed to encode request body: {0}")]
    Encode(String),
    /// Connection level failure.
    #[error("network error: {message}")]
    Network {
        /// Transport diagnostic.
        message: String,
        /// Whether the failure was a timeout.
        timeout: bool,
    },
    /// The server answered with a non-success status.
    #[error(transparent)]
    Request(RequestError),
    /// The retry budget ran out.
    #[error("{}", exhausted_message(.last.as_deref()))]
    Exhausted {
        /// Error of the final attempt, if it recorded one.
        last: Option<Box<ApiError>>,
    },
    /// Response body did not match the expected shape.
    #[error("failed to decode response body: {0}")]
    Decode(String),
    /// A tracked asynchronous operation reported failure.
    #[error("request {request_id} failed with error {message}")]
    RequestFailed {
        /// Request-tracking identifier.
        request_id: String,
        /// Message from the status record.
        message: String,
    },
    /// The call context was cancelled or its deadline passed.
    #[error(transparent)]
    Context(#[from] ContextError),
    /// A lookup by name found nothing.
    #[error("{0}")]
    NotFound(String),
}

fn exhausted_message(last: Option<&ApiError>) -> String {
    last.map_or_else(
        || "maximum number of trials has been exhausted".to_owned(),
        |err| format!("maximum number of trials has been exhausted with error: {err}"),
    )
}

impl ApiError {
    /// Whether the failure is of a kind the executor retries.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Request(err) => err.is_retryable(),
            Self::Network { .. } => true,
            _ => false,
        }
    }

    /// HTTP status code behind the error, looking through exhaustion.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Request(err) => Some(err.status_code),
            Self::Exhausted { last: Some(last) } => last.status_code(),
            _ => None,
        }
    }

    /// Whether this is the retry-exhaustion error.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    pub(crate) fn invalid_uuid(name: &str) -> Self {
        Self::InvalidArgument(format!("'{name}' is invalid"))
    }
}

impl From<RequestError> for ApiError {
    fn from(value: RequestError) -> Self {
        Self::Request(value)
    }
}

impl From<RetryError<Self>> for ApiError {
    fn from(value: RetryError<Self>) -> Self {
        match value {
            RetryError::Stopped(err) => err,
            RetryError::Exhausted(last) => Self::Exhausted {
                last: last.map(Box::new),
            },
            RetryError::Interrupted(err) => Self::Context(err),
        }
    }
}
