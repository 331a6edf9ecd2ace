//! Asynchronous completion tracking.
//!
//! Mutating calls return an `X-Request-Id`. In synchronous mode the client
//! polls `/requests/{id}` until the record reports `done` or `failed`, so a
//! returned call means the server-side effect has finished.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::transport::Operation;
use super::{ApiError, Client, join_path};
use crate::context::CallContext;
use crate::retry::{Attempt, retry_with_context};

/// Base path of the request status resource.
pub const REQUEST_BASE: &str = "/requests/";
/// Overall timeout of [`Client::wait_for_request_standalone`].
pub const STANDALONE_TIMEOUT: Duration = Duration::from_secs(120);
/// Poll interval of [`Client::wait_for_request_standalone`].
pub const STANDALONE_INTERVAL: Duration = Duration::from_millis(500);

/// Request status records keyed by request identifier.
pub type RequestStatus = HashMap<String, RequestStatusProperties>;

/// State of an asynchronous request.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(from = "Option<String>", into = "String")]
pub enum RequestState {
    /// Still running; also what a null or missing status means.
    #[default]
    Pending,
    /// Finished successfully.
    Done,
    /// Finished with a failure.
    Failed,
    /// Any value this client does not know; treated as still running.
    Other(String),
}

impl From<String> for RequestState {
    fn from(value: String) -> Self {
        match value.as_str() {
            "pending" => Self::Pending,
            "done" => Self::Done,
            "failed" => Self::Failed,
            _ => Self::Other(value),
        }
    }
}

impl From<Option<String>> for RequestState {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::Pending, Self::from)
    }
}

impl From<RequestState> for String {
    fn from(value: RequestState) -> Self {
        match value {
            RequestState::Pending => "pending".to_owned(),
            RequestState::Done => "done".to_owned(),
            RequestState::Failed => "failed".to_owned(),
            RequestState::Other(other) => other,
        }
    }
}

/// One request status record.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RequestStatusProperties {
    /// Current state.
    #[serde(default)]
    pub status: RequestState,
    /// Server message, usually the failure reason.
    #[serde(default)]
    pub message: String,
    /// When the request was created.
    #[serde(default, with = "crate::timestamp::option")]
    pub create_time: Option<DateTime<Utc>>,
}

/// Maps one poll result onto the retry protocol.
///
/// A missing record counts as still running.
#[must_use]
pub fn interpret(request_id: &str, status: &RequestStatus) -> Attempt<(), ApiError> {
    match status.get(request_id) {
        Some(RequestStatusProperties {
            status: RequestState::Done,
            ..
        }) => Attempt::Stop(Ok(())),
        Some(RequestStatusProperties {
            status: RequestState::Failed,
            message,
            ..
        }) => Attempt::Stop(Err(ApiError::RequestFailed {
            request_id: request_id.to_owned(),
            message: message.clone(),
        })),
        _ => Attempt::Continue(None),
    }
}

impl Client {
    /// Fetches the status record for `request_id` without tracking.
    ///
    /// # Errors
    ///
    /// Propagates transport and decode failures.
    pub async fn request_status(
        &self,
        ctx: &CallContext,
        request_id: &str,
    ) -> Result<RequestStatus, ApiError> {
        let operation = Operation::get(join_path(REQUEST_BASE, &[request_id]));
        let raw = self.send(ctx, &operation).await?;
        serde_json::from_slice(&raw.body).map_err(|err| ApiError::Decode(err.to_string()))
    }

    /// Polls until `request_id` finishes, using the configured delay as the
    /// poll interval and `ctx` for cancellation.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::RequestFailed`] when the request failed
    /// server-side, [`ApiError::Context`] when `ctx` finishes first, and any
    /// error raised while fetching the status.
    pub async fn wait_for_request(&self, ctx: &CallContext, request_id: &str) -> Result<(), ApiError> {
        self.poll_request(ctx, request_id, self.config.delay_interval)
            .await
    }

    /// Polls until `request_id` finishes or `timeout` elapses.
    ///
    /// # Errors
    ///
    /// As for [`Client::wait_for_request`]; the timeout surfaces as
    /// [`ApiError::Context`] with a deadline error.
    pub async fn wait_with_timeout(
        &self,
        request_id: &str,
        timeout: Duration,
        interval: Duration,
    ) -> Result<(), ApiError> {
        let ctx = CallContext::with_timeout(timeout);
        self.poll_request(&ctx, request_id, interval).await
    }

    /// Polls until `request_id` finishes, giving up after
    /// [`STANDALONE_TIMEOUT`] and checking every [`STANDALONE_INTERVAL`].
    /// Used to wait for requests started outside this client.
    ///
    /// # Errors
    ///
    /// As for [`Client::wait_with_timeout`].
    pub async fn wait_for_request_standalone(&self, request_id: &str) -> Result<(), ApiError> {
        self.wait_with_timeout(request_id, STANDALONE_TIMEOUT, STANDALONE_INTERVAL)
            .await
    }

    async fn poll_request(
        &self,
        ctx: &CallContext,
        request_id: &str,
        interval: Duration,
    ) -> Result<(), ApiError> {
        retry_with_context(ctx, interval, move || async move {
            match self.request_status(ctx, request_id).await {
                Ok(status) => {
                    let next = interpret(request_id, &status);
                    debug!(
                        request_id,
                        finished = matches!(next, Attempt::Stop(_)),
                        "polled request status"
                    );
                    next
                }
                Err(err) => Attempt::Stop(Err(err)),
            }
        })
        .await
    }
}
