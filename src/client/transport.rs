//! Transport executor: one logical operation, several physical attempts.

use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{ApiError, Client, RequestError};
use crate::context::CallContext;
use crate::retry::{Attempt, retry_with_limit};

/// Response header carrying the request-tracking identifier.
pub const REQUEST_ID_HEADER: &str = "X-Request-Id";
const USER_ID_HEADER: &str = "X-Auth-UserID";
const TOKEN_HEADER: &str = "X-Auth-Token";
const JSON: &str = "application/json";

/// What the executor does with the outcome of one physical attempt.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Decision {
    /// Stop and report success.
    Succeed,
    /// Stop and report the error.
    Fail,
    /// Record the error and try again.
    Retry,
}

/// Classifies an HTTP status code. Pure function of the code.
#[must_use]
pub const fn classify_status(status: u16) -> Decision {
    if status < 300 {
        Decision::Succeed
    } else if status >= 500 || status == 424 {
        Decision::Retry
    } else {
        Decision::Fail
    }
}

/// Classifies a failed physical exchange.
///
/// A timed out write is never retried since its side effect is unknown.
/// Other timeouts and connection failures are retried; anything else (a
/// malformed request, a redirect loop) fails.
#[must_use]
pub fn classify_network_failure(method: &Method, timed_out: bool, transient: bool) -> Decision {
    if timed_out && !method.is_safe() {
        Decision::Fail
    } else if timed_out || transient {
        Decision::Retry
    } else {
        Decision::Fail
    }
}

/// Descriptor of one logical API call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Operation<B = ()> {
    uri: String,
    method: Method,
    body: Option<B>,
    skip_completion: bool,
}

impl Operation {
    /// Operation without a body. Safe methods skip completion tracking.
    #[must_use]
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        let skip_completion = method.is_safe();
        Self {
            uri: uri.into(),
            method,
            body: None,
            skip_completion,
        }
    }

    /// `GET` request; never tracked.
    #[must_use]
    pub fn get(uri: impl Into<String>) -> Self {
        Self::new(Method::GET, uri)
    }

    /// `DELETE` request.
    #[must_use]
    pub fn delete(uri: impl Into<String>) -> Self {
        Self::new(Method::DELETE, uri)
    }
}

impl<B> Operation<B> {
    /// `POST` request carrying `body`.
    #[must_use]
    pub fn post(uri: impl Into<String>, body: B) -> Self {
        Operation::<()>::new(Method::POST, uri).with_body(body)
    }

    /// `PATCH` request carrying `body`.
    #[must_use]
    pub fn patch(uri: impl Into<String>, body: B) -> Self {
        Operation::<()>::new(Method::PATCH, uri).with_body(body)
    }

    /// Replaces the body.
    #[must_use]
    pub fn with_body<C>(self, body: C) -> Operation<C> {
        Operation {
            uri: self.uri,
            method: self.method,
            body: Some(body),
            skip_completion: self.skip_completion,
        }
    }

    /// Marks the call as completed inline by the server.
    #[must_use]
    pub fn skip_completion(mut self) -> Self {
        self.skip_completion = true;
        self
    }

    /// Target URI relative to the client base URL.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Whether completion tracking is skipped.
    #[must_use]
    pub const fn skips_completion(&self) -> bool {
        self.skip_completion
    }
}

/// Successful physical exchange.
#[derive(Debug)]
pub(crate) struct RawResponse {
    pub(crate) body: Vec<u8>,
    pub(crate) request_id: String,
}

impl Client {
    /// Executes `operation` and decodes the response body into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] for encoding, network, server, decode, context and
    /// asynchronous completion failures.
    pub async fn execute<B, T>(&self, ctx: &CallContext, operation: Operation<B>) -> Result<T, ApiError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let raw = self.send(ctx, &operation).await?;
        let output = serde_json::from_slice(&raw.body).map_err(|err| {
            warn!(error = %err, uri = operation.uri(), "failed to decode response body");
            ApiError::Decode(err.to_string())
        })?;
        self.complete(ctx, &operation, &raw.request_id).await?;
        Ok(output)
    }

    /// Executes `operation` and discards the response body.
    ///
    /// # Errors
    ///
    /// As for [`Client::execute`], minus decode failures.
    pub async fn execute_discard<B>(&self, ctx: &CallContext, operation: Operation<B>) -> Result<(), ApiError>
    where
        B: Serialize,
    {
        let raw = self.send(ctx, &operation).await?;
        self.complete(ctx, &operation, &raw.request_id).await
    }

    async fn complete<B>(
        &self,
        ctx: &CallContext,
        operation: &Operation<B>,
        request_id: &str,
    ) -> Result<(), ApiError> {
        if !self.config.synchronous || operation.skip_completion {
            return Ok(());
        }
        if request_id.is_empty() {
            warn!(
                method = %operation.method,
                uri = operation.uri(),
                "response carried no request id; skipping completion tracking"
            );
            return Ok(());
        }
        self.wait_for_request(ctx, request_id).await
    }

    /// Sends `operation` with retries but without completion tracking.
    pub(crate) async fn send<B>(&self, ctx: &CallContext, operation: &Operation<B>) -> Result<RawResponse, ApiError>
    where
        B: Serialize,
    {
        let body = operation
            .body
            .as_ref()
            .map(serde_json::to_vec)
            .transpose()
            .map_err(|err| ApiError::Encode(err.to_string()))?;
        let url = self.url(&operation.uri);
        let method = &operation.method;

        retry_with_limit(
            ctx,
            self.config.max_retries,
            self.config.delay_interval,
            |attempt| {
                let request = self.build_request(method, &url, body.as_deref());
                debug!(
                    %method,
                    url = %url,
                    attempt,
                    body_len = body.as_ref().map_or(0, Vec::len),
                    "sending request"
                );
                self.attempt(ctx, method, request)
            },
        )
        .await
        .map_err(ApiError::from)
    }

    fn build_request(&self, method: &Method, url: &str, body: Option<&[u8]>) -> RequestBuilder {
        let request = self
            .http
            .request(method.clone(), url)
            .header(USER_AGENT, &self.config.user_agent)
            .header(USER_ID_HEADER, &self.config.user_id)
            .header(TOKEN_HEADER, &self.config.token)
            .header(CONTENT_TYPE, JSON);
        match body {
            Some(bytes) => request.body(bytes.to_vec()),
            None => request,
        }
    }

    async fn attempt(
        &self,
        ctx: &CallContext,
        method: &Method,
        request: RequestBuilder,
    ) -> Attempt<RawResponse, ApiError> {
        if let Some(err) = ctx.err() {
            return Attempt::Stop(Err(err.into()));
        }
        let sent = tokio::select! {
            err = ctx.done() => return Attempt::Stop(Err(err.into())),
            result = request.send() => result,
        };
        let response = match sent {
            Ok(response) => response,
            Err(err) => return network_failure(ctx, method, &err),
        };

        let status = response.status().as_u16();
        let request_id = response
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        let body = match response.bytes().await {
            Ok(bytes) => bytes.to_vec(),
            Err(err) => {
                warn!(error = %err, "failed to read response body");
                return Attempt::Stop(Err(ApiError::Network {
                    message: err.to_string(),
                    timeout: err.is_timeout(),
                }));
            }
        };
        debug!(status, request_id = %request_id, "received response");

        match classify_status(status) {
            Decision::Succeed => Attempt::Stop(Ok(RawResponse { body, request_id })),
            Decision::Retry => {
                let err = RequestError::from_response(status, request_id, &body);
                debug!(status, "server reported a transient failure; retrying");
                Attempt::Continue(Some(err.into()))
            }
            Decision::Fail => {
                let err = RequestError::from_response(status, request_id, &body);
                warn!(
                    status,
                    title = %err.title,
                    description = %err.description,
                    request_id = %err.request_id,
                    "request rejected"
                );
                Attempt::Stop(Err(err.into()))
            }
        }
    }
}

fn network_failure(
    ctx: &CallContext,
    method: &Method,
    err: &reqwest::Error,
) -> Attempt<RawResponse, ApiError> {
    if let Some(context_err) = ctx.err() {
        return Attempt::Stop(Err(context_err.into()));
    }
    let failure = ApiError::Network {
        message: err.to_string(),
        timeout: err.is_timeout(),
    };
    let transient = err.is_connect() || err.is_request();
    match classify_network_failure(method, err.is_timeout(), transient) {
        Decision::Retry => {
            debug!(error = %err, "network failure; retrying");
            Attempt::Continue(Some(failure))
        }
        Decision::Succeed | Decision::Fail => {
            warn!(error = %err, %method, "network failure; not retrying");
            Attempt::Stop(Err(failure))
        }
    }
}
