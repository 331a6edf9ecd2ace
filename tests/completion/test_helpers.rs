//! Shared fixtures for completion tracking scenarios.

use std::sync::Arc;

use gscloud::ApiError;
use rstest::fixture;
use thiserror::Error;
use tokio::runtime::Runtime;
use wiremock::MockServer;

/// Path polled for the scenario request.
pub const STATUS_PATH: &str = "/requests/req-1";

#[derive(Clone)]
pub struct CompletionContext {
    pub server: Arc<MockServer>,
    pub runtime: Arc<Runtime>,
    pub outcome: Option<Result<(), ApiError>>,
}

#[derive(Debug, Error)]
pub enum CompletionTestError {
    #[error("failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

impl CompletionContext {
    fn new() -> Result<Self, CompletionTestError> {
        let runtime = Runtime::new()?;
        let server = runtime.block_on(MockServer::start());
        Ok(Self {
            server: Arc::new(server),
            runtime: Arc::new(runtime),
            outcome: None,
        })
    }

    /// Number of status polls the mock server has seen.
    pub fn polls(&self) -> usize {
        self.runtime
            .block_on(self.server.received_requests())
            .unwrap_or_default()
            .iter()
            .filter(|request| request.url.path() == STATUS_PATH)
            .count()
    }
}

#[fixture]
pub fn completion_context_result() -> Result<CompletionContext, CompletionTestError> {
    CompletionContext::new()
}

#[fixture]
pub fn completion_context(
    completion_context_result: Result<CompletionContext, CompletionTestError>,
) -> CompletionContext {
    completion_context_result
        .unwrap_or_else(|err| panic!("completion context fixture should initialise: {err}"))
}
