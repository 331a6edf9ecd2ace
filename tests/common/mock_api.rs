//! Client construction against a `wiremock` server.

use std::time::Duration;

use gscloud::{Client, ClientConfig};
use wiremock::MockServer;

use crate::test_constants::{TOKEN, USER_ID};

/// Retry and polling delay used by HTTP scenarios.
pub const DELAY: Duration = Duration::from_millis(20);

/// Synchronous client pointed at `server` with a short delay.
pub fn client_for(server: &MockServer, max_retries: u32) -> Client {
    let config = ClientConfig::new(USER_ID, TOKEN)
        .base_url(server.uri())
        .delay_interval(DELAY)
        .max_retries(max_retries);
    Client::new(config).unwrap_or_else(|err| panic!("client should build: {err}"))
}
