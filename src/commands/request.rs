//! `gscloud request wait`.

use std::io::Write;
use std::time::Duration;

use tracing::info;

use super::{ApiContext, CommandError, Console};
use crate::client::Client;
use crate::client::tracker::STANDALONE_INTERVAL;

/// Blocks until the asynchronous request `request_id` finishes. Without a
/// `timeout` the client's standalone limits apply.
///
/// # Errors
///
/// Returns [`CommandError::Api`] when the request failed, the wait timed
/// out or polling failed.
pub async fn wait<O, E>(
    client: &Client,
    console: &mut Console<O, E>,
    request_id: &str,
    timeout: Option<Duration>,
) -> Result<(), CommandError>
where
    O: Write,
    E: Write,
{
    let outcome = match timeout {
        Some(limit) => {
            client
                .wait_with_timeout(request_id, limit, STANDALONE_INTERVAL)
                .await
        }
        None => client.wait_for_request_standalone(request_id).await,
    };
    outcome.context("Waiting for request failed")?;
    info!(request_id, "request finished");
    console.note(format!("Request {request_id} done"))
}
