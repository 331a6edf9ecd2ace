//! BDD step definitions for request completion tracking.

use std::time::Duration;

use gscloud::CallContext;
use rstest_bdd_macros::{given, then, when};
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

use super::test_helpers::{CompletionContext, STATUS_PATH};
use crate::mock_api::client_for;
use crate::sequence::{Sequence, status_body};
use crate::test_constants::REQUEST_ID;

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
}

fn mount(context: &CompletionContext, responses: Vec<ResponseTemplate>) {
    context.runtime.block_on(
        Mock::given(method("GET"))
            .and(path(STATUS_PATH))
            .respond_with(Sequence::new(responses))
            .mount(&context.server),
    );
}

#[given("the request status answers \"{states}\"")]
fn status_answers(completion_context: CompletionContext, states: String) -> CompletionContext {
    let responses = states
        .split(',')
        .map(str::trim)
        .map(|state| {
            let message = if state == "failed" { "quota exceeded" } else { "" };
            ResponseTemplate::new(200).set_body_json(status_body(REQUEST_ID, state, message))
        })
        .collect();
    mount(&completion_context, responses);
    completion_context
}

#[given("the request status is rejected with HTTP {code}")]
fn status_rejected(completion_context: CompletionContext, code: u16) -> CompletionContext {
    mount(&completion_context, vec![ResponseTemplate::new(code)]);
    completion_context
}

#[when("I wait for the request")]
fn wait_for_request(completion_context: CompletionContext) -> CompletionContext {
    let client = client_for(&completion_context.server, 0);
    let ctx = CallContext::background();
    let outcome = completion_context
        .runtime
        .block_on(client.wait_for_request(&ctx, REQUEST_ID));
    CompletionContext {
        outcome: Some(outcome),
        ..completion_context
    }
}

#[when("I wait for the request for at most {millis} milliseconds")]
fn wait_with_deadline(completion_context: CompletionContext, millis: u64) -> CompletionContext {
    let client = client_for(&completion_context.server, 0);
    let outcome = completion_context.runtime.block_on(client.wait_with_timeout(
        REQUEST_ID,
        Duration::from_millis(millis),
        Duration::from_millis(20),
    ));
    CompletionContext {
        outcome: Some(outcome),
        ..completion_context
    }
}

#[then("waiting succeeds")]
fn waiting_succeeds(completion_context: &CompletionContext) -> Result<(), StepError> {
    match &completion_context.outcome {
        Some(Ok(())) => Ok(()),
        Some(Err(err)) => Err(StepError::Assertion(format!(
            "expected success, got error: {err}"
        ))),
        None => Err(StepError::Assertion(String::from("missing outcome"))),
    }
}

#[then("waiting fails with \"{text}\"")]
fn waiting_fails(completion_context: &CompletionContext, text: String) -> Result<(), StepError> {
    let Some(Err(err)) = &completion_context.outcome else {
        return Err(StepError::Assertion(String::from(
            "expected failure outcome",
        )));
    };
    let message = err.to_string();
    if message.contains(&text) {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected error containing '{text}', got: {message}"
        )))
    }
}

#[then("the request status was polled {count} times")]
fn polled_times(completion_context: &CompletionContext, count: usize) -> Result<(), StepError> {
    let polls = completion_context.polls();
    if polls == count {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {count} polls, got {polls}"
        )))
    }
}
