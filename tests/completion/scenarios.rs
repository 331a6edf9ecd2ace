//! BDD scenarios for request completion tracking.

use rstest_bdd_macros::scenario;

use super::test_helpers::{CompletionContext, completion_context};

#[scenario(
    path = "tests/features/completion.feature",
    name = "Wait until a pending request is done"
)]
fn scenario_request_done(completion_context: CompletionContext) {
    drop(completion_context);
}

#[scenario(
    path = "tests/features/completion.feature",
    name = "Surface a request that failed on the platform"
)]
fn scenario_request_failed(completion_context: CompletionContext) {
    drop(completion_context);
}

#[scenario(
    path = "tests/features/completion.feature",
    name = "Keep polling through unknown states"
)]
fn scenario_unknown_states(completion_context: CompletionContext) {
    drop(completion_context);
}

#[scenario(
    path = "tests/features/completion.feature",
    name = "Stop polling when the status lookup is rejected"
)]
fn scenario_lookup_rejected(completion_context: CompletionContext) {
    drop(completion_context);
}

#[scenario(
    path = "tests/features/completion.feature",
    name = "Give up when the deadline passes"
)]
fn scenario_deadline(completion_context: CompletionContext) {
    drop(completion_context);
}
