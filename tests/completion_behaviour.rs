//! Behavioural scenarios for completion tracking of asynchronous requests.

#[path = "common/mock_api.rs"]
mod mock_api;
#[path = "common/sequence.rs"]
mod sequence;
#[path = "common/test_constants.rs"]
mod test_constants;

mod completion;
