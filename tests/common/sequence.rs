//! `wiremock` responder that plays back a fixed sequence of responses.

use std::sync::atomic::{AtomicUsize, Ordering};

use wiremock::{Request, Respond, ResponseTemplate};

/// Answers the n-th matching request with the n-th template. Requests past
/// the end of the sequence get the last template again.
pub struct Sequence {
    responses: Vec<ResponseTemplate>,
    served: AtomicUsize,
}

impl Sequence {
    pub fn new(responses: Vec<ResponseTemplate>) -> Self {
        assert!(!responses.is_empty(), "sequence needs at least one response");
        Self {
            responses,
            served: AtomicUsize::new(0),
        }
    }
}

impl Respond for Sequence {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let index = self.served.fetch_add(1, Ordering::SeqCst);
        let last = self.responses.len() - 1;
        self.responses
            .get(index.min(last))
            .cloned()
            .unwrap_or_else(|| ResponseTemplate::new(500))
    }
}

/// Status record body for `request_id` in `status`.
pub fn status_body(request_id: &str, status: &str, message: &str) -> serde_json::Value {
    serde_json::json!({
        request_id: {
            "status": status,
            "message": message,
            "create_time": "2024-03-01T10:00:00Z",
        }
    })
}
