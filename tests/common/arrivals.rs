//! `wiremock` responder that notes when each matching request arrived.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use wiremock::{Request, Respond, ResponseTemplate};

/// Arrival times shared between a mock and the test body.
#[derive(Clone, Default)]
pub struct Arrivals(Arc<Mutex<Vec<Instant>>>);

impl Arrivals {
    /// Wraps `inner` so every answered request is timestamped first.
    pub fn record<R: Respond>(&self, inner: R) -> Timed<R> {
        Timed {
            inner,
            arrivals: self.clone(),
        }
    }

    /// Time between consecutive arrivals.
    pub fn gaps(&self) -> Vec<Duration> {
        let times = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        times
            .windows(2)
            .filter_map(|pair| match pair {
                [earlier, later] => Some(later.duration_since(*earlier)),
                _ => None,
            })
            .collect()
    }
}

/// Responder produced by [`Arrivals::record`].
pub struct Timed<R> {
    inner: R,
    arrivals: Arrivals,
}

impl<R: Respond> Respond for Timed<R> {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        self.arrivals
            .0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Instant::now());
        self.inner.respond(request)
    }
}
