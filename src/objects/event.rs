//! Event log entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::EVENT_BASE;
use crate::client::{ApiFuture, Client, Operation};
use crate::context::CallContext;

/// One entry of an event log.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct Event {
    /// Kind of object the event concerns.
    pub object_type: String,
    /// Request that caused the event.
    pub request_uuid: String,
    /// Object the event concerns.
    pub object_uuid: String,
    /// Activity performed.
    pub activity: String,
    /// Request type, for example `PATCH`.
    pub request_type: String,
    /// Outcome of the request.
    pub request_status: String,
    /// Summary of the change.
    pub change: String,
    /// When the event happened.
    #[serde(with = "crate::timestamp::option")]
    pub timestamp: Option<DateTime<Utc>>,
    /// User who triggered the request.
    pub user_uuid: String,
    /// Display name of the initiator.
    pub initiator: String,
}

#[derive(Deserialize)]
pub(crate) struct EventList {
    #[serde(default)]
    pub(crate) events: Vec<Event>,
}

/// Account-wide event log.
pub trait EventOperations {
    /// Lists every event of the account.
    fn list_events<'a>(&'a self, ctx: &'a CallContext) -> ApiFuture<'a, Vec<Event>>;
}

impl EventOperations for Client {
    fn list_events<'a>(&'a self, ctx: &'a CallContext) -> ApiFuture<'a, Vec<Event>> {
        Box::pin(async move {
            let list: EventList = self.execute(ctx, Operation::get(EVENT_BASE)).await?;
            Ok(list.events)
        })
    }
}
