//! Labels in use across the account.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{LABEL_BASE, into_sorted};
use crate::client::{ApiFuture, Client, Operation};
use crate::context::CallContext;

/// A label.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct Label {
    /// Label text.
    pub label: String,
    /// Object status.
    pub status: String,
    /// Creation time.
    #[serde(with = "crate::timestamp::option")]
    pub create_time: Option<DateTime<Utc>>,
    /// Last change.
    #[serde(with = "crate::timestamp::option")]
    pub change_time: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct LabelList {
    #[serde(default)]
    labels: BTreeMap<String, Label>,
}

/// Read access to labels.
pub trait LabelOperations {
    /// Lists labels ordered by key.
    fn list_labels<'a>(&'a self, ctx: &'a CallContext) -> ApiFuture<'a, Vec<Label>>;
}

impl LabelOperations for Client {
    fn list_labels<'a>(&'a self, ctx: &'a CallContext) -> ApiFuture<'a, Vec<Label>> {
        Box::pin(async move {
            let list: LabelList = self.execute(ctx, Operation::get(LABEL_BASE)).await?;
            Ok(into_sorted(list.labels))
        })
    }
}
