//! Data centre locations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{LOCATION_BASE, into_sorted};
use crate::client::{ApiFuture, Client, Operation, join_path, require_uuid};
use crate::context::CallContext;

/// A location.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct Location {
    /// Identifier.
    pub object_uuid: String,
    /// Display name.
    pub name: String,
    /// IATA airport code of the nearest airport.
    pub iata: String,
    /// Country code.
    pub country: String,
    /// Object status.
    pub status: String,
    /// Labels.
    pub labels: Vec<String>,
}

#[derive(Deserialize)]
struct LocationList {
    #[serde(default)]
    locations: BTreeMap<String, Location>,
}

#[derive(Deserialize)]
struct LocationEnvelope {
    location: Location,
}

/// Read access to locations.
pub trait LocationOperations {
    /// Lists locations ordered by identifier.
    fn list_locations<'a>(&'a self, ctx: &'a CallContext) -> ApiFuture<'a, Vec<Location>>;

    /// Fetches one location.
    fn get_location<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, Location>;
}

impl LocationOperations for Client {
    fn list_locations<'a>(&'a self, ctx: &'a CallContext) -> ApiFuture<'a, Vec<Location>> {
        Box::pin(async move {
            let list: LocationList = self.execute(ctx, Operation::get(LOCATION_BASE)).await?;
            Ok(into_sorted(list.locations))
        })
    }

    fn get_location<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, Location> {
        Box::pin(async move {
            require_uuid(id, "id")?;
            let envelope: LocationEnvelope = self
                .execute(ctx, Operation::get(join_path(LOCATION_BASE, &[id])))
                .await?;
            Ok(envelope.location)
        })
    }
}
