//! Private and public networks.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CreateResponse, NETWORK_BASE, into_sorted};
use crate::client::{ApiError, ApiFuture, Client, Operation, join_path, require_uuid};
use crate::context::CallContext;

/// A network.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct Network {
    /// Identifier.
    pub object_uuid: String,
    /// Display name.
    pub name: String,
    /// Whether this is the public network.
    pub public_net: bool,
    /// Network type.
    pub network_type: String,
    /// Layer 2 security.
    pub l2security: bool,
    /// Object status.
    pub status: String,
    /// Location identifier.
    pub location_uuid: String,
    /// Location name.
    pub location_name: String,
    /// Protected against deletion.
    pub delete_block: bool,
    /// Labels.
    pub labels: Vec<String>,
    /// Creation time.
    #[serde(with = "crate::timestamp::option")]
    pub create_time: Option<DateTime<Utc>>,
    /// Last change.
    #[serde(with = "crate::timestamp::option")]
    pub change_time: Option<DateTime<Utc>>,
}

/// Body of a network create call.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct NetworkCreateRequest {
    /// Display name.
    pub name: String,
    /// Labels.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    /// Layer 2 security.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub l2security: bool,
}

/// Body of a network update call.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct NetworkUpdateRequest {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New layer 2 security setting.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub l2security: Option<bool>,
    /// New labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct NetworkList {
    #[serde(default)]
    networks: BTreeMap<String, Network>,
}

#[derive(Deserialize)]
struct NetworkEnvelope {
    network: Network,
}

/// Operations on networks.
pub trait NetworkOperations {
    /// Lists networks ordered by identifier.
    fn list_networks<'a>(&'a self, ctx: &'a CallContext) -> ApiFuture<'a, Vec<Network>>;

    /// Fetches one network.
    fn get_network<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, Network>;

    /// Creates a network.
    fn create_network<'a>(
        &'a self,
        ctx: &'a CallContext,
        request: NetworkCreateRequest,
    ) -> ApiFuture<'a, CreateResponse>;

    /// Updates a network.
    fn update_network<'a>(
        &'a self,
        ctx: &'a CallContext,
        id: &'a str,
        request: NetworkUpdateRequest,
    ) -> ApiFuture<'a, ()>;

    /// Deletes a network.
    fn delete_network<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, ()>;

    /// Finds the public network of the account.
    fn public_network<'a>(&'a self, ctx: &'a CallContext) -> ApiFuture<'a, Network>;
}

impl NetworkOperations for Client {
    fn list_networks<'a>(&'a self, ctx: &'a CallContext) -> ApiFuture<'a, Vec<Network>> {
        Box::pin(async move {
            let list: NetworkList = self.execute(ctx, Operation::get(NETWORK_BASE)).await?;
            Ok(into_sorted(list.networks))
        })
    }

    fn get_network<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, Network> {
        Box::pin(async move {
            require_uuid(id, "id")?;
            let envelope: NetworkEnvelope = self
                .execute(ctx, Operation::get(join_path(NETWORK_BASE, &[id])))
                .await?;
            Ok(envelope.network)
        })
    }

    fn create_network<'a>(
        &'a self,
        ctx: &'a CallContext,
        request: NetworkCreateRequest,
    ) -> ApiFuture<'a, CreateResponse> {
        Box::pin(async move {
            self.execute(ctx, Operation::post(NETWORK_BASE, request))
                .await
        })
    }

    fn update_network<'a>(
        &'a self,
        ctx: &'a CallContext,
        id: &'a str,
        request: NetworkUpdateRequest,
    ) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            require_uuid(id, "id")?;
            self.execute_discard(ctx, Operation::patch(join_path(NETWORK_BASE, &[id]), request))
                .await
        })
    }

    fn delete_network<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            require_uuid(id, "id")?;
            self.execute_discard(ctx, Operation::delete(join_path(NETWORK_BASE, &[id])))
                .await
        })
    }

    fn public_network<'a>(&'a self, ctx: &'a CallContext) -> ApiFuture<'a, Network> {
        Box::pin(async move {
            self.list_networks(ctx)
                .await?
                .into_iter()
                .find(|network| network.public_net)
                .ok_or_else(|| ApiError::NotFound("Public Network not found".to_owned()))
        })
    }
}
