//! SSH public keys.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CreateResponse, SSHKEY_BASE, into_sorted};
use crate::client::{ApiFuture, Client, Operation, join_path, require_uuid};
use crate::context::CallContext;

/// An SSH public key.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct SshKey {
    /// Identifier.
    pub object_uuid: String,
    /// Display name.
    pub name: String,
    /// Object status.
    pub status: String,
    /// The public key.
    pub sshkey: String,
    /// Labels.
    pub labels: Vec<String>,
    /// Owner.
    pub user_uuid: String,
    /// Creation time.
    #[serde(with = "crate::timestamp::option")]
    pub create_time: Option<DateTime<Utc>>,
    /// Last change.
    #[serde(with = "crate::timestamp::option")]
    pub change_time: Option<DateTime<Utc>>,
}

/// Body of an SSH key create call.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct SshKeyCreateRequest {
    /// Display name.
    pub name: String,
    /// The public key.
    pub sshkey: String,
    /// Labels.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

/// Body of an SSH key update call.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct SshKeyUpdateRequest {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New key material.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sshkey: Option<String>,
    /// New labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct SshKeyList {
    #[serde(default)]
    sshkeys: BTreeMap<String, SshKey>,
}

#[derive(Deserialize)]
struct SshKeyEnvelope {
    sshkey: SshKey,
}

/// Operations on SSH keys.
pub trait SshKeyOperations {
    /// Lists keys ordered by identifier.
    fn list_sshkeys<'a>(&'a self, ctx: &'a CallContext) -> ApiFuture<'a, Vec<SshKey>>;

    /// Fetches one key.
    fn get_sshkey<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, SshKey>;

    /// Uploads a key.
    fn create_sshkey<'a>(
        &'a self,
        ctx: &'a CallContext,
        request: SshKeyCreateRequest,
    ) -> ApiFuture<'a, CreateResponse>;

    /// Updates a key.
    fn update_sshkey<'a>(
        &'a self,
        ctx: &'a CallContext,
        id: &'a str,
        request: SshKeyUpdateRequest,
    ) -> ApiFuture<'a, ()>;

    /// Deletes a key.
    fn delete_sshkey<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, ()>;
}

impl SshKeyOperations for Client {
    fn list_sshkeys<'a>(&'a self, ctx: &'a CallContext) -> ApiFuture<'a, Vec<SshKey>> {
        Box::pin(async move {
            let list: SshKeyList = self.execute(ctx, Operation::get(SSHKEY_BASE)).await?;
            Ok(into_sorted(list.sshkeys))
        })
    }

    fn get_sshkey<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, SshKey> {
        Box::pin(async move {
            require_uuid(id, "id")?;
            let envelope: SshKeyEnvelope = self
                .execute(ctx, Operation::get(join_path(SSHKEY_BASE, &[id])))
                .await?;
            Ok(envelope.sshkey)
        })
    }

    fn create_sshkey<'a>(
        &'a self,
        ctx: &'a CallContext,
        request: SshKeyCreateRequest,
    ) -> ApiFuture<'a, CreateResponse> {
        Box::pin(async move { self.execute(ctx, Operation::post(SSHKEY_BASE, request)).await })
    }

    fn update_sshkey<'a>(
        &'a self,
        ctx: &'a CallContext,
        id: &'a str,
        request: SshKeyUpdateRequest,
    ) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            require_uuid(id, "id")?;
            self.execute_discard(ctx, Operation::patch(join_path(SSHKEY_BASE, &[id]), request))
                .await
        })
    }

    fn delete_sshkey<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            require_uuid(id, "id")?;
            self.execute_discard(ctx, Operation::delete(join_path(SSHKEY_BASE, &[id])))
                .await
        })
    }
}
