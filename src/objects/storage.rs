//! Block storages.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CreateResponse, EmptyBody, STORAGE_BASE, into_sorted};
use crate::client::{ApiFuture, Client, Operation, join_path, require_uuid};
use crate::context::CallContext;
use crate::types::{PasswordType, StorageType};

/// A storage.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Storage {
    /// Identifier.
    pub object_uuid: String,
    /// Display name.
    pub name: String,
    /// Capacity in GB.
    pub capacity: u32,
    /// Performance class.
    #[serde(default, deserialize_with = "crate::types::lenient")]
    pub storage_type: Option<StorageType>,
    /// Object status.
    pub status: String,
    /// Location identifier.
    pub location_uuid: String,
    /// Location name.
    pub location_name: String,
    /// Storage this one was cloned from.
    pub parent_uuid: String,
    /// Template the storage was last provisioned with.
    pub last_used_template: String,
    /// Current price.
    pub current_price: f64,
    /// Labels.
    pub labels: Vec<String>,
    /// Creation time.
    #[serde(with = "crate::timestamp::option")]
    pub create_time: Option<DateTime<Utc>>,
    /// Last change.
    #[serde(with = "crate::timestamp::option")]
    pub change_time: Option<DateTime<Utc>>,
}

/// Template provisioning parameters of a new storage.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct StorageTemplate {
    /// Template to provision from.
    pub template_uuid: String,
    /// Root password.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// How `password` is encoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_type: Option<PasswordType>,
    /// Host name of the provisioned system.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// SSH keys to install.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sshkeys: Vec<String>,
}

/// Body of a storage create call.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct StorageCreateRequest {
    /// Capacity in GB.
    pub capacity: u32,
    /// Display name.
    pub name: String,
    /// Performance class.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_type: Option<StorageType>,
    /// Template provisioning.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<StorageTemplate>,
    /// Labels.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

/// Body of a storage update call.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct StorageUpdateRequest {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    /// New capacity in GB; storages only grow.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
}

#[derive(Deserialize)]
struct StorageList {
    #[serde(default)]
    storages: BTreeMap<String, Storage>,
}

#[derive(Deserialize)]
struct StorageEnvelope {
    storage: Storage,
}

/// Operations on storages.
pub trait StorageOperations {
    /// Lists storages ordered by identifier.
    fn list_storages<'a>(&'a self, ctx: &'a CallContext) -> ApiFuture<'a, Vec<Storage>>;

    /// Fetches one storage.
    fn get_storage<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, Storage>;

    /// Creates a storage.
    fn create_storage<'a>(
        &'a self,
        ctx: &'a CallContext,
        request: StorageCreateRequest,
    ) -> ApiFuture<'a, CreateResponse>;

    /// Updates a storage.
    fn update_storage<'a>(
        &'a self,
        ctx: &'a CallContext,
        id: &'a str,
        request: StorageUpdateRequest,
    ) -> ApiFuture<'a, ()>;

    /// Deletes a storage.
    fn delete_storage<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, ()>;

    /// Clones a storage.
    fn clone_storage<'a>(
        &'a self,
        ctx: &'a CallContext,
        id: &'a str,
    ) -> ApiFuture<'a, CreateResponse>;
}

impl StorageOperations for Client {
    fn list_storages<'a>(&'a self, ctx: &'a CallContext) -> ApiFuture<'a, Vec<Storage>> {
        Box::pin(async move {
            let list: StorageList = self.execute(ctx, Operation::get(STORAGE_BASE)).await?;
            Ok(into_sorted(list.storages))
        })
    }

    fn get_storage<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, Storage> {
        Box::pin(async move {
            require_uuid(id, "id")?;
            let envelope: StorageEnvelope = self
                .execute(ctx, Operation::get(join_path(STORAGE_BASE, &[id])))
                .await?;
            Ok(envelope.storage)
        })
    }

    fn create_storage<'a>(
        &'a self,
        ctx: &'a CallContext,
        request: StorageCreateRequest,
    ) -> ApiFuture<'a, CreateResponse> {
        Box::pin(async move {
            self.execute(ctx, Operation::post(STORAGE_BASE, request))
                .await
        })
    }

    fn update_storage<'a>(
        &'a self,
        ctx: &'a CallContext,
        id: &'a str,
        request: StorageUpdateRequest,
    ) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            require_uuid(id, "id")?;
            self.execute_discard(ctx, Operation::patch(join_path(STORAGE_BASE, &[id]), request))
                .await
        })
    }

    fn delete_storage<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            require_uuid(id, "id")?;
            self.execute_discard(ctx, Operation::delete(join_path(STORAGE_BASE, &[id])))
                .await
        })
    }

    fn clone_storage<'a>(
        &'a self,
        ctx: &'a CallContext,
        id: &'a str,
    ) -> ApiFuture<'a, CreateResponse> {
        Box::pin(async move {
            require_uuid(id, "id")?;
            self.execute(
                ctx,
                Operation::post(join_path(STORAGE_BASE, &[id, "clone"]), EmptyBody {}),
            )
            .await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_request_omits_unset_fields() {
        let request = StorageCreateRequest {
            capacity: 10,
            name: "boot".to_owned(),
            storage_type: Some(StorageType::Storage),
            template: Some(StorageTemplate {
                template_uuid: "t-1".to_owned(),
                password: Some("secret".to_owned()),
                password_type: Some(PasswordType::Plain),
                ..StorageTemplate::default()
            }),
            labels: Vec::new(),
        };
        let encoded = serde_json::to_value(&request).unwrap_or_else(|err| panic!("encode: {err}"));
        assert_eq!(
            encoded,
            serde_json::json!({
                "capacity": 10,
                "name": "boot",
                "storage_type": "storage",
                "template": {"template_uuid": "t-1", "password": "secret", "password_type": "plain"}
            })
        );
    }
}
