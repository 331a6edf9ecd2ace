//! S3-compatible object storage: access keys and buckets.

use serde::{Deserialize, Serialize};

use super::{EmptyBody, OBJECTSTORAGE_BASE};
use crate::client::{ApiError, ApiFuture, Client, Operation, join_path};
use crate::context::CallContext;

/// An object storage access key pair.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct ObjectStorageAccessKey {
    /// Secret half; only shown at creation.
    pub secret_key: String,
    /// Public half, also the key identifier.
    pub access_key: String,
    /// Owning user.
    pub user: String,
}

/// Response to an access key create call.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct ObjectStorageAccessKeyCreateResponse {
    /// The new key pair.
    pub access_key: ObjectStorageAccessKey,
    /// Identifier of the asynchronous request.
    pub request_uuid: String,
}

/// A bucket.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct ObjectStorageBucket {
    /// Bucket name.
    pub name: String,
    /// Space used.
    pub usage: BucketUsage,
}

/// Space used by a bucket.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct BucketUsage {
    /// Size in KB.
    pub size_kb: u64,
    /// Object count.
    pub num_objects: u64,
}

#[derive(Deserialize)]
struct AccessKeyList {
    #[serde(default)]
    access_keys: Vec<ObjectStorageAccessKey>,
}

#[derive(Deserialize)]
struct BucketList {
    #[serde(default)]
    buckets: Vec<ObjectStorageBucket>,
}

/// Operations on object storage.
pub trait ObjectStorageOperations {
    /// Lists access keys.
    fn list_access_keys<'a>(
        &'a self,
        ctx: &'a CallContext,
    ) -> ApiFuture<'a, Vec<ObjectStorageAccessKey>>;

    /// Creates an access key pair.
    fn create_access_key<'a>(
        &'a self,
        ctx: &'a CallContext,
    ) -> ApiFuture<'a, ObjectStorageAccessKeyCreateResponse>;

    /// Deletes an access key.
    fn delete_access_key<'a>(&'a self, ctx: &'a CallContext, access_key: &'a str)
    -> ApiFuture<'a, ()>;

    /// Lists buckets.
    fn list_buckets<'a>(&'a self, ctx: &'a CallContext)
    -> ApiFuture<'a, Vec<ObjectStorageBucket>>;
}

impl ObjectStorageOperations for Client {
    fn list_access_keys<'a>(
        &'a self,
        ctx: &'a CallContext,
    ) -> ApiFuture<'a, Vec<ObjectStorageAccessKey>> {
        Box::pin(async move {
            let uri = join_path(OBJECTSTORAGE_BASE, &["access_keys"]);
            let list: AccessKeyList = self.execute(ctx, Operation::get(uri)).await?;
            Ok(list.access_keys)
        })
    }

    fn create_access_key<'a>(
        &'a self,
        ctx: &'a CallContext,
    ) -> ApiFuture<'a, ObjectStorageAccessKeyCreateResponse> {
        Box::pin(async move {
            let uri = join_path(OBJECTSTORAGE_BASE, &["access_keys"]);
            self.execute(ctx, Operation::post(uri, EmptyBody {})).await
        })
    }

    fn delete_access_key<'a>(
        &'a self,
        ctx: &'a CallContext,
        access_key: &'a str,
    ) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            // Access keys are not UUIDs; only reject values that would escape the path.
            if access_key.trim().is_empty() || access_key.contains('/') {
                return Err(ApiError::InvalidArgument("'access_key' is invalid".to_owned()));
            }
            let uri = join_path(OBJECTSTORAGE_BASE, &["access_keys", access_key]);
            self.execute_discard(ctx, Operation::delete(uri)).await
        })
    }

    fn list_buckets<'a>(
        &'a self,
        ctx: &'a CallContext,
    ) -> ApiFuture<'a, Vec<ObjectStorageBucket>> {
        Box::pin(async move {
            let uri = join_path(OBJECTSTORAGE_BASE, &["buckets"]);
            let list: BucketList = self.execute(ctx, Operation::get(uri)).await?;
            Ok(list.buckets)
        })
    }
}
