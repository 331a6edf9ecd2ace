//! ISO images.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CreateResponse, ISOIMAGE_BASE, into_sorted};
use crate::client::{ApiFuture, Client, Operation, join_path, require_uuid};
use crate::context::CallContext;

/// An ISO image.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct IsoImage {
    /// Identifier.
    pub object_uuid: String,
    /// Display name.
    pub name: String,
    /// URL the image was downloaded from.
    pub source_url: String,
    /// Description.
    pub description: String,
    /// Version.
    pub version: String,
    /// Owned by the account rather than public.
    pub private: bool,
    /// Size in GB.
    pub capacity: u32,
    /// Object status.
    pub status: String,
    /// Location identifier.
    pub location_uuid: String,
    /// Location name.
    pub location_name: String,
    /// Labels.
    pub labels: Vec<String>,
    /// Current price.
    pub current_price: f64,
    /// Creation time.
    #[serde(with = "crate::timestamp::option")]
    pub create_time: Option<DateTime<Utc>>,
    /// Last change.
    #[serde(with = "crate::timestamp::option")]
    pub change_time: Option<DateTime<Utc>>,
}

/// Body of an ISO image create call.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct IsoImageCreateRequest {
    /// Display name.
    pub name: String,
    /// URL to download the image from.
    pub source_url: String,
    /// Labels.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

/// Body of an ISO image update call.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct IsoImageUpdateRequest {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct IsoImageList {
    #[serde(default)]
    isoimages: BTreeMap<String, IsoImage>,
}

#[derive(Deserialize)]
struct IsoImageEnvelope {
    isoimage: IsoImage,
}

/// Operations on ISO images.
pub trait IsoImageOperations {
    /// Lists images ordered by identifier.
    fn list_isoimages<'a>(&'a self, ctx: &'a CallContext) -> ApiFuture<'a, Vec<IsoImage>>;

    /// Fetches one image.
    fn get_isoimage<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, IsoImage>;

    /// Imports an image from a URL.
    fn create_isoimage<'a>(
        &'a self,
        ctx: &'a CallContext,
        request: IsoImageCreateRequest,
    ) -> ApiFuture<'a, CreateResponse>;

    /// Updates an image.
    fn update_isoimage<'a>(
        &'a self,
        ctx: &'a CallContext,
        id: &'a str,
        request: IsoImageUpdateRequest,
    ) -> ApiFuture<'a, ()>;

    /// Deletes an image.
    fn delete_isoimage<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, ()>;
}

impl IsoImageOperations for Client {
    fn list_isoimages<'a>(&'a self, ctx: &'a CallContext) -> ApiFuture<'a, Vec<IsoImage>> {
        Box::pin(async move {
            let list: IsoImageList = self.execute(ctx, Operation::get(ISOIMAGE_BASE)).await?;
            Ok(into_sorted(list.isoimages))
        })
    }

    fn get_isoimage<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, IsoImage> {
        Box::pin(async move {
            require_uuid(id, "id")?;
            let envelope: IsoImageEnvelope = self
                .execute(ctx, Operation::get(join_path(ISOIMAGE_BASE, &[id])))
                .await?;
            Ok(envelope.isoimage)
        })
    }

    fn create_isoimage<'a>(
        &'a self,
        ctx: &'a CallContext,
        request: IsoImageCreateRequest,
    ) -> ApiFuture<'a, CreateResponse> {
        Box::pin(async move {
            self.execute(ctx, Operation::post(ISOIMAGE_BASE, request))
                .await
        })
    }

    fn update_isoimage<'a>(
        &'a self,
        ctx: &'a CallContext,
        id: &'a str,
        request: IsoImageUpdateRequest,
    ) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            require_uuid(id, "id")?;
            self.execute_discard(ctx, Operation::patch(join_path(ISOIMAGE_BASE, &[id]), request))
                .await
        })
    }

    fn delete_isoimage<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            require_uuid(id, "id")?;
            self.execute_discard(ctx, Operation::delete(join_path(ISOIMAGE_BASE, &[id])))
                .await
        })
    }
}
