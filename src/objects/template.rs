//! Operating system templates.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{TEMPLATE_BASE, into_sorted};
use crate::client::{ApiError, ApiFuture, Client, Operation, join_path, require_uuid};
use crate::context::CallContext;

/// A template storages can be provisioned from.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Template {
    /// Identifier.
    pub object_uuid: String,
    /// Display name, unique among public templates.
    pub name: String,
    /// Object status.
    pub status: String,
    /// Operating system family.
    pub ostype: String,
    /// Distribution version.
    pub version: String,
    /// Distribution name.
    pub distro: String,
    /// Description.
    pub description: String,
    /// Owned by the account rather than public.
    pub private: bool,
    /// Capacity in GB.
    pub capacity: u32,
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

#[derive(Deserialize)]
struct TemplateList {
    #[serde(default)]
    templates: BTreeMap<String, Template>,
}

#[derive(Deserialize)]
struct TemplateEnvelope {
    template: Template,
}

/// Operations on templates.
pub trait TemplateOperations {
    /// Lists templates ordered by identifier.
    fn list_templates<'a>(&'a self, ctx: &'a CallContext) -> ApiFuture<'a, Vec<Template>>;

    /// Fetches one template.
    fn get_template<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, Template>;

    /// Finds the template named exactly `name`.
    fn template_by_name<'a>(
        &'a self,
        ctx: &'a CallContext,
        name: &'a str,
    ) -> ApiFuture<'a, Template>;

    /// Deletes a private template.
    fn delete_template<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, ()>;
}

impl TemplateOperations for Client {
    fn list_templates<'a>(&'a self, ctx: &'a CallContext) -> ApiFuture<'a, Vec<Template>> {
        Box::pin(async move {
            let list: TemplateList = self.execute(ctx, Operation::get(TEMPLATE_BASE)).await?;
            Ok(into_sorted(list.templates))
        })
    }

    fn get_template<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, Template> {
        Box::pin(async move {
            require_uuid(id, "id")?;
            let envelope: TemplateEnvelope = self
                .execute(ctx, Operation::get(join_path(TEMPLATE_BASE, &[id])))
                .await?;
            Ok(envelope.template)
        })
    }

    fn template_by_name<'a>(
        &'a self,
        ctx: &'a CallContext,
        name: &'a str,
    ) -> ApiFuture<'a, Template> {
        Box::pin(async move {
            if name.trim().is_empty() {
                return Err(ApiError::InvalidArgument("'name' is empty".to_owned()));
            }
            self.list_templates(ctx)
                .await?
                .into_iter()
                .find(|template| template.name == name)
                .ok_or_else(|| ApiError::NotFound(format!("Template {name} not found")))
        })
    }

    fn delete_template<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            require_uuid(id, "id")?;
            self.execute_discard(ctx, Operation::delete(join_path(TEMPLATE_BASE, &[id])))
                .await
        })
    }
}
