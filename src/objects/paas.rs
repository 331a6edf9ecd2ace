//! Platform services, including managed Kubernetes clusters.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{EmptyBody, PAAS_BASE, into_sorted};
use crate::client::{ApiFuture, Client, Operation, join_path, require_uuid};
use crate::context::CallContext;

/// Template flavour of managed Kubernetes releases.
pub const KUBERNETES_FLAVOUR: &str = "kubernetes";

/// Template flavour of managed PostgreSQL releases.
pub const POSTGRES_FLAVOUR: &str = "postgres";

/// A platform service instance.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct PaaSService {
    /// Identifier.
    pub object_uuid: String,
    /// Display name.
    pub name: String,
    /// Labels.
    pub labels: Vec<String>,
    /// Access credentials.
    pub credentials: Vec<Credential>,
    /// Ports the service listens on, by name and address.
    pub listen_ports: BTreeMap<String, BTreeMap<String, u16>>,
    /// Security zone the service runs in.
    pub security_zone_uuid: String,
    /// Template the service was created from.
    pub service_template_uuid: String,
    /// Object status.
    pub status: String,
    /// Resource limits.
    pub resource_limits: Vec<ResourceLimit>,
    /// Template-specific parameters, kept as arbitrary JSON.
    pub parameters: Map<String, Value>,
    /// Creation time.
    #[serde(with = "crate::timestamp::option")]
    pub create_time: Option<DateTime<Utc>>,
    /// Last change.
    #[serde(with = "crate::timestamp::option")]
    pub change_time: Option<DateTime<Utc>>,
}

/// Service access credential.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct Credential {
    /// User name.
    pub username: String,
    /// Password.
    pub password: String,
    /// Credential kind.
    #[serde(rename = "type")]
    pub kind: String,
    /// Kubeconfig document for Kubernetes services.
    pub kubeconfig: String,
}

/// A resource limit of a service.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct ResourceLimit {
    /// Resource name.
    pub resource: String,
    /// Limit.
    pub limit: i64,
}

/// A service template.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct PaaSTemplate {
    /// Identifier.
    pub object_uuid: String,
    /// Display name.
    pub name: String,
    /// Category, for example `database`.
    pub category: String,
    /// Product flavour, for example `kubernetes`.
    pub flavour: String,
    /// Product numbers.
    pub product_no: Value,
    /// Labels.
    pub labels: Vec<String>,
    /// Object status.
    pub status: String,
    /// Release version of the service software.
    pub version: String,
    /// Release line.
    pub release: String,
    /// JSON schema of the accepted parameters.
    pub parameters_schema: Value,
}

/// A PaaS security zone.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct PaaSSecurityZone {
    /// Identifier.
    pub object_uuid: String,
    /// Display name.
    pub name: String,
    /// Location name.
    pub location_name: String,
    /// Object status.
    pub status: String,
    /// Labels.
    pub labels: Vec<String>,
}

/// Body of a service create call.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PaaSServiceCreateRequest {
    /// Display name.
    pub name: String,
    /// Template to create the service from.
    pub paas_service_template_uuid: String,
    /// Labels.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    /// Security zone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paas_security_zone_uuid: Option<String>,
    /// Resource limits.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub resource_limits: Vec<ResourceLimit>,
    /// Template-specific parameters.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub parameters: Map<String, Value>,
}

/// Response to a service create call.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct PaaSServiceCreateResponse {
    /// Identifier of the asynchronous request.
    pub request_uuid: String,
    /// Identifier of the new service.
    pub paas_service_uuid: String,
    /// Same as `paas_service_uuid` on newer API versions.
    pub object_uuid: String,
    /// Ports the service listens on.
    pub listen_ports: BTreeMap<String, BTreeMap<String, u16>>,
    /// Access credentials.
    pub credentials: Vec<Credential>,
    /// Effective resource limits.
    pub resource_limits: Vec<ResourceLimit>,
    /// Effective parameters.
    pub parameters: Map<String, Value>,
}

/// Body of a service update call.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PaaSServiceUpdateRequest {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    /// New parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Map<String, Value>>,
    /// New resource limits.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_limits: Option<Vec<ResourceLimit>>,
}

#[derive(Deserialize)]
struct ServiceList {
    #[serde(default)]
    paas_services: BTreeMap<String, PaaSService>,
}

#[derive(Deserialize)]
struct ServiceEnvelope {
    paas_service: PaaSService,
}

#[derive(Deserialize)]
struct TemplateList {
    #[serde(default)]
    paas_service_templates: BTreeMap<String, PaaSTemplate>,
}

#[derive(Deserialize)]
struct SecurityZoneList {
    #[serde(default)]
    paas_security_zones: BTreeMap<String, PaaSSecurityZone>,
}

fn services_path(segments: &[&str]) -> String {
    let mut all = vec!["services"];
    all.extend_from_slice(segments);
    join_path(PAAS_BASE, &all)
}

/// Operations on platform services.
pub trait PaaSOperations {
    /// Lists services ordered by identifier.
    fn list_paas_services<'a>(&'a self, ctx: &'a CallContext) -> ApiFuture<'a, Vec<PaaSService>>;

    /// Fetches one service.
    fn get_paas_service<'a>(
        &'a self,
        ctx: &'a CallContext,
        id: &'a str,
    ) -> ApiFuture<'a, PaaSService>;

    /// Creates a service.
    fn create_paas_service<'a>(
        &'a self,
        ctx: &'a CallContext,
        request: PaaSServiceCreateRequest,
    ) -> ApiFuture<'a, PaaSServiceCreateResponse>;

    /// Updates a service.
    fn update_paas_service<'a>(
        &'a self,
        ctx: &'a CallContext,
        id: &'a str,
        request: PaaSServiceUpdateRequest,
    ) -> ApiFuture<'a, ()>;

    /// Deletes a service.
    fn delete_paas_service<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, ()>;

    /// Lists service templates ordered by identifier.
    fn list_paas_templates<'a>(&'a self, ctx: &'a CallContext) -> ApiFuture<'a, Vec<PaaSTemplate>>;

    /// Issues fresh credentials for a Kubernetes cluster.
    fn renew_k8s_credentials<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, ()>;

    /// Lists security zones ordered by identifier.
    fn list_paas_security_zones<'a>(
        &'a self,
        ctx: &'a CallContext,
    ) -> ApiFuture<'a, Vec<PaaSSecurityZone>>;
}

impl PaaSOperations for Client {
    fn list_paas_services<'a>(&'a self, ctx: &'a CallContext) -> ApiFuture<'a, Vec<PaaSService>> {
        Box::pin(async move {
            let list: ServiceList = self
                .execute(ctx, Operation::get(services_path(&[])))
                .await?;
            Ok(into_sorted(list.paas_services))
        })
    }

    fn get_paas_service<'a>(
        &'a self,
        ctx: &'a CallContext,
        id: &'a str,
    ) -> ApiFuture<'a, PaaSService> {
        Box::pin(async move {
            require_uuid(id, "id")?;
            let envelope: ServiceEnvelope = self
                .execute(ctx, Operation::get(services_path(&[id])))
                .await?;
            Ok(envelope.paas_service)
        })
    }

    fn create_paas_service<'a>(
        &'a self,
        ctx: &'a CallContext,
        request: PaaSServiceCreateRequest,
    ) -> ApiFuture<'a, PaaSServiceCreateResponse> {
        Box::pin(async move {
            self.execute(ctx, Operation::post(services_path(&[]), request))
                .await
        })
    }

    fn update_paas_service<'a>(
        &'a self,
        ctx: &'a CallContext,
        id: &'a str,
        request: PaaSServiceUpdateRequest,
    ) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            require_uuid(id, "id")?;
            self.execute_discard(ctx, Operation::patch(services_path(&[id]), request))
                .await
        })
    }

    fn delete_paas_service<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            require_uuid(id, "id")?;
            self.execute_discard(ctx, Operation::delete(services_path(&[id])))
                .await
        })
    }

    fn list_paas_templates<'a>(&'a self, ctx: &'a CallContext) -> ApiFuture<'a, Vec<PaaSTemplate>> {
        Box::pin(async move {
            let uri = join_path(PAAS_BASE, &["service_templates"]);
            let list: TemplateList = self.execute(ctx, Operation::get(uri)).await?;
            Ok(into_sorted(list.paas_service_templates))
        })
    }

    fn renew_k8s_credentials<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            require_uuid(id, "id")?;
            let uri = services_path(&[id, "renew_credentials"]);
            self.execute_discard(ctx, Operation::patch(uri, EmptyBody {}))
                .await
        })
    }

    fn list_paas_security_zones<'a>(
        &'a self,
        ctx: &'a CallContext,
    ) -> ApiFuture<'a, Vec<PaaSSecurityZone>> {
        Box::pin(async move {
            let uri = join_path(PAAS_BASE, &["security_zones"]);
            let list: SecurityZoneList = self.execute(ctx, Operation::get(uri)).await?;
            Ok(into_sorted(list.paas_security_zones))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameters_keep_nested_json() {
        let service: PaaSService = serde_json::from_value(serde_json::json!({
            "object_uuid": "svc",
            "parameters": {"k8s_worker_node_count": 3, "pools": [{"name": "a", "tags": null}]},
            "credentials": [{"username": "admin", "type": "kubeconfig", "kubeconfig": "apiVersion: v1"}]
        }))
        .unwrap_or_else(|err| panic!("decode: {err}"));
        assert_eq!(
            service.parameters.get("pools"),
            Some(&serde_json::json!([{"name": "a", "tags": null}]))
        );
        let [credential] = service.credentials.as_slice() else {
            panic!("expected one credential");
        };
        assert_eq!(credential.kind, "kubeconfig");
    }

    #[test]
    fn service_paths_nest_under_services() {
        assert_eq!(services_path(&[]), "/objects/paas/services");
        assert_eq!(
            services_path(&["abc", "renew_credentials"]),
            "/objects/paas/services/abc/renew_credentials"
        );
    }
}
