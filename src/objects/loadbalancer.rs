//! Load balancers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{CreateResponse, LOADBALANCER_BASE, into_sorted};
use crate::client::{ApiFuture, Client, Operation, join_path, require_uuid};
use crate::context::CallContext;
use crate::types::LoadBalancerAlgorithm;

/// A load balancer.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct LoadBalancer {
    /// Identifier.
    pub object_uuid: String,
    /// Display name.
    pub name: String,
    /// Balancing algorithm.
    #[serde(default, deserialize_with = "crate::types::lenient")]
    pub algorithm: Option<LoadBalancerAlgorithm>,
    /// Object status.
    pub status: String,
    /// IPv4 address the balancer listens on.
    pub listen_ipv4_uuid: String,
    /// IPv6 address the balancer listens on.
    pub listen_ipv6_uuid: String,
    /// Forwarding rules.
    pub forwarding_rules: Vec<ForwardingRule>,
    /// Backends.
    pub backend_servers: Vec<BackendServer>,
    /// Redirect plain HTTP to HTTPS.
    pub redirect_http_to_https: bool,
    /// Labels.
    pub labels: Vec<String>,
    /// Location identifier.
    pub location_uuid: String,
    /// Location name.
    pub location_name: String,
    /// Creation time.
    #[serde(with = "crate::timestamp::option")]
    pub create_time: Option<DateTime<Utc>>,
    /// Last change.
    #[serde(with = "crate::timestamp::option")]
    pub change_time: Option<DateTime<Utc>>,
}

/// A port forwarding rule.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct ForwardingRule {
    /// Let's Encrypt certificate settings, passed through untouched.
    pub letsencrypt_ssl: Value,
    /// Port the balancer listens on.
    pub listen_port: u16,
    /// `http` or `tcp`.
    pub mode: String,
    /// Port on the backends.
    pub target_port: u16,
}

/// A backend host.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct BackendServer {
    /// Relative weight.
    pub weight: u32,
    /// Host name or address.
    pub host: String,
}

/// Body of a load balancer create call.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LoadBalancerCreateRequest {
    /// Display name.
    pub name: String,
    /// Balancing algorithm.
    pub algorithm: LoadBalancerAlgorithm,
    /// IPv4 address to listen on.
    pub listen_ipv4_uuid: String,
    /// IPv6 address to listen on.
    pub listen_ipv6_uuid: String,
    /// Forwarding rules.
    pub forwarding_rules: Vec<ForwardingRule>,
    /// Backends.
    pub backend_servers: Vec<BackendServer>,
    /// Redirect plain HTTP to HTTPS.
    pub redirect_http_to_https: bool,
    /// Labels.
    pub labels: Vec<String>,
}

#[derive(Deserialize)]
struct LoadBalancerList {
    #[serde(default)]
    loadbalancers: BTreeMap<String, LoadBalancer>,
}

#[derive(Deserialize)]
struct LoadBalancerEnvelope {
    loadbalancer: LoadBalancer,
}

/// Operations on load balancers.
pub trait LoadBalancerOperations {
    /// Lists load balancers ordered by identifier.
    fn list_loadbalancers<'a>(&'a self, ctx: &'a CallContext) -> ApiFuture<'a, Vec<LoadBalancer>>;

    /// Fetches one load balancer.
    fn get_loadbalancer<'a>(
        &'a self,
        ctx: &'a CallContext,
        id: &'a str,
    ) -> ApiFuture<'a, LoadBalancer>;

    /// Creates a load balancer.
    fn create_loadbalancer<'a>(
        &'a self,
        ctx: &'a CallContext,
        request: LoadBalancerCreateRequest,
    ) -> ApiFuture<'a, CreateResponse>;

    /// Deletes a load balancer.
    fn delete_loadbalancer<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, ()>;
}

impl LoadBalancerOperations for Client {
    fn list_loadbalancers<'a>(&'a self, ctx: &'a CallContext) -> ApiFuture<'a, Vec<LoadBalancer>> {
        Box::pin(async move {
            let list: LoadBalancerList =
                self.execute(ctx, Operation::get(LOADBALANCER_BASE)).await?;
            Ok(into_sorted(list.loadbalancers))
        })
    }

    fn get_loadbalancer<'a>(
        &'a self,
        ctx: &'a CallContext,
        id: &'a str,
    ) -> ApiFuture<'a, LoadBalancer> {
        Box::pin(async move {
            require_uuid(id, "id")?;
            let envelope: LoadBalancerEnvelope = self
                .execute(ctx, Operation::get(join_path(LOADBALANCER_BASE, &[id])))
                .await?;
            Ok(envelope.loadbalancer)
        })
    }

    fn create_loadbalancer<'a>(
        &'a self,
        ctx: &'a CallContext,
        request: LoadBalancerCreateRequest,
    ) -> ApiFuture<'a, CreateResponse> {
        Box::pin(async move {
            self.execute(ctx, Operation::post(LOADBALANCER_BASE, request))
                .await
        })
    }

    fn delete_loadbalancer<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            require_uuid(id, "id")?;
            self.execute_discard(ctx, Operation::delete(join_path(LOADBALANCER_BASE, &[id])))
                .await
        })
    }
}
