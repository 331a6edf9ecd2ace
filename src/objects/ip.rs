//! Public IP addresses.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{IP_BASE, into_sorted};
use crate::client::{ApiFuture, Client, Operation, join_path, require_uuid};
use crate::context::CallContext;
use crate::types::IpFamily;

/// An IP address.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Ip {
    /// Identifier.
    pub object_uuid: String,
    /// Display name.
    pub name: String,
    /// Address.
    pub ip: String,
    /// Prefix in CIDR notation.
    pub prefix: String,
    /// Address family.
    #[serde(default, deserialize_with = "crate::types::lenient")]
    pub family: Option<IpFamily>,
    /// Failover address.
    pub failover: bool,
    /// Reverse DNS entry.
    pub reverse_dns: String,
    /// Object status.
    pub status: String,
    /// Location identifier.
    pub location_uuid: String,
    /// Location name.
    pub location_name: String,
    /// Protected against deletion.
    pub delete_block: bool,
    /// Current price.
    pub current_price: f64,
    /// Labels.
    pub labels: Vec<String>,
    /// Objects the address is assigned to.
    pub relations: IpRelations,
    /// Creation time.
    #[serde(with = "crate::timestamp::option")]
    pub create_time: Option<DateTime<Utc>>,
    /// Last change.
    #[serde(with = "crate::timestamp::option")]
    pub change_time: Option<DateTime<Utc>>,
}

impl Ip {
    /// Whether a server or load balancer uses the address.
    #[must_use]
    pub fn is_assigned(&self) -> bool {
        !self.relations.servers.is_empty() || !self.relations.loadbalancers.is_empty()
    }
}

/// Objects an address is assigned to.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct IpRelations {
    /// Servers.
    pub servers: Vec<IpServerRelation>,
    /// Load balancers.
    pub loadbalancers: Vec<IpLoadBalancerRelation>,
}

/// A server using an address.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct IpServerRelation {
    /// Server identifier.
    pub server_uuid: String,
    /// Assignment time.
    #[serde(with = "crate::timestamp::option")]
    pub create_time: Option<DateTime<Utc>>,
}

/// A load balancer using an address.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct IpLoadBalancerRelation {
    /// Load balancer identifier.
    pub loadbalancer_uuid: String,
    /// Assignment time.
    #[serde(with = "crate::timestamp::option")]
    pub create_time: Option<DateTime<Utc>>,
}

/// Body of an IP create call.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct IpCreateRequest {
    /// Display name.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub name: String,
    /// Address family.
    pub family: IpFamily,
    /// Failover address.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub failover: bool,
    /// Reverse DNS entry.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub reverse_dns: String,
    /// Labels.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

/// Response to an IP create call.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct IpCreateResponse {
    /// Identifier of the asynchronous request.
    pub request_uuid: String,
    /// Identifier of the new address.
    pub object_uuid: String,
    /// Prefix in CIDR notation.
    pub prefix: String,
    /// Allocated address.
    pub ip: String,
}

/// Body of an IP update call.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct IpUpdateRequest {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New failover flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failover: Option<bool>,
    /// New reverse DNS entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverse_dns: Option<String>,
    /// New labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct IpList {
    #[serde(default)]
    ips: BTreeMap<String, Ip>,
}

#[derive(Deserialize)]
struct IpEnvelope {
    ip: Ip,
}

/// Operations on IP addresses.
pub trait IpOperations {
    /// Lists addresses ordered by identifier.
    fn list_ips<'a>(&'a self, ctx: &'a CallContext) -> ApiFuture<'a, Vec<Ip>>;

    /// Fetches one address.
    fn get_ip<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, Ip>;

    /// Allocates an address.
    fn create_ip<'a>(
        &'a self,
        ctx: &'a CallContext,
        request: IpCreateRequest,
    ) -> ApiFuture<'a, IpCreateResponse>;

    /// Updates an address.
    fn update_ip<'a>(
        &'a self,
        ctx: &'a CallContext,
        id: &'a str,
        request: IpUpdateRequest,
    ) -> ApiFuture<'a, ()>;

    /// Releases an address.
    fn delete_ip<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, ()>;
}

impl IpOperations for Client {
    fn list_ips<'a>(&'a self, ctx: &'a CallContext) -> ApiFuture<'a, Vec<Ip>> {
        Box::pin(async move {
            let list: IpList = self.execute(ctx, Operation::get(IP_BASE)).await?;
            Ok(into_sorted(list.ips))
        })
    }

    fn get_ip<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, Ip> {
        Box::pin(async move {
            require_uuid(id, "id")?;
            let envelope: IpEnvelope = self
                .execute(ctx, Operation::get(join_path(IP_BASE, &[id])))
                .await?;
            Ok(envelope.ip)
        })
    }

    fn create_ip<'a>(
        &'a self,
        ctx: &'a CallContext,
        request: IpCreateRequest,
    ) -> ApiFuture<'a, IpCreateResponse> {
        Box::pin(async move { self.execute(ctx, Operation::post(IP_BASE, request)).await })
    }

    fn update_ip<'a>(
        &'a self,
        ctx: &'a CallContext,
        id: &'a str,
        request: IpUpdateRequest,
    ) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            require_uuid(id, "id")?;
            self.execute_discard(ctx, Operation::patch(join_path(IP_BASE, &[id]), request))
                .await
        })
    }

    fn delete_ip<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            require_uuid(id, "id")?;
            self.execute_discard(ctx, Operation::delete(join_path(IP_BASE, &[id])))
                .await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_travels_as_an_integer() {
        let request = IpCreateRequest {
            name: String::new(),
            family: IpFamily::V6,
            failover: false,
            reverse_dns: String::new(),
            labels: Vec::new(),
        };
        let encoded = serde_json::to_string(&request).unwrap_or_else(|err| panic!("encode: {err}"));
        assert_eq!(encoded, r#"{"family":6}"#);

        let ip: Ip = serde_json::from_str(r#"{"ip":"10.0.0.1","family":4}"#)
            .unwrap_or_else(|err| panic!("decode: {err}"));
        assert_eq!(ip.family, Some(IpFamily::V4));
        assert!(!ip.is_assigned());
    }
}
