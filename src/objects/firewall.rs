//! Firewall templates.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{FIREWALL_BASE, into_sorted};
use crate::client::{ApiFuture, Client, Operation, join_path, require_uuid};
use crate::context::CallContext;
use crate::types::TransportProtocol;

/// A firewall.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct Firewall {
    /// Identifier.
    pub object_uuid: String,
    /// Display name.
    pub name: String,
    /// Object status.
    pub status: String,
    /// Owned by the account rather than public.
    pub private: bool,
    /// Description.
    pub description: String,
    /// Labels.
    pub labels: Vec<String>,
    /// Rule sets.
    pub rules: FirewallRules,
    /// Creation time.
    #[serde(with = "crate::timestamp::option")]
    pub create_time: Option<DateTime<Utc>>,
    /// Last change.
    #[serde(with = "crate::timestamp::option")]
    pub change_time: Option<DateTime<Utc>>,
}

/// Rule sets by direction and family.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct FirewallRules {
    /// Incoming IPv6.
    #[serde(rename = "rules-v6-in", skip_serializing_if = "Vec::is_empty")]
    pub v6_in: Vec<FirewallRule>,
    /// Outgoing IPv6.
    #[serde(rename = "rules-v6-out", skip_serializing_if = "Vec::is_empty")]
    pub v6_out: Vec<FirewallRule>,
    /// Incoming IPv4.
    #[serde(rename = "rules-v4-in", skip_serializing_if = "Vec::is_empty")]
    pub v4_in: Vec<FirewallRule>,
    /// Outgoing IPv4.
    #[serde(rename = "rules-v4-out", skip_serializing_if = "Vec::is_empty")]
    pub v4_out: Vec<FirewallRule>,
}

/// One firewall rule. Empty strings match anything.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct FirewallRule {
    /// Protocol.
    #[serde(
        default,
        deserialize_with = "crate::types::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub protocol: Option<TransportProtocol>,
    /// Destination port or range.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub dst_port: String,
    /// Source port or range.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub src_port: String,
    /// Source network.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub src_cidr: String,
    /// Destination network.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub dst_cidr: String,
    /// `accept` or `drop`.
    pub action: String,
    /// Free text.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub comment: String,
    /// Evaluation order.
    pub order: i32,
}

/// Body of a firewall create call.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct FirewallCreateRequest {
    /// Display name.
    pub name: String,
    /// Labels.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    /// Rule sets.
    pub rules: FirewallRules,
}

/// Response to a firewall create call.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct FirewallCreateResponse {
    /// Identifier of the asynchronous request.
    pub request_uuid: String,
    /// Identifier of the new firewall.
    pub object_uuid: String,
}

#[derive(Deserialize)]
struct FirewallList {
    #[serde(default)]
    firewalls: BTreeMap<String, Firewall>,
}

#[derive(Deserialize)]
struct FirewallEnvelope {
    firewall: Firewall,
}

/// Operations on firewalls.
pub trait FirewallOperations {
    /// Lists firewalls ordered by identifier.
    fn list_firewalls<'a>(&'a self, ctx: &'a CallContext) -> ApiFuture<'a, Vec<Firewall>>;

    /// Fetches one firewall.
    fn get_firewall<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, Firewall>;

    /// Creates a firewall.
    fn create_firewall<'a>(
        &'a self,
        ctx: &'a CallContext,
        request: FirewallCreateRequest,
    ) -> ApiFuture<'a, FirewallCreateResponse>;

    /// Deletes a firewall.
    fn delete_firewall<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, ()>;
}

impl FirewallOperations for Client {
    fn list_firewalls<'a>(&'a self, ctx: &'a CallContext) -> ApiFuture<'a, Vec<Firewall>> {
        Box::pin(async move {
            let list: FirewallList = self.execute(ctx, Operation::get(FIREWALL_BASE)).await?;
            Ok(into_sorted(list.firewalls))
        })
    }

    fn get_firewall<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, Firewall> {
        Box::pin(async move {
            require_uuid(id, "id")?;
            let envelope: FirewallEnvelope = self
                .execute(ctx, Operation::get(join_path(FIREWALL_BASE, &[id])))
                .await?;
            Ok(envelope.firewall)
        })
    }

    fn create_firewall<'a>(
        &'a self,
        ctx: &'a CallContext,
        request: FirewallCreateRequest,
    ) -> ApiFuture<'a, FirewallCreateResponse> {
        Box::pin(async move {
            self.execute(ctx, Operation::post(FIREWALL_BASE, request))
                .await
        })
    }

    fn delete_firewall<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            require_uuid(id, "id")?;
            self.execute_discard(ctx, Operation::delete(join_path(FIREWALL_BASE, &[id])))
                .await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_sets_use_hyphenated_keys() {
        let rules: FirewallRules = serde_json::from_str(
            r#"{"rules-v4-in":[{"protocol":"tcp","dst_port":"22","action":"accept","order":1}]}"#,
        )
        .unwrap_or_else(|err| panic!("decode: {err}"));
        let [rule] = rules.v4_in.as_slice() else {
            panic!("expected one rule, got {:?}", rules.v4_in);
        };
        assert_eq!(rule.protocol, Some(TransportProtocol::Tcp));
        assert_eq!(rule.dst_port, "22");
        assert!(rules.v6_in.is_empty());
    }
}
