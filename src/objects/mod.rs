//! Resource families exposed by the API.
//!
//! Each submodule holds the wire shapes of one family, an operations trait,
//! and the [`Client`](crate::client::Client) implementation of that trait.
//! Command handlers depend on the traits so tests can substitute doubles.

mod event;
mod firewall;
mod ip;
mod isoimage;
mod label;
mod loadbalancer;
mod location;
mod network;
mod objectstorage;
mod paas;
mod server;
mod sshkey;
mod storage;
mod template;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use event::{Event, EventOperations};
pub use firewall::{
    Firewall, FirewallCreateRequest, FirewallCreateResponse, FirewallOperations, FirewallRule,
    FirewallRules,
};
pub use ip::{
    Ip, IpCreateRequest, IpCreateResponse, IpLoadBalancerRelation, IpOperations, IpRelations,
    IpServerRelation, IpUpdateRequest,
};
pub use isoimage::{
    IsoImage, IsoImageCreateRequest, IsoImageOperations, IsoImageUpdateRequest,
};
pub use label::{Label, LabelOperations};
pub use loadbalancer::{
    BackendServer, ForwardingRule, LoadBalancer, LoadBalancerCreateRequest, LoadBalancerOperations,
};
pub use location::{Location, LocationOperations};
pub use network::{Network, NetworkCreateRequest, NetworkOperations, NetworkUpdateRequest};
pub use objectstorage::{
    BucketUsage, ObjectStorageAccessKey, ObjectStorageAccessKeyCreateResponse, ObjectStorageBucket,
    ObjectStorageOperations,
};
pub use paas::{
    Credential, KUBERNETES_FLAVOUR, POSTGRES_FLAVOUR, PaaSOperations, PaaSSecurityZone, PaaSService, PaaSServiceCreateRequest,
    PaaSServiceCreateResponse, PaaSServiceUpdateRequest, PaaSTemplate, ResourceLimit,
};
pub use server::{
    IpLink, IsoImageLink, NetworkLink, Server, ServerCreateRelations, ServerCreateRequest,
    ServerCreateResponse, ServerIpRelation, ServerOperations, ServerRelations,
    ServerStorageRelation, ServerUpdateRequest, StorageLink,
};
pub use sshkey::{SshKey, SshKeyCreateRequest, SshKeyOperations, SshKeyUpdateRequest};
pub use storage::{
    Storage, StorageCreateRequest, StorageOperations, StorageTemplate, StorageUpdateRequest,
};
pub use template::{Template, TemplateOperations};

/// Base path of servers.
pub const SERVER_BASE: &str = "/objects/servers";
/// Base path of storages.
pub const STORAGE_BASE: &str = "/objects/storages";
/// Base path of networks.
pub const NETWORK_BASE: &str = "/objects/networks";
/// Base path of IP addresses.
pub const IP_BASE: &str = "/objects/ips";
/// Base path of SSH keys.
pub const SSHKEY_BASE: &str = "/objects/sshkeys";
/// Base path of templates.
pub const TEMPLATE_BASE: &str = "/objects/templates";
/// Base path of ISO images.
pub const ISOIMAGE_BASE: &str = "/objects/isoimages";
/// Base path of load balancers.
pub const LOADBALANCER_BASE: &str = "/objects/loadbalancers";
/// Base path of firewalls.
pub const FIREWALL_BASE: &str = "/objects/firewalls";
/// Base path of labels.
pub const LABEL_BASE: &str = "/objects/labels";
/// Base path of locations.
pub const LOCATION_BASE: &str = "/objects/locations";
/// Base path of the event log.
pub const EVENT_BASE: &str = "/objects/events";
/// Base path of object storage.
pub const OBJECTSTORAGE_BASE: &str = "/objects/objectstorages";
/// Base path of PaaS services, templates and security zones.
pub const PAAS_BASE: &str = "/objects/paas";

/// Response to a create call.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct CreateResponse {
    /// Identifier of the new object.
    pub object_uuid: String,
    /// Identifier of the asynchronous request.
    pub request_uuid: String,
}

/// Empty JSON object body, `{}`.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub(crate) struct EmptyBody {}

/// Unwraps a map keyed by object UUID into a list ordered by that key.
pub(crate) fn into_sorted<T>(map: BTreeMap<String, T>) -> Vec<T> {
    map.into_values().collect()
}
