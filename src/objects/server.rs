//! Servers, their power state and their storage and IP relations.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::event::EventList;
use super::{EmptyBody, Event, SERVER_BASE, into_sorted};
use crate::client::{ApiError, ApiFuture, Client, Operation, join_path, require_uuid};
use crate::context::CallContext;
use crate::retry::{Attempt, retry_with_context};
use crate::types::{HardwareProfile, IpFamily};

/// A server.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default)]
pub struct Server {
    /// Identifier.
    pub object_uuid: String,
    /// Display name.
    pub name: String,
    /// Memory in GB.
    pub memory: u32,
    /// Number of cores.
    pub cores: u32,
    /// Hardware profile.
    #[serde(default, deserialize_with = "crate::types::lenient")]
    pub hardware_profile: Option<HardwareProfile>,
    /// Object status, for example `active`.
    pub status: String,
    /// Location of the server.
    pub location_uuid: String,
    /// Whether the server is powered on.
    pub power: bool,
    /// Current price.
    pub current_price: f64,
    /// Availability zone.
    pub availability_zone: String,
    /// Restart automatically after a failure.
    pub auto_recovery: bool,
    /// Legacy hardware flag.
    pub legacy: bool,
    /// Labels.
    pub labels: Vec<String>,
    /// Attached objects.
    pub relations: ServerRelations,
    /// Creation time.
    #[serde(with = "crate::timestamp::option")]
    pub create_time: Option<DateTime<Utc>>,
    /// Last change.
    #[serde(with = "crate::timestamp::option")]
    pub change_time: Option<DateTime<Utc>>,
}

/// Objects related to a server.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct ServerRelations {
    /// Attached storages.
    pub storages: Vec<ServerStorageRelation>,
    /// Assigned public IPs.
    pub public_ips: Vec<ServerIpRelation>,
}

/// A storage attached to a server.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct ServerStorageRelation {
    /// Storage identifier.
    pub object_uuid: String,
    /// Storage name.
    pub object_name: String,
    /// Capacity in GB.
    pub capacity: u32,
    /// Storage type.
    pub storage_type: String,
    /// Whether the server boots from this storage.
    pub bootdevice: bool,
    /// Attachment time.
    #[serde(with = "crate::timestamp::option")]
    pub create_time: Option<DateTime<Utc>>,
}

/// An IP address assigned to a server.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct ServerIpRelation {
    /// IP address identifier.
    pub object_uuid: String,
    /// Server identifier.
    pub server_uuid: String,
    /// Address.
    pub ip: String,
    /// Prefix in CIDR notation.
    pub prefix: String,
    /// Address family.
    #[serde(default, deserialize_with = "crate::types::lenient")]
    pub family: Option<IpFamily>,
    /// Assignment time.
    #[serde(with = "crate::timestamp::option")]
    pub create_time: Option<DateTime<Utc>>,
}

/// Body of a server create call.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ServerCreateRequest {
    /// Display name.
    pub name: String,
    /// Memory in GB.
    pub memory: u32,
    /// Number of cores.
    pub cores: u32,
    /// Hardware profile; the API default applies when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hardware_profile: Option<HardwareProfile>,
    /// Availability zone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,
    /// Labels.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    /// Restart automatically after a failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_recovery: Option<bool>,
    /// Objects to attach at creation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relations: Option<ServerCreateRelations>,
}

/// Objects attached to a server at creation. Empty lists are sent as `[]`.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ServerCreateRelations {
    /// Storage identifiers with boot flags.
    pub storages: Vec<StorageLink>,
    /// Network identifiers.
    pub networks: Vec<NetworkLink>,
    /// IP address identifiers.
    pub public_ips: Vec<IpLink>,
    /// ISO image identifiers.
    pub isoimages: Vec<IsoImageLink>,
}

/// Storage attachment inside [`ServerCreateRelations`].
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct StorageLink {
    /// Storage identifier.
    pub storage_uuid: String,
    /// Boot from this storage.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub bootdevice: bool,
}

/// Network attachment inside [`ServerCreateRelations`].
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct NetworkLink {
    /// Network identifier.
    pub network_uuid: String,
}

/// IP assignment inside [`ServerCreateRelations`].
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct IpLink {
    /// IP address identifier.
    pub ipaddr_uuid: String,
}

/// ISO image attachment inside [`ServerCreateRelations`].
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct IsoImageLink {
    /// ISO image identifier.
    pub isoimage_uuid: String,
}

/// Response to a server create call.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct ServerCreateResponse {
    /// Identifier of the new server.
    pub object_uuid: String,
    /// Same as `object_uuid`; older API versions fill only one of them.
    pub server_uuid: String,
    /// Identifier of the asynchronous request.
    pub request_uuid: String,
}

impl ServerCreateResponse {
    fn normalise(mut self) -> Self {
        if self.server_uuid.is_empty() {
            self.server_uuid.clone_from(&self.object_uuid);
        } else if self.object_uuid.is_empty() {
            self.object_uuid.clone_from(&self.server_uuid);
        }
        self
    }
}

/// Body of a server update call. Unset fields are left unchanged.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ServerUpdateRequest {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New memory in GB.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<u32>,
    /// New core count.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cores: Option<u32>,
    /// New labels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct ServerList {
    #[serde(default)]
    servers: BTreeMap<String, Server>,
}

#[derive(Deserialize)]
struct ServerEnvelope {
    server: Server,
}

#[derive(Deserialize)]
struct StorageRelationList {
    #[serde(default)]
    storage_relations: Vec<ServerStorageRelation>,
}

#[derive(Deserialize)]
struct IpRelationList {
    #[serde(default)]
    ip_relations: Vec<ServerIpRelation>,
}

#[derive(Serialize)]
struct PowerBody {
    power: bool,
}

#[derive(Serialize)]
struct StorageRelationBody<'a> {
    object_uuid: &'a str,
    bootdevice: bool,
}

#[derive(Serialize)]
struct IpRelationBody<'a> {
    object_uuid: &'a str,
}

/// Operations on servers.
pub trait ServerOperations {
    /// Lists servers ordered by identifier.
    fn list_servers<'a>(&'a self, ctx: &'a CallContext) -> ApiFuture<'a, Vec<Server>>;

    /// Fetches one server.
    fn get_server<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, Server>;

    /// Creates a server.
    fn create_server<'a>(
        &'a self,
        ctx: &'a CallContext,
        request: ServerCreateRequest,
    ) -> ApiFuture<'a, ServerCreateResponse>;

    /// Updates a server.
    fn update_server<'a>(
        &'a self,
        ctx: &'a CallContext,
        id: &'a str,
        request: ServerUpdateRequest,
    ) -> ApiFuture<'a, ()>;

    /// Deletes a server.
    fn delete_server<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, ()>;

    /// Lists the event log of a server.
    fn server_events<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, Vec<Event>>;

    /// Whether a server is powered on.
    fn is_server_on<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, bool>;

    /// Powers a server on. No-op when it already is.
    fn start_server<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, ()>;

    /// Cuts power to a server. No-op when it is already off.
    fn stop_server<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, ()>;

    /// Asks a server to shut down via ACPI. No-op when it is already off.
    fn shutdown_server<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, ()>;

    /// Lists storages attached to a server.
    fn server_storages<'a>(
        &'a self,
        ctx: &'a CallContext,
        id: &'a str,
    ) -> ApiFuture<'a, Vec<ServerStorageRelation>>;

    /// Attaches a storage to a server.
    fn link_storage<'a>(
        &'a self,
        ctx: &'a CallContext,
        server_id: &'a str,
        storage_id: &'a str,
        bootdevice: bool,
    ) -> ApiFuture<'a, ()>;

    /// Lists IP addresses assigned to a server.
    fn server_ips<'a>(
        &'a self,
        ctx: &'a CallContext,
        id: &'a str,
    ) -> ApiFuture<'a, Vec<ServerIpRelation>>;

    /// Assigns an IP address to a server.
    fn link_ip<'a>(
        &'a self,
        ctx: &'a CallContext,
        server_id: &'a str,
        ip_id: &'a str,
    ) -> ApiFuture<'a, ()>;

    /// Removes an IP address from a server.
    fn unlink_ip<'a>(
        &'a self,
        ctx: &'a CallContext,
        server_id: &'a str,
        ip_id: &'a str,
    ) -> ApiFuture<'a, ()>;
}

impl Client {
    async fn set_power(&self, ctx: &CallContext, id: &str, power: bool) -> Result<(), ApiError> {
        if self.is_server_on(ctx, id).await? == power {
            debug!(server = id, power, "server already in requested power state");
            return Ok(());
        }
        let uri = join_path(SERVER_BASE, &[id, "power"]);
        self.execute_discard(ctx, Operation::patch(uri, PowerBody { power }))
            .await?;
        if self.is_synchronous() {
            self.wait_for_power(ctx, id, power).await?;
        }
        Ok(())
    }

    async fn wait_for_power(&self, ctx: &CallContext, id: &str, power: bool) -> Result<(), ApiError> {
        retry_with_context(ctx, self.config().delay_interval, move || async move {
            match self.get_server(ctx, id).await {
                Ok(server) if server.power == power => Attempt::Stop(Ok(())),
                Ok(_) => Attempt::Continue(None),
                Err(err) => {
                    debug!(server = id, error = %err, "power poll failed, retrying");
                    Attempt::Continue(Some(err))
                }
            }
        })
        .await
    }
}

impl ServerOperations for Client {
    fn list_servers<'a>(&'a self, ctx: &'a CallContext) -> ApiFuture<'a, Vec<Server>> {
        Box::pin(async move {
            let list: ServerList = self.execute(ctx, Operation::get(SERVER_BASE)).await?;
            Ok(into_sorted(list.servers))
        })
    }

    fn get_server<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, Server> {
        Box::pin(async move {
            require_uuid(id, "id")?;
            let envelope: ServerEnvelope = self
                .execute(ctx, Operation::get(join_path(SERVER_BASE, &[id])))
                .await?;
            Ok(envelope.server)
        })
    }

    fn create_server<'a>(
        &'a self,
        ctx: &'a CallContext,
        request: ServerCreateRequest,
    ) -> ApiFuture<'a, ServerCreateResponse> {
        Box::pin(async move {
            let response: ServerCreateResponse = self
                .execute(ctx, Operation::post(SERVER_BASE, request))
                .await?;
            Ok(response.normalise())
        })
    }

    fn update_server<'a>(
        &'a self,
        ctx: &'a CallContext,
        id: &'a str,
        request: ServerUpdateRequest,
    ) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            require_uuid(id, "id")?;
            self.execute_discard(ctx, Operation::patch(join_path(SERVER_BASE, &[id]), request))
                .await
        })
    }

    fn delete_server<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            require_uuid(id, "id")?;
            self.execute_discard(ctx, Operation::delete(join_path(SERVER_BASE, &[id])))
                .await
        })
    }

    fn server_events<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, Vec<Event>> {
        Box::pin(async move {
            require_uuid(id, "id")?;
            let list: EventList = self
                .execute(ctx, Operation::get(join_path(SERVER_BASE, &[id, "events"])))
                .await?;
            Ok(list.events)
        })
    }

    fn is_server_on<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, bool> {
        Box::pin(async move { Ok(self.get_server(ctx, id).await?.power) })
    }

    fn start_server<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, ()> {
        Box::pin(self.set_power(ctx, id, true))
    }

    fn stop_server<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, ()> {
        Box::pin(self.set_power(ctx, id, false))
    }

    fn shutdown_server<'a>(&'a self, ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            if !self.is_server_on(ctx, id).await? {
                debug!(server = id, "server already off");
                return Ok(());
            }
            let uri = join_path(SERVER_BASE, &[id, "shutdown"]);
            self.execute_discard(ctx, Operation::patch(uri, EmptyBody {}))
                .await?;
            if self.is_synchronous() {
                self.wait_for_power(ctx, id, false).await?;
            }
            Ok(())
        })
    }

    fn server_storages<'a>(
        &'a self,
        ctx: &'a CallContext,
        id: &'a str,
    ) -> ApiFuture<'a, Vec<ServerStorageRelation>> {
        Box::pin(async move {
            require_uuid(id, "id")?;
            let list: StorageRelationList = self
                .execute(ctx, Operation::get(join_path(SERVER_BASE, &[id, "storages"])))
                .await?;
            Ok(list.storage_relations)
        })
    }

    fn link_storage<'a>(
        &'a self,
        ctx: &'a CallContext,
        server_id: &'a str,
        storage_id: &'a str,
        bootdevice: bool,
    ) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            require_uuid(server_id, "server_id")?;
            require_uuid(storage_id, "storage_id")?;
            let body = StorageRelationBody {
                object_uuid: storage_id,
                bootdevice,
            };
            self.execute_discard(
                ctx,
                Operation::post(join_path(SERVER_BASE, &[server_id, "storages"]), body),
            )
            .await
        })
    }

    fn server_ips<'a>(
        &'a self,
        ctx: &'a CallContext,
        id: &'a str,
    ) -> ApiFuture<'a, Vec<ServerIpRelation>> {
        Box::pin(async move {
            require_uuid(id, "id")?;
            let list: IpRelationList = self
                .execute(ctx, Operation::get(join_path(SERVER_BASE, &[id, "ips"])))
                .await?;
            Ok(list.ip_relations)
        })
    }

    fn link_ip<'a>(
        &'a self,
        ctx: &'a CallContext,
        server_id: &'a str,
        ip_id: &'a str,
    ) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            require_uuid(server_id, "server_id")?;
            require_uuid(ip_id, "ip_id")?;
            let body = IpRelationBody { object_uuid: ip_id };
            self.execute_discard(
                ctx,
                Operation::post(join_path(SERVER_BASE, &[server_id, "ips"]), body),
            )
            .await
        })
    }

    fn unlink_ip<'a>(
        &'a self,
        ctx: &'a CallContext,
        server_id: &'a str,
        ip_id: &'a str,
    ) -> ApiFuture<'a, ()> {
        Box::pin(async move {
            require_uuid(server_id, "server_id")?;
            require_uuid(ip_id, "ip_id")?;
            self.execute_discard(
                ctx,
                Operation::delete(join_path(SERVER_BASE, &[server_id, "ips", ip_id])),
            )
            .await
        })
    }
}
