//! Test support utilities shared across unit and integration tests.
//!
//! [`FakeCloud`] is an in-memory account implementing the operations traits
//! used by the command handlers. Calls are recorded in order and individual
//! methods can be made to fail.

use std::collections::{BTreeMap, BTreeSet};
use std::env;
use std::ffi::OsString;
use std::future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, MutexGuard};

use crate::client::{ApiError, ApiFuture, RequestError};
use crate::context::CallContext;
use crate::objects::{
    CreateResponse, Event, Ip, IpCreateRequest, IpCreateResponse, IpOperations, IpServerRelation,
    IpUpdateRequest, IsoImage, IsoImageCreateRequest, IsoImageOperations, IsoImageUpdateRequest,
    Network, NetworkCreateRequest, NetworkOperations, NetworkUpdateRequest, PaaSOperations,
    PaaSSecurityZone, PaaSService, PaaSServiceCreateRequest, PaaSServiceCreateResponse,
    PaaSServiceUpdateRequest, PaaSTemplate, Server, ServerCreateRequest, ServerCreateResponse,
    ServerIpRelation, ServerOperations, ServerStorageRelation, ServerUpdateRequest, SshKey,
    SshKeyCreateRequest, SshKeyOperations, SshKeyUpdateRequest, Storage, StorageCreateRequest,
    StorageOperations, StorageUpdateRequest, Template, TemplateOperations,
};

#[derive(Debug, Default)]
struct CloudState {
    servers: BTreeMap<String, Server>,
    storages: BTreeMap<String, Storage>,
    networks: BTreeMap<String, Network>,
    ips: BTreeMap<String, Ip>,
    sshkeys: BTreeMap<String, SshKey>,
    templates: BTreeMap<String, Template>,
    isoimages: BTreeMap<String, IsoImage>,
    paas_services: BTreeMap<String, PaaSService>,
    paas_templates: BTreeMap<String, PaaSTemplate>,
    server_storages: BTreeMap<String, Vec<ServerStorageRelation>>,
    server_ips: BTreeMap<String, Vec<ServerIpRelation>>,
    events: BTreeMap<String, Vec<Event>>,
    failing: BTreeSet<&'static str>,
    calls: Vec<String>,
    next_id: u32,
}

impl CloudState {
    fn allocate(&mut self, kind: &str) -> String {
        self.next_id += 1;
        format!("{kind}-{}", self.next_id)
    }
}

/// In-memory gridscale account.
#[derive(Clone, Debug, Default)]
pub struct FakeCloud {
    state: Arc<Mutex<CloudState>>,
}

fn not_found(kind: &str, id: &str) -> ApiError {
    ApiError::Request(RequestError {
        title: "Not Found".to_owned(),
        description: format!("{kind} {id} does not exist"),
        status_code: 404,
        request_id: String::new(),
    })
}

fn injected(method: &str) -> ApiError {
    ApiError::Request(RequestError {
        title: "Internal Server Error".to_owned(),
        description: format!("injected failure in {method}"),
        status_code: 500,
        request_id: String::new(),
    })
}

fn lookup<T: Clone>(map: &BTreeMap<String, T>, kind: &str, id: &str) -> Result<T, ApiError> {
    map.get(id).cloned().ok_or_else(|| not_found(kind, id))
}

fn remove<T>(map: &mut BTreeMap<String, T>, kind: &str, id: &str) -> Result<(), ApiError> {
    map.remove(id).map(drop).ok_or_else(|| not_found(kind, id))
}

impl FakeCloud {
    /// Empty account.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, apply: impl FnOnce(&mut CloudState) -> R) -> R {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        apply(&mut state)
    }

    /// Records the call, applies it unless `method` is set to fail, and
    /// returns an already resolved future.
    fn answer<T>(
        &self,
        method: &'static str,
        args: &[&str],
        apply: impl FnOnce(&mut CloudState) -> Result<T, ApiError>,
    ) -> ApiFuture<'static, T>
    where
        T: Send + 'static,
    {
        let result = self.with_state(|state| {
            let mut call = method.to_owned();
            for arg in args {
                call.push(' ');
                call.push_str(arg);
            }
            state.calls.push(call);
            if state.failing.contains(method) {
                Err(injected(method))
            } else {
                apply(state)
            }
        });
        Box::pin(future::ready(result))
    }

    /// Makes every later call of `method` fail with a server error.
    pub fn fail(&self, method: &'static str) {
        self.with_state(|state| {
            state.failing.insert(method);
        });
    }

    /// Calls made so far, as `method arg…` strings.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.with_state(|state| state.calls.clone())
    }

    /// Adds a server.
    pub fn add_server(&self, server: Server) {
        self.with_state(|state| {
            state.servers.insert(server.object_uuid.clone(), server);
        });
    }

    /// Current copy of a server, if it exists.
    #[must_use]
    pub fn server(&self, id: &str) -> Option<Server> {
        self.with_state(|state| state.servers.get(id).cloned())
    }

    /// Adds a storage.
    pub fn add_storage(&self, storage: Storage) {
        self.with_state(|state| {
            state.storages.insert(storage.object_uuid.clone(), storage);
        });
    }

    /// Current copy of a storage, if it exists.
    #[must_use]
    pub fn storage(&self, id: &str) -> Option<Storage> {
        self.with_state(|state| state.storages.get(id).cloned())
    }

    /// Adds a network.
    pub fn add_network(&self, network: Network) {
        self.with_state(|state| {
            state.networks.insert(network.object_uuid.clone(), network);
        });
    }

    /// Adds an IP address.
    pub fn add_ip(&self, ip: Ip) {
        self.with_state(|state| {
            state.ips.insert(ip.object_uuid.clone(), ip);
        });
    }

    /// Adds an SSH key.
    pub fn add_sshkey(&self, key: SshKey) {
        self.with_state(|state| {
            state.sshkeys.insert(key.object_uuid.clone(), key);
        });
    }

    /// Current copy of an SSH key, if it exists.
    #[must_use]
    pub fn sshkey(&self, id: &str) -> Option<SshKey> {
        self.with_state(|state| state.sshkeys.get(id).cloned())
    }

    /// Adds a storage template.
    pub fn add_template(&self, template: Template) {
        self.with_state(|state| {
            state.templates.insert(template.object_uuid.clone(), template);
        });
    }

    /// Adds an ISO image.
    pub fn add_isoimage(&self, image: IsoImage) {
        self.with_state(|state| {
            state.isoimages.insert(image.object_uuid.clone(), image);
        });
    }

    /// Adds a PaaS service template.
    pub fn add_paas_template(&self, template: PaaSTemplate) {
        self.with_state(|state| {
            state
                .paas_templates
                .insert(template.object_uuid.clone(), template);
        });
    }

    /// Adds a platform service.
    pub fn add_paas_service(&self, service: PaaSService) {
        self.with_state(|state| {
            state
                .paas_services
                .insert(service.object_uuid.clone(), service);
        });
    }

    /// Appends an entry to the event log of a server.
    pub fn add_event(&self, server_id: &str, event: Event) {
        self.with_state(|state| {
            state
                .events
                .entry(server_id.to_owned())
                .or_default()
                .push(event);
        });
    }

    /// Storages attached to a server.
    #[must_use]
    pub fn attached_storages(&self, server_id: &str) -> Vec<ServerStorageRelation> {
        self.with_state(|state| {
            state
                .server_storages
                .get(server_id)
                .cloned()
                .unwrap_or_default()
        })
    }

    /// IP addresses assigned to a server.
    #[must_use]
    pub fn assigned_ips(&self, server_id: &str) -> Vec<ServerIpRelation> {
        self.with_state(|state| state.server_ips.get(server_id).cloned().unwrap_or_default())
    }
}

fn attach_ip(state: &mut CloudState, server_id: &str, ip_id: &str) -> Result<(), ApiError> {
    if !state.servers.contains_key(server_id) {
        return Err(not_found("server", server_id));
    }
    let ip = state
        .ips
        .get_mut(ip_id)
        .ok_or_else(|| not_found("ip", ip_id))?;
    ip.relations.servers.push(IpServerRelation {
        server_uuid: server_id.to_owned(),
        create_time: None,
    });
    let relation = ServerIpRelation {
        object_uuid: ip.object_uuid.clone(),
        server_uuid: server_id.to_owned(),
        ip: ip.ip.clone(),
        prefix: ip.prefix.clone(),
        family: ip.family,
        create_time: None,
    };
    state
        .server_ips
        .entry(server_id.to_owned())
        .or_default()
        .push(relation);
    Ok(())
}

fn set_power(state: &mut CloudState, id: &str, power: bool) -> Result<(), ApiError> {
    let server = state
        .servers
        .get_mut(id)
        .ok_or_else(|| not_found("server", id))?;
    server.power = power;
    Ok(())
}

impl ServerOperations for FakeCloud {
    fn list_servers<'a>(&'a self, _ctx: &'a CallContext) -> ApiFuture<'a, Vec<Server>> {
        self.answer("list_servers", &[], |state| {
            Ok(state.servers.values().cloned().collect())
        })
    }

    fn get_server<'a>(&'a self, _ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, Server> {
        self.answer("get_server", &[id], |state| lookup(&state.servers, "server", id))
    }

    fn create_server<'a>(
        &'a self,
        _ctx: &'a CallContext,
        request: ServerCreateRequest,
    ) -> ApiFuture<'a, ServerCreateResponse> {
        let name = request.name.clone();
        self.answer("create_server", &[name.as_str()], move |state| {
            let id = state.allocate("server");
            state.servers.insert(
                id.clone(),
                Server {
                    object_uuid: id.clone(),
                    name: request.name,
                    memory: request.memory,
                    cores: request.cores,
                    hardware_profile: request.hardware_profile,
                    auto_recovery: request.auto_recovery.unwrap_or_default(),
                    availability_zone: request.availability_zone.unwrap_or_default(),
                    ..Server::default()
                },
            );
            Ok(ServerCreateResponse {
                object_uuid: id.clone(),
                server_uuid: id,
                request_uuid: String::new(),
            })
        })
    }

    fn update_server<'a>(
        &'a self,
        _ctx: &'a CallContext,
        id: &'a str,
        request: ServerUpdateRequest,
    ) -> ApiFuture<'a, ()> {
        self.answer("update_server", &[id], move |state| {
            let server = state
                .servers
                .get_mut(id)
                .ok_or_else(|| not_found("server", id))?;
            if let Some(name) = request.name {
                server.name = name;
            }
            if let Some(memory) = request.memory {
                server.memory = memory;
            }
            if let Some(cores) = request.cores {
                server.cores = cores;
            }
            if let Some(labels) = request.labels {
                server.labels = labels;
            }
            Ok(())
        })
    }

    fn delete_server<'a>(&'a self, _ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, ()> {
        self.answer("delete_server", &[id], |state| {
            remove(&mut state.servers, "server", id)?;
            state.server_storages.remove(id);
            state.server_ips.remove(id);
            Ok(())
        })
    }

    fn server_events<'a>(&'a self, _ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, Vec<Event>> {
        self.answer("server_events", &[id], |state| {
            lookup(&state.servers, "server", id)?;
            Ok(state.events.get(id).cloned().unwrap_or_default())
        })
    }

    fn is_server_on<'a>(&'a self, _ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, bool> {
        self.answer("is_server_on", &[id], |state| {
            lookup(&state.servers, "server", id).map(|server| server.power)
        })
    }

    fn start_server<'a>(&'a self, _ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, ()> {
        self.answer("start_server", &[id], |state| set_power(state, id, true))
    }

    fn stop_server<'a>(&'a self, _ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, ()> {
        self.answer("stop_server", &[id], |state| set_power(state, id, false))
    }

    fn shutdown_server<'a>(&'a self, _ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, ()> {
        self.answer("shutdown_server", &[id], |state| set_power(state, id, false))
    }

    fn server_storages<'a>(
        &'a self,
        _ctx: &'a CallContext,
        id: &'a str,
    ) -> ApiFuture<'a, Vec<ServerStorageRelation>> {
        self.answer("server_storages", &[id], |state| {
            lookup(&state.servers, "server", id)?;
            Ok(state.server_storages.get(id).cloned().unwrap_or_default())
        })
    }

    fn link_storage<'a>(
        &'a self,
        _ctx: &'a CallContext,
        server_id: &'a str,
        storage_id: &'a str,
        bootdevice: bool,
    ) -> ApiFuture<'a, ()> {
        self.answer("link_storage", &[server_id, storage_id], move |state| {
            lookup(&state.servers, "server", server_id)?;
            let storage = lookup(&state.storages, "storage", storage_id)?;
            state
                .server_storages
                .entry(server_id.to_owned())
                .or_default()
                .push(ServerStorageRelation {
                    object_uuid: storage.object_uuid,
                    object_name: storage.name,
                    capacity: storage.capacity,
                    storage_type: storage
                        .storage_type
                        .map_or_else(String::new, |kind| kind.to_string()),
                    bootdevice,
                    create_time: None,
                });
            Ok(())
        })
    }

    fn server_ips<'a>(
        &'a self,
        _ctx: &'a CallContext,
        id: &'a str,
    ) -> ApiFuture<'a, Vec<ServerIpRelation>> {
        self.answer("server_ips", &[id], |state| {
            lookup(&state.servers, "server", id)?;
            Ok(state.server_ips.get(id).cloned().unwrap_or_default())
        })
    }

    fn link_ip<'a>(
        &'a self,
        _ctx: &'a CallContext,
        server_id: &'a str,
        ip_id: &'a str,
    ) -> ApiFuture<'a, ()> {
        self.answer("link_ip", &[server_id, ip_id], |state| {
            attach_ip(state, server_id, ip_id)
        })
    }

    fn unlink_ip<'a>(
        &'a self,
        _ctx: &'a CallContext,
        server_id: &'a str,
        ip_id: &'a str,
    ) -> ApiFuture<'a, ()> {
        self.answer("unlink_ip", &[server_id, ip_id], |state| {
            if let Some(relations) = state.server_ips.get_mut(server_id) {
                relations.retain(|relation| relation.object_uuid != ip_id);
            }
            if let Some(ip) = state.ips.get_mut(ip_id) {
                ip.relations
                    .servers
                    .retain(|relation| relation.server_uuid != server_id);
            }
            Ok(())
        })
    }
}

impl StorageOperations for FakeCloud {
    fn list_storages<'a>(&'a self, _ctx: &'a CallContext) -> ApiFuture<'a, Vec<Storage>> {
        self.answer("list_storages", &[], |state| {
            Ok(state.storages.values().cloned().collect())
        })
    }

    fn get_storage<'a>(&'a self, _ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, Storage> {
        self.answer("get_storage", &[id], |state| lookup(&state.storages, "storage", id))
    }

    fn create_storage<'a>(
        &'a self,
        _ctx: &'a CallContext,
        request: StorageCreateRequest,
    ) -> ApiFuture<'a, CreateResponse> {
        let name = request.name.clone();
        self.answer("create_storage", &[name.as_str()], move |state| {
            let id = state.allocate("storage");
            state.storages.insert(
                id.clone(),
                Storage {
                    object_uuid: id.clone(),
                    name: request.name,
                    capacity: request.capacity,
                    storage_type: request.storage_type,
                    last_used_template: request
                        .template
                        .map(|template| template.template_uuid)
                        .unwrap_or_default(),
                    labels: request.labels,
                    ..Storage::default()
                },
            );
            Ok(CreateResponse {
                object_uuid: id,
                request_uuid: String::new(),
            })
        })
    }

    fn update_storage<'a>(
        &'a self,
        _ctx: &'a CallContext,
        id: &'a str,
        request: StorageUpdateRequest,
    ) -> ApiFuture<'a, ()> {
        self.answer("update_storage", &[id], move |state| {
            let storage = state
                .storages
                .get_mut(id)
                .ok_or_else(|| not_found("storage", id))?;
            if let Some(name) = request.name {
                storage.name = name;
            }
            if let Some(capacity) = request.capacity {
                storage.capacity = capacity;
            }
            if let Some(labels) = request.labels {
                storage.labels = labels;
            }
            Ok(())
        })
    }

    fn delete_storage<'a>(&'a self, _ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, ()> {
        self.answer("delete_storage", &[id], |state| {
            remove(&mut state.storages, "storage", id)
        })
    }

    fn clone_storage<'a>(
        &'a self,
        _ctx: &'a CallContext,
        id: &'a str,
    ) -> ApiFuture<'a, CreateResponse> {
        self.answer("clone_storage", &[id], |state| {
            let source = lookup(&state.storages, "storage", id)?;
            let clone_id = state.allocate("storage");
            state.storages.insert(
                clone_id.clone(),
                Storage {
                    object_uuid: clone_id.clone(),
                    parent_uuid: source.object_uuid.clone(),
                    ..source
                },
            );
            Ok(CreateResponse {
                object_uuid: clone_id,
                request_uuid: String::new(),
            })
        })
    }
}

impl NetworkOperations for FakeCloud {
    fn list_networks<'a>(&'a self, _ctx: &'a CallContext) -> ApiFuture<'a, Vec<Network>> {
        self.answer("list_networks", &[], |state| {
            Ok(state.networks.values().cloned().collect())
        })
    }

    fn get_network<'a>(&'a self, _ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, Network> {
        self.answer("get_network", &[id], |state| lookup(&state.networks, "network", id))
    }

    fn create_network<'a>(
        &'a self,
        _ctx: &'a CallContext,
        request: NetworkCreateRequest,
    ) -> ApiFuture<'a, CreateResponse> {
        let name = request.name.clone();
        self.answer("create_network", &[name.as_str()], move |state| {
            let id = state.allocate("network");
            state.networks.insert(
                id.clone(),
                Network {
                    object_uuid: id.clone(),
                    name: request.name,
                    labels: request.labels,
                    ..Network::default()
                },
            );
            Ok(CreateResponse {
                object_uuid: id,
                request_uuid: String::new(),
            })
        })
    }

    fn update_network<'a>(
        &'a self,
        _ctx: &'a CallContext,
        id: &'a str,
        request: NetworkUpdateRequest,
    ) -> ApiFuture<'a, ()> {
        self.answer("update_network", &[id], move |state| {
            let network = state
                .networks
                .get_mut(id)
                .ok_or_else(|| not_found("network", id))?;
            if let Some(name) = request.name {
                network.name = name;
            }
            if let Some(labels) = request.labels {
                network.labels = labels;
            }
            Ok(())
        })
    }

    fn delete_network<'a>(&'a self, _ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, ()> {
        self.answer("delete_network", &[id], |state| {
            remove(&mut state.networks, "network", id)
        })
    }

    fn public_network<'a>(&'a self, _ctx: &'a CallContext) -> ApiFuture<'a, Network> {
        self.answer("public_network", &[], |state| {
            state
                .networks
                .values()
                .find(|network| network.public_net)
                .cloned()
                .ok_or_else(|| ApiError::NotFound("Public Network not found".to_owned()))
        })
    }
}

impl IpOperations for FakeCloud {
    fn list_ips<'a>(&'a self, _ctx: &'a CallContext) -> ApiFuture<'a, Vec<Ip>> {
        self.answer("list_ips", &[], |state| Ok(state.ips.values().cloned().collect()))
    }

    fn get_ip<'a>(&'a self, _ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, Ip> {
        self.answer("get_ip", &[id], |state| lookup(&state.ips, "ip", id))
    }

    fn create_ip<'a>(
        &'a self,
        _ctx: &'a CallContext,
        request: IpCreateRequest,
    ) -> ApiFuture<'a, IpCreateResponse> {
        self.answer("create_ip", &[], move |state| {
            let id = state.allocate("ip");
            let address = format!("192.0.2.{}", state.next_id);
            state.ips.insert(
                id.clone(),
                Ip {
                    object_uuid: id.clone(),
                    name: request.name,
                    ip: address.clone(),
                    family: Some(request.family),
                    failover: request.failover,
                    reverse_dns: request.reverse_dns,
                    labels: request.labels,
                    ..Ip::default()
                },
            );
            Ok(IpCreateResponse {
                request_uuid: String::new(),
                object_uuid: id,
                prefix: format!("{address}/32"),
                ip: address,
            })
        })
    }

    fn update_ip<'a>(
        &'a self,
        _ctx: &'a CallContext,
        id: &'a str,
        request: IpUpdateRequest,
    ) -> ApiFuture<'a, ()> {
        self.answer("update_ip", &[id], move |state| {
            let ip = state.ips.get_mut(id).ok_or_else(|| not_found("ip", id))?;
            if let Some(name) = request.name {
                ip.name = name;
            }
            if let Some(failover) = request.failover {
                ip.failover = failover;
            }
            if let Some(reverse_dns) = request.reverse_dns {
                ip.reverse_dns = reverse_dns;
            }
            if let Some(labels) = request.labels {
                ip.labels = labels;
            }
            Ok(())
        })
    }

    fn delete_ip<'a>(&'a self, _ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, ()> {
        self.answer("delete_ip", &[id], |state| remove(&mut state.ips, "ip", id))
    }
}

impl SshKeyOperations for FakeCloud {
    fn list_sshkeys<'a>(&'a self, _ctx: &'a CallContext) -> ApiFuture<'a, Vec<SshKey>> {
        self.answer("list_sshkeys", &[], |state| {
            Ok(state.sshkeys.values().cloned().collect())
        })
    }

    fn get_sshkey<'a>(&'a self, _ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, SshKey> {
        self.answer("get_sshkey", &[id], |state| lookup(&state.sshkeys, "sshkey", id))
    }

    fn create_sshkey<'a>(
        &'a self,
        _ctx: &'a CallContext,
        request: SshKeyCreateRequest,
    ) -> ApiFuture<'a, CreateResponse> {
        let name = request.name.clone();
        self.answer("create_sshkey", &[name.as_str()], move |state| {
            let id = state.allocate("sshkey");
            state.sshkeys.insert(
                id.clone(),
                SshKey {
                    object_uuid: id.clone(),
                    name: request.name,
                    sshkey: request.sshkey,
                    labels: request.labels,
                    ..SshKey::default()
                },
            );
            Ok(CreateResponse {
                object_uuid: id,
                request_uuid: String::new(),
            })
        })
    }

    fn update_sshkey<'a>(
        &'a self,
        _ctx: &'a CallContext,
        id: &'a str,
        request: SshKeyUpdateRequest,
    ) -> ApiFuture<'a, ()> {
        self.answer("update_sshkey", &[id], move |state| {
            let key = state
                .sshkeys
                .get_mut(id)
                .ok_or_else(|| not_found("sshkey", id))?;
            if let Some(name) = request.name {
                key.name = name;
            }
            if let Some(sshkey) = request.sshkey {
                key.sshkey = sshkey;
            }
            if let Some(labels) = request.labels {
                key.labels = labels;
            }
            Ok(())
        })
    }

    fn delete_sshkey<'a>(&'a self, _ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, ()> {
        self.answer("delete_sshkey", &[id], |state| {
            remove(&mut state.sshkeys, "sshkey", id)
        })
    }
}

impl TemplateOperations for FakeCloud {
    fn list_templates<'a>(&'a self, _ctx: &'a CallContext) -> ApiFuture<'a, Vec<Template>> {
        self.answer("list_templates", &[], |state| {
            Ok(state.templates.values().cloned().collect())
        })
    }

    fn get_template<'a>(&'a self, _ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, Template> {
        self.answer("get_template", &[id], |state| {
            lookup(&state.templates, "template", id)
        })
    }

    fn template_by_name<'a>(
        &'a self,
        _ctx: &'a CallContext,
        name: &'a str,
    ) -> ApiFuture<'a, Template> {
        self.answer("template_by_name", &[name], |state| {
            state
                .templates
                .values()
                .find(|template| template.name == name)
                .cloned()
                .ok_or_else(|| ApiError::NotFound(format!("Template {name} not found")))
        })
    }

    fn delete_template<'a>(&'a self, _ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, ()> {
        self.answer("delete_template", &[id], |state| {
            remove(&mut state.templates, "template", id)
        })
    }
}

impl IsoImageOperations for FakeCloud {
    fn list_isoimages<'a>(&'a self, _ctx: &'a CallContext) -> ApiFuture<'a, Vec<IsoImage>> {
        self.answer("list_isoimages", &[], |state| {
            Ok(state.isoimages.values().cloned().collect())
        })
    }

    fn get_isoimage<'a>(&'a self, _ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, IsoImage> {
        self.answer("get_isoimage", &[id], |state| {
            lookup(&state.isoimages, "isoimage", id)
        })
    }

    fn create_isoimage<'a>(
        &'a self,
        _ctx: &'a CallContext,
        request: IsoImageCreateRequest,
    ) -> ApiFuture<'a, CreateResponse> {
        let name = request.name.clone();
        self.answer("create_isoimage", &[name.as_str()], move |state| {
            let id = state.allocate("isoimage");
            state.isoimages.insert(
                id.clone(),
                IsoImage {
                    object_uuid: id.clone(),
                    name: request.name,
                    source_url: request.source_url,
                    labels: request.labels,
                    private: true,
                    ..IsoImage::default()
                },
            );
            Ok(CreateResponse {
                object_uuid: id,
                request_uuid: String::new(),
            })
        })
    }

    fn update_isoimage<'a>(
        &'a self,
        _ctx: &'a CallContext,
        id: &'a str,
        request: IsoImageUpdateRequest,
    ) -> ApiFuture<'a, ()> {
        self.answer("update_isoimage", &[id], move |state| {
            let image = state
                .isoimages
                .get_mut(id)
                .ok_or_else(|| not_found("isoimage", id))?;
            if let Some(name) = request.name {
                image.name = name;
            }
            if let Some(labels) = request.labels {
                image.labels = labels;
            }
            Ok(())
        })
    }

    fn delete_isoimage<'a>(&'a self, _ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, ()> {
        self.answer("delete_isoimage", &[id], |state| {
            remove(&mut state.isoimages, "isoimage", id)
        })
    }
}

impl PaaSOperations for FakeCloud {
    fn list_paas_services<'a>(&'a self, _ctx: &'a CallContext) -> ApiFuture<'a, Vec<PaaSService>> {
        self.answer("list_paas_services", &[], |state| {
            Ok(state.paas_services.values().cloned().collect())
        })
    }

    fn get_paas_service<'a>(
        &'a self,
        _ctx: &'a CallContext,
        id: &'a str,
    ) -> ApiFuture<'a, PaaSService> {
        self.answer("get_paas_service", &[id], |state| {
            lookup(&state.paas_services, "paas service", id)
        })
    }

    fn create_paas_service<'a>(
        &'a self,
        _ctx: &'a CallContext,
        request: PaaSServiceCreateRequest,
    ) -> ApiFuture<'a, PaaSServiceCreateResponse> {
        let name = request.name.clone();
        self.answer("create_paas_service", &[name.as_str()], move |state| {
            let id = state.allocate("paas");
            state.paas_services.insert(
                id.clone(),
                PaaSService {
                    object_uuid: id.clone(),
                    name: request.name,
                    labels: request.labels,
                    service_template_uuid: request.paas_service_template_uuid,
                    resource_limits: request.resource_limits,
                    parameters: request.parameters,
                    ..PaaSService::default()
                },
            );
            Ok(PaaSServiceCreateResponse {
                paas_service_uuid: id.clone(),
                object_uuid: id,
                ..PaaSServiceCreateResponse::default()
            })
        })
    }

    fn update_paas_service<'a>(
        &'a self,
        _ctx: &'a CallContext,
        id: &'a str,
        request: PaaSServiceUpdateRequest,
    ) -> ApiFuture<'a, ()> {
        self.answer("update_paas_service", &[id], move |state| {
            let service = state
                .paas_services
                .get_mut(id)
                .ok_or_else(|| not_found("paas service", id))?;
            if let Some(name) = request.name {
                service.name = name;
            }
            if let Some(labels) = request.labels {
                service.labels = labels;
            }
            if let Some(parameters) = request.parameters {
                service.parameters = parameters;
            }
            if let Some(limits) = request.resource_limits {
                service.resource_limits = limits;
            }
            Ok(())
        })
    }

    fn delete_paas_service<'a>(&'a self, _ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, ()> {
        self.answer("delete_paas_service", &[id], |state| {
            remove(&mut state.paas_services, "paas service", id)
        })
    }

    fn list_paas_templates<'a>(&'a self, _ctx: &'a CallContext) -> ApiFuture<'a, Vec<PaaSTemplate>> {
        self.answer("list_paas_templates", &[], |state| {
            Ok(state.paas_templates.values().cloned().collect())
        })
    }

    fn renew_k8s_credentials<'a>(&'a self, _ctx: &'a CallContext, id: &'a str) -> ApiFuture<'a, ()> {
        self.answer("renew_k8s_credentials", &[id], |state| {
            lookup(&state.paas_services, "paas service", id).map(drop)
        })
    }

    fn list_paas_security_zones<'a>(
        &'a self,
        _ctx: &'a CallContext,
    ) -> ApiFuture<'a, Vec<PaaSSecurityZone>> {
        self.answer("list_paas_security_zones", &[], |_| Ok(Vec::new()))
    }
}

/// Global mutex used to serialise environment mutation in tests.
pub static ENV_LOCK: AsyncMutex<()> = AsyncMutex::const_new(());

/// Guard that holds the env mutex and restores variables on drop.
pub struct EnvGuard {
    previous: Vec<(String, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Sets and clears environment variables while holding a global mutex.
    /// A `None` value removes the variable for the guard's lifetime.
    pub async fn set_vars(pairs: &[(&str, Option<&str>)]) -> Self {
        debug_assert!(
            {
                let mut seen = BTreeSet::new();
                pairs.iter().all(|(key, _)| seen.insert(*key))
            },
            "duplicate environment variable keys passed to EnvGuard::set_vars"
        );

        let guard = ENV_LOCK.lock().await;
        let mut previous = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let old = env::var_os(key);
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`, preventing races.
            unsafe {
                match value {
                    Some(new_value) => env::set_var(key, new_value),
                    None => env::remove_var(key),
                }
            }
            previous.push(((*key).to_owned(), old));
        }

        Self {
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old) in &self.previous {
            // SAFETY: Environment mutation is serialised by holding `_guard`.
            unsafe {
                match old {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }
    }
}
