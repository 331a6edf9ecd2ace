//! `gscloud server …` handlers.

use std::io::Write;
use std::net::IpAddr;

use rand::Rng;
use rand::seq::SliceRandom;
use tracing::{error, info};

use super::{ApiContext, CommandError, Console, local_time};
use crate::context::CallContext;
use crate::objects::{
    IpOperations, ServerCreateRequest, ServerIpRelation, ServerOperations, ServerStorageRelation,
    ServerUpdateRequest, StorageCreateRequest, StorageOperations, StorageTemplate,
    TemplateOperations,
};
use crate::render::Table;
use crate::types::{HardwareProfile, PasswordType, StorageType};

const PASSWORD_LENGTH: usize = 12;
const PASSWORD_DIGITS: usize = 6;
const PASSWORD_SYMBOLS: usize = 2;
const LETTERS: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const DIGITS: &[u8] = b"0123456789";
const SYMBOLS: &[u8] = b"~!@#$%^&*()_+-={}[]:<>?,./";

/// Arguments of `server create`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CreateServer {
    /// Server name.
    pub name: String,
    /// Core count.
    pub cores: u32,
    /// Memory in GB.
    pub memory: u32,
    /// Hardware profile.
    pub profile: HardwareProfile,
    /// Availability zone.
    pub availability_zone: Option<String>,
    /// Restart automatically after a failure.
    pub auto_recovery: bool,
    /// Name of the template to provision a boot storage from.
    pub template: Option<String>,
    /// Boot storage size in GB.
    pub storage_size: u32,
    /// Host name of the provisioned system.
    pub hostname: Option<String>,
    /// Root password; generated when absent.
    pub password: Option<String>,
}

/// Arguments of `server rm`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RemoveServer {
    /// Server to remove.
    pub id: String,
    /// Power off first and actually delete related objects.
    pub force: bool,
    /// Also remove attached storages and assigned IP addresses.
    pub include_related: bool,
}

/// Lists servers.
///
/// # Errors
///
/// Returns [`CommandError`] when the listing or output fails.
pub async fn list<C, O, E>(
    client: &C,
    ctx: &CallContext,
    console: &mut Console<O, E>,
) -> Result<(), CommandError>
where
    C: ServerOperations + ?Sized,
    O: Write,
    E: Write,
{
    let servers = client
        .list_servers(ctx)
        .await
        .context("Couldn't get server list")?;
    let mut table = Table::new(&["id", "name", "core", "mem", "changed", "power"]);
    for server in &servers {
        table.push(vec![
            server.object_uuid.clone(),
            server.name.clone(),
            server.cores.to_string(),
            server.memory.to_string(),
            local_time(server.change_time),
            if server.power { "on" } else { "off" }.to_owned(),
        ]);
    }
    console.render(&table, &servers)
}

/// Powers a server on.
///
/// # Errors
///
/// Returns [`CommandError::Api`] when the call fails.
pub async fn on<C>(client: &C, ctx: &CallContext, id: &str) -> Result<(), CommandError>
where
    C: ServerOperations + ?Sized,
{
    client
        .start_server(ctx, id)
        .await
        .context("Failed starting server")
}

/// Shuts a server down via ACPI, or cuts power when `force` is set.
///
/// # Errors
///
/// Returns [`CommandError::Api`] when the call fails.
pub async fn off<C>(client: &C, ctx: &CallContext, id: &str, force: bool) -> Result<(), CommandError>
where
    C: ServerOperations + ?Sized,
{
    if force {
        client
            .stop_server(ctx, id)
            .await
            .context("Failed stopping server")
    } else {
        client
            .shutdown_server(ctx, id)
            .await
            .context("Failed shutting down server")
    }
}

/// Removes a server, optionally with its storages and IP addresses.
///
/// With `include_related` but without `force` the related objects are only
/// listed.
///
/// # Errors
///
/// Returns [`CommandError`] when a lookup, power-off or deletion fails.
pub async fn remove<C, O, E>(
    client: &C,
    ctx: &CallContext,
    console: &mut Console<O, E>,
    args: &RemoveServer,
) -> Result<(), CommandError>
where
    C: ServerOperations + StorageOperations + IpOperations + ?Sized,
    O: Write,
    E: Write,
{
    let id = args.id.as_str();
    let server = client
        .get_server(ctx, id)
        .await
        .context("Look up server failed")?;
    if args.force && server.power {
        client
            .stop_server(ctx, id)
            .await
            .context("Failed stopping server")?;
    }

    let mut storages: Vec<ServerStorageRelation> = Vec::new();
    let mut addresses: Vec<ServerIpRelation> = Vec::new();
    if args.include_related {
        storages = client
            .server_storages(ctx, id)
            .await
            .context("Could not get related storages")?;
        addresses = client
            .server_ips(ctx, id)
            .await
            .context("Could not get assigned IP addresses")?;

        let quiet = console.options().quiet;
        if !quiet {
            let mut table = Table::new(&["id", "type", "name"]);
            table.push(vec![id.to_owned(), "Server".to_owned(), server.name.clone()]);
            for storage in &storages {
                table.push(vec![
                    storage.object_uuid.clone(),
                    "Storage".to_owned(),
                    storage.object_name.clone(),
                ]);
            }
            for address in &addresses {
                let family = address
                    .family
                    .map_or_else(String::new, |family| family.to_string());
                table.push(vec![
                    address.object_uuid.clone(),
                    format!("IPv{family} address"),
                    address.ip.clone(),
                ]);
            }
            console.table(&table)?;
        }
        if !args.force {
            let hint = if quiet {
                "Re-run with --force to remove"
            } else {
                "Re-run with --force to remove above objects"
            };
            console.note(format!("This can destroy your data. {hint}"))?;
            return Ok(());
        }
    }

    client
        .delete_server(ctx, id)
        .await
        .context("Deleting server failed")?;
    console.note(format!("Removed {id}"))?;

    for storage in &storages {
        client
            .delete_storage(ctx, &storage.object_uuid)
            .await
            .context("Failed removing storage")?;
        console.note(format!("Removed {}", storage.object_uuid))?;
    }
    for address in &addresses {
        client
            .delete_ip(ctx, &address.object_uuid)
            .await
            .context("Failed removing IP address")?;
        console.note(format!("Removed {}", address.object_uuid))?;
    }
    Ok(())
}

/// Creates a server, optionally with a boot storage provisioned from a
/// template. The server is deleted again when the storage steps fail.
///
/// # Errors
///
/// Returns [`CommandError`] when the template lookup or a create or link
/// call fails.
pub async fn create<C, O, E>(
    client: &C,
    ctx: &CallContext,
    console: &mut Console<O, E>,
    args: CreateServer,
) -> Result<(), CommandError>
where
    C: ServerOperations + StorageOperations + TemplateOperations + ?Sized,
    O: Write,
    E: Write,
{
    let CreateServer {
        name,
        cores,
        memory,
        profile,
        availability_zone,
        auto_recovery,
        template,
        storage_size,
        hostname,
        password,
    } = args;
    let template = match template.as_deref() {
        Some(template_name) => Some(
            client
                .template_by_name(ctx, template_name)
                .await
                .context("Cannot create server")?,
        ),
        None => None,
    };

    let server = client
        .create_server(
            ctx,
            ServerCreateRequest {
                name: name.clone(),
                memory,
                cores,
                hardware_profile: Some(profile),
                availability_zone,
                auto_recovery: Some(auto_recovery),
                ..ServerCreateRequest::default()
            },
        )
        .await
        .context("Creating server failed")?;
    info!(server = %server.object_uuid, "server created");

    let Some(template) = template else {
        console.print(format!("Server created: {}", server.object_uuid))?;
        return Ok(());
    };

    let password = password.unwrap_or_else(|| generate_password(&mut rand::thread_rng()));
    let provisioned = provision_boot_storage(
        client,
        ctx,
        &server.object_uuid,
        StorageCreateRequest {
            capacity: storage_size,
            name,
            storage_type: Some(StorageType::Storage),
            template: Some(StorageTemplate {
                template_uuid: template.object_uuid,
                password: Some(password.clone()),
                password_type: Some(PasswordType::Plain),
                hostname,
                sshkeys: Vec::new(),
            }),
            labels: Vec::new(),
        },
    )
    .await;

    match provisioned {
        Ok(storage_id) => {
            console.print(format!("Server created: {}", server.object_uuid))?;
            console.print(format!("Storage created: {storage_id}"))?;
            console.print(format!("Password: {password}"))?;
            Ok(())
        }
        Err(err) => {
            if let Err(cleanup) = client.delete_server(ctx, &server.object_uuid).await {
                error!(
                    server = %server.object_uuid,
                    error = %cleanup,
                    "failed to delete server after storage setup failed"
                );
            }
            Err(err)
        }
    }
}

async fn provision_boot_storage<C>(
    client: &C,
    ctx: &CallContext,
    server_id: &str,
    request: StorageCreateRequest,
) -> Result<String, CommandError>
where
    C: ServerOperations + StorageOperations + ?Sized,
{
    let storage = client
        .create_storage(ctx, request)
        .await
        .context("Creating storage failed")?;
    client
        .link_storage(ctx, server_id, &storage.object_uuid, true)
        .await
        .context("Linking storage to server failed")?;
    Ok(storage.object_uuid)
}

/// Generates a 12-character password with six digits and two symbols.
#[must_use]
pub fn generate_password<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut chars: Vec<u8> = Vec::with_capacity(PASSWORD_LENGTH);
    let letters = PASSWORD_LENGTH - PASSWORD_DIGITS - PASSWORD_SYMBOLS;
    for (pool, count) in [
        (DIGITS, PASSWORD_DIGITS),
        (SYMBOLS, PASSWORD_SYMBOLS),
        (LETTERS, letters),
    ] {
        chars.extend(pool.choose_multiple(rng, count).copied());
    }
    chars.shuffle(rng);
    chars.into_iter().map(char::from).collect()
}

/// Updates name, cores or memory of a server.
///
/// # Errors
///
/// Returns [`CommandError::Api`] when the call fails.
pub async fn set<C>(
    client: &C,
    ctx: &CallContext,
    id: &str,
    update: ServerUpdateRequest,
) -> Result<(), CommandError>
where
    C: ServerOperations + ?Sized,
{
    client
        .update_server(ctx, id, update)
        .await
        .context("Failed setting property")
}

/// Lists the event log of a server. Quiet mode prints request ids.
///
/// # Errors
///
/// Returns [`CommandError`] when the listing or output fails.
pub async fn events<C, O, E>(
    client: &C,
    ctx: &CallContext,
    console: &mut Console<O, E>,
    id: &str,
) -> Result<(), CommandError>
where
    C: ServerOperations + ?Sized,
    O: Write,
    E: Write,
{
    let events = client
        .server_events(ctx, id)
        .await
        .context("Could not get list of events")?;
    let mut table = Table::new(&["request id", "time", "request type", "details", "initiator"]);
    for event in &events {
        table.push(vec![
            event.request_uuid.clone(),
            local_time(event.timestamp),
            event.request_type.clone(),
            event.change.clone(),
            event.initiator.clone(),
        ]);
    }
    console.render(&table, &events)
}

/// Assigns an IP address to a server. `address` is an IP address
/// identifier or a literal address owned by the account.
///
/// # Errors
///
/// Returns [`CommandError`] when the address is unknown or the call fails.
pub async fn assign<C>(
    client: &C,
    ctx: &CallContext,
    server_id: &str,
    address: &str,
) -> Result<(), CommandError>
where
    C: ServerOperations + IpOperations + ?Sized,
{
    let ip_id = match address.parse::<IpAddr>() {
        Ok(literal) => id_for_address(client, ctx, literal).await?,
        Err(_) => address.to_owned(),
    };
    client
        .link_ip(ctx, server_id, &ip_id)
        .await
        .context("Could not assign IP address")
}

pub(crate) async fn id_for_address<C>(
    client: &C,
    ctx: &CallContext,
    address: IpAddr,
) -> Result<String, CommandError>
where
    C: IpOperations + ?Sized,
{
    let addresses = client
        .list_ips(ctx)
        .await
        .context("Could not get list of IP addresses")?;
    addresses
        .into_iter()
        .find(|ip| ip.ip.parse::<IpAddr>().is_ok_and(|candidate| candidate == address))
        .map(|ip| ip.object_uuid)
        .ok_or_else(|| CommandError::InvalidArgument(format!("IP address {address} not found")))
}
