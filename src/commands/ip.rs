//! `gscloud ip …` handlers.

use std::io::Write;
use std::net::IpAddr;

use super::server::id_for_address;
use super::{ApiContext, CommandError, Console};
use crate::context::CallContext;
use crate::objects::{Ip, IpCreateRequest, IpOperations, IpUpdateRequest, ServerOperations};
use crate::render::Table;
use crate::types::IpFamily;

/// Lists IP addresses, optionally of one family only.
///
/// # Errors
///
/// Returns [`CommandError`] when the listing or output fails.
pub async fn list<C, O, E>(
    client: &C,
    ctx: &CallContext,
    console: &mut Console<O, E>,
    family: Option<IpFamily>,
) -> Result<(), CommandError>
where
    C: IpOperations + ?Sized,
    O: Write,
    E: Write,
{
    let addresses: Vec<Ip> = client
        .list_ips(ctx)
        .await
        .context("Couldn't get IP list")?
        .into_iter()
        .filter(|ip| family.is_none_or(|wanted| ip.family == Some(wanted)))
        .collect();
    let mut table = Table::new(&["id", "ip", "assigned", "failover", "family", "reverse dns"]);
    for ip in &addresses {
        table.push(vec![
            ip.object_uuid.clone(),
            ip.ip.clone(),
            if ip.is_assigned() { "assigned" } else { "free" }.to_owned(),
            if ip.failover { "yes" } else { "no" }.to_owned(),
            ip.family
                .map_or_else(String::new, |value| format!("v{value}")),
            ip.reverse_dns.clone(),
        ]);
    }
    console.render(&table, &addresses)
}

/// Releases an IP address, given by identifier or literal address.
///
/// # Errors
///
/// Returns [`CommandError`] when the address is unknown or a call fails.
pub async fn remove<C, O, E>(
    client: &C,
    ctx: &CallContext,
    console: &mut Console<O, E>,
    address: &str,
) -> Result<(), CommandError>
where
    C: IpOperations + ?Sized,
    O: Write,
    E: Write,
{
    let id = resolve(client, ctx, address).await?;
    client
        .delete_ip(ctx, &id)
        .await
        .context("Failed removing IP address")?;
    console.note(format!("Removed {id}"))
}

/// Settings for a new or updated address.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct IpSettings {
    /// Display name; unchanged when empty on update.
    pub name: String,
    /// Failover address.
    pub failover: bool,
    /// Reverse DNS entry; unchanged when empty on update.
    pub reverse_dns: String,
}

/// Allocates an address of `family` and prints it.
///
/// # Errors
///
/// Returns [`CommandError`] when the call or output fails.
pub async fn add<C, O, E>(
    client: &C,
    ctx: &CallContext,
    console: &mut Console<O, E>,
    family: IpFamily,
    settings: IpSettings,
) -> Result<(), CommandError>
where
    C: IpOperations + ?Sized,
    O: Write,
    E: Write,
{
    let created = client
        .create_ip(
            ctx,
            IpCreateRequest {
                name: settings.name,
                family,
                failover: settings.failover,
                reverse_dns: settings.reverse_dns,
                labels: Vec::new(),
            },
        )
        .await
        .context("Adding IP address failed")?;
    console.print(format!("IP added: {}", created.ip))
}

/// Updates the name, failover flag or reverse DNS entry of an address.
/// Empty settings and an unset failover flag leave the value alone.
///
/// # Errors
///
/// Returns [`CommandError`] when the address is unknown or a call fails.
pub async fn set<C, O, E>(
    client: &C,
    ctx: &CallContext,
    console: &mut Console<O, E>,
    address: &str,
    settings: IpSettings,
) -> Result<(), CommandError>
where
    C: IpOperations + ?Sized,
    O: Write,
    E: Write,
{
    let id = resolve(client, ctx, address).await?;
    let request = IpUpdateRequest {
        name: Some(settings.name).filter(|name| !name.is_empty()),
        failover: settings.failover.then_some(true),
        reverse_dns: Some(settings.reverse_dns).filter(|entry| !entry.is_empty()),
        labels: None,
    };
    client
        .update_ip(ctx, &id, request)
        .await
        .context("Could not update IP address")?;
    console.note(format!("Updated {id}"))
}

/// Detaches an address from the server or load balancer using it. The
/// address object itself is kept.
///
/// # Errors
///
/// Returns [`CommandError`] when the address is unknown or a call fails.
pub async fn release<C, O, E>(
    client: &C,
    ctx: &CallContext,
    console: &mut Console<O, E>,
    address: &str,
) -> Result<(), CommandError>
where
    C: IpOperations + ServerOperations + ?Sized,
    O: Write,
    E: Write,
{
    let id = resolve(client, ctx, address).await?;
    let ip = client.get_ip(ctx, &id).await.context("Could not get object")?;
    let owner = ip
        .relations
        .servers
        .first()
        .map(|relation| relation.server_uuid.clone())
        .or_else(|| {
            ip.relations
                .loadbalancers
                .first()
                .map(|relation| relation.loadbalancer_uuid.clone())
        });
    let Some(owner) = owner else {
        return console.note("Not assigned");
    };
    client
        .unlink_ip(ctx, &owner, &id)
        .await
        .context("Could not remove address from server")?;
    console.note(format!("Released {id} from {owner}"))
}

async fn resolve<C>(client: &C, ctx: &CallContext, address: &str) -> Result<String, CommandError>
where
    C: IpOperations + ?Sized,
{
    match address.parse::<IpAddr>() {
        Ok(literal) => id_for_address(client, ctx, literal).await,
        Err(_) => Ok(address.to_owned()),
    }
}
