//! `gscloud info`: the selected account and how many objects it holds.

use std::io::Write;

use serde::Serialize;

use super::{ApiContext, CommandError, Console};
use crate::config::AccountSettings;
use crate::context::CallContext;
use crate::objects::{IpOperations, PaaSOperations, ServerOperations, StorageOperations};
use crate::render::{Format, Table};

/// Object counts of an account.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ObjectCounts {
    /// Servers.
    pub server_count: usize,
    /// Storages.
    pub storage_count: usize,
    /// IP addresses.
    pub ip_address_count: usize,
    /// Platform services.
    pub platform_service_count: usize,
}

#[derive(Serialize)]
struct Summary<'a> {
    #[serde(flatten)]
    account: &'a AccountSettings,
    #[serde(flatten)]
    counts: ObjectCounts,
}

/// Counts servers, storages, addresses and platform services concurrently.
///
/// # Errors
///
/// Returns [`CommandError::Api`] naming the first listing that failed.
pub async fn count_objects<C>(client: &C, ctx: &CallContext) -> Result<ObjectCounts, CommandError>
where
    C: IpOperations + PaaSOperations + ServerOperations + StorageOperations + ?Sized,
{
    let (servers, storages, addresses, services) = tokio::try_join!(
        async { client.list_servers(ctx).await.context("Could not get Servers") },
        async { client.list_storages(ctx).await.context("Could not get Storages") },
        async { client.list_ips(ctx).await.context("Could not get IP addresses") },
        async {
            client
                .list_paas_services(ctx)
                .await
                .context("Could not get Platform services")
        },
    )?;
    Ok(ObjectCounts {
        server_count: servers.len(),
        storage_count: storages.len(),
        ip_address_count: addresses.len(),
        platform_service_count: services.len(),
    })
}

/// Prints the account settings in use followed by its object counts. JSON
/// output merges both into one document.
///
/// # Errors
///
/// Returns [`CommandError`] when a listing or output fails.
pub async fn info<C, O, E>(
    client: &C,
    ctx: &CallContext,
    console: &mut Console<O, E>,
    account: &AccountSettings,
) -> Result<(), CommandError>
where
    C: IpOperations + PaaSOperations + ServerOperations + StorageOperations + ?Sized,
    O: Write,
    E: Write,
{
    let json = console.options().format == Format::Json;
    if !json {
        let mut settings = Table::new(&["setting", "value"]);
        for (setting, value) in [
            ("Account", account.name.clone().unwrap_or_default()),
            ("User ID", account.user_id.clone()),
            ("API token", account.token.clone()),
            ("URL", account.url.clone()),
        ] {
            settings.push(vec![setting.to_owned(), value]);
        }
        console.table(&settings)?;
    }
    console.note("Getting information about used resources…")?;
    let counts = count_objects(client, ctx).await?;
    let mut objects = Table::new(&["object", "count"]);
    for (object, count) in [
        ("Servers", counts.server_count),
        ("Storages", counts.storage_count),
        ("IP addresses", counts.ip_address_count),
        ("Platform services", counts.platform_service_count),
    ] {
        objects.push(vec![object.to_owned(), count.to_string()]);
    }
    if json {
        console.render(&objects, &Summary { account, counts })
    } else {
        console.table(&objects)
    }
}
