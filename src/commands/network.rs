//! `gscloud network …` handlers.

use std::io::Write;

use super::{ApiContext, CommandError, Console, local_time};
use crate::context::CallContext;
use crate::objects::{NetworkCreateRequest, NetworkOperations};
use crate::render::Table;

/// Lists networks.
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
    C: NetworkOperations + ?Sized,
    O: Write,
    E: Write,
{
    let networks = client
        .list_networks(ctx)
        .await
        .context("Couldn't get network list")?;
    let mut table = Table::new(&["id", "name", "location", "changed", "status"]);
    for network in &networks {
        table.push(vec![
            network.object_uuid.clone(),
            network.name.clone(),
            network.location_name.clone(),
            local_time(network.change_time),
            network.status.clone(),
        ]);
    }
    console.render(&table, &networks)
}

/// Deletes a network.
///
/// # Errors
///
/// Returns [`CommandError`] when the call or output fails.
pub async fn remove<C, O, E>(
    client: &C,
    ctx: &CallContext,
    console: &mut Console<O, E>,
    id: &str,
) -> Result<(), CommandError>
where
    C: NetworkOperations + ?Sized,
    O: Write,
    E: Write,
{
    client
        .delete_network(ctx, id)
        .await
        .context("Removing network failed")?;
    console.note(format!("Removed {id}"))
}

/// Creates a network and prints its identifier.
///
/// # Errors
///
/// Returns [`CommandError`] when the call or output fails.
pub async fn create<C, O, E>(
    client: &C,
    ctx: &CallContext,
    console: &mut Console<O, E>,
    name: &str,
) -> Result<(), CommandError>
where
    C: NetworkOperations + ?Sized,
    O: Write,
    E: Write,
{
    let created = client
        .create_network(
            ctx,
            NetworkCreateRequest {
                name: name.to_owned(),
                ..NetworkCreateRequest::default()
            },
        )
        .await
        .context("Creating network failed")?;
    console.print(format!("Network created: {}", created.object_uuid))
}
