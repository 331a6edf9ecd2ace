//! `gscloud storage …` handlers.

use std::io::Write;

use tracing::warn;

use super::{ApiContext, CommandError, Console, local_time};
use crate::context::CallContext;
use crate::objects::{StorageOperations, StorageUpdateRequest};
use crate::render::Table;

/// Lists storages.
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
    C: StorageOperations + ?Sized,
    O: Write,
    E: Write,
{
    let storages = client
        .list_storages(ctx)
        .await
        .context("Couldn't get storage list")?;
    let mut table = Table::new(&["id", "name", "capacity", "changed", "status"]);
    for storage in &storages {
        table.push(vec![
            storage.object_uuid.clone(),
            storage.name.clone(),
            storage.capacity.to_string(),
            local_time(storage.change_time),
            storage.status.clone(),
        ]);
    }
    console.render(&table, &storages)
}

/// Deletes a storage.
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
    C: StorageOperations + ?Sized,
    O: Write,
    E: Write,
{
    client
        .delete_storage(ctx, id)
        .await
        .context("Removing storage failed")?;
    console.note(format!("Removed {id}"))
}

/// Renames or resizes a storage. Shrinking needs `force`; without it the
/// storage is left alone and a warning is printed.
///
/// # Errors
///
/// Returns [`CommandError`] when the capacity is zero or a call fails.
pub async fn set<C, O, E>(
    client: &C,
    ctx: &CallContext,
    console: &mut Console<O, E>,
    id: &str,
    name: Option<String>,
    capacity: Option<u32>,
    force: bool,
) -> Result<(), CommandError>
where
    C: StorageOperations + ?Sized,
    O: Write,
    E: Write,
{
    if capacity == Some(0) {
        return Err(CommandError::InvalidArgument(
            "expected storage capacity ≥ 1 GB".to_owned(),
        ));
    }
    if let Some(wanted) = capacity {
        let current = client
            .get_storage(ctx, id)
            .await
            .context("Could not set new capacity")?
            .capacity;
        if wanted < current && !force {
            warn!(id, current, wanted, "refusing to shrink storage");
            return console.note(format!(
                "Downsizing can destroy your data. Re-run with --force to reduce storage size from {current} GB to {wanted} GB"
            ));
        }
    }
    let request = StorageUpdateRequest {
        name: name.filter(|value| !value.is_empty()),
        labels: None,
        capacity,
    };
    client
        .update_storage(ctx, id, request)
        .await
        .context("Could not set property")?;
    console.note(format!("Updated {id}"))
}
