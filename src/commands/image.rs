//! `gscloud template ls` and `gscloud iso-image …`.

use std::io::Write;

use super::{ApiContext, CommandError, Console, local_time};
use crate::context::CallContext;
use crate::objects::{IsoImageCreateRequest, IsoImageOperations, TemplateOperations};
use crate::render::Table;

/// Lists storage templates.
///
/// # Errors
///
/// Returns [`CommandError`] when the listing or output fails.
pub async fn templates<C, O, E>(
    client: &C,
    ctx: &CallContext,
    console: &mut Console<O, E>,
) -> Result<(), CommandError>
where
    C: TemplateOperations + ?Sized,
    O: Write,
    E: Write,
{
    let templates = client
        .list_templates(ctx)
        .await
        .context("Couldn't get template list")?;
    let mut table = Table::new(&["id", "name", "capacity", "changed", "description"]);
    for template in &templates {
        table.push(vec![
            template.object_uuid.clone(),
            template.name.clone(),
            template.capacity.to_string(),
            local_time(template.change_time),
            template.description.clone(),
        ]);
    }
    console.render(&table, &templates)
}

/// Lists ISO images.
///
/// # Errors
///
/// Returns [`CommandError`] when the listing or output fails.
pub async fn iso_images<C, O, E>(
    client: &C,
    ctx: &CallContext,
    console: &mut Console<O, E>,
) -> Result<(), CommandError>
where
    C: IsoImageOperations + ?Sized,
    O: Write,
    E: Write,
{
    let images = client
        .list_isoimages(ctx)
        .await
        .context("Couldn't get ISO image list")?;
    let mut table = Table::new(&["id", "name", "changed", "private", "source url"]);
    for image in &images {
        table.push(vec![
            image.object_uuid.clone(),
            image.name.clone(),
            local_time(image.change_time),
            image.private.to_string(),
            image.source_url.clone(),
        ]);
    }
    console.render(&table, &images)
}

/// Imports an ISO image from `source_url` and prints its identifier.
///
/// # Errors
///
/// Returns [`CommandError`] when the call or output fails.
pub async fn create_iso_image<C, O, E>(
    client: &C,
    ctx: &CallContext,
    console: &mut Console<O, E>,
    name: &str,
    source_url: &str,
) -> Result<(), CommandError>
where
    C: IsoImageOperations + ?Sized,
    O: Write,
    E: Write,
{
    let created = client
        .create_isoimage(
            ctx,
            IsoImageCreateRequest {
                name: name.to_owned(),
                source_url: source_url.to_owned(),
                labels: Vec::new(),
            },
        )
        .await
        .context("Creating image failed")?;
    console.print(format!("Image created: {}", created.object_uuid))
}

/// Deletes an ISO image.
///
/// # Errors
///
/// Returns [`CommandError`] when the call or output fails.
pub async fn remove_iso_image<C, O, E>(
    client: &C,
    ctx: &CallContext,
    console: &mut Console<O, E>,
    id: &str,
) -> Result<(), CommandError>
where
    C: IsoImageOperations + ?Sized,
    O: Write,
    E: Write,
{
    client
        .delete_isoimage(ctx, id)
        .await
        .context("Removing image failed")?;
    console.note(format!("Removed {id}"))
}
