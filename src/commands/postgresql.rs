//! `gscloud postgresql …` handlers.

use std::collections::BTreeSet;
use std::io::Write;

use super::{ApiContext, CommandError, Console};
use crate::context::CallContext;
use crate::objects::{POSTGRES_FLAVOUR, PaaSOperations};
use crate::render::Table;

/// Lists the PostgreSQL releases on offer, newest first and without
/// duplicates.
///
/// # Errors
///
/// Returns [`CommandError`] when the listing or output fails.
pub async fn releases<C, O, E>(
    client: &C,
    ctx: &CallContext,
    console: &mut Console<O, E>,
) -> Result<(), CommandError>
where
    C: PaaSOperations + ?Sized,
    O: Write,
    E: Write,
{
    let templates = client
        .list_paas_templates(ctx)
        .await
        .context("Could not get list of PostgreSQL releases")?;
    let releases: Vec<String> = templates
        .into_iter()
        .filter(|template| template.flavour == POSTGRES_FLAVOUR)
        .map(|template| template.release)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .rev()
        .collect();
    let mut table = Table::new(&["releases"]);
    for release in &releases {
        table.push(vec![release.clone()]);
    }
    console.render(&table, &releases)
}
