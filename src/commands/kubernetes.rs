//! `gscloud kubernetes …` handlers.

use std::io::Write;

use super::{ApiContext, CommandError, Console};
use crate::context::CallContext;
use crate::objects::{KUBERNETES_FLAVOUR, PaaSOperations};
use crate::render::Table;

/// Lists the Kubernetes releases offered as managed clusters.
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
        .context("Couldn't get PaaS templates")?;
    let releases: Vec<String> = templates
        .into_iter()
        .filter(|template| template.flavour == KUBERNETES_FLAVOUR)
        .map(|template| template.release)
        .collect();
    let mut table = Table::new(&["releases"]);
    for release in &releases {
        table.push(vec![release.clone()]);
    }
    console.render(&table, &releases)
}

/// Renews the credentials of a Kubernetes cluster.
///
/// # Errors
///
/// Returns [`CommandError`] when the call or output fails.
pub async fn renew_credentials<C, O, E>(
    client: &C,
    ctx: &CallContext,
    console: &mut Console<O, E>,
    cluster: &str,
) -> Result<(), CommandError>
where
    C: PaaSOperations + ?Sized,
    O: Write,
    E: Write,
{
    client
        .renew_k8s_credentials(ctx, cluster)
        .await
        .context("Renewing credentials failed")?;
    console.note(format!("Renewed credentials of {cluster}"))
}
