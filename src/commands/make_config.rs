//! `gscloud make-config`, `gscloud move-config` and `gscloud version`.

use std::io::Write;

use camino::Utf8Path;

use tracing::info;

use super::{CommandError, Console};
use crate::config_store::{ConfigWriter, StarterConfig};

/// Writes a starter configuration file and reports its path.
///
/// # Errors
///
/// Returns [`CommandError::ConfigStore`] when a file already exists and
/// `force` is unset, or when writing fails.
pub fn make_config<W, O, E>(
    writer: &W,
    console: &mut Console<O, E>,
    values: &StarterConfig,
    force: bool,
) -> Result<(), CommandError>
where
    W: ConfigWriter + ?Sized,
    O: Write,
    E: Write,
{
    let path = writer.write_starter(values, force)?;
    info!(path = %path, "configuration written");
    console.note(format!("Written: {path}"))
}

/// Imports the accounts of a legacy `config.yaml` into the configuration
/// file. `from` overrides the discovered legacy location.
///
/// # Errors
///
/// Returns [`CommandError::ConfigStore`] when the target exists and `force`
/// is unset, or when reading, parsing or writing fails.
pub fn move_config<W, O, E>(
    writer: &W,
    console: &mut Console<O, E>,
    from: Option<&Utf8Path>,
    force: bool,
) -> Result<(), CommandError>
where
    W: ConfigWriter + ?Sized,
    O: Write,
    E: Write,
{
    let source = match from {
        Some(path) => path.to_path_buf(),
        None => match writer.legacy_source()? {
            Some(path) => path,
            None => return console.note("No legacy config.yaml found; nothing to move"),
        },
    };
    let imported = writer.import_accounts(&source, force)?;
    info!(from = %source, to = %imported.path, accounts = imported.names.len(), "configuration moved");
    console.note(format!(
        "Moved {} account(s) from {source} to {}",
        imported.names.len(),
        imported.path
    ))
}

/// Prints the crate version and the commit it was built from.
///
/// # Errors
///
/// Returns [`CommandError::Render`] when writing fails.
pub fn version<O, E>(console: &mut Console<O, E>) -> Result<(), CommandError>
where
    O: Write,
    E: Write,
{
    console.print(format!("Version:\t{}", env!("CARGO_PKG_VERSION")))?;
    console.print(format!(
        "Git commit:\t{}",
        option_env!("GSCLOUD_GIT_COMMIT").unwrap_or("unknown")
    ))
}
