//! `gscloud ssh-key …` handlers.

use std::io::Write;

use camino::Utf8Path;
use cap_std::{ambient_authority, fs_utf8::Dir};

use super::{ApiContext, CommandError, Console, local_time};
use crate::context::CallContext;
use crate::objects::{SshKeyCreateRequest, SshKeyOperations};
use crate::render::Table;

const KEY_HEAD: usize = 10;
const KEY_TAIL: usize = 30;
const USER_PREFIX: usize = 8;

/// Lists SSH keys with an abbreviated key column.
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
    C: SshKeyOperations + ?Sized,
    O: Write,
    E: Write,
{
    let keys = client
        .list_sshkeys(ctx)
        .await
        .context("Couldn't get SSH key list")?;
    let mut table = Table::new(&["id", "name", "key", "user", "createtime"]);
    for key in &keys {
        table.push(vec![
            key.object_uuid.clone(),
            key.name.clone(),
            abbreviate_key(&key.sshkey),
            key.user_uuid.chars().take(USER_PREFIX).collect(),
            local_time(key.create_time),
        ]);
    }
    console.render(&table, &keys)
}

/// Shortens a public key to its first and last characters.
fn abbreviate_key(key: &str) -> String {
    let length = key.chars().count();
    if length <= KEY_HEAD + KEY_TAIL {
        return key.to_owned();
    }
    let head: String = key.chars().take(KEY_HEAD).collect();
    let tail: String = key.chars().skip(length - KEY_TAIL).collect();
    format!("{head}...{tail}")
}

/// Uploads the public key stored in `file`.
///
/// # Errors
///
/// Returns [`CommandError::ReadFile`] when the file is unreadable and
/// [`CommandError::Api`] when the upload fails.
pub async fn add<C, O, E>(
    client: &C,
    ctx: &CallContext,
    console: &mut Console<O, E>,
    name: String,
    file: &Utf8Path,
) -> Result<(), CommandError>
where
    C: SshKeyOperations + ?Sized,
    O: Write,
    E: Write,
{
    let sshkey = read_public_key(file)?;
    let created = client
        .create_sshkey(
            ctx,
            SshKeyCreateRequest {
                name,
                sshkey,
                labels: Vec::new(),
            },
        )
        .await
        .context("Adding SSH key failed")?;
    console.print(format!("SSH key added: {}", created.object_uuid))
}

fn read_public_key(file: &Utf8Path) -> Result<String, CommandError> {
    let read_error = |message: String| CommandError::ReadFile {
        path: file.to_path_buf(),
        message,
    };
    let parent = file
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let file_name = file
        .file_name()
        .ok_or_else(|| read_error("not a file".to_owned()))?;
    let dir = Dir::open_ambient_dir(parent, ambient_authority())
        .map_err(|err| read_error(err.to_string()))?;
    let contents = dir
        .read_to_string(file_name)
        .map_err(|err| read_error(err.to_string()))?;
    Ok(contents.trim().to_owned())
}

/// Deletes the SSH key whose identifier or name is `key`.
///
/// # Errors
///
/// Returns [`CommandError`] when no key matches or a call fails.
pub async fn remove<C, O, E>(
    client: &C,
    ctx: &CallContext,
    console: &mut Console<O, E>,
    key: &str,
) -> Result<(), CommandError>
where
    C: SshKeyOperations + ?Sized,
    O: Write,
    E: Write,
{
    let keys = client
        .list_sshkeys(ctx)
        .await
        .context("Couldn't get SSH key list")?;
    let id = keys
        .into_iter()
        .find(|candidate| candidate.object_uuid == key || candidate.name == key)
        .map(|candidate| candidate.object_uuid)
        .ok_or_else(|| CommandError::InvalidArgument(format!("SSH key {key} not found")))?;
    client
        .delete_sshkey(ctx, &id)
        .await
        .context("Removing SSH key failed")?;
    console.note(format!("Removed {id}"))
}
