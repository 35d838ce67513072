// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SSH key reconciliation: one managed Unix account per member.
//!
//! Managed accounts are the ones whose name is a UUID and whose home sits
//! directly under the managed home root; nothing else on the host is ever
//! touched. `authorized_keys` is written atomically (tmp + rename) so a
//! crashed reconciliation never leaves a member without keys.

use super::{ApplySettings, ReconcileError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use libops_adapters::{HostUser, UsersAdapter};
use libops_core::Member;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tracing::info;
use uuid::Uuid;

/// First line of every managed authorized_keys file.
const GENERATED_MARKER: &str = "# Managed by libops; manual edits are overwritten";

/// Converge accounts and key files with the member list.
pub(crate) async fn apply<U: UsersAdapter>(
    users: &U,
    settings: &ApplySettings,
    members: &[Member],
) -> Result<(), ReconcileError> {
    for member in members {
        let name = member.public_id.to_string();
        let home = settings.home_root.join(&name);

        users.create_user(&name, &home, &settings.exec_group).await?;
        write_authorized_keys(&home, member)?;
        users.chown(&home.join(".ssh"), &name).await?;
    }

    prune_removed(users, settings, members).await
}

/// Remove managed accounts that are no longer members. Deletes homes.
async fn prune_removed<U: UsersAdapter>(
    users: &U,
    settings: &ApplySettings,
    members: &[Member],
) -> Result<(), ReconcileError> {
    let desired: HashSet<String> = members.iter().map(|m| m.public_id.to_string()).collect();

    for user in users.list_users().await? {
        if is_managed(&user, settings) && !desired.contains(&user.name) {
            info!(user = %user.name, "removing departed member account");
            users.remove_user(&user.name).await?;
        }
    }
    Ok(())
}

/// A managed account: UUID-shaped name homed at `<home_root>/<name>`.
fn is_managed(user: &HostUser, settings: &ApplySettings) -> bool {
    Uuid::parse_str(&user.name).is_ok() && user.home == settings.home_root.join(&user.name)
}

/// Write `~/.ssh/authorized_keys` atomically: tmp file, then rename.
fn write_authorized_keys(home: &Path, member: &Member) -> Result<(), ReconcileError> {
    let ssh_dir = home.join(".ssh");
    std::fs::create_dir_all(&ssh_dir)?;
    std::fs::set_permissions(&ssh_dir, std::fs::Permissions::from_mode(0o700))?;

    let content = render(member);
    let tmp_path = ssh_dir.join(".authorized_keys.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
    std::fs::rename(&tmp_path, ssh_dir.join("authorized_keys"))?;
    Ok(())
}

/// Render the file: marker line, then one key per line with its
/// fingerprint as a trailing comment.
fn render(member: &Member) -> String {
    let mut out = String::from(GENERATED_MARKER);
    out.push('\n');
    for key in &member.ssh_keys {
        let fingerprint = if key.fingerprint.is_empty() {
            fingerprint(&key.public_key).unwrap_or_default()
        } else {
            key.fingerprint.clone()
        };
        out.push_str(key.public_key.trim_end());
        if !fingerprint.is_empty() {
            out.push_str(" # ");
            out.push_str(&fingerprint);
        }
        out.push('\n');
    }
    out
}

/// `SHA256:<base64>` fingerprint of an OpenSSH public key line.
///
/// Falls back to `None` when the key material does not decode; the key is
/// still written, just without a comment.
fn fingerprint(public_key: &str) -> Option<String> {
    let blob = public_key.split_whitespace().nth(1)?;
    let decoded = STANDARD.decode(blob).ok()?;
    let digest = Sha256::digest(&decoded);
    let encoded = STANDARD.encode(digest);
    Some(format!("SHA256:{}", encoded.trim_end_matches('=')))
}

#[cfg(test)]
#[path = "ssh_keys_tests.rs"]
mod tests;
