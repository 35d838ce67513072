// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Secrets reconciliation: render `/etc/libops/secrets.env`.
//!
//! The file is replaced atomically (tmp + rename) with mode 0600 inside a
//! 0755 directory, so readers never observe a partial write and only root
//! sees the values.

use super::{ApplySettings, ReconcileError};
use libops_core::Secret;
use std::os::unix::fs::PermissionsExt;

/// Render and atomically install the env file.
pub(crate) fn apply(settings: &ApplySettings, secrets: &[Secret]) -> Result<(), ReconcileError> {
    let path = &settings.secrets_path;
    let parent = path.parent().ok_or_else(|| {
        std::io::Error::other(format!("secrets path {} has no parent", path.display()))
    })?;

    std::fs::create_dir_all(parent)?;
    std::fs::set_permissions(parent, std::fs::Permissions::from_mode(0o755))?;

    let tmp_path = path.with_extension("env.tmp");
    std::fs::write(&tmp_path, render(secrets))?;
    std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// One `KEY="value"` line per secret, values shell-quoted.
pub(crate) fn render(secrets: &[Secret]) -> String {
    let mut out = String::new();
    for secret in secrets {
        out.push_str(&secret.key);
        out.push('=');
        out.push_str(&quote(&secret.value));
        out.push('\n');
    }
    out
}

/// Double-quote a value, escaping backslashes and embedded quotes.
fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '\\' || c == '"' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
#[path = "secrets_tests.rs"]
mod tests;
