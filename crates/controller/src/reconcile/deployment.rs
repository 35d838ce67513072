// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deployment reconciliation: checkout, env file, compose cycle.
//!
//! When the spec pins a `commit_sha`, HEAD after the sync must match it
//! exactly or the deployment fails before any container is touched.
//! `compose pull` is warn-only (a registry hiccup should not stop a
//! restart of already-present images); `down` and `up` are not.

use super::ReconcileError;
use libops_adapters::DeployAdapter;
use libops_core::DeploymentSpec;
use std::path::Path;
use tracing::warn;

/// Run the full deployment sequence against the host.
pub(crate) async fn apply<D: DeployAdapter>(
    deploy: &D,
    spec: &DeploymentSpec,
) -> Result<(), ReconcileError> {
    let head = deploy.sync_repo(spec).await?;

    if let Some(expected) = &spec.commit_sha {
        if !head.eq_ignore_ascii_case(expected) {
            return Err(ReconcileError::ShaMismatch {
                expected: expected.clone(),
                actual: head,
            });
        }
    }

    write_env_file(spec)?;

    if let Err(e) = deploy.compose_pull(spec).await {
        warn!(deployment_id = %spec.deployment_id, error = %e, "compose pull failed, continuing");
    }
    deploy.compose_down(spec).await?;
    deploy.compose_up(spec).await?;
    Ok(())
}

/// Write `<path>/.env` atomically from the spec's env map.
fn write_env_file(spec: &DeploymentSpec) -> Result<(), ReconcileError> {
    let path = Path::new(&spec.path);
    std::fs::create_dir_all(path)?;

    let tmp_path = path.join(".env.tmp");
    std::fs::write(&tmp_path, render_env(spec))?;
    std::fs::rename(&tmp_path, path.join(".env"))?;
    Ok(())
}

/// One `KEY=value` line per entry, insertion order; values that need it
/// are double-quoted.
pub(crate) fn render_env(spec: &DeploymentSpec) -> String {
    let mut out = String::new();
    for (key, value) in &spec.env {
        out.push_str(key);
        out.push('=');
        out.push_str(&quote_if_needed(value));
        out.push('\n');
    }
    out
}

/// Quote values containing whitespace or characters the env parser would
/// misread; plain values stay bare.
fn quote_if_needed(value: &str) -> String {
    let needs_quoting =
        value.is_empty() || value.chars().any(|c| c.is_whitespace() || "\"'#$\\".contains(c));
    if !needs_quoting {
        return value.to_string();
    }

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
#[path = "deployment_tests.rs"]
mod tests;
