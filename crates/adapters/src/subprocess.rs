// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution helpers

use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// Default timeout for user management commands (useradd/userdel/chown).
pub const USER_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for packet filter commands.
pub const FILTER_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for git operations (clone of a cold repo included).
pub const GIT_COMMAND_TIMEOUT: Duration = Duration::from_secs(300);

/// Default timeout for compose operations.
/// Image pulls and container starts can take minutes on slow links.
pub const COMPOSE_COMMAND_TIMEOUT: Duration = Duration::from_secs(900);

/// Run a subprocess command with a timeout.
///
/// Wraps `Command::output()` with `tokio::time::timeout`, converting
/// timeout expiration into a descriptive error message. The child process
/// is killed automatically if the timeout elapses (via the tokio `Child`
/// drop implementation).
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    description: &str,
) -> Result<Output, String> {
    match tokio::time::timeout(timeout, cmd.output()).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(io_err)) => Err(format!("{} failed: {}", description, io_err)),
        Err(_elapsed) => Err(format!(
            "{} timed out after {}s",
            description,
            timeout.as_secs()
        )),
    }
}

/// Run a command and require exit code 0.
///
/// On non-zero exit, returns the description plus trimmed stderr.
pub async fn run_checked(
    cmd: Command,
    timeout: Duration,
    description: &str,
) -> Result<Output, String> {
    let output = run_with_timeout(cmd, timeout, description).await?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "{} exited with {}: {}",
            description,
            output.status,
            stderr.trim()
        ));
    }
    Ok(output)
}

#[cfg(test)]
#[path = "subprocess_tests.rs"]
mod tests;
