// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! libops site proxy daemon (libops-proxyd)
//!
//! Terminates bus push deliveries and forwards reconciliation requests to
//! site controllers.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::fs::File;
use std::io::Write as _;
use std::sync::Arc;

use fs2::FileExt;
use libops_adapters::{HttpAdminAdapter, StaticTokenSource};
use libops_proxy::server::{self, ProxyState};
use libops_proxy::{Config, HttpControllerClient};
use tokio::signal::unix::{signal, SignalKind};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("libops-proxyd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("libops-proxyd {}", env!("CARGO_PKG_VERSION"));
                println!("Push-to-site forwarder for the libops reconciliation pipeline");
                println!();
                println!("USAGE:");
                println!("    libops-proxyd");
                println!();
                println!("Configuration is read from $LIBOPS_PROXYD_CONFIG or");
                println!("/etc/libops/proxyd.toml.");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: libops-proxyd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;
    std::fs::create_dir_all(&config.state_dir)?;

    rotate_log_if_needed(&config.log_path());
    let _log_guard = setup_logging(&config)?;

    info!("Starting proxy daemon");

    let lock_file = File::create(config.lock_path())?;
    if lock_file.try_lock_exclusive().is_err() {
        eprintln!("libops-proxyd is already running");
        std::process::exit(1);
    }
    writeln!(&lock_file, "{}", std::process::id())?;

    let tokens = StaticTokenSource::new(config.admin.token.clone());
    let admin = HttpAdminAdapter::new(config.admin.base_url.clone(), tokens)?;
    let controllers =
        HttpControllerClient::new(config.controller.port, config.controller.token.clone())?;

    let state = Arc::new(ProxyState { admin, controllers });
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(addr = %config.listen_addr, "push endpoint listening");

    println!("READY");

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    axum::serve(listener, server::router(state))
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                _ = sigint.recv() => info!("Received SIGINT, shutting down..."),
            }
        })
        .await?;

    let _ = std::fs::remove_file(config.lock_path());
    info!("Proxy stopped");
    Ok(())
}

/// Maximum log file size before rotation (10 MB).
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Number of rotated log files to keep.
const MAX_ROTATED_LOGS: u32 = 3;

/// Rotate the daemon log file if it exceeds [`MAX_LOG_SIZE`].
///
/// Best-effort: rotation failures are silently ignored so the daemon still
/// starts.
fn rotate_log_if_needed(log_path: &std::path::Path) {
    let size = match std::fs::metadata(log_path) {
        Ok(m) => m.len(),
        Err(_) => return,
    };

    if size < MAX_LOG_SIZE {
        return;
    }

    let log_str = log_path.display().to_string();

    for i in (1..MAX_ROTATED_LOGS).rev() {
        let from = format!("{log_str}.{i}");
        let to = format!("{log_str}.{}", i + 1);
        let _ = std::fs::rename(&from, &to);
    }

    let _ = std::fs::rename(log_path, format!("{log_str}.1"));
}

fn setup_logging(
    config: &Config,
) -> Result<tracing_appender::non_blocking::WorkerGuard, Box<dyn std::error::Error>> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_path = config.log_path();
    let parent = log_path.parent().ok_or("log path has no parent")?;
    std::fs::create_dir_all(parent)?;
    let file_name = log_path.file_name().ok_or("log path has no file name")?;

    let file_appender = tracing_appender::rolling::never(parent, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
