// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! libops site controller daemon (sited)
//!
//! Runs on every customer VM. Three concurrent activities: the reconcile
//! HTTP endpoints, the 12-hour periodic pass, and the minutely check-in.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::fs::File;
use std::io::Write as _;
use std::sync::Arc;
use std::time::{Duration, Instant};

use fs2::FileExt;
use libops_adapters::{
    ComposeDeployAdapter, HttpAdminAdapter, IptablesAdapter, MetadataTokenSource,
    SystemUsersAdapter,
};
use libops_controller::reconcile::{ApplySettings, HostDeps, Reconciler};
use libops_controller::server::{self, ServerState};
use libops_controller::{checkin, periodic, Config, TokenBucket};
use libops_core::SystemClock;
use parking_lot::Mutex;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("libops-sited {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("libops-sited {}", env!("CARGO_PKG_VERSION"));
                println!("Site controller for the libops reconciliation pipeline");
                println!();
                println!("USAGE:");
                println!("    libops-sited");
                println!();
                println!("Configuration is read from $LIBOPS_SITED_CONFIG or");
                println!("/etc/libops/sited.toml.");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: libops-sited [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;
    std::fs::create_dir_all(&config.state_dir)?;

    rotate_log_if_needed(&config.log_path());
    let _log_guard = setup_logging(&config)?;

    info!(site_id = config.site_id, "Starting site controller");

    let lock_file = File::create(config.lock_path())?;
    if lock_file.try_lock_exclusive().is_err() {
        eprintln!("libops-sited is already running");
        std::process::exit(1);
    }
    writeln!(&lock_file, "{}", std::process::id())?;

    let tokens = MetadataTokenSource::new(config.admin.metadata_token_url.clone())?;
    let admin = HttpAdminAdapter::new(config.admin.base_url.clone(), tokens)?;

    let settings = ApplySettings {
        home_root: config.home_root.clone(),
        exec_group: config.exec_group.clone(),
        secrets_path: config.secrets_path.clone(),
        firewall_chain: config.firewall_chain.clone(),
    };
    let hosts = HostDeps {
        users: SystemUsersAdapter::new(),
        filter: IptablesAdapter::new(),
        deploy: ComposeDeployAdapter::new(),
    };
    let reconciler =
        Arc::new(Reconciler::new(config.site_id, admin.clone(), hosts, settings, SystemClock));

    let cancel = CancellationToken::new();
    let started = Instant::now();

    // Periodic pass (fires immediately: initial-connect convergence).
    tokio::spawn(periodic::run(
        Arc::clone(&reconciler),
        Duration::from_secs(config.periodic_hours * 3600),
        cancel.clone(),
    ));

    // Check-in heartbeat.
    tokio::spawn(checkin::run(
        admin,
        config.site_id,
        Duration::from_secs(config.checkin_secs),
        env!("CARGO_PKG_VERSION").to_string(),
        started,
        cancel.clone(),
    ));

    // HTTP endpoints share the reconciler with the periodic loop, so
    // pushes and scheduled passes serialize on the same per-type locks.
    let state = Arc::new(ServerState {
        reconciler: Arc::clone(&reconciler),
        bucket: Mutex::new(TokenBucket::new(
            config.rate.per_second,
            config.rate.burst,
            Instant::now(),
        )),
        token: config.auth_token.clone(),
    });

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(addr = %config.listen_addr, "reconcile endpoints listening");

    println!("READY");

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let shutdown_cancel = cancel.clone();

    axum::serve(listener, server::router(state))
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                _ = sigint.recv() => info!("Received SIGINT, shutting down..."),
            }
            shutdown_cancel.cancel();
        })
        .await?;

    cancel.cancel();
    let _ = std::fs::remove_file(config.lock_path());
    info!("Site controller stopped");
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

    if config.site_id == 0 {
        warn!("site_id is 0; check /etc/libops/sited.toml provisioning");
    }

    Ok(guard)
}
