// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! libops dispatcher daemon (libops-dispatcherd)
//!
//! Hosts the event ingest endpoint and the dispatch loop over one durable
//! queue. Horizontal scale means one daemon per queue shard; within a
//! daemon the claim step is atomic and stale recovery covers crashes.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::fs::File;
use std::io::Write as _;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use fs2::FileExt;
use libops_adapters::{HttpAdminAdapter, HttpPublishAdapter, StaticTokenSource};
use libops_core::SystemClock;
use libops_dispatcher::ingest::{self, IngestState};
use libops_dispatcher::{Config, Dispatcher, Emitter};
use libops_storage::{Checkpointer, EventQueue, QueuePaths};
use parking_lot::Mutex;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

/// Checkpoint interval (60 seconds)
const CHECKPOINT_INTERVAL: Duration = Duration::from_secs(60);

/// Retention GC interval (daily)
const GC_INTERVAL: Duration = Duration::from_secs(24 * 3600);

/// Summary log interval (hourly)
const SUMMARY_INTERVAL: Duration = Duration::from_secs(3600);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" | "-v" => {
                println!("libops-dispatcherd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" | "help" => {
                println!("libops-dispatcherd {}", env!("CARGO_PKG_VERSION"));
                println!("Event dispatcher for the libops reconciliation pipeline");
                println!();
                println!("USAGE:");
                println!("    libops-dispatcherd");
                println!();
                println!("Configuration is read from $LIBOPS_DISPATCHERD_CONFIG or");
                println!("/etc/libops/dispatcherd.toml.");
                return Ok(());
            }
            _ => {
                eprintln!("error: unexpected argument '{arg}'");
                eprintln!("Usage: libops-dispatcherd [--help | --version]");
                std::process::exit(1);
            }
        }
    }

    let config = Config::load()?;
    std::fs::create_dir_all(&config.state_dir)?;

    rotate_log_if_needed(&config.log_path());
    let _log_guard = setup_logging(&config)?;

    info!("Starting dispatcher daemon");

    // Singleton lock; a second instance on the same state dir would race
    // the WAL.
    let lock_file = File::create(config.lock_path())?;
    if lock_file.try_lock_exclusive().is_err() {
        eprintln!("libops-dispatcherd is already running");
        std::process::exit(1);
    }
    writeln!(&lock_file, "{}", std::process::id())?;

    let clock = SystemClock;
    let paths = QueuePaths::under(&config.state_dir);
    let queue = Arc::new(Mutex::new(EventQueue::open(&paths, clock.clone())?));
    let checkpointer = Checkpointer::new(paths.snapshot_path.clone());

    let tokens = StaticTokenSource::new(config.admin.token.clone());
    let admin = HttpAdminAdapter::new(config.admin.base_url.clone(), tokens)?;
    let publisher =
        HttpPublishAdapter::new(config.bus.topic_url.clone(), config.bus.subscription.clone())?;

    // Ingest server
    let ingest_state = Arc::new(IngestState {
        emitter: Emitter::new(Arc::clone(&queue), admin.clone()),
        token: config.ingest_token.clone(),
    });
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(addr = %config.listen_addr, "ingest listening");
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, ingest::router(ingest_state)).await {
            error!("ingest server failed: {e}");
        }
    });

    let mut dispatcher = Dispatcher::new(
        Arc::clone(&queue),
        publisher,
        admin,
        clock,
        config.dispatcher.clone(),
    );
    info!(dispatcher_id = %dispatcher.id(), "dispatch loop ready");

    println!("READY");

    let mut poll = tokio::time::interval(config.dispatcher.poll_interval());
    let mut checkpoint = tokio::time::interval(CHECKPOINT_INTERVAL);
    let mut gc = tokio::time::interval(GC_INTERVAL);
    let mut summary = tokio::time::interval(SUMMARY_INTERVAL);
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    loop {
        tokio::select! {
            _ = poll.tick() => {
                match dispatcher.tick().await {
                    Ok(stats) if stats.claimed > 0 || stats.sent > 0 || stats.failed > 0 => {
                        info!(
                            claimed = stats.claimed,
                            sent = stats.sent,
                            failed = stats.failed,
                            dead_lettered = stats.dead_lettered,
                            held_groups = dispatcher.held_groups(),
                            "tick"
                        );
                    }
                    Ok(_) => {}
                    Err(e) => error!("dispatch tick failed: {e}"),
                }
            }

            _ = checkpoint.tick() => {
                let result = { queue.lock().checkpoint(&checkpointer) };
                match result {
                    Ok(done) => tracing::debug!(seq = done.seq, size_bytes = done.size_bytes, "checkpoint complete"),
                    Err(e) => tracing::warn!("checkpoint failed: {e}"),
                }
            }

            _ = gc.tick() => {
                let result = { queue.lock().gc(config.dispatcher.gc_retain()) };
                match result {
                    Ok(0) => {}
                    Ok(purged) => info!(purged, "queue gc"),
                    Err(e) => tracing::warn!("queue gc failed: {e}"),
                }
            }

            _ = summary.tick() => {
                dispatcher.log_summary();
            }

            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down...");
                break;
            }

            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down...");
                break;
            }
        }
    }

    // Final checkpoint so the next startup replays as little as possible.
    if let Err(e) = queue.lock().checkpoint(&checkpointer) {
        tracing::warn!("shutdown checkpoint failed: {e}");
    }
    let _ = std::fs::remove_file(config.lock_path());
    info!("Dispatcher stopped");
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
fn rotate_log_if_needed(log_path: &Path) {
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
