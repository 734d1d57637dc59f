//! ice-monitor: real-time polar sea-ice extent monitoring service.
//!
//! Single-binary Tokio application that:
//! 1. Fetches daily sea-ice extent series from the NSIDC Sea Ice Index
//! 2. Caches classified per-hemisphere records in memory
//! 3. Re-fetches on a fixed schedule (6 hours by default)
//! 4. Serves the cache over a small JSON API plus a dashboard page

mod config;
mod http;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use common::Hemisphere;
use extent_cache::{ExtentCache, RefreshCoordinator, RefreshOutcome};
use nsidc_client::NsidcClient;

use crate::http::AppState;

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(300);

/// Polar sea-ice extent monitor
#[derive(Parser)]
#[command(name = "ice-monitor", about = "Polar sea-ice extent monitoring service")]
struct Cli {
    /// Fetch both hemispheres once, print a summary, then exit.
    #[arg(long)]
    check_upstream: bool,

    /// Run a single refresh cycle and print the cached summary without
    /// starting the server.
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ice_monitor=info,nsidc_client=info,extent_cache=info".into()),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();

    info!("🧊 Ice Monitor starting up...");

    // Load configuration.
    let cfg = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    info!("Upstream: {}", cfg.nsidc_base_url);
    info!(
        "Timing: refresh={}s, fetch_timeout={}s, forced_refresh_bound={}s",
        cfg.timing.refresh_interval_secs,
        cfg.timing.fetch_timeout_secs,
        cfg.timing.refresh_request_timeout_secs,
    );

    let client = NsidcClient::new(
        cfg.nsidc_base_url.clone(),
        Duration::from_secs(cfg.timing.fetch_timeout_secs),
    );

    // ── Check-upstream mode ──────────────────────────────────────────
    if cli.check_upstream {
        info!("Running upstream check...");
        let mut failed = false;
        for hemisphere in Hemisphere::ALL {
            match client.fetch_status(hemisphere).await {
                Ok(status) => {
                    info!(
                        "✅ {}: {} readings, latest {} = {:.2} million km²",
                        hemisphere,
                        status.historical.len(),
                        status.latest.date,
                        status.latest.extent_km2 / 1_000_000.0,
                    );
                }
                Err(e) => {
                    error!("❌ {} fetch failed: {}", hemisphere, e);
                    failed = true;
                }
            }
        }
        if failed {
            std::process::exit(1);
        }
        return;
    }

    // ── Shared state ─────────────────────────────────────────────────
    let cache = Arc::new(ExtentCache::new());
    let coordinator = Arc::new(RefreshCoordinator::new(cache.clone(), client));

    // ── Once mode ────────────────────────────────────────────────────
    if cli.once {
        info!("Running single refresh cycle...");
        match coordinator.refresh_all().await {
            RefreshOutcome::Completed { succeeded, failed } => {
                info!("Refresh cycle done: {} ok, {} failed", succeeded, failed);
            }
            RefreshOutcome::Coalesced => {}
        }
        for hemisphere in Hemisphere::ALL {
            match cache.get(hemisphere) {
                Some(status) => info!(
                    "{}: latest {} = {:.2} million km² ({} historical readings)",
                    hemisphere,
                    status.latest.date,
                    status.latest.extent_km2 / 1_000_000.0,
                    status.historical.len(),
                ),
                None => warn!("{}: no data cached", hemisphere),
            }
        }
        if cache.snapshot().await.is_empty() {
            std::process::exit(1);
        }
        return;
    }

    // ── Spawn tasks ──────────────────────────────────────────────────
    let state = Arc::new(AppState {
        coordinator: coordinator.clone(),
        config: cfg.clone(),
    });

    // Scheduled refresh: the first tick fires immediately, covering the
    // startup fetch; later ticks run every refresh interval.
    let sched_coordinator = coordinator.clone();
    let refresh_interval = Duration::from_secs(cfg.timing.refresh_interval_secs);
    let mut scheduler_handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(refresh_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            match sched_coordinator.refresh_all().await {
                RefreshOutcome::Completed { succeeded, failed } => {
                    info!("Scheduled refresh: {} ok, {} failed", succeeded, failed);
                }
                RefreshOutcome::Coalesced => {
                    info!("Scheduled refresh coalesced with an in-flight cycle");
                }
            }
        }
    });

    // Heartbeat: periodic cache summary so quiet 6-hour gaps still show life.
    let hb_cache = cache.clone();
    let mut heartbeat_handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(HEARTBEAT_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            let snapshot = hb_cache.snapshot().await;
            let cached = usize::from(snapshot.north.is_some()) + usize::from(snapshot.south.is_some());
            info!(
                "HEARTBEAT: hemispheres_cached={} last_refresh={:?} last_error={:?}",
                cached, snapshot.last_refresh, snapshot.last_error
            );
        }
    });

    let app = http::router(state);
    let listener = match tokio::net::TcpListener::bind(&cfg.bind_addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind {}: {}", cfg.bind_addr, e);
            std::process::exit(1);
        }
    };

    let mut server_handle = tokio::spawn(async move { axum::serve(listener, app).await });

    info!(
        "🚀 Ice Monitor is running on http://{}. Press Ctrl+C to stop.",
        cfg.bind_addr
    );

    // ── Wait for shutdown ────────────────────────────────────────────
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
        r = &mut server_handle => {
            error!("HTTP server task exited: {:?}", r);
        }
        r = &mut scheduler_handle => {
            error!("Scheduler task exited: {:?}", r);
        }
        r = &mut heartbeat_handle => {
            error!("Heartbeat task exited: {:?}", r);
        }
    }

    scheduler_handle.abort();
    heartbeat_handle.abort();
    server_handle.abort();
    info!("Ice Monitor shut down.");
}
