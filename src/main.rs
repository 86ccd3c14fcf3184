//! Geo Survival - location-driven survival overlay engine
//!
//! This is the process entry point. It handles:
//! - Loading configuration and the zone layout
//! - Driving one survival session from a simulated location provider
//! - Logging the HUD as it changes
//! - Operator commands on stdin (retry, stop, revoke, grant)

mod config;
mod game;
mod platform;
mod tracking;
mod util;

use std::sync::Arc;

use tracing::{debug, error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{Config, LogFormat};
use crate::game::{HudSnapshot, Session};
use crate::platform::{LogHaptics, PermissionStatus, SimulatedProvider};
use crate::tracking::{Tracker, TrackerHandle};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level, config.log_format);

    info!("Starting Geo Survival");
    info!(
        hazards = config.zones.hazard_count(),
        healing_zone = config.zones.healing_zone.is_some(),
        smoothing = config.position_smoothing,
        tick_ms = config.tick_interval.as_millis() as u64,
        "Zone layout loaded"
    );

    let session = Session::new(
        config.zones.clone(),
        config.player_stats(),
        config.position_smoothing,
    );
    let provider = SimulatedProvider::new(config.simulation.clone());
    let haptics = Arc::new(if config.simulation.haptics {
        LogHaptics::new()
    } else {
        LogHaptics::unavailable()
    });

    let (tracker, handle) = Tracker::new(
        session,
        provider.clone(),
        Arc::clone(&haptics),
        config.tick_interval,
    );
    let tracker_task = tokio::spawn(tracker.run());

    spawn_console(handle.clone(), provider);

    // HUD consumer
    let mut hud = handle.subscribe_hud();
    tokio::spawn(async move {
        while hud.changed().await.is_ok() {
            let snapshot = hud.borrow_and_update().clone();
            log_hud(&snapshot);
        }
    });

    match config.run_for {
        Some(limit) => {
            tokio::select! {
                _ = shutdown_signal() => {}
                _ = tokio::time::sleep(limit) => {
                    info!(seconds = limit.as_secs(), "Run time elapsed, shutting down");
                }
            }
        }
        None => shutdown_signal().await,
    }

    handle.shutdown().await;
    tracker_task.await?;

    info!(haptic_pulses = haptics.pulses(), "Shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str, format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    let (pretty, json) = match format {
        LogFormat::Pretty => (
            Some(tracing_subscriber::fmt::layer().with_target(true)),
            None,
        ),
        LogFormat::Json => (None, Some(tracing_subscriber::fmt::layer().json())),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(pretty)
        .with(json)
        .init();
}

fn log_hud(snapshot: &HudSnapshot) {
    info!(
        status = ?snapshot.status,
        hp = snapshot.stats.hp,
        max_hp = snapshot.stats.max_hp,
        damage = snapshot.last_applied_damage,
        haptic_stage = snapshot.haptic_stage.level(),
        healing = snapshot.in_healing_zone,
        "HUD"
    );

    if let Some(message) = &snapshot.status_message {
        warn!(%message, "Tracking problem");
    }

    match serde_json::to_string(snapshot) {
        Ok(json) => debug!(hud = %json, "HUD snapshot"),
        Err(e) => warn!(error = %e, "Failed to serialize HUD snapshot"),
    }
}

/// Operator console: one command per stdin line
fn spawn_console(handle: TrackerHandle, provider: SimulatedProvider) {
    let (line_tx, mut line_rx) = tokio::sync::mpsc::channel::<String>(8);

    // Blocking stdin reads live on their own thread
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            match line {
                Ok(line) => {
                    if line_tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Console input failed");
                    break;
                }
            }
        }
    });

    tokio::spawn(async move {
        while let Some(line) = line_rx.recv().await {
            let delivered = match line.trim() {
                "retry" => handle.retry().await,
                "stop" => handle.stop().await,
                "revoke" => {
                    info!("Revoking simulated location permission");
                    provider.set_permission(PermissionStatus::Denied);
                    true
                }
                "grant" => {
                    info!("Granting simulated location permission");
                    provider.set_permission(PermissionStatus::Granted);
                    true
                }
                "" => true,
                other => {
                    warn!(command = other, "Unknown command, expected retry, stop, revoke or grant");
                    true
                }
            };
            if !delivered {
                break;
            }
        }
        debug!("Console closed");
    });
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}
