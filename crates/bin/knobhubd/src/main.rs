//! # knobhubd — knobhub daemon
//!
//! Composition root that wires the registry to its collaborators and runs
//! the knob.
//!
//! ## Responsibilities
//! - Parse configuration (env vars, config file)
//! - Initialise logging
//! - Load the configured app slots into the registry
//! - Run the control task (line commands from stdin), the render task
//!   (samples the active app's frame) and the motor task (applies the
//!   latest profile to the virtual knob)
//! - Handle graceful shutdown (Ctrl-C or end of input)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod commands;
mod config;
mod daemon;

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use commands::Command;
use config::Config;
use daemon::Daemon;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.logging.filter)?)
        .with_writer(std::io::stderr)
        .init();

    let daemon = Arc::new(Daemon::new());
    let loaded = daemon.load(&config.app_slots());
    tracing::info!(count = loaded, "apps loaded");
    daemon.activate_initial(config.knob.initial_app.as_deref());

    tokio::spawn(run_motor(Arc::clone(&daemon)));
    tokio::spawn(run_reports(Arc::clone(&daemon)));
    tokio::spawn(run_render(Arc::clone(&daemon), config.render_interval()));

    tokio::select! {
        result = run_control(Arc::clone(&daemon)) => result?,
        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("interrupted");
        }
    }

    tracing::info!("knobhubd stopped");
    Ok(())
}

/// Read line commands from stdin until end of input.
async fn run_control(daemon: Arc<Daemon>) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(err) => {
                tracing::warn!(error = %err, "ignoring command");
                continue;
            }
        };
        if let Err(err) = daemon.execute(command).await {
            tracing::warn!(error = %err, "command failed");
        }
    }
    tracing::info!("end of input");
    Ok(())
}

/// Apply every accepted profile to the virtual knob.
async fn run_motor(daemon: Arc<Daemon>) {
    let mut profiles = daemon.notifier.subscribe();
    while profiles.changed().await.is_ok() {
        let profile = profiles.borrow_and_update().clone();
        if daemon.knob.apply_profile(&profile) {
            tracing::debug!(
                app_id = %profile.id,
                position = profile.position,
                max_position = profile.max_position,
                nonce = %profile.nonce,
                "motor profile applied"
            );
        }
    }
}

/// Log state updates as the home system would receive them.
async fn run_reports(daemon: Arc<Daemon>) {
    let mut updates = daemon.reports.subscribe();
    loop {
        match updates.recv().await {
            Ok(update) => {
                tracing::info!(
                    app_id = %update.app_id,
                    entity_id = %update.entity_id,
                    kind = %update.app_slug,
                    state = %update.state,
                    "entity state update"
                );
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "state updates dropped");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

/// Sample the active frame and log it whenever it changes.
async fn run_render(daemon: Arc<Daemon>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    let mut last = None;
    loop {
        ticker.tick().await;
        let frame = daemon.registry.render_active();
        if last.as_ref() == Some(&frame) {
            continue;
        }
        match (&frame.app_id, &frame.gauge) {
            (Some(app_id), Some(gauge)) => tracing::info!(
                %app_id,
                name = %frame.friendly_name,
                setting = %gauge.setting,
                label = %gauge.label,
                arc = gauge.arc_value,
                "frame"
            ),
            _ => tracing::info!("no active app"),
        }
        last = Some(frame);
    }
}
