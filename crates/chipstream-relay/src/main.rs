//! Relay server binary.
//!
//! Binds the HTTP/WebSocket listener (fatal on failure) and the OSC
//! control listener (degraded mode on failure), optionally spawns the
//! companion synthesis subprocess, and serves until interrupted.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::{error, info, warn};

use chipstream_relay::{RelayConfig, RelayState, control, http};

/// How long a graceful shutdown may drain before the process is forced
/// out.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = RelayConfig::from_env();
    let state = Arc::new(RelayState::new(config.clone()));

    if let Some(path) = &config.synth_path {
        spawn_synth(path, config.port);
    }

    if let Some(socket) = control::bind_control(config.control_port).await {
        tokio::spawn(control::serve_control(state.clone(), socket));
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind relay port {}", config.port))?;
    info!(%addr, "relay listening");

    axum::serve(listener, http::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("relay server terminated unexpectedly")?;

    info!("relay stopped");
    Ok(())
}

/// Resolve on ctrl-c and arm the bounded hard-exit fallback.
async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler; serve until the process is killed.
        std::future::pending::<()>().await;
    }
    info!("shutdown requested, draining connections");
    tokio::spawn(async {
        tokio::time::sleep(SHUTDOWN_GRACE).await;
        error!("graceful shutdown stalled, forcing exit");
        std::process::exit(1);
    });
}

/// Launch the synthesis-only companion, pointing it at this relay.
///
/// A spawn failure is logged and otherwise ignored; the relay serves
/// browsers that bring their own synthesis either way.
fn spawn_synth(path: &Path, port: u16) {
    let mut command = tokio::process::Command::new(path);
    command.env("RELAY_URL", format!("ws://127.0.0.1:{port}/ws"));
    match command.spawn() {
        Ok(mut child) => {
            info!(path = %path.display(), "spawned companion synth");
            tokio::spawn(async move {
                match child.wait().await {
                    Ok(status) => info!(%status, "companion synth exited"),
                    Err(error) => warn!(%error, "failed to reap companion synth"),
                }
            });
        }
        Err(error) => {
            warn!(%error, path = %path.display(), "failed to spawn companion synth, continuing without");
        }
    }
}
