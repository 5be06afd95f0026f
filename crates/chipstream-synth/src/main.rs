//! Headless synthesis client binary.
//!
//! Connects to the relay as a browser-role peer, mirrors its sound
//! state into an [`EngineManager`] and renders the mixed output either
//! to the default audio device or to a WAV file. This is the companion
//! subprocess the relay can spawn via `SYNTH_PATH`.
//!
//! [`EngineManager`]: chipstream_core::EngineManager

mod config;
mod follower;
mod output;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use futures_util::StreamExt;
use parking_lot::Mutex;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use chipstream_core::{EngineManager, EngineRegistry};
use chipstream_proto::RelayMessage;

use config::SynthConfig;

/// Delay between a dropped session and the next connect attempt.
const RECONNECT_DELAY: Duration = Duration::from_secs(3);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = SynthConfig::from_env();
    info!(
        relay = %config.relay_url,
        engine = %config.engine,
        "synth client starting"
    );

    let registry = Arc::new(EngineRegistry::with_builtin_engines());
    let manager = Arc::new(Mutex::new(EngineManager::new(
        registry,
        &config.engine,
        config.sample_rate,
    )));

    // Pick the render target: WAV capture when requested, otherwise the
    // audio device. A missing device is not fatal; the client keeps
    // following state silently.
    let _audio = match &config.wav_out {
        Some(path) => {
            let wav_manager = Arc::clone(&manager);
            let wav_path = path.clone();
            let seconds = config.wav_seconds;
            let sample_rate = config.sample_rate;
            tokio::spawn(async move {
                if let Err(error) =
                    output::write_wav(wav_manager, &wav_path, seconds, sample_rate).await
                {
                    warn!(%error, "WAV capture failed");
                }
            });
            None
        }
        None => match output::AudioOutput::start(Arc::clone(&manager), config.sample_rate) {
            Ok(audio) => Some(audio),
            Err(error) => {
                warn!(%error, "audio device unavailable, following state silently");
                None
            }
        },
    };

    loop {
        if let Err(error) = run_session(&config, &manager).await {
            warn!(%error, "session ended");
        }
        info!(delay = ?RECONNECT_DELAY, "scheduling reconnect");
        tokio::time::sleep(RECONNECT_DELAY).await;
    }
}

/// One relay connection: follow sound messages until the socket drops.
async fn run_session(
    config: &SynthConfig,
    manager: &Arc<Mutex<EngineManager>>,
) -> anyhow::Result<()> {
    let (socket, _response) = connect_async(config.connect_url())
        .await
        .context("relay connection failed")?;
    info!(url = %config.connect_url(), "connected to relay");
    let (_sink, mut stream) = socket.split();

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => match RelayMessage::from_json(&text) {
                Ok(message) => follower::apply_message(&mut manager.lock(), &message),
                Err(error) => debug!(%error, "dropping malformed relay payload"),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(error) => {
                warn!(%error, "relay socket error");
                break;
            }
        }
    }

    info!("relay connection closed");
    Ok(())
}
