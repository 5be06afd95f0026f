//! Game bridge adapter binary.
//!
//! Connects to the relay as a game source, registers the game type,
//! hosts the game process (or the demo fallback) and pumps parsed
//! screens out as frames. Browser input events coming back over the
//! socket are translated to the game's native control characters.
//!
//! The relay owns no reconnection logic; this process does. Whenever
//! the socket or the game goes away the session is torn down, the game
//! stopped, and a fresh session started after a fixed delay.

mod config;
mod demo;
mod game;
mod input;
mod parser;
mod sound;

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use chipstream_proto::{Frame, RelayMessage};

use config::BridgeConfig;
use game::GameSource;
use parser::FrameParser;
use sound::SoundModel;

/// Delay between a dropped session and the next connect attempt.
const RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Milliseconds since the Unix epoch.
fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = BridgeConfig::from_env();
    info!(
        relay = %config.relay_url,
        game_type = %config.game_type,
        "bridge starting"
    );

    loop {
        if let Err(error) = run_session(&config).await {
            warn!(%error, "session ended");
        }
        info!(delay = ?RECONNECT_DELAY, "scheduling reconnect");
        tokio::time::sleep(RECONNECT_DELAY).await;
    }
}

/// One relay connection: register, run the game, pump frames until
/// either side goes away.
async fn run_session(config: &BridgeConfig) -> anyhow::Result<()> {
    let (socket, _response) = connect_async(config.connect_url())
        .await
        .context("relay connection failed")?;
    info!(url = %config.connect_url(), "connected to relay");
    let (mut sink, mut stream) = socket.split();

    let register = RelayMessage::Register {
        game_type: config.game_type.clone(),
    };
    sink.send(Message::Text(register.to_json()?))
        .await
        .context("failed to register with relay")?;

    let mut game = GameSource::start(config);
    if game.is_demo() {
        info!("serving synthesized demo frames");
    }
    let mut parser = FrameParser::new();
    let mut model = SoundModel::new();
    let mut seq: u64 = 0;

    loop {
        tokio::select! {
            chunk = game.next_output() => {
                let Some(bytes) = chunk else {
                    warn!("game process exited");
                    break;
                };
                let Some(screen) = parser.push_bytes(&bytes) else {
                    continue;
                };
                seq += 1;
                let frame = RelayMessage::Frame(Frame {
                    seq,
                    ts: now_ms(),
                    display: screen.text.into(),
                    snd: model.update(&screen.velocities, screen.triggers),
                });
                sink.send(Message::Text(frame.to_json()?))
                    .await
                    .context("relay socket closed while sending frame")?;
            }

            incoming = stream.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => handle_relay_message(&mut game, &text),
                    Some(Ok(Message::Close(_))) | None => {
                        info!("relay closed the connection");
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(error)) => {
                        // Log and let the close path drive recovery.
                        warn!(%error, "relay socket error");
                        break;
                    }
                }
            }
        }
    }

    game.stop();
    Ok(())
}

/// Dispatch one message arriving from the relay.
fn handle_relay_message(game: &mut GameSource, text: &str) {
    match RelayMessage::from_json(text) {
        Ok(RelayMessage::Input(event)) => {
            let native = input::translate(event.player, &event.key);
            if native.is_empty() {
                debug!(key = %event.key, player = event.player, "dropping unmapped key");
            } else {
                game.send_input(native);
            }
        }
        Ok(other) => debug!(?other, "ignoring relay message"),
        Err(error) => debug!(%error, "dropping malformed relay payload"),
    }
}
