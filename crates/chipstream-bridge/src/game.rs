//! Game process management.
//!
//! The bridge prefers hosting the real game inside a pseudo-terminal,
//! since curses-style games refuse to draw without one. When the binary
//! or the pty is unavailable it degrades to the deterministic demo
//! source instead of failing, so the bridge stays useful on hosts
//! without the game installed.

use std::io::{Read, Write};
use std::path::Path;

use portable_pty::{Child, CommandBuilder, MasterPty, PtySize, native_pty_system};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::BridgeConfig;
use crate::demo::DemoGame;

/// Terminal geometry the game is spawned with.
const PTY_ROWS: u16 = 24;
const PTY_COLS: u16 = 80;

/// A running game: real process on a pty, or the synthetic demo.
pub enum GameSource {
    /// Real game process behind a pseudo-terminal.
    Pty(PtyGame),
    /// Deterministic fallback frames.
    Demo(DemoGame),
}

impl GameSource {
    /// Start the configured game, falling back to demo mode when the
    /// binary is unset or the pty spawn fails.
    pub fn start(config: &BridgeConfig) -> Self {
        match &config.game_path {
            Some(path) => match PtyGame::spawn(path) {
                Ok(game) => {
                    info!(path = %path.display(), "game process started on pty");
                    GameSource::Pty(game)
                }
                Err(error) => {
                    warn!(%error, path = %path.display(), "pty spawn failed, entering demo mode");
                    GameSource::Demo(DemoGame::new())
                }
            },
            None => {
                info!("no game binary configured, entering demo mode");
                GameSource::Demo(DemoGame::new())
            }
        }
    }

    /// Next chunk of raw game output.
    ///
    /// `None` means the process is gone (its reader hit EOF); the
    /// session ends and the reconnect path respawns from scratch.
    pub async fn next_output(&mut self) -> Option<Vec<u8>> {
        match self {
            GameSource::Pty(game) => game.output.recv().await,
            GameSource::Demo(demo) => Some(demo.next_output().await),
        }
    }

    /// Write translated control characters to the game.
    pub fn send_input(&mut self, input: &str) {
        match self {
            GameSource::Pty(game) => {
                if let Err(error) = game
                    .writer
                    .write_all(input.as_bytes())
                    .and_then(|_| game.writer.flush())
                {
                    debug!(%error, "failed to write input to game");
                }
            }
            GameSource::Demo(_) => debug!(input, "demo mode ignores input"),
        }
    }

    /// Stop the game process; the demo source just stops being polled.
    pub fn stop(&mut self) {
        if let GameSource::Pty(game) = self {
            if let Err(error) = game.child.kill() {
                debug!(%error, "game process already gone");
            }
        }
    }

    /// Whether this source is the demo fallback.
    pub fn is_demo(&self) -> bool {
        matches!(self, GameSource::Demo(_))
    }
}

/// A game process attached to a pseudo-terminal.
pub struct PtyGame {
    child: Box<dyn Child + Send + Sync>,
    writer: Box<dyn Write + Send>,
    output: mpsc::UnboundedReceiver<Vec<u8>>,
    // Dropping the master closes the pty under the game; keep it for
    // the lifetime of the session.
    _master: Box<dyn MasterPty + Send>,
}

impl PtyGame {
    /// Allocate a pty and spawn the game inside it.
    ///
    /// A blocking reader thread forwards output chunks into an async
    /// channel; the thread exits on EOF or when the session drops the
    /// receiver.
    pub fn spawn(path: &Path) -> anyhow::Result<Self> {
        let pty_system = native_pty_system();
        let pair = pty_system.openpty(PtySize {
            rows: PTY_ROWS,
            cols: PTY_COLS,
            pixel_width: 0,
            pixel_height: 0,
        })?;

        let child = pair.slave.spawn_command(CommandBuilder::new(path))?;
        drop(pair.slave);

        let mut reader = pair.master.try_clone_reader()?;
        let writer = pair.master.take_writer()?;

        let (tx, rx) = mpsc::unbounded_channel();
        std::thread::spawn(move || {
            let mut chunk = [0u8; 2048];
            loop {
                match reader.read(&mut chunk) {
                    Ok(0) | Err(_) => break,
                    Ok(count) => {
                        if tx.send(chunk[..count].to_vec()).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        Ok(Self {
            child,
            writer,
            output: rx,
            _master: pair.master,
        })
    }
}

impl Drop for PtyGame {
    /// The game must not outlive its session, whichever way the
    /// session ends.
    fn drop(&mut self) {
        let _ = self.child.kill();
    }
}
