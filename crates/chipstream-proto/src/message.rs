//! Tagged socket message envelope.
//!
//! Every relay socket message is JSON with a `type` tag. The envelope
//! is decoded into [`RelayMessage`] at the boundary; anything that does
//! not match a known variant is an error the caller handles explicitly
//! (typically: log at debug, drop the message, keep the connection).

use serde::{Deserialize, Serialize};

use crate::sound_state::{SoundState, SoundUpdate};
use crate::{ProtoError, Result};

/// One relayed unit of game display + sound-control data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Monotonically increasing per source connection, starting at 1.
    pub seq: u64,
    /// Capture time, milliseconds since the Unix epoch.
    pub ts: u64,
    /// Opaque display payload; rendered by clients, never interpreted
    /// by the relay.
    pub display: serde_json::Value,
    /// Optional partial sound update riding on the frame.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snd: Option<SoundUpdate>,
}

/// Browser input event, forwarded verbatim to game sources.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InputEvent {
    /// Player the input belongs to.
    pub player: u8,
    /// Key identifier as produced by the browser.
    pub key: String,
}

/// The relay socket protocol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RelayMessage {
    /// Game source → relay → all browsers.
    Frame(Frame),
    /// Game source → relay; declares the game type for diagnostics.
    Register {
        /// Name of the bridged game.
        #[serde(rename = "gameType")]
        game_type: String,
    },
    /// Browser → relay → all game sources.
    Input(InputEvent),
    /// Browser → relay liveness probe.
    Ping {
        /// Sender timestamp, milliseconds.
        ts: u64,
    },
    /// Relay → browser answer to a ping, carrying the server's time.
    Pong {
        /// Server timestamp, milliseconds.
        ts: u64,
    },
    /// Relay → newly connected browser: full sound state.
    Sync {
        /// Complete snapshot for late joiners.
        snd: SoundState,
    },
    /// Relay → all browsers: partial sound update.
    Snd {
        /// The partial update.
        snd: SoundUpdate,
    },
}

impl RelayMessage {
    /// Decode a message from its JSON text form.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(ProtoError::Decode)
    }

    /// Encode a message to its JSON text form.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(ProtoError::Encode)
    }
}
