//! Wire protocol shared by the relay, bridges and synthesis clients.
//!
//! Everything that crosses a process boundary lives here:
//! - [`RelayMessage`] - the tagged JSON envelope spoken on relay
//!   sockets (frames, input, ping/pong, sound sync)
//! - [`SoundState`] / [`SoundUpdate`] - the relay-wide voice snapshot
//!   and its partial-update form
//! - [`ControlMessage`] - OSC-style control messages decoded from the
//!   connectionless listener
//!
//! Messages are validated at the boundary: malformed JSON or an unknown
//! `type` tag is a [`ProtoError`], never a permissive partial decode.

#![warn(missing_docs)]

pub mod control;
pub mod message;
pub mod sound_state;

/// Error types for wire encoding and decoding.
#[derive(thiserror::Error, Debug)]
pub enum ProtoError {
    /// Payload was not a known, well-formed relay message.
    #[error("malformed relay message: {0}")]
    Decode(#[source] serde_json::Error),

    /// A message failed to serialize.
    #[error("failed to encode relay message: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Result type for protocol operations.
pub type Result<T> = std::result::Result<T, ProtoError>;

// Public API exports
pub use control::{CONTROL_NAMESPACE, ControlError, ControlMessage};
pub use message::{Frame, InputEvent, RelayMessage};
pub use sound_state::{SoundState, SoundUpdate};
