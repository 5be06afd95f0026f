//! Relay server between game bridges and browser clients.
//!
//! A single process exposing:
//! - an HTTP surface (`/api/status`, a fixed whitelist of browser
//!   assets)
//! - a WebSocket upgrade path (`/ws`) with the peer role fixed by a
//!   connection-time query parameter (`role=game` or `role=browser`)
//! - a connectionless OSC control listener on a UDP port
//!
//! Frames from game sources fan out verbatim to every browser; sound
//! payloads and control messages update the relay-wide [`SoundState`]
//! that late-joining browsers receive as a `sync` message.
//!
//! [`SoundState`]: chipstream_proto::SoundState

pub mod config;
pub mod control;
pub mod http;
pub mod state;
pub mod ws;

pub use config::RelayConfig;
pub use state::{PeerRole, RelayState};
