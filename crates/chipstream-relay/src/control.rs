//! Connectionless OSC control listener.
//!
//! Decodes OSC packets from a UDP port, applies accepted messages to
//! the shared sound state and broadcasts the resulting partial updates
//! to every browser. Malformed packets, foreign namespaces and
//! out-of-range voice indices are dropped without touching state and
//! without terminating the listener.

use std::sync::Arc;

use chipstream_core::VoicePatch;
use chipstream_proto::control::trigger_tag;
use chipstream_proto::{ControlError, ControlMessage, RelayMessage, SoundUpdate};
use rosc::{OscMessage, OscPacket};
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

use crate::state::RelayState;

/// Bind the control socket, or log once and disable the listener.
///
/// A bind failure here is a degraded mode, not a fatal error: the relay
/// keeps serving frames without the control surface.
pub async fn bind_control(port: u16) -> Option<UdpSocket> {
    match UdpSocket::bind(("0.0.0.0", port)).await {
        Ok(socket) => {
            info!(port, "control listener ready");
            Some(socket)
        }
        Err(error) => {
            warn!(%error, port, "control listener disabled (bind failed)");
            None
        }
    }
}

/// Drain the control socket until the process shuts down.
pub async fn serve_control(state: Arc<RelayState>, socket: UdpSocket) {
    let mut buffer = vec![0u8; rosc::decoder::MTU];
    loop {
        let len = match socket.recv_from(&mut buffer).await {
            Ok((len, _from)) => len,
            Err(error) => {
                debug!(%error, "control socket receive failed");
                continue;
            }
        };
        match rosc::decoder::decode_udp(&buffer[..len]) {
            Ok((_rest, packet)) => handle_packet(&state, packet),
            Err(error) => debug!(%error, "dropping undecodable control packet"),
        }
    }
}

/// Recurse into bundles; apply plain messages.
fn handle_packet(state: &RelayState, packet: OscPacket) {
    match packet {
        OscPacket::Message(message) => handle_message(state, &message),
        OscPacket::Bundle(bundle) => {
            for inner in bundle.content {
                handle_packet(state, inner);
            }
        }
    }
}

/// Apply one decoded control message to the shared state.
pub fn handle_message(state: &RelayState, message: &OscMessage) {
    let broadcast = match ControlMessage::from_osc(message) {
        Ok(ControlMessage::Mode(mode)) => Some(state.set_mode(&mode)),
        Ok(ControlMessage::Trigger { name, voice }) => Some(SoundUpdate {
            trig: vec![trigger_tag(&name, voice)],
            ..SoundUpdate::default()
        }),
        Ok(ControlMessage::VoiceSet { voice, params }) => state.set_voice(voice, params),
        Ok(ControlMessage::VoiceGate { voice, gate }) => {
            state.patch_voice(voice, &VoicePatch::gate_only(gate))
        }
        Err(ControlError::VoiceOutOfRange(index)) => {
            debug!(index, addr = %message.addr, "dropping control message for bad voice index");
            None
        }
        Err(error) => {
            debug!(%error, "dropping control message");
            None
        }
    };

    if let Some(update) = broadcast {
        state.bump_control_accepted();
        match (RelayMessage::Snd { snd: update }).to_json() {
            Ok(text) => state.broadcast_to_browsers(&text),
            Err(error) => warn!(%error, "failed to encode control broadcast"),
        }
    }
}
