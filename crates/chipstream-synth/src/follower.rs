//! Mirrors relay sound state into the engine manager.
//!
//! The synth client is a browser-role peer that never renders frames;
//! it only follows `sync` and `snd` messages (and frame-borne sound
//! payloads) and keeps the engine manager's voices in step.

use chipstream_core::{EngineManager, NUM_VOICES, VoicePatch};
use chipstream_proto::control::parse_trigger_tag;
use chipstream_proto::{RelayMessage, SoundState, SoundUpdate};
use tracing::debug;

/// Apply one relay message to the manager. Non-sound messages are
/// ignored.
pub fn apply_message(manager: &mut EngineManager, message: &RelayMessage) {
    match message {
        RelayMessage::Sync { snd } => apply_state(manager, snd),
        RelayMessage::Snd { snd } => apply_update(manager, snd),
        RelayMessage::Frame(frame) => {
            if let Some(update) = &frame.snd {
                apply_update(manager, update);
            }
        }
        _ => {}
    }
}

/// Replay a full snapshot: engine mode first, then all four voices.
pub fn apply_state(manager: &mut EngineManager, state: &SoundState) {
    switch_mode(manager, &state.mode);
    for (index, params) in state.voices.iter().enumerate() {
        manager.set_voice(index, &VoicePatch::from(*params));
    }
}

/// Merge a partial update.
pub fn apply_update(manager: &mut EngineManager, update: &SoundUpdate) {
    if let Some(mode) = &update.mode {
        switch_mode(manager, mode);
    }
    if let Some(voices) = &update.voices {
        for (index, params) in voices.iter().take(NUM_VOICES).enumerate() {
            manager.set_voice(index, &VoicePatch::from(params.clamped()));
        }
    }
    for tag in &update.trig {
        let (name, voice) = parse_trigger_tag(tag);
        match voice {
            // A voice-targeted trigger re-gates that voice.
            Some(index) => manager.set_voice(index, &VoicePatch::gate_only(1)),
            None => debug!(trigger = name, "ignoring voice-less trigger"),
        }
    }
}

fn switch_mode(manager: &mut EngineManager, mode: &str) {
    if manager.engine_name() == mode {
        return;
    }
    if manager.set_engine(mode).is_err() {
        debug!(mode, "relay selected an engine this client does not have");
    }
}
