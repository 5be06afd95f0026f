//! Velocity → voice parameter derivation.
//!
//! Each player maps to one voice. An idle player keeps a fixed low hum;
//! speed raises both pitch (lower frequency register) and volume, and
//! the waveform switches to a poly buzz at the top of the range.

use chipstream_core::{NUM_VOICES, VoiceParams};
use chipstream_proto::SoundUpdate;

/// Velocity treated as full speed.
pub const MAX_VELOCITY: f32 = 10.0;

/// Below this absolute velocity a player counts as idle.
const IDLE_THRESHOLD: f32 = 0.05;

/// Idle hum registers: a low, quiet engine note.
const HUM_FREQ: u8 = 28;
const HUM_VOL: u8 = 2;

/// Frequency register span covered between idle and full speed.
const FREQ_SPAN: f32 = 24.0;

/// Waveform used at the top of the speed range.
const TOP_SPEED_WAVE: u8 = 4;

/// Map one player's absolute velocity to voice registers.
pub fn voice_for_velocity(velocity: f32) -> VoiceParams {
    let speed = velocity.abs();
    if speed < IDLE_THRESHOLD {
        return VoiceParams {
            gate: 1,
            freq: HUM_FREQ,
            wave: 0,
            vol: HUM_VOL,
        };
    }

    let norm = (speed / MAX_VELOCITY).clamp(0.0, 1.0);
    VoiceParams {
        gate: 1,
        freq: HUM_FREQ - (norm * FREQ_SPAN).round() as u8,
        wave: if norm >= 0.95 { TOP_SPEED_WAVE } else { 0 },
        vol: 4 + (norm * 11.0).round() as u8,
    }
    .clamped()
}

/// Last derived registers per voice, mirrored into frame updates.
///
/// The relay replaces voice snapshots wholesale, so the bridge always
/// sends the full four-voice array once any player's sound changes.
#[derive(Debug, Default)]
pub struct SoundModel {
    voices: [VoiceParams; NUM_VOICES],
}

impl SoundModel {
    /// Fresh model with all voices silent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply observed velocities and triggers.
    ///
    /// Returns the sound payload for the outgoing frame, or `None` when
    /// nothing changed and no trigger fired. Players beyond the fourth
    /// voice are ignored.
    pub fn update(
        &mut self,
        velocities: &[(usize, f32)],
        triggers: Vec<String>,
    ) -> Option<SoundUpdate> {
        let mut changed = false;
        for &(player, velocity) in velocities {
            if player >= NUM_VOICES {
                continue;
            }
            let params = voice_for_velocity(velocity);
            if self.voices[player] != params {
                self.voices[player] = params;
                changed = true;
            }
        }

        if !changed && triggers.is_empty() {
            return None;
        }
        Some(SoundUpdate {
            mode: None,
            voices: changed.then(|| self.voices.to_vec()),
            trig: triggers,
        })
    }
}
