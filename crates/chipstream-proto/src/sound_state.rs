//! Relay-wide sound state and partial updates.

use chipstream_core::{NUM_VOICES, SilentEngine, VoiceParams, VoicePatch};
use serde::{Deserialize, Serialize};

/// The relay's authoritative snapshot of current voice/mode values.
///
/// One instance per relay process, mirrored to every browser client on
/// connect (`sync`) and after each change (`snd`). Never persisted;
/// lost on restart.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SoundState {
    /// Identifier of the active synthesis engine (chip family).
    pub mode: String,
    /// Last known public registers per voice.
    #[serde(rename = "v")]
    pub voices: [VoiceParams; NUM_VOICES],
}

impl Default for SoundState {
    /// Silent default: the fallback engine with all-zero voices.
    fn default() -> Self {
        Self {
            mode: SilentEngine::NAME.to_string(),
            voices: [VoiceParams::default(); NUM_VOICES],
        }
    }
}

impl SoundState {
    /// Merge a partial update, clamping every incoming register.
    ///
    /// Voice entries beyond the fourth are ignored; `trig` entries are
    /// one-shot events and leave the snapshot untouched.
    pub fn apply(&mut self, update: &SoundUpdate) {
        if let Some(mode) = &update.mode {
            self.mode = mode.clone();
        }
        if let Some(voices) = &update.voices {
            for (index, params) in voices.iter().take(NUM_VOICES).enumerate() {
                self.voices[index] = params.clamped();
            }
        }
    }

    /// Replace one voice's snapshot. Returns false (and changes
    /// nothing) for an out-of-range index.
    pub fn set_voice(&mut self, index: usize, params: VoiceParams) -> bool {
        match self.voices.get_mut(index) {
            Some(slot) => {
                *slot = params.clamped();
                true
            }
            None => false,
        }
    }

    /// Merge a patch into one voice's snapshot. Returns false for an
    /// out-of-range index.
    pub fn patch_voice(&mut self, index: usize, patch: &VoicePatch) -> bool {
        match self.voices.get_mut(index) {
            Some(slot) => {
                patch.apply_to(slot);
                true
            }
            None => false,
        }
    }

    /// Partial update carrying the full voice array.
    pub fn voices_update(&self) -> SoundUpdate {
        SoundUpdate {
            voices: Some(self.voices.to_vec()),
            ..SoundUpdate::default()
        }
    }

    /// Partial update carrying only the mode.
    pub fn mode_update(&self) -> SoundUpdate {
        SoundUpdate {
            mode: Some(self.mode.clone()),
            ..SoundUpdate::default()
        }
    }
}

/// Partial [`SoundState`] update plus one-shot trigger names.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SoundUpdate {
    /// New engine mode, if changing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    /// Replacement voice snapshots, if changing (up to 4 entries).
    #[serde(rename = "v", default, skip_serializing_if = "Option::is_none")]
    pub voices: Option<Vec<VoiceParams>>,
    /// Named one-shot trigger events.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trig: Vec<String>,
}

impl SoundUpdate {
    /// Whether the update carries no state change and no triggers.
    pub fn is_empty(&self) -> bool {
        self.mode.is_none() && self.voices.is_none() && self.trig.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_silent() {
        let state = SoundState::default();
        assert_eq!(state.mode, "silent");
        assert!(state.voices.iter().all(|v| *v == VoiceParams::default()));
    }

    #[test]
    fn apply_merges_mode_and_voices() {
        let mut state = SoundState::default();
        state.apply(&SoundUpdate {
            mode: Some("atari".into()),
            voices: Some(vec![VoiceParams {
                gate: 1,
                freq: 8,
                wave: 4,
                vol: 15,
            }]),
            trig: vec!["scored".into()],
        });

        assert_eq!(state.mode, "atari");
        assert_eq!(state.voices[0].freq, 8);
        assert_eq!(state.voices[1], VoiceParams::default());
    }

    #[test]
    fn apply_clamps_and_drops_excess_voices() {
        let mut state = SoundState::default();
        let oversized = vec![
            VoiceParams {
                gate: 9,
                freq: 200,
                wave: 99,
                vol: 255,
            };
            6
        ];
        state.apply(&SoundUpdate {
            voices: Some(oversized),
            ..SoundUpdate::default()
        });

        for voice in &state.voices {
            assert_eq!(
                *voice,
                VoiceParams {
                    gate: 1,
                    freq: 31,
                    wave: 15,
                    vol: 15
                }
            );
        }
    }

    #[test]
    fn set_voice_rejects_out_of_range_index() {
        let mut state = SoundState::default();
        let params = VoiceParams {
            gate: 1,
            freq: 1,
            wave: 1,
            vol: 1,
        };

        assert!(state.set_voice(3, params));
        assert!(!state.set_voice(4, params));
        assert_eq!(state.voices[3], params);
    }

    #[test]
    fn wire_shape_uses_short_voice_key() {
        let state = SoundState::default();
        let json = serde_json::to_value(&state).unwrap();
        assert!(json.get("v").is_some());
        assert!(json.get("voices").is_none());
    }
}
