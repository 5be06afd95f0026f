//! Voice register model shared by all synthesis engines.
//!
//! A voice is one of four independent sound channels. Its public face
//! is four small integer registers; anything else an engine keeps per
//! voice (oscillator phase, polynomial counter positions) stays behind
//! the engine boundary.

use serde::{Deserialize, Serialize};

/// Number of voices per engine instance.
pub const NUM_VOICES: usize = 4;

/// Maximum value of the `gate` register (boolean-valued).
pub const MAX_GATE: u8 = 1;

/// Maximum value of the `freq` divisor register.
pub const MAX_FREQ: u8 = 31;

/// Maximum value of the `wave` selection register.
pub const MAX_WAVE: u8 = 15;

/// Maximum value of the `vol` register.
pub const MAX_VOL: u8 = 15;

/// Public control registers of a single voice.
///
/// Registers are clamped to their declared ranges after any mutation;
/// an engine never holds an out-of-range value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceParams {
    /// Whether the voice is sounding (0 or 1).
    pub gate: u8,
    /// Engine-specific frequency divisor, 0-31.
    pub freq: u8,
    /// Waveform/noise mode selector, 0-15.
    pub wave: u8,
    /// Linear output level, 0-15.
    pub vol: u8,
}

impl VoiceParams {
    /// Return a copy with every register clamped to its valid range.
    #[inline]
    pub fn clamped(self) -> Self {
        Self {
            gate: self.gate.min(MAX_GATE),
            freq: self.freq.min(MAX_FREQ),
            wave: self.wave.min(MAX_WAVE),
            vol: self.vol.min(MAX_VOL),
        }
    }

    /// A voice contributes output only when gated with non-zero volume.
    #[inline]
    pub fn is_audible(&self) -> bool {
        self.gate != 0 && self.vol != 0
    }
}

/// Partial voice update merged by [`set_voice`].
///
/// Absent fields leave the corresponding register untouched.
///
/// [`set_voice`]: crate::SynthEngine::set_voice
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoicePatch {
    /// New gate value, if any.
    pub gate: Option<u8>,
    /// New frequency divisor, if any.
    pub freq: Option<u8>,
    /// New waveform selector, if any.
    pub wave: Option<u8>,
    /// New volume, if any.
    pub vol: Option<u8>,
}

impl VoicePatch {
    /// Build a patch setting all four registers.
    pub fn from_values(gate: u8, freq: u8, wave: u8, vol: u8) -> Self {
        Self {
            gate: Some(gate),
            freq: Some(freq),
            wave: Some(wave),
            vol: Some(vol),
        }
    }

    /// Build a patch touching only the gate register.
    pub fn gate_only(gate: u8) -> Self {
        Self {
            gate: Some(gate),
            ..Self::default()
        }
    }

    /// Merge this patch into `params`, clamping the result.
    pub fn apply_to(&self, params: &mut VoiceParams) {
        if let Some(gate) = self.gate {
            params.gate = gate;
        }
        if let Some(freq) = self.freq {
            params.freq = freq;
        }
        if let Some(wave) = self.wave {
            params.wave = wave;
        }
        if let Some(vol) = self.vol {
            params.vol = vol;
        }
        *params = params.clamped();
    }
}

impl From<VoiceParams> for VoicePatch {
    /// A full snapshot becomes a patch that restores every register.
    fn from(params: VoiceParams) -> Self {
        Self::from_values(params.gate, params.freq, params.wave, params.vol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_out_of_range_registers() {
        let params = VoiceParams {
            gate: 7,
            freq: 200,
            wave: 99,
            vol: 255,
        }
        .clamped();

        assert_eq!(params.gate, MAX_GATE);
        assert_eq!(params.freq, MAX_FREQ);
        assert_eq!(params.wave, MAX_WAVE);
        assert_eq!(params.vol, MAX_VOL);
    }

    #[test]
    fn patch_merges_only_present_fields() {
        let mut params = VoiceParams {
            gate: 1,
            freq: 10,
            wave: 3,
            vol: 12,
        };

        VoicePatch {
            freq: Some(4),
            ..VoicePatch::default()
        }
        .apply_to(&mut params);

        assert_eq!(params.freq, 4);
        assert_eq!(params.gate, 1);
        assert_eq!(params.wave, 3);
        assert_eq!(params.vol, 12);
    }

    #[test]
    fn patch_clamps_after_merge() {
        let mut params = VoiceParams::default();
        VoicePatch::from_values(9, 99, 99, 99).apply_to(&mut params);

        assert_eq!(
            params,
            VoiceParams {
                gate: 1,
                freq: 31,
                wave: 15,
                vol: 15
            }
        );
    }

    #[test]
    fn audibility_requires_gate_and_volume() {
        let mut params = VoiceParams {
            gate: 1,
            freq: 8,
            wave: 0,
            vol: 15,
        };
        assert!(params.is_audible());

        params.gate = 0;
        assert!(!params.is_audible());

        params.gate = 1;
        params.vol = 0;
        assert!(!params.is_audible());
    }
}
