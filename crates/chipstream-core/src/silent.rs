//! Register-faithful engine that produces no audio.

use crate::engine::SynthEngine;
use crate::voice::{NUM_VOICES, VoiceParams, VoicePatch};

/// Fallback engine: accepts and clamps voice registers like any other
/// backend but relies on the trait's silent sample defaults.
///
/// The manager constructs this engine when an unknown name is requested
/// at startup, so a misconfigured process still serves (silent) audio
/// instead of failing.
#[derive(Clone, Debug)]
pub struct SilentEngine {
    sample_rate: u32,
    voices: [VoiceParams; NUM_VOICES],
}

impl SilentEngine {
    /// Registry name of this engine.
    pub const NAME: &'static str = "silent";

    /// Create a silent engine at the given sample rate.
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            voices: [VoiceParams::default(); NUM_VOICES],
        }
    }
}

impl SynthEngine for SilentEngine {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn set_voice(&mut self, index: usize, patch: &VoicePatch) {
        if let Some(voice) = self.voices.get_mut(index) {
            patch.apply_to(voice);
        }
    }

    fn voice(&self, index: usize) -> VoiceParams {
        self.voices.get(index).copied().unwrap_or_default()
    }

    fn reset(&mut self) {
        self.voices = [VoiceParams::default(); NUM_VOICES];
    }
}
