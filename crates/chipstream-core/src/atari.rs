//! Atari-style polynomial-counter engine.
//!
//! Reproduces the tone/noise behavior of the classic polynomial-counter
//! sound hardware: three maximal-length LFSR sequences (4-, 5- and
//! 9-stage) precomputed at construction, one oscillator per voice, and
//! sixteen waveform rules mixing pure tone, polynomial noise and
//! divided sub-octaves.
//!
//! The poly counters are clocked once per oscillator period, not once
//! per sample: whenever a voice's phase accumulator wraps past 1.0, all
//! three table positions and the divider advance by one step. This
//! matches the hardware, where the shift registers run off the same
//! divided clock as the tone output.

use crate::engine::{SynthEngine, VOICE_HEADROOM};
use crate::poly::{POLY4_PERIOD, POLY5_PERIOD, POLY9_PERIOD, poly4_table, poly5_table, poly9_table};
use crate::voice::{MAX_VOL, NUM_VOICES, VoiceParams, VoicePatch};

/// Per-voice oscillator and counter state.
///
/// Private to the engine; callers only ever see [`VoiceParams`].
#[derive(Clone, Copy, Debug, Default)]
struct OscState {
    /// Phase accumulator in [0.0, 1.0).
    phase: f32,
    /// Position into the 4-stage poly table.
    poly4_pos: usize,
    /// Position into the 5-stage poly table.
    poly5_pos: usize,
    /// Position into the 9-stage poly table.
    poly9_pos: usize,
    /// Divider counter, one step per oscillator period.
    divider: u32,
}

/// Polynomial-counter chip engine.
///
/// # Waveform rules
///
/// The `wave` register selects one of sixteen output rules. `tone` is
/// the square comparison `phase < 0.5`, `pN` the current bit of the
/// N-stage poly table, and `div(n)` a square at 1/(2n) of the
/// oscillator rate derived from the divider counter:
///
/// | wave | output          | wave | output           |
/// |------|-----------------|------|------------------|
/// | 0    | tone            | 8    | tone AND div(15) |
/// | 1    | p4              | 9    | p9 AND div(15)   |
/// | 2    | p5              | 10   | tone AND div(31) |
/// | 3    | p9              | 11   | p5 AND div(31)   |
/// | 4    | p5 AND p4       | 12   | tone AND div(93) |
/// | 5    | tone AND p5     | 13   | p9 AND div(93)   |
/// | 6    | tone AND div(6) | 14   | p5 XOR p4        |
/// | 7    | p9 AND div(6)   | 15   | constant high    |
pub struct AtariEngine {
    sample_rate: u32,
    voices: [VoiceParams; NUM_VOICES],
    osc: [OscState; NUM_VOICES],
    poly4: Vec<u8>,
    poly5: Vec<u8>,
    poly9: Vec<u8>,
}

impl AtariEngine {
    /// Registry name of this engine.
    pub const NAME: &'static str = "atari";

    /// Frequency divider clock, fixed at construction (~30 kHz on the
    /// original hardware).
    pub const BASE_CLOCK: f32 = 30_000.0;

    /// Create an engine at the given sample rate.
    ///
    /// Precomputes the three polynomial tables (periods 15, 31, 511).
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            voices: [VoiceParams::default(); NUM_VOICES],
            osc: [OscState::default(); NUM_VOICES],
            poly4: poly4_table(),
            poly5: poly5_table(),
            poly9: poly9_table(),
        }
    }

    /// Divider-derived square: high for `n` counts, low for `n` counts.
    #[inline]
    fn div_gate(divider: u32, n: u32) -> bool {
        (divider % (2 * n)) < n
    }

    /// Evaluate the selected waveform rule at the voice's current state.
    fn raw_level(&self, wave: u8, osc: &OscState) -> bool {
        let tone = osc.phase < 0.5;
        let p4 = self.poly4[osc.poly4_pos] != 0;
        let p5 = self.poly5[osc.poly5_pos] != 0;
        let p9 = self.poly9[osc.poly9_pos] != 0;

        match wave & 0x0F {
            0 => tone,
            1 => p4,
            2 => p5,
            3 => p9,
            4 => p5 && p4,
            5 => tone && p5,
            6 => tone && Self::div_gate(osc.divider, 6),
            7 => p9 && Self::div_gate(osc.divider, 6),
            8 => tone && Self::div_gate(osc.divider, 15),
            9 => p9 && Self::div_gate(osc.divider, 15),
            10 => tone && Self::div_gate(osc.divider, 31),
            11 => p5 && Self::div_gate(osc.divider, 31),
            12 => tone && Self::div_gate(osc.divider, 93),
            13 => p9 && Self::div_gate(osc.divider, 93),
            14 => p5 != p4,
            _ => true,
        }
    }
}

impl SynthEngine for AtariEngine {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn base_clock(&self) -> f32 {
        Self::BASE_CLOCK
    }

    fn set_voice(&mut self, index: usize, patch: &VoicePatch) {
        if let Some(voice) = self.voices.get_mut(index) {
            patch.apply_to(voice);
        }
    }

    fn voice(&self, index: usize) -> VoiceParams {
        self.voices.get(index).copied().unwrap_or_default()
    }

    fn generate_voice_sample(&mut self, index: usize) -> f32 {
        let Some(params) = self.voices.get(index).copied() else {
            return 0.0;
        };
        if !params.is_audible() {
            return 0.0;
        }

        let increment = self.frequency_hz(params.freq) / self.sample_rate as f32;
        let raw = if self.raw_level(params.wave, &self.osc[index]) {
            1.0
        } else {
            -1.0
        };

        // Advance the oscillator; poly/divider state steps once per
        // period wrap, not once per sample.
        let osc = &mut self.osc[index];
        osc.phase += increment;
        while osc.phase >= 1.0 {
            osc.phase -= 1.0;
            osc.poly4_pos = (osc.poly4_pos + 1) % POLY4_PERIOD;
            osc.poly5_pos = (osc.poly5_pos + 1) % POLY5_PERIOD;
            osc.poly9_pos = (osc.poly9_pos + 1) % POLY9_PERIOD;
            osc.divider = osc.divider.wrapping_add(1);
        }

        raw * (params.vol as f32 / MAX_VOL as f32) * VOICE_HEADROOM
    }

    fn reset(&mut self) {
        self.voices = [VoiceParams::default(); NUM_VOICES];
        self.osc = [OscState::default(); NUM_VOICES];
    }
}

impl std::fmt::Debug for AtariEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtariEngine")
            .field("sample_rate", &self.sample_rate)
            .field("voices", &self.voices)
            .finish_non_exhaustive()
    }
}
