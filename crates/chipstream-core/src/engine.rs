//! Engine contract shared by all chip synthesis backends.
//!
//! The trait keeps the public surface small: register access, sample
//! generation and the frequency mapping. Default methods implement the
//! mixing and buffer-filling behavior so concrete engines only override
//! the per-voice sample path.

use crate::voice::{NUM_VOICES, VoiceParams, VoicePatch};

/// Default polynomial-counter base clock in Hz.
///
/// The historical chips clocked their audio frequency dividers at
/// roughly 30 kHz; engines that model other hardware override
/// [`SynthEngine::base_clock`].
pub const DEFAULT_BASE_CLOCK: f32 = 30_000.0;

/// Fixed per-voice headroom factor.
///
/// Four voices at full volume sum to at most 1.0 before the clip stage.
pub const VOICE_HEADROOM: f32 = 0.25;

/// Knee of the output limiter; samples below this pass unchanged.
const CLIP_KNEE: f32 = 0.85;

/// Soft-clip a mixed sample into [-1.0, 1.0].
///
/// Linear below the knee, with the remaining range compressed through a
/// tanh segment so the output never reaches the rails.
#[inline]
pub fn soft_clip(sample: f32) -> f32 {
    let magnitude = sample.abs();
    if magnitude <= CLIP_KNEE {
        return sample;
    }
    let over = (magnitude - CLIP_KNEE) / (1.0 - CLIP_KNEE);
    (CLIP_KNEE + (1.0 - CLIP_KNEE) * over.tanh()).copysign(sample)
}

/// Common interface for 4-voice chip synthesis backends.
///
/// Engines are constructed with a sample rate (each concrete type has
/// its own constructor; see [`crate::EngineRegistry`] for name-based
/// construction) and then driven one sample at a time.
///
/// # Example
///
/// ```
/// use chipstream_core::{AtariEngine, SynthEngine, VoicePatch};
///
/// let mut engine = AtariEngine::new(44_100);
/// engine.set_voice(0, &VoicePatch::from_values(1, 8, 0, 15));
///
/// let mut buffer = [0.0f32; 256];
/// engine.fill_buffer(&mut buffer);
/// ```
pub trait SynthEngine: Send {
    /// Stable identifier of this engine (the registry key).
    fn name(&self) -> &'static str;

    /// Output sample rate the engine was constructed with.
    fn sample_rate(&self) -> u32;

    /// Clock feeding the frequency divider, in Hz.
    fn base_clock(&self) -> f32 {
        DEFAULT_BASE_CLOCK
    }

    /// Merge a partial update into one voice's registers.
    ///
    /// All registers are clamped to their declared ranges; an index
    /// outside 0-3 is ignored.
    fn set_voice(&mut self, index: usize, patch: &VoicePatch);

    /// Read-only snapshot of one voice's public registers.
    ///
    /// Returns the default (silent) parameters for an out-of-range
    /// index.
    fn voice(&self, index: usize) -> VoiceParams;

    /// Snapshot of all four voices.
    fn voices(&self) -> [VoiceParams; NUM_VOICES] {
        std::array::from_fn(|index| self.voice(index))
    }

    /// Produce the next sample of a single voice in [-1.0, 1.0].
    ///
    /// The base implementation is silent; concrete engines override.
    fn generate_voice_sample(&mut self, index: usize) -> f32 {
        let _ = index;
        0.0
    }

    /// Produce the next mixed sample across all four voices.
    ///
    /// Sums the per-voice samples and applies the soft-clip limiter, so
    /// the result is always within [-1.0, 1.0].
    fn generate_sample(&mut self) -> f32 {
        let mut mixed = 0.0;
        for index in 0..NUM_VOICES {
            mixed += self.generate_voice_sample(index);
        }
        soft_clip(mixed)
    }

    /// Fill `buffer` with consecutive mixed samples.
    fn fill_buffer(&mut self, buffer: &mut [f32]) {
        for slot in buffer.iter_mut() {
            *slot = self.generate_sample();
        }
    }

    /// Zero all voice registers and engine-private state.
    fn reset(&mut self);

    /// Map the `freq` register to an oscillator frequency in Hz.
    fn frequency_hz(&self, freq: u8) -> f32 {
        self.base_clock() / (freq as f32 + 1.0)
    }
}
