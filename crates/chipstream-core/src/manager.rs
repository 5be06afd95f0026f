//! Engine ownership and hot swapping.
//!
//! The manager holds exactly one active engine and exposes the same
//! voice/sample API, forwarding every call. Swapping engines carries
//! the four public voice registers over; engine-private state (phase,
//! poly positions) is deliberately rebuilt from zero by the incoming
//! engine.

use std::sync::Arc;

use tracing::warn;

use crate::engine::SynthEngine;
use crate::registry::EngineRegistry;
use crate::silent::SilentEngine;
use crate::voice::{NUM_VOICES, VoiceParams, VoicePatch};
use crate::{EngineError, Result};

/// Owns the active synthesis engine and swaps backends by name.
pub struct EngineManager {
    registry: Arc<EngineRegistry>,
    engine: Box<dyn SynthEngine>,
    sample_rate: u32,
}

impl EngineManager {
    /// Create a manager with the engine registered under `name`.
    ///
    /// An unknown name falls back to the silent engine so a
    /// misconfigured process still runs; the failure is logged once.
    pub fn new(registry: Arc<EngineRegistry>, name: &str, sample_rate: u32) -> Self {
        let engine = registry.create(name, sample_rate).unwrap_or_else(|| {
            warn!(engine = name, "unknown engine at startup, using silent fallback");
            Box::new(SilentEngine::new(sample_rate))
        });
        Self {
            registry,
            engine,
            sample_rate,
        }
    }

    /// Name of the active engine.
    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    /// Sample rate all engines are constructed with.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Swap the active engine, preserving the public voice registers.
    ///
    /// An unknown name leaves the current engine untouched and returns
    /// [`EngineError::UnknownEngine`]. On success the outgoing engine's
    /// `{gate, freq, wave, vol}` snapshots are replayed through the new
    /// engine's `set_voice`; private state is not transferred.
    pub fn set_engine(&mut self, name: &str) -> Result<()> {
        let Some(mut next) = self.registry.create(name, self.sample_rate) else {
            warn!(engine = name, "unknown engine requested, keeping current");
            return Err(EngineError::UnknownEngine(name.to_string()));
        };

        for index in 0..NUM_VOICES {
            let snapshot = self.engine.voice(index);
            next.set_voice(index, &VoicePatch::from(snapshot));
        }
        self.engine = next;
        Ok(())
    }

    /// Merge a partial update into one voice. See [`SynthEngine::set_voice`].
    pub fn set_voice(&mut self, index: usize, patch: &VoicePatch) {
        self.engine.set_voice(index, patch);
    }

    /// Snapshot one voice's registers.
    pub fn voice(&self, index: usize) -> VoiceParams {
        self.engine.voice(index)
    }

    /// Snapshot all four voices.
    pub fn voices(&self) -> [VoiceParams; NUM_VOICES] {
        self.engine.voices()
    }

    /// Next mixed sample from the active engine.
    pub fn generate_sample(&mut self) -> f32 {
        self.engine.generate_sample()
    }

    /// Next sample of a single voice.
    pub fn generate_voice_sample(&mut self, index: usize) -> f32 {
        self.engine.generate_voice_sample(index)
    }

    /// Fill `buffer` with consecutive mixed samples.
    pub fn fill_buffer(&mut self, buffer: &mut [f32]) {
        self.engine.fill_buffer(buffer);
    }

    /// Zero all registers and private state of the active engine.
    pub fn reset(&mut self) {
        self.engine.reset();
    }

    /// Frequency mapping of the active engine.
    pub fn frequency_hz(&self, freq: u8) -> f32 {
        self.engine.frequency_hz(freq)
    }
}

impl std::fmt::Debug for EngineManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineManager")
            .field("engine", &self.engine.name())
            .field("sample_rate", &self.sample_rate)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_manager(name: &str) -> EngineManager {
        EngineManager::new(
            Arc::new(EngineRegistry::with_builtin_engines()),
            name,
            44_100,
        )
    }

    #[test]
    fn unknown_startup_name_falls_back_to_silent() {
        let manager = make_manager("does-not-exist");
        assert_eq!(manager.engine_name(), "silent");
    }

    #[test]
    fn swap_preserves_public_voice_registers() {
        let mut manager = make_manager("atari");
        manager.set_voice(0, &VoicePatch::from_values(1, 8, 4, 15));
        manager.set_voice(3, &VoicePatch::from_values(1, 30, 2, 7));
        let before = manager.voices();

        manager.set_engine("silent").unwrap();
        assert_eq!(manager.engine_name(), "silent");
        assert_eq!(manager.voices(), before);

        manager.set_engine("atari").unwrap();
        assert_eq!(manager.voices(), before);
    }

    #[test]
    fn swap_to_unknown_engine_keeps_current() {
        let mut manager = make_manager("atari");
        manager.set_voice(1, &VoicePatch::from_values(1, 5, 3, 9));

        let result = manager.set_engine("pokey2");
        assert!(matches!(result, Err(EngineError::UnknownEngine(_))));
        assert_eq!(manager.engine_name(), "atari");
        assert_eq!(
            manager.voice(1),
            VoiceParams {
                gate: 1,
                freq: 5,
                wave: 3,
                vol: 9
            }
        );
    }

    #[test]
    fn swap_resets_private_state() {
        let mut manager = make_manager("atari");
        manager.set_voice(0, &VoicePatch::from_values(1, 2, 3, 15));

        // Run the oscillator forward, then swap back to the same engine
        // type: registers survive, the waveform restarts from phase 0.
        for _ in 0..1000 {
            manager.generate_sample();
        }
        manager.set_engine("atari").unwrap();

        let mut fresh = make_manager("atari");
        for (index, params) in manager.voices().iter().enumerate() {
            fresh.set_voice(index, &VoicePatch::from(*params));
        }

        for _ in 0..64 {
            assert_eq!(manager.generate_sample(), fresh.generate_sample());
        }
    }
}
