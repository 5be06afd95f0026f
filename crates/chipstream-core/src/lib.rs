//! Pluggable 4-voice chip synthesis engines.
//!
//! This crate models a family of classic sound chips as swappable
//! backends behind a common [`SynthEngine`] trait. Each engine owns four
//! voices controlled through small integer registers (`gate`, `freq`,
//! `wave`, `vol`) and produces one mixed audio sample at a time.
//!
//! # Components
//! - [`SynthEngine`] - the engine contract (register access, per-voice
//!   and mixed sample generation, reset, frequency mapping)
//! - [`AtariEngine`] - polynomial-counter engine reproducing classic
//!   tone/noise behavior from precomputed LFSR tables
//! - [`SilentEngine`] - register-faithful fallback that outputs silence
//! - [`EngineRegistry`] - explicit name → factory table built at
//!   process start
//! - [`EngineManager`] - owns the active engine and hot-swaps backends
//!   while carrying the public voice registers over
//!
//! # Quick start
//! ```
//! use chipstream_core::{EngineManager, EngineRegistry, VoicePatch};
//! use std::sync::Arc;
//!
//! let registry = Arc::new(EngineRegistry::with_builtin_engines());
//! let mut manager = EngineManager::new(registry, "atari", 44_100);
//!
//! manager.set_voice(0, &VoicePatch::from_values(1, 8, 0, 15));
//! let sample = manager.generate_sample();
//! assert!((-1.0..=1.0).contains(&sample));
//! ```

#![warn(missing_docs)]

pub mod atari;
pub mod engine;
pub mod manager;
pub mod poly;
pub mod registry;
pub mod silent;
pub mod voice;

/// Error types for engine management operations.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    /// Requested engine name is not present in the registry.
    #[error("unknown engine: {0}")]
    UnknownEngine(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

// Public API exports
pub use atari::AtariEngine;
pub use engine::{DEFAULT_BASE_CLOCK, SynthEngine, VOICE_HEADROOM, soft_clip};
pub use manager::EngineManager;
pub use registry::{EngineFactory, EngineRegistry};
pub use silent::SilentEngine;
pub use voice::{NUM_VOICES, VoiceParams, VoicePatch};
