//! Explicit engine registry.
//!
//! Engines are registered into a name → factory table built once at
//! process start and handed to the manager. There is no load-time
//! global registration; a process that wants a custom engine constructs
//! its own registry and adds it explicitly.

use std::collections::HashMap;

use crate::atari::AtariEngine;
use crate::engine::SynthEngine;
use crate::silent::SilentEngine;

/// Factory constructing a boxed engine at a given sample rate.
pub type EngineFactory = fn(u32) -> Box<dyn SynthEngine>;

fn silent_factory(sample_rate: u32) -> Box<dyn SynthEngine> {
    Box::new(SilentEngine::new(sample_rate))
}

fn atari_factory(sample_rate: u32) -> Box<dyn SynthEngine> {
    Box::new(AtariEngine::new(sample_rate))
}

/// Name → factory table for engine construction.
#[derive(Default)]
pub struct EngineRegistry {
    factories: HashMap<&'static str, EngineFactory>,
}

impl EngineRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry populated with the built-in engines
    /// (`silent`, `atari`).
    pub fn with_builtin_engines() -> Self {
        let mut registry = Self::new();
        registry.register(SilentEngine::NAME, silent_factory);
        registry.register(AtariEngine::NAME, atari_factory);
        registry
    }

    /// Register (or replace) an engine factory under `name`.
    pub fn register(&mut self, name: &'static str, factory: EngineFactory) {
        self.factories.insert(name, factory);
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Construct the engine registered under `name`, if any.
    pub fn create(&self, name: &str, sample_rate: u32) -> Option<Box<dyn SynthEngine>> {
        self.factories.get(name).map(|factory| factory(sample_rate))
    }

    /// Iterate over registered engine names.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }
}
