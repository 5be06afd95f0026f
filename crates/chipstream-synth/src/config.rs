//! Environment configuration with fixed defaults.

use std::env;
use std::path::PathBuf;

/// Default relay socket endpoint.
pub const DEFAULT_RELAY_URL: &str = "ws://127.0.0.1:1985/ws";

/// Default synthesis engine.
pub const DEFAULT_ENGINE: &str = "atari";

/// Default output sample rate.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Default capture length in WAV mode.
pub const DEFAULT_WAV_SECONDS: u32 = 30;

/// Synth client configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct SynthConfig {
    /// Relay WebSocket endpoint (`RELAY_URL`); the client appends its
    /// `role=browser` query parameter.
    pub relay_url: String,
    /// Engine selected at startup (`ENGINE`); the relay's mode changes
    /// swap it at runtime.
    pub engine: String,
    /// Output sample rate (`SAMPLE_RATE`).
    pub sample_rate: u32,
    /// When set (`WAV_OUT`), render to this WAV file instead of the
    /// audio device.
    pub wav_out: Option<PathBuf>,
    /// Capture length for WAV mode (`WAV_SECONDS`).
    pub wav_seconds: u32,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            relay_url: DEFAULT_RELAY_URL.to_string(),
            engine: DEFAULT_ENGINE.to_string(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            wav_out: None,
            wav_seconds: DEFAULT_WAV_SECONDS,
        }
    }
}

impl SynthConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self {
            relay_url: env::var("RELAY_URL").unwrap_or_else(|_| DEFAULT_RELAY_URL.to_string()),
            engine: env::var("ENGINE").unwrap_or_else(|_| DEFAULT_ENGINE.to_string()),
            sample_rate: env_u32("SAMPLE_RATE", DEFAULT_SAMPLE_RATE),
            wav_out: env::var("WAV_OUT").ok().map(PathBuf::from),
            wav_seconds: env_u32("WAV_SECONDS", DEFAULT_WAV_SECONDS),
        }
    }

    /// Full connect URL including the browser role.
    pub fn connect_url(&self) -> String {
        format!("{}?role=browser", self.relay_url)
    }
}

fn env_u32(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
