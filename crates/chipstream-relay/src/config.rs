//! Environment configuration with fixed defaults.

use std::env;
use std::path::PathBuf;

/// Default HTTP/WebSocket listen port.
pub const DEFAULT_PORT: u16 = 1985;

/// Default OSC control listen port.
pub const DEFAULT_CONTROL_PORT: u16 = 1986;

/// Default directory holding the whitelisted browser assets.
pub const DEFAULT_PUBLIC_DIR: &str = "public";

/// Relay server configuration, read once at startup.
///
/// Every option is optional with a fixed default; an unparseable value
/// falls back to the default rather than failing startup.
#[derive(Clone, Debug)]
pub struct RelayConfig {
    /// HTTP/WebSocket listen port (`PORT`).
    pub port: u16,
    /// OSC control listen port (`CONTROL_PORT`).
    pub control_port: u16,
    /// Directory for whitelisted static assets (`PUBLIC_DIR`).
    pub public_dir: PathBuf,
    /// Optional path to the companion synthesis subprocess
    /// (`SYNTH_PATH`); spawned at startup when set.
    pub synth_path: Option<PathBuf>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            control_port: DEFAULT_CONTROL_PORT,
            public_dir: PathBuf::from(DEFAULT_PUBLIC_DIR),
            synth_path: None,
        }
    }
}

impl RelayConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self {
            port: env_u16("PORT", DEFAULT_PORT),
            control_port: env_u16("CONTROL_PORT", DEFAULT_CONTROL_PORT),
            public_dir: env::var("PUBLIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_PUBLIC_DIR)),
            synth_path: env::var("SYNTH_PATH").ok().map(PathBuf::from),
        }
    }
}

fn env_u16(name: &str, default: u16) -> u16 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_classic_ports() {
        let config = RelayConfig::default();
        assert_eq!(config.port, 1985);
        assert_eq!(config.control_port, 1986);
        assert!(config.synth_path.is_none());
    }
}
