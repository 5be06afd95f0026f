//! Environment configuration with fixed defaults.

use std::env;
use std::path::PathBuf;

/// Default relay socket endpoint.
pub const DEFAULT_RELAY_URL: &str = "ws://127.0.0.1:1985/ws";

/// Default game type announced in the `register` message.
pub const DEFAULT_GAME_TYPE: &str = "racer";

/// Bridge configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct BridgeConfig {
    /// Relay WebSocket endpoint (`RELAY_URL`); the bridge appends its
    /// `role=game` query parameter.
    pub relay_url: String,
    /// Path to the external game binary (`GAME_PATH`); unset selects
    /// demo mode.
    pub game_path: Option<PathBuf>,
    /// Game type announced to the relay (`GAME_TYPE`).
    pub game_type: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            relay_url: DEFAULT_RELAY_URL.to_string(),
            game_path: None,
            game_type: DEFAULT_GAME_TYPE.to_string(),
        }
    }
}

impl BridgeConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self {
            relay_url: env::var("RELAY_URL").unwrap_or_else(|_| DEFAULT_RELAY_URL.to_string()),
            game_path: env::var("GAME_PATH").ok().map(PathBuf::from),
            game_type: env::var("GAME_TYPE").unwrap_or_else(|_| DEFAULT_GAME_TYPE.to_string()),
        }
    }

    /// Full connect URL including the game-source role.
    pub fn connect_url(&self) -> String {
        format!("{}?role=game", self.relay_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_url_appends_game_role() {
        let config = BridgeConfig::default();
        assert_eq!(config.connect_url(), "ws://127.0.0.1:1985/ws?role=game");
    }
}
