//! Shared relay state: sound snapshot, peer registries, counters.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use axum::extract::ws::{Message, Utf8Bytes};
use chipstream_core::{VoiceParams, VoicePatch};
use chipstream_proto::{SoundState, SoundUpdate};
use parking_lot::{Mutex, RwLock};
use serde_json::json;
use tokio::sync::mpsc;
use tracing::debug;

use crate::config::RelayConfig;

/// Outbound queue handle of one connected peer.
///
/// Each peer's socket is drained by its own writer task, so sending
/// here never blocks; a peer whose task is gone simply fails the send
/// and is skipped until its close event unregisters it.
pub type PeerTx = mpsc::UnboundedSender<Message>;

/// Connection role, fixed when the socket upgrades.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeerRole {
    /// A bridge feeding frames into the relay.
    GameSource,
    /// A browser rendering frames and audio.
    Browser,
}

/// Everything the relay mutates at runtime.
///
/// All mutation happens under short-lived locks on the message that
/// triggered it, so no partial update is observable to another message.
pub struct RelayState {
    config: RelayConfig,
    sound: RwLock<SoundState>,
    browsers: Mutex<HashMap<u64, PeerTx>>,
    game_sources: Mutex<HashMap<u64, PeerTx>>,
    game_types: Mutex<Vec<String>>,
    next_peer_id: AtomicU64,
    frames_relayed: AtomicU64,
    control_accepted: AtomicU64,
    started: Instant,
}

impl RelayState {
    /// Fresh state with the silent default sound snapshot.
    pub fn new(config: RelayConfig) -> Self {
        Self {
            config,
            sound: RwLock::new(SoundState::default()),
            browsers: Mutex::new(HashMap::new()),
            game_sources: Mutex::new(HashMap::new()),
            game_types: Mutex::new(Vec::new()),
            next_peer_id: AtomicU64::new(1),
            frames_relayed: AtomicU64::new(0),
            control_accepted: AtomicU64::new(0),
            started: Instant::now(),
        }
    }

    /// Startup configuration.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Register a peer's outbound queue, returning its id.
    pub fn register(&self, role: PeerRole, tx: PeerTx) -> u64 {
        let id = self.next_peer_id.fetch_add(1, Ordering::Relaxed);
        match role {
            PeerRole::Browser => self.browsers.lock().insert(id, tx),
            PeerRole::GameSource => self.game_sources.lock().insert(id, tx),
        };
        id
    }

    /// Drop a peer's registration after its close event.
    pub fn unregister(&self, role: PeerRole, id: u64) {
        match role {
            PeerRole::Browser => self.browsers.lock().remove(&id),
            PeerRole::GameSource => self.game_sources.lock().remove(&id),
        };
    }

    /// Number of connected browser clients.
    pub fn browser_count(&self) -> usize {
        self.browsers.lock().len()
    }

    /// Number of connected game sources.
    pub fn game_source_count(&self) -> usize {
        self.game_sources.lock().len()
    }

    /// Record a registered game type (diagnostics only).
    pub fn record_game_type(&self, game_type: String) {
        let mut types = self.game_types.lock();
        if !types.contains(&game_type) {
            types.push(game_type);
        }
    }

    /// Clone of the current sound snapshot.
    pub fn sound_state(&self) -> SoundState {
        self.sound.read().clone()
    }

    /// Merge a frame's sound payload into the shared snapshot.
    pub fn apply_sound_update(&self, update: &SoundUpdate) {
        self.sound.write().apply(update);
    }

    /// Switch the engine mode, returning the broadcastable update.
    pub fn set_mode(&self, mode: &str) -> SoundUpdate {
        let mut sound = self.sound.write();
        sound.mode = mode.to_string();
        sound.mode_update()
    }

    /// Replace one voice's snapshot. Returns the updated voice array
    /// for broadcast, or `None` (no change) for an out-of-range index.
    pub fn set_voice(&self, index: usize, params: VoiceParams) -> Option<SoundUpdate> {
        let mut sound = self.sound.write();
        sound.set_voice(index, params).then(|| sound.voices_update())
    }

    /// Merge a patch into one voice's snapshot; same contract as
    /// [`RelayState::set_voice`].
    pub fn patch_voice(&self, index: usize, patch: &VoicePatch) -> Option<SoundUpdate> {
        let mut sound = self.sound.write();
        sound.patch_voice(index, patch).then(|| sound.voices_update())
    }

    /// Count one relayed frame.
    pub fn bump_frames_relayed(&self) {
        self.frames_relayed.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one accepted control message.
    pub fn bump_control_accepted(&self) {
        self.control_accepted.fetch_add(1, Ordering::Relaxed);
    }

    /// Queue a text message to every connected browser.
    ///
    /// Peers whose writer is gone fail the send and are skipped; their
    /// registrations are cleaned up by their own close handling.
    pub fn broadcast_to_browsers(&self, text: &str) {
        Self::broadcast(&self.browsers, text);
    }

    /// Queue a text message to every connected game source.
    pub fn broadcast_to_game_sources(&self, text: &str) {
        Self::broadcast(&self.game_sources, text);
    }

    fn broadcast(peers: &Mutex<HashMap<u64, PeerTx>>, text: &str) {
        let message = Message::Text(Utf8Bytes::from(text.to_string()));
        for (id, tx) in peers.lock().iter() {
            if tx.send(message.clone()).is_err() {
                debug!(peer_id = id, "skipping closed peer during broadcast");
            }
        }
    }

    /// Status document served at `/api/status`.
    pub fn status(&self) -> serde_json::Value {
        json!({
            "status": "ok",
            "uptime": self.started.elapsed().as_secs(),
            "clientCount": self.browser_count(),
            "gameSourceCount": self.game_source_count(),
            "stats": {
                "framesRelayed": self.frames_relayed.load(Ordering::Relaxed),
                "controlMessages": self.control_accepted.load(Ordering::Relaxed),
                "gameTypes": self.game_types.lock().clone(),
            },
            "soundState": self.sound_state(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> RelayState {
        RelayState::new(RelayConfig::default())
    }

    #[test]
    fn set_voice_rejects_out_of_range_indices() {
        let state = state();
        let params = VoiceParams {
            gate: 1,
            freq: 8,
            wave: 4,
            vol: 15,
        };

        assert!(state.set_voice(0, params).is_some());
        assert!(state.set_voice(4, params).is_none());
        assert_eq!(state.sound_state().voices[0], params);
    }

    #[test]
    fn broadcast_skips_closed_peers() {
        let state = state();
        let (alive_tx, mut alive_rx) = mpsc::unbounded_channel();
        let (dead_tx, dead_rx) = mpsc::unbounded_channel();
        drop(dead_rx);

        state.register(PeerRole::Browser, alive_tx);
        state.register(PeerRole::Browser, dead_tx);

        state.broadcast_to_browsers("hello");
        assert!(matches!(alive_rx.try_recv(), Ok(Message::Text(text)) if text.as_str() == "hello"));
    }

    #[test]
    fn unregister_removes_only_that_peer() {
        let state = state();
        let (tx_a, _rx_a) = mpsc::unbounded_channel();
        let (tx_b, _rx_b) = mpsc::unbounded_channel();
        let id_a = state.register(PeerRole::GameSource, tx_a);
        let _id_b = state.register(PeerRole::GameSource, tx_b);

        state.unregister(PeerRole::GameSource, id_a);
        assert_eq!(state.game_source_count(), 1);
    }

    #[test]
    fn status_reports_counts_and_sound_state() {
        let state = state();
        state.bump_frames_relayed();
        state.record_game_type("racer".into());
        state.record_game_type("racer".into());

        let status = state.status();
        assert_eq!(status["status"], "ok");
        assert_eq!(status["stats"]["framesRelayed"], 1);
        assert_eq!(status["stats"]["gameTypes"], json!(["racer"]));
        assert_eq!(status["soundState"]["mode"], "silent");
    }
}
