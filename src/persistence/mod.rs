//! Save/load persistence
//!
//! A run is saved as a versioned JSON envelope around the full [`GameState`]
//! (seed and RNG stream included), so a loaded game continues tick-exact.
//! Loads are corruption-tolerant: anything that fails to parse, or carries
//! an unknown version, is logged and treated as "no save".

use serde::{Deserialize, Serialize};

use crate::platform::KvStore;
use crate::sim::GameState;

/// Bump when the envelope layout changes
pub const SAVE_VERSION: u32 = 1;

/// Storage key for the current run
const SAVE_KEY: &str = "save";

/// Versioned wrapper around a serialized run
#[derive(Debug, Serialize, Deserialize)]
pub struct SaveEnvelope {
    pub version: u32,
    pub state: GameState,
}

/// Persist the current run. A failed write is logged by the store and
/// otherwise ignored.
pub fn save_game(store: &mut dyn KvStore, state: &GameState) -> bool {
    let envelope = SaveEnvelope {
        version: SAVE_VERSION,
        state: state.clone(),
    };
    match serde_json::to_string(&envelope) {
        Ok(json) => {
            let ok = store.set(SAVE_KEY, &json);
            if ok {
                log::info!(
                    "saved run: level {}, score {}",
                    state.level,
                    state.score
                );
            }
            ok
        }
        Err(err) => {
            log::warn!("failed to serialize save: {err}");
            false
        }
    }
}

/// Load the saved run, if a readable one exists
pub fn load_game(store: &dyn KvStore) -> Option<GameState> {
    let json = store.get(SAVE_KEY)?;
    match serde_json::from_str::<SaveEnvelope>(&json) {
        Ok(envelope) if envelope.version == SAVE_VERSION => {
            log::info!(
                "loaded run: level {}, score {}",
                envelope.state.level,
                envelope.state.score
            );
            Some(envelope.state)
        }
        Ok(envelope) => {
            log::warn!("unknown save version {}, ignoring", envelope.version);
            None
        }
        Err(err) => {
            log::warn!("corrupt save, ignoring: {err}");
            None
        }
    }
}

/// Drop the saved run (after game over or a finished continue)
pub fn clear_save(store: &mut dyn KvStore) {
    store.remove(SAVE_KEY);
}
