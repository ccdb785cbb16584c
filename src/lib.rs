//! Horde Holdout - a wrap-around platformer zombie shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (physics, combat, game state)
//! - `tuning`: Data-driven game balance
//! - `platform`: Key-value storage abstraction
//! - `persistence`: Versioned save/load envelope
//! - `audio`: Named sound cues for the front-end

pub mod audio;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod profile;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use highscores::HighScores;
pub use settings::Settings;
pub use tuning::ArenaPreset;

use glam::Vec2;

/// Game loop constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz; all tuning values are per-tick)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Simulation tick rate in Hz
    pub const TICK_RATE: u32 = 60;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
}

/// Coerce a possibly-poisoned float to a finite value.
///
/// NaN and ±∞ become `fallback`. Upstream bugs must not leak non-finite
/// numbers into shared state, so every integration step funnels through this.
#[inline]
pub fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

/// Component-wise finite coercion for vectors
#[inline]
pub fn finite_vec(v: Vec2, fallback: Vec2) -> Vec2 {
    Vec2::new(finite_or(v.x, fallback.x), finite_or(v.y, fallback.y))
}

/// Exponential smoothing toward a target (factor is per-tick)
#[inline]
pub fn approach(current: f32, target: f32, factor: f32) -> f32 {
    current + (target - current) * factor
}
