//! Data-driven game balance.
//!
//! Keep this separate from runtime configuration (timestep, substep caps).
//! All speeds are pixels per tick, accelerations pixels per tick², and
//! durations in 60 Hz ticks.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Vertical velocity clamp in px/tick (both directions)
pub const MAX_FALL_SPEED: f32 = 20.0;

/// Arena presets. Each fixes the world size, gravity, and the balance
/// variant layered on top of the defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ArenaPreset {
    /// 800×600, four platforms, the default compact layout
    #[default]
    Classic,
    /// 1400×800, more platforms, heavier gravity, faster zombies
    Sprawl,
}

impl ArenaPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            ArenaPreset::Classic => "Classic",
            ArenaPreset::Sprawl => "Sprawl",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "classic" => Some(ArenaPreset::Classic),
            "sprawl" => Some(ArenaPreset::Sprawl),
            _ => None,
        }
    }

    /// World dimensions in pixels
    pub fn size(&self) -> Vec2 {
        match self {
            ArenaPreset::Classic => Vec2::new(800.0, 600.0),
            ArenaPreset::Sprawl => Vec2::new(1400.0, 800.0),
        }
    }

    /// Downward acceleration in px/tick²
    pub fn gravity(&self) -> f32 {
        match self {
            ArenaPreset::Classic => 0.6,
            ArenaPreset::Sprawl => 0.7,
        }
    }
}

/// Gameplay tuning for the player character.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlayerTuning {
    /// Collision box width in pixels.
    pub width: f32,

    /// Standing collision height in pixels.
    pub height: f32,

    /// Crouching collision height in pixels.
    pub crouch_height: f32,

    /// Horizontal run speed in px/tick.
    pub speed: f32,

    /// Upward impulse applied per jump (negative = up).
    pub jump_impulse: f32,

    /// Starting and default maximum health.
    pub max_health: u32,

    /// Invulnerability window after taking a hit, in ticks.
    pub invuln_ticks: u32,

    /// Horizontal velocity decay per tick while grounded.
    pub friction_ground: f32,

    /// Horizontal velocity decay per tick while crouched.
    pub friction_crouch: f32,

    /// Horizontal velocity decay per tick while airborne.
    pub friction_air: f32,
}

impl Default for PlayerTuning {
    fn default() -> Self {
        Self {
            width: 30.0,
            height: 50.0,
            crouch_height: 25.0,
            speed: 5.0,
            jump_impulse: -12.0,
            max_health: 100,
            invuln_ticks: 60,
            friction_ground: 0.9,
            friction_crouch: 0.85,
            friction_air: 0.98,
        }
    }
}

/// Gameplay tuning for standard zombies.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ZombieTuning {
    /// Collision box width in pixels.
    pub width: f32,

    /// Collision box height in pixels.
    pub height: f32,

    /// Walk speed in px/tick (the horizontal target velocity).
    pub speed: f32,

    /// Smoothing factor approaching the target velocity each tick.
    pub steer_factor: f32,

    /// Starting health.
    pub health: u32,

    /// Upward impulse when hopping toward an elevated player.
    pub jump_impulse: f32,

    /// Minimum ticks between hops.
    pub jump_cooldown_ticks: u32,

    /// Center distance below which melee connects, in pixels.
    pub melee_range: f32,

    /// Damage per melee tick.
    pub melee_damage: u32,

    /// Minimum ticks between melee hits from one zombie.
    pub melee_cooldown_ticks: u32,

    /// Push applied when two zombies overlap, in px.
    pub separation_push: f32,

    /// Chance a kill drops a randomized gun.
    pub gun_drop_chance: f64,

    /// Base score for a kill, before the combo multiplier.
    pub kill_reward: u64,
}

impl Default for ZombieTuning {
    fn default() -> Self {
        Self {
            width: 30.0,
            height: 50.0,
            speed: 2.0,
            steer_factor: 0.1,
            health: 100,
            jump_impulse: -10.0,
            jump_cooldown_ticks: 120,
            melee_range: 50.0,
            melee_damage: 10,
            melee_cooldown_ticks: 30,
            separation_push: 2.0,
            gun_drop_chance: 0.3,
            kill_reward: 100,
        }
    }
}

/// Gameplay tuning for the Necromancer boss.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BossTuning {
    /// Collision box width in pixels.
    pub width: f32,

    /// Collision box height in pixels.
    pub height: f32,

    /// Maximum health.
    pub max_health: u32,

    /// Health thresholds entering phases 2, 3, and the final frenzy.
    pub phase_thresholds: [u32; 3],

    /// Base hover speed in px/tick, scaled by the phase multiplier.
    pub speed: f32,

    /// Stops chasing inside this center distance, in pixels.
    pub chase_stop_range: f32,

    /// Invulnerability window after a phase transition, in ticks.
    pub invuln_ticks: u32,

    /// Shadow bolt: contact damage.
    pub bolt_damage: u32,

    /// Shadow bolt: speed in px/tick.
    pub bolt_speed: f32,

    /// Shadow bolt: collision radius in pixels.
    pub bolt_radius: f32,

    /// Shadow bolt: base cooldown in ticks (phase-scaled).
    pub bolt_cooldown_ticks: u32,

    /// Summon burst: cooldown in ticks.
    pub summon_cooldown_ticks: u32,

    /// Summon burst: ring radius around the boss, in pixels.
    pub summon_radius: f32,

    /// Death beam: damage per connecting tick.
    pub beam_damage: u32,

    /// Death beam: active duration in ticks.
    pub beam_duration_ticks: u32,

    /// Death beam: cooldown in ticks.
    pub beam_cooldown_ticks: u32,

    /// Death beam: sweep rate in radians per tick.
    pub beam_sweep_rate: f32,

    /// Death beam: angular half-width that counts as a hit, in radians.
    pub beam_arc: f32,

    /// Teleport: cooldown in ticks.
    pub teleport_cooldown_ticks: u32,

    /// Teleport: fires only when the player is farther than this, in pixels.
    pub teleport_range: f32,

    /// Teleport: minimum distance from arena edges, in pixels.
    pub teleport_margin: f32,

    /// Base score for the kill, before the combo multiplier.
    pub kill_reward: u64,
}

impl Default for BossTuning {
    fn default() -> Self {
        Self {
            width: 80.0,
            height: 120.0,
            max_health: 1000,
            phase_thresholds: [700, 400, 100],
            speed: 2.0,
            chase_stop_range: 200.0,
            invuln_ticks: 120,
            bolt_damage: 15,
            bolt_speed: 8.0,
            bolt_radius: 8.0,
            bolt_cooldown_ticks: 60,
            summon_cooldown_ticks: 480,
            summon_radius: 100.0,
            beam_damage: 25,
            beam_duration_ticks: 120,
            beam_cooldown_ticks: 600,
            beam_sweep_rate: 0.033,
            beam_arc: 0.1,
            teleport_cooldown_ticks: 300,
            teleport_range: 500.0,
            teleport_margin: 100.0,
            kill_reward: 1000,
        }
    }
}

/// Scoring and combo tuning.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreTuning {
    /// Ticks since the last kill within which the combo keeps building.
    pub combo_window_ticks: u64,

    /// Kills per multiplier step.
    pub combo_step: u32,

    /// Multiplier bonus per step (step 5 kills = +0.1x).
    pub combo_step_bonus: f32,
}

impl Default for ScoreTuning {
    fn default() -> Self {
        Self {
            combo_window_ticks: 120,
            combo_step: 5,
            combo_step_bonus: 0.1,
        }
    }
}

/// Aggregate of all balance tables, owned by the game state.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Tuning {
    pub player: PlayerTuning,
    pub zombie: ZombieTuning,
    pub boss: BossTuning,
    pub score: ScoreTuning,
}

impl ScoreTuning {
    /// Combo multiplier for a streak length.
    pub fn multiplier(&self, combo: u32) -> f32 {
        1.0 + (combo / self.combo_step) as f32 * self.combo_step_bonus
    }

    /// A base reward scaled by the combo multiplier, rounded.
    pub fn scaled_reward(&self, base: u64, combo: u32) -> u64 {
        (base as f32 * self.multiplier(combo)).round() as u64
    }
}

impl Tuning {
    /// Balance tables for an arena preset. Sprawl runs the heavier variant:
    /// a taller player with a stronger jump, quicker zombies.
    pub fn for_preset(preset: ArenaPreset) -> Self {
        let mut tuning = Self::default();
        if preset == ArenaPreset::Sprawl {
            tuning.player.width = 40.0;
            tuning.player.height = 60.0;
            tuning.player.crouch_height = 30.0;
            tuning.player.jump_impulse = -15.0;
            tuning.zombie.speed = 3.0;
            tuning.zombie.jump_cooldown_ticks = 60;
        }
        tuning
    }
}
