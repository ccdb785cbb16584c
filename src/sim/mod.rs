//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod boss;
pub mod collision;
pub mod effects;
pub mod rect;
pub mod state;
pub mod tick;
pub mod weapons;

pub use boss::{Boss, ShadowBolt};
pub use collision::{
    apply_friction, apply_gravity, circle_rect_overlap, integrate, land_on_platforms,
    resolve_side_contact, wrap_horizontal,
};
pub use effects::{FloatingText, Particle, ParticleHue};
pub use rect::Rect;
pub use state::{
    Arena, Body, Bullet, DroppedGun, Facing, GameEvent, GamePhase, GameState, Platform, Player,
    Stance, UpgradeKind, Zombie,
};
pub use tick::{TickInput, tick};
pub use weapons::{Weapon, WeaponKind, WeaponState, WeaponStats};
