//! Weapon definitions and the firing state machine
//!
//! Stats are immutable records, snapshotted onto each bullet at fire time.
//! The runtime machine has three states (Ready / Cooldown / Reloading) driven
//! by absolute deadline ticks polled once per simulation step; nothing fires
//! between ticks.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Weapon archetypes. Behavior differences dispatch exhaustively on this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeaponKind {
    Pistol,
    Shotgun,
    Railgun,
    ForcePush,
    ShockRifle,
}

/// All archetypes, in drop-roll order
pub const ALL_WEAPON_KINDS: [WeaponKind; 5] = [
    WeaponKind::Pistol,
    WeaponKind::Shotgun,
    WeaponKind::Railgun,
    WeaponKind::ForcePush,
    WeaponKind::ShockRifle,
];

impl WeaponKind {
    pub fn name(&self) -> &'static str {
        match self {
            WeaponKind::Pistol => "Pistol",
            WeaponKind::Shotgun => "Shotgun",
            WeaponKind::Railgun => "Railgun",
            WeaponKind::ForcePush => "Force Push",
            WeaponKind::ShockRifle => "Shock Rifle",
        }
    }

    /// Bullets keep flying after a kill instead of stopping at the first hit
    pub fn piercing(&self) -> bool {
        matches!(self, WeaponKind::Railgun)
    }

    /// Hits ripple outward, damaging nearby zombies at half strength
    pub fn shockwave(&self) -> bool {
        matches!(self, WeaponKind::ShockRifle)
    }

    /// Factory-fresh stats for this archetype
    pub fn base_stats(&self) -> WeaponStats {
        match self {
            WeaponKind::Pistol => WeaponStats {
                kind: *self,
                damage: 25,
                knockback: 5.0,
                fire_rate_ticks: 15,
                reload_ticks: 60,
                magazine: 12,
                bullet_speed: 10.0,
                spread: 0.0,
                pellets: 1,
                range: 300.0,
            },
            WeaponKind::Shotgun => WeaponStats {
                kind: *self,
                damage: 15,
                knockback: 8.0,
                fire_rate_ticks: 48,
                reload_ticks: 90,
                magazine: 6,
                bullet_speed: 8.0,
                spread: 0.3,
                pellets: 5,
                range: 200.0,
            },
            WeaponKind::Railgun => WeaponStats {
                kind: *self,
                damage: 100,
                knockback: 15.0,
                fire_rate_ticks: 72,
                reload_ticks: 120,
                magazine: 3,
                bullet_speed: 20.0,
                spread: 0.0,
                pellets: 1,
                range: 700.0,
            },
            WeaponKind::ForcePush => WeaponStats {
                kind: *self,
                damage: 5,
                knockback: 25.0,
                fire_rate_ticks: 30,
                reload_ticks: 48,
                magazine: 8,
                bullet_speed: 15.0,
                spread: 0.5,
                pellets: 1,
                range: 250.0,
            },
            WeaponKind::ShockRifle => WeaponStats {
                kind: *self,
                damage: 45,
                knockback: 10.0,
                fire_rate_ticks: 36,
                reload_ticks: 72,
                magazine: 10,
                bullet_speed: 12.0,
                spread: 0.0,
                pellets: 1,
                range: 400.0,
            },
        }
    }
}

/// An immutable weapon stat record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeaponStats {
    pub kind: WeaponKind,
    /// Damage per pellet
    pub damage: u32,
    /// Positional shove applied to the victim along the bullet direction, px
    pub knockback: f32,
    /// Minimum ticks between shots
    pub fire_rate_ticks: u32,
    /// Reload duration in ticks
    pub reload_ticks: u32,
    /// Shots per magazine
    pub magazine: u32,
    /// Bullet speed in px/tick
    pub bullet_speed: f32,
    /// Full fan width in radians; pellets jitter within ±spread/2
    pub spread: f32,
    /// Bullets per shot
    pub pellets: u32,
    /// Bullet travel distance before expiring, px
    pub range: f32,
}

/// Firing machine state; deadlines are absolute tick numbers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeaponState {
    Ready,
    Cooldown { until: u64 },
    Reloading { until: u64 },
}

/// A weapon as carried by the player: stats plus live ammo and machine state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Weapon {
    pub stats: WeaponStats,
    pub ammo: u32,
    pub state: WeaponState,
}

impl Weapon {
    pub fn new(stats: WeaponStats) -> Self {
        Self {
            ammo: stats.magazine,
            stats,
            state: WeaponState::Ready,
        }
    }

    pub fn is_reloading(&self) -> bool {
        matches!(self.state, WeaponState::Reloading { .. })
    }

    /// Poll deadlines. Call once per tick, before any fire attempt.
    pub fn update(&mut self, now: u64) {
        match self.state {
            WeaponState::Cooldown { until } if now >= until => {
                self.state = WeaponState::Ready;
            }
            WeaponState::Reloading { until } if now >= until => {
                self.ammo = self.stats.magazine;
                self.state = WeaponState::Ready;
            }
            _ => {}
        }
    }

    /// Attempt to fire toward `aim_angle`.
    ///
    /// On success returns one angle per pellet (fan jitter already applied)
    /// and the machine enters Cooldown, or Reloading when the shot emptied
    /// the magazine. Attempts during Cooldown/Reloading are silent no-ops.
    pub fn try_fire<R: Rng>(&mut self, now: u64, aim_angle: f32, rng: &mut R) -> Option<Vec<f32>> {
        if self.state != WeaponState::Ready {
            return None;
        }
        if self.ammo == 0 {
            // Dry trigger pull starts the reload instead of firing
            self.state = WeaponState::Reloading {
                until: now + self.stats.reload_ticks as u64,
            };
            return None;
        }

        self.ammo -= 1;

        let half = self.stats.spread / 2.0;
        let angles = (0..self.stats.pellets)
            .map(|_| {
                if half > 0.0 {
                    aim_angle + rng.random_range(-half..=half)
                } else {
                    aim_angle
                }
            })
            .collect();

        self.state = if self.ammo == 0 {
            WeaponState::Reloading {
                until: now + self.stats.reload_ticks as u64,
            }
        } else {
            WeaponState::Cooldown {
                until: now + self.stats.fire_rate_ticks as u64,
            }
        };

        Some(angles)
    }

    /// Start a manual reload unless one is running or the magazine is full
    pub fn start_reload(&mut self, now: u64) -> bool {
        if self.is_reloading() || self.ammo == self.stats.magazine {
            return false;
        }
        self.state = WeaponState::Reloading {
            until: now + self.stats.reload_ticks as u64,
        };
        true
    }
}

/// Randomize a base record for a dropped gun.
///
/// Damage, fire rate, and magazine roll ±20%; range rolls ±10%. Floors keep
/// every roll usable.
pub fn randomize_stats<R: Rng>(base: WeaponStats, rng: &mut R) -> WeaponStats {
    let spin = |rng: &mut R, swing: f32| 1.0 + rng.random_range(-swing..=swing);

    WeaponStats {
        damage: ((base.damage as f32 * spin(rng, 0.2)).round() as u32).max(1),
        fire_rate_ticks: ((base.fire_rate_ticks as f32 * spin(rng, 0.2)).round() as u32).max(3),
        magazine: ((base.magazine as f32 * spin(rng, 0.2)).round() as u32).max(1),
        range: base.range * spin(rng, 0.1),
        ..base
    }
}

/// Roll a fully random dropped gun: uniform archetype, randomized stats
pub fn random_drop<R: Rng>(rng: &mut R) -> WeaponStats {
    let kind = ALL_WEAPON_KINDS[rng.random_range(0..ALL_WEAPON_KINDS.len())];
    randomize_stats(kind.base_stats(), rng)
}
