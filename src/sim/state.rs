//! Game state and core simulation types
//!
//! Everything that must be persisted for Continue/determinism lives here.
//! Decorative pools (particles, floating text) and the per-frame event queue
//! are skipped by serde; a reloaded run replays identically without them.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::boss::{Boss, ShadowBolt};
use super::effects::{FloatingText, Particle};
use super::rect::Rect;
use super::weapons::{Weapon, WeaponKind, WeaponStats};
use crate::tuning::{ArenaPreset, PlayerTuning, Tuning};

/// Current phase of gameplay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Level cleared; the loop idles until an upgrade is chosen
    UpgradeMenu,
    /// Game is paused
    Paused,
    /// Run ended; only restart input is honored
    GameOver,
}

/// Standing or crouched; the collision height derives from this
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Stance {
    #[default]
    Standing,
    Crouching,
}

/// Horizontal direction the player last moved in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    /// Unit x direction
    #[inline]
    pub fn dir(&self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

/// Between-level upgrade choices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpgradeKind {
    MaxHealth,
    Speed,
    Jump,
    Damage,
    FireRate,
    ExtraJump,
}

/// The full pool upgrades are drawn from
pub const ALL_UPGRADES: [UpgradeKind; 6] = [
    UpgradeKind::MaxHealth,
    UpgradeKind::Speed,
    UpgradeKind::Jump,
    UpgradeKind::Damage,
    UpgradeKind::FireRate,
    UpgradeKind::ExtraJump,
];

impl UpgradeKind {
    pub fn name(&self) -> &'static str {
        match self {
            UpgradeKind::MaxHealth => "Max Health +25",
            UpgradeKind::Speed => "Move Speed +20%",
            UpgradeKind::Jump => "Jump Power +15%",
            UpgradeKind::Damage => "Damage +25%",
            UpgradeKind::FireRate => "Fire Rate +25%",
            UpgradeKind::ExtraJump => "Extra Jump",
        }
    }
}

/// Things that happened during a tick, drained by the front-end for
/// HUD/audio/profile bookkeeping. Never read back by the simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    ShotFired { kind: WeaponKind },
    ReloadStarted,
    PlayerJumped,
    PlayerDamaged { amount: u32 },
    PlayerDied,
    ZombieKilled { pos: Vec2, combo: u32 },
    WeaponPickedUp { kind: WeaponKind },
    BossSpawned,
    BossPhaseChanged { phase: u8 },
    BossKilled,
    LevelStarted { level: u32 },
    LevelCleared { level: u32 },
    UpgradeChosen { kind: UpgradeKind },
    GameOver { score: u64 },
}

/// Pending events are capped so an undrained queue cannot grow unbounded
pub const MAX_PENDING_EVENTS: usize = 1024;

/// Shared movement state: top-left position, velocity, standing box size
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: Vec2,
}

impl Body {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            size,
        }
    }

    /// Full collision box
    pub fn rect(&self) -> Rect {
        Rect {
            pos: self.pos,
            size: self.size,
        }
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }
}

/// The player character
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub body: Body,
    pub health: u32,
    pub max_health: u32,
    pub stance: Stance,
    pub facing: Facing,
    pub grounded: bool,
    pub jumps_used: u32,
    pub max_jumps: u32,
    /// Invulnerability deadline after taking a hit (absolute tick)
    pub invulnerable_until: u64,
    pub weapon: Weapon,
    /// Crouched collision height (standing height is the body size)
    pub crouch_height: f32,
    // Upgrade multipliers, applied to tuning/gun values at use sites
    pub speed_mult: f32,
    pub jump_mult: f32,
    pub damage_mult: f32,
    pub fire_rate_mult: f32,
}

impl Player {
    pub fn new(tuning: &PlayerTuning, spawn: Vec2) -> Self {
        let mut player = Self {
            body: Body::new(spawn, Vec2::new(tuning.width, tuning.height)),
            health: tuning.max_health,
            max_health: tuning.max_health,
            stance: Stance::Standing,
            facing: Facing::Right,
            grounded: false,
            jumps_used: 0,
            max_jumps: 1,
            invulnerable_until: 0,
            weapon: Weapon::new(WeaponKind::Pistol.base_stats()),
            crouch_height: tuning.crouch_height,
            speed_mult: 1.0,
            jump_mult: 1.0,
            damage_mult: 1.0,
            fire_rate_mult: 1.0,
        };
        player.equip(WeaponKind::Pistol.base_stats());
        player
    }

    pub fn is_invincible(&self, now: u64) -> bool {
        now < self.invulnerable_until
    }

    /// Collision height for the current stance
    pub fn current_height(&self) -> f32 {
        match self.stance {
            Stance::Standing => self.body.size.y,
            Stance::Crouching => self.crouch_height,
        }
    }

    /// Collision box; crouching shrinks it from the top, feet stay planted
    pub fn hitbox(&self) -> Rect {
        let h = self.current_height();
        Rect::new(
            self.body.pos.x,
            self.body.pos.y + self.body.size.y - h,
            self.body.size.x,
            h,
        )
    }

    /// Swap in a weapon, folding the player's upgrade multipliers into the
    /// stat record. Ammo comes full.
    pub fn equip(&mut self, stats: WeaponStats) {
        let adjusted = WeaponStats {
            damage: ((stats.damage as f32 * self.damage_mult).ceil() as u32).max(1),
            fire_rate_ticks: ((stats.fire_rate_ticks as f32 * self.fire_rate_mult).round() as u32)
                .max(3),
            ..stats
        };
        self.weapon = Weapon::new(adjusted);
    }
}

/// A standard zombie
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zombie {
    pub id: u32,
    pub body: Body,
    pub health: u32,
    pub grounded: bool,
    /// Next tick this zombie may melee (absolute)
    pub melee_ready_at: u64,
    /// Next tick this zombie may hop (absolute)
    pub jump_ready_at: u64,
}

impl Zombie {
    pub fn rect(&self) -> Rect {
        self.body.rect()
    }
}

/// Rendered bullet width/height in px (square hit box around the tip)
pub const BULLET_SIZE: f32 = 5.0;

/// A player bullet carrying a snapshot of the firing weapon
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Bullet {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub kind: WeaponKind,
    pub damage: u32,
    pub knockback: f32,
    /// Travel budget in px; expires past this
    pub range: f32,
    /// Distance covered so far
    pub traveled: f32,
}

impl Bullet {
    pub fn rect(&self) -> Rect {
        Rect::new(
            self.pos.x - BULLET_SIZE / 2.0,
            self.pos.y - BULLET_SIZE / 2.0,
            BULLET_SIZE,
            BULLET_SIZE,
        )
    }
}

/// An immutable level platform
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Platform {
    pub rect: Rect,
}

/// Dropped-gun pickup box size
pub const DROPPED_GUN_SIZE: Vec2 = Vec2::new(24.0, 12.0);

/// A gun lying in the world, waiting for pickup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DroppedGun {
    pub id: u32,
    pub body: Body,
    pub stats: WeaponStats,
}

/// Arena data derived from the preset at run start
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Arena {
    pub preset: ArenaPreset,
    pub size: Vec2,
    pub gravity: f32,
}

impl Arena {
    pub fn new(preset: ArenaPreset) -> Self {
        Self {
            preset,
            size: preset.size(),
            gravity: preset.gravity(),
        }
    }
}

/// Platform layout for a preset (ground first)
pub fn platform_layout(preset: ArenaPreset) -> Vec<Platform> {
    let rects = match preset {
        ArenaPreset::Classic => vec![
            Rect::new(0.0, 550.0, 800.0, 50.0),
            Rect::new(200.0, 450.0, 400.0, 20.0),
            Rect::new(50.0, 350.0, 100.0, 20.0),
            Rect::new(650.0, 350.0, 100.0, 20.0),
        ],
        ArenaPreset::Sprawl => vec![
            Rect::new(0.0, 750.0, 1400.0, 50.0),
            Rect::new(80.0, 620.0, 220.0, 20.0),
            Rect::new(560.0, 640.0, 280.0, 20.0),
            Rect::new(1100.0, 620.0, 220.0, 20.0),
            Rect::new(300.0, 500.0, 200.0, 20.0),
            Rect::new(880.0, 500.0, 200.0, 20.0),
            Rect::new(80.0, 380.0, 180.0, 20.0),
            Rect::new(600.0, 360.0, 220.0, 20.0),
            Rect::new(1140.0, 380.0, 180.0, 20.0),
        ],
    };
    rects.into_iter().map(|rect| Platform { rect }).collect()
}

/// Zombie entry points for a preset (top-left spawn positions)
pub fn spawn_points(preset: ArenaPreset) -> Vec<Vec2> {
    match preset {
        ArenaPreset::Classic => vec![Vec2::new(10.0, 500.0), Vec2::new(760.0, 500.0)],
        ArenaPreset::Sprawl => vec![
            Vec2::new(100.0, 700.0),
            Vec2::new(400.0, 700.0),
            Vec2::new(700.0, 700.0),
            Vec2::new(1000.0, 700.0),
            Vec2::new(1300.0, 700.0),
        ],
    }
}

/// Where the player starts a run
pub fn player_spawn(preset: ArenaPreset) -> Vec2 {
    match preset {
        ArenaPreset::Classic => Vec2::new(385.0, 300.0),
        ArenaPreset::Sprawl => Vec2::new(680.0, 400.0),
    }
}

/// Complete game state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Seeded generator; serialized so saves resume the exact stream
    pub rng: Pcg32,
    pub arena: Arena,
    pub tuning: Tuning,
    pub phase: GamePhase,
    /// Current level (1-based)
    pub level: u32,
    pub score: u64,
    pub kills: u32,
    /// Kill streak; zero once the window lapses
    pub combo: u32,
    pub last_kill_tick: u64,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub player: Player,
    /// Active zombies (sorted by id for determinism)
    pub zombies: Vec<Zombie>,
    /// Player bullets (sorted by id)
    pub bullets: Vec<Bullet>,
    /// Boss projectiles (sorted by id)
    pub bolts: Vec<ShadowBolt>,
    pub platforms: Vec<Platform>,
    /// Guns on the ground (sorted by id)
    pub dropped_guns: Vec<DroppedGun>,
    pub boss: Option<Boss>,
    /// Offers shown while in the upgrade menu (empty otherwise)
    pub upgrade_offers: Vec<UpgradeKind>,
    /// Render shake magnitude, decays each tick
    pub screen_shake: f32,
    /// Visual particles (not gameplay-affecting)
    #[serde(skip)]
    pub particles: Vec<Particle>,
    /// Floating damage numbers
    #[serde(skip)]
    pub texts: Vec<FloatingText>,
    /// Events since the last drain
    #[serde(skip)]
    pub events: Vec<GameEvent>,
    /// Next entity ID
    next_id: u32,
}

impl GameState {
    /// Create a new run with the given seed and arena, level 1 populated
    pub fn new(seed: u64, preset: ArenaPreset) -> Self {
        let tuning = Tuning::for_preset(preset);
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            arena: Arena::new(preset),
            tuning,
            phase: GamePhase::Playing,
            level: 1,
            score: 0,
            kills: 0,
            combo: 0,
            last_kill_tick: 0,
            time_ticks: 0,
            player: Player::new(&tuning.player, player_spawn(preset)),
            zombies: Vec::new(),
            bullets: Vec::new(),
            bolts: Vec::new(),
            platforms: platform_layout(preset),
            dropped_guns: Vec::new(),
            boss: None,
            upgrade_offers: Vec::new(),
            screen_shake: 0.0,
            particles: Vec::new(),
            texts: Vec::new(),
            events: Vec::new(),
            next_id: 1,
        };
        state.spawn_level();
        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Queue an event for the front-end; oldest dropped past the cap
    pub fn push_event(&mut self, event: GameEvent) {
        if self.events.len() >= MAX_PENDING_EVENTS {
            self.events.remove(0);
        }
        self.events.push(event);
    }

    /// Hand all pending events to the front-end
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Spawn a zombie at a top-left position
    pub fn spawn_zombie(&mut self, pos: Vec2) {
        let id = self.next_entity_id();
        let tuning = self.tuning.zombie;
        self.zombies.push(Zombie {
            id,
            body: Body::new(pos, Vec2::new(tuning.width, tuning.height)),
            health: tuning.health,
            grounded: false,
            melee_ready_at: 0,
            jump_ready_at: 0,
        });
    }

    /// Drop a gun into the world at a position (it falls until it lands)
    pub fn spawn_dropped_gun(&mut self, pos: Vec2, stats: WeaponStats) {
        let id = self.next_entity_id();
        self.dropped_guns.push(DroppedGun {
            id,
            body: Body::new(pos, DROPPED_GUN_SIZE),
            stats,
        });
    }

    /// Populate the current level: a Necromancer every fourth level,
    /// otherwise a wave of zombies across the spawn points.
    pub fn spawn_level(&mut self) {
        if self.level % 4 == 0 {
            let tuning = self.tuning.boss;
            let pos = Vec2::new((self.arena.size.x - tuning.width) / 2.0, 100.0);
            self.boss = Some(Boss::new(&tuning, pos, self.time_ticks));
            self.push_event(GameEvent::BossSpawned);
            log::info!("Level {}: the Necromancer rises", self.level);
        } else {
            let count = (3 + 2 * self.level).min(12) as usize;
            let points = spawn_points(self.arena.preset);
            let max_x = self.arena.size.x - self.tuning.zombie.width;
            for i in 0..count {
                let base = points[i % points.len()];
                let jitter = self.rng.random_range(-100.0..=100.0);
                let x = (base.x + jitter).clamp(0.0, max_x);
                self.spawn_zombie(Vec2::new(x, base.y));
            }
            log::info!("Level {}: {} zombies inbound", self.level, count);
        }
        self.push_event(GameEvent::LevelStarted { level: self.level });
    }

    /// Record a kill: advances the combo streak within the window, resets it
    /// otherwise, and banks the scaled reward. Returns the points awarded.
    pub fn register_kill(&mut self, base_reward: u64) -> u64 {
        let window = self.tuning.score.combo_window_ticks;
        let within = self.time_ticks.saturating_sub(self.last_kill_tick) <= window;
        self.combo = if within && self.combo > 0 {
            self.combo + 1
        } else {
            1
        };
        self.last_kill_tick = self.time_ticks;
        self.kills += 1;
        let awarded = self.tuning.score.scaled_reward(base_reward, self.combo);
        self.score += awarded;
        awarded
    }

    /// Apply damage to the player, honoring the invulnerability window
    pub fn damage_player(&mut self, amount: u32) {
        if amount == 0 || self.player.is_invincible(self.time_ticks) {
            return;
        }
        self.player.health = self.player.health.saturating_sub(amount);
        self.player.invulnerable_until = self.time_ticks + self.tuning.player.invuln_ticks as u64;
        self.screen_shake = (self.screen_shake + amount as f32 * 0.5).min(10.0);
        self.push_event(GameEvent::PlayerDamaged { amount });
    }

    /// Ensure collections are sorted by ID for deterministic iteration
    pub fn normalize_order(&mut self) {
        self.zombies.sort_by_key(|z| z.id);
        self.bullets.sort_by_key(|b| b.id);
        self.bolts.sort_by_key(|b| b.id);
        self.dropped_guns.sort_by_key(|g| g.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_populates_level_one() {
        let state = GameState::new(42, ArenaPreset::Classic);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.level, 1);
        // Level 1: 3 + 2*1 = 5 zombies, no boss
        assert_eq!(state.zombies.len(), 5);
        assert!(state.boss.is_none());
        assert_eq!(state.player.health, 100);
        assert_eq!(state.player.weapon.ammo, 12);
    }

    #[test]
    fn test_boss_level_cadence() {
        let mut state = GameState::new(7, ArenaPreset::Classic);
        state.zombies.clear();
        state.level = 4;
        state.spawn_level();
        assert!(state.boss.is_some());
        assert!(state.zombies.is_empty());
    }

    #[test]
    fn test_entity_ids_monotonic() {
        let mut state = GameState::new(1, ArenaPreset::Classic);
        let a = state.next_entity_id();
        let b = state.next_entity_id();
        assert!(b > a);
    }

    #[test]
    fn test_register_kill_combo() {
        let mut state = GameState::new(9, ArenaPreset::Classic);

        // First kill: streak starts at 1, flat reward
        assert_eq!(state.register_kill(100), 100);
        assert_eq!(state.combo, 1);

        // Rapid kills build the streak; the fifth crosses the 1.1x step
        state.time_ticks += 10;
        for _ in 0..3 {
            state.register_kill(100);
        }
        assert_eq!(state.combo, 4);
        assert_eq!(state.register_kill(100), 110);
        assert_eq!(state.combo, 5);

        // Outside the window the streak restarts
        state.time_ticks += 500;
        assert_eq!(state.register_kill(100), 100);
        assert_eq!(state.combo, 1);
        assert_eq!(state.kills, 6);
    }

    #[test]
    fn test_damage_player_invuln_window() {
        let mut state = GameState::new(3, ArenaPreset::Classic);
        state.time_ticks = 100;
        state.damage_player(10);
        assert_eq!(state.player.health, 90);

        // Second hit inside the window is ignored
        state.time_ticks = 110;
        state.damage_player(10);
        assert_eq!(state.player.health, 90);

        // After the window lapses damage lands again
        state.time_ticks = 100 + 60;
        state.damage_player(10);
        assert_eq!(state.player.health, 80);
    }

    #[test]
    fn test_health_never_negative() {
        let mut state = GameState::new(3, ArenaPreset::Classic);
        state.damage_player(10_000);
        assert_eq!(state.player.health, 0);
    }

    #[test]
    fn test_crouch_keeps_feet_planted() {
        let mut state = GameState::new(3, ArenaPreset::Classic);
        let standing = state.player.hitbox();
        state.player.stance = Stance::Crouching;
        let crouched = state.player.hitbox();
        assert_eq!(standing.bottom(), crouched.bottom());
        assert!(crouched.size.y < standing.size.y);
        // The stored body is untouched
        assert_eq!(state.player.body.size.y, 50.0);
    }

    #[test]
    fn test_equip_applies_upgrade_multipliers() {
        let mut state = GameState::new(3, ArenaPreset::Classic);
        state.player.damage_mult = 1.25;
        state.player.equip(WeaponKind::Pistol.base_stats());
        // ceil(25 * 1.25) = 32
        assert_eq!(state.player.weapon.stats.damage, 32);
    }
}
