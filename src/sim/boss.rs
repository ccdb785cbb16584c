//! The Necromancer boss and its projectiles
//!
//! The boss flies (no gravity), hovers toward the player, and runs three
//! escalating phases off health thresholds. Attacks are independent deadline
//! timers; a phase transition grants a short invulnerability window and makes
//! every attack ready immediately, so a burst of damage cannot skip a phase's
//! opening ceremony.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::state::{Arena, Body};
use crate::tuning::BossTuning;

/// Per-phase movement speed multiplier
const MOVE_MULT: [f32; 3] = [0.5, 0.8, 1.2];
/// Per-phase shadow bolt cooldown multiplier
const BOLT_CD_MULT: [f32; 3] = [1.0, 0.7, 0.5];
/// Per-phase summon burst size
const SUMMON_COUNT: [u32; 3] = [2, 3, 4];

/// Boss state. Lives in `GameState::boss`; at most one per level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boss {
    pub body: Body,
    pub health: u32,
    /// Current phase, 1..=3; never decreases
    pub phase: u8,
    pub invulnerable_until: u64,
    pub bolt_ready_at: u64,
    pub summon_ready_at: u64,
    pub beam_ready_at: u64,
    /// End tick of the active beam sweep; 0 while idle
    pub beam_active_until: u64,
    /// Current sweep angle in radians
    pub beam_angle: f32,
    pub teleport_ready_at: u64,
}

/// A homing-at-launch shadow projectile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShadowBolt {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub damage: u32,
}

/// Side effects of one boss update, applied by the caller
#[derive(Debug, Default)]
pub struct BossActions {
    /// Bolts to spawn as (position, velocity)
    pub bolts: Vec<(Vec2, Vec2)>,
    /// Zombie spawn positions from a summon burst
    pub summons: Vec<Vec2>,
    /// Set when the boss teleported this tick (old center, for effects)
    pub teleported_from: Option<Vec2>,
    /// The beam swept over the player this tick
    pub beam_hit: bool,
    /// Entered a new phase this tick
    pub phase_changed: Option<u8>,
}

/// Phase for a health value: 1 above the first threshold, then 2 and 3
fn phase_for(health: u32, thresholds: &[u32; 3]) -> u8 {
    if health <= thresholds[1] {
        3
    } else if health <= thresholds[0] {
        2
    } else {
        1
    }
}

impl Boss {
    pub fn new(tuning: &BossTuning, pos: Vec2, now: u64) -> Self {
        Self {
            body: Body::new(pos, Vec2::new(tuning.width, tuning.height)),
            health: tuning.max_health,
            phase: 1,
            invulnerable_until: 0,
            // First use of each attack waits one full cooldown
            bolt_ready_at: now + tuning.bolt_cooldown_ticks as u64,
            summon_ready_at: now + tuning.summon_cooldown_ticks as u64,
            beam_ready_at: now + tuning.beam_cooldown_ticks as u64,
            beam_active_until: 0,
            beam_angle: 0.0,
            teleport_ready_at: now + tuning.teleport_cooldown_ticks as u64,
        }
    }

    pub fn is_invulnerable(&self, now: u64) -> bool {
        now < self.invulnerable_until
    }

    /// Below the last threshold the beam sweeps half again as fast
    pub fn frenzied(&self, tuning: &BossTuning) -> bool {
        self.health <= tuning.phase_thresholds[2]
    }

    pub fn beam_active(&self, now: u64) -> bool {
        now < self.beam_active_until
    }

    /// Apply damage unless shielded by a transition window.
    /// Returns true when this hit was lethal.
    pub fn take_damage(&mut self, amount: u32, now: u64) -> bool {
        if self.is_invulnerable(now) {
            return false;
        }
        self.health = self.health.saturating_sub(amount);
        self.health == 0
    }
}

/// Advance the boss one tick. Pure with respect to the rest of the game:
/// everything it wants to do to the world comes back in [`BossActions`].
pub fn update_boss(
    boss: &mut Boss,
    tuning: &BossTuning,
    arena: &Arena,
    player_center: Vec2,
    rng: &mut Pcg32,
    now: u64,
) -> BossActions {
    let mut actions = BossActions::default();

    // Phase transitions are monotonic; each one shields the boss and makes
    // every attack ready at once.
    let target = phase_for(boss.health, &tuning.phase_thresholds).max(boss.phase);
    if target != boss.phase {
        boss.phase = target;
        boss.invulnerable_until = now + tuning.invuln_ticks as u64;
        boss.bolt_ready_at = now;
        boss.summon_ready_at = now;
        boss.beam_ready_at = now;
        boss.teleport_ready_at = now;
        actions.phase_changed = Some(target);
        log::info!("necromancer entering phase {}", target);
    }
    let row = (boss.phase - 1) as usize;

    // Hover toward the player, holding off outside the stop range
    let center = boss.body.center();
    let to_player = player_center - center;
    let distance = to_player.length();
    if distance > tuning.chase_stop_range {
        boss.body.vel = to_player / distance * tuning.speed * MOVE_MULT[row];
    } else {
        boss.body.vel = Vec2::ZERO;
    }
    boss.body.pos += boss.body.vel;
    boss.body.pos = boss.body.pos.clamp(Vec2::ZERO, arena.size - boss.body.size);

    // Teleport closer when the player kites too far away
    if now >= boss.teleport_ready_at && distance > tuning.teleport_range {
        let margin = tuning.teleport_margin;
        actions.teleported_from = Some(boss.body.center());
        boss.body.pos.x = rng.random_range(margin..=arena.size.x - boss.body.size.x - margin);
        boss.body.pos.y = rng.random_range(margin..=arena.size.y - boss.body.size.y - margin);
        boss.teleport_ready_at = now + tuning.teleport_cooldown_ticks as u64;
    }

    // Shadow bolt, phase-scaled cooldown
    if now >= boss.bolt_ready_at {
        let dir = (player_center - boss.body.center()).normalize_or_zero();
        if dir != Vec2::ZERO {
            actions
                .bolts
                .push((boss.body.center(), dir * tuning.bolt_speed));
            let cooldown = (tuning.bolt_cooldown_ticks as f32 * BOLT_CD_MULT[row]) as u64;
            boss.bolt_ready_at = now + cooldown.max(1);
        }
    }

    // Summon burst: a ring of zombies around the boss
    if now >= boss.summon_ready_at {
        let count = SUMMON_COUNT[row];
        let center = boss.body.center();
        for i in 0..count {
            let angle = std::f32::consts::TAU * i as f32 / count as f32;
            let pos = center + Vec2::new(angle.cos(), angle.sin()) * tuning.summon_radius;
            actions.summons.push(pos);
        }
        boss.summon_ready_at = now + tuning.summon_cooldown_ticks as u64;
    }

    // Death beam, unlocked from phase 2
    if boss.phase >= 2 {
        if boss.beam_active(now) {
            let rate = if boss.frenzied(tuning) { 1.5 } else { 1.0 };
            boss.beam_angle += tuning.beam_sweep_rate * rate;
            let to_player = player_center - boss.body.center();
            let player_angle = to_player.y.atan2(to_player.x);
            let diff = (player_angle - boss.beam_angle).rem_euclid(std::f32::consts::TAU);
            let diff = diff.min(std::f32::consts::TAU - diff);
            if diff < tuning.beam_arc {
                actions.beam_hit = true;
            }
        } else if boss.beam_active_until != 0 {
            // Sweep just finished; start the cooldown from here
            boss.beam_active_until = 0;
            boss.beam_ready_at = now + tuning.beam_cooldown_ticks as u64;
        } else if now >= boss.beam_ready_at {
            boss.beam_active_until = now + tuning.beam_duration_ticks as u64;
            boss.beam_angle = 0.0;
        }
    }

    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuning::ArenaPreset;
    use rand::SeedableRng;

    fn setup() -> (Boss, BossTuning, Arena, Pcg32) {
        let tuning = BossTuning::default();
        let arena = Arena::new(ArenaPreset::Classic);
        let boss = Boss::new(&tuning, Vec2::new(360.0, 100.0), 0);
        (boss, tuning, arena, Pcg32::seed_from_u64(5))
    }

    #[test]
    fn test_phase_mapping() {
        let t = [700, 400, 100];
        assert_eq!(phase_for(1000, &t), 1);
        assert_eq!(phase_for(701, &t), 1);
        assert_eq!(phase_for(700, &t), 2);
        assert_eq!(phase_for(401, &t), 2);
        assert_eq!(phase_for(400, &t), 3);
        assert_eq!(phase_for(1, &t), 3);
    }

    #[test]
    fn test_transition_grants_invulnerability_and_resets_attacks() {
        let (mut boss, tuning, arena, mut rng) = setup();
        boss.health = 650;
        let actions = update_boss(&mut boss, &tuning, &arena, Vec2::new(400.0, 500.0), &mut rng, 10);

        assert_eq!(actions.phase_changed, Some(2));
        assert_eq!(boss.phase, 2);
        assert!(boss.is_invulnerable(10));
        assert!(boss.is_invulnerable(10 + 119));
        assert!(!boss.is_invulnerable(10 + 120));
        // Attack deadlines were pulled forward, so the bolt fired this tick
        assert_eq!(actions.bolts.len(), 1);
    }

    #[test]
    fn test_phase_never_regresses() {
        let (mut boss, tuning, arena, mut rng) = setup();
        boss.health = 300;
        update_boss(&mut boss, &tuning, &arena, Vec2::new(400.0, 500.0), &mut rng, 0);
        assert_eq!(boss.phase, 3);

        // Health cannot rise in play, but the guard must hold regardless
        boss.health = 1000;
        let actions = update_boss(&mut boss, &tuning, &arena, Vec2::new(400.0, 500.0), &mut rng, 1);
        assert_eq!(boss.phase, 3);
        assert_eq!(actions.phase_changed, None);
    }

    #[test]
    fn test_invulnerable_boss_ignores_damage() {
        let (mut boss, tuning, _, _) = setup();
        boss.invulnerable_until = 100;
        assert!(!boss.take_damage(500, 50));
        assert_eq!(boss.health, tuning.max_health);

        assert!(!boss.take_damage(500, 100));
        assert_eq!(boss.health, 500);
    }

    #[test]
    fn test_lethal_hit_reports_death() {
        let (mut boss, _, _, _) = setup();
        boss.health = 40;
        assert!(boss.take_damage(60, 0));
        assert_eq!(boss.health, 0);
    }

    #[test]
    fn test_chase_stops_inside_hold_range() {
        let (mut boss, tuning, arena, mut rng) = setup();
        let near = boss.body.center() + Vec2::new(150.0, 0.0);
        update_boss(&mut boss, &tuning, &arena, near, &mut rng, 0);
        assert_eq!(boss.body.vel, Vec2::ZERO);

        let far = boss.body.center() + Vec2::new(300.0, 0.0);
        update_boss(&mut boss, &tuning, &arena, far, &mut rng, 1);
        assert!(boss.body.vel.x > 0.0);
    }

    #[test]
    fn test_beam_hits_only_near_sweep_angle() {
        let (mut boss, tuning, arena, mut rng) = setup();
        boss.health = 500; // phase 2
        boss.beam_active_until = 1000;
        boss.beam_angle = 0.0;

        // Player to the right of the boss, right on the sweep line
        let player = boss.body.center() + Vec2::new(200.0, 0.0);
        let actions = update_boss(&mut boss, &tuning, &arena, player, &mut rng, 500);
        assert!(actions.beam_hit);

        // Opposite side of the arc
        boss.beam_angle = std::f32::consts::PI;
        let actions = update_boss(&mut boss, &tuning, &arena, player, &mut rng, 501);
        assert!(!actions.beam_hit);
    }

    #[test]
    fn test_beam_cooldown_starts_after_sweep_ends() {
        let (mut boss, tuning, arena, mut rng) = setup();
        boss.health = 500;
        boss.beam_active_until = 100;

        let player = boss.body.center() + Vec2::new(200.0, 0.0);
        update_boss(&mut boss, &tuning, &arena, player, &mut rng, 100);
        assert_eq!(boss.beam_active_until, 0);
        assert_eq!(boss.beam_ready_at, 100 + tuning.beam_cooldown_ticks as u64);
    }

    #[test]
    fn test_teleport_fires_only_when_player_is_far() {
        let (mut boss, tuning, arena, mut rng) = setup();
        boss.teleport_ready_at = 0;
        let start = boss.body.pos;

        // Close player: no teleport
        let near = boss.body.center() + Vec2::new(100.0, 0.0);
        let actions = update_boss(&mut boss, &tuning, &arena, near, &mut rng, 0);
        assert!(actions.teleported_from.is_none());

        // Reset and kite far away
        boss.body.pos = start;
        boss.body.vel = Vec2::ZERO;
        let far = Vec2::new(boss.body.center().x + 600.0, 550.0);
        let actions = update_boss(&mut boss, &tuning, &arena, far, &mut rng, 1);
        assert!(actions.teleported_from.is_some());
        let margin = tuning.teleport_margin;
        assert!(boss.body.pos.x >= margin);
        assert!(boss.body.pos.x <= arena.size.x - boss.body.size.x - margin);
    }
}
