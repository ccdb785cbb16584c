use glam::Vec2;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use horde_holdout::persistence::{load_game, save_game};
use horde_holdout::platform::MemStore;
use horde_holdout::sim::weapons::random_drop;
use horde_holdout::sim::{Bullet, GameEvent, GamePhase, GameState, TickInput, WeaponKind, tick};
use horde_holdout::tuning::{ArenaPreset, MAX_FALL_SPEED, ScoreTuning};
use horde_holdout::{finite_or, finite_vec, sim::effects};

fn fresh(seed: u64) -> GameState {
    GameState::new(seed, ArenaPreset::Classic)
}

fn idle() -> TickInput {
    TickInput::default()
}

/// A stationary bullet parked at `pos`, waiting for something to stand in it
fn plant_bullet(state: &mut GameState, pos: Vec2, damage: u32) {
    plant_round(state, pos, WeaponKind::Pistol, damage, 0.0);
}

/// `plant_bullet` with the weapon kind and knockback under test control
fn plant_round(state: &mut GameState, pos: Vec2, kind: WeaponKind, damage: u32, knockback: f32) {
    let id = state.next_entity_id();
    state.bullets.push(Bullet {
        id,
        pos,
        vel: Vec2::ZERO,
        kind,
        damage,
        knockback,
        range: kind.base_stats().range,
        traveled: 0.0,
    });
}

/// Repeatable input script used by the determinism and resume tests
fn scripted(t: u64) -> TickInput {
    TickInput {
        left: t % 120 < 40,
        right: (60..100).contains(&(t % 120)),
        jump: t % 90 == 0,
        crouch: t % 200 > 180,
        fire: t % 45 < 10,
        ..TickInput::default()
    }
}

// ── physics ────────────────────────────────────────────────────────────────────

#[test]
fn test_settled_player_holds_position_exactly() {
    let mut state = fresh(1);
    for _ in 0..120 {
        tick(&mut state, &idle());
    }
    assert!(state.player.grounded);

    let rest = state.player.body.pos;
    for _ in 0..40 {
        tick(&mut state, &idle());
    }
    assert_eq!(state.player.body.pos, rest);
    assert_eq!(state.player.body.vel, Vec2::ZERO);
}

#[test]
fn test_fall_speed_ramps_then_clamps() {
    let mut state = fresh(2);
    // High above the arena so the fall outlasts the ramp to terminal speed
    state.player.body.pos = Vec2::new(385.0, -400.0);
    state.player.body.vel = Vec2::ZERO;
    state.player.grounded = false;

    let gravity = state.arena.gravity;
    let mut prev = 0.0f32;
    let mut hit_cap = false;
    let mut landed = false;
    for _ in 0..600 {
        tick(&mut state, &idle());
        if state.player.grounded {
            landed = true;
            break;
        }
        let vy = state.player.body.vel.y;
        assert_eq!(vy, (prev + gravity).min(MAX_FALL_SPEED));
        if vy == MAX_FALL_SPEED {
            hit_cap = true;
        } else {
            assert!(vy > prev);
        }
        prev = vy;
    }
    assert!(landed);
    assert!(hit_cap);
}

#[test]
fn test_player_lands_flush_where_dropped() {
    let mut state = fresh(3);
    // Directly over the (200,450,400,20) platform
    state.player.body.pos = Vec2::new(400.0, 300.0);
    state.player.body.vel = Vec2::ZERO;
    state.player.grounded = false;

    for _ in 0..120 {
        tick(&mut state, &idle());
    }
    assert!(state.player.grounded);
    assert_eq!(state.player.body.bottom(), 450.0);
    assert_eq!(state.player.body.vel.y, 0.0);
}

// ── weapons ────────────────────────────────────────────────────────────────────

#[test]
fn test_held_trigger_spends_exactly_one_magazine() {
    let mut state = fresh(4);
    let firing = TickInput {
        fire: true,
        ..TickInput::default()
    };

    // 12 pistol rounds at 15-tick cadence fit inside 200 ticks; the reload
    // that follows does not
    let mut shots = 0;
    let mut reloads = 0;
    for _ in 0..200 {
        tick(&mut state, &firing);
        for event in state.drain_events() {
            match event {
                GameEvent::ShotFired { .. } => shots += 1,
                GameEvent::ReloadStarted => reloads += 1,
                _ => {}
            }
        }
    }
    assert_eq!(shots, 12);
    assert_eq!(reloads, 1);
    assert_eq!(state.player.weapon.ammo, 0);
    assert!(state.player.weapon.is_reloading());

    // The reload finishes on its own deadline, trigger released
    for _ in 0..100 {
        tick(&mut state, &idle());
    }
    assert_eq!(state.player.weapon.ammo, 12);
    assert!(!state.player.weapon.is_reloading());
}

// ── combat and scoring ─────────────────────────────────────────────────────────

#[test]
fn test_three_lethal_bullets_score_one_kill() {
    let mut state = fresh(5);
    state.zombies.clear();
    state.spawn_zombie(Vec2::new(700.0, 500.0));
    let target = state.zombies[0].body.center();

    for _ in 0..3 {
        plant_bullet(&mut state, target, 60);
    }
    tick(&mut state, &idle());

    assert!(state.zombies.is_empty());
    assert_eq!(state.kills, 1);
    assert_eq!(state.score, 100);
    let killed = state
        .events
        .iter()
        .filter(|e| matches!(e, GameEvent::ZombieKilled { .. }))
        .count();
    assert_eq!(killed, 1);
}

#[test]
fn test_second_hit_finishes_what_the_first_started() {
    let mut state = fresh(12);
    state.zombies.clear();
    state.spawn_zombie(Vec2::new(700.0, 500.0));

    let first = state.zombies[0].body.center();
    plant_bullet(&mut state, first, 60);
    tick(&mut state, &idle());
    assert_eq!(state.zombies.len(), 1);
    assert_eq!(state.zombies[0].health, 40);
    assert_eq!(state.score, 0);

    let second = state.zombies[0].body.center();
    plant_bullet(&mut state, second, 60);
    tick(&mut state, &idle());
    assert!(state.zombies.is_empty());
    assert_eq!(state.score, 100);
    assert_eq!(state.kills, 1);
}

#[test]
fn test_railgun_round_tears_through_the_pack() {
    let mut state = fresh(13);
    state.zombies.clear();
    state.spawn_zombie(Vec2::new(600.0, 500.0));
    state.spawn_zombie(Vec2::new(604.0, 500.0));

    // One piercing round parked across both bodies
    plant_round(&mut state, Vec2::new(617.0, 525.0), WeaponKind::Railgun, 60, 0.0);
    tick(&mut state, &idle());

    assert_eq!(state.zombies.len(), 2);
    assert_eq!(state.zombies[0].health, 40);
    assert_eq!(state.zombies[1].health, 40);
    // The round is still flying
    assert_eq!(state.bullets.len(), 1);
}

#[test]
fn test_shock_round_splashes_half_to_nearby_zombies() {
    let mut state = fresh(15);
    state.zombies.clear();
    state.spawn_zombie(Vec2::new(600.0, 500.0)); // direct hit
    state.spawn_zombie(Vec2::new(640.0, 500.0)); // inside the 60 px ring
    state.spawn_zombie(Vec2::new(760.0, 500.0)); // outside it

    plant_round(
        &mut state,
        Vec2::new(615.0, 525.0),
        WeaponKind::ShockRifle,
        40,
        12.0,
    );
    tick(&mut state, &idle());

    // Full damage to the target, half inside the ring, none outside; the
    // direct target is never hit a second time by its own blast
    assert_eq!(state.zombies.len(), 3);
    assert_eq!(state.zombies[0].health, 60);
    assert_eq!(state.zombies[1].health, 80);
    assert_eq!(state.zombies[2].health, 100);
    // Splash push carries half the round's knockback
    assert!((state.zombies[1].body.vel.x - 5.8).abs() < 1e-3);
    // The round does not survive the blast
    assert!(state.bullets.is_empty());
}

#[test]
fn test_hits_inside_invuln_window_do_not_stack() {
    let mut state = fresh(6);
    state.damage_player(10);
    state.damage_player(25);
    assert_eq!(state.player.health, 90);

    state.time_ticks += state.tuning.player.invuln_ticks as u64 + 1;
    state.damage_player(25);
    assert_eq!(state.player.health, 65);
}

// ── effects ────────────────────────────────────────────────────────────────────

#[test]
fn test_burst_particles_drain_within_bounds() {
    let mut state = fresh(7);
    // Let the spawn landing settle, then start from a clean pool
    for _ in 0..120 {
        tick(&mut state, &idle());
    }
    state.particles.clear();

    effects::death_burst(&mut state.particles, Vec2::new(400.0, 300.0), 9);
    assert!(!state.particles.is_empty());

    let mut drained = false;
    for _ in 0..120 {
        tick(&mut state, &idle());
        if state.particles.is_empty() {
            drained = true;
            break;
        }
    }
    assert!(drained);
}

// ── boss ───────────────────────────────────────────────────────────────────────

#[test]
fn test_boss_phases_escalate_monotonically() {
    let mut state = fresh(8);
    state.zombies.clear();
    state.level = 4;
    state.spawn_level();
    assert!(state.boss.is_some());

    let mut changes: Vec<u8> = Vec::new();
    let mut last_phase = 1u8;
    for t in 0..900u64 {
        // Keep the duel clean: no summoned adds soaking hits, no player death
        state.zombies.clear();
        state.player.health = state.player.max_health;
        if t % 15 == 0 {
            if let Some(center) = state.boss.as_ref().map(|b| b.body.center()) {
                plant_bullet(&mut state, center, 100);
            }
        }

        tick(&mut state, &idle());

        for event in state.drain_events() {
            if let GameEvent::BossPhaseChanged { phase } = event {
                changes.push(phase);
            }
        }
        if let Some(boss) = &state.boss {
            assert!(boss.phase >= last_phase);
            last_phase = boss.phase;
        }
    }

    // Escalated to the final phase, one step at a time, and went down
    assert_eq!(changes.last(), Some(&3));
    for pair in changes.windows(2) {
        assert!(pair[0] < pair[1]);
    }
    assert!(state.boss.is_none());
    assert_eq!(state.phase, GamePhase::UpgradeMenu);
}

#[test]
fn test_the_boss_soaks_a_piercing_round() {
    let mut state = fresh(14);
    state.zombies.clear();
    state.level = 4;
    state.spawn_level();

    let center = state.boss.as_ref().map(|b| b.body.center()).unwrap();
    plant_round(&mut state, center, WeaponKind::Railgun, 60, 0.0);
    tick(&mut state, &idle());

    // The boss is broad enough to stop what zombies cannot
    assert_eq!(state.boss.as_ref().unwrap().health, 940);
    assert!(state.bullets.is_empty());
}

// ── run flow ───────────────────────────────────────────────────────────────────

#[test]
fn test_clearing_the_map_opens_upgrades_then_next_level() {
    let mut state = fresh(9);
    let targets: Vec<Vec2> = state.zombies.iter().map(|z| z.body.center()).collect();
    assert_eq!(targets.len(), 5);
    for pos in targets {
        plant_bullet(&mut state, pos, 200);
    }
    tick(&mut state, &idle());

    // Five kills in one tick build a x1.1 combo on the last one
    assert!(state.zombies.is_empty());
    assert_eq!(state.kills, 5);
    assert_eq!(state.combo, 5);
    assert_eq!(state.score, 510);
    assert_eq!(state.phase, GamePhase::UpgradeMenu);
    assert_eq!(state.upgrade_offers.len(), 3);
    assert!(
        state
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::LevelCleared { level: 1 }))
    );

    let choice = TickInput {
        upgrade_choice: Some(0),
        ..TickInput::default()
    };
    tick(&mut state, &choice);
    assert_eq!(state.phase, GamePhase::Playing);
    assert_eq!(state.level, 2);
    assert!(state.upgrade_offers.is_empty());
    assert_eq!(state.zombies.len(), 7);
}

#[test]
fn test_death_rolls_game_over_and_restart_begins_fresh() {
    let mut state = fresh(10);
    for _ in 0..30 {
        tick(&mut state, &idle());
    }
    state.player.health = 0;
    tick(&mut state, &idle());
    assert_eq!(state.phase, GamePhase::GameOver);
    assert!(
        state
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::GameOver { .. }))
    );

    // The frozen run ignores movement
    let rest = state.player.body.pos;
    let moving = TickInput {
        left: true,
        ..TickInput::default()
    };
    tick(&mut state, &moving);
    assert_eq!(state.player.body.pos, rest);

    let restart = TickInput {
        restart: true,
        ..TickInput::default()
    };
    tick(&mut state, &restart);
    assert_eq!(state.phase, GamePhase::Playing);
    assert_eq!(state.score, 0);
    assert_eq!(state.level, 1);
    assert_eq!(state.player.health, state.player.max_health);
    assert_eq!(state.zombies.len(), 5);
}

// ── determinism and persistence ────────────────────────────────────────────────

#[test]
fn test_same_seed_and_script_share_every_snapshot() {
    let mut a = fresh(404);
    let mut b = fresh(404);
    for t in 0..500u64 {
        let input = scripted(t);
        tick(&mut a, &input);
        tick(&mut b, &input);
        if t % 100 == 99 {
            assert_eq!(
                serde_json::to_string(&a).unwrap(),
                serde_json::to_string(&b).unwrap()
            );
        }
    }

    let mut c = fresh(405);
    for t in 0..500u64 {
        tick(&mut c, &scripted(t));
    }
    assert_ne!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&c).unwrap()
    );
}

#[test]
fn test_save_under_fire_resumes_identical() {
    let mut store = MemStore::new();
    let mut live = fresh(777);
    for t in 0..150u64 {
        tick(&mut live, &scripted(t));
    }
    assert!(save_game(&mut store, &live));

    let mut resumed = load_game(&store).unwrap();
    for t in 150..400u64 {
        let input = scripted(t);
        tick(&mut live, &input);
        tick(&mut resumed, &input);
    }
    assert_eq!(
        serde_json::to_string(&live).unwrap(),
        serde_json::to_string(&resumed).unwrap()
    );
}

// ── randomized properties ──────────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_any_input_burst_keeps_the_player_in_the_arena(
        seed in 0u64..500,
        script in prop::collection::vec(any::<u8>(), 1..150),
    ) {
        let mut state = GameState::new(seed, ArenaPreset::Classic);
        let width = state.arena.size.x;
        for (i, bits) in script.iter().enumerate() {
            let input = TickInput {
                left: bits & 1 != 0,
                right: bits & 2 != 0,
                jump: bits & 4 != 0,
                crouch: bits & 8 != 0,
                fire: bits & 16 != 0,
                interact: bits & 32 != 0,
                reload: i % 7 == 0,
                ..TickInput::default()
            };
            tick(&mut state, &input);
            let body = &state.player.body;
            prop_assert!(body.pos.is_finite());
            prop_assert!(body.pos.x >= -body.size.x && body.pos.x <= width);
        }
    }
}

proptest! {
    #[test]
    fn test_finite_coercion_never_leaks(
        x in prop_oneof![any::<f32>(), Just(f32::NAN), Just(f32::INFINITY), Just(f32::NEG_INFINITY)],
        y in prop_oneof![any::<f32>(), Just(f32::NAN), Just(f32::NEG_INFINITY)],
    ) {
        prop_assert!(finite_or(x, 7.0).is_finite());
        prop_assert!(finite_vec(Vec2::new(x, y), Vec2::ZERO).is_finite());
        if x.is_finite() {
            prop_assert_eq!(finite_or(x, 7.0), x);
        }
    }

    #[test]
    fn test_combo_multiplier_grows_and_never_discounts(combo in 0u32..5_000) {
        let score = ScoreTuning::default();
        prop_assert!(score.multiplier(combo) >= 1.0);
        prop_assert!(score.multiplier(combo + 1) >= score.multiplier(combo));
        prop_assert!(score.scaled_reward(100, combo) >= 100);
    }

    #[test]
    fn test_gun_rolls_stay_inside_the_envelope(seed in 0u64..2_000) {
        let mut rng = Pcg32::seed_from_u64(seed);
        let stats = random_drop(&mut rng);
        let base = stats.kind.base_stats();

        let lo = ((base.damage as f32 * 0.8).round() as u32).max(1);
        let hi = (base.damage as f32 * 1.2).round() as u32;
        prop_assert!(stats.damage >= lo && stats.damage <= hi);

        let lo = ((base.fire_rate_ticks as f32 * 0.8).round() as u32).max(3);
        let hi = (base.fire_rate_ticks as f32 * 1.2).round() as u32;
        prop_assert!(stats.fire_rate_ticks >= lo && stats.fire_rate_ticks <= hi);

        let lo = ((base.magazine as f32 * 0.8).round() as u32).max(1);
        let hi = (base.magazine as f32 * 1.2).round() as u32;
        prop_assert!(stats.magazine >= lo && stats.magazine <= hi);

        prop_assert!(stats.range >= base.range * 0.9 - 1e-3);
        prop_assert!(stats.range <= base.range * 1.1 + 1e-3);

        prop_assert_eq!(stats.pellets, base.pellets);
        prop_assert_eq!(stats.reload_ticks, base.reload_ticks);
    }
}
