//! Fixed timestep simulation tick
//!
//! Advances the whole game exactly one step per call: player movement, the
//! weapon machine, zombie and boss AI, projectile flight, then all collision
//! resolution in a fixed order. Every wait (reload, invulnerability, attack
//! cooldown) is an absolute deadline compared against `time_ticks`, so runs
//! replay identically from (seed, inputs).

use glam::Vec2;
use rand::Rng;

use super::boss::{ShadowBolt, update_boss};
use super::collision::{
    apply_friction, apply_gravity, circle_rect_overlap, integrate, land_on_platforms,
    resolve_side_contact, step_falling_body, wrap_horizontal,
};
use super::effects::{self, ParticleHue};
use super::rect::Rect;
use super::state::{
    ALL_UPGRADES, BULLET_SIZE, Bullet, Facing, GameEvent, GamePhase, GameState, Stance, UpgradeKind,
};
use super::weapons;
use crate::approach;

/// Blast radius of a shockwave impact, in px
const SHOCKWAVE_RADIUS: f32 = 60.0;
/// Splash targets take the direct damage and knockback divided by this
const SHOCKWAVE_FALLOFF: u32 = 2;
/// Fall speed above which a landing kicks up dust
const HARD_LANDING_SPEED: f32 = 6.0;

/// Input commands for a single tick (deterministic)
///
/// Movement, crouch, and fire are live key states; jump, reload, interact,
/// pause, and restart are one-shots the shell clears after each substep batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    pub left: bool,
    pub right: bool,
    pub jump: bool,
    pub crouch: bool,
    pub fire: bool,
    pub reload: bool,
    pub interact: bool,
    pub pause: bool,
    pub restart: bool,
    /// Index into the current upgrade offers (0-based)
    pub upgrade_choice: Option<u8>,
    /// World-space aim point; falls back to the facing direction
    pub aim: Option<Vec2>,
    /// Hand control to the built-in pilot (demo and headless runs)
    pub bot: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput) {
    let input = if input.bot {
        bot_input(state, input)
    } else {
        *input
    };

    // Pause toggles between the live phases and swallows the frame
    if input.pause && matches!(state.phase, GamePhase::Playing | GamePhase::Paused) {
        state.phase = match state.phase {
            GamePhase::Playing => GamePhase::Paused,
            _ => GamePhase::Playing,
        };
        return;
    }

    match state.phase {
        GamePhase::Paused => return,
        GamePhase::GameOver => {
            if input.restart {
                let seed = state.rng.random();
                let preset = state.arena.preset;
                log::info!("restarting, new seed {seed}");
                *state = GameState::new(seed, preset);
            }
            return;
        }
        GamePhase::UpgradeMenu => {
            // The world stays frozen until a choice confirms
            if let Some(choice) = input.upgrade_choice {
                if let Some(&kind) = state.upgrade_offers.get(choice as usize) {
                    apply_upgrade(state, kind);
                }
            }
            return;
        }
        GamePhase::Playing => {}
    }

    state.time_ticks += 1;
    let now = state.time_ticks;

    state.screen_shake *= 0.9;
    if state.screen_shake < 0.1 {
        state.screen_shake = 0.0;
    }

    // A quiet stretch ends the kill streak
    if state.combo > 0
        && now.saturating_sub(state.last_kill_tick) > state.tuning.score.combo_window_ticks
    {
        state.combo = 0;
    }

    update_player(state, &input, now);
    fire_weapon(state, &input, now);
    update_zombies(state, now);
    let beam_hit = update_boss_step(state, now);
    update_bullets(state);
    update_bolts(state);
    effects::update_particles(&mut state.particles);
    effects::update_texts(&mut state.texts);
    resolve_bullet_hits(state, now);
    resolve_enemy_contact(state, beam_hit, now);
    resolve_pickups(state, &input);
    check_level_clear(state);
    check_terminal(state);
    state.normalize_order();
}

/// Stance, steering, jumping, and platforming for the player
fn update_player(state: &mut GameState, input: &TickInput, now: u64) {
    let tuning = state.tuning.player;
    let gravity = state.arena.gravity;
    let arena_width = state.arena.size.x;
    let mut jumped = false;
    let mut dust_at = None;
    {
        let GameState {
            player, platforms, ..
        } = state;

        player.stance = if input.crouch {
            Stance::Crouching
        } else {
            Stance::Standing
        };

        // Held movement pins the velocity; friction only acts on release
        let crouch_factor = if player.stance == Stance::Crouching {
            0.5
        } else {
            1.0
        };
        let run_speed = tuning.speed * player.speed_mult * crouch_factor;
        if input.left {
            player.body.vel.x = -run_speed;
            player.facing = Facing::Left;
        } else if input.right {
            player.body.vel.x = run_speed;
            player.facing = Facing::Right;
        } else {
            let friction = if !player.grounded {
                tuning.friction_air
            } else if player.stance == Stance::Crouching {
                tuning.friction_crouch
            } else {
                tuning.friction_ground
            };
            apply_friction(&mut player.body, friction);
        }

        if input.jump && player.jumps_used < player.max_jumps {
            player.body.vel.y = tuning.jump_impulse * player.jump_mult;
            player.jumps_used += 1;
            player.grounded = false;
            jumped = true;
        }

        apply_gravity(&mut player.body, gravity);
        let prev = player.body.pos;
        integrate(&mut player.body);
        wrap_horizontal(&mut player.body, arena_width);

        let impact_speed = player.body.vel.y;
        let was_grounded = player.grounded;
        player.grounded = land_on_platforms(&mut player.body, arena_width, platforms);
        if player.grounded {
            player.jumps_used = 0;
            if !was_grounded && impact_speed > HARD_LANDING_SPEED {
                dust_at = Some(Vec2::new(
                    player.body.pos.x + player.body.size.x / 2.0,
                    player.body.bottom(),
                ));
            }
        } else {
            resolve_side_contact(&mut player.body, prev, platforms);
        }
    }
    if jumped {
        state.push_event(GameEvent::PlayerJumped);
    }
    if let Some(pos) = dust_at {
        effects::landing_dust(&mut state.particles, pos, now as u32);
    }
}

/// Poll the weapon machine, then fire or reload on request
fn fire_weapon(state: &mut GameState, input: &TickInput, now: u64) {
    let was_reloading = state.player.weapon.is_reloading();
    state.player.weapon.update(now);

    if input.reload {
        state.player.weapon.start_reload(now);
    }

    if input.fire {
        let muzzle = state.player.hitbox().center();
        // A non-finite or degenerate aim point falls back to the facing axis
        let aim_angle = match input.aim {
            Some(point) if point.is_finite() && point != muzzle => {
                let to = point - muzzle;
                to.y.atan2(to.x)
            }
            _ => match state.player.facing {
                Facing::Right => 0.0,
                Facing::Left => std::f32::consts::PI,
            },
        };

        let fired = {
            let GameState { player, rng, .. } = state;
            player
                .weapon
                .try_fire(now, aim_angle, rng)
                .map(|angles| (angles, player.weapon.stats))
        };

        if let Some((angles, stats)) = fired {
            for angle in angles {
                let id = state.next_entity_id();
                state.bullets.push(Bullet {
                    id,
                    pos: muzzle,
                    vel: Vec2::new(angle.cos(), angle.sin()) * stats.bullet_speed,
                    kind: stats.kind,
                    damage: stats.damage,
                    knockback: stats.knockback,
                    range: stats.range,
                    traveled: 0.0,
                });
            }
            let dir = Vec2::new(aim_angle.cos(), aim_angle.sin());
            effects::muzzle_flash(&mut state.particles, muzzle + dir * 20.0, dir, now as u32);
            state.push_event(GameEvent::ShotFired { kind: stats.kind });
        }
    }

    // Covers manual reloads, emptied magazines, and dry trigger pulls alike
    if !was_reloading && state.player.weapon.is_reloading() {
        state.push_event(GameEvent::ReloadStarted);
    }
}

/// Steering, hops, platforming, and anti-stacking for the horde
fn update_zombies(state: &mut GameState, now: u64) {
    let tuning = state.tuning.zombie;
    let arena = state.arena;
    let player_center = state.player.hitbox().center();

    let GameState {
        zombies, platforms, ..
    } = state;

    for zombie in zombies.iter_mut() {
        let dx = player_center.x - zombie.body.center().x;
        let target = dx.signum() * tuning.speed;
        zombie.body.vel.x = approach(zombie.body.vel.x, target, tuning.steer_factor);

        // Hop after an elevated player, on a cooldown
        if zombie.grounded
            && now >= zombie.jump_ready_at
            && player_center.y < zombie.body.center().y - 60.0
        {
            zombie.body.vel.y = tuning.jump_impulse;
            zombie.grounded = false;
            zombie.jump_ready_at = now + tuning.jump_cooldown_ticks as u64;
        }

        apply_gravity(&mut zombie.body, arena.gravity);
        let prev = zombie.body.pos;
        integrate(&mut zombie.body);
        wrap_horizontal(&mut zombie.body, arena.size.x);
        zombie.grounded = land_on_platforms(&mut zombie.body, arena.size.x, platforms);
        if !zombie.grounded {
            resolve_side_contact(&mut zombie.body, prev, platforms);
        }
    }

    // Pairwise nudge so the horde spreads instead of stacking into one column
    for i in 0..zombies.len() {
        for j in (i + 1)..zombies.len() {
            let (head, tail) = zombies.split_at_mut(j);
            let a = &mut head[i];
            let b = &mut tail[0];
            let diff = a.body.center() - b.body.center();
            if diff.x.abs() < tuning.width && diff.y.abs() < tuning.height * 0.5 {
                let push = if diff.x >= 0.0 {
                    tuning.separation_push
                } else {
                    -tuning.separation_push
                };
                a.body.pos.x += push * 0.5;
                b.body.pos.x -= push * 0.5;
            }
        }
    }
}

/// Run the boss and apply whatever it did to the world.
/// Returns whether the death beam swept over the player this tick.
fn update_boss_step(state: &mut GameState, now: u64) -> bool {
    let tuning = state.tuning.boss;
    let arena = state.arena;
    let player_center = state.player.hitbox().center();

    let actions = {
        let GameState { boss, rng, .. } = state;
        match boss.as_mut() {
            Some(boss) => update_boss(boss, &tuning, &arena, player_center, rng, now),
            None => return false,
        }
    };

    for (pos, vel) in actions.bolts {
        let id = state.next_entity_id();
        state.bolts.push(ShadowBolt {
            id,
            pos,
            vel,
            radius: tuning.bolt_radius,
            damage: tuning.bolt_damage,
        });
    }

    let zombie_tuning = state.tuning.zombie;
    for pos in actions.summons {
        // Keep summons inside the arena and above the ground slab
        let clamped = Vec2::new(
            pos.x.clamp(0.0, arena.size.x - zombie_tuning.width),
            pos.y.clamp(0.0, arena.size.y - 150.0),
        );
        state.spawn_zombie(clamped);
        effects::shadow_ring(&mut state.particles, clamped, now as u32);
    }

    if let Some(from) = actions.teleported_from {
        effects::shadow_ring(&mut state.particles, from, now as u32);
        if let Some(boss) = &state.boss {
            effects::shadow_ring(
                &mut state.particles,
                boss.body.center(),
                (now as u32).wrapping_add(0x9e37),
            );
        }
    }

    if let Some(phase) = actions.phase_changed {
        state.screen_shake = 10.0;
        if let Some(boss) = &state.boss {
            effects::shadow_ring(&mut state.particles, boss.body.center(), now as u32);
        }
        state.push_event(GameEvent::BossPhaseChanged { phase });
    }

    actions.beam_hit
}

/// Fly player bullets; expire on range or when leaving the arena
fn update_bullets(state: &mut GameState) {
    // One bullet-size of slack so shots die just past the edge, not on it
    let bounds = Rect::new(
        -BULLET_SIZE,
        -BULLET_SIZE,
        state.arena.size.x + 2.0 * BULLET_SIZE,
        state.arena.size.y + 2.0 * BULLET_SIZE,
    );
    state.bullets.retain_mut(|bullet| {
        bullet.pos += bullet.vel;
        bullet.traveled += bullet.vel.length();
        bullet.traveled <= bullet.range && bounds.contains_point(bullet.pos)
    });
}

/// Fly boss bolts; they vanish at the arena edge
fn update_bolts(state: &mut GameState) {
    let bounds = Rect::new(0.0, 0.0, state.arena.size.x, state.arena.size.y);
    state.bolts.retain_mut(|bolt| {
        bolt.pos += bolt.vel;
        bounds.contains_point(bolt.pos)
    });
}

/// Resolve player bullets against zombies (registry order, first hit wins),
/// then against the boss. Dead zombies leave the registry at the end of the
/// pass, and zero-health ones are skipped meanwhile, so two bullets in one
/// tick can never score the same kill twice.
fn resolve_bullet_hits(state: &mut GameState, now: u64) {
    let mut bi = 0;
    while bi < state.bullets.len() {
        let bullet = state.bullets[bi];
        let dir = bullet.vel.normalize_or_zero();
        let mut consumed = false;

        let mut zi = 0;
        while zi < state.zombies.len() {
            if state.zombies[zi].health > 0 && bullet.rect().overlaps(&state.zombies[zi].rect()) {
                hit_zombie(state, zi, bullet.damage, dir * bullet.knockback, now);
                if bullet.kind.shockwave() {
                    shockwave_at(
                        state,
                        bullet.pos,
                        Some(zi),
                        bullet.damage / SHOCKWAVE_FALLOFF,
                        bullet.knockback / SHOCKWAVE_FALLOFF as f32,
                        now,
                    );
                    consumed = true;
                } else if !bullet.kind.piercing() {
                    consumed = true;
                }
                if consumed {
                    break;
                }
            }
            zi += 1;
        }

        // The boss is broad enough to stop anything, piercing included
        if !consumed {
            let overlapping = match &state.boss {
                Some(boss) => bullet.rect().overlaps(&boss.body.rect()),
                None => false,
            };
            if overlapping {
                if bullet.kind.shockwave() {
                    shockwave_at(
                        state,
                        bullet.pos,
                        None,
                        bullet.damage / SHOCKWAVE_FALLOFF,
                        bullet.knockback / SHOCKWAVE_FALLOFF as f32,
                        now,
                    );
                }
                hit_boss(state, bullet.damage, now);
                consumed = true;
            }
        }

        if consumed {
            state.bullets.remove(bi);
        } else {
            bi += 1;
        }
    }

    state.zombies.retain(|z| z.health > 0);
}

/// Apply one bullet (or splash) hit to the zombie at `index`
fn hit_zombie(state: &mut GameState, index: usize, damage: u32, impulse: Vec2, now: u64) {
    let (pos, died) = {
        let zombie = &mut state.zombies[index];
        zombie.health = zombie.health.saturating_sub(damage);
        zombie.body.vel += impulse;
        (zombie.body.center(), zombie.health == 0)
    };

    let salt = (now as u32).wrapping_add(index as u32);
    effects::spawn_burst(&mut state.particles, pos, 8, 2.0, ParticleHue::Blood, salt);
    effects::push_text(&mut state.texts, pos, format!("-{damage}"));

    if died {
        let awarded = state.register_kill(state.tuning.zombie.kill_reward);
        state.push_event(GameEvent::ZombieKilled {
            pos,
            combo: state.combo,
        });
        effects::death_burst(&mut state.particles, pos, salt);
        effects::push_text(
            &mut state.texts,
            pos + Vec2::new(0.0, -14.0),
            format!("+{awarded}"),
        );

        let chance = state.tuning.zombie.gun_drop_chance;
        if state.rng.random_bool(chance) {
            let stats = weapons::random_drop(&mut state.rng);
            state.spawn_dropped_gun(pos, stats);
        }
    }
}

/// Splash damage and push around a shockwave impact; the direct target is
/// excluded, having already taken the full hit
fn shockwave_at(
    state: &mut GameState,
    center: Vec2,
    exclude: Option<usize>,
    damage: u32,
    knockback: f32,
    now: u64,
) {
    effects::spark_ring(&mut state.particles, center, now as u32);
    let mut zi = 0;
    while zi < state.zombies.len() {
        if Some(zi) != exclude && state.zombies[zi].health > 0 {
            let to_target = state.zombies[zi].body.center() - center;
            if to_target.length() <= SHOCKWAVE_RADIUS {
                let push = to_target.normalize_or_zero() * knockback;
                hit_zombie(state, zi, damage, push, now);
            }
        }
        zi += 1;
    }
}

/// Apply one bullet hit to the boss, handling defeat and the guaranteed drop
fn hit_boss(state: &mut GameState, damage: u32, now: u64) {
    let (center, died, blocked) = {
        let Some(boss) = state.boss.as_mut() else {
            return;
        };
        let blocked = boss.is_invulnerable(now);
        let died = boss.take_damage(damage, now);
        (boss.body.center(), died, blocked)
    };

    effects::spawn_burst(
        &mut state.particles,
        center,
        8,
        2.0,
        ParticleHue::Shadow,
        now as u32,
    );
    if !blocked {
        effects::push_text(&mut state.texts, center, format!("-{damage}"));
        state.screen_shake = (state.screen_shake + damage as f32 * 0.2).min(12.0);
    }

    if died {
        let awarded = state.register_kill(state.tuning.boss.kill_reward);
        state.push_event(GameEvent::BossKilled);
        effects::death_burst(&mut state.particles, center, now as u32);
        effects::shadow_ring(&mut state.particles, center, (now as u32).wrapping_add(1));
        effects::push_text(
            &mut state.texts,
            center + Vec2::new(0.0, -20.0),
            format!("+{awarded}"),
        );
        state.screen_shake = 20.0;

        // The Necromancer always leaves something worth carrying: best of three
        let drop = {
            let GameState { rng, .. } = state;
            let mut best = weapons::random_drop(rng);
            for _ in 0..2 {
                let roll = weapons::random_drop(rng);
                if roll.damage > best.damage {
                    best = roll;
                }
            }
            best
        };
        state.spawn_dropped_gun(center, drop);
        state.boss = None;
        log::info!("necromancer defeated, +{awarded} points");
    }
}

/// Melee, bolt, and beam damage against the player. Each hit passes through
/// the invulnerability window individually, so a surrounded player bleeds one
/// hit per window rather than dying in a single tick.
fn resolve_enemy_contact(state: &mut GameState, beam_hit: bool, now: u64) {
    let tuning = state.tuning.zombie;
    let player_center = state.player.hitbox().center();

    let mut melee_hits = 0u32;
    {
        let GameState { zombies, .. } = state;
        for zombie in zombies.iter_mut() {
            if now >= zombie.melee_ready_at
                && zombie.body.center().distance(player_center) < tuning.melee_range
            {
                // Cooldown spends whether or not the hit lands
                zombie.melee_ready_at = now + tuning.melee_cooldown_ticks as u64;
                melee_hits += 1;
            }
        }
    }
    for _ in 0..melee_hits {
        state.damage_player(tuning.melee_damage);
    }

    let hitbox = state.player.hitbox();
    let mut bolt_hits: Vec<u32> = Vec::new();
    state.bolts.retain(|bolt| {
        if circle_rect_overlap(bolt.pos, bolt.radius, &hitbox) {
            bolt_hits.push(bolt.damage);
            false
        } else {
            true
        }
    });
    for damage in bolt_hits {
        state.damage_player(damage);
        effects::spawn_burst(
            &mut state.particles,
            player_center,
            8,
            2.0,
            ParticleHue::Shadow,
            now as u32,
        );
    }

    if beam_hit {
        state.damage_player(state.tuning.boss.beam_damage);
    }
}

/// Settle dropped guns and swap weapons on an interact press
fn resolve_pickups(state: &mut GameState, input: &TickInput) {
    let arena = state.arena;
    {
        let GameState {
            dropped_guns,
            platforms,
            ..
        } = state;
        for gun in dropped_guns.iter_mut() {
            step_falling_body(&mut gun.body, &arena, platforms);
        }
    }

    if !input.interact {
        return;
    }
    let hitbox = state.player.hitbox();
    let found = state
        .dropped_guns
        .iter()
        .position(|gun| hitbox.overlaps(&gun.body.rect()));
    if let Some(index) = found {
        let gun = state.dropped_guns.remove(index);
        state.player.equip(gun.stats);
        state.push_event(GameEvent::WeaponPickedUp {
            kind: gun.stats.kind,
        });
        log::info!("picked up {}", gun.stats.kind.name());
    }
}

/// An empty arena opens the upgrade menu
fn check_level_clear(state: &mut GameState) {
    if !state.zombies.is_empty() || state.boss.is_some() {
        return;
    }
    state.upgrade_offers = roll_upgrades(state);
    state.phase = GamePhase::UpgradeMenu;
    state.push_event(GameEvent::LevelCleared { level: state.level });
    log::info!(
        "level {} clear: score {}, {} kills",
        state.level,
        state.score,
        state.kills
    );
}

/// Three distinct offers; the extra jump stops appearing once capped
fn roll_upgrades(state: &mut GameState) -> Vec<UpgradeKind> {
    let mut pool: Vec<UpgradeKind> = ALL_UPGRADES
        .iter()
        .copied()
        .filter(|kind| *kind != UpgradeKind::ExtraJump || state.player.max_jumps < 3)
        .collect();
    let mut offers = Vec::with_capacity(3);
    for _ in 0..3 {
        let index = state.rng.random_range(0..pool.len());
        offers.push(pool.swap_remove(index));
    }
    offers
}

/// Apply a confirmed upgrade and launch the next level
fn apply_upgrade(state: &mut GameState, kind: UpgradeKind) {
    let player = &mut state.player;
    match kind {
        UpgradeKind::MaxHealth => {
            player.max_health += 25;
            player.health = player.max_health;
        }
        UpgradeKind::Speed => player.speed_mult *= 1.2,
        UpgradeKind::Jump => player.jump_mult *= 1.15,
        UpgradeKind::Damage => {
            player.damage_mult *= 1.25;
            let bumped = (player.weapon.stats.damage as f32 * 1.25).ceil() as u32;
            player.weapon.stats.damage = bumped.max(1);
        }
        UpgradeKind::FireRate => {
            player.fire_rate_mult *= 0.8;
            let quickened = (player.weapon.stats.fire_rate_ticks as f32 * 0.8).round() as u32;
            player.weapon.stats.fire_rate_ticks = quickened.max(3);
        }
        UpgradeKind::ExtraJump => player.max_jumps = (player.max_jumps + 1).min(3),
    }
    state.push_event(GameEvent::UpgradeChosen { kind });
    state.upgrade_offers.clear();
    state.level += 1;
    state.phase = GamePhase::Playing;
    log::info!("upgrade: {}", kind.name());
    state.spawn_level();
}

/// Health reaching zero ends the run
fn check_terminal(state: &mut GameState) {
    if state.player.health == 0 && state.phase == GamePhase::Playing {
        state.phase = GamePhase::GameOver;
        state.push_event(GameEvent::PlayerDied);
        state.push_event(GameEvent::GameOver { score: state.score });
        log::info!(
            "game over: score {}, level {}, {} kills",
            state.score,
            state.level,
            state.kills
        );
    }
}

/// A simple deterministic pilot for demo and headless runs: close to firing
/// range, back off when crowded, shoot at whatever is nearest.
fn bot_input(state: &GameState, base: &TickInput) -> TickInput {
    let mut input = TickInput {
        bot: false,
        ..*base
    };
    match state.phase {
        GamePhase::GameOver => {
            input.restart = true;
            return input;
        }
        GamePhase::UpgradeMenu => {
            input.upgrade_choice = Some(0);
            return input;
        }
        GamePhase::Paused => {
            input.pause = true;
            return input;
        }
        GamePhase::Playing => {}
    }

    let me = state.player.hitbox().center();
    let mut target: Option<Vec2> = state
        .zombies
        .iter()
        .map(|z| z.body.center())
        .min_by(|a, b| a.distance(me).total_cmp(&b.distance(me)));
    if let Some(boss) = &state.boss {
        target = Some(boss.body.center());
    }

    if let Some(target) = target {
        let dx = target.x - me.x;
        if dx.abs() < 80.0 {
            // Too close: retreat
            input.left = dx > 0.0;
            input.right = dx < 0.0;
        } else {
            input.left = dx < -40.0;
            input.right = dx > 40.0;
        }
        input.jump = target.y < me.y - 40.0 && state.time_ticks % 30 == 0;
        input.fire = true;
        input.aim = Some(target);
        input.interact = true;
        input.crouch = false;
    }
    input
}
