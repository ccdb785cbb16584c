//! Decorative particles and floating combat text
//!
//! Nothing here feeds back into gameplay. Pools are capped, skipped by serde,
//! and jittered with an integer hash instead of the game RNG so cosmetic
//! settings can never shift the simulation stream.

use glam::Vec2;

/// Hard cap on live particles
pub const MAX_PARTICLES: usize = 256;
/// Hard cap on live floating texts
pub const MAX_TEXTS: usize = 64;

/// Per-tick velocity damping
const PARTICLE_DRAG: f32 = 0.98;
/// Per-tick life decay (a fresh particle lives 50 ticks)
const PARTICLE_DECAY: f32 = 0.02;
/// Per-tick size shrink
const PARTICLE_SHRINK: f32 = 0.95;
/// Floating text rise speed in px per tick
const TEXT_RISE: f32 = 2.0;

/// Render tint for a particle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleHue {
    /// Muzzle flash
    Flash,
    /// Zombie gore
    Blood,
    /// Necromancer magic
    Shadow,
    /// Landing / movement dust
    Dust,
    /// Shockwave ring
    Spark,
}

/// A single short-lived visual particle
#[derive(Debug, Clone)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub hue: ParticleHue,
    /// 1.0 at spawn, dead at 0
    pub life: f32,
    pub size: f32,
}

/// A rising damage / reward number
#[derive(Debug, Clone)]
pub struct FloatingText {
    pub pos: Vec2,
    pub text: String,
    pub life: f32,
}

/// Deterministic jitter in [0, 1) from an integer salt
#[inline]
fn hash_unit(salt: u32) -> f32 {
    let h = salt.wrapping_mul(2654435761);
    (h >> 8) as f32 / 16_777_216.0
}

fn push_particle(pool: &mut Vec<Particle>, particle: Particle) {
    if pool.len() >= MAX_PARTICLES {
        pool.remove(0);
    }
    pool.push(particle);
}

/// Spawn `count` particles fanned evenly around a point, with hashed speed
/// jitter. `salt` should mix the tick counter with something per-source.
pub fn spawn_burst(
    pool: &mut Vec<Particle>,
    pos: Vec2,
    count: u32,
    base_speed: f32,
    hue: ParticleHue,
    salt: u32,
) {
    for i in 0..count {
        let angle = (i as f32 / count as f32) * std::f32::consts::TAU;
        let speed = base_speed + hash_unit(salt.wrapping_add(i)) * 2.0;
        push_particle(
            pool,
            Particle {
                pos,
                vel: Vec2::new(angle.cos(), angle.sin()) * speed,
                hue,
                life: 1.0,
                size: 3.0 + hash_unit(salt.wrapping_add(i).wrapping_mul(31)) * 2.0,
            },
        );
    }
}

/// Short flash at a gun muzzle, biased along the firing direction
pub fn muzzle_flash(pool: &mut Vec<Particle>, pos: Vec2, dir: Vec2, salt: u32) {
    for i in 0..3u32 {
        let jitter = hash_unit(salt.wrapping_add(i)) - 0.5;
        push_particle(
            pool,
            Particle {
                pos,
                vel: dir * 2.0 + Vec2::new(jitter, -jitter),
                hue: ParticleHue::Flash,
                life: 0.4,
                size: 2.5,
            },
        );
    }
}

/// Gore burst when a zombie dies
pub fn death_burst(pool: &mut Vec<Particle>, pos: Vec2, salt: u32) {
    spawn_burst(pool, pos, 10, 3.0, ParticleHue::Blood, salt);
}

/// Small puff when a body lands hard
pub fn landing_dust(pool: &mut Vec<Particle>, pos: Vec2, salt: u32) {
    for i in 0..6u32 {
        let spread = hash_unit(salt.wrapping_add(i)) * 2.0 - 1.0;
        push_particle(
            pool,
            Particle {
                pos,
                vel: Vec2::new(spread * 1.5, -0.5),
                hue: ParticleHue::Dust,
                life: 0.5,
                size: 2.0,
            },
        );
    }
}

/// Ring of shadow magic for boss phase changes and teleports
pub fn shadow_ring(pool: &mut Vec<Particle>, pos: Vec2, salt: u32) {
    spawn_burst(pool, pos, 12, 2.5, ParticleHue::Shadow, salt);
}

/// Expanding spark ring for shockwave impacts
pub fn spark_ring(pool: &mut Vec<Particle>, pos: Vec2, salt: u32) {
    spawn_burst(pool, pos, 8, 4.0, ParticleHue::Spark, salt);
}

/// Age the pool one tick and drop dead particles
pub fn update_particles(pool: &mut Vec<Particle>) {
    for p in pool.iter_mut() {
        p.vel *= PARTICLE_DRAG;
        p.pos += p.vel;
        p.life -= PARTICLE_DECAY;
        p.size *= PARTICLE_SHRINK;
    }
    pool.retain(|p| p.life > 0.0);
}

/// Queue a floating number above a point
pub fn push_text(pool: &mut Vec<FloatingText>, pos: Vec2, text: String) {
    if pool.len() >= MAX_TEXTS {
        pool.remove(0);
    }
    pool.push(FloatingText {
        pos,
        text,
        life: 1.0,
    });
}

/// Age floating texts one tick
pub fn update_texts(pool: &mut Vec<FloatingText>) {
    for t in pool.iter_mut() {
        t.pos.y -= TEXT_RISE;
        t.life -= PARTICLE_DECAY;
    }
    pool.retain(|t| t.life > 0.0);
}
