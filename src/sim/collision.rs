//! Movement integration and collision resolution
//!
//! Pure functions over [`Body`] and [`Rect`]. Platforms are one-way
//! vertically: bodies land when falling onto the top face and pass freely
//! through it otherwise, while a body drifting into a platform band from the
//! side is pushed back out. Horizontal arena edges wrap; a body must leave
//! the arena entirely before it re-enters on the far side.

use glam::Vec2;

use super::rect::Rect;
use super::state::{Arena, Body, Platform};
use crate::{finite_vec, tuning::MAX_FALL_SPEED};

/// Pull a body downward, clamped to terminal velocity
#[inline]
pub fn apply_gravity(body: &mut Body, gravity: f32) {
    body.vel.y = (body.vel.y + gravity).min(MAX_FALL_SPEED);
}

/// Damp horizontal velocity by the given factor
#[inline]
pub fn apply_friction(body: &mut Body, factor: f32) {
    body.vel.x *= factor;
    if body.vel.x.abs() < 0.01 {
        body.vel.x = 0.0;
    }
}

/// Advance position by velocity, coercing any non-finite component back to
/// a safe value so one bad frame cannot poison the rest of the run.
pub fn integrate(body: &mut Body) {
    let prev = body.pos;
    body.vel = finite_vec(body.vel, Vec2::ZERO);
    body.pos += body.vel;
    if !body.pos.is_finite() {
        log::warn!("non-finite position corrected: {:?}", body.pos);
        body.pos = finite_vec(body.pos, prev);
    }
}

/// Teleport a body that has fully exited one side of the arena to the
/// opposite edge. Partially visible bodies are left alone.
pub fn wrap_horizontal(body: &mut Body, arena_width: f32) {
    if body.pos.x + body.size.x < 0.0 {
        body.pos.x = arena_width;
    } else if body.pos.x > arena_width {
        body.pos.x = -body.size.x;
    }
}

/// Land a falling body on the first platform its feet crossed this tick.
///
/// The feet line is always `body.bottom()`; crouching shrinks the hit box
/// from the top, so it never moves the feet. The horizontal check runs in
/// wrapped space: a body straddling the seam still stands on a platform
/// that reaches the arena edge. Returns true when the body ends the tick
/// standing on a platform.
pub fn land_on_platforms(body: &mut Body, arena_width: f32, platforms: &[Platform]) -> bool {
    if body.vel.y < 0.0 {
        return false;
    }
    let bottom = body.bottom();
    let prev_bottom = bottom - body.vel.y;
    for platform in platforms {
        let top = platform.rect.top();
        if !(prev_bottom <= top && bottom >= top) {
            continue;
        }
        let over = [0.0, arena_width, -arena_width].iter().any(|shift| {
            let left = body.pos.x + shift;
            left + body.size.x > platform.rect.left() && left < platform.rect.right()
        });
        if over {
            body.pos.y = top - body.size.y;
            body.vel.y = 0.0;
            return true;
        }
    }
    false
}

/// Push a body back out of a platform it entered from the side.
///
/// Fires only when the body's vertical span at `prev` already overlapped the
/// platform band and the horizontal overlap is new this tick. Vertical
/// entries are left alone, so rising through a one-way face and falling back
/// through after a short jump both stay free.
pub fn resolve_side_contact(body: &mut Body, prev: Vec2, platforms: &[Platform]) {
    for platform in platforms {
        if !body.rect().overlaps(&platform.rect) {
            continue;
        }
        let band_held = prev.y < platform.rect.bottom()
            && prev.y + body.size.y > platform.rect.top();
        let from_left = prev.x + body.size.x <= platform.rect.left();
        let from_right = prev.x >= platform.rect.right();
        if !band_held || !(from_left || from_right) {
            continue;
        }
        if from_left {
            body.pos.x = platform.rect.left() - body.size.x;
        } else {
            body.pos.x = platform.rect.right();
        }
        body.vel.x = 0.0;
    }
}

/// One full movement step for a simple falling body (zombies, dropped guns)
pub fn step_falling_body(body: &mut Body, arena: &Arena, platforms: &[Platform]) -> bool {
    apply_gravity(body, arena.gravity);
    let prev = body.pos;
    integrate(body);
    wrap_horizontal(body, arena.size.x);
    let grounded = land_on_platforms(body, arena.size.x, platforms);
    if !grounded {
        resolve_side_contact(body, prev, platforms);
    }
    grounded
}

/// Circle-vs-rect overlap, used for shadow bolts and blast radii
pub fn circle_rect_overlap(center: Vec2, radius: f32, rect: &Rect) -> bool {
    let nearest = Vec2::new(
        center.x.clamp(rect.left(), rect.right()),
        center.y.clamp(rect.top(), rect.bottom()),
    );
    center.distance_squared(nearest) < radius * radius
}
