//! Rendering layer. All terminal I/O lives here.
//!
//! Each function receives a mutable writer and an immutable view of the
//! game state.  No game logic is performed; this module only translates
//! state into terminal commands.  The arena is mapped onto the character
//! grid each frame, so any terminal size works.

use std::io::Write;

use crossterm::{
    QueueableCommand, cursor,
    style::{self, Color, Print},
    terminal,
};
use glam::Vec2;

use horde_holdout::highscores::{HighScores, format_date};
use horde_holdout::settings::Settings;
use horde_holdout::sim::{GamePhase, GameState, ParticleHue, Stance, WeaponState};

// ── Colour palette ────────────────────────────────────────────────────────────

const C_BORDER: Color = Color::DarkBlue;
const C_HUD: Color = Color::White;
const C_HEALTH: Color = Color::Red;
const C_AMMO: Color = Color::Yellow;
const C_COMBO: Color = Color::Cyan;
const C_PLAYER: Color = Color::White;
const C_ZOMBIE: Color = Color::Green;
const C_BOSS: Color = Color::Magenta;
const C_BEAM: Color = Color::Magenta;
const C_BULLET: Color = Color::Cyan;
const C_BOLT: Color = Color::DarkMagenta;
const C_PLATFORM: Color = Color::DarkGrey;
const C_GUN: Color = Color::Yellow;
const C_TEXT: Color = Color::Yellow;
const C_HINT: Color = Color::DarkGrey;

// ── Grid mapping ──────────────────────────────────────────────────────────────

/// World-to-terminal mapping for one frame
struct Grid {
    cols: u16,
    rows: u16,
    /// World px per character cell
    sx: f32,
    sy: f32,
    /// Whole-cell shake offset
    shake_x: i32,
}

impl Grid {
    fn new(state: &GameState, settings: &Settings) -> std::io::Result<Self> {
        let (cols, rows) = terminal::size()?;
        let world_cols = cols.saturating_sub(2).max(20) as f32;
        let world_rows = rows.saturating_sub(4).max(10) as f32;
        let shake_x = if settings.effective_screen_shake() && state.screen_shake >= 1.0 {
            (state.time_ticks % 3) as i32 - 1
        } else {
            0
        };
        Ok(Self {
            cols,
            rows,
            sx: state.arena.size.x / world_cols,
            sy: state.arena.size.y / world_rows,
            shake_x,
        })
    }

    /// Map a world position to a cell, or None when outside the viewport
    fn cell(&self, pos: Vec2) -> Option<(u16, u16)> {
        let x = (pos.x / self.sx) as i32 + 1 + self.shake_x;
        let y = (pos.y / self.sy) as i32 + 2;
        if x < 1 || y < 2 {
            return None;
        }
        let (x, y) = (x as u16, y as u16);
        if x >= self.cols.saturating_sub(1) || y >= self.rows.saturating_sub(2) {
            return None;
        }
        Some((x, y))
    }
}

fn put<W: Write>(out: &mut W, grid: &Grid, pos: Vec2, glyph: &str) -> std::io::Result<()> {
    if let Some((x, y)) = grid.cell(pos) {
        out.queue(cursor::MoveTo(x, y))?;
        out.queue(Print(glyph))?;
    }
    Ok(())
}

// ── Public entry point ────────────────────────────────────────────────────────

/// Render one complete frame. `now_unix` feeds the leaderboard dates on the
/// game-over screen; `banner` is a transient shell notice (achievements).
pub fn render<W: Write>(
    out: &mut W,
    state: &GameState,
    settings: &Settings,
    high_scores: &HighScores,
    last_rank: Option<usize>,
    now_unix: u64,
    banner: Option<&str>,
) -> std::io::Result<()> {
    out.queue(terminal::Clear(terminal::ClearType::All))?;

    let grid = Grid::new(state, settings)?;

    draw_border(out, &grid)?;
    draw_platforms(out, state, &grid)?;
    draw_dropped_guns(out, state, &grid)?;
    if settings.particles {
        draw_particles(out, state, settings, &grid)?;
    }
    draw_zombies(out, state, &grid)?;
    draw_boss(out, state, &grid)?;
    draw_projectiles(out, state, &grid)?;
    draw_player(out, state, &grid)?;
    if settings.damage_text {
        draw_floating_texts(out, state, &grid)?;
    }
    draw_hud(out, state, high_scores)?;
    draw_controls_hint(out, state, &grid)?;
    if let Some(text) = banner {
        draw_banner(out, &grid, text)?;
    }

    match state.phase {
        GamePhase::Paused => draw_center_panel(
            out,
            &grid,
            &["=== PAUSED ===", "", "P resume   Q quit"],
        )?,
        GamePhase::UpgradeMenu => draw_upgrade_menu(out, state, &grid)?,
        GamePhase::GameOver => {
            draw_game_over(out, state, &grid, high_scores, last_rank, now_unix)?
        }
        GamePhase::Playing => {}
    }

    // Park cursor in a harmless spot and flush
    out.queue(style::ResetColor)?;
    out.queue(cursor::MoveTo(0, grid.rows.saturating_sub(1)))?;
    out.flush()?;
    Ok(())
}

// ── Scene ─────────────────────────────────────────────────────────────────────

fn draw_border<W: Write>(out: &mut W, grid: &Grid) -> std::io::Result<()> {
    let w = grid.cols as usize;
    out.queue(style::SetForegroundColor(C_BORDER))?;

    out.queue(cursor::MoveTo(0, 1))?;
    out.queue(Print(format!("┌{}┐", "─".repeat(w.saturating_sub(2)))))?;
    out.queue(cursor::MoveTo(0, grid.rows.saturating_sub(2)))?;
    out.queue(Print(format!("└{}┘", "─".repeat(w.saturating_sub(2)))))?;

    for row in 2..grid.rows.saturating_sub(2) {
        out.queue(cursor::MoveTo(0, row))?;
        out.queue(Print("│"))?;
        out.queue(cursor::MoveTo(grid.cols.saturating_sub(1), row))?;
        out.queue(Print("│"))?;
    }
    Ok(())
}

fn draw_platforms<W: Write>(out: &mut W, state: &GameState, grid: &Grid) -> std::io::Result<()> {
    out.queue(style::SetForegroundColor(C_PLATFORM))?;
    for platform in &state.platforms {
        let rect = platform.rect;
        let mut x = rect.left();
        while x < rect.right() {
            put(out, grid, Vec2::new(x, rect.top()), "═")?;
            x += grid.sx;
        }
    }
    Ok(())
}

fn draw_dropped_guns<W: Write>(out: &mut W, state: &GameState, grid: &Grid) -> std::io::Result<()> {
    out.queue(style::SetForegroundColor(C_GUN))?;
    for gun in &state.dropped_guns {
        put(out, grid, gun.body.center(), "⌐")?;
    }
    Ok(())
}

fn draw_particles<W: Write>(
    out: &mut W,
    state: &GameState,
    settings: &Settings,
    grid: &Grid,
) -> std::io::Result<()> {
    // Newest first under the quality cap; old particles drop out before fresh ones
    for particle in state.particles.iter().rev().take(settings.max_particles()) {
        let color = match particle.hue {
            ParticleHue::Flash => Color::Yellow,
            ParticleHue::Blood => Color::DarkRed,
            ParticleHue::Shadow => Color::DarkMagenta,
            ParticleHue::Dust => Color::DarkGrey,
            ParticleHue::Spark => Color::Cyan,
        };
        out.queue(style::SetForegroundColor(color))?;
        let glyph = if particle.size > 2.0 { "*" } else { "·" };
        put(out, grid, particle.pos, glyph)?;
    }
    Ok(())
}

fn draw_zombies<W: Write>(out: &mut W, state: &GameState, grid: &Grid) -> std::io::Result<()> {
    out.queue(style::SetForegroundColor(C_ZOMBIE))?;
    for zombie in &state.zombies {
        put(out, grid, zombie.body.center(), "Z")?;
    }
    Ok(())
}

fn draw_boss<W: Write>(out: &mut W, state: &GameState, grid: &Grid) -> std::io::Result<()> {
    let Some(boss) = &state.boss else {
        return Ok(());
    };
    let center = boss.body.center();

    // Active beam first so the boss body overdraws its root
    if boss.beam_active_until > state.time_ticks {
        out.queue(style::SetForegroundColor(C_BEAM))?;
        let dir = Vec2::new(boss.beam_angle.cos(), boss.beam_angle.sin());
        let reach = state.arena.size.x.max(state.arena.size.y);
        let mut t = 20.0;
        while t < reach {
            put(out, grid, center + dir * t, "×")?;
            t += grid.sx.min(grid.sy);
        }
    }

    out.queue(style::SetForegroundColor(C_BOSS))?;
    put(out, grid, center + Vec2::new(-grid.sx, 0.0), "█")?;
    put(out, grid, center, "█")?;
    put(out, grid, center + Vec2::new(grid.sx, 0.0), "█")?;

    // Health readout floats above the body
    let label = format!("NECROMANCER {} [P{}]", boss.health, boss.phase);
    if let Some((x, y)) = grid.cell(center + Vec2::new(0.0, -boss.body.size.y)) {
        let x = x.saturating_sub(label.chars().count() as u16 / 2);
        out.queue(cursor::MoveTo(x, y))?;
        out.queue(Print(label))?;
    }
    Ok(())
}

fn draw_projectiles<W: Write>(out: &mut W, state: &GameState, grid: &Grid) -> std::io::Result<()> {
    out.queue(style::SetForegroundColor(C_BULLET))?;
    for bullet in &state.bullets {
        let glyph = if bullet.vel.x.abs() >= bullet.vel.y.abs() {
            "-"
        } else {
            "|"
        };
        put(out, grid, bullet.pos, glyph)?;
    }
    out.queue(style::SetForegroundColor(C_BOLT))?;
    for bolt in &state.bolts {
        put(out, grid, bolt.pos, "o")?;
    }
    Ok(())
}

fn draw_player<W: Write>(out: &mut W, state: &GameState, grid: &Grid) -> std::io::Result<()> {
    let player = &state.player;
    let blink = player.is_invincible(state.time_ticks) && state.time_ticks % 10 < 5;
    if blink {
        return Ok(());
    }
    out.queue(style::SetForegroundColor(C_PLAYER))?;
    let glyph = match player.stance {
        Stance::Standing => "@",
        Stance::Crouching => "&",
    };
    let center = player.hitbox().center();
    put(out, grid, center, glyph)?;

    // One-cell barrel showing the facing
    let barrel = Vec2::new(player.facing.dir() * grid.sx, 0.0);
    put(out, grid, center + barrel, "-")?;
    Ok(())
}

fn draw_floating_texts<W: Write>(out: &mut W, state: &GameState, grid: &Grid) -> std::io::Result<()> {
    out.queue(style::SetForegroundColor(C_TEXT))?;
    for text in &state.texts {
        if let Some((x, y)) = grid.cell(text.pos) {
            out.queue(cursor::MoveTo(x, y))?;
            out.queue(Print(&text.text))?;
        }
    }
    Ok(())
}

// ── HUD and overlays ──────────────────────────────────────────────────────────

fn draw_hud<W: Write>(
    out: &mut W,
    state: &GameState,
    high_scores: &HighScores,
) -> std::io::Result<()> {
    let player = &state.player;

    // Ten-segment health bar
    let filled = if player.max_health == 0 {
        0
    } else {
        (player.health * 10).div_ceil(player.max_health) as usize
    };
    out.queue(cursor::MoveTo(0, 0))?;
    out.queue(style::SetForegroundColor(C_HEALTH))?;
    out.queue(Print(format!(
        "HP [{}{}] {:>3}",
        "#".repeat(filled.min(10)),
        "-".repeat(10usize.saturating_sub(filled)),
        player.health
    )))?;

    out.queue(style::SetForegroundColor(C_AMMO))?;
    let weapon = &player.weapon;
    let ammo = match weapon.state {
        WeaponState::Reloading { .. } => "RELOADING".to_string(),
        _ => format!("{}/{}", weapon.ammo, weapon.stats.magazine),
    };
    out.queue(Print(format!(
        "  {} {}",
        weapon.stats.kind.name(),
        ammo
    )))?;

    out.queue(style::SetForegroundColor(C_HUD))?;
    let mut run_line = format!(
        "  Score {}  Level {}  Kills {}",
        state.score, state.level, state.kills
    );
    // Projected leaderboard rank while the run qualifies, else the bar to clear
    if let Some(rank) = high_scores.potential_rank(state.score) {
        run_line.push_str(&format!("  (#{rank})"));
    } else if let Some(top) = high_scores.top_score() {
        run_line.push_str(&format!("  Best {top}"));
    }
    out.queue(Print(run_line))?;

    if state.combo > 1 {
        let multiplier = state.tuning.score.multiplier(state.combo);
        out.queue(style::SetForegroundColor(C_COMBO))?;
        out.queue(Print(format!("  Combo x{} ({multiplier:.1}x)", state.combo)))?;
    }
    Ok(())
}

/// Bottom hint line: key reference, or a stat comparison while the player
/// stands on a dropped gun
fn draw_controls_hint<W: Write>(out: &mut W, state: &GameState, grid: &Grid) -> std::io::Result<()> {
    out.queue(cursor::MoveTo(0, grid.rows.saturating_sub(1)))?;
    let hitbox = state.player.hitbox();
    let underfoot = state
        .dropped_guns
        .iter()
        .find(|gun| hitbox.overlaps(&gun.body.rect()));
    if let Some(gun) = underfoot {
        let held = state.player.weapon.stats;
        let dmg = gun.stats.damage as i64 - held.damage as i64;
        let cd = gun.stats.fire_rate_ticks as i64 - held.fire_rate_ticks as i64;
        out.queue(style::SetForegroundColor(C_GUN))?;
        out.queue(Print(format!(
            "[E] take {}: dmg {} ({:+})  cd {}t ({:+})  mag {}",
            gun.stats.kind.name(),
            gun.stats.damage,
            dmg,
            gun.stats.fire_rate_ticks,
            cd,
            gun.stats.magazine,
        )))?;
    } else {
        out.queue(style::SetForegroundColor(C_HINT))?;
        out.queue(Print(
            "A/D move  W jump  S crouch  SPACE fire  R reload  E pickup  P pause  Q quit",
        ))?;
    }
    Ok(())
}

/// Transient shell notice, right-aligned on the HUD row
fn draw_banner<W: Write>(out: &mut W, grid: &Grid, text: &str) -> std::io::Result<()> {
    let width = text.chars().count() as u16;
    let x = grid.cols.saturating_sub(width + 1);
    out.queue(cursor::MoveTo(x, 0))?;
    out.queue(style::SetForegroundColor(C_COMBO))?;
    out.queue(Print(text))?;
    Ok(())
}

/// Box a few centered lines in the middle of the screen
fn draw_center_panel<W: Write>(out: &mut W, grid: &Grid, lines: &[&str]) -> std::io::Result<()> {
    let cx = grid.cols / 2;
    let cy = grid.rows / 2;
    let start = cy.saturating_sub(lines.len() as u16 / 2);
    out.queue(style::SetForegroundColor(C_HUD))?;
    for (i, line) in lines.iter().enumerate() {
        let x = cx.saturating_sub(line.chars().count() as u16 / 2);
        out.queue(cursor::MoveTo(x, start + i as u16))?;
        out.queue(Print(line))?;
    }
    Ok(())
}

fn draw_upgrade_menu<W: Write>(out: &mut W, state: &GameState, grid: &Grid) -> std::io::Result<()> {
    let mut lines: Vec<String> = vec![
        format!("=== LEVEL {} CLEAR ===", state.level),
        String::new(),
        "Choose an upgrade:".to_string(),
    ];
    for (i, kind) in state.upgrade_offers.iter().enumerate() {
        lines.push(format!("[{}] {}", i + 1, kind.name()));
    }
    let refs: Vec<&str> = lines.iter().map(|s| s.as_str()).collect();
    draw_center_panel(out, grid, &refs)
}

fn draw_game_over<W: Write>(
    out: &mut W,
    state: &GameState,
    grid: &Grid,
    high_scores: &HighScores,
    last_rank: Option<usize>,
    now_unix: u64,
) -> std::io::Result<()> {
    let mut lines: Vec<String> = vec![
        "=== GAME OVER ===".to_string(),
        String::new(),
        format!("Score {}   Level {}   Kills {}", state.score, state.level, state.kills),
    ];
    if let Some(rank) = last_rank {
        lines.push(format!("High score! Rank #{rank}"));
    }
    if !high_scores.is_empty() {
        lines.push(String::new());
        for (i, entry) in high_scores.entries.iter().take(5).enumerate() {
            lines.push(format!(
                "{}. {:>6}  L{}  {} kills  {}",
                i + 1,
                entry.score,
                entry.level,
                entry.kills,
                format_date(entry.timestamp, now_unix),
            ));
        }
    }
    lines.push(String::new());
    lines.push("ENTER restart   Q quit".to_string());
    let refs: Vec<&str> = lines.iter().map(|s| s.as_str()).collect();
    draw_center_panel(out, grid, &refs)
}
