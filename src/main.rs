//! Horde Holdout entry point
//!
//! Terminal shell around the deterministic simulation: raw-mode input with
//! a held-key table, a fixed timestep accumulator, the ASCII renderer, and
//! persistence at phase boundaries. `--headless N` runs the built-in pilot
//! without touching the terminal at all.

mod display;

use std::collections::HashMap;
use std::io::{BufWriter, Write, stdout};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use clap::Parser;
use crossterm::{
    ExecutableCommand, cursor,
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    terminal,
};
use glam::Vec2;

use horde_holdout::HighScores;
use horde_holdout::audio::{AudioSink, NullAudio, cue_for_event};
use horde_holdout::consts::{MAX_SUBSTEPS, SIM_DT};
use horde_holdout::persistence;
use horde_holdout::platform::FileStore;
use horde_holdout::profile::{Achievement, Profile};
use horde_holdout::settings::Settings;
use horde_holdout::sim::{GamePhase, GameState, TickInput, tick};
use horde_holdout::tuning::ArenaPreset;

/// Target frame duration (matches the 60 Hz simulation)
const FRAME: Duration = Duration::from_millis(16);

/// A key is considered "held" if its last press/repeat event arrived within
/// this many frames.  Covers terminals that don't emit key-release events:
/// the OS key-repeat rate is faster than this window, so a held key keeps
/// refreshing its entry while it is actively generating repeats.
const HOLD_WINDOW: u64 = 8;

#[derive(Parser)]
#[command(name = "horde-holdout")]
#[command(about = "Wrap-around platformer zombie shooter with a deterministic core")]
struct Cli {
    /// Run seed (defaults to the clock)
    #[arg(long)]
    seed: Option<u64>,
    /// Arena preset for new runs: classic or sprawl
    #[arg(long)]
    arena: Option<String>,
    /// Resume the saved run instead of starting fresh
    #[arg(long = "continue")]
    resume: bool,
    /// Let the built-in pilot play this many ticks without a terminal, then exit
    #[arg(long, value_name = "TICKS")]
    headless: Option<u64>,
}

/// Returns true if `key` was seen within the last `HOLD_WINDOW` frames.
fn is_held(key_frame: &HashMap<KeyCode, u64>, key: &KeyCode, frame: u64) -> bool {
    key_frame
        .get(key)
        .map(|&last| frame.saturating_sub(last) <= HOLD_WINDOW)
        .unwrap_or(false)
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Everything the shell owns: the run, the stores, and frame bookkeeping
struct Game {
    state: GameState,
    settings: Settings,
    high_scores: HighScores,
    profile: Profile,
    store: FileStore,
    audio: NullAudio,
    accumulator: f32,
    input: TickInput,
    /// Previous frame's phase, for boundary detection
    last_phase: GamePhase,
    /// Rank the finished run achieved, for the game-over screen
    last_rank: Option<usize>,
    /// Latest achievement notice and when it appeared
    banner: Option<(String, Instant)>,
}

/// How long an achievement notice stays on screen
const BANNER_TTL: Duration = Duration::from_secs(4);

impl Game {
    fn announce(&mut self, unlocked: Achievement) {
        self.banner = Some((format!("Unlocked: {}", unlocked.title()), Instant::now()));
    }

    /// Run simulation ticks for one rendered frame
    fn update(&mut self, dt: f32) {
        let dt = dt.min(0.1);
        self.accumulator += dt;

        let mut substeps = 0;
        while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
            tick(&mut self.state, &self.input);
            self.accumulator -= SIM_DT;
            substeps += 1;

            // Clear one-shot inputs after processing
            self.input.jump = false;
            self.input.reload = false;
            self.input.interact = false;
            self.input.pause = false;
            self.input.restart = false;
            self.input.upgrade_choice = None;
        }

        let events = self.state.drain_events();
        if self.settings.sound {
            for event in &events {
                if let Some(cue) = cue_for_event(event) {
                    self.audio.play(cue);
                }
            }
        }
        for unlocked in self.profile.record_events(&events) {
            self.announce(unlocked);
        }

        let current = self.state.phase;
        if current != self.last_phase {
            self.on_phase_change(self.last_phase);
            self.last_phase = current;
        }
    }

    /// Persistence happens at phase boundaries, never mid-play
    fn on_phase_change(&mut self, previous: GamePhase) {
        match self.state.phase {
            GamePhase::Paused | GamePhase::UpgradeMenu => {
                persistence::save_game(&mut self.store, &self.state);
            }
            GamePhase::GameOver => {
                for unlocked in self.profile.finalize_run(&self.state) {
                    self.announce(unlocked);
                }
                self.profile.save(&mut self.store);
                self.last_rank = self.high_scores.add_score(
                    self.state.score,
                    self.state.level,
                    self.state.kills,
                    unix_now(),
                );
                self.high_scores.save(&mut self.store);
                persistence::clear_save(&mut self.store);
            }
            GamePhase::Playing => {
                if previous == GamePhase::GameOver {
                    self.last_rank = None;
                }
                // A long freeze must not burst-replay when play resumes
                self.accumulator = 0.0;
                self.input = TickInput {
                    bot: self.input.bot,
                    ..TickInput::default()
                };
            }
        }
    }

    /// Save whatever is worth keeping on the way out
    fn shutdown(&mut self) {
        if matches!(
            self.state.phase,
            GamePhase::Playing | GamePhase::Paused | GamePhase::UpgradeMenu
        ) {
            persistence::save_game(&mut self.store, &self.state);
        }
        self.profile.save(&mut self.store);
        self.high_scores.save(&mut self.store);
    }
}

// ── Game loop ─────────────────────────────────────────────────────────────────

/// Input model: a `key_frame` map records the frame number of the last
/// press/repeat event for every key.  Each frame the live keys (movement,
/// crouch, fire, aim-up) are derived from which entries are still fresh,
/// while one-shots (jump, reload, interact, pause, restart, upgrade picks)
/// fire on the press event itself.
///
/// Works on two classes of terminal:
/// * **Keyboard-enhancement capable** (kitty protocol): proper
///   `Press` / `Repeat` / `Release` events → keys are removed on release.
/// * **Classic terminals**: only `Press` events; keys expire naturally after
///   `HOLD_WINDOW` frames of silence.
fn game_loop<W: Write>(
    out: &mut W,
    game: &mut Game,
    rx: &mpsc::Receiver<Event>,
) -> std::io::Result<()> {
    let mut key_frame: HashMap<KeyCode, u64> = HashMap::new();
    let mut frame: u64 = 0;
    let mut last_time = Instant::now();

    loop {
        let frame_start = Instant::now();
        frame += 1;

        // ── Drain all pending input events (non-blocking) ─────────────────────
        while let Ok(Event::Key(KeyEvent {
            code,
            kind,
            modifiers,
            ..
        })) = rx.try_recv()
        {
            match kind {
                // Press: record key + handle one-shot actions
                KeyEventKind::Press => {
                    key_frame.insert(code, frame);
                    match code {
                        KeyCode::Char('q') | KeyCode::Char('Q') => {
                            game.shutdown();
                            return Ok(());
                        }
                        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                            game.shutdown();
                            return Ok(());
                        }
                        KeyCode::Char('w') | KeyCode::Char('W') | KeyCode::Up => {
                            game.input.jump = true;
                        }
                        KeyCode::Char('r') | KeyCode::Char('R') => {
                            game.input.reload = true;
                        }
                        KeyCode::Char('e') | KeyCode::Char('E') => {
                            game.input.interact = true;
                        }
                        KeyCode::Char('p') | KeyCode::Char('P') | KeyCode::Esc => {
                            game.input.pause = true;
                        }
                        KeyCode::Enter => {
                            game.input.restart = true;
                        }
                        KeyCode::Char('i') | KeyCode::Char('I') => {
                            game.input.bot = !game.input.bot;
                            log::info!("demo pilot: {}", game.input.bot);
                        }
                        KeyCode::Char(c @ '1'..='3') => {
                            game.input.upgrade_choice = Some(c as u8 - b'1');
                        }
                        _ => {}
                    }
                }
                // Repeat: refresh timestamp so the key stays "held"
                KeyEventKind::Repeat => {
                    key_frame.insert(code, frame);
                }
                // Release: remove key immediately (keyboard-enhancement path)
                KeyEventKind::Release => {
                    key_frame.remove(&code);
                }
            }
        }

        // ── Derive live key state ─────────────────────────────────────────────
        game.input.left = is_held(&key_frame, &KeyCode::Left, frame)
            || is_held(&key_frame, &KeyCode::Char('a'), frame)
            || is_held(&key_frame, &KeyCode::Char('A'), frame);
        game.input.right = is_held(&key_frame, &KeyCode::Right, frame)
            || is_held(&key_frame, &KeyCode::Char('d'), frame)
            || is_held(&key_frame, &KeyCode::Char('D'), frame);
        game.input.crouch = is_held(&key_frame, &KeyCode::Down, frame)
            || is_held(&key_frame, &KeyCode::Char('s'), frame)
            || is_held(&key_frame, &KeyCode::Char('S'), frame);
        game.input.fire = is_held(&key_frame, &KeyCode::Char(' '), frame);

        // Aim straight along the facing, or diagonally up while W is held
        let aim_up = is_held(&key_frame, &KeyCode::Up, frame)
            || is_held(&key_frame, &KeyCode::Char('w'), frame)
            || is_held(&key_frame, &KeyCode::Char('W'), frame);
        game.input.aim = if aim_up {
            let center = game.state.player.hitbox().center();
            let dx = game.state.player.facing.dir() * 100.0;
            Some(center + Vec2::new(dx, -100.0))
        } else {
            None
        };

        let now = Instant::now();
        let dt = now.duration_since(last_time).as_secs_f32();
        last_time = now;
        game.update(dt);

        let banner = game
            .banner
            .as_ref()
            .filter(|(_, shown_at)| shown_at.elapsed() < BANNER_TTL)
            .map(|(text, _)| text.as_str());
        display::render(
            out,
            &game.state,
            &game.settings,
            &game.high_scores,
            game.last_rank,
            unix_now(),
            banner,
        )?;

        let elapsed = frame_start.elapsed();
        if elapsed < FRAME {
            thread::sleep(FRAME - elapsed);
        }
    }
}

// ── Headless pilot ────────────────────────────────────────────────────────────

/// Soak the simulation with the built-in pilot. No terminal, no storage;
/// results land in the log.
fn run_headless(seed: u64, preset: ArenaPreset, ticks: u64) {
    log::info!(
        "headless pilot: {ticks} ticks on {} (seed {seed})",
        preset.as_str()
    );
    let mut state = GameState::new(seed, preset);
    let mut profile = Profile::new();
    let input = TickInput {
        bot: true,
        ..TickInput::default()
    };
    for _ in 0..ticks {
        tick(&mut state, &input);
        let events = state.drain_events();
        profile.record_events(&events);
    }
    log::info!(
        "headless done: score {}, level {}, {} kills, best combo {}",
        state.score,
        state.level,
        state.kills,
        profile.best_combo
    );
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> std::io::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut store = FileStore::new();
    let mut settings = Settings::load(&store);
    if let Some(name) = &cli.arena {
        match ArenaPreset::from_str(name) {
            Some(preset) => {
                settings.arena = preset;
                settings.save(&mut store);
            }
            None => log::warn!(
                "unknown arena {name:?}, keeping {}",
                settings.arena.as_str()
            ),
        }
    }

    let seed = cli.seed.unwrap_or_else(clock_seed);

    if let Some(ticks) = cli.headless {
        run_headless(seed, settings.arena, ticks);
        return Ok(());
    }

    let state = if cli.resume {
        match persistence::load_game(&store) {
            Some(state) => state,
            None => {
                log::warn!("no saved run to continue, starting fresh");
                GameState::new(seed, settings.arena)
            }
        }
    } else {
        GameState::new(seed, settings.arena)
    };
    log::info!("starting on {} with seed {seed}", settings.arena.as_str());

    let mut game = Game {
        last_phase: state.phase,
        state,
        settings,
        high_scores: HighScores::load(&store),
        profile: Profile::load(&store),
        store,
        audio: NullAudio,
        accumulator: 0.0,
        input: TickInput::default(),
        last_rank: None,
        banner: None,
    };

    let raw_out = stdout();
    let mut out = BufWriter::new(raw_out);

    terminal::enable_raw_mode()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;

    // Request key-release (and key-repeat) events from the terminal.
    // Kitty-protocol terminals support this; others fall back gracefully.
    let keyboard_enhanced = out
        .execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))
        .is_ok();

    // Dedicate a thread exclusively to blocking event reads, sending them
    // through a channel so the game loop never has to block on I/O.
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || {
        loop {
            match event::read() {
                Ok(ev) => {
                    if tx.send(ev).is_err() {
                        break; // receiver dropped → program exiting
                    }
                }
                Err(_) => break,
            }
        }
    });

    let result = game_loop(&mut out, &mut game, &rx);

    // Always restore the terminal
    if keyboard_enhanced {
        let _ = out.execute(PopKeyboardEnhancementFlags);
    }
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    result
}
