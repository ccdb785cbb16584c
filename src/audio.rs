//! Audio cues
//!
//! The simulation never makes a sound; the shell derives cues from drained
//! [`GameEvent`]s and hands them to whatever [`AudioSink`] is installed.
//! Playback is fire-and-forget: a sink failure can cost a sound effect,
//! never a frame.

use crate::sim::{GameEvent, WeaponKind};

/// Named sound effects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    /// Pistol shot - dry crack
    PistolShot,
    /// Shotgun blast - wide boom
    ShotgunBlast,
    /// Railgun discharge - piercing whine
    RailgunWhine,
    /// Force push - bass shove
    ForceThump,
    /// Shock rifle - electric snap
    ShockSnap,
    /// Magazine swap
    ReloadClick,
    /// Player left the ground
    Jump,
    /// Player took damage
    PlayerHurt,
    /// Zombie went down
    ZombieDeath,
    /// Boss arrival or phase ceremony
    BossRoar,
    /// Boss defeat
    BossDeath,
    /// Weapon swapped off the ground
    Pickup,
    /// Level cleared fanfare
    LevelFanfare,
    /// Upgrade confirmed
    UpgradeDing,
    /// Run ended
    GameOverSting,
}

/// Map a game event to its cue; silent events map to None
pub fn cue_for_event(event: &GameEvent) -> Option<SoundCue> {
    match event {
        GameEvent::ShotFired { kind } => Some(match kind {
            WeaponKind::Pistol => SoundCue::PistolShot,
            WeaponKind::Shotgun => SoundCue::ShotgunBlast,
            WeaponKind::Railgun => SoundCue::RailgunWhine,
            WeaponKind::ForcePush => SoundCue::ForceThump,
            WeaponKind::ShockRifle => SoundCue::ShockSnap,
        }),
        GameEvent::ReloadStarted => Some(SoundCue::ReloadClick),
        GameEvent::PlayerJumped => Some(SoundCue::Jump),
        GameEvent::PlayerDamaged { .. } => Some(SoundCue::PlayerHurt),
        GameEvent::ZombieKilled { .. } => Some(SoundCue::ZombieDeath),
        GameEvent::WeaponPickedUp { .. } => Some(SoundCue::Pickup),
        GameEvent::BossSpawned => Some(SoundCue::BossRoar),
        GameEvent::BossPhaseChanged { .. } => Some(SoundCue::BossRoar),
        GameEvent::BossKilled => Some(SoundCue::BossDeath),
        GameEvent::LevelCleared { .. } => Some(SoundCue::LevelFanfare),
        GameEvent::UpgradeChosen { .. } => Some(SoundCue::UpgradeDing),
        GameEvent::GameOver { .. } => Some(SoundCue::GameOverSting),
        // PlayerDied rides along with GameOver; LevelStarted is silent
        GameEvent::PlayerDied | GameEvent::LevelStarted { .. } => None,
    }
}

/// Playback seam. Implementations must not block the game loop.
pub trait AudioSink {
    fn play(&mut self, cue: SoundCue);
}

/// Default sink: no sound hardware touched, cues traced at debug level
#[derive(Debug, Default)]
pub struct NullAudio;

impl AudioSink for NullAudio {
    fn play(&mut self, cue: SoundCue) {
        log::debug!("cue: {cue:?}");
    }
}
