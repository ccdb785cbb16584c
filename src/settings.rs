//! Game settings and preferences
//!
//! Persisted separately from game saves, through the [`KvStore`] boundary.

use serde::{Deserialize, Serialize};

use crate::platform::KvStore;
use crate::tuning::ArenaPreset;

/// Storage key for settings
const STORAGE_KEY: &str = "settings";

/// Effect quality levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Maximum live particles for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => 64,
            QualityPreset::Medium => 128,
            QualityPreset::High => 256,
        }
    }
}

/// Game settings/preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Arena layout for new runs
    pub arena: ArenaPreset,
    /// Effect quality preset
    pub quality: QualityPreset,

    // === Visual effects ===
    /// Screen shake on impacts and boss ceremony
    pub screen_shake: bool,
    /// Particle effects (blood, dust, muzzle flash)
    pub particles: bool,
    /// Floating damage numbers
    pub damage_text: bool,

    // === Audio ===
    /// Sound cues on/off
    pub sound: bool,

    // === Accessibility ===
    /// Reduced motion (minimize shake and flashes)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            arena: ArenaPreset::Classic,
            quality: QualityPreset::Medium,

            // Visual effects - all on by default
            screen_shake: true,
            particles: true,
            damage_text: true,

            // Audio
            sound: true,

            // Accessibility
            reduced_motion: false,
        }
    }
}

impl Settings {
    /// Effective screen shake (respects reduced_motion)
    pub fn effective_screen_shake(&self) -> bool {
        self.screen_shake && !self.reduced_motion
    }

    /// Effective particle count cap
    pub fn max_particles(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.quality.max_particles()
        }
    }

    /// Load settings; missing or unreadable data falls back to defaults
    pub fn load(store: &dyn KvStore) -> Self {
        if let Some(json) = store.get(STORAGE_KEY) {
            if let Ok(settings) = serde_json::from_str(&json) {
                return settings;
            }
            log::warn!("unreadable settings, using defaults");
        }
        Self::default()
    }

    /// Persist settings; failures are logged by the store
    pub fn save(&self, store: &mut dyn KvStore) {
        if let Ok(json) = serde_json::to_string(self) {
            store.set(STORAGE_KEY, &json);
        }
    }
}
