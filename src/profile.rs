//! Lifetime player profile
//!
//! Aggregate stats across every run plus one-shot achievements. The shell
//! feeds drained [`GameEvent`]s through [`Profile::record_events`] each
//! frame and calls [`Profile::finalize_run`] once a run ends; both return
//! whatever unlocked so the HUD can announce it.

use serde::{Deserialize, Serialize};

use crate::platform::KvStore;
use crate::sim::{GameEvent, GameState};

/// Storage key for the profile
const STORAGE_KEY: &str = "profile";

/// One-shot unlocks, checked against lifetime stats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Achievement {
    FirstBlood,
    Combo10,
    Combo25,
    Combo50,
    Kills100,
    Kills500,
    Kills1000,
    Score10k,
    Score50k,
    Score100k,
    BossSlayer,
}

impl Achievement {
    pub fn title(&self) -> &'static str {
        match self {
            Achievement::FirstBlood => "First Blood",
            Achievement::Combo10 => "Chain Reaction",
            Achievement::Combo25 => "Unstoppable",
            Achievement::Combo50 => "Apocalypse Now",
            Achievement::Kills100 => "Century",
            Achievement::Kills500 => "Exterminator",
            Achievement::Kills1000 => "Legion Slayer",
            Achievement::Score10k => "Point Taken",
            Achievement::Score50k => "High Roller",
            Achievement::Score100k => "Six Figures",
            Achievement::BossSlayer => "Necromancer's Bane",
        }
    }
}

/// Lifetime aggregates and unlocked achievements
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Profile {
    /// Finished runs
    pub games_played: u64,
    /// Kills across all runs (zombies and bosses)
    pub total_kills: u64,
    /// Best combo streak ever reached
    pub best_combo: u32,
    /// Deepest level ever reached
    pub best_level: u32,
    /// Highest final score
    pub best_score: u64,
    /// Simulation ticks played across all runs
    pub play_ticks: u64,
    /// Unlock order is preserved for the profile screen
    pub unlocked: Vec<Achievement>,
}

impl Profile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, achievement: Achievement) -> bool {
        self.unlocked.contains(&achievement)
    }

    fn unlock(&mut self, achievement: Achievement, fresh: &mut Vec<Achievement>) {
        if !self.has(achievement) {
            log::info!("achievement unlocked: {}", achievement.title());
            self.unlocked.push(achievement);
            fresh.push(achievement);
        }
    }

    /// Fold a frame's drained events into the lifetime stats.
    /// Returns achievements that unlocked just now.
    pub fn record_events(&mut self, events: &[GameEvent]) -> Vec<Achievement> {
        let mut fresh = Vec::new();
        for event in events {
            match event {
                GameEvent::ZombieKilled { combo, .. } => {
                    self.total_kills += 1;
                    self.best_combo = self.best_combo.max(*combo);
                    self.unlock(Achievement::FirstBlood, &mut fresh);
                    if *combo >= 10 {
                        self.unlock(Achievement::Combo10, &mut fresh);
                    }
                    if *combo >= 25 {
                        self.unlock(Achievement::Combo25, &mut fresh);
                    }
                    if *combo >= 50 {
                        self.unlock(Achievement::Combo50, &mut fresh);
                    }
                }
                GameEvent::BossKilled => {
                    self.total_kills += 1;
                    self.unlock(Achievement::FirstBlood, &mut fresh);
                    self.unlock(Achievement::BossSlayer, &mut fresh);
                }
                _ => {}
            }
        }
        if self.total_kills >= 100 {
            self.unlock(Achievement::Kills100, &mut fresh);
        }
        if self.total_kills >= 500 {
            self.unlock(Achievement::Kills500, &mut fresh);
        }
        if self.total_kills >= 1000 {
            self.unlock(Achievement::Kills1000, &mut fresh);
        }
        fresh
    }

    /// Close out a finished run. Returns achievements that unlocked just now.
    pub fn finalize_run(&mut self, state: &GameState) -> Vec<Achievement> {
        let mut fresh = Vec::new();
        self.games_played += 1;
        self.best_level = self.best_level.max(state.level);
        self.best_score = self.best_score.max(state.score);
        self.play_ticks += state.time_ticks;
        if state.score >= 10_000 {
            self.unlock(Achievement::Score10k, &mut fresh);
        }
        if state.score >= 50_000 {
            self.unlock(Achievement::Score50k, &mut fresh);
        }
        if state.score >= 100_000 {
            self.unlock(Achievement::Score100k, &mut fresh);
        }
        fresh
    }

    /// Load the profile; missing or unreadable data starts fresh
    pub fn load(store: &dyn KvStore) -> Self {
        if let Some(json) = store.get(STORAGE_KEY) {
            if let Ok(profile) = serde_json::from_str::<Profile>(&json) {
                return profile;
            }
            log::warn!("unreadable profile, starting fresh");
        }
        Self::new()
    }

    /// Persist the profile; failures are logged by the store
    pub fn save(&self, store: &mut dyn KvStore) {
        if let Ok(json) = serde_json::to_string(self) {
            store.set(STORAGE_KEY, &json);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemStore;
    use crate::tuning::ArenaPreset;
    use glam::Vec2;

    fn kill(combo: u32) -> GameEvent {
        GameEvent::ZombieKilled {
            pos: Vec2::ZERO,
            combo,
        }
    }

    #[test]
    fn test_first_kill_unlocks_first_blood_once() {
        let mut profile = Profile::new();
        let fresh = profile.record_events(&[kill(1)]);
        assert_eq!(fresh, vec![Achievement::FirstBlood]);
        assert_eq!(profile.total_kills, 1);

        let again = profile.record_events(&[kill(2)]);
        assert!(again.is_empty());
        assert_eq!(profile.total_kills, 2);
    }

    #[test]
    fn test_combo_tiers_unlock_together_on_a_big_streak() {
        let mut profile = Profile::new();
        profile.unlocked.push(Achievement::FirstBlood);
        let fresh = profile.record_events(&[kill(50)]);
        assert!(fresh.contains(&Achievement::Combo10));
        assert!(fresh.contains(&Achievement::Combo25));
        assert!(fresh.contains(&Achievement::Combo50));
        assert_eq!(profile.best_combo, 50);
    }

    #[test]
    fn test_kill_milestones_track_lifetime_totals() {
        let mut profile = Profile::new();
        profile.total_kills = 99;
        let fresh = profile.record_events(&[kill(1)]);
        assert!(fresh.contains(&Achievement::Kills100));
        assert!(!profile.has(Achievement::Kills500));
    }

    #[test]
    fn test_boss_kill_counts_and_unlocks_slayer() {
        let mut profile = Profile::new();
        let fresh = profile.record_events(&[GameEvent::BossKilled]);
        assert!(fresh.contains(&Achievement::FirstBlood));
        assert!(fresh.contains(&Achievement::BossSlayer));
        assert_eq!(profile.total_kills, 1);
    }

    #[test]
    fn test_finalize_keeps_bests_and_score_tiers() {
        let mut profile = Profile::new();
        let mut state = GameState::new(1, ArenaPreset::Classic);
        state.score = 52_000;
        state.level = 9;
        state.time_ticks = 3600;

        let fresh = profile.finalize_run(&state);
        assert!(fresh.contains(&Achievement::Score10k));
        assert!(fresh.contains(&Achievement::Score50k));
        assert!(!profile.has(Achievement::Score100k));
        assert_eq!(profile.games_played, 1);
        assert_eq!(profile.best_level, 9);
        assert_eq!(profile.best_score, 52_000);
        assert_eq!(profile.play_ticks, 3600);

        // A weaker later run never lowers the bests
        let mut lesser = GameState::new(2, ArenaPreset::Classic);
        lesser.score = 100;
        lesser.level = 2;
        lesser.time_ticks = 600;
        profile.finalize_run(&lesser);
        assert_eq!(profile.best_level, 9);
        assert_eq!(profile.best_score, 52_000);
        assert_eq!(profile.play_ticks, 4200);
    }

    #[test]
    fn test_store_round_trip() {
        let mut store = MemStore::new();
        let mut profile = Profile::new();
        profile.record_events(&[kill(12)]);
        profile.save(&mut store);

        let loaded = Profile::load(&store);
        assert_eq!(loaded.total_kills, 1);
        assert!(loaded.has(Achievement::Combo10));
        assert!(loaded.has(Achievement::FirstBlood));
    }
}
