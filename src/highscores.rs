//! High score leaderboard
//!
//! Top 10 finished runs, sorted descending by score, persisted through the
//! [`KvStore`] boundary.

use serde::{Deserialize, Serialize};

use crate::platform::KvStore;

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// Storage key for the leaderboard
const STORAGE_KEY: &str = "highscores";

/// A single high score entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighScoreEntry {
    /// Final score
    pub score: u64,
    /// Level reached
    pub level: u32,
    /// Total kills in the run
    pub kills: u32,
    /// Unix timestamp (seconds) when achieved
    pub timestamp: u64,
}

/// High score leaderboard
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    /// Create empty leaderboard
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a score qualifies for the leaderboard
    pub fn qualifies(&self, score: u64) -> bool {
        if score == 0 {
            return false;
        }
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        // Check if score beats the lowest entry
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Get the rank a score would achieve (1-indexed, None if doesn't qualify)
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Add a finished run to the leaderboard (if it qualifies)
    /// Returns the rank achieved (1-indexed) or None if it didn't qualify
    pub fn add_score(
        &mut self,
        score: u64,
        level: u32,
        kills: u32,
        timestamp: u64,
    ) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }

        let entry = HighScoreEntry {
            score,
            level,
            kills,
            timestamp,
        };

        // Find insertion point (sorted descending by score)
        let pos = self.entries.iter().position(|e| score > e.score);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };

        // Trim to max size
        self.entries.truncate(MAX_HIGH_SCORES);

        Some(rank)
    }

    /// Check if the leaderboard is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Load the leaderboard; a missing or unreadable entry starts fresh
    pub fn load(store: &dyn KvStore) -> Self {
        if let Some(json) = store.get(STORAGE_KEY) {
            if let Ok(scores) = serde_json::from_str::<HighScores>(&json) {
                log::info!("loaded {} high scores", scores.entries.len());
                return scores;
            }
            log::warn!("unreadable high scores, starting fresh");
        }
        Self::new()
    }

    /// Persist the leaderboard; failures are logged by the store
    pub fn save(&self, store: &mut dyn KvStore) {
        if let Ok(json) = serde_json::to_string(self) {
            store.set(STORAGE_KEY, &json);
        }
    }
}

/// Format a timestamp as a relative date string for the leaderboard screen
pub fn format_date(timestamp: u64, now: u64) -> String {
    let diff_secs = now.saturating_sub(timestamp);
    let diff_mins = diff_secs / 60;
    let diff_hours = diff_mins / 60;
    let diff_days = diff_hours / 24;

    if diff_days >= 1 {
        if diff_days == 1 {
            "yesterday".to_string()
        } else {
            format!("{diff_days} days ago")
        }
    } else if diff_hours >= 1 {
        if diff_hours == 1 {
            "1 hour ago".to_string()
        } else {
            format!("{diff_hours} hours ago")
        }
    } else if diff_mins >= 1 {
        if diff_mins == 1 {
            "1 min ago".to_string()
        } else {
            format!("{diff_mins} mins ago")
        }
    } else {
        "just now".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemStore;

    #[test]
    fn test_empty_board_takes_any_nonzero_score() {
        let board = HighScores::new();
        assert!(!board.qualifies(0));
        assert!(board.qualifies(1));
        assert_eq!(board.potential_rank(500), Some(1));
    }

    #[test]
    fn test_scores_stay_sorted_descending() {
        let mut board = HighScores::new();
        board.add_score(100, 2, 5, 0);
        board.add_score(300, 4, 20, 0);
        board.add_score(200, 3, 11, 0);

        let scores: Vec<u64> = board.entries.iter().map(|e| e.score).collect();
        assert_eq!(scores, vec![300, 200, 100]);
        assert_eq!(board.top_score(), Some(300));
    }

    #[test]
    fn test_rank_reported_one_indexed() {
        let mut board = HighScores::new();
        assert_eq!(board.add_score(100, 1, 1, 0), Some(1));
        assert_eq!(board.add_score(300, 1, 1, 0), Some(1));
        assert_eq!(board.add_score(200, 1, 1, 0), Some(2));
        assert_eq!(board.add_score(50, 1, 1, 0), Some(4));
    }

    #[test]
    fn test_board_caps_at_ten_entries() {
        let mut board = HighScores::new();
        for i in 1..=12u64 {
            board.add_score(i * 100, 1, 1, 0);
        }
        assert_eq!(board.entries.len(), MAX_HIGH_SCORES);
        // The two weakest runs fell off
        assert_eq!(board.entries.last().map(|e| e.score), Some(300));
        assert!(!board.qualifies(300));
        assert!(board.qualifies(301));
    }

    #[test]
    fn test_ties_rank_below_existing_entries() {
        let mut board = HighScores::new();
        board.add_score(200, 1, 1, 0);
        assert_eq!(board.add_score(200, 1, 1, 1), Some(2));
        // The earlier 200 keeps rank 1
        assert_eq!(board.entries[0].timestamp, 0);
    }

    #[test]
    fn test_store_round_trip() {
        let mut store = MemStore::new();
        let mut board = HighScores::new();
        board.add_score(4200, 5, 37, 1_700_000_000);
        board.save(&mut store);

        let loaded = HighScores::load(&store);
        assert_eq!(loaded.entries.len(), 1);
        assert_eq!(loaded.entries[0].score, 4200);
        assert_eq!(loaded.entries[0].level, 5);
        assert_eq!(loaded.entries[0].kills, 37);
    }

    #[test]
    fn test_unreadable_store_starts_fresh() {
        let mut store = MemStore::new();
        store.set("highscores", "semi[rubble");
        let loaded = HighScores::load(&store);
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_format_date_buckets() {
        let now = 1_000_000;
        assert_eq!(format_date(now, now), "just now");
        assert_eq!(format_date(now - 90, now), "1 min ago");
        assert_eq!(format_date(now - 7200, now), "2 hours ago");
        assert_eq!(format_date(now - 86_400, now), "yesterday");
        assert_eq!(format_date(now - 3 * 86_400, now), "3 days ago");
    }
}
