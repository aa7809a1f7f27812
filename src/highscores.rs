//! High score leaderboard
//!
//! A ranked list sorted descending by score, capped at a fixed size. Ties keep
//! insertion order, so an earlier attempt outranks a later one with the same score.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Entries shown to players
pub const VIEW_SIZE: usize = 10;
/// Entries kept by the shared server-side archive
pub const ARCHIVE_SIZE: usize = 100;
/// Longest stored player name, in characters
pub const MAX_NAME_LEN: usize = 15;
/// Name used when the player leaves the field blank
pub const FALLBACK_NAME: &str = "ANONYMOUS";

/// A single leaderboard entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    /// Normalized player name
    pub name: String,
    pub score: u64,
    /// When the attempt was submitted (ISO-8601 on the wire)
    pub date: DateTime<Utc>,
}

impl ScoreEntry {
    /// Build an entry, normalizing the raw name.
    pub fn new(raw_name: &str, score: u64, date: DateTime<Utc>) -> Self {
        Self {
            name: normalize_name(raw_name, MAX_NAME_LEN),
            score,
            date,
        }
    }
}

/// Trim, uppercase, truncate to `max_len` characters, fall back to `ANONYMOUS`.
pub fn normalize_name(raw: &str, max_len: usize) -> String {
    let name: String = raw.trim().to_uppercase().chars().take(max_len).collect();
    if name.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        name
    }
}

/// Ranked, size-capped list of entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leaderboard {
    entries: Vec<ScoreEntry>,
    capacity: usize,
}

impl Leaderboard {
    /// Create an empty leaderboard holding at most `capacity` entries
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
        }
    }

    /// Build from an arbitrary entry set: stable sort, then truncate.
    pub fn from_entries(mut entries: Vec<ScoreEntry>, capacity: usize) -> Self {
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries.truncate(capacity);
        Self { entries, capacity }
    }

    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<ScoreEntry> {
        self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get the top score (if any)
    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }

    /// Check if a score would make it onto the board
    pub fn qualifies(&self, score: u64) -> bool {
        if self.entries.len() < self.capacity {
            return true;
        }
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Insert an entry in rank order and trim to capacity.
    /// Returns the rank achieved (1-indexed) or None if it fell off the end.
    pub fn insert(&mut self, entry: ScoreEntry) -> Option<usize> {
        // After every existing entry with an equal score
        let pos = self
            .entries
            .iter()
            .position(|e| entry.score > e.score)
            .unwrap_or(self.entries.len());

        self.entries.insert(pos, entry);
        self.entries.truncate(self.capacity);

        (pos < self.capacity).then_some(pos + 1)
    }

    /// The first `n` entries
    pub fn top(&self, n: usize) -> Vec<ScoreEntry> {
        self.entries.iter().take(n).cloned().collect()
    }
}
