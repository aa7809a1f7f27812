//! Two-tier score store
//!
//! The local tier holds the device's personal best and a fallback snapshot of
//! the top-N view. The remote tier, when reachable, is the canonical merge
//! target: submissions read it, insert, truncate and write it back. Remote
//! failures are logged and absorbed; callers always get a list.

use chrono::{DateTime, Utc};

use crate::highscores::{Leaderboard, ScoreEntry, normalize_name};
use crate::persistence::{KeyValueStore, NoRemote, RemoteStore};
use crate::tuning::Tuning;

/// Personal best and leaderboard, local cache plus optional shared copy
#[derive(Debug)]
pub struct ScoreStore<K, R = NoRemote> {
    local: K,
    remote: R,
    view_size: usize,
    archive_size: usize,
    max_name_len: usize,
    best: u64,
    cache: Leaderboard,
}

impl<K: KeyValueStore, R: RemoteStore> ScoreStore<K, R> {
    /// Personal best key
    pub const BEST_KEY: &'static str = "hi_score";
    /// Fallback leaderboard snapshot key
    pub const CACHE_KEY: &'static str = "leaderboard";

    /// Open the store, reading the personal best and cached snapshot
    pub fn open(local: K, remote: R, tuning: &Tuning) -> Self {
        let best: u64 = match local.get(Self::BEST_KEY) {
            Ok(Some(raw)) => raw.trim().parse().unwrap_or_else(|_| {
                log::warn!("Ignoring unreadable personal best {:?}", raw);
                0
            }),
            Ok(None) => 0,
            Err(e) => {
                log::warn!("Personal best unavailable: {}", e);
                0
            }
        };

        let cached = match local.get_json::<Vec<ScoreEntry>>(Self::CACHE_KEY) {
            Ok(entries) => entries.unwrap_or_default(),
            Err(e) => {
                log::warn!("Leaderboard snapshot unavailable: {}", e);
                Vec::new()
            }
        };
        let cache = Leaderboard::from_entries(cached, tuning.leaderboard_view);
        log::info!(
            "Score store opened (best {}, {} cached entries, top {:?})",
            best,
            cache.len(),
            cache.top_score()
        );

        Self {
            local,
            remote,
            view_size: tuning.leaderboard_view,
            archive_size: tuning.leaderboard_archive,
            max_name_len: tuning.max_name_len,
            best,
            cache,
        }
    }

    pub fn personal_best(&self) -> u64 {
        self.best
    }

    /// Record a finished attempt's score as the personal best if it is strictly
    /// higher. Returns true for a new record.
    pub fn record_best(&mut self, score: u64) -> bool {
        if score <= self.best {
            return false;
        }
        self.best = score;
        if let Err(e) = self.local.set(Self::BEST_KEY, &score.to_string()) {
            log::warn!("Personal best not persisted: {}", e);
        }
        log::info!("New personal best: {}", score);
        true
    }

    /// Submit a score now. See `submit_at`.
    pub fn submit(&mut self, name: &str, score: u64) -> Vec<ScoreEntry> {
        self.submit_at(name, score, Utc::now())
    }

    /// Normalize the name, merge the entry into the canonical list, persist
    /// both tiers, and return the top-N view.
    pub fn submit_at(&mut self, name: &str, score: u64, now: DateTime<Utc>) -> Vec<ScoreEntry> {
        let entry = ScoreEntry {
            name: normalize_name(name, self.max_name_len),
            score,
            date: now,
        };

        // Read-merge-write against the remote when it answers, otherwise
        // merge into the local snapshot only. Never write a remote we could not read.
        let (base, remote_readable) = match self.remote.load() {
            Ok(entries) => (entries, true),
            Err(e) => {
                log::warn!("Remote leaderboard unavailable, submitting locally: {}", e);
                (self.cache.entries().to_vec(), false)
            }
        };

        let mut board = Leaderboard::from_entries(base, self.archive_size);
        if !board.qualifies(score) {
            log::debug!("Score {} is below the archive cutoff", score);
        }
        let rank = board.insert(entry);

        if remote_readable {
            if let Err(e) = self.remote.save(board.entries()) {
                log::warn!("Remote leaderboard not saved: {}", e);
            }
        }

        self.replace_cache(board.top(self.view_size));
        log::info!("Score {} submitted (rank {:?})", score, rank);
        self.cached()
    }

    /// Current top-N view, refreshed from the remote when possible
    pub fn fetch(&mut self) -> Vec<ScoreEntry> {
        match self.remote.load() {
            Ok(entries) => self.replace_cache(entries),
            Err(e) => log::warn!("Remote leaderboard unavailable, using cache: {}", e),
        }
        self.cached()
    }

    /// The locally cached top-N view, without touching the remote
    pub fn cached(&self) -> Vec<ScoreEntry> {
        self.cache.top(self.view_size)
    }

    /// Replace the local snapshot with a list obtained out of band
    /// (e.g. an asynchronous response from the leaderboard endpoint)
    pub fn absorb(&mut self, entries: Vec<ScoreEntry>) {
        self.replace_cache(entries);
    }

    pub fn local(&self) -> &K {
        &self.local
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn remote_mut(&mut self) -> &mut R {
        &mut self.remote
    }

    fn replace_cache(&mut self, entries: Vec<ScoreEntry>) {
        self.cache = Leaderboard::from_entries(entries, self.view_size);
        if let Err(e) = self.local.set_json(Self::CACHE_KEY, &self.cache.entries()) {
            log::warn!("Leaderboard snapshot not persisted: {}", e);
        }
    }
}
