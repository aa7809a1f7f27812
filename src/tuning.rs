//! Data-driven game balance
//!
//! Every physics, spawn and leaderboard threshold lives here so the collision
//! margins can be tuned without touching the simulation. Persisted under its own
//! storage key; missing or corrupt data falls back to the defaults.

use serde::{Deserialize, Serialize};

use crate::highscores::{ARCHIVE_SIZE, MAX_NAME_LEN, VIEW_SIZE};
use crate::persistence::KeyValueStore;

/// Game balance and leaderboard limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Player physics ===
    /// Downward acceleration per tick
    pub gravity: f32,
    /// Vertical velocity set on jump (negative is up)
    pub jump_impulse: f32,
    /// Extra upward force on the first held tick, decays linearly to zero
    pub hold_boost: f32,
    /// Ticks the hold boost may apply after a jump
    pub max_hold_ticks: u32,
    /// Visual spin per airborne tick, degrees
    pub spin_per_tick: f32,
    /// How far below the floor the player may go before falling off the world
    pub fall_limit: f32,

    // === Collision ===
    /// Inset removed from every side of a spike's box before the lethal test
    pub spike_margin: f32,
    /// How far below a block's top the previous bottom edge may be and still land
    pub land_tolerance: f32,

    // === Difficulty ===
    /// Scroll speed at session start, pixels per tick
    pub initial_speed: f32,
    /// Speed added at each ramp step
    pub speed_increment: f32,
    /// Ticks between ramp steps
    pub speed_ramp_ticks: u64,

    // === Spawning ===
    /// Base minimum ticks between spawns
    pub spawn_gap_ticks: u32,
    /// Hard floor on the minimum spawn gap
    pub min_spawn_gap_ticks: u32,
    /// Display-score points per tick removed from the spawn gap
    pub spawn_gap_score_divisor: u64,
    /// Spawn only once the rightmost obstacle is left of this x
    pub spawn_threshold_x: f32,

    // === Leaderboard ===
    /// Entries in the visible top-N view
    pub leaderboard_view: usize,
    /// Entries kept in the shared archive
    pub leaderboard_archive: usize,
    /// Longest stored name, in characters
    pub max_name_len: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            gravity: 0.7,
            jump_impulse: -16.0,
            hold_boost: 0.6,
            max_hold_ticks: 12,
            spin_per_tick: 6.0,
            fall_limit: 200.0,

            spike_margin: 10.0,
            land_tolerance: 10.0,

            initial_speed: 6.0,
            speed_increment: 0.5,
            speed_ramp_ticks: 1000,

            spawn_gap_ticks: 90,
            min_spawn_gap_ticks: 36,
            spawn_gap_score_divisor: 5,
            spawn_threshold_x: 500.0,

            leaderboard_view: VIEW_SIZE,
            leaderboard_archive: ARCHIVE_SIZE,
            max_name_len: MAX_NAME_LEN,
        }
    }
}

impl Tuning {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "human_dash_tuning";

    /// Load tuning from storage, falling back to defaults
    pub fn load(store: &impl KeyValueStore) -> Self {
        match store.get_json::<Tuning>(Self::STORAGE_KEY) {
            Ok(Some(tuning)) => {
                log::info!("Loaded tuning overrides");
                tuning
            }
            Ok(None) => {
                log::info!("Using default tuning");
                Self::default()
            }
            Err(e) => {
                log::warn!("Ignoring stored tuning: {}", e);
                Self::default()
            }
        }
    }

    /// Save tuning to storage
    pub fn save(&self, store: &mut impl KeyValueStore) {
        match store.set_json(Self::STORAGE_KEY, self) {
            Ok(()) => log::info!("Tuning saved"),
            Err(e) => log::warn!("Tuning not saved: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    #[test]
    fn test_load_defaults_when_missing() {
        let store = MemoryStore::new();
        assert_eq!(Tuning::load(&store), Tuning::default());
    }

    #[test]
    fn test_save_then_load() {
        let mut store = MemoryStore::new();
        let tuning = Tuning {
            spike_margin: 4.0,
            ..Default::default()
        };
        tuning.save(&mut store);
        assert_eq!(Tuning::load(&store), tuning);
    }

    #[test]
    fn test_partial_overrides_fill_defaults() {
        let mut store = MemoryStore::new();
        store
            .set(Tuning::STORAGE_KEY, r#"{"gravity": 1.0}"#)
            .unwrap();
        let tuning = Tuning::load(&store);
        assert_eq!(tuning.gravity, 1.0);
        assert_eq!(tuning.jump_impulse, -16.0);
    }

    #[test]
    fn test_corrupt_data_falls_back() {
        let mut store = MemoryStore::new();
        store.set(Tuning::STORAGE_KEY, "][").unwrap();
        assert_eq!(Tuning::load(&store), Tuning::default());
    }
}
