//! Human Dash - a one-button side-scrolling arcade game
//!
//! Core modules:
//! - `sim`: Per-frame simulation (physics, collisions, obstacle spawning)
//! - `session`: Idle/Running/Over/NameEntry state machine driving the loop
//! - `store`: Two-tier score store (personal best + ranked leaderboard)
//! - `api`: Leaderboard read/write request handlers
//! - `platform`: Frame scheduling, input mapping, browser bindings
//! - `persistence`: Key/value and remote storage backends
//! - `tuning`: Data-driven game balance

pub mod api;
pub mod highscores;
pub mod persistence;
pub mod platform;
pub mod session;
pub mod sim;
pub mod store;
pub mod tuning;

pub use highscores::{Leaderboard, ScoreEntry};
pub use session::{Phase, Session, SessionEvent};
pub use store::ScoreStore;
pub use tuning::Tuning;

/// Game configuration constants
pub mod consts {
    /// Logical drawing surface
    pub const SURFACE_WIDTH: f32 = 800.0;
    pub const SURFACE_HEIGHT: f32 = 500.0;

    /// Floor line (y grows downward)
    pub const FLOOR_Y: f32 = 400.0;

    /// Player defaults - fixed horizontal position, only y moves
    pub const PLAYER_X: f32 = 100.0;
    pub const PLAYER_SIZE: f32 = 40.0;

    /// Obstacle geometry
    pub const SPIKE_SIZE: f32 = 40.0;
    pub const BLOCK_SIZE: f32 = 40.0;
    pub const PLATFORM_WIDTH: f32 = 120.0;
    pub const PLATFORM_HEIGHT: f32 = 30.0;
    /// Gap between the floor and an elevated platform's underside
    pub const PLATFORM_CLEARANCE: f32 = 80.0;

    /// Obstacles enter here, off the right edge
    pub const SPAWN_X: f32 = 900.0;
    /// Obstacles are dropped once their right edge passes this x
    pub const DESPAWN_X: f32 = -50.0;

    /// Ticks per display-score point
    pub const TICKS_PER_POINT: u64 = 10;

    /// Particle trail
    pub const PARTICLE_INTERVAL_TICKS: u64 = 3;
    pub const PARTICLE_DECAY: f32 = 0.05;
    pub const PARTICLE_SHRINK: f32 = 0.96;
    pub const MAX_PARTICLES: usize = 64;
}

/// Normalize an angle in degrees to [0, 360)
#[inline]
pub fn normalize_degrees(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Snap an angle in degrees to the nearest quarter turn, normalized to [0, 360)
#[inline]
pub fn snap_quarter_turn(angle: f32) -> f32 {
    normalize_degrees((normalize_degrees(angle) / 90.0).round() * 90.0)
}
