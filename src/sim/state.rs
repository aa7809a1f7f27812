//! Game state and core simulation types
//!
//! One `GameState` per session. It owns the player, the obstacle list and the
//! particle trail, and is mutated in place by `tick`.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::Aabb;
use super::tick::TerminalCause;
use crate::consts::*;
use crate::tuning::Tuning;
use crate::{normalize_degrees, snap_quarter_turn};

/// The player's runner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Top-left corner
    pub pos: Vec2,
    pub size: Vec2,
    /// Vertical velocity (positive is down)
    pub vel_y: f32,
    /// Visual spin, degrees in [0, 360)
    pub rotation: f32,
    /// Standing on the floor or a block; a jump is possible
    pub grounded: bool,
    /// Ticks of hold boost already applied for the current jump
    pub hold_ticks: u32,
    /// Whether the current jump may still receive hold boost
    pub boosting: bool,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            pos: Vec2::new(PLAYER_X, FLOOR_Y - PLAYER_SIZE),
            size: Vec2::splat(PLAYER_SIZE),
            vel_y: 0.0,
            rotation: 0.0,
            grounded: true,
            hold_ticks: 0,
            boosting: false,
        }
    }
}

impl Player {
    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.pos, self.size)
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }

    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    /// Apply the jump impulse. Returns false (and does nothing) while airborne.
    pub fn jump(&mut self, impulse: f32) -> bool {
        if !self.grounded {
            return false;
        }
        self.vel_y = impulse;
        self.grounded = false;
        self.hold_ticks = 0;
        self.boosting = true;
        true
    }

    /// End the hold window early (input released)
    pub fn release(&mut self) {
        self.boosting = false;
    }

    /// Put the player's bottom edge on `surface_y` and stop vertical motion
    pub fn land_on(&mut self, surface_y: f32) {
        self.pos.y = surface_y - self.size.y;
        self.vel_y = 0.0;
        self.grounded = true;
        self.boosting = false;
        self.rotation = snap_quarter_turn(self.rotation);
    }

    /// Advance the airborne spin
    pub fn spin(&mut self, degrees: f32) {
        self.rotation = normalize_degrees(self.rotation + degrees);
    }
}

/// Obstacle types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleKind {
    /// Lethal on center-point contact with its inset box
    Spike,
    /// Solid: can be landed on from above, lethal from any other side
    Block,
}

/// An obstacle entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub kind: ObstacleKind,
    /// Top-left corner
    pub pos: Vec2,
    pub size: Vec2,
    /// The player has moved fully past this obstacle
    pub passed: bool,
}

impl Obstacle {
    pub fn new(kind: ObstacleKind, pos: Vec2, size: Vec2) -> Self {
        Self {
            kind,
            pos,
            size,
            passed: false,
        }
    }

    pub fn spike(x: f32, y: f32) -> Self {
        Self::new(ObstacleKind::Spike, Vec2::new(x, y), Vec2::splat(SPIKE_SIZE))
    }

    pub fn block(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(ObstacleKind::Block, Vec2::new(x, y), Vec2::new(width, height))
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.pos, self.size)
    }

    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    /// Scrolled fully off the left edge
    pub fn is_offscreen(&self) -> bool {
        self.right() < DESPAWN_X
    }
}

/// A trail particle (not gameplay-affecting)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub life: f32, // 0-1, decreases over time
    pub size: f32,
    pub color: u32,
}

/// Complete per-session state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Scroll speed, pixels per tick
    pub speed: f32,
    /// Tick of the most recent spawn
    pub last_spawn_tick: Option<u64>,
    pub player: Player,
    /// Ordered by spawn time
    pub obstacles: Vec<Obstacle>,
    pub particles: Vec<Particle>,
    /// Obstacles the player has cleared (tracked, not scored)
    pub obstacles_passed: u32,
    /// Set by a terminal collision; no further ticks run
    pub halted: Option<TerminalCause>,
}

impl GameState {
    /// Create a fresh session state with the given seed
    pub fn new(seed: u64, tuning: &Tuning) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            time_ticks: 0,
            speed: tuning.initial_speed,
            last_spawn_tick: None,
            player: Player::default(),
            obstacles: Vec::new(),
            particles: Vec::new(),
            obstacles_passed: 0,
            halted: None,
        }
    }

    /// Display score: ticks survived scaled down, floored
    pub fn score(&self) -> u64 {
        self.time_ticks / TICKS_PER_POINT
    }

    /// x of the rightmost obstacle, if any
    pub fn rightmost_obstacle_x(&self) -> Option<f32> {
        self.obstacles.iter().map(|o| o.pos.x).reduce(f32::max)
    }
}
