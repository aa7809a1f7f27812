//! Obstacle spawning
//!
//! Appends one pattern at a time at `SPAWN_X` once the previous pattern has
//! scrolled far enough left and the minimum spawn gap has elapsed.

use rand::Rng;

use super::state::{GameState, Obstacle};
use crate::consts::*;
use crate::tuning::Tuning;

/// Obstacle pattern archetypes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// One spike on the floor
    SingleSpike,
    /// Three spikes side by side
    TripleSpike,
    /// A floor-level block, optionally followed by a spike
    Block { trailing_spike: bool },
    /// A raised platform with a spike under its trailing edge
    ElevatedPlatform,
}

impl Pattern {
    /// Pick an archetype uniformly
    pub fn random(rng: &mut impl Rng) -> Self {
        match rng.random_range(0..4) {
            0 => Pattern::SingleSpike,
            1 => Pattern::TripleSpike,
            2 => Pattern::Block {
                trailing_spike: rng.random_bool(0.5),
            },
            _ => Pattern::ElevatedPlatform,
        }
    }

    /// Instantiate the pattern with its left edge at `x`, resting on the floor line
    pub fn build(self, x: f32) -> Vec<Obstacle> {
        let ground = FLOOR_Y - SPIKE_SIZE;
        match self {
            Pattern::SingleSpike => vec![Obstacle::spike(x, ground)],
            Pattern::TripleSpike => (0..3)
                .map(|i| Obstacle::spike(x + i as f32 * SPIKE_SIZE, ground))
                .collect(),
            Pattern::Block { trailing_spike } => {
                let mut obstacles = vec![Obstacle::block(
                    x,
                    FLOOR_Y - BLOCK_SIZE,
                    BLOCK_SIZE,
                    BLOCK_SIZE,
                )];
                if trailing_spike {
                    obstacles.push(Obstacle::spike(x + BLOCK_SIZE, ground));
                }
                obstacles
            }
            Pattern::ElevatedPlatform => {
                let top = FLOOR_Y - PLATFORM_CLEARANCE - PLATFORM_HEIGHT;
                vec![
                    Obstacle::block(x, top, PLATFORM_WIDTH, PLATFORM_HEIGHT),
                    Obstacle::spike(x + PLATFORM_WIDTH - SPIKE_SIZE, ground),
                ]
            }
        }
    }
}

/// Minimum ticks between spawns at a given display score (shrinks, with a floor)
pub fn spawn_gap_ticks(score: u64, tuning: &Tuning) -> u64 {
    let reduction = score / tuning.spawn_gap_score_divisor.max(1);
    let base = u64::from(tuning.spawn_gap_ticks);
    base.saturating_sub(reduction)
        .max(u64::from(tuning.min_spawn_gap_ticks))
}

/// Whether a new pattern should be appended this tick
pub fn should_spawn(state: &GameState, tuning: &Tuning) -> bool {
    let clear_of_last = state
        .rightmost_obstacle_x()
        .is_none_or(|x| x < tuning.spawn_threshold_x);
    if !clear_of_last {
        return false;
    }
    match state.last_spawn_tick {
        Some(last) => state.time_ticks.saturating_sub(last) >= spawn_gap_ticks(state.score(), tuning),
        None => true,
    }
}

/// Append a random pattern if due. Returns the pattern spawned, if any.
pub fn maybe_spawn(state: &mut GameState, tuning: &Tuning) -> Option<Pattern> {
    if !should_spawn(state, tuning) {
        return None;
    }
    let pattern = Pattern::random(&mut state.rng);
    state.obstacles.extend(pattern.build(SPAWN_X));
    state.last_spawn_tick = Some(state.time_ticks);
    log::debug!("Spawned {:?} at tick {}", pattern, state.time_ticks);
    Some(pattern)
}
