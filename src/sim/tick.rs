//! Per-frame simulation tick
//!
//! One call advances the session by one frame, in a fixed order:
//! physics, then collision, then pruning, then spawning and particles.
//! A terminal collision stops the tick on the spot.

use glam::Vec2;
use rand::Rng;

use super::collision::{Contact, ContactRules, resolve_contact};
use super::spawn::maybe_spawn;
use super::state::{GameState, ObstacleKind, Particle};
use crate::consts::*;
use crate::tuning::Tuning;

/// Input state for a single tick
#[derive(Debug, Clone, Copy, Default)]
pub struct TickInput {
    /// The activate action is held down (drives variable jump height)
    pub held: bool,
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalCause {
    Spike,
    Block,
    FellOffWorld,
}

/// Result of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The session continues
    Running,
    /// This tick ended the session
    Terminal(TerminalCause),
    /// The state was already halted by `cause`; nothing moved
    Halted(TerminalCause),
}

/// Advance the game state by one frame
pub fn tick(state: &mut GameState, input: &TickInput, tuning: &Tuning) -> TickOutcome {
    if let Some(cause) = state.halted {
        return TickOutcome::Halted(cause);
    }

    state.time_ticks += 1;
    if tuning.speed_ramp_ticks > 0 && state.time_ticks % tuning.speed_ramp_ticks == 0 {
        state.speed += tuning.speed_increment;
        log::debug!("Speed ramped to {:.1}", state.speed);
    }

    // --- PHYSICS ---
    let prev_bottom = state.player.bottom();
    if let Some(cause) = step_player(state, input, tuning) {
        return halt(state, cause);
    }
    for obstacle in &mut state.obstacles {
        obstacle.pos.x -= state.speed;
    }

    // --- COLLISION ---
    let rules = ContactRules {
        spike_margin: tuning.spike_margin,
        land_tolerance: tuning.land_tolerance,
    };
    for i in 0..state.obstacles.len() {
        let obstacle = &state.obstacles[i];
        match resolve_contact(&state.player, prev_bottom, obstacle, &rules) {
            Contact::None => {}
            Contact::Land { surface_y } => state.player.land_on(surface_y),
            Contact::Lethal => {
                let cause = match obstacle.kind {
                    ObstacleKind::Spike => TerminalCause::Spike,
                    ObstacleKind::Block => TerminalCause::Block,
                };
                return halt(state, cause);
            }
        }
    }

    let player_left = state.player.pos.x;
    for obstacle in &mut state.obstacles {
        if !obstacle.passed && obstacle.right() < player_left {
            obstacle.passed = true;
            state.obstacles_passed += 1;
        }
    }

    // --- PRUNE ---
    state.obstacles.retain(|o| !o.is_offscreen());

    // --- SPAWN ---
    maybe_spawn(state, tuning);
    update_particles(state);

    TickOutcome::Running
}

/// Gravity, hold boost, integration, floor contact and spin.
/// Returns a terminal cause if the player fell off the world.
fn step_player(state: &mut GameState, input: &TickInput, tuning: &Tuning) -> Option<TerminalCause> {
    let player = &mut state.player;

    if player.boosting {
        if input.held && player.hold_ticks < tuning.max_hold_ticks {
            let decay = 1.0 - player.hold_ticks as f32 / tuning.max_hold_ticks as f32;
            player.vel_y -= tuning.hold_boost * decay;
            player.hold_ticks += 1;
        } else {
            player.release();
        }
    }

    // Semi-implicit Euler: velocity first, then position
    player.vel_y += tuning.gravity;
    player.pos.y += player.vel_y;
    player.grounded = false;

    if player.pos.y > FLOOR_Y + tuning.fall_limit {
        return Some(TerminalCause::FellOffWorld);
    }

    if player.bottom() >= FLOOR_Y {
        player.land_on(FLOOR_Y);
    } else {
        player.spin(tuning.spin_per_tick);
    }
    None
}

fn halt(state: &mut GameState, cause: TerminalCause) -> TickOutcome {
    state.halted = Some(cause);
    log::info!(
        "Terminal collision ({:?}) at tick {}, score {}",
        cause,
        state.time_ticks,
        state.score()
    );
    TickOutcome::Terminal(cause)
}

/// Age the trail and emit a new particle every few ticks
fn update_particles(state: &mut GameState) {
    let speed = state.speed;
    for particle in state.particles.iter_mut() {
        particle.pos.x -= speed;
        particle.life -= PARTICLE_DECAY;
        particle.size *= PARTICLE_SHRINK;
    }
    state.particles.retain(|p| p.life > 0.0);

    if state.time_ticks % PARTICLE_INTERVAL_TICKS == 0 {
        let origin = Vec2::new(state.player.pos.x, state.player.center().y);
        let jitter = state.rng.random_range(-6.0..6.0);
        let size = 4.0 + state.rng.random::<f32>() * 4.0;
        state.particles.push(Particle {
            pos: origin + Vec2::new(0.0, jitter),
            life: 1.0,
            size,
            color: 0xff00ff,
        });
        if state.particles.len() > MAX_PARTICLES {
            let excess = state.particles.len() - MAX_PARTICLES;
            state.particles.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Obstacle;
    use proptest::prelude::*;

    fn fresh() -> (GameState, Tuning) {
        let tuning = Tuning::default();
        (GameState::new(12345, &tuning), tuning)
    }

    #[test]
    fn test_jump_then_gravity() {
        let (mut state, tuning) = fresh();
        let start_y = state.player.pos.y;
        assert!(state.player.jump(tuning.jump_impulse));
        state.player.release();

        tick(&mut state, &TickInput { held: false }, &tuning);
        assert!((state.player.vel_y - (-15.3)).abs() < 1e-4);
        assert!(state.player.pos.y < start_y);
        assert!(!state.player.grounded);
    }

    #[test]
    fn test_holding_jumps_higher() {
        let (mut short, tuning) = fresh();
        let mut long = short.clone();
        short.player.jump(tuning.jump_impulse);
        long.player.jump(tuning.jump_impulse);

        let mut short_peak = f32::MAX;
        let mut long_peak = f32::MAX;
        for _ in 0..30 {
            tick(&mut short, &TickInput { held: false }, &tuning);
            tick(&mut long, &TickInput { held: true }, &tuning);
            short.obstacles.clear();
            long.obstacles.clear();
            short_peak = short_peak.min(short.player.pos.y);
            long_peak = long_peak.min(long.player.pos.y);
        }
        assert!(long_peak < short_peak);
        assert_eq!(long.player.hold_ticks, tuning.max_hold_ticks);
    }

    #[test]
    fn test_lands_back_on_floor() {
        let (mut state, tuning) = fresh();
        state.player.jump(tuning.jump_impulse);
        for _ in 0..120 {
            tick(&mut state, &TickInput::default(), &tuning);
            state.obstacles.clear();
        }
        assert!(state.player.grounded);
        assert_eq!(state.player.bottom(), FLOOR_Y);
        assert_eq!(state.player.vel_y, 0.0);
        assert_eq!(state.player.rotation % 90.0, 0.0);
    }

    #[test]
    fn test_spins_while_airborne() {
        let (mut state, tuning) = fresh();
        state.player.jump(tuning.jump_impulse);
        tick(&mut state, &TickInput::default(), &tuning);
        assert_eq!(state.player.rotation, tuning.spin_per_tick);
    }

    #[test]
    fn test_spike_ends_session_and_halts() {
        let (mut state, tuning) = fresh();
        state.obstacles.push(Obstacle::spike(PLAYER_X + state.speed, FLOOR_Y - SPIKE_SIZE));
        let outcome = tick(&mut state, &TickInput::default(), &tuning);
        assert_eq!(outcome, TickOutcome::Terminal(TerminalCause::Spike));
        assert_eq!(state.halted, Some(TerminalCause::Spike));

        let player = state.player.clone();
        let obstacles = state.obstacles.clone();
        let ticks = state.time_ticks;
        for _ in 0..5 {
            assert_eq!(tick(&mut state, &TickInput::default(), &tuning), TickOutcome::Halted(TerminalCause::Spike));
        }
        assert_eq!(state.player, player);
        assert_eq!(state.obstacles, obstacles);
        assert_eq!(state.time_ticks, ticks);
    }

    #[test]
    fn test_first_terminal_in_list_order_wins() {
        let (mut state, tuning) = fresh();
        let x = PLAYER_X + state.speed;
        state.obstacles.push(Obstacle::block(x, FLOOR_Y - BLOCK_SIZE, BLOCK_SIZE, BLOCK_SIZE));
        state.obstacles.push(Obstacle::spike(x, FLOOR_Y - SPIKE_SIZE));
        let outcome = tick(&mut state, &TickInput::default(), &tuning);
        assert_eq!(outcome, TickOutcome::Terminal(TerminalCause::Block));
        // Pruning and spawning were skipped
        assert_eq!(state.obstacles.len(), 2);
    }

    #[test]
    fn test_lands_on_block() {
        let (mut state, tuning) = fresh();
        let top = 300.0;
        state.obstacles.push(Obstacle::block(PLAYER_X - 20.0, top, 400.0, 20.0));
        // Falling from just above the block
        state.player.pos.y = top - PLAYER_SIZE - 1.0;
        state.player.vel_y = 3.0;
        state.player.grounded = false;

        let outcome = tick(&mut state, &TickInput::default(), &tuning);
        assert_eq!(outcome, TickOutcome::Running);
        assert!(state.player.grounded);
        assert_eq!(state.player.bottom(), top);

        // Keeps riding the block
        for _ in 0..5 {
            assert_eq!(tick(&mut state, &TickInput::default(), &tuning), TickOutcome::Running);
            assert_eq!(state.player.bottom(), top);
        }
        assert!(state.player.jump(tuning.jump_impulse));
    }

    #[test]
    fn test_fall_off_world() {
        let (mut state, tuning) = fresh();
        state.player.pos.y = FLOOR_Y + tuning.fall_limit + 10.0;
        state.player.grounded = false;
        assert_eq!(
            tick(&mut state, &TickInput::default(), &tuning),
            TickOutcome::Terminal(TerminalCause::FellOffWorld)
        );
    }

    #[test]
    fn test_prunes_offscreen_and_marks_passed() {
        let (mut state, tuning) = fresh();
        state.obstacles.push(Obstacle::spike(-85.0, FLOOR_Y - SPIKE_SIZE));
        state.obstacles.push(Obstacle::spike(40.0, FLOOR_Y - SPIKE_SIZE));
        tick(&mut state, &TickInput::default(), &tuning);
        assert_eq!(state.obstacles_passed, 2);
        assert!(state.obstacles.iter().all(|o| o.pos.x > -80.0));
    }

    #[test]
    fn test_speed_ramps() {
        let (mut state, tuning) = fresh();
        state.time_ticks = tuning.speed_ramp_ticks - 1;
        tick(&mut state, &TickInput::default(), &tuning);
        assert_eq!(state.speed, tuning.initial_speed + tuning.speed_increment);
    }

    #[test]
    fn test_particles_are_capped_and_pruned() {
        let (mut state, tuning) = fresh();
        for _ in 0..300 {
            tick(&mut state, &TickInput::default(), &tuning);
            state.obstacles.clear();
            assert!(state.particles.len() <= MAX_PARTICLES);
            assert!(state.particles.iter().all(|p| p.life > 0.0));
        }
        assert!(!state.particles.is_empty());
    }

    #[test]
    fn test_same_seed_same_world() {
        let tuning = Tuning::default();
        let mut a = GameState::new(99999, &tuning);
        let mut b = GameState::new(99999, &tuning);
        for _ in 0..500 {
            let oa = tick(&mut a, &TickInput::default(), &tuning);
            let ob = tick(&mut b, &TickInput::default(), &tuning);
            assert_eq!(oa, ob);
        }
        assert_eq!(a.obstacles, b.obstacles);
        assert_eq!(a.time_ticks, b.time_ticks);
    }

    proptest! {
        #[test]
        fn prop_never_below_floor(inputs in proptest::collection::vec((any::<bool>(), any::<bool>()), 1..400)) {
            let (mut state, tuning) = fresh();
            for (press, held) in inputs {
                if press {
                    state.player.jump(tuning.jump_impulse);
                }
                let was_above = state.player.bottom() < FLOOR_Y;
                let outcome = tick(&mut state, &TickInput { held }, &tuning);
                state.obstacles.clear();

                prop_assert_eq!(outcome, TickOutcome::Running);
                prop_assert!(state.player.bottom() <= FLOOR_Y);
                if state.player.bottom() == FLOOR_Y {
                    prop_assert_eq!(state.player.vel_y, 0.0);
                    prop_assert!(state.player.grounded);
                } else if was_above {
                    prop_assert!(!state.player.grounded);
                }
            }
        }
    }
}
