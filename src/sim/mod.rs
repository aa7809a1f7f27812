//! Per-frame simulation module
//!
//! All gameplay logic lives here. This module must stay pure:
//! - One step per frame, no substepping
//! - Seeded RNG only
//! - Obstacles evaluated in list (spawn) order
//! - No rendering or platform dependencies

pub mod collision;
pub mod spawn;
pub mod state;
pub mod tick;

pub use collision::{Aabb, Contact, ContactRules, resolve_contact, spike_hits};
pub use spawn::{Pattern, maybe_spawn, should_spawn, spawn_gap_ticks};
pub use state::{GameState, Obstacle, ObstacleKind, Particle, Player};
pub use tick::{TerminalCause, TickInput, TickOutcome, tick};
