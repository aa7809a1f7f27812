//! Game session state machine
//!
//! Idle → Running → Over → (NameEntry on a new personal best) → Idle.
//! Retry re-enters Running from Over or NameEntry.
//!
//! The session owns the frame loop: each accepted frame runs one tick and
//! schedules the next. A frame is accepted only if its token is the one
//! currently pending, so a callback from a cancelled loop can never resume
//! play after a reset.

use chrono::{DateTime, Utc};

use crate::highscores::ScoreEntry;
use crate::persistence::{KeyValueStore, NoRemote, RemoteStore};
use crate::platform::{Activate, FrameScheduler, FrameToken};
use crate::sim::{GameState, TerminalCause, TickInput, TickOutcome, tick};
use crate::store::ScoreStore;
use crate::tuning::Tuning;

/// Session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No entities; start prompt showing
    Idle,
    /// Loop active
    Running,
    /// Loop stopped after a terminal collision
    Over,
    /// Prompting for a leaderboard name after a new personal best
    NameEntry,
}

/// Notifications for the UI layer
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Started { seed: u64 },
    GameOver { score: u64, cause: TerminalCause },
    NewRecord { score: u64 },
    Submitted { leaderboard: Vec<ScoreEntry> },
    Skipped,
}

/// One player's sequence of play-throughs
#[derive(Debug)]
pub struct Session<K, R = NoRemote> {
    tuning: Tuning,
    phase: Phase,
    game: Option<GameState>,
    input: TickInput,
    pending_frame: Option<FrameToken>,
    scores: ScoreStore<K, R>,
    final_score: u64,
    next_seed: u64,
}

impl<K: KeyValueStore, R: RemoteStore> Session<K, R> {
    pub fn new(tuning: Tuning, scores: ScoreStore<K, R>, seed: u64) -> Self {
        Self {
            tuning,
            phase: Phase::Idle,
            game: None,
            input: TickInput::default(),
            pending_frame: None,
            scores,
            final_score: 0,
            next_seed: seed,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Entities of the current or most recent play-through (None while Idle)
    pub fn game(&self) -> Option<&GameState> {
        self.game.as_ref()
    }

    /// Live display score, or the final score once the loop has stopped
    pub fn score(&self) -> u64 {
        match (&self.game, self.phase) {
            (Some(game), Phase::Running) => game.score(),
            _ => self.final_score,
        }
    }

    pub fn final_score(&self) -> u64 {
        self.final_score
    }

    pub fn pending_frame(&self) -> Option<FrameToken> {
        self.pending_frame
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn scores(&self) -> &ScoreStore<K, R> {
        &self.scores
    }

    pub fn scores_mut(&mut self) -> &mut ScoreStore<K, R> {
        &mut self.scores
    }

    /// Reset all entities and begin the loop. Valid from every phase except Running.
    pub fn start(&mut self, seed: u64, frames: &mut impl FrameScheduler) -> Option<SessionEvent> {
        if self.phase == Phase::Running {
            return None;
        }
        self.cancel_pending(frames);

        self.game = Some(GameState::new(seed, &self.tuning));
        self.input = TickInput::default();
        self.final_score = 0;
        self.phase = Phase::Running;
        self.pending_frame = Some(frames.request_frame());

        log::info!("Session started with seed {}", seed);
        Some(SessionEvent::Started { seed })
    }

    /// Restart from Over or NameEntry with a fresh seed
    pub fn retry(&mut self, frames: &mut impl FrameScheduler) -> Option<SessionEvent> {
        match self.phase {
            Phase::Over | Phase::NameEntry => {
                let seed = self.take_seed();
                self.start(seed, frames)
            }
            _ => None,
        }
    }

    /// Feed one edge of the activate action
    pub fn activate(&mut self, edge: Activate, frames: &mut impl FrameScheduler) -> Option<SessionEvent> {
        match (edge, self.phase) {
            (Activate::Press, Phase::Idle | Phase::Over) => {
                let seed = self.take_seed();
                self.start(seed, frames)
            }
            (Activate::Press, Phase::Running) => {
                self.input.held = true;
                if let Some(game) = self.game.as_mut() {
                    game.player.jump(self.tuning.jump_impulse);
                }
                None
            }
            (Activate::Release, _) => {
                self.input.held = false;
                if let Some(game) = self.game.as_mut() {
                    game.player.release();
                }
                None
            }
            (Activate::Press, Phase::NameEntry) => None,
        }
    }

    /// Deliver a fired frame callback. Stale or cancelled tokens are ignored.
    pub fn frame(&mut self, token: FrameToken, frames: &mut impl FrameScheduler) -> Vec<SessionEvent> {
        if self.phase != Phase::Running || self.pending_frame != Some(token) {
            log::debug!("Ignoring stale frame {:?}", token);
            return Vec::new();
        }
        self.pending_frame = None;

        let Some(game) = self.game.as_mut() else {
            return Vec::new();
        };

        match tick(game, &self.input, &self.tuning) {
            TickOutcome::Running => {
                self.pending_frame = Some(frames.request_frame());
                Vec::new()
            }
            TickOutcome::Terminal(cause) => self.finish(cause, frames),
            TickOutcome::Halted(cause) => {
                log::warn!("Frame delivered to a game already halted by {:?}", cause);
                self.finish(cause, frames)
            }
        }
    }

    /// Save the final score under `name` and return to Idle
    pub fn submit_name(&mut self, name: &str) -> Option<SessionEvent> {
        self.submit_name_at(name, Utc::now())
    }

    pub fn submit_name_at(&mut self, name: &str, now: DateTime<Utc>) -> Option<SessionEvent> {
        if self.phase != Phase::NameEntry {
            return None;
        }
        let leaderboard = self.scores.submit_at(name, self.final_score, now);
        self.to_idle();
        Some(SessionEvent::Submitted { leaderboard })
    }

    /// Leave NameEntry without saving a leaderboard entry. The personal best
    /// was already recorded when the session ended.
    pub fn skip_name(&mut self) -> Option<SessionEvent> {
        if self.phase != Phase::NameEntry {
            return None;
        }
        self.to_idle();
        Some(SessionEvent::Skipped)
    }

    /// Stop everything (the view is going away)
    /// An interrupted run keeps its score in `final_score` but is never
    /// recorded as a personal best.
    pub fn shutdown(&mut self, frames: &mut impl FrameScheduler) {
        self.cancel_pending(frames);
        if self.phase == Phase::Running {
            self.final_score = self.game.as_ref().map(GameState::score).unwrap_or(0);
        }
        self.input = TickInput::default();
        self.to_idle();
        log::info!("Session shut down at score {}", self.final_score);
    }

    fn finish(&mut self, cause: TerminalCause, frames: &mut impl FrameScheduler) -> Vec<SessionEvent> {
        // Stop the loop before anything else changes
        self.cancel_pending(frames);
        self.input = TickInput::default();

        let score = self.game.as_ref().map(GameState::score).unwrap_or(0);
        self.final_score = score;
        self.phase = Phase::Over;

        let mut events = vec![SessionEvent::GameOver { score, cause }];
        if self.scores.record_best(score) {
            self.phase = Phase::NameEntry;
            events.push(SessionEvent::NewRecord { score });
        }
        log::info!("Session over: score {}, phase {:?}", score, self.phase);
        events
    }

    fn to_idle(&mut self) {
        self.game = None;
        self.phase = Phase::Idle;
    }

    fn cancel_pending(&mut self, frames: &mut impl FrameScheduler) {
        if let Some(token) = self.pending_frame.take() {
            frames.cancel_frame(token);
        }
    }

    fn take_seed(&mut self) -> u64 {
        let seed = self.next_seed;
        self.next_seed = seed
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        seed
    }
}
