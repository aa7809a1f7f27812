//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Frame scheduling (requestAnimationFrame on web, `ManualFrames` natively)
//! - Input events (`input`)
//! - Storage and leaderboard sync (`web`, wasm32 only)

pub mod input;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use input::{Activate, activation_for_key};

/// Identifies one scheduled frame callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameToken(pub u64);

/// Host frame scheduler. At most one frame is pending per session; a
/// cancelled token must never be delivered.
pub trait FrameScheduler {
    /// Schedule the next frame callback
    fn request_frame(&mut self) -> FrameToken;
    /// Cancel a pending callback (no-op if it already fired)
    fn cancel_frame(&mut self, token: FrameToken);
}

/// Scheduler driven by hand: the native demo loop and tests pull frames from it.
#[derive(Debug, Default)]
pub struct ManualFrames {
    next: u64,
    pending: Vec<FrameToken>,
}

impl ManualFrames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the oldest pending frame, as the host would when it fires
    pub fn fire(&mut self) -> Option<FrameToken> {
        if self.pending.is_empty() {
            None
        } else {
            Some(self.pending.remove(0))
        }
    }

    pub fn pending(&self) -> &[FrameToken] {
        &self.pending
    }
}

impl FrameScheduler for ManualFrames {
    fn request_frame(&mut self) -> FrameToken {
        self.next += 1;
        let token = FrameToken(self.next);
        self.pending.push(token);
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        self.pending.retain(|t| *t != token);
    }
}

/// Token bookkeeping for a host that identifies scheduled callbacks by a
/// numeric handle (requestAnimationFrame ids).
#[derive(Debug, Default)]
pub struct FrameHandles {
    next: u64,
    pending: Option<(FrameToken, i32)>,
}

impl FrameHandles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a token for a host request. A refused request leaves nothing
    /// pending, so a callback that will never fire is not waited on.
    pub fn issue<E: std::fmt::Debug>(&mut self, requested: Result<i32, E>) -> FrameToken {
        self.next += 1;
        let token = FrameToken(self.next);
        match requested {
            Ok(handle) => self.pending = Some((token, handle)),
            Err(e) => {
                log::error!("Host refused frame request: {:?}", e);
                self.pending = None;
            }
        }
        token
    }

    /// Forget `token` if it is pending; returns the host handle to cancel
    pub fn cancel(&mut self, token: FrameToken) -> Option<i32> {
        match self.pending {
            Some((pending, handle)) if pending == token => {
                self.pending = None;
                Some(handle)
            }
            _ => None,
        }
    }

    /// The pending token, consumed as its callback fires
    pub fn take_fired(&mut self) -> Option<FrameToken> {
        self.pending.take().map(|(token, _)| token)
    }

    pub fn pending(&self) -> Option<FrameToken> {
        self.pending.map(|(token, _)| token)
    }
}
