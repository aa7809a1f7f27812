//! Input mapping
//!
//! The game has a single binary "activate" action. Pointer, touch and the
//! Space key all feed it.

/// Edge of the activate action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activate {
    /// Start a session or jump
    Press,
    /// End the jump hold window
    Release,
}

/// Key that drives the activate action (`KeyboardEvent.key` value)
pub const ACTIVATE_KEY: &str = " ";

/// Map a DOM event type to an activate edge
pub fn activation_for_event(event_type: &str) -> Option<Activate> {
    match event_type {
        "mousedown" | "pointerdown" | "touchstart" => Some(Activate::Press),
        "mouseup" | "pointerup" | "touchend" | "touchcancel" => Some(Activate::Release),
        _ => None,
    }
}

/// Map a keyboard event to an activate edge. Auto-repeat keydowns are ignored
/// so holding Space does not re-trigger a jump on landing.
pub fn activation_for_key(event_type: &str, key: &str, repeat: bool) -> Option<Activate> {
    if key != ACTIVATE_KEY {
        return None;
    }
    match event_type {
        "keydown" if !repeat => Some(Activate::Press),
        "keyup" => Some(Activate::Release),
        _ => None,
    }
}
