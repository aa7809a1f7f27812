//! Collision detection for axis-aligned boxes
//!
//! Two policies:
//! - Spikes kill only when the player's center enters the spike's box shrunk by
//!   a margin on every side, so grazing contact is forgiven.
//! - Blocks are platforms when approached from above, lethal otherwise.

use glam::Vec2;

use super::state::{Obstacle, ObstacleKind, Player};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    /// Box from a top-left corner and a size
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self {
            min: pos,
            max: pos + size,
        }
    }

    /// Strict overlap: boxes that only share an edge do not overlap
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    /// Strict containment of a point
    pub fn contains(&self, point: Vec2) -> bool {
        point.x > self.min.x && point.x < self.max.x && point.y > self.min.y && point.y < self.max.y
    }

    /// Shrink by `margin` on all sides (collapses to a point, never inverts)
    pub fn inset(&self, margin: f32) -> Aabb {
        let center = (self.min + self.max) * 0.5;
        let min = (self.min + Vec2::splat(margin)).min(center);
        let max = (self.max - Vec2::splat(margin)).max(center);
        Aabb { min, max }
    }
}

/// What a single player/obstacle pair resolves to
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Contact {
    /// No interaction
    None,
    /// Player lands on a block whose top is at this y
    Land { surface_y: f32 },
    /// The session ends
    Lethal,
}

/// Thresholds for contact resolution
#[derive(Debug, Clone, Copy)]
pub struct ContactRules {
    pub spike_margin: f32,
    pub land_tolerance: f32,
}

/// Spike test: player center inside the spike's inset box
pub fn spike_hits(player: &Player, spike: &Obstacle, margin: f32) -> bool {
    spike.bounds().inset(margin).contains(player.center())
}

/// Resolve one obstacle against the player.
///
/// `prev_bottom` is the player's bottom edge before this tick's integration.
pub fn resolve_contact(
    player: &Player,
    prev_bottom: f32,
    obstacle: &Obstacle,
    rules: &ContactRules,
) -> Contact {
    match obstacle.kind {
        ObstacleKind::Spike => {
            if spike_hits(player, obstacle, rules.spike_margin) {
                Contact::Lethal
            } else {
                Contact::None
            }
        }
        ObstacleKind::Block => {
            if !player.bounds().overlaps(&obstacle.bounds()) {
                return Contact::None;
            }
            let top = obstacle.pos.y;
            let falling = player.vel_y > 0.0;
            if falling && prev_bottom <= top + rules.land_tolerance {
                Contact::Land { surface_y: top }
            } else {
                Contact::Lethal
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;

    const RULES: ContactRules = ContactRules {
        spike_margin: 10.0,
        land_tolerance: 10.0,
    };

    fn player_at(x: f32, y: f32, vel_y: f32) -> Player {
        Player {
            pos: Vec2::new(x, y),
            vel_y,
            grounded: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_overlap_is_strict() {
        let a = Aabb::new(Vec2::ZERO, Vec2::splat(10.0));
        let touching = Aabb::new(Vec2::new(10.0, 0.0), Vec2::splat(10.0));
        let overlapping = Aabb::new(Vec2::new(9.0, 9.0), Vec2::splat(10.0));
        assert!(!a.overlaps(&touching));
        assert!(a.overlaps(&overlapping));
    }

    #[test]
    fn test_inset_never_inverts() {
        let b = Aabb::new(Vec2::ZERO, Vec2::splat(10.0));
        let shrunk = b.inset(20.0);
        assert_eq!(shrunk.min, Vec2::splat(5.0));
        assert_eq!(shrunk.max, Vec2::splat(5.0));
        assert!(!shrunk.contains(Vec2::splat(5.0)));
    }

    #[test]
    fn test_spike_edge_touch_is_safe() {
        // Player's right edge touches the spike's left edge
        let spike = Obstacle::spike(PLAYER_X + PLAYER_SIZE, FLOOR_Y - SPIKE_SIZE);
        let player = player_at(PLAYER_X, FLOOR_Y - PLAYER_SIZE, 0.0);
        assert_eq!(resolve_contact(&player, player.bottom(), &spike, &RULES), Contact::None);

        // Boxes overlap by 15px but the center stays outside the inset box
        let spike = Obstacle::spike(PLAYER_X + 25.0, FLOOR_Y - SPIKE_SIZE);
        assert!(player.bounds().overlaps(&spike.bounds()));
        assert_eq!(resolve_contact(&player, player.bottom(), &spike, &RULES), Contact::None);
    }

    #[test]
    fn test_spike_center_overlap_kills() {
        let spike = Obstacle::spike(PLAYER_X, FLOOR_Y - SPIKE_SIZE);
        let player = player_at(PLAYER_X, FLOOR_Y - PLAYER_SIZE, 0.0);
        assert_eq!(resolve_contact(&player, player.bottom(), &spike, &RULES), Contact::Lethal);
    }

    #[test]
    fn test_block_landing_from_above() {
        let block = Obstacle::block(PLAYER_X, 300.0, BLOCK_SIZE, BLOCK_SIZE);
        // Was 2px above the top, now 5px into it
        let player = player_at(PLAYER_X, 265.0, 7.0);
        assert_eq!(
            resolve_contact(&player, 298.0, &block, &RULES),
            Contact::Land { surface_y: 300.0 }
        );
    }

    #[test]
    fn test_block_side_hit_is_lethal() {
        let block = Obstacle::block(PLAYER_X + 30.0, FLOOR_Y - BLOCK_SIZE, BLOCK_SIZE, BLOCK_SIZE);
        let player = player_at(PLAYER_X, FLOOR_Y - PLAYER_SIZE, 0.0);
        assert_eq!(
            resolve_contact(&player, player.bottom(), &block, &RULES),
            Contact::Lethal
        );
    }

    #[test]
    fn test_block_hit_from_below_is_lethal() {
        let block = Obstacle::block(PLAYER_X, 250.0, 120.0, 30.0);
        // Rising into the underside
        let player = player_at(PLAYER_X, 275.0, -10.0);
        assert_eq!(resolve_contact(&player, 325.0, &block, &RULES), Contact::Lethal);
    }

    #[test]
    fn test_block_landing_outside_tolerance_is_lethal() {
        let block = Obstacle::block(PLAYER_X, 300.0, BLOCK_SIZE, BLOCK_SIZE);
        // Previous bottom was 15px below the top: came in from the side
        let player = player_at(PLAYER_X, 280.0, 5.0);
        assert_eq!(resolve_contact(&player, 315.0, &block, &RULES), Contact::Lethal);
    }
}
