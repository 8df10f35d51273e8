//! # Camera Shake
//!
//! Screen-shake offset handed to the render collaborator.

use crate::Position;
use serde::{Deserialize, Serialize};

/// Pixels of shake magnitude lost per millisecond.
pub const SHAKE_DECAY_PER_MS: f32 = 0.02;

/// Magnitude applied when the player takes a hit.
pub const DAMAGE_SHAKE: f32 = 4.0;

/// Decaying camera shake.
///
/// The offset follows a fixed wobble so identical runs shake identically.
///
/// # Examples
///
/// ```
/// use delve::{CameraShake, Position};
///
/// let mut shake = CameraShake::new();
/// assert_eq!(shake.offset(), Position::new(0, 0));
/// shake.kick(4.0);
/// shake.decay(1000);
/// assert!(!shake.is_active());
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CameraShake {
    magnitude: f32,
    elapsed_ms: u32,
}

impl CameraShake {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a shake. A weaker kick never shortens a stronger one.
    pub fn kick(&mut self, magnitude: f32) {
        if magnitude > self.magnitude {
            self.magnitude = magnitude;
            self.elapsed_ms = 0;
        }
    }

    pub fn decay(&mut self, delta_ms: u32) {
        if !self.is_active() {
            return;
        }
        self.elapsed_ms = self.elapsed_ms.saturating_add(delta_ms);
        self.magnitude = (self.magnitude - delta_ms as f32 * SHAKE_DECAY_PER_MS).max(0.0);
    }

    pub fn magnitude(&self) -> f32 {
        self.magnitude
    }

    pub fn is_active(&self) -> bool {
        self.magnitude > 0.0
    }

    /// Pixel offset to add to the camera this frame.
    pub fn offset(&self) -> Position {
        if !self.is_active() {
            return Position::new(0, 0);
        }
        let phase = self.elapsed_ms as f32 * 0.09;
        Position::new(
            (self.magnitude * phase.sin()).round() as i32,
            (self.magnitude * (phase * 1.3).cos()).round() as i32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kick_offsets_camera() {
        let mut shake = CameraShake::new();
        shake.kick(DAMAGE_SHAKE);
        // cos(0) = 1, so the first frame is pushed down by the full magnitude.
        assert_eq!(shake.offset(), Position::new(0, 4));
    }

    #[test]
    fn test_decay_is_linear() {
        let mut shake = CameraShake::new();
        shake.kick(2.0);
        shake.decay(50);
        assert!((shake.magnitude() - 1.0).abs() < 1e-5);
        shake.decay(60);
        assert!(!shake.is_active());
        assert_eq!(shake.offset(), Position::new(0, 0));
    }

    #[test]
    fn test_weaker_kick_is_ignored() {
        let mut shake = CameraShake::new();
        shake.kick(4.0);
        shake.decay(10);
        shake.kick(1.0);
        assert!(shake.magnitude() > 3.0);
    }
}
