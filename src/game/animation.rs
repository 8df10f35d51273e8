//! # Animation Module
//!
//! The fixed-duration animation clock and the per-entity visual interpolation it
//! drives. All positions here are in pixel space (`GRID_WIDTH` pixels per tile).

use crate::config::{BUMP_OFFSET, GRID_WIDTH};
use crate::{clamp_progress, int_bounce_tween, int_tween, Position};
use serde::{Deserialize, Serialize};

/// Pixel position of a grid cell.
pub fn grid_to_pixels(grid: Position) -> Position {
    Position::new(grid.x * GRID_WIDTH, grid.y * GRID_WIDTH)
}

/// Interpolation kind of an entity's current animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tween {
    /// Straight move from origin to target
    Linear,
    /// Out to the target and back at double speed; the entity does not relocate
    Bounce,
}

/// Visual position of an entity, separate from its logical grid position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualState {
    /// Where the sprite is drawn this frame
    pub current: Position,
    /// Where the animation started
    pub origin: Position,
    /// Where the animation is heading
    pub target: Position,
    pub tween: Tween,
}

impl VisualState {
    /// Visual state resting on a grid cell.
    pub fn at_grid(grid: Position) -> Self {
        let pixels = grid_to_pixels(grid);
        Self {
            current: pixels,
            origin: pixels,
            target: pixels,
            tween: Tween::Linear,
        }
    }

    /// Starts a linear move toward a grid cell.
    pub fn animate_to_grid(&mut self, grid: Position) {
        self.origin = self.current;
        self.target = grid_to_pixels(grid);
        self.tween = Tween::Linear;
    }

    /// Starts a bump toward `delta` without leaving the current cell.
    pub fn bump(&mut self, delta: Position) {
        self.origin = self.current;
        self.target = Position::new(
            self.current.x + delta.x * BUMP_OFFSET,
            self.current.y + delta.y * BUMP_OFFSET,
        );
        self.tween = Tween::Bounce;
    }

    /// Applies clock progress to the drawn position.
    pub fn update(&mut self, progress: f32) {
        let progress = clamp_progress(progress);
        self.current = match self.tween {
            Tween::Linear => Position::new(
                int_tween(self.origin.x, self.target.x, progress),
                int_tween(self.origin.y, self.target.y, progress),
            ),
            Tween::Bounce => {
                let progress = clamp_progress(progress * 2.0);
                Position::new(
                    int_bounce_tween(self.origin.x, self.target.x, progress),
                    int_bounce_tween(self.origin.y, self.target.y, progress),
                )
            }
        };
    }

    /// Ends the animation: the drawn position settles with no residual drift.
    ///
    /// A linear move settles on its target, a bump settles back on its origin.
    pub fn finish(&mut self) {
        let rest = match self.tween {
            Tween::Linear => self.target,
            Tween::Bounce => self.origin,
        };
        self.current = rest;
        self.origin = rest;
        self.target = rest;
        self.tween = Tween::Linear;
    }

    /// Whether the sprite still has somewhere to go.
    pub fn is_moving(&self) -> bool {
        self.origin != self.target
    }
}

/// Phase of the turn controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockPhase {
    /// Accepting input; the move queue may be drained
    Idle,
    /// Interpolating; movement input is buffered
    Animating,
}

/// Result of advancing the clock by one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClockStep {
    /// Nothing is animating
    Idle,
    /// Animation in progress at the given progress
    Progress(f32),
    /// Progress reached 1 on this step; reported exactly once per animation
    Completed,
}

/// Fixed-duration animation clock.
///
/// # Examples
///
/// ```
/// use delve::{AnimationClock, ClockStep};
///
/// let mut clock = AnimationClock::new(100);
/// clock.start();
/// assert_eq!(clock.advance(40), ClockStep::Progress(0.4));
/// assert_eq!(clock.advance(80), ClockStep::Completed);
/// assert_eq!(clock.advance(16), ClockStep::Idle);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationClock {
    duration_ms: u32,
    elapsed_ms: u32,
    phase: ClockPhase,
}

impl AnimationClock {
    /// Creates an idle clock. A zero duration completes on the first advance.
    pub fn new(duration_ms: u32) -> Self {
        Self {
            duration_ms,
            elapsed_ms: 0,
            phase: ClockPhase::Idle,
        }
    }

    /// Whether an animation is running.
    pub fn is_animating(&self) -> bool {
        self.phase == ClockPhase::Animating
    }

    /// Starts a new animation with elapsed time reset to zero.
    pub fn start(&mut self) {
        self.phase = ClockPhase::Animating;
        self.elapsed_ms = 0;
    }

    /// Progress of the running animation, `0..=1`.
    pub fn progress(&self) -> f32 {
        if self.duration_ms == 0 {
            return 1.0;
        }
        (self.elapsed_ms as f32 / self.duration_ms as f32).min(1.0)
    }

    /// Accumulates frame time and reports where the animation stands.
    pub fn advance(&mut self, delta_ms: u32) -> ClockStep {
        if self.phase == ClockPhase::Idle {
            return ClockStep::Idle;
        }
        self.elapsed_ms = self.elapsed_ms.saturating_add(delta_ms);
        let progress = self.progress();
        if progress >= 1.0 {
            self.phase = ClockPhase::Idle;
            self.elapsed_ms = 0;
            ClockStep::Completed
        } else {
            ClockStep::Progress(progress)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_move_settles_on_target() {
        let mut visual = VisualState::at_grid(Position::new(2, 2));
        visual.animate_to_grid(Position::new(3, 2));
        visual.update(0.5);
        assert_eq!(visual.current, Position::new(35, 28));
        visual.update(1.0);
        visual.finish();
        assert_eq!(visual.current, Position::new(42, 28));
        assert!(!visual.is_moving());
    }

    #[test]
    fn test_bump_returns_to_origin() {
        let mut visual = VisualState::at_grid(Position::new(2, 2));
        visual.bump(Position::new(1, 0));
        assert_eq!(visual.tween, Tween::Bounce);

        visual.update(0.25);
        assert_eq!(visual.current, Position::new(28 + 5, 28));

        visual.update(0.6);
        assert_eq!(visual.current, Position::new(28, 28));

        visual.finish();
        assert_eq!(visual.current, Position::new(28, 28));
        assert_eq!(visual.target, Position::new(28, 28));
    }

    #[test]
    fn test_clock_completes_exactly_once() {
        let mut clock = AnimationClock::new(112);
        clock.start();

        let mut completions = 0;
        for _ in 0..20 {
            if clock.advance(16) == ClockStep::Completed {
                completions += 1;
            }
        }
        assert_eq!(completions, 1);
        assert!(!clock.is_animating());
    }

    #[test]
    fn test_clock_completes_on_single_large_step() {
        let mut clock = AnimationClock::new(112);
        clock.start();
        assert_eq!(clock.advance(500), ClockStep::Completed);
        assert_eq!(clock.advance(500), ClockStep::Idle);
    }

    #[test]
    fn test_restart_resets_elapsed() {
        let mut clock = AnimationClock::new(100);
        clock.start();
        clock.advance(60);
        clock.start();
        assert_eq!(clock.progress(), 0.0);
    }
}
