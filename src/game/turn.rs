//! # Turn Module
//!
//! Buffered player moves and the types the tick loop reports back.

use crate::{EntityId, Position};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Bounded FIFO of pending player moves.
///
/// Moves pushed while the queue is full are dropped rather than buffered.
///
/// # Examples
///
/// ```
/// use delve::{MoveQueue, Position};
///
/// let mut queue = MoveQueue::new(2);
/// assert!(queue.push(Position::new(1, 0)));
/// assert!(queue.push(Position::new(1, 0)));
/// assert!(!queue.push(Position::new(0, 1)));
/// assert_eq!(queue.len(), 2);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveQueue {
    moves: VecDeque<Position>,
    capacity: usize,
}

impl MoveQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            moves: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends a move. Returns false if the queue was full and the move was dropped.
    pub fn push(&mut self, delta: Position) -> bool {
        if self.moves.len() >= self.capacity {
            return false;
        }
        self.moves.push_back(delta);
        true
    }

    pub fn pop(&mut self) -> Option<Position> {
        self.moves.pop_front()
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.moves.clear();
    }
}

/// What happened when an entity tried to step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The entity relocated to the given tile
    Moved(Position),
    /// The entity attacked an occupant and bumped instead of moving
    Attacked {
        target: EntityId,
        killed: bool,
    },
    /// The player pushed open a closed door and stepped into its tile
    OpenedDoor(Position),
    /// Void, a closed door the mover may not open, or a dead mover
    Blocked,
}

impl MoveOutcome {
    /// Whether the mover changed tiles.
    pub fn relocated(&self) -> bool {
        matches!(self, MoveOutcome::Moved(_) | MoveOutcome::OpenedDoor(_))
    }
}

/// What the caller should do after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Keep running
    Continue,
    /// The exit command was received
    Quit,
    /// The reset command was received; build a fresh simulation
    Restart,
}

/// Running counters for the session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStatistics {
    /// Player moves dequeued and resolved
    pub turns_taken: u64,
    /// Manual waits
    pub waits: u64,
    /// Creatures killed by the player
    pub enemies_defeated: u64,
    /// Bustables broken by the player
    pub objects_busted: u64,
    /// Damage the player received
    pub damage_taken: u64,
    /// Pickups collected
    pub items_collected: u64,
    /// Doors opened by the player
    pub doors_opened: u64,
    /// Chunks materialized so far
    pub chunks_generated: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_is_fifo() {
        let mut queue = MoveQueue::new(3);
        queue.push(Position::new(1, 0));
        queue.push(Position::new(0, 1));
        assert_eq!(queue.pop(), Some(Position::new(1, 0)));
        assert_eq!(queue.pop(), Some(Position::new(0, 1)));
        assert_eq!(queue.pop(), None);
    }

    #[test]
    fn test_queue_backpressure_drops_excess() {
        let mut queue = MoveQueue::new(2);
        for _ in 0..10 {
            queue.push(Position::new(-1, 0));
        }
        assert_eq!(queue.len(), 2);
        queue.pop();
        assert!(queue.push(Position::new(0, -1)));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_outcome_relocation() {
        assert!(MoveOutcome::Moved(Position::origin()).relocated());
        assert!(MoveOutcome::OpenedDoor(Position::origin()).relocated());
        assert!(!MoveOutcome::Blocked.relocated());
    }
}
