//! # Pathfinding Grid
//!
//! A fixed-size window of traversal cost classes centred on the player, plus the
//! A* queries that creatures use to chase.
//!
//! The grid is a cache of world state. It is rebuilt wholesale after every reveal
//! and whenever the player drifts too far from the window centre, and patched one
//! cell at a time after moves and kills.

use crate::{EntityRegistry, Position, World};
use log::debug;
use pathfinding::prelude::astar;
use serde::{Deserialize, Serialize};

/// Nothing in the way.
pub const COST_OPEN: u8 = 0;
/// A pot, chest or other breakable object.
pub const COST_BUSTABLE: u8 = 3;
/// Another creature.
pub const COST_CREATURE: u8 = 5;
/// A closed door.
pub const COST_CLOSED_DOOR: u8 = 6;
/// Void, hidden tiles and anything outside loaded chunks.
pub const COST_WALL: u8 = 10;

const STRAIGHT_STEP: u32 = 10;
const DIAGONAL_STEP: u32 = 15;

// Fixed successor order keeps A* deterministic for a given snapshot.
const NEIGHBOURS: [(i32, i32); 8] = [
    (0, -1),
    (1, 0),
    (0, 1),
    (-1, 0),
    (1, -1),
    (1, 1),
    (-1, 1),
    (-1, -1),
];

/// Cost class of one world cell given the current world and entities.
pub fn cell_cost(world: &World, entities: &EntityRegistry, position: Position) -> u8 {
    match world.tile_at(position) {
        Some(tile) if tile.visible => entities.cost_class_at(position),
        _ => COST_WALL,
    }
}

/// A successful path query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    start: Position,
    steps: Vec<Position>,
    cost: u32,
}

impl Path {
    /// Unit moves from the start to the goal.
    pub fn deltas(&self) -> Vec<Position> {
        let mut previous = self.start;
        self.steps
            .iter()
            .map(|step| {
                let delta = *step - previous;
                previous = *step;
                delta
            })
            .collect()
    }

    /// World coordinates visited after the start, ending at the goal.
    pub fn world_coords(&self) -> &[Position] {
        &self.steps
    }

    /// The first unit move, if the path goes anywhere.
    pub fn first_delta(&self) -> Option<Position> {
        self.steps.first().map(|step| *step - self.start)
    }

    /// Weighted length: 10 per straight step, 15 per diagonal.
    pub fn cost(&self) -> u32 {
        self.cost
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Player-centred window of cost classes.
///
/// # Examples
///
/// ```
/// use delve::{PathfindingGrid, Position, COST_OPEN};
///
/// let mut grid = PathfindingGrid::new(10, 10, 2);
/// grid.recenter(Position::new(5, 5));
/// for y in 0..10 {
///     for x in 0..10 {
///         grid.set_cost(Position::new(x, y), COST_OPEN);
///     }
/// }
///
/// let path = grid.find_path(Position::new(1, 1), Position::new(4, 1), 0).unwrap();
/// assert_eq!(path.deltas(), vec![Position::new(1, 0); 3]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathfindingGrid {
    width: usize,
    height: usize,
    cells: Vec<u8>,
    /// Added to a world coordinate to get a window coordinate
    offset: Position,
    center: Position,
    deadzone: i32,
}

impl PathfindingGrid {
    /// Creates a window filled with walls, centred on the origin.
    pub fn new(width: usize, height: usize, deadzone: i32) -> Self {
        let mut grid = Self {
            width,
            height,
            cells: vec![COST_WALL; width * height],
            offset: Position::origin(),
            center: Position::origin(),
            deadzone,
        };
        grid.recenter(Position::origin());
        grid
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// World coordinate the window was last centred on.
    pub fn center(&self) -> Position {
        self.center
    }

    pub fn offset(&self) -> Position {
        self.offset
    }

    /// Moves the window and fills it with walls without reading the world.
    pub fn recenter(&mut self, center: Position) {
        self.center = center;
        self.offset = Position::new(
            (self.width / 2) as i32 - center.x,
            (self.height / 2) as i32 - center.y,
        );
        self.cells.fill(COST_WALL);
    }

    /// Recomputes every cell around `center` from the world and entities.
    pub fn rebuild(&mut self, world: &World, entities: &EntityRegistry, center: Position) {
        self.recenter(center);
        for wy in 0..self.height {
            for wx in 0..self.width {
                let position = Position::new(wx as i32 - self.offset.x, wy as i32 - self.offset.y);
                self.cells[wy * self.width + wx] = cell_cost(world, entities, position);
            }
        }
        debug!(
            "rebuilt {}x{} pathfinding window around ({}, {})",
            self.width, self.height, center.x, center.y
        );
    }

    /// Recomputes one cell without moving the window. Cells outside it are ignored.
    pub fn patch(&mut self, world: &World, entities: &EntityRegistry, position: Position) {
        if let Some(index) = self.index(position) {
            self.cells[index] = cell_cost(world, entities, position);
        }
    }

    /// Overwrites one cell's cost class.
    pub fn set_cost(&mut self, position: Position, cost: u8) {
        if let Some(index) = self.index(position) {
            self.cells[index] = cost;
        }
    }

    /// Whether the player has drifted past the deadzone and the window should be rebuilt.
    pub fn needs_resync(&self, player: Position) -> bool {
        player.chebyshev_distance(self.center) > self.deadzone
    }

    pub fn contains(&self, position: Position) -> bool {
        self.index(position).is_some()
    }

    /// Cost class at a world cell; anything outside the window is a wall.
    pub fn cost_at(&self, position: Position) -> u8 {
        self.index(position)
            .map(|index| self.cells[index])
            .unwrap_or(COST_WALL)
    }

    /// A* from `start` to `goal` crossing only cells with cost class <= `strength`.
    ///
    /// The goal itself is always enterable. Diagonal steps need at least one of
    /// the two orthogonal cells beside them to be crossable. Returns `None` when
    /// either end lies outside the window or no route exists.
    pub fn find_path(&self, start: Position, goal: Position, strength: u8) -> Option<Path> {
        if !self.contains(start) || !self.contains(goal) {
            return None;
        }

        let passable = |position: Position| -> bool {
            position == goal || (self.contains(position) && self.cost_at(position) <= strength)
        };

        let (nodes, cost) = astar(
            &start,
            |&node| {
                let mut successors = Vec::with_capacity(8);
                for (dx, dy) in NEIGHBOURS {
                    let next = Position::new(node.x + dx, node.y + dy);
                    if !passable(next) {
                        continue;
                    }
                    if dx != 0 && dy != 0 {
                        let beside_x = Position::new(node.x + dx, node.y);
                        let beside_y = Position::new(node.x, node.y + dy);
                        let open_x = self.contains(beside_x) && self.cost_at(beside_x) <= strength;
                        let open_y = self.contains(beside_y) && self.cost_at(beside_y) <= strength;
                        if !open_x && !open_y {
                            continue;
                        }
                        successors.push((next, DIAGONAL_STEP));
                    } else {
                        successors.push((next, STRAIGHT_STEP));
                    }
                }
                successors
            },
            |&node| (node.euclidean_distance(goal) * STRAIGHT_STEP as f64).floor() as u32,
            |&node| node == goal,
        )?;

        Some(Path {
            start,
            steps: nodes.into_iter().skip(1).collect(),
            cost,
        })
    }

    fn index(&self, position: Position) -> Option<usize> {
        let x = position.x + self.offset.x;
        let y = position.y + self.offset.y;
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(y as usize * self.width + x as usize)
    }
}
