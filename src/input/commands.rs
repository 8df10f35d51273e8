//! # Command Definitions
//!
//! Logical buttons the simulation understands, independent of physical keys.

use crate::{Direction, Position};
use serde::{Deserialize, Serialize};

/// Logical button fired by the input layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    /// Let one turn pass without moving
    Wait,
    /// Confirm/interact
    Confirm,
    /// Open or close the inventory menu
    ToggleMenu,
    /// Quit the simulation
    Exit,
    /// Throw the current floor away and start again
    Reset,
    /// Make newly generated tiles start visible
    ToggleRevealGenerated,
    /// Toggle frame timing output
    ToggleFps,
}

impl Command {
    /// Every command, in binding order.
    pub const ALL: [Command; 11] = [
        Command::MoveUp,
        Command::MoveDown,
        Command::MoveLeft,
        Command::MoveRight,
        Command::Wait,
        Command::Confirm,
        Command::ToggleMenu,
        Command::Exit,
        Command::Reset,
        Command::ToggleRevealGenerated,
        Command::ToggleFps,
    ];

    /// Grid delta of a movement command.
    ///
    /// # Examples
    ///
    /// ```
    /// use delve::{Command, Position};
    ///
    /// assert_eq!(Command::MoveLeft.move_delta(), Some(Position::new(-1, 0)));
    /// assert_eq!(Command::Wait.move_delta(), None);
    /// ```
    pub fn move_delta(self) -> Option<Position> {
        let direction = match self {
            Command::MoveUp => Direction::North,
            Command::MoveDown => Direction::South,
            Command::MoveLeft => Direction::West,
            Command::MoveRight => Direction::East,
            _ => return None,
        };
        Some(direction.to_delta())
    }

    /// Whether holding the button keeps firing it.
    pub fn repeats(self) -> bool {
        self.move_delta().is_some() || self == Command::Wait
    }

    /// Parses a command name as used in scripts, e.g. `"up"` or `"wait"`.
    pub fn parse(name: &str) -> Option<Command> {
        let command = match name.trim().to_ascii_lowercase().as_str() {
            "up" | "w" | "north" => Command::MoveUp,
            "down" | "s" | "south" => Command::MoveDown,
            "left" | "a" | "west" => Command::MoveLeft,
            "right" | "d" | "east" => Command::MoveRight,
            "wait" | "." => Command::Wait,
            "confirm" => Command::Confirm,
            "menu" => Command::ToggleMenu,
            "exit" | "quit" => Command::Exit,
            "reset" => Command::Reset,
            "reveal" => Command::ToggleRevealGenerated,
            "fps" => Command::ToggleFps,
            _ => return None,
        };
        Some(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_movement_deltas() {
        assert_eq!(Command::MoveUp.move_delta(), Some(Position::new(0, -1)));
        assert_eq!(Command::MoveDown.move_delta(), Some(Position::new(0, 1)));
        assert_eq!(Command::MoveRight.move_delta(), Some(Position::new(1, 0)));
        assert_eq!(Command::Exit.move_delta(), None);
    }

    #[test]
    fn test_parse() {
        assert_eq!(Command::parse("Up"), Some(Command::MoveUp));
        assert_eq!(Command::parse(" wait "), Some(Command::Wait));
        assert_eq!(Command::parse("quit"), Some(Command::Exit));
        assert_eq!(Command::parse("jump"), None);
    }
}
