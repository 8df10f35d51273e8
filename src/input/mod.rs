//! # Input Module
//!
//! Abstract key events turned into logical [`Command`]s.
//!
//! The host feeds raw `key_down`/`key_up` events and calls [`InputManager::update`]
//! once per frame; the simulation only ever sees the commands that were just
//! pressed or auto-repeated in the active focus scope.

pub mod commands;

pub use commands::*;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Focus scope for gameplay buttons.
pub const FOCUS_GAME: &str = "game";

/// Focus scope for the inventory menu.
pub const FOCUS_INVENTORY: &str = "inventory";

/// Milliseconds a repeating button must be held before it first repeats.
pub const REPEAT_DELAY_MS: i32 = 300;

/// Milliseconds between repeats once repeating has started.
pub const REPEAT_PERIOD_MS: i32 = 150;

/// Host-independent key code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct KeyCode(pub u32);

impl KeyCode {
    pub const ENTER: KeyCode = KeyCode(13);
    pub const ESCAPE: KeyCode = KeyCode(27);
    pub const SPACE: KeyCode = KeyCode(32);
    pub const PERIOD: KeyCode = KeyCode(46);
    pub const A: KeyCode = KeyCode(97);
    pub const D: KeyCode = KeyCode(100);
    pub const I: KeyCode = KeyCode(105);
    pub const R: KeyCode = KeyCode(114);
    pub const S: KeyCode = KeyCode(115);
    pub const W: KeyCode = KeyCode(119);
    pub const UP: KeyCode = KeyCode(273);
    pub const DOWN: KeyCode = KeyCode(274);
    pub const RIGHT: KeyCode = KeyCode(275);
    pub const LEFT: KeyCode = KeyCode(276);
    pub const F1: KeyCode = KeyCode(282);
    pub const F2: KeyCode = KeyCode(283);
}

/// A logical button bound to one or more keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub command: Command,
    /// Scope the button is live in; empty means every scope
    pub focus: String,
    pub keys: Vec<KeyCode>,
    pub repeat: bool,
    pub repeat_delay_ms: i32,
    pub repeat_period_ms: i32,
    is_down: bool,
    just_pressed: bool,
    just_repeated: bool,
    repeat_countdown: i32,
}

impl Button {
    pub fn new(command: Command, focus: &str, keys: &[KeyCode], repeat: bool) -> Self {
        Self {
            command,
            focus: focus.to_string(),
            keys: keys.to_vec(),
            repeat,
            repeat_delay_ms: REPEAT_DELAY_MS,
            repeat_period_ms: REPEAT_PERIOD_MS,
            is_down: false,
            just_pressed: false,
            just_repeated: false,
            repeat_countdown: REPEAT_DELAY_MS,
        }
    }

    /// Changes the repeat timing. A zero period repeats at the delay.
    pub fn set_repeat_timing(&mut self, delay_ms: i32, period_ms: i32) {
        self.repeat_delay_ms = delay_ms;
        self.repeat_period_ms = if period_ms == 0 { delay_ms } else { period_ms };
    }

    pub fn is_down(&self) -> bool {
        self.is_down
    }

    pub fn just_pressed(&self) -> bool {
        self.just_pressed
    }

    pub fn just_repeated(&self) -> bool {
        self.just_repeated
    }

    /// Whether the button fired on the last update.
    pub fn fired(&self) -> bool {
        self.just_pressed || self.just_repeated
    }

    fn update(&mut self, down_keys: &HashSet<KeyCode>, focus: &str, delta_ms: u32) {
        self.just_pressed = false;
        self.just_repeated = false;

        if !self.focus.is_empty() && self.focus != focus {
            self.is_down = false;
            return;
        }

        let any_down = self.keys.iter().any(|key| down_keys.contains(key));
        if !self.is_down && any_down {
            self.just_pressed = true;
            self.repeat_countdown = self.repeat_delay_ms;
        }
        self.is_down = any_down;

        if self.repeat && self.is_down && !self.just_pressed {
            self.repeat_countdown -= delta_ms.min(i32::MAX as u32) as i32;
            if self.repeat_countdown < 0 {
                self.just_repeated = true;
                self.repeat_countdown += self.repeat_period_ms;
            }
        }
    }
}

/// Tracks held keys and turns them into button presses.
///
/// # Examples
///
/// ```
/// use delve::{Command, InputManager, KeyCode};
///
/// let mut input = InputManager::with_default_bindings();
/// input.key_down(KeyCode::UP);
/// input.update(16);
/// assert_eq!(input.pressed(), vec![Command::MoveUp]);
///
/// input.update(16);
/// assert!(input.pressed().is_empty());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputManager {
    tracked_keys: HashSet<KeyCode>,
    down_keys: HashSet<KeyCode>,
    focus: String,
    buttons: Vec<Button>,
}

impl InputManager {
    /// Creates a manager with no buttons, focused on gameplay.
    pub fn new() -> Self {
        Self {
            focus: FOCUS_GAME.to_string(),
            ..Self::default()
        }
    }

    /// Arrow keys and WASD move, space/period waits, escape quits.
    pub fn with_default_bindings() -> Self {
        let mut input = Self::new();
        input.bind(Button::new(Command::MoveUp, FOCUS_GAME, &[KeyCode::UP, KeyCode::W], true));
        input.bind(Button::new(Command::MoveDown, FOCUS_GAME, &[KeyCode::DOWN, KeyCode::S], true));
        input.bind(Button::new(Command::MoveLeft, FOCUS_GAME, &[KeyCode::LEFT, KeyCode::A], true));
        input.bind(Button::new(Command::MoveRight, FOCUS_GAME, &[KeyCode::RIGHT, KeyCode::D], true));
        input.bind(Button::new(Command::Wait, FOCUS_GAME, &[KeyCode::SPACE, KeyCode::PERIOD], true));
        input.bind(Button::new(Command::Confirm, "", &[KeyCode::ENTER], false));
        input.bind(Button::new(Command::ToggleMenu, "", &[KeyCode::I], false));
        input.bind(Button::new(Command::Exit, "", &[KeyCode::ESCAPE], false));
        input.bind(Button::new(Command::Reset, FOCUS_GAME, &[KeyCode::R], false));
        input.bind(Button::new(Command::ToggleRevealGenerated, "", &[KeyCode::F1], false));
        input.bind(Button::new(Command::ToggleFps, "", &[KeyCode::F2], false));
        input
    }

    /// Adds a button; its keys start being tracked.
    pub fn bind(&mut self, button: Button) {
        self.tracked_keys.extend(button.keys.iter().copied());
        self.buttons.push(button);
    }

    pub fn button(&self, command: Command) -> Option<&Button> {
        self.buttons.iter().find(|button| button.command == command)
    }

    pub fn button_mut(&mut self, command: Command) -> Option<&mut Button> {
        self.buttons.iter_mut().find(|button| button.command == command)
    }

    pub fn focus(&mut self, scope: &str) {
        self.focus = scope.to_string();
    }

    pub fn current_focus(&self) -> &str {
        &self.focus
    }

    /// Records a key press. Untracked keys are ignored.
    pub fn key_down(&mut self, key: KeyCode) {
        if self.tracked_keys.contains(&key) {
            self.down_keys.insert(key);
        }
    }

    pub fn key_up(&mut self, key: KeyCode) {
        self.down_keys.remove(&key);
    }

    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.down_keys.contains(&key)
    }

    /// Advances every button by one frame.
    pub fn update(&mut self, delta_ms: u32) {
        let Self {
            down_keys,
            focus,
            buttons,
            ..
        } = self;
        for button in buttons.iter_mut() {
            button.update(down_keys, focus, delta_ms);
        }
    }

    /// Commands that were pressed or repeated on the last update, in binding order.
    pub fn pressed(&self) -> Vec<Command> {
        self.buttons
            .iter()
            .filter(|button| button.fired())
            .map(|button| button.command)
            .collect()
    }
}
