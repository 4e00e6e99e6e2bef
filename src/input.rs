use std::collections::HashSet;

use glam::Vec2;
use winit::keyboard::KeyCode;

/// Keys the viewer reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    W,
    A,
    S,
    D,
    Q,
    E,
    I,
    J,
    K,
    L,
    U,
    O,
    M,
    P,
    Z,
    X,
    Enter,
    Escape,
}

impl Key {
    pub fn from_winit(code: KeyCode) -> Option<Self> {
        Some(match code {
            KeyCode::KeyW => Self::W,
            KeyCode::KeyA => Self::A,
            KeyCode::KeyS => Self::S,
            KeyCode::KeyD => Self::D,
            KeyCode::KeyQ => Self::Q,
            KeyCode::KeyE => Self::E,
            KeyCode::KeyI => Self::I,
            KeyCode::KeyJ => Self::J,
            KeyCode::KeyK => Self::K,
            KeyCode::KeyL => Self::L,
            KeyCode::KeyU => Self::U,
            KeyCode::KeyO => Self::O,
            KeyCode::KeyM => Self::M,
            KeyCode::KeyP => Self::P,
            KeyCode::KeyZ => Self::Z,
            KeyCode::KeyX => Self::X,
            KeyCode::Enter | KeyCode::NumpadEnter => Self::Enter,
            KeyCode::Escape => Self::Escape,
            _ => return None,
        })
    }

    /// Single letters (any case) or `Enter`/`Return`/`Escape`/`Esc`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Enter" | "Return" => return Some(Self::Enter),
            "Escape" | "Esc" => return Some(Self::Escape),
            _ => {}
        }
        let mut chars = name.chars();
        let (Some(ch), None) = (chars.next(), chars.next()) else {
            return None;
        };
        Some(match ch.to_ascii_uppercase() {
            'W' => Self::W,
            'A' => Self::A,
            'S' => Self::S,
            'D' => Self::D,
            'Q' => Self::Q,
            'E' => Self::E,
            'I' => Self::I,
            'J' => Self::J,
            'K' => Self::K,
            'L' => Self::L,
            'U' => Self::U,
            'O' => Self::O,
            'M' => Self::M,
            'P' => Self::P,
            'Z' => Self::Z,
            'X' => Self::X,
            _ => return None,
        })
    }

    /// Toggle issued once per press, if this key has one.
    pub fn command(self) -> Option<Command> {
        match self {
            Self::Escape => Some(Command::Quit),
            Self::Enter => Some(Command::SwitchMode),
            Self::M => Some(Command::ToggleDepthDebug),
            Self::P => Some(Command::ToggleLightSelection),
            Self::Z => Some(Command::Wireframe(true)),
            Self::X => Some(Command::Wireframe(false)),
            _ => None,
        }
    }
}

/// Edge-triggered actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    SwitchMode,
    ToggleDepthDebug,
    ToggleLightSelection,
    Wireframe(bool),
}

/// Pointer sample feeding mouse look.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LookEvent {
    /// Absolute cursor position in window pixels.
    Cursor(Vec2),
    /// Raw device motion while the cursor is captured.
    Motion(Vec2),
}

/// Keyboard and pointer state accumulated between ticks.
#[derive(Debug, Default)]
pub struct InputState {
    held: HashSet<Key>,
    commands: Vec<Command>,
    look: Vec<LookEvent>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a press. Auto-repeat of an already held key queues nothing.
    pub fn key_down(&mut self, key: Key) {
        if self.held.insert(key) {
            if let Some(command) = key.command() {
                self.commands.push(command);
            }
        }
    }

    pub fn key_up(&mut self, key: Key) {
        self.held.remove(&key);
    }

    pub fn is_held(&self, key: Key) -> bool {
        self.held.contains(&key)
    }

    pub fn release_all(&mut self) {
        self.held.clear();
    }

    pub fn push_cursor(&mut self, position: Vec2) {
        self.look.push(LookEvent::Cursor(position));
    }

    pub fn push_motion(&mut self, delta: Vec2) {
        self.look.push(LookEvent::Motion(delta));
    }

    pub fn drain_commands(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    pub fn drain_look(&mut self) -> Vec<LookEvent> {
        std::mem::take(&mut self.look)
    }
}
