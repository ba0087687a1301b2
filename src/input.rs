//! Translate window events into stage commands.

use winit::dpi::PhysicalPosition;
use winit::event::{ElementState, MouseButton};
use winit::keyboard::{Key, NamedKey};

use crate::stage::Command;

/// Key binding for a logical key, if any
///
/// Space toggles everything, R resets, M mutes. Letters match either case.
pub fn command_for_key(key: &Key) -> Option<Command> {
    match key {
        Key::Named(NamedKey::Space) => Some(Command::ToggleAll),
        Key::Character(text) => match text.as_str() {
            " " => Some(Command::ToggleAll),
            "r" | "R" => Some(Command::ResetAll),
            "m" | "M" => Some(Command::ToggleMute),
            _ => None,
        },
        _ => None,
    }
}

/// Tracks the cursor so button presses can be resolved to a position
#[derive(Debug, Default)]
pub struct InputRouter {
    cursor: Option<PhysicalPosition<f64>>,
}

impl InputRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cursor_moved(&mut self, position: PhysicalPosition<f64>) {
        self.cursor = Some(position);
    }

    pub fn cursor_left(&mut self) {
        self.cursor = None;
    }

    /// Left press at the last known cursor position, in logical pixels
    pub fn mouse_input(
        &self,
        state: ElementState,
        button: MouseButton,
        scale_factor: f64,
    ) -> Option<Command> {
        if state != ElementState::Pressed || button != MouseButton::Left {
            return None;
        }
        let logical = self.cursor?.to_logical::<f32>(scale_factor);
        Some(Command::Press {
            x: logical.x,
            y: logical.y,
        })
    }
}
