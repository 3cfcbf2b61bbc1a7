//! Mouse Event Translation
//!
//! Crossterm reports mouse activity as edge events (`Down`, `Up`, `Drag`,
//! scroll ticks). The engine wants absolute samples: a position plus the full
//! set of buttons held. [`ButtonTracker`] keeps the held set between events.

use crossterm::event::{MouseButton as TermButton, MouseEvent, MouseEventKind};
use termshell_core::{Buttons, PointerSample};

/// Accumulates held buttons across crossterm mouse events
#[derive(Clone, Copy, Debug, Default)]
pub struct ButtonTracker {
    held: Buttons,
}

impl ButtonTracker {
    /// Create a tracker with no buttons held
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Buttons currently held
    #[must_use]
    pub fn held(&self) -> Buttons {
        self.held
    }

    /// Turn one crossterm event into an absolute sample
    pub fn sample(&mut self, event: &MouseEvent) -> PointerSample {
        let mut wheel = Buttons::empty();
        match event.kind {
            MouseEventKind::Down(button) | MouseEventKind::Drag(button) => {
                self.held |= mask(button);
            }
            MouseEventKind::Up(button) => self.held -= mask(button),
            // Motion without a drag means nothing is held
            MouseEventKind::Moved => self.held = Buttons::empty(),
            MouseEventKind::ScrollUp => wheel = Buttons::WHEEL_UP,
            MouseEventKind::ScrollDown => wheel = Buttons::WHEEL_DOWN,
            MouseEventKind::ScrollLeft => wheel = Buttons::WHEEL_LEFT,
            MouseEventKind::ScrollRight => wheel = Buttons::WHEEL_RIGHT,
        }

        PointerSample {
            x: event.column,
            y: event.row,
            buttons: self.held | wheel,
            modifiers: event.modifiers,
        }
    }
}

fn mask(button: TermButton) -> Buttons {
    match button {
        TermButton::Left => Buttons::PRIMARY,
        TermButton::Right => Buttons::SECONDARY,
        TermButton::Middle => Buttons::MIDDLE,
    }
}
