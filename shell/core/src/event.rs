//! Raw Input Events
//!
//! Events as delivered by a [`Surface`](crate::surface::Surface) before any
//! interpretation. Key payloads reuse crossterm's plain data types so that
//! components can match on familiar key codes; pointer payloads are absolute
//! button-mask samples that the [`gesture`](crate::gesture) module turns into
//! semantic gestures.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::gesture::PointerSample;

/// A raw, uninterpreted input event
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RawEvent {
    /// A key press
    Key(KeyEvent),
    /// A pointer sample: absolute position plus the buttons currently held
    Pointer(PointerSample),
    /// The surface changed size
    Resize {
        /// New width in cells
        width: u16,
        /// New height in cells
        height: u16,
    },
    /// Text delivered through bracketed paste
    Paste(String),
}

impl RawEvent {
    /// Short name for logging
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Key(_) => "key",
            Self::Pointer(_) => "pointer",
            Self::Resize { .. } => "resize",
            Self::Paste(_) => "paste",
        }
    }

    /// Convenience constructor for a plain key press
    #[must_use]
    pub fn key(code: KeyCode) -> Self {
        Self::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    /// Convenience constructor for a key press with modifiers
    #[must_use]
    pub fn key_with(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self::Key(KeyEvent::new(code, modifiers))
    }

    /// The interrupt key (Ctrl-C)
    #[must_use]
    pub fn interrupt() -> Self {
        Self::key_with(KeyCode::Char('c'), KeyModifiers::CONTROL)
    }
}

/// Whether a key event is the interrupt key that stops the application
#[must_use]
pub fn is_interrupt(key: &KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        && key.modifiers.contains(KeyModifiers::CONTROL)
}
