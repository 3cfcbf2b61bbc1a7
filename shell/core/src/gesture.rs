//! Gesture Translator
//!
//! Converts raw pointer samples (absolute position plus the set of buttons
//! currently held) into an ordered stream of semantic gestures with edge
//! detection and click timing.
//!
//! # Ordering
//!
//! For one sample the translator emits, in this order:
//!
//! 1. `Move`, if the position differs from the previous sample
//! 2. For primary, middle, then secondary: `Down` on a press edge, or `Up` on
//!    a release edge followed by `Click`/`DoubleClick` when the pointer has not
//!    moved since the press
//! 3. One `Scroll` per wheel flag present in the sample
//!
//! The translator is a plain state machine: time is passed in explicitly so
//! scripted sequences produce exactly reproducible output.

use std::time::{Duration, Instant};

use bitflags::bitflags;
use crossterm::event::KeyModifiers;

bitflags! {
    /// Buttons and wheel flags carried by a pointer sample
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Buttons: u8 {
        /// Primary (usually left) button
        const PRIMARY = 1;
        /// Secondary (usually right) button
        const SECONDARY = 1 << 1;
        /// Middle button
        const MIDDLE = 1 << 2;
        /// Wheel moved up in this sample
        const WHEEL_UP = 1 << 3;
        /// Wheel moved down in this sample
        const WHEEL_DOWN = 1 << 4;
        /// Wheel moved left in this sample
        const WHEEL_LEFT = 1 << 5;
        /// Wheel moved right in this sample
        const WHEEL_RIGHT = 1 << 6;
    }
}

impl Buttons {
    /// The buttons that have press/release edges
    pub const PRESSABLE: Self = Self::PRIMARY.union(Self::SECONDARY).union(Self::MIDDLE);

    /// The wheel flags
    pub const WHEEL: Self = Self::WHEEL_UP
        .union(Self::WHEEL_DOWN)
        .union(Self::WHEEL_LEFT)
        .union(Self::WHEEL_RIGHT);
}

/// One raw pointer sample
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PointerSample {
    /// Column (0-indexed)
    pub x: u16,
    /// Row (0-indexed)
    pub y: u16,
    /// Buttons held and wheel flags for this sample
    pub buttons: Buttons,
    /// Keyboard modifiers held during the sample
    pub modifiers: KeyModifiers,
}

impl PointerSample {
    /// Create a sample without modifiers
    #[must_use]
    pub fn new(x: u16, y: u16, buttons: Buttons) -> Self {
        Self {
            x,
            y,
            buttons,
            modifiers: KeyModifiers::NONE,
        }
    }

    /// Position as `(x, y)`
    #[must_use]
    pub fn position(&self) -> (u16, u16) {
        (self.x, self.y)
    }
}

/// A pointer button with press/release semantics
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MouseButton {
    /// Primary (left)
    Primary,
    /// Middle
    Middle,
    /// Secondary (right)
    Secondary,
}

impl MouseButton {
    /// Evaluation order within one sample
    pub const ALL: [Self; 3] = [Self::Primary, Self::Middle, Self::Secondary];

    /// The bit this button occupies in [`Buttons`]
    #[must_use]
    pub fn mask(self) -> Buttons {
        match self {
            Self::Primary => Buttons::PRIMARY,
            Self::Middle => Buttons::MIDDLE,
            Self::Secondary => Buttons::SECONDARY,
        }
    }
}

/// Wheel direction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScrollDirection {
    /// Wheel up
    Up,
    /// Wheel down
    Down,
    /// Wheel left
    Left,
    /// Wheel right
    Right,
}

impl ScrollDirection {
    /// Evaluation order within one sample
    pub const ALL: [Self; 4] = [Self::Up, Self::Down, Self::Left, Self::Right];

    /// The wheel flag for this direction
    #[must_use]
    pub fn mask(self) -> Buttons {
        match self {
            Self::Up => Buttons::WHEEL_UP,
            Self::Down => Buttons::WHEEL_DOWN,
            Self::Left => Buttons::WHEEL_LEFT,
            Self::Right => Buttons::WHEEL_RIGHT,
        }
    }
}

/// A semantic pointer action
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Gesture {
    /// The pointer moved
    Move,
    /// A button was pressed
    Down(MouseButton),
    /// A button was released
    Up(MouseButton),
    /// A button was released where it was pressed
    Click(MouseButton),
    /// A second click within the double-click window
    DoubleClick(MouseButton),
    /// The wheel moved
    Scroll(ScrollDirection),
}

impl Gesture {
    /// Whether this gesture is a button press
    #[must_use]
    pub fn is_down(&self) -> bool {
        matches!(self, Self::Down(_))
    }

    /// The button involved, if any
    #[must_use]
    pub fn button(&self) -> Option<MouseButton> {
        match self {
            Self::Down(b) | Self::Up(b) | Self::Click(b) | Self::DoubleClick(b) => Some(*b),
            Self::Move | Self::Scroll(_) => None,
        }
    }
}

/// Per-application pointer state
///
/// Tracks the last position, the last button mask, where the most recent
/// press happened and when the last single click was recorded.
#[derive(Clone, Debug, Default)]
pub struct PointerTracker {
    last_position: Option<(u16, u16)>,
    last_buttons: Buttons,
    press_origin: Option<(u16, u16)>,
    last_click: Option<Instant>,
}

impl PointerTracker {
    /// Create a tracker with no pointer history
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Translate one sample, handing each gesture to `fire` in order.
    ///
    /// `fire` returns whether the gesture was delivered. A release whose `Up`
    /// was not delivered produces no click and leaves the click timestamp
    /// untouched.
    ///
    /// Returns `true` if a press edge was seen in this sample.
    pub fn process<F>(
        &mut self,
        sample: &PointerSample,
        now: Instant,
        double_click_window: Duration,
        mut fire: F,
    ) -> bool
    where
        F: FnMut(Gesture) -> bool,
    {
        let position = sample.position();
        let moved_since_press = self.press_origin != Some(position);
        let changes = (sample.buttons ^ self.last_buttons) & Buttons::PRESSABLE;
        let mut pressed = false;

        if self.last_position != Some(position) {
            fire(Gesture::Move);
            self.last_position = Some(position);
        }

        for button in MouseButton::ALL {
            let mask = button.mask();
            if !changes.contains(mask) {
                continue;
            }

            if sample.buttons.contains(mask) {
                fire(Gesture::Down(button));
                pressed = true;
                continue;
            }

            let delivered = fire(Gesture::Up(button));
            if !delivered || moved_since_press {
                continue;
            }

            if self.within_double_click(now, double_click_window) {
                fire(Gesture::DoubleClick(button));
                self.last_click = None;
            } else {
                fire(Gesture::Click(button));
                self.last_click = Some(now);
            }
        }

        for direction in ScrollDirection::ALL {
            if sample.buttons.contains(direction.mask()) {
                fire(Gesture::Scroll(direction));
            }
        }

        self.last_buttons = sample.buttons;
        if pressed {
            self.press_origin = Some(position);
        }

        pressed
    }

    /// Translate one sample and collect every gesture
    pub fn collect(
        &mut self,
        sample: &PointerSample,
        now: Instant,
        double_click_window: Duration,
    ) -> Vec<Gesture> {
        let mut gestures = Vec::new();
        self.process(sample, now, double_click_window, |g| {
            gestures.push(g);
            true
        });
        gestures
    }

    /// Buttons held as of the last sample
    #[must_use]
    pub fn buttons(&self) -> Buttons {
        self.last_buttons & Buttons::PRESSABLE
    }

    /// Position of the last sample
    #[must_use]
    pub fn position(&self) -> Option<(u16, u16)> {
        self.last_position
    }

    fn within_double_click(&self, now: Instant, window: Duration) -> bool {
        if window.is_zero() {
            return false;
        }
        match self.last_click {
            Some(last) => now.saturating_duration_since(last) <= window,
            None => false,
        }
    }
}
