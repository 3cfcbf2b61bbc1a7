//! Component Capability Set
//!
//! The engine knows nothing about concrete widgets. It draws, lays out and
//! routes input to anything implementing [`Component`].
//!
//! # Re-entrancy
//!
//! Every method is called with the application's field lock released, so a
//! component may call back into the [`Application`](crate::Application)
//! (set focus, queue work, read state) from any of them. Methods take `&self`;
//! components keep their mutable state behind their own locks.

use std::sync::Arc;

use crossterm::event::KeyEvent;
use ratatui::layout::Rect;

use crate::gesture::{Gesture, PointerSample};
use crate::surface::Surface;

/// Shared handle to a component
pub type ComponentRef = Arc<dyn Component>;

/// Callback handed to components so they can move focus elsewhere
///
/// Composite components use it to redirect focus to a child.
pub type FocusDelegate<'a> = &'a dyn Fn(ComponentRef);

/// Result of offering a pointer gesture to a component
#[derive(Clone, Default)]
pub struct PointerOutcome {
    /// Whether the gesture was handled
    pub consumed: bool,
    /// Component that wants every following gesture, if any
    pub capture: Option<ComponentRef>,
}

impl PointerOutcome {
    /// Not handled, no capture
    #[must_use]
    pub fn ignored() -> Self {
        Self::default()
    }

    /// Handled, no capture
    #[must_use]
    pub fn consumed() -> Self {
        Self {
            consumed: true,
            capture: None,
        }
    }

    /// Handled, and `component` captures the pointer
    #[must_use]
    pub fn capture(component: ComponentRef) -> Self {
        Self {
            consumed: true,
            capture: Some(component),
        }
    }
}

impl std::fmt::Debug for PointerOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointerOutcome")
            .field("consumed", &self.consumed)
            .field("capture", &self.capture.is_some())
            .finish()
    }
}

/// A visual component in the display tree
pub trait Component: Send + Sync {
    /// Paint into the surface's back buffer
    fn draw(&self, surface: &dyn Surface);

    /// Set the component's position and size
    fn set_rect(&self, rect: Rect);

    /// The component's position and size
    fn rect(&self) -> Rect;

    /// Handle a key press while focused
    fn handle_key(&self, _key: KeyEvent, _set_focus: FocusDelegate<'_>) {}

    /// Handle pasted text while focused
    fn handle_paste(&self, _text: &str, _set_focus: FocusDelegate<'_>) {}

    /// Handle a pointer gesture
    ///
    /// `sample` is the raw sample the gesture was derived from.
    fn handle_pointer(
        &self,
        _gesture: Gesture,
        _sample: &PointerSample,
        _set_focus: FocusDelegate<'_>,
    ) -> PointerOutcome {
        PointerOutcome::ignored()
    }

    /// Receive focus; `delegate` may hand it on to another component
    fn focus(&self, delegate: FocusDelegate<'_>);

    /// Lose focus
    fn blur(&self);

    /// Whether this component (or a descendant) has focus
    fn has_focus(&self) -> bool;
}

/// Whether two handles point at the same component
#[must_use]
pub fn same_component(a: &ComponentRef, b: &ComponentRef) -> bool {
    std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}

/// Whether `rect` contains the cell at `(x, y)`
#[must_use]
pub fn rect_contains(rect: Rect, x: u16, y: u16) -> bool {
    x >= rect.x
        && y >= rect.y
        && u32::from(x) < u32::from(rect.x) + u32::from(rect.width)
        && u32::from(y) < u32::from(rect.y) + u32::from(rect.height)
}
