//! User Hooks
//!
//! Interceptors and callbacks an integrator can install on the
//! [`Application`](crate::Application). Every hook is invoked with the field
//! lock released and may call back into the application.

use std::sync::Arc;

use crossterm::event::KeyEvent;

use crate::component::ComponentRef;
use crate::gesture::{Gesture, PointerSample};
use crate::surface::Surface;

/// Rewrites a key event, or vetoes it by returning `None`
pub type InputInterceptor = Arc<dyn Fn(KeyEvent) -> Option<KeyEvent> + Send + Sync>;

/// Rewrites a gesture and its sample, or vetoes it by returning `None`
pub type PointerInterceptor =
    Arc<dyn Fn(Gesture, PointerSample) -> Option<(Gesture, PointerSample)> + Send + Sync>;

/// Called with the candidate before focus moves; `false` cancels the move
pub type BeforeFocusHook = Arc<dyn Fn(&ComponentRef) -> bool + Send + Sync>;

/// Called with the new focus after it was recorded
pub type AfterFocusHook = Arc<dyn Fn(&ComponentRef) + Send + Sync>;

/// Called before the tree is drawn; `true` skips the tree draw
pub type BeforeDrawHook = Arc<dyn Fn(&dyn Surface) -> bool + Send + Sync>;

/// Called after the tree was drawn, before the flush
pub type AfterDrawHook = Arc<dyn Fn(&dyn Surface) + Send + Sync>;

/// Called with `(width, height)` after an effective resize
pub type AfterResizeHook = Arc<dyn Fn(u16, u16) + Send + Sync>;

/// Every installed hook
#[derive(Clone, Default)]
pub struct Hooks {
    /// Key interceptor
    pub input: Option<InputInterceptor>,
    /// Pointer interceptor
    pub pointer: Option<PointerInterceptor>,
    /// Before-focus-change hook
    pub before_focus: Option<BeforeFocusHook>,
    /// After-focus-change hook
    pub after_focus: Option<AfterFocusHook>,
    /// Before-draw hook
    pub before_draw: Option<BeforeDrawHook>,
    /// After-draw hook
    pub after_draw: Option<AfterDrawHook>,
    /// After-resize hook
    pub after_resize: Option<AfterResizeHook>,
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("input", &self.input.is_some())
            .field("pointer", &self.pointer.is_some())
            .field("before_focus", &self.before_focus.is_some())
            .field("after_focus", &self.after_focus.is_some())
            .field("before_draw", &self.before_draw.is_some())
            .field("after_draw", &self.after_draw.is_some())
            .field("after_resize", &self.after_resize.is_some())
            .finish()
    }
}
