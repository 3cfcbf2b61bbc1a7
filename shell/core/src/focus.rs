//! Focus/Root Coordinator
//!
//! Tracks which component receives key events and which component is the
//! root of the display tree.
//!
//! # Re-entrancy
//!
//! Focus transfer calls out to hooks, components and the surface at several
//! points. The field lock is only held while the new focus is recorded; the
//! before-hook, `blur`, hiding the cursor, the after-hook and `focus` all run
//! with it released, so any of them may call [`Application::set_focus`]
//! again. Components use the
//! delegate passed to [`Component::focus`](crate::Component::focus) to hand
//! focus to a child this way.

use std::sync::Arc;

use ratatui::layout::Rect;
use tracing::trace;

use crate::app::Application;
use crate::component::ComponentRef;

impl Application {
    /// Move keyboard focus to `component`
    ///
    /// The before-focus hook may cancel the move by returning `false`.
    /// Otherwise the old focus is blurred, the new one recorded, the hardware
    /// cursor hidden, the after-focus hook called and finally the component's
    /// `focus` invoked with a delegate that can redirect focus again.
    pub fn set_focus(&self, component: ComponentRef) {
        let before = self.shared.state.read().hooks.before_focus.clone();
        if let Some(before) = before {
            if !before(&component) {
                trace!("focus change vetoed");
                return;
            }
        }

        if let Some(old) = self.focused() {
            old.blur();
        }

        let (surface, after) = {
            let mut state = self.shared.state.write();
            state.focus = Some(Arc::downgrade(&component));
            (state.surface.clone(), state.hooks.after_focus.clone())
        };
        if let Some(surface) = surface {
            surface.hide_cursor();
        }

        if let Some(after) = after {
            after(&component);
        }

        component.focus(&|c| self.set_focus(c));
    }

    /// The component that currently has keyboard focus
    ///
    /// `None` if nothing has focus or the focused component was dropped.
    #[must_use]
    pub fn focused(&self) -> Option<ComponentRef> {
        self.shared
            .state
            .read()
            .focus
            .as_ref()
            .and_then(std::sync::Weak::upgrade)
    }

    /// Replace the root of the display tree
    ///
    /// With `fullscreen` the root is resized to the whole surface before
    /// every draw. The root receives focus and a full draw is queued.
    pub fn set_root(&self, root: ComponentRef, fullscreen: bool) {
        let surface = {
            let mut state = self.shared.state.write();
            state.root = Some(Arc::clone(&root));
            state.root_fullscreen = fullscreen;
            state.capture = None;
            state.surface.clone()
        };
        if let Some(surface) = surface {
            surface.clear();
        }

        self.set_focus(root);
        self.draw(&[]);
    }

    /// The root of the display tree
    #[must_use]
    pub fn root(&self) -> Option<ComponentRef> {
        self.shared.state.read().root.clone()
    }

    /// Resize `component` to cover the whole surface
    pub fn resize_to_fullscreen(&self, component: &ComponentRef) {
        if let Some(surface) = self.surface() {
            let (width, height) = surface.size();
            component.set_rect(Rect::new(0, 0, width, height));
        }
    }
}
