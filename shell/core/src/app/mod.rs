//! Application
//!
//! The top-level object that owns the display surface and wires the
//! dispatch engine together.
//!
//! # Architecture
//!
//! `Application` is a cheap clone handle around shared state. Components,
//! hooks and background threads all hold clones (or weak references, for
//! closures the application queues on itself).
//!
//! Two locks guard the shared state:
//!
//! - the **field lock** (`RwLock<State>`) protects every field below and is
//!   held only for short reads and writes;
//! - the **dispatch serializer** orders handler invocations so that no two
//!   handlers ever run at the same time.
//!
//! # Thread Safety
//!
//! The field lock is never held while user hooks or component methods run,
//! so both may call back into the application. Methods documented as
//! handler-side (`force_draw`) expect to run inside a handler or queued
//! closure, i.e. under the serializer.

mod input;
mod run;

use std::sync::{Arc, Weak};
use std::time::Duration;

use crossterm::event::KeyEvent;
use parking_lot::{Mutex, RwLock};
use ratatui::layout::Rect;
use tracing::{debug, trace};

use crate::component::{Component, ComponentRef};
use crate::config::ShellConfig;
use crate::debounce::ResizeDebouncer;
use crate::dispatch::{DispatchSerializer, Job, QueuedEvent, Queues};
use crate::event::RawEvent;
use crate::gesture::{Gesture, PointerSample, PointerTracker};
use crate::hooks::Hooks;
use crate::surface::{Surface, SurfaceError, SurfaceFactory, SurfaceRef};

/// Where the application is in its life
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lifecycle {
    /// No surface acquired yet
    Unstarted,
    /// A surface is (or is being) driven
    Running,
    /// The surface was finalized with no replacement
    Stopped,
}

pub(crate) struct State {
    pub(crate) surface: Option<SurfaceRef>,
    pub(crate) dimensions: Option<(u16, u16)>,
    pub(crate) lifecycle: Lifecycle,
    /// Execution contexts are live
    pub(crate) running: bool,
    /// `stop` was called while running; late surfaces are finalized
    pub(crate) stopping: bool,
    pub(crate) focus: Option<Weak<dyn Component>>,
    pub(crate) root: Option<ComponentRef>,
    pub(crate) root_fullscreen: bool,
    pub(crate) hooks: Hooks,
    pub(crate) capture: Option<ComponentRef>,
    pub(crate) double_click_window: Duration,
    pub(crate) debouncer: ResizeDebouncer,
    pub(crate) enable_paste: bool,
    pub(crate) enable_mouse: bool,
    /// Replacement failure reported by `run`
    pub(crate) failure: Option<SurfaceError>,
}

pub(crate) struct Shared {
    pub(crate) state: RwLock<State>,
    pub(crate) serializer: DispatchSerializer,
    /// Only locked under the serializer
    pub(crate) pointer: Mutex<PointerTracker>,
    pub(crate) queues: Queues,
    pub(crate) factory: Mutex<Option<SurfaceFactory>>,
}

/// Handle to the running UI
///
/// Clones share the same application.
#[derive(Clone)]
pub struct Application {
    pub(crate) shared: Arc<Shared>,
}

impl std::fmt::Debug for Application {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.read();
        f.debug_struct("Application")
            .field("lifecycle", &state.lifecycle)
            .field("running", &state.running)
            .field("dimensions", &state.dimensions)
            .field("hooks", &state.hooks)
            .field("queues", &self.shared.queues)
            .finish_non_exhaustive()
    }
}

/// Non-owning handle to an [`Application`]
///
/// Hooks installed on an application should capture one of these rather than
/// a clone, which would keep the application alive through its own state.
#[derive(Clone)]
pub struct WeakApplication(Weak<Shared>);

impl WeakApplication {
    /// The application, if it is still alive
    #[must_use]
    pub fn upgrade(&self) -> Option<Application> {
        self.0.upgrade().map(|shared| Application { shared })
    }
}

impl std::fmt::Debug for WeakApplication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakApplication")
            .field("alive", &(self.0.strong_count() > 0))
            .finish()
    }
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

impl Application {
    /// Create an application with default settings
    ///
    /// Bracketed paste on, mouse off, empty queues.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&ShellConfig::default())
    }

    /// Create an application from a loaded configuration
    #[must_use]
    pub fn with_config(config: &ShellConfig) -> Self {
        let state = State {
            surface: None,
            dimensions: None,
            lifecycle: Lifecycle::Unstarted,
            running: false,
            stopping: false,
            focus: None,
            root: None,
            root_fullscreen: false,
            hooks: Hooks::default(),
            capture: None,
            double_click_window: config.double_click_window,
            debouncer: ResizeDebouncer::new(config.resize_throttle),
            enable_paste: config.enable_paste,
            enable_mouse: config.enable_mouse,
            failure: None,
        };

        Self {
            shared: Arc::new(Shared {
                state: RwLock::new(state),
                serializer: DispatchSerializer::new(),
                pointer: Mutex::new(PointerTracker::new()),
                queues: Queues::new(config.queue_capacity),
                factory: Mutex::new(None),
            }),
        }
    }

    /// Use `factory` to create the surface when none was installed
    #[must_use]
    pub fn with_surface_factory<F>(self, factory: F) -> Self
    where
        F: Fn() -> Result<SurfaceRef, SurfaceError> + Send + Sync + 'static,
    {
        *self.shared.factory.lock() = Some(Box::new(factory));
        self
    }

    /// A handle that does not keep the application alive
    #[must_use]
    pub fn downgrade(&self) -> WeakApplication {
        WeakApplication(Arc::downgrade(&self.shared))
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Install a key interceptor; returning `None` vetoes the key
    pub fn set_input_interceptor<F>(&self, f: F)
    where
        F: Fn(KeyEvent) -> Option<KeyEvent> + Send + Sync + 'static,
    {
        self.shared.state.write().hooks.input = Some(Arc::new(f));
    }

    /// Install a pointer interceptor; returning `None` vetoes the gesture
    pub fn set_pointer_interceptor<F>(&self, f: F)
    where
        F: Fn(Gesture, PointerSample) -> Option<(Gesture, PointerSample)> + Send + Sync + 'static,
    {
        self.shared.state.write().hooks.pointer = Some(Arc::new(f));
    }

    /// Install a hook consulted before focus moves
    pub fn set_before_focus<F>(&self, f: F)
    where
        F: Fn(&ComponentRef) -> bool + Send + Sync + 'static,
    {
        self.shared.state.write().hooks.before_focus = Some(Arc::new(f));
    }

    /// Install a hook called after focus moved
    pub fn set_after_focus<F>(&self, f: F)
    where
        F: Fn(&ComponentRef) + Send + Sync + 'static,
    {
        self.shared.state.write().hooks.after_focus = Some(Arc::new(f));
    }

    /// Install a hook called before each full draw; `true` skips the tree
    pub fn set_before_draw<F>(&self, f: F)
    where
        F: Fn(&dyn Surface) -> bool + Send + Sync + 'static,
    {
        self.shared.state.write().hooks.before_draw = Some(Arc::new(f));
    }

    /// Install a hook called after the tree was drawn
    pub fn set_after_draw<F>(&self, f: F)
    where
        F: Fn(&dyn Surface) + Send + Sync + 'static,
    {
        self.shared.state.write().hooks.after_draw = Some(Arc::new(f));
    }

    /// Install a hook called after each effective resize
    pub fn set_after_resize<F>(&self, f: F)
    where
        F: Fn(u16, u16) + Send + Sync + 'static,
    {
        self.shared.state.write().hooks.after_resize = Some(Arc::new(f));
    }

    /// Snapshot of the installed hooks
    #[must_use]
    pub fn hooks(&self) -> Hooks {
        self.shared.state.read().hooks.clone()
    }

    /// Remove every installed hook
    pub fn clear_hooks(&self) {
        self.shared.state.write().hooks = Hooks::default();
    }

    /// Set the double-click window; zero disables double-click
    pub fn set_double_click_window(&self, window: Duration) {
        self.shared.state.write().double_click_window = window;
    }

    /// The double-click window
    #[must_use]
    pub fn double_click_window(&self) -> Duration {
        self.shared.state.read().double_click_window
    }

    /// Set the minimum interval between processed resizes
    pub fn set_resize_throttle(&self, interval: Duration) {
        self.shared.state.write().debouncer.set_interval(interval);
    }

    /// The minimum interval between processed resizes
    #[must_use]
    pub fn resize_throttle(&self) -> Duration {
        self.shared.state.read().debouncer.interval()
    }

    /// Turn bracketed paste on or off, on the live surface too
    pub fn enable_paste(&self, enable: bool) {
        let surface = {
            let mut state = self.shared.state.write();
            state.enable_paste = enable;
            state.surface.clone()
        };
        if let Some(surface) = surface {
            if enable {
                surface.enable_paste();
            } else {
                surface.disable_paste();
            }
        }
    }

    /// Whether bracketed paste is on
    #[must_use]
    pub fn paste_enabled(&self) -> bool {
        self.shared.state.read().enable_paste
    }

    /// Turn pointer reporting on or off, on the live surface too
    pub fn enable_mouse(&self, enable: bool) {
        let surface = {
            let mut state = self.shared.state.write();
            state.enable_mouse = enable;
            state.surface.clone()
        };
        if let Some(surface) = surface {
            if enable {
                surface.enable_mouse();
            } else {
                surface.disable_mouse();
            }
        }
    }

    /// Whether pointer reporting is on
    #[must_use]
    pub fn mouse_enabled(&self) -> bool {
        self.shared.state.read().enable_mouse
    }

    // =========================================================================
    // State
    // =========================================================================

    /// Current lifecycle state
    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.shared.state.read().lifecycle
    }

    /// Last recorded surface size as `(width, height)`
    #[must_use]
    pub fn surface_size(&self) -> Option<(u16, u16)> {
        self.shared.state.read().dimensions
    }

    /// The current surface, if one is installed
    #[must_use]
    pub fn surface(&self) -> Option<SurfaceRef> {
        self.shared.state.read().surface.clone()
    }

    // =========================================================================
    // Scheduling
    // =========================================================================

    /// Run `f` on the work loop, under the dispatch serializer
    ///
    /// Blocks while the work queue is full. Once the application has shut
    /// down the closure is dropped.
    pub fn queue_update<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.shared.queues.push_job(Job::Update(Box::new(f)));
    }

    /// Run `f` on the work loop, then draw
    ///
    /// With no `components` the whole tree is drawn; otherwise only the
    /// listed components are drawn before the flush.
    pub fn queue_update_draw<F>(&self, f: F, components: &[ComponentRef])
    where
        F: FnOnce() + Send + 'static,
    {
        let weak = self.downgrade();
        let components = components.to_vec();
        self.queue_update(move || {
            f();
            if let Some(app) = weak.upgrade() {
                app.draw_now(&components);
            }
        });
    }

    /// Feed a raw event through the event loop
    ///
    /// Blocks while the event queue is full.
    pub fn queue_event(&self, event: RawEvent) {
        self.shared.queues.push_event(QueuedEvent::Event(event));
    }

    /// Queue a draw
    ///
    /// With no `components` the whole tree is drawn. Before the application
    /// runs this does nothing; `run` draws once at startup.
    pub fn draw(&self, components: &[ComponentRef]) {
        if !self.shared.state.read().running {
            trace!("draw requested before run, skipped");
            return;
        }
        let weak = self.downgrade();
        let components = components.to_vec();
        self.queue_update(move || {
            if let Some(app) = weak.upgrade() {
                app.draw_now(&components);
            }
        });
    }

    /// Queue a full repaint of the physical screen
    pub fn sync(&self) {
        let weak = self.downgrade();
        self.queue_update(move || {
            if let Some(surface) = weak.upgrade().and_then(|app| app.surface()) {
                surface.sync();
            }
        });
    }

    // =========================================================================
    // Drawing
    // =========================================================================

    fn draw_now(&self, components: &[ComponentRef]) {
        if components.is_empty() {
            self.force_draw();
            return;
        }
        let Some(surface) = self.surface() else {
            return;
        };
        for component in components {
            component.draw(surface.as_ref());
        }
        surface.show();
    }

    /// Draw the whole tree now
    ///
    /// Meant for handlers and queued closures, which already run under the
    /// dispatch serializer.
    pub fn force_draw(&self) {
        let (surface, root, fullscreen, before, after) = {
            let state = self.shared.state.read();
            (
                state.surface.clone(),
                state.root.clone(),
                state.root_fullscreen,
                state.hooks.before_draw.clone(),
                state.hooks.after_draw.clone(),
            )
        };
        let (Some(surface), Some(root)) = (surface, root) else {
            return;
        };

        if fullscreen {
            let (width, height) = surface.size();
            root.set_rect(Rect::new(0, 0, width, height));
        }

        if let Some(before) = before {
            if before(surface.as_ref()) {
                debug!("draw vetoed by before-draw hook");
                surface.show();
                return;
            }
        }

        root.draw(surface.as_ref());

        if let Some(after) = after {
            after(surface.as_ref());
        }

        surface.show();
    }
}
