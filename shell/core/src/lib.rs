//! termshell core - Terminal Application Event Loop and Dispatch Engine
//!
//! This crate owns the lifecycle of a terminal display surface, pumps raw
//! input from it and dispatches that input to a tree of components, with the
//! guarantee that no two handlers ever run concurrently.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                           Application                            │
//! │                                                                  │
//! │  poll loop ──┐                                                   │
//! │  (caller)    │      ┌─────────────────────┐    ┌──────────────┐  │
//! │              ├────► │ DispatchSerializer  │ ─► │ key / paste  │  │
//! │  events ─────┤      │  (one unit at once) │    │ gestures     │  │
//! │  (+ resize   │      └─────────────────────┘    │ resize       │  │
//! │   timer)     │                                 │ queued work  │  │
//! │  work ───────┘                                 └──────┬───────┘  │
//! │                                                       │          │
//! │  supervisor ◄── replacement slot          Focus/Root Coordinator │
//! │                                                       │          │
//! └───────────────────────────────────────────────────────┼──────────┘
//!                                                         ▼
//!                                          Component tree ─► Surface
//! ```
//!
//! # Key Types
//!
//! - [`Application`]: lifecycle, scheduling, drawing and focus
//! - [`Surface`]: capability set of a physical terminal
//! - [`Component`]: capability set of a visual component
//! - [`PointerTracker`]: raw pointer samples to semantic gestures
//! - [`ResizeDebouncer`]: coalesces resize bursts
//! - [`DispatchSerializer`]: serializes handler invocations
//!
//! # Quick Start
//!
//! ```ignore
//! use termshell_core::{Application, SimSurface, RawEvent};
//!
//! let (surface, handle) = SimSurface::new(80, 24);
//! let app = Application::new();
//! app.set_surface(surface)?;
//! app.set_root(my_root_component, true);
//!
//! handle.inject(RawEvent::interrupt());
//! app.run()?;
//! ```
//!
//! # Module Overview
//!
//! - [`app`]: the [`Application`] and its execution contexts
//! - [`component`]: the component capability set
//! - [`config`]: TOML and environment configuration
//! - [`debounce`]: resize throttling
//! - [`dispatch`]: dispatch serializer and queues
//! - [`error`]: engine errors
//! - [`event`]: raw input events
//! - [`focus`]: focus and root coordination
//! - [`gesture`]: pointer gesture translation
//! - [`hooks`]: interceptors and callbacks
//! - [`surface`]: the display surface capability set and an in-memory surface
//!
//! # No Terminal I/O
//!
//! Nothing here talks to a real terminal. Concrete surfaces live in the
//! `termshell-tui` crate; tests use [`SimSurface`].

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod component;
pub mod config;
pub mod debounce;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod focus;
pub mod gesture;
pub mod hooks;
pub mod surface;

pub use app::{Application, Lifecycle, WeakApplication};
pub use component::{
    rect_contains, same_component, Component, ComponentRef, FocusDelegate, PointerOutcome,
};
pub use debounce::{ResizeDebouncer, ResizeDecision, DEFAULT_RESIZE_THROTTLE};
pub use dispatch::{DispatchSerializer, Job, QueuedEvent, DEFAULT_QUEUE_CAPACITY};
pub use error::{Result, ShellError};
pub use event::{is_interrupt, RawEvent};
pub use gesture::{Buttons, Gesture, MouseButton, PointerSample, PointerTracker, ScrollDirection};
pub use hooks::Hooks;
pub use surface::{
    same_surface, SimHandle, SimSurface, Surface, SurfaceError, SurfaceFactory, SurfaceRef,
};

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, ConfigError, ConfigSource, ShellConfig,
    ShellToml,
};

// Key types components need to match on
pub use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
pub use ratatui::buffer::Buffer;
pub use ratatui::layout::Rect;
