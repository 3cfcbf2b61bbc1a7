//! termshell TUI - Terminal frontend for the termshell engine
//!
//! This crate connects the headless engine in `termshell-core` to a real
//! terminal through crossterm, and ships a few components to build on.
//!
//! # Architecture
//!
//! - **Surface**: [`CrosstermSurface`] owns raw mode, the alternate screen,
//!   mouse capture and bracketed paste
//! - **Pointer**: [`ButtonTracker`] turns crossterm's edge events into the
//!   engine's absolute button-mask samples
//! - **Widgets**: a scrollable [`TextBlock`] and a [`SplitPane`] container

pub mod pointer;
pub mod surface;
pub mod widgets;

use std::sync::Arc;

use termshell_core::{Application, ShellConfig, SurfaceRef};

pub use pointer::ButtonTracker;
pub use surface::{restore_terminal, CrosstermSurface};
pub use widgets::{SplitPane, TextBlock};

/// An application that acquires the process's terminal when it runs
#[must_use]
pub fn application(config: &ShellConfig) -> Application {
    Application::with_config(config)
        .with_surface_factory(|| Ok(Arc::new(CrosstermSurface::new()) as SurfaceRef))
}
