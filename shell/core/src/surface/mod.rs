//! Display Surface Abstraction
//!
//! The [`Surface`] trait is everything the engine needs from a physical
//! terminal: lifecycle (init, suspend/resume, fini), a blocking raw event
//! source, a cell buffer to draw into and cursor control.
//!
//! # Thread Safety
//!
//! A surface is shared between execution contexts: the poll loop blocks in
//! [`Surface::poll_event`] while handlers on other threads draw and flush.
//! Implementations therefore take `&self` everywhere and synchronize
//! internally.
//!
//! # Finalization
//!
//! [`Surface::fini`] must be idempotent and must make any blocked or future
//! [`Surface::poll_event`] call return `None`. The engine relies on this to
//! unblock the poll loop when a surface is replaced or the application stops.

pub mod sim;

use std::io;
use std::sync::Arc;

use ratatui::buffer::Buffer;
use thiserror::Error;

use crate::event::RawEvent;

pub use sim::{SimHandle, SimSurface};

/// Errors reported by a surface
#[derive(Debug, Error)]
pub enum SurfaceError {
    /// I/O error talking to the terminal
    #[error("terminal I/O error: {0}")]
    Io(#[from] io::Error),

    /// The surface could not be initialized
    #[error("surface initialization failed: {0}")]
    Init(String),

    /// Entering or leaving the suspended state failed
    #[error("surface suspend/resume failed: {0}")]
    Suspend(String),
}

/// Shared handle to a surface
pub type SurfaceRef = Arc<dyn Surface>;

/// Creates the default surface on first acquisition
pub type SurfaceFactory = Box<dyn Fn() -> Result<SurfaceRef, SurfaceError> + Send + Sync>;

/// Capability set of a physical display
pub trait Surface: Send + Sync {
    /// Acquire the terminal (raw mode, alternate screen, ...)
    fn init(&self) -> Result<(), SurfaceError>;

    /// Block until the next raw event.
    ///
    /// Returns `None` once the surface has been finalized or its input has
    /// ended. End of input on the installed surface stops the application.
    fn poll_event(&self) -> Option<RawEvent>;

    /// Clear the back buffer and the physical screen
    fn clear(&self);

    /// Flush the back buffer to the physical screen
    fn show(&self);

    /// Repaint the whole physical screen from the back buffer
    fn sync(&self) {
        self.show();
    }

    /// Current size as `(width, height)`
    fn size(&self) -> (u16, u16);

    /// Give mutable access to the back buffer
    fn with_buffer(&self, f: &mut dyn FnMut(&mut Buffer));

    /// Start reporting bracketed paste
    fn enable_paste(&self);

    /// Stop reporting bracketed paste
    fn disable_paste(&self);

    /// Start reporting pointer samples
    fn enable_mouse(&self);

    /// Stop reporting pointer samples
    fn disable_mouse(&self);

    /// Hand the terminal back to the OS temporarily
    fn suspend(&self) -> Result<(), SurfaceError>;

    /// Take the terminal back after [`Surface::suspend`]
    fn resume(&self) -> Result<(), SurfaceError>;

    /// Release the terminal and restore its original state
    fn fini(&self);

    /// Hide the hardware cursor
    fn hide_cursor(&self);

    /// Show the hardware cursor at `(x, y)`
    fn show_cursor(&self, x: u16, y: u16);
}

/// Whether two handles point at the same surface
#[must_use]
pub fn same_surface(a: &SurfaceRef, b: &SurfaceRef) -> bool {
    std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}
