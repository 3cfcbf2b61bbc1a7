//! In-Memory Surface
//!
//! A [`Surface`] with no terminal behind it. Raw events are injected through a
//! [`SimHandle`]; drawing lands in an in-memory [`Buffer`]; every lifecycle
//! call is counted so tests can assert on exactly what the engine did.
//!
//! # Usage
//!
//! ```ignore
//! let (surface, handle) = SimSurface::new(80, 24);
//! app.set_surface(surface)?;
//!
//! handle.inject(RawEvent::key(KeyCode::Enter));
//! handle.inject(RawEvent::interrupt());
//! app.run()?;
//!
//! assert_eq!(handle.fini_calls(), 1);
//! ```

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;

use super::{Surface, SurfaceError};
use crate::event::RawEvent;

#[derive(Default)]
struct Counters {
    init: AtomicUsize,
    fini: AtomicUsize,
    show: AtomicUsize,
    clear: AtomicUsize,
    suspend: AtomicUsize,
    resume: AtomicUsize,
    hide_cursor: AtomicUsize,
}

struct SimState {
    queue: VecDeque<RawEvent>,
    finalized: bool,
    /// No events after the queue drains
    input_closed: bool,
    suspended: bool,
    width: u16,
    height: u16,
    cursor: Option<(u16, u16)>,
    paste: bool,
    mouse: bool,
    fail_next_init: bool,
    fail_suspend: bool,
    fail_resume: bool,
}

struct SimInner {
    state: Mutex<SimState>,
    ready: Condvar,
    buffer: Mutex<Buffer>,
    counters: Counters,
}

/// Surface backed by memory instead of a terminal
pub struct SimSurface {
    inner: Arc<SimInner>,
}

/// Test-side control of a [`SimSurface`]
#[derive(Clone)]
pub struct SimHandle {
    inner: Arc<SimInner>,
}

impl SimSurface {
    /// Create a surface of the given size and its control handle
    #[must_use]
    pub fn new(width: u16, height: u16) -> (Arc<Self>, SimHandle) {
        let inner = Arc::new(SimInner {
            state: Mutex::new(SimState {
                queue: VecDeque::new(),
                finalized: false,
                input_closed: false,
                suspended: false,
                width,
                height,
                cursor: None,
                paste: false,
                mouse: false,
                fail_next_init: false,
                fail_suspend: false,
                fail_resume: false,
            }),
            ready: Condvar::new(),
            buffer: Mutex::new(Buffer::empty(Rect::new(0, 0, width, height))),
            counters: Counters::default(),
        });

        let surface = Arc::new(Self {
            inner: Arc::clone(&inner),
        });
        (surface, SimHandle { inner })
    }
}

impl Surface for SimSurface {
    fn init(&self) -> Result<(), SurfaceError> {
        let mut state = self.inner.state.lock();
        if state.fail_next_init {
            state.fail_next_init = false;
            return Err(SurfaceError::Init("simulated init failure".into()));
        }
        state.finalized = false;
        self.inner.counters.init.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn poll_event(&self) -> Option<RawEvent> {
        let mut state = self.inner.state.lock();
        loop {
            if state.finalized {
                return None;
            }
            if let Some(event) = state.queue.pop_front() {
                return Some(event);
            }
            if state.input_closed {
                return None;
            }
            self.inner.ready.wait(&mut state);
        }
    }

    fn clear(&self) {
        self.inner.buffer.lock().reset();
        self.inner.counters.clear.fetch_add(1, Ordering::SeqCst);
    }

    fn show(&self) {
        self.inner.counters.show.fetch_add(1, Ordering::SeqCst);
    }

    fn size(&self) -> (u16, u16) {
        let state = self.inner.state.lock();
        (state.width, state.height)
    }

    fn with_buffer(&self, f: &mut dyn FnMut(&mut Buffer)) {
        let mut buffer = self.inner.buffer.lock();
        f(&mut buffer);
    }

    fn enable_paste(&self) {
        self.inner.state.lock().paste = true;
    }

    fn disable_paste(&self) {
        self.inner.state.lock().paste = false;
    }

    fn enable_mouse(&self) {
        self.inner.state.lock().mouse = true;
    }

    fn disable_mouse(&self) {
        self.inner.state.lock().mouse = false;
    }

    fn suspend(&self) -> Result<(), SurfaceError> {
        let mut state = self.inner.state.lock();
        if state.fail_suspend {
            return Err(SurfaceError::Suspend("simulated suspend failure".into()));
        }
        state.suspended = true;
        self.inner.counters.suspend.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn resume(&self) -> Result<(), SurfaceError> {
        let mut state = self.inner.state.lock();
        if state.fail_resume {
            return Err(SurfaceError::Suspend("simulated resume failure".into()));
        }
        state.suspended = false;
        self.inner.counters.resume.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn fini(&self) {
        self.inner.counters.fini.fetch_add(1, Ordering::SeqCst);
        self.inner.state.lock().finalized = true;
        self.inner.ready.notify_all();
    }

    fn hide_cursor(&self) {
        self.inner.state.lock().cursor = None;
        self.inner.counters.hide_cursor.fetch_add(1, Ordering::SeqCst);
    }

    fn show_cursor(&self, x: u16, y: u16) {
        self.inner.state.lock().cursor = Some((x, y));
    }
}

impl SimHandle {
    /// Queue a raw event for the poll loop
    pub fn inject(&self, event: RawEvent) {
        self.inner.state.lock().queue.push_back(event);
        self.inner.ready.notify_all();
    }

    /// Queue several raw events in order
    pub fn inject_all(&self, events: impl IntoIterator<Item = RawEvent>) {
        let mut state = self.inner.state.lock();
        state.queue.extend(events);
        drop(state);
        self.inner.ready.notify_all();
    }

    /// End the event stream once the queued events are polled
    ///
    /// Mimics a terminal that went away without the surface being
    /// finalized.
    pub fn close_input(&self) {
        self.inner.state.lock().input_closed = true;
        self.inner.ready.notify_all();
    }

    /// Change the reported size and queue the matching resize event
    pub fn resize(&self, width: u16, height: u16) {
        {
            let mut state = self.inner.state.lock();
            state.width = width;
            state.height = height;
        }
        self.inner
            .buffer
            .lock()
            .resize(Rect::new(0, 0, width, height));
        self.inject(RawEvent::Resize { width, height });
    }

    /// Make the next `init` call fail
    pub fn fail_next_init(&self) {
        self.inner.state.lock().fail_next_init = true;
    }

    /// Make every `suspend` call fail
    pub fn fail_suspend(&self) {
        self.inner.state.lock().fail_suspend = true;
    }

    /// Make every `resume` call fail
    pub fn fail_resume(&self) {
        self.inner.state.lock().fail_resume = true;
    }

    /// Events injected but not yet polled
    #[must_use]
    pub fn pending_events(&self) -> usize {
        self.inner.state.lock().queue.len()
    }

    /// Whether `fini` has been called since the last `init`
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.inner.state.lock().finalized
    }

    /// Whether the surface is currently suspended
    #[must_use]
    pub fn is_suspended(&self) -> bool {
        self.inner.state.lock().suspended
    }

    /// Whether bracketed paste reporting is on
    #[must_use]
    pub fn paste_enabled(&self) -> bool {
        self.inner.state.lock().paste
    }

    /// Whether pointer reporting is on
    #[must_use]
    pub fn mouse_enabled(&self) -> bool {
        self.inner.state.lock().mouse
    }

    /// Visible cursor position, if shown
    #[must_use]
    pub fn cursor(&self) -> Option<(u16, u16)> {
        self.inner.state.lock().cursor
    }

    /// Snapshot of the back buffer
    #[must_use]
    pub fn buffer(&self) -> Buffer {
        self.inner.buffer.lock().clone()
    }

    /// Text of row `y`, trailing blanks trimmed
    #[must_use]
    pub fn row_text(&self, y: u16) -> String {
        let buffer = self.inner.buffer.lock();
        let area = buffer.area;
        if y >= area.height {
            return String::new();
        }
        let row: String = (0..area.width)
            .filter_map(|x| buffer.cell((x, y)).map(|c| c.symbol().to_string()))
            .collect();
        row.trim_end().to_string()
    }

    /// Number of `init` calls that succeeded
    #[must_use]
    pub fn init_calls(&self) -> usize {
        self.inner.counters.init.load(Ordering::SeqCst)
    }

    /// Number of `fini` calls
    #[must_use]
    pub fn fini_calls(&self) -> usize {
        self.inner.counters.fini.load(Ordering::SeqCst)
    }

    /// Number of `show` calls
    #[must_use]
    pub fn show_calls(&self) -> usize {
        self.inner.counters.show.load(Ordering::SeqCst)
    }

    /// Number of `clear` calls
    #[must_use]
    pub fn clear_calls(&self) -> usize {
        self.inner.counters.clear.load(Ordering::SeqCst)
    }

    /// Number of successful `suspend` calls
    #[must_use]
    pub fn suspend_calls(&self) -> usize {
        self.inner.counters.suspend.load(Ordering::SeqCst)
    }

    /// Number of successful `resume` calls
    #[must_use]
    pub fn resume_calls(&self) -> usize {
        self.inner.counters.resume.load(Ordering::SeqCst)
    }

    /// Number of `hide_cursor` calls
    #[must_use]
    pub fn hide_cursor_calls(&self) -> usize {
        self.inner.counters.hide_cursor.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Duration;

    use crossterm::event::KeyCode;

    use super::*;

    #[test]
    fn test_poll_returns_injected_events_in_order() {
        let (surface, handle) = SimSurface::new(10, 2);
        handle.inject_all([RawEvent::key(KeyCode::Char('a')), RawEvent::key(KeyCode::Char('b'))]);

        assert_eq!(surface.poll_event(), Some(RawEvent::key(KeyCode::Char('a'))));
        assert_eq!(surface.poll_event(), Some(RawEvent::key(KeyCode::Char('b'))));
        assert_eq!(handle.pending_events(), 0);
    }

    #[test]
    fn test_fini_unblocks_poll() {
        let (surface, handle) = SimSurface::new(10, 2);
        let poller = {
            let surface = Arc::clone(&surface);
            thread::spawn(move || surface.poll_event())
        };

        // Give the poller a chance to block
        thread::sleep(Duration::from_millis(20));
        surface.fini();

        assert_eq!(poller.join().expect("poller thread"), None);
        assert!(handle.is_finalized());
        assert_eq!(handle.fini_calls(), 1);
    }

    #[test]
    fn test_closed_input_drains_then_ends() {
        let (surface, handle) = SimSurface::new(10, 2);
        handle.inject(RawEvent::key(KeyCode::Char('a')));
        handle.close_input();

        assert_eq!(surface.poll_event(), Some(RawEvent::key(KeyCode::Char('a'))));
        assert_eq!(surface.poll_event(), None);
        assert!(!handle.is_finalized());
    }

    #[test]
    fn test_resize_updates_size_and_queues_event() {
        let (surface, handle) = SimSurface::new(10, 2);
        handle.resize(40, 12);
        assert_eq!(surface.size(), (40, 12));
        assert_eq!(
            surface.poll_event(),
            Some(RawEvent::Resize {
                width: 40,
                height: 12
            })
        );
        assert_eq!(handle.buffer().area, Rect::new(0, 0, 40, 12));
    }

    #[test]
    fn test_drawing_lands_in_buffer() {
        let (surface, handle) = SimSurface::new(10, 2);
        surface.with_buffer(&mut |buf| {
            buf.set_string(1, 1, "hi", ratatui::style::Style::default());
        });
        assert_eq!(handle.row_text(1), " hi");
        surface.clear();
        assert_eq!(handle.row_text(1), "");
        assert_eq!(handle.clear_calls(), 1);
    }

    #[test]
    fn test_injected_failures() {
        let (surface, handle) = SimSurface::new(10, 2);
        handle.fail_next_init();
        assert!(surface.init().is_err());
        assert!(surface.init().is_ok());
        assert_eq!(handle.init_calls(), 1);

        handle.fail_suspend();
        assert!(matches!(surface.suspend(), Err(SurfaceError::Suspend(_))));
    }
}
