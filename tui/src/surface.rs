//! Crossterm Surface
//!
//! [`CrosstermSurface`] drives the process's real terminal: raw mode, the
//! alternate screen, bracketed paste and mouse capture. Components draw into
//! a persistent back buffer; [`Surface::show`] hands a copy of it to ratatui,
//! which writes only the cells that changed since the last flush.
//!
//! # Polling
//!
//! Crossterm's `event::read` cannot be interrupted, so the poll loop waits in
//! short `event::poll` slices and checks the finalized flag between them.
//! A failed read ends the event stream, which stops the application.
//! While suspended, the loop parks on a condition variable instead so the
//! child process owns the terminal's input.

use std::io::{self, Stdout};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossterm::event::{
    self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    Event, KeyEventKind,
};
use crossterm::{cursor, execute, terminal};
use parking_lot::{Condvar, Mutex};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::Terminal;
use termshell_core::{RawEvent, Surface, SurfaceError};
use tracing::{debug, error, info, warn};

use crate::pointer::ButtonTracker;

/// How long one `event::poll` slice lasts
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

type Term = Terminal<CrosstermBackend<Stdout>>;

#[derive(Clone, Copy, Debug)]
enum Mode {
    Paste,
    Mouse,
}

struct Screen {
    terminal: Option<Term>,
    back: Buffer,
    cursor: Option<(u16, u16)>,
    suspended: bool,
}

/// The process's terminal as a display surface
pub struct CrosstermSurface {
    screen: Mutex<Screen>,
    resumed: Condvar,
    finalized: AtomicBool,
    /// The terminal failed; no further events
    input_closed: AtomicBool,
    paste: AtomicBool,
    mouse: AtomicBool,
    buttons: Mutex<ButtonTracker>,
    poll_interval: Duration,
}

impl Default for CrosstermSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl CrosstermSurface {
    /// Create a surface; the terminal is untouched until `init`
    #[must_use]
    pub fn new() -> Self {
        Self::with_poll_interval(DEFAULT_POLL_INTERVAL)
    }

    /// Create a surface with a custom poll slice
    #[must_use]
    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self {
            screen: Mutex::new(Screen {
                terminal: None,
                back: Buffer::empty(Rect::default()),
                cursor: None,
                suspended: false,
            }),
            resumed: Condvar::new(),
            finalized: AtomicBool::new(false),
            input_closed: AtomicBool::new(false),
            paste: AtomicBool::new(false),
            mouse: AtomicBool::new(false),
            buttons: Mutex::new(ButtonTracker::new()),
            poll_interval,
        }
    }

    fn enter(&self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(io::stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;
        if self.paste.load(Ordering::SeqCst) {
            execute!(io::stdout(), EnableBracketedPaste)?;
        }
        if self.mouse.load(Ordering::SeqCst) {
            execute!(io::stdout(), EnableMouseCapture)?;
        }
        Ok(())
    }

    fn leave(&self) -> io::Result<()> {
        if self.mouse.load(Ordering::SeqCst) {
            execute!(io::stdout(), DisableMouseCapture)?;
        }
        if self.paste.load(Ordering::SeqCst) {
            execute!(io::stdout(), DisableBracketedPaste)?;
        }
        execute!(io::stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;
        terminal::disable_raw_mode()
    }

    /// Send a mode toggle if the terminal is currently ours
    fn toggle(&self, mode: Mode, enable: bool) {
        let flag = match mode {
            Mode::Paste => &self.paste,
            Mode::Mouse => &self.mouse,
        };
        if flag.swap(enable, Ordering::SeqCst) == enable {
            return;
        }
        let screen = self.screen.lock();
        if screen.terminal.is_none() || screen.suspended {
            return;
        }
        let result = match (mode, enable) {
            (Mode::Paste, true) => execute!(io::stdout(), EnableBracketedPaste),
            (Mode::Paste, false) => execute!(io::stdout(), DisableBracketedPaste),
            (Mode::Mouse, true) => execute!(io::stdout(), EnableMouseCapture),
            (Mode::Mouse, false) => execute!(io::stdout(), DisableMouseCapture),
        };
        if let Err(e) = result {
            warn!(?mode, enable, error = %e, "failed to toggle terminal mode");
        }
    }

    fn wait_while_suspended(&self) {
        let mut screen = self.screen.lock();
        while screen.suspended && !self.finalized.load(Ordering::SeqCst) {
            self.resumed.wait_for(&mut screen, self.poll_interval);
        }
    }

    fn resize_screen(&self, width: u16, height: u16) {
        let area = Rect::new(0, 0, width, height);
        let mut screen = self.screen.lock();
        screen.back.resize(area);
        if let Some(terminal) = screen.terminal.as_mut() {
            if let Err(e) = terminal.resize(area) {
                warn!(width, height, error = %e, "terminal resize failed");
            }
        }
    }

    fn apply_cursor(terminal: &mut Term, cursor: Option<(u16, u16)>) -> io::Result<()> {
        match cursor {
            Some(position) => {
                terminal.set_cursor_position(position)?;
                terminal.show_cursor()
            }
            None => terminal.hide_cursor(),
        }
    }
}

impl Surface for CrosstermSurface {
    fn init(&self) -> Result<(), SurfaceError> {
        if let Err(e) = self.enter() {
            restore_terminal();
            return Err(SurfaceError::Init(e.to_string()));
        }
        let acquired = Terminal::new(CrosstermBackend::new(io::stdout()))
            .and_then(|terminal| terminal::size().map(|size| (terminal, size)));
        let (terminal, (width, height)) = match acquired {
            Ok(acquired) => acquired,
            Err(e) => {
                restore_terminal();
                return Err(SurfaceError::Init(e.to_string()));
            }
        };

        let mut screen = self.screen.lock();
        screen.terminal = Some(terminal);
        screen.back = Buffer::empty(Rect::new(0, 0, width, height));
        screen.cursor = None;
        screen.suspended = false;
        self.finalized.store(false, Ordering::SeqCst);
        self.input_closed.store(false, Ordering::SeqCst);

        info!(width, height, "terminal acquired");
        Ok(())
    }

    fn poll_event(&self) -> Option<RawEvent> {
        loop {
            if self.finalized.load(Ordering::SeqCst)
                || self.input_closed.load(Ordering::SeqCst)
            {
                return None;
            }
            self.wait_while_suspended();

            let ready = event::poll(self.poll_interval).and_then(|ready| {
                if ready {
                    event::read().map(Some)
                } else {
                    Ok(None)
                }
            });
            let event = match ready {
                Ok(Some(event)) => event,
                Ok(None) => continue,
                Err(e) => {
                    // End of input; `fini` still restores the terminal
                    error!(error = %e, "terminal read failed");
                    self.input_closed.store(true, Ordering::SeqCst);
                    return None;
                }
            };

            if let Event::Resize(width, height) = event {
                self.resize_screen(width, height);
            }
            if let Some(raw) = translate(event, &mut self.buttons.lock()) {
                return Some(raw);
            }
        }
    }

    fn clear(&self) {
        let mut screen = self.screen.lock();
        screen.back.reset();
        if let Some(terminal) = screen.terminal.as_mut() {
            if let Err(e) = terminal.clear() {
                warn!(error = %e, "terminal clear failed");
            }
        }
    }

    fn show(&self) {
        let mut screen = self.screen.lock();
        if screen.suspended {
            return;
        }
        let Screen {
            terminal,
            back,
            cursor,
            ..
        } = &mut *screen;
        let Some(terminal) = terminal.as_mut() else {
            return;
        };

        *terminal.current_buffer_mut() = back.clone();
        let flushed = terminal.flush().and_then(|()| {
            terminal.swap_buffers();
            Self::apply_cursor(terminal, *cursor)?;
            Backend::flush(terminal.backend_mut())
        });
        if let Err(e) = flushed {
            warn!(error = %e, "terminal flush failed");
        }
    }

    fn sync(&self) {
        {
            let mut screen = self.screen.lock();
            if let Some(terminal) = screen.terminal.as_mut() {
                // Forget what is on screen so the next flush repaints it all
                if let Err(e) = terminal.clear() {
                    warn!(error = %e, "terminal clear failed");
                }
            }
        }
        self.show();
    }

    fn size(&self) -> (u16, u16) {
        let area = self.screen.lock().back.area;
        (area.width, area.height)
    }

    fn with_buffer(&self, f: &mut dyn FnMut(&mut Buffer)) {
        f(&mut self.screen.lock().back);
    }

    fn enable_paste(&self) {
        self.toggle(Mode::Paste, true);
    }

    fn disable_paste(&self) {
        self.toggle(Mode::Paste, false);
    }

    fn enable_mouse(&self) {
        self.toggle(Mode::Mouse, true);
    }

    fn disable_mouse(&self) {
        self.toggle(Mode::Mouse, false);
    }

    fn suspend(&self) -> Result<(), SurfaceError> {
        let mut screen = self.screen.lock();
        if screen.terminal.is_none() {
            return Err(SurfaceError::Suspend("terminal not acquired".to_string()));
        }
        if screen.suspended {
            return Ok(());
        }
        self.leave()
            .map_err(|e| SurfaceError::Suspend(e.to_string()))?;
        screen.suspended = true;
        debug!("terminal suspended");
        Ok(())
    }

    fn resume(&self) -> Result<(), SurfaceError> {
        let mut screen = self.screen.lock();
        if !screen.suspended {
            return Ok(());
        }
        self.enter()
            .map_err(|e| SurfaceError::Suspend(e.to_string()))?;
        if let Some(terminal) = screen.terminal.as_mut() {
            terminal
                .clear()
                .map_err(|e| SurfaceError::Suspend(e.to_string()))?;
        }
        screen.suspended = false;
        self.resumed.notify_all();
        debug!("terminal resumed");
        Ok(())
    }

    fn fini(&self) {
        if self.finalized.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut screen = self.screen.lock();
        if let Some(mut terminal) = screen.terminal.take() {
            if !screen.suspended {
                if let Err(e) = self.leave() {
                    warn!(error = %e, "failed to restore terminal");
                }
            }
            let _ = terminal.show_cursor();
        }
        screen.suspended = false;
        self.resumed.notify_all();
        info!("terminal released");
    }

    fn hide_cursor(&self) {
        let mut screen = self.screen.lock();
        screen.cursor = None;
        if let Some(terminal) = screen.terminal.as_mut() {
            let _ = terminal.hide_cursor();
        }
    }

    fn show_cursor(&self, x: u16, y: u16) {
        let mut screen = self.screen.lock();
        screen.cursor = Some((x, y));
        if let Some(terminal) = screen.terminal.as_mut() {
            if let Err(e) = Self::apply_cursor(terminal, Some((x, y))) {
                debug!(error = %e, "cursor update failed");
            }
        }
    }
}

/// Convert a crossterm event into a raw engine event
///
/// Key releases and focus notifications have no engine counterpart.
pub fn translate(event: Event, buttons: &mut ButtonTracker) -> Option<RawEvent> {
    match event {
        Event::Key(key) if key.kind != KeyEventKind::Release => Some(RawEvent::Key(key)),
        Event::Mouse(mouse) => Some(RawEvent::Pointer(buttons.sample(&mouse))),
        Event::Paste(text) => Some(RawEvent::Paste(text)),
        Event::Resize(width, height) => Some(RawEvent::Resize { width, height }),
        Event::Key(_) | Event::FocusGained | Event::FocusLost => None,
    }
}

/// Best-effort terminal restore, for panic hooks
pub fn restore_terminal() {
    let _ = execute!(
        io::stdout(),
        DisableMouseCapture,
        DisableBracketedPaste,
        terminal::LeaveAlternateScreen,
        cursor::Show
    );
    let _ = terminal::disable_raw_mode();
}
