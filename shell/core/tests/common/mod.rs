//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use ratatui::buffer::Buffer;
use ratatui::style::Style;
use termshell_core::{
    Application, Component, ComponentRef, FocusDelegate, Gesture, KeyEvent, PointerOutcome,
    PointerSample, RawEvent, Rect, Surface, SurfaceError, SurfaceRef,
};

/// Component that records everything it receives
pub struct Probe {
    name: &'static str,
    me: Weak<Probe>,
    rect: Mutex<Rect>,
    focused: AtomicBool,
    pub keys: Mutex<Vec<KeyEvent>>,
    pub pastes: Mutex<Vec<String>>,
    pub gestures: Mutex<Vec<Gesture>>,
    pub focus_calls: AtomicUsize,
    pub blur_calls: AtomicUsize,
    pub draws: AtomicUsize,
    /// Take pointer capture on `Down`, for `capture_for` or self
    pub captures: AtomicBool,
    pub capture_for: Mutex<Option<ComponentRef>>,
    /// Hand focus to this component when focused
    pub delegate_to: Mutex<Option<ComponentRef>>,
    pub panic_on_key: AtomicBool,
}

impl Probe {
    pub fn new(name: &'static str) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            name,
            me: me.clone(),
            rect: Mutex::new(Rect::default()),
            focused: AtomicBool::new(false),
            keys: Mutex::new(Vec::new()),
            pastes: Mutex::new(Vec::new()),
            gestures: Mutex::new(Vec::new()),
            focus_calls: AtomicUsize::new(0),
            blur_calls: AtomicUsize::new(0),
            draws: AtomicUsize::new(0),
            captures: AtomicBool::new(false),
            capture_for: Mutex::new(None),
            delegate_to: Mutex::new(None),
            panic_on_key: AtomicBool::new(false),
        })
    }

    pub fn component(self: &Arc<Self>) -> ComponentRef {
        Arc::clone(self) as ComponentRef
    }

    pub fn key_codes(&self) -> Vec<termshell_core::KeyCode> {
        self.keys.lock().iter().map(|k| k.code).collect()
    }

    pub fn gestures(&self) -> Vec<Gesture> {
        self.gestures.lock().clone()
    }
}

impl Component for Probe {
    fn draw(&self, surface: &dyn Surface) {
        self.draws.fetch_add(1, Ordering::SeqCst);
        let rect = *self.rect.lock();
        let name = self.name;
        surface.with_buffer(&mut |buf| {
            let area = buf.area.intersection(rect);
            if !area.is_empty() {
                buf.set_stringn(area.x, area.y, name, usize::from(area.width), Style::default());
            }
        });
    }

    fn set_rect(&self, rect: Rect) {
        *self.rect.lock() = rect;
    }

    fn rect(&self) -> Rect {
        *self.rect.lock()
    }

    fn handle_key(&self, key: KeyEvent, _set_focus: FocusDelegate<'_>) {
        if self.panic_on_key.load(Ordering::SeqCst) {
            panic!("{} refuses keys", self.name);
        }
        self.keys.lock().push(key);
    }

    fn handle_paste(&self, text: &str, _set_focus: FocusDelegate<'_>) {
        self.pastes.lock().push(text.to_string());
    }

    fn handle_pointer(
        &self,
        gesture: Gesture,
        _sample: &PointerSample,
        _set_focus: FocusDelegate<'_>,
    ) -> PointerOutcome {
        self.gestures.lock().push(gesture);
        if gesture.is_down() && self.captures.load(Ordering::SeqCst) {
            let target = self
                .capture_for
                .lock()
                .clone()
                .or_else(|| self.me.upgrade().map(|me| me as ComponentRef));
            if let Some(target) = target {
                return PointerOutcome::capture(target);
            }
        }
        PointerOutcome::consumed()
    }

    fn focus(&self, delegate: FocusDelegate<'_>) {
        self.focus_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.delegate_to.lock().clone();
        match next {
            Some(child) => delegate(child),
            None => self.focused.store(true, Ordering::SeqCst),
        }
    }

    fn blur(&self) {
        self.blur_calls.fetch_add(1, Ordering::SeqCst);
        self.focused.store(false, Ordering::SeqCst);
    }

    fn has_focus(&self) -> bool {
        self.focused.load(Ordering::SeqCst)
    }
}

/// Surface that forwards to another one, with hooks into `init` and
/// `hide_cursor`
pub struct Relay {
    inner: SurfaceRef,
    gate: Mutex<Option<(Sender<()>, Receiver<()>)>>,
    on_hide_cursor: Mutex<Option<Box<dyn Fn() + Send + Sync>>>,
}

impl Relay {
    pub fn new(inner: SurfaceRef) -> Arc<Self> {
        Arc::new(Self {
            inner,
            gate: Mutex::new(None),
            on_hide_cursor: Mutex::new(None),
        })
    }

    /// Block the next `init` until released
    ///
    /// Returns a receiver that fires once `init` is entered and the sender
    /// that lets it continue.
    pub fn gate_init(&self) -> (Receiver<()>, Sender<()>) {
        let (entered_tx, entered_rx) = bounded(1);
        let (release_tx, release_rx) = bounded(1);
        *self.gate.lock() = Some((entered_tx, release_rx));
        (entered_rx, release_tx)
    }

    pub fn on_hide_cursor(&self, f: impl Fn() + Send + Sync + 'static) {
        *self.on_hide_cursor.lock() = Some(Box::new(f));
    }
}

impl Surface for Relay {
    fn init(&self) -> Result<(), SurfaceError> {
        let gate = self.gate.lock().take();
        if let Some((entered, release)) = gate {
            let _ = entered.send(());
            let _ = release.recv();
        }
        self.inner.init()
    }

    fn poll_event(&self) -> Option<RawEvent> {
        self.inner.poll_event()
    }

    fn clear(&self) {
        self.inner.clear();
    }

    fn show(&self) {
        self.inner.show();
    }

    fn size(&self) -> (u16, u16) {
        self.inner.size()
    }

    fn with_buffer(&self, f: &mut dyn FnMut(&mut Buffer)) {
        self.inner.with_buffer(f);
    }

    fn enable_paste(&self) {
        self.inner.enable_paste();
    }

    fn disable_paste(&self) {
        self.inner.disable_paste();
    }

    fn enable_mouse(&self) {
        self.inner.enable_mouse();
    }

    fn disable_mouse(&self) {
        self.inner.disable_mouse();
    }

    fn suspend(&self) -> Result<(), SurfaceError> {
        self.inner.suspend()
    }

    fn resume(&self) -> Result<(), SurfaceError> {
        self.inner.resume()
    }

    fn fini(&self) {
        self.inner.fini();
    }

    fn hide_cursor(&self) {
        if let Some(f) = self.on_hide_cursor.lock().as_ref() {
            f();
        }
        self.inner.hide_cursor();
    }

    fn show_cursor(&self, x: u16, y: u16) {
        self.inner.show_cursor(x, y);
    }
}

/// Poll `condition` until it holds or `timeout` passes
pub fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

/// A receiver that fires once the work loop has started draining
pub fn started_signal(app: &Application) -> Receiver<()> {
    let (tx, rx) = bounded(1);
    app.queue_update(move || {
        let _ = tx.send(());
    });
    rx
}

pub const TIMEOUT: Duration = Duration::from_secs(5);
