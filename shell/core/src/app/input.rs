//! Default event handling
//!
//! Everything here runs under the dispatch serializer.

use std::time::Instant;

use crossterm::event::KeyEvent;
use tracing::{debug, info, trace};

use super::Application;
use crate::debounce::ResizeDecision;
use crate::event::{is_interrupt, RawEvent};
use crate::gesture::PointerSample;

impl Application {
    pub(crate) fn handle_event(&self, event: RawEvent) {
        trace!(kind = event.kind(), "handling event");
        match event {
            RawEvent::Key(key) => self.handle_key(key),
            RawEvent::Paste(text) => self.handle_paste(&text),
            RawEvent::Pointer(sample) => self.handle_pointer(&sample),
            RawEvent::Resize { width, height } => self.handle_resize(width, height),
        }
    }

    fn handle_key(&self, key: KeyEvent) {
        let interceptor = self.shared.state.read().hooks.input.clone();
        let key = match interceptor {
            Some(intercept) => match intercept(key) {
                Some(key) => key,
                None => {
                    trace!("key vetoed by interceptor");
                    self.force_draw();
                    return;
                }
            },
            None => key,
        };

        if is_interrupt(&key) {
            info!("interrupt key received");
            self.stop();
            return;
        }

        if let Some(focused) = self.focused() {
            focused.handle_key(key, &|c| self.set_focus(c));
        }
        self.force_draw();
    }

    fn handle_paste(&self, text: &str) {
        if let Some(focused) = self.focused() {
            focused.handle_paste(text, &|c| self.set_focus(c));
        }
        self.force_draw();
    }

    fn handle_pointer(&self, sample: &PointerSample) {
        let (interceptor, window, root, mut capture) = {
            let state = self.shared.state.read();
            (
                state.hooks.pointer.clone(),
                state.double_click_window,
                state.root.clone(),
                state.capture.clone(),
            )
        };

        let mut consumed = false;
        self.shared
            .pointer
            .lock()
            .process(sample, Instant::now(), window, |gesture| {
                let (gesture, sample) = match &interceptor {
                    Some(intercept) => match intercept(gesture, *sample) {
                        Some(rewritten) => rewritten,
                        None => {
                            trace!(?gesture, "gesture vetoed by interceptor");
                            consumed = true;
                            return false;
                        }
                    },
                    None => (gesture, *sample),
                };

                let Some(target) = capture.clone().or_else(|| root.clone()) else {
                    return true;
                };
                let outcome = target.handle_pointer(gesture, &sample, &|c| self.set_focus(c));
                consumed |= outcome.consumed;
                capture = outcome.capture;
                true
            });

        self.shared.state.write().capture = capture;
        if consumed {
            self.force_draw();
        }
    }

    fn handle_resize(&self, width: u16, height: u16) {
        let decision = self
            .shared
            .state
            .write()
            .debouncer
            .offer(width, height, Instant::now());

        match decision {
            ResizeDecision::Deferred { .. } => {
                trace!(width, height, "resize deferred");
                self.shared.queues.rearm();
            }
            ResizeDecision::Process => self.apply_resize(width, height),
        }
    }

    fn apply_resize(&self, width: u16, height: u16) {
        let (surface, hook) = {
            let mut state = self.shared.state.write();
            state.dimensions = Some((width, height));
            (state.surface.clone(), state.hooks.after_resize.clone())
        };
        let Some(surface) = surface else {
            return;
        };

        debug!(width, height, "resize processed");
        surface.clear();
        if let Some(hook) = hook {
            hook(width, height);
        }
        self.force_draw();
    }

    /// Deliver the held resize sample if its deadline passed
    pub(crate) fn flush_pending_resize(&self) {
        let due = self
            .shared
            .state
            .write()
            .debouncer
            .take_due(Instant::now());
        if let Some((width, height)) = due {
            self.handle_resize(width, height);
        }
    }
}
