//! Resize Debouncer
//!
//! Interactive resizes deliver many samples per second. Samples arriving
//! within the throttle interval of the last processed resize are held back;
//! only the most recent one is processed when the interval runs out.

use std::time::{Duration, Instant};

/// Default throttle interval between processed resizes
pub const DEFAULT_RESIZE_THROTTLE: Duration = Duration::from_millis(50);

/// What to do with a resize sample
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResizeDecision {
    /// Process now: clear, record dimensions, notify, redraw
    Process,
    /// Held back until `deadline`; the latest held sample wins
    Deferred {
        /// When the held sample becomes due
        deadline: Instant,
    },
}

#[derive(Clone, Copy, Debug)]
struct PendingResize {
    width: u16,
    height: u16,
    deadline: Instant,
}

/// Throttle state for resize samples
#[derive(Clone, Debug)]
pub struct ResizeDebouncer {
    interval: Duration,
    last_processed: Option<Instant>,
    pending: Option<PendingResize>,
}

impl Default for ResizeDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_RESIZE_THROTTLE)
    }
}

impl ResizeDebouncer {
    /// Create a debouncer with the given throttle interval
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_processed: None,
            pending: None,
        }
    }

    /// The throttle interval
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Change the throttle interval; takes effect for the next sample
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Offer a raw sample.
    ///
    /// On [`ResizeDecision::Process`] the sample counts as processed at `now`
    /// and any held sample is discarded.
    pub fn offer(&mut self, width: u16, height: u16, now: Instant) -> ResizeDecision {
        if let Some(last) = self.last_processed {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < self.interval {
                let deadline = last + self.interval;
                self.pending = Some(PendingResize {
                    width,
                    height,
                    deadline,
                });
                return ResizeDecision::Deferred { deadline };
            }
        }

        self.mark_processed(now);
        ResizeDecision::Process
    }

    /// Record that the surface dimensions were taken at `now`
    pub fn mark_processed(&mut self, now: Instant) {
        self.last_processed = Some(now);
        self.pending = None;
    }

    /// When the held sample is due, if one is held
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|p| p.deadline)
    }

    /// Take the held sample if it is due at `now`
    pub fn take_due(&mut self, now: Instant) -> Option<(u16, u16)> {
        match self.pending {
            Some(p) if now >= p.deadline => {
                self.pending = None;
                Some((p.width, p.height))
            }
            _ => None,
        }
    }

    /// Drop all throttle history
    pub fn reset(&mut self) {
        self.last_processed = None;
        self.pending = None;
    }
}
