//! Dispatch Serializer and Queues
//!
//! Input events and deferred work are produced by independent execution
//! contexts but must never be handled concurrently. Every unit of work (one
//! raw event, one queued closure, one due resize) runs inside
//! [`DispatchSerializer::with_lock`].
//!
//! # Architecture
//!
//! ```text
//! surface.poll_event() ──────────────────────────┐
//!                                                │
//! queue_event() ──► [event queue] ──► events ────┼──► DispatchSerializer ──► handlers
//!                                                │
//! queue_update() ─► [work queue] ───► work ──────┘
//!
//! set_surface()/stop() ──► [replacement slot] ──► supervisor
//! ```
//!
//! The serializer is not the lock protecting the application's fields; it
//! orders handler invocations. Within one queue execution order is
//! submission order. Across the two queues no order is promised.

use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};
use parking_lot::Mutex;
use tracing::debug;

use crate::event::RawEvent;
use crate::surface::SurfaceRef;

/// Default capacity of the event and work queues
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Mutual-exclusion gate around handler invocations
#[derive(Debug, Default)]
pub struct DispatchSerializer {
    gate: Mutex<()>,
}

impl DispatchSerializer {
    /// Create an open gate
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `work` with the gate held
    ///
    /// The gate is released when `work` returns or unwinds.
    pub fn with_lock<R>(&self, work: impl FnOnce() -> R) -> R {
        let _guard = self.gate.lock();
        work()
    }

    /// Whether some unit of work currently holds the gate
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.gate.is_locked()
    }
}

/// Closure scheduled on the work queue
pub type UpdateFn = Box<dyn FnOnce() + Send + 'static>;

/// Work-queue item
pub enum Job {
    /// Run this closure under the serializer
    Update(UpdateFn),
    /// Stop draining
    Shutdown,
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Update(_) => f.write_str("Job::Update"),
            Self::Shutdown => f.write_str("Job::Shutdown"),
        }
    }
}

/// Event-queue item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueuedEvent {
    /// Handle this raw event under the serializer
    Event(RawEvent),
    /// Stop draining
    Shutdown,
}

/// Tells the poll loop what happened to the surface it was polling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollSignal {
    /// A replacement surface was installed; poll it
    Installed,
    /// No replacement is coming; exit
    Closed,
}

/// Receiving ends, taken once by `run`
#[derive(Debug)]
pub struct Receivers {
    /// Work queue
    pub jobs: Receiver<Job>,
    /// Event queue
    pub events: Receiver<QueuedEvent>,
    /// Single-slot surface handoff; `None` means shut down
    pub slot: Receiver<Option<SurfaceRef>>,
    /// Debounce timer re-arm requests
    pub rearm: Receiver<()>,
    /// Surface changes for the poll loop
    pub poll: Receiver<PollSignal>,
    /// Disconnects when an execution context failed
    pub halt: Receiver<()>,
}

/// Every channel the execution contexts communicate through
pub struct Queues {
    jobs: Sender<Job>,
    events: Sender<QueuedEvent>,
    slot: Sender<Option<SurfaceRef>>,
    rearm: Sender<()>,
    poll: Sender<PollSignal>,
    halt: Mutex<Option<Sender<()>>>,
    receivers: Mutex<Option<Receivers>>,
}

impl std::fmt::Debug for Queues {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Queues")
            .field("pending_jobs", &self.jobs.len())
            .field("pending_events", &self.events.len())
            .field("taken", &self.receivers.lock().is_none())
            .finish()
    }
}

impl Queues {
    /// Create the queues; event and work queues hold `capacity` items
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (jobs_tx, jobs_rx) = bounded(capacity);
        let (events_tx, events_rx) = bounded(capacity);
        let (slot_tx, slot_rx) = bounded(1);
        let (rearm_tx, rearm_rx) = bounded(1);
        let (poll_tx, poll_rx) = unbounded();
        let (halt_tx, halt_rx) = bounded(0);

        Self {
            jobs: jobs_tx,
            events: events_tx,
            slot: slot_tx,
            rearm: rearm_tx,
            poll: poll_tx,
            halt: Mutex::new(Some(halt_tx)),
            receivers: Mutex::new(Some(Receivers {
                jobs: jobs_rx,
                events: events_rx,
                slot: slot_rx,
                rearm: rearm_rx,
                poll: poll_rx,
                halt: halt_rx,
            })),
        }
    }

    /// Take the receiving ends; `None` if already taken
    pub fn take_receivers(&self) -> Option<Receivers> {
        self.receivers.lock().take()
    }

    /// Put back receivers taken by a `run` that failed to start
    pub fn restore_receivers(&self, receivers: Receivers) {
        *self.receivers.lock() = Some(receivers);
    }

    /// Enqueue a job, blocking while the work queue is full
    ///
    /// Returns `false` if the work loop is gone and the job was dropped.
    pub fn push_job(&self, job: Job) -> bool {
        match self.jobs.send(job) {
            Ok(()) => true,
            Err(err) => {
                debug!(job = ?err.into_inner(), "work queue closed, dropping job");
                false
            }
        }
    }

    /// Enqueue an event, blocking while the event queue is full
    ///
    /// Returns `false` if the event loop is gone and the event was dropped.
    pub fn push_event(&self, event: QueuedEvent) -> bool {
        match self.events.send(event) {
            Ok(()) => true,
            Err(err) => {
                debug!(event = ?err.into_inner(), "event queue closed, dropping event");
                false
            }
        }
    }

    /// Hand a surface (or the shutdown request) to the supervisor
    pub fn offer_surface(&self, surface: Option<SurfaceRef>) -> bool {
        self.slot.send(surface).is_ok()
    }

    /// Ask the event loop to rebuild its debounce timer
    pub fn rearm(&self) {
        match self.rearm.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => {}
            Err(TrySendError::Disconnected(())) => debug!("event loop gone, re-arm ignored"),
        }
    }

    /// Tell the poll loop about a surface change
    pub fn signal_poll(&self, signal: PollSignal) {
        // Unbounded; only fails once the poll loop has exited
        let _ = self.poll.send(signal);
    }

    /// Wake every execution context so it exits
    pub fn halt(&self) {
        self.halt.lock().take();
    }
}
