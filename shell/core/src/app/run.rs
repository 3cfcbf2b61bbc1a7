//! Lifecycle and execution contexts
//!
//! `run` drives four execution contexts:
//!
//! | Context    | Thread                 | Drains                        |
//! |------------|------------------------|-------------------------------|
//! | poll       | caller                 | `Surface::poll_event`         |
//! | work       | `termshell-work`       | work queue                    |
//! | events     | `termshell-events`     | event queue + resize timer    |
//! | supervisor | `termshell-supervisor` | replacement slot              |
//!
//! Each context runs inside a panic guard. A panic stops the application,
//! which finalizes the surface exactly once, wakes the other contexts and is
//! re-raised from `run` after every context has exited.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crossbeam_channel::{at, never, select, Receiver};
use tracing::{debug, error, info, warn};

use super::{Application, Lifecycle};
use crate::dispatch::{Job, PollSignal, QueuedEvent, Receivers};
use crate::error::{Result, ShellError};
use crate::surface::{SurfaceError, SurfaceRef};

type PanicPayload = Box<dyn Any + Send + 'static>;

impl Application {
    /// Make sure a surface is installed
    ///
    /// Uses the surface factory if no surface was set.
    ///
    /// # Errors
    ///
    /// [`ShellError::NoSurface`] without surface and factory, or
    /// [`ShellError::Surface`] if the surface fails to initialize.
    pub fn init(&self) -> Result<()> {
        if self.shared.state.read().surface.is_some() {
            return Ok(());
        }
        let surface = {
            let factory = self.shared.factory.lock();
            let factory = factory.as_ref().ok_or(ShellError::NoSurface)?;
            factory()?
        };
        self.install(surface)?;
        Ok(())
    }

    /// Install a new surface
    ///
    /// Before `run`, the surface is initialized right away. While running,
    /// the current surface is finalized and the new one is handed to the
    /// supervisor, which initializes it, resumes polling and draws.
    ///
    /// # Errors
    ///
    /// [`ShellError::Surface`] if the surface fails to initialize before
    /// `run`. Failures while running are returned from `run`.
    pub fn set_surface(&self, surface: SurfaceRef) -> Result<()> {
        let (old, running, stopping) = {
            let mut state = self.shared.state.write();
            (state.surface.take(), state.running, state.stopping)
        };
        if let Some(old) = old {
            old.fini();
        }

        if stopping {
            debug!("application stopping, replacement ignored");
            return Ok(());
        }
        if running {
            info!("replacing surface");
            self.shared.queues.offer_surface(Some(surface));
            return Ok(());
        }
        self.install(surface)?;
        Ok(())
    }

    /// Initialize `surface` and make it current
    ///
    /// Returns `Ok(false)` if `stop` ran while `init` was in progress; the
    /// surface is finalized instead of installed.
    pub(crate) fn install(&self, surface: SurfaceRef) -> std::result::Result<bool, SurfaceError> {
        surface.init()?;
        let (width, height) = surface.size();

        let settings = {
            let mut state = self.shared.state.write();
            if state.stopping {
                None
            } else {
                state.surface = Some(Arc::clone(&surface));
                state.dimensions = Some((width, height));
                state.debouncer.mark_processed(Instant::now());
                state.lifecycle = Lifecycle::Running;
                Some((state.enable_paste, state.enable_mouse))
            }
        };
        let Some((paste, mouse)) = settings else {
            debug!("stopped during surface init, finalizing it");
            surface.fini();
            return Ok(false);
        };

        if paste {
            surface.enable_paste();
        } else {
            surface.disable_paste();
        }
        if mouse {
            surface.enable_mouse();
        } else {
            surface.disable_mouse();
        }

        info!(width, height, "surface installed");
        Ok(true)
    }

    /// Finalize the surface and end `run`
    ///
    /// Idempotent. While running, this also ends `run` when no surface is
    /// installed, for example while a replacement is still initializing.
    pub fn stop(&self) {
        self.release(None);
    }

    /// Stop, but only if `expected` is still the installed surface
    fn release(&self, expected: Option<&SurfaceRef>) {
        let (surface, notify) = {
            let mut state = self.shared.state.write();
            if let Some(expected) = expected {
                let current = state
                    .surface
                    .as_ref()
                    .is_some_and(|current| crate::surface::same_surface(current, expected));
                if !current {
                    return;
                }
            }
            let surface = state.surface.take();
            let notify = state.running && !state.stopping;
            if state.running {
                state.stopping = true;
            } else if surface.is_some() {
                state.lifecycle = Lifecycle::Stopped;
            }
            (surface, notify)
        };

        if let Some(surface) = surface {
            surface.fini();
            info!("application stopping");
        }
        if notify {
            self.shared.queues.offer_surface(None);
        }
    }

    /// Hand the terminal to the OS while `f` runs
    ///
    /// Returns `Ok(false)` without calling `f` when no surface is active.
    /// If the surface is replaced or stopped while `f` runs, it is not
    /// resumed.
    ///
    /// # Errors
    ///
    /// A failing suspend or resume stops the application and is returned.
    pub fn suspend<F: FnOnce()>(&self, f: F) -> Result<bool> {
        let Some(surface) = self.surface() else {
            return Ok(false);
        };

        if let Err(err) = surface.suspend() {
            error!(error = %err, "failed to suspend surface");
            self.stop();
            return Err(err.into());
        }
        debug!("surface suspended");

        f();

        let still_current = self
            .surface()
            .is_some_and(|current| crate::surface::same_surface(&current, &surface));
        if !still_current {
            debug!("surface changed during suspend, not resuming");
            return Ok(true);
        }

        if let Err(err) = surface.resume() {
            error!(error = %err, "failed to resume surface");
            self.stop();
            return Err(err.into());
        }
        debug!("surface resumed");

        self.draw(&[]);
        Ok(true)
    }

    /// Run the application until it is stopped
    ///
    /// Acquires a surface if needed, draws once and drives the execution
    /// contexts. Returns after every context has exited.
    ///
    /// # Errors
    ///
    /// [`ShellError::AlreadyRunning`] on a second call, surface
    /// acquisition errors, [`ShellError::Spawn`], and
    /// [`ShellError::Replacement`] if a replacement surface failed.
    ///
    /// # Panics
    ///
    /// A panic in any handler is re-raised here after the surface was
    /// finalized.
    pub fn run(&self) -> Result<()> {
        let receivers = self
            .shared
            .queues
            .take_receivers()
            .ok_or(ShellError::AlreadyRunning)?;

        if let Err(err) = self.init() {
            self.shared.queues.restore_receivers(receivers);
            return Err(err);
        }

        {
            let mut state = self.shared.state.write();
            state.running = true;
            state.stopping = false;
        }
        info!("application running");

        let Receivers {
            jobs,
            events,
            slot,
            rearm,
            poll,
            halt,
        } = receivers;

        let initial = self.guarded("poll", || {
            self.shared.serializer.with_lock(|| self.force_draw());
        });
        if let Err(payload) = initial {
            self.finish_run();
            panic::resume_unwind(payload);
        }

        let mut handles = Vec::with_capacity(3);
        let spawned = self.spawn_contexts(jobs, events, slot, rearm, &halt, &mut handles);

        let mut first_panic = match spawned {
            Ok(()) => self
                .guarded("poll", || self.poll_loop(&poll, &halt))
                .err(),
            Err(err) => {
                self.abort();
                Self::join_all(handles);
                self.finish_run();
                return Err(err);
            }
        };

        if let Some(payload) = Self::join_all(handles) {
            first_panic.get_or_insert(payload);
        }
        let failure = self.finish_run();

        if let Some(payload) = first_panic {
            panic::resume_unwind(payload);
        }
        if let Some(err) = failure {
            return Err(ShellError::Replacement(err));
        }

        info!("application exited");
        Ok(())
    }

    fn finish_run(&self) -> Option<SurfaceError> {
        let mut state = self.shared.state.write();
        state.running = false;
        state.stopping = false;
        state.lifecycle = Lifecycle::Stopped;
        state.capture = None;
        state.failure.take()
    }

    fn join_all(handles: Vec<JoinHandle<thread::Result<()>>>) -> Option<PanicPayload> {
        let mut first = None;
        for handle in handles {
            if let Err(payload) = handle.join().and_then(|result| result) {
                first.get_or_insert(payload);
            }
        }
        first
    }

    fn spawn_contexts(
        &self,
        jobs: Receiver<Job>,
        events: Receiver<QueuedEvent>,
        slot: Receiver<Option<SurfaceRef>>,
        rearm: Receiver<()>,
        halt: &Receiver<()>,
        handles: &mut Vec<JoinHandle<thread::Result<()>>>,
    ) -> Result<()> {
        let work_halt = halt.clone();
        handles.push(self.spawn_context("work", move |app| {
            app.work_loop(&jobs, &work_halt);
        })?);

        let events_halt = halt.clone();
        handles.push(self.spawn_context("events", move |app| {
            app.event_loop(&events, &rearm, &events_halt);
        })?);

        let supervisor_halt = halt.clone();
        handles.push(self.spawn_context("supervisor", move |app| {
            app.supervise(&slot, &supervisor_halt);
        })?);

        Ok(())
    }

    fn spawn_context<F>(
        &self,
        context: &'static str,
        body: F,
    ) -> Result<JoinHandle<thread::Result<()>>>
    where
        F: FnOnce(&Application) + Send + 'static,
    {
        let app = self.clone();
        thread::Builder::new()
            .name(format!("termshell-{context}"))
            .spawn(move || app.guarded(context, || body(&app)))
            .map_err(|source| ShellError::Spawn { context, source })
    }

    /// Run one execution context; on panic, restore the terminal first
    fn guarded(&self, context: &'static str, body: impl FnOnce()) -> thread::Result<()> {
        let result = panic::catch_unwind(AssertUnwindSafe(body));
        if result.is_err() {
            error!(context, "execution context panicked, restoring terminal");
            self.abort();
        }
        result
    }

    fn abort(&self) {
        self.stop();
        self.shared.queues.halt();
    }

    fn poll_loop(&self, signals: &Receiver<PollSignal>, halt: &Receiver<()>) {
        loop {
            if let Some(surface) = self.surface() {
                if let Some(event) = surface.poll_event() {
                    self.shared
                        .serializer
                        .with_lock(|| self.handle_event(event));
                    continue;
                }
                // End of input; a no-op once the surface was replaced or stopped
                self.release(Some(&surface));
            }

            select! {
                recv(signals) -> signal => match signal {
                    Ok(PollSignal::Installed) => {}
                    Ok(PollSignal::Closed) | Err(_) => return,
                },
                recv(halt) -> _ => return,
            }
        }
    }

    fn work_loop(&self, jobs: &Receiver<Job>, halt: &Receiver<()>) {
        loop {
            select! {
                recv(jobs) -> job => match job {
                    Ok(Job::Update(f)) => self.shared.serializer.with_lock(f),
                    Ok(Job::Shutdown) | Err(_) => return,
                },
                recv(halt) -> _ => return,
            }
        }
    }

    fn event_loop(
        &self,
        events: &Receiver<QueuedEvent>,
        rearm: &Receiver<()>,
        halt: &Receiver<()>,
    ) {
        loop {
            // Rebuilt every pass so a stale deadline never fires
            let deadline = self.shared.state.read().debouncer.deadline();
            let timer = match deadline {
                Some(deadline) => at(deadline),
                None => never(),
            };

            select! {
                recv(events) -> event => match event {
                    Ok(QueuedEvent::Event(event)) => {
                        self.shared.serializer.with_lock(|| self.handle_event(event));
                    }
                    Ok(QueuedEvent::Shutdown) | Err(_) => return,
                },
                recv(rearm) -> _ => {}
                recv(timer) -> _ => {
                    self.shared.serializer.with_lock(|| self.flush_pending_resize());
                }
                recv(halt) -> _ => return,
            }
        }
    }

    fn supervise(&self, slot: &Receiver<Option<SurfaceRef>>, halt: &Receiver<()>) {
        loop {
            let next = select! {
                recv(slot) -> next => next.ok().flatten(),
                recv(halt) -> _ => return,
            };

            let Some(surface) = next else {
                self.shut_down();
                return;
            };

            match self.install(surface) {
                Ok(true) => {
                    self.shared.queues.signal_poll(PollSignal::Installed);
                    self.draw(&[]);
                }
                Ok(false) => {
                    self.shut_down();
                    return;
                }
                Err(err) => {
                    error!(error = %err, "replacement surface failed to initialize");
                    self.shared.state.write().failure = Some(err);
                    self.shut_down();
                    return;
                }
            }
        }
    }

    /// No replacement is coming: release the surface and drain out
    fn shut_down(&self) {
        let surface = {
            let mut state = self.shared.state.write();
            state.lifecycle = Lifecycle::Stopped;
            state.surface.take()
        };
        if let Some(surface) = surface {
            warn!("surface still installed at shutdown, finalizing");
            surface.fini();
        }

        self.shared.queues.push_job(Job::Shutdown);
        self.shared.queues.push_event(QueuedEvent::Shutdown);
        self.shared.queues.signal_poll(PollSignal::Closed);
        info!("application stopped");
    }
}
