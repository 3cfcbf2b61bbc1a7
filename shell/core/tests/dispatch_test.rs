//! Dispatch serialization and per-queue ordering

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use common::{wait_until, Probe, TIMEOUT};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use termshell_core::{Application, KeyCode, RawEvent, SimSurface};

/// Counts concurrently running handler bodies
#[derive(Default)]
struct Overlap {
    active: AtomicUsize,
    peak: AtomicUsize,
    completed: AtomicUsize,
}

impl Overlap {
    fn enter_exit(&self) {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        thread::yield_now();
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_handlers_never_run_concurrently() {
    const UPDATES_PER_PRODUCER: usize = 50;
    const PRODUCERS: usize = 3;
    const POLLED_KEYS: usize = 40;
    const QUEUED_KEYS: usize = 40;

    let app = Application::new();
    let (surface, handle) = SimSurface::new(40, 10);
    app.set_surface(surface).expect("install surface");
    app.set_root(Probe::new("root").component(), true);

    let overlap = Arc::new(Overlap::default());
    {
        let overlap = Arc::clone(&overlap);
        app.set_input_interceptor(move |key| {
            overlap.enter_exit();
            Some(key)
        });
    }

    let total = PRODUCERS * UPDATES_PER_PRODUCER + POLLED_KEYS + QUEUED_KEYS;
    let driver = {
        let app = app.clone();
        let overlap = Arc::clone(&overlap);
        thread::spawn(move || {
            let producers: Vec<_> = (0..PRODUCERS)
                .map(|_| {
                    let app = app.clone();
                    let overlap = Arc::clone(&overlap);
                    thread::spawn(move || {
                        for _ in 0..UPDATES_PER_PRODUCER {
                            let overlap = Arc::clone(&overlap);
                            app.queue_update(move || overlap.enter_exit());
                        }
                    })
                })
                .collect();

            for _ in 0..POLLED_KEYS {
                handle.inject(RawEvent::key(KeyCode::Char('p')));
            }
            for _ in 0..QUEUED_KEYS {
                app.queue_event(RawEvent::key(KeyCode::Char('q')));
            }
            for producer in producers {
                producer.join().expect("producer");
            }

            assert!(wait_until(TIMEOUT, || {
                overlap.completed.load(Ordering::SeqCst) >= total
            }));
            handle.inject(RawEvent::interrupt());
        })
    };

    app.run().expect("run ends cleanly");
    driver.join().expect("driver thread");

    // The interrupt also passes the interceptor
    assert_eq!(overlap.completed.load(Ordering::SeqCst), total + 1);
    assert_eq!(overlap.peak.load(Ordering::SeqCst), 1);
}

#[test]
fn test_work_queue_is_fifo() {
    let app = Application::new();
    let (surface, _handle) = SimSurface::new(10, 5);
    app.set_surface(surface).expect("install surface");

    let order = Arc::new(Mutex::new(Vec::new()));
    for i in 0..60 {
        let order = Arc::clone(&order);
        app.queue_update(move || order.lock().push(i));
    }
    let stopper = app.clone();
    app.queue_update(move || stopper.stop());

    app.run().expect("run ends cleanly");

    assert_eq!(*order.lock(), (0..60).collect::<Vec<_>>());
}

#[test]
fn test_event_queue_is_fifo() {
    let app = Application::new();
    let (surface, handle) = SimSurface::new(10, 5);
    app.set_surface(surface).expect("install surface");
    let root = Probe::new("root");
    app.set_root(root.component(), false);

    let letters: Vec<char> = ('a'..='z').collect();
    for &c in &letters {
        app.queue_event(RawEvent::key(KeyCode::Char(c)));
    }
    app.queue_event(RawEvent::interrupt());

    app.run().expect("run ends cleanly");

    let expected: Vec<KeyCode> = letters.into_iter().map(KeyCode::Char).collect();
    assert_eq!(root.key_codes(), expected);
    assert_eq!(handle.fini_calls(), 1);
}

#[test]
fn test_queue_update_draw_draws_listed_components_only() {
    let app = Application::new();
    let (surface, handle) = SimSurface::new(10, 5);
    app.set_surface(surface).expect("install surface");

    let root = Probe::new("root");
    let child = Probe::new("child");
    app.set_root(root.component(), true);

    let shows_before = Arc::new(AtomicUsize::new(usize::MAX));
    let root_draws_before = Arc::new(AtomicUsize::new(usize::MAX));
    {
        let shows_before = Arc::clone(&shows_before);
        let root_draws_before = Arc::clone(&root_draws_before);
        let handle = handle.clone();
        let root = Arc::clone(&root);
        app.queue_update(move || {
            shows_before.store(handle.show_calls(), Ordering::SeqCst);
            root_draws_before.store(root.draws.load(Ordering::SeqCst), Ordering::SeqCst);
        });
    }
    app.queue_update_draw(|| {}, &[child.component()]);
    let stopper = app.clone();
    app.queue_update(move || stopper.stop());

    app.run().expect("run ends cleanly");

    // The initial draw ran before any queued work
    assert_eq!(root_draws_before.load(Ordering::SeqCst), 1);
    assert_eq!(child.draws.load(Ordering::SeqCst), 1);
    assert_eq!(root.draws.load(Ordering::SeqCst), 1);
    assert_eq!(
        handle.show_calls(),
        shows_before.load(Ordering::SeqCst) + 1
    );
}

#[test]
fn test_queue_after_shutdown_is_dropped() {
    let app = Application::new();
    let (surface, handle) = SimSurface::new(10, 5);
    app.set_surface(surface).expect("install surface");
    handle.inject(RawEvent::interrupt());
    app.run().expect("run ends cleanly");

    let ran = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&ran);
    app.queue_update(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    app.queue_event(RawEvent::key(KeyCode::Enter));

    assert_eq!(ran.load(Ordering::SeqCst), 0);
}
