//! Resize throttling through the running application

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use common::{started_signal, wait_until, Probe, TIMEOUT};
use parking_lot::Mutex;
use termshell_core::{Application, Component, RawEvent, Rect, SimSurface};

const THROTTLE: Duration = Duration::from_millis(300);

struct ResizeLog {
    count: AtomicUsize,
    last: Mutex<Option<(u16, u16)>>,
}

fn install_logger(app: &Application) -> Arc<ResizeLog> {
    let log = Arc::new(ResizeLog {
        count: AtomicUsize::new(0),
        last: Mutex::new(None),
    });
    let hook_log = Arc::clone(&log);
    app.set_after_resize(move |width, height| {
        hook_log.count.fetch_add(1, Ordering::SeqCst);
        *hook_log.last.lock() = Some((width, height));
    });
    log
}

#[test]
fn test_burst_is_coalesced_into_latest_sample() {
    let app = Application::new();
    app.set_resize_throttle(THROTTLE);
    let (surface, handle) = SimSurface::new(80, 24);
    app.set_surface(surface).expect("install surface");
    let root = Probe::new("root");
    app.set_root(root.component(), true);
    let log = install_logger(&app);

    let started = started_signal(&app);
    let driver = {
        let log = Arc::clone(&log);
        thread::spawn(move || {
            started.recv_timeout(TIMEOUT).expect("application started");
            // Let the acquisition-time throttle run out
            thread::sleep(THROTTLE + Duration::from_millis(50));

            handle.resize(81, 30);
            assert!(wait_until(TIMEOUT, || log.count.load(Ordering::SeqCst) == 1));

            for width in 82..=90 {
                handle.resize(width, 30);
            }
            assert!(wait_until(TIMEOUT, || log.count.load(Ordering::SeqCst) == 2));

            // Nothing else is held back
            thread::sleep(THROTTLE + Duration::from_millis(100));
            let settled = log.count.load(Ordering::SeqCst);

            handle.inject(RawEvent::interrupt());
            settled
        })
    };

    app.run().expect("run ends cleanly");
    let settled = driver.join().expect("driver thread");

    assert_eq!(settled, 2);
    assert_eq!(*log.last.lock(), Some((90, 30)));
    assert_eq!(app.surface_size(), Some((90, 30)));
    assert_eq!(root.rect(), Rect::new(0, 0, 90, 30));
}

#[test]
fn test_resize_inside_throttle_after_acquisition_is_deferred() {
    let app = Application::new();
    app.set_resize_throttle(THROTTLE);
    let (surface, handle) = SimSurface::new(80, 24);
    app.set_surface(surface).expect("install surface");
    let log = install_logger(&app);

    // Queued right behind acquisition, well inside the throttle
    handle.resize(100, 40);

    let driver = {
        let log = Arc::clone(&log);
        let handle = handle.clone();
        thread::spawn(move || {
            assert!(wait_until(TIMEOUT, || log.count.load(Ordering::SeqCst) == 1));
            handle.inject(RawEvent::interrupt());
        })
    };

    app.run().expect("run ends cleanly");
    driver.join().expect("driver thread");

    assert_eq!(log.count.load(Ordering::SeqCst), 1);
    assert_eq!(*log.last.lock(), Some((100, 40)));
    assert!(handle.clear_calls() >= 1);
}

#[test]
fn test_zero_throttle_processes_every_sample() {
    let app = Application::new();
    app.set_resize_throttle(Duration::ZERO);
    let (surface, handle) = SimSurface::new(80, 24);
    app.set_surface(surface).expect("install surface");
    let log = install_logger(&app);

    for width in 1..=5 {
        handle.resize(width, 10);
    }
    handle.inject(RawEvent::interrupt());

    app.run().expect("run ends cleanly");

    assert_eq!(log.count.load(Ordering::SeqCst), 5);
    assert_eq!(*log.last.lock(), Some((5, 10)));
}
