//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Production code MUST NOT call sleep methods. Waiting is done on
//! channels, condition variables or `event::poll` timeouts, which wake as soon
//! as there is something to do.
//! **Exceptions**: test code

use architectural_enforcement::scan;

fn is_sleep(code: &str) -> bool {
    code.contains("::sleep(") || code.contains(".sleep(")
}

#[test]
fn test_no_sleep_in_production_code() {
    let violations = scan(is_sleep);

    if !violations.is_empty() {
        eprintln!("\nSleep calls found in production code:\n");
        for violation in &violations {
            eprintln!("  {violation}");
        }
        eprintln!("\nUse instead:");
        eprintln!("  - crossbeam_channel::select! with at()/tick() for deadlines");
        eprintln!("  - parking_lot::Condvar::wait_for for parked loops");
        eprintln!("  - crossterm::event::poll(timeout) for terminal input");

        panic!(
            "\nFound {} sleep violation(s) in production code.\nFix these before merging!",
            violations.len()
        );
    }
}

#[test]
fn test_sleep_detection() {
    assert!(is_sleep("    std::thread::sleep(Duration::from_millis(10));"));
    assert!(is_sleep("    thread::sleep(delay);"));
    assert!(!is_sleep("    let sleeper = Sleeper::new();"));
}
