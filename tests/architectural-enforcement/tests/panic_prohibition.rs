//! Integration Test: Panic Prohibition
//!
//! **Policy**: Production code propagates errors instead of calling
//! `unwrap()` or `expect()`. A handler panic is recovered by the engine, but
//! a panic in the engine itself would leave the terminal in raw mode.
//! **Exceptions**: test code

use architectural_enforcement::scan;

fn is_panicking_call(code: &str) -> bool {
    code.contains(".unwrap()") || code.contains(".expect(")
}

#[test]
fn test_no_unwrap_or_expect_in_production_code() {
    let violations = scan(is_panicking_call);

    if !violations.is_empty() {
        eprintln!("\nunwrap()/expect() found in production code:\n");
        for violation in &violations {
            eprintln!("  {violation}");
        }
        panic!(
            "\nFound {} panicking call(s) in production code.\nPropagate the error with `?` or handle it.",
            violations.len()
        );
    }
}

#[test]
fn test_panicking_call_detection() {
    assert!(is_panicking_call("let x = y.unwrap();"));
    assert!(is_panicking_call("let x = y.expect(\"present\");"));
    assert!(!is_panicking_call("let x = y.unwrap_or_default();"));
    assert!(!is_panicking_call("let x = y.unwrap_or_else(|_| 0);"));
}
