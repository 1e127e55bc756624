//! Ctrl-C delivery to cancellation tokens.
//!
//! Runs in its own test binary: the handler is process-wide and a SIGINT
//! with no live token would exit the process.

#![cfg(unix)]

use envplan_core::{install_signal_handler, CancelToken};
use std::process::Command;
use std::time::{Duration, Instant};

fn wait_until(cond: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    cond()
}

#[test]
fn sigint_cancels_every_installed_token() {
    let first = CancelToken::new();
    let second = CancelToken::new();
    install_signal_handler(&first).unwrap();
    install_signal_handler(&second).unwrap();

    let status = Command::new("kill")
        .args(["-INT", &std::process::id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());

    assert!(
        wait_until(|| first.is_cancelled() && second.is_cancelled()),
        "first={} second={}",
        first.is_cancelled(),
        second.is_cancelled()
    );
}
