//! Test harness utilities shared by the behavioural suites.

mod client;
mod server;
mod shutdown;

pub use client::Client;
pub use server::{RunningServer, socket_in};
pub use shutdown::ManualShutdownSignal;

use std::time::{Duration, Instant};

pub const WAIT_TIMEOUT: Duration = Duration::from_secs(2);
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Polls `condition` until it holds or [`WAIT_TIMEOUT`] elapses.
pub fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + WAIT_TIMEOUT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(POLL_INTERVAL);
    }
    condition()
}
