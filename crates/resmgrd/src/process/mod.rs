//! Process lifecycle: launch sequencing and shutdown coordination.

use std::time::Duration;

mod errors;
pub(crate) mod launch;
pub(crate) mod shutdown;

pub use errors::LaunchError;
pub use launch::run_daemon;
#[cfg(test)]
pub(crate) use launch::{LaunchPlan, run_daemon_with};
pub use shutdown::{
    ShutdownCoordinator, ShutdownError, ShutdownNotifier, ShutdownReason, ShutdownSignal,
    SystemShutdownSignal,
};

pub(crate) const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");
pub(crate) const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);
