//! Device resource-manager daemon.
//!
//! The daemon owns one bounded byte buffer and lends it to clients connected
//! over a Unix stream socket. Any number of sessions may read, clear or query
//! the buffer at once, but only one session at a time may write to it: the
//! first `WRITE` claims the device and the claim lasts until that session
//! disconnects.
//!
//! Startup loads configuration through [`resmgr_config`], installs structured
//! telemetry, binds the socket and serves each connection on its own thread.
//! SIGINT or SIGTERM stops the accept loop, removes the socket file and
//! cancels the remaining sessions before [`run_daemon`] returns.

mod bootstrap;
pub mod device;
mod process;
pub mod protocol;
pub mod session;
mod telemetry;
mod transport;

pub use bootstrap::{ConfigLoader, StaticConfigLoader, SystemConfigLoader};
pub use device::{Device, DeviceState, DeviceStatus, SessionId, WriteOutcome};
pub use process::{
    LaunchError, ShutdownCoordinator, ShutdownError, ShutdownNotifier, ShutdownReason,
    ShutdownSignal, SystemShutdownSignal, run_daemon,
};
pub use telemetry::{TelemetryError, TelemetryHandle, initialise as initialise_telemetry};

#[cfg(test)]
mod tests;
