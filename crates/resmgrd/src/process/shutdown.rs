//! Shutdown coordination between signal handlers, the listener and `main`.
//!
//! Anything that wants the process to stop holds a [`ShutdownNotifier`].
//! The launch sequence blocks on the matching [`ShutdownCoordinator`] and
//! performs the teardown itself, so signal handlers never touch sockets or
//! the device.

use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use signal_hook::consts::signal::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::{debug, info};

use super::PROCESS_TARGET;

/// Why the daemon is stopping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownReason {
    /// A termination signal arrived.
    Signal(i32),
    /// The accept loop hit an unrecoverable error.
    AcceptFailed {
        /// Kind of the underlying IO error.
        kind: io::ErrorKind,
        /// Rendered IO error.
        message: String,
    },
    /// Shutdown was requested programmatically.
    Requested,
    /// Every notifier was dropped without a request.
    ChannelClosed,
}

/// Cloneable handle that requests shutdown.
#[derive(Debug, Clone)]
pub struct ShutdownNotifier {
    sender: Sender<ShutdownReason>,
}

impl ShutdownNotifier {
    /// Requests shutdown. Requests after the first are ignored.
    pub fn notify(&self, reason: ShutdownReason) {
        if self.sender.send(reason).is_err() {
            debug!(
                target: PROCESS_TARGET,
                "shutdown already in progress; request ignored"
            );
        }
    }
}

/// Receiving side of the shutdown channel.
#[derive(Debug)]
pub struct ShutdownCoordinator {
    sender: Sender<ShutdownReason>,
    receiver: Receiver<ShutdownReason>,
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownCoordinator {
    /// Creates a coordinator with no pending request.
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self { sender, receiver }
    }

    /// Hands out a notifier bound to this coordinator.
    #[must_use]
    pub fn notifier(&self) -> ShutdownNotifier {
        ShutdownNotifier {
            sender: self.sender.clone(),
        }
    }

    /// Blocks until the first shutdown request and returns its reason.
    pub fn wait(self) -> ShutdownReason {
        let Self { sender, receiver } = self;
        drop(sender);
        receiver.recv().unwrap_or(ShutdownReason::ChannelClosed)
    }
}

/// Source of external shutdown requests.
pub trait ShutdownSignal: Send + Sync {
    /// Arranges for `notifier` to fire when shutdown should begin.
    fn install(&self, notifier: ShutdownNotifier) -> Result<(), ShutdownError>;
}

/// Errors reported while installing shutdown listeners.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The signal watcher thread could not be started.
    #[error("failed to spawn signal watcher thread: {source}")]
    Spawn {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Watches for SIGINT and SIGTERM on a dedicated thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShutdownSignal;

impl SystemShutdownSignal {
    /// Signals that request a graceful stop.
    pub const SIGNALS: [i32; 2] = [SIGINT, SIGTERM];
}

impl ShutdownSignal for SystemShutdownSignal {
    fn install(&self, notifier: ShutdownNotifier) -> Result<(), ShutdownError> {
        let mut signals =
            Signals::new(Self::SIGNALS).map_err(|source| ShutdownError::Install { source })?;
        thread::Builder::new()
            .name(String::from("resmgr-signals"))
            .spawn(move || {
                if let Some(signal) = signals.forever().next() {
                    info!(target: PROCESS_TARGET, signal, "shutdown signal received");
                    notifier.notify(ShutdownReason::Signal(signal));
                }
            })
            .map_err(|source| ShutdownError::Spawn { source })?;
        Ok(())
    }
}
