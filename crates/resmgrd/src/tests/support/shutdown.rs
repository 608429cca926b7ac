//! Shutdown signal the tests trigger by hand.

use std::sync::{Arc, Mutex, PoisonError};

use crate::process::{ShutdownError, ShutdownNotifier, ShutdownReason, ShutdownSignal};

/// Captures the installed notifier so a test can request shutdown.
#[derive(Clone, Default)]
pub struct ManualShutdownSignal {
    slot: Arc<Mutex<Option<ShutdownNotifier>>>,
}

impl ManualShutdownSignal {
    /// Requests shutdown; does nothing before the daemon installed the signal.
    pub fn trigger(&self) {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(notifier) = slot.as_ref() {
            notifier.notify(ShutdownReason::Requested);
        }
    }
}

impl ShutdownSignal for ManualShutdownSignal {
    fn install(&self, notifier: ShutdownNotifier) -> Result<(), ShutdownError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(notifier);
        Ok(())
    }
}
