//! Bookkeeping of live sessions so shutdown can cancel them.

use std::collections::HashMap;
use std::net::Shutdown;
use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::device::SessionId;

use super::SESSION_TARGET;

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Allocates session identities and tracks live connections.
#[derive(Debug)]
pub struct SessionRegistry {
    next_id: AtomicU64,
    live: Mutex<HashMap<SessionId, Option<UnixStream>>>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    /// Creates an empty registry; the first identity handed out is 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            live: Mutex::new(HashMap::new()),
        }
    }

    /// Allocates a fresh identity without tracking a stream.
    pub fn allocate(&self) -> SessionId {
        SessionId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Registers a connection and returns its identity.
    ///
    /// A cancellation handle is kept when the stream can be cloned. Without
    /// one the session still runs but shutdown cannot interrupt it.
    pub fn open(&self, stream: &UnixStream) -> SessionId {
        let id = self.allocate();
        let handle = match stream.try_clone() {
            Ok(handle) => Some(handle),
            Err(error) => {
                warn!(
                    target: SESSION_TARGET,
                    session = %id,
                    error = %error,
                    "session cannot be cancelled on shutdown"
                );
                None
            }
        };
        self.lock().insert(id, handle);
        id
    }

    /// Forgets a session once its worker has finished.
    pub fn close(&self, id: SessionId) {
        self.lock().remove(&id);
    }

    /// Number of sessions still running.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.lock().len()
    }

    /// Shuts down both directions of every live connection.
    ///
    /// Blocked reads then return end-of-stream and each worker runs its normal
    /// cleanup, releasing any writer claim. Returns the sessions signalled.
    pub fn cancel_all(&self) -> usize {
        let live = self.lock();
        let mut cancelled = 0;
        for (id, handle) in live.iter() {
            let Some(stream) = handle else {
                continue;
            };
            match stream.shutdown(Shutdown::Both) {
                Ok(()) => cancelled += 1,
                Err(error) => debug!(
                    target: SESSION_TARGET,
                    session = %id,
                    error = %error,
                    "session already disconnected"
                ),
            }
        }
        cancelled
    }

    /// Waits until every session has closed or `timeout` elapses.
    ///
    /// Returns `true` when no session remains.
    pub fn wait_for_drain(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.live_count() == 0 {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(DRAIN_POLL_INTERVAL);
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SessionId, Option<UnixStream>>> {
        self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
