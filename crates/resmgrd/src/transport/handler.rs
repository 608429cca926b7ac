//! Connection handling abstraction for the listener.

use std::os::unix::net::UnixStream;

/// Handles accepted socket connections.
pub(crate) trait ConnectionHandler: Send + Sync + 'static {
    /// Serves a single connection on the calling thread until it ends.
    /// Implementations should avoid panicking.
    fn handle(&self, stream: UnixStream);
}
