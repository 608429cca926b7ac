//! Error types for socket listener operations.

use std::io;

use thiserror::Error;

/// Errors surfaced while binding or running the socket listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// Binding the socket path failed.
    #[error("failed to bind unix listener at {path}: {source}")]
    Bind {
        /// Socket path.
        path: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Another process is accepting on the socket path.
    #[error("existing unix socket {path} is already in use")]
    InUse {
        /// Socket path.
        path: String,
    },
    /// Something other than a socket occupies the path.
    #[error("unix socket path {path} is not a socket")]
    NotSocket {
        /// Socket path.
        path: String,
    },
    /// Inspecting the existing path failed.
    #[error("failed to read metadata for unix socket {path}: {source}")]
    Metadata {
        /// Socket path.
        path: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Probing the existing socket failed for an unexpected reason.
    #[error("failed to connect to existing unix socket {path}: {source}")]
    Probe {
        /// Socket path.
        path: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// A stale socket file could not be removed.
    #[error("failed to remove stale unix socket {path}: {source}")]
    Cleanup {
        /// Socket path.
        path: String,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Switching the listener to non-blocking mode failed.
    #[error("failed to enable non-blocking listener: {source}")]
    NonBlocking {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The accept thread could not be started.
    #[error("failed to spawn listener thread: {source}")]
    Spawn {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The accept thread panicked.
    #[error("listener thread panicked")]
    ThreadPanic,
}
