//! Errors that end a single client session.

use std::io;

use thiserror::Error;

use crate::protocol::MAX_LINE_BYTES;

/// Failures local to one connection; they never reach other sessions.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Receiving from the client failed.
    #[error("failed to read from client: {source}")]
    Read {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Sending a reply to the client failed.
    #[error("failed to write reply to client: {source}")]
    Write {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The client sent more than the line limit without a newline.
    #[error("request line exceeds {max} bytes ({size} buffered)", max = MAX_LINE_BYTES)]
    LineTooLong {
        /// Bytes buffered when the limit tripped.
        size: usize,
    },
}
