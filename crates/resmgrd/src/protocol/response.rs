//! Reply rendering.

use std::borrow::Cow;
use std::io::{self, Write};

use crate::device::DeviceStatus;

/// A reply sent to the client for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// `WRITE` stored its text.
    Written,
    /// `WRITE` was refused because another session owns the device.
    Busy,
    /// `CLEAR` emptied the buffer.
    Cleared,
    /// `QUIT` acknowledged; the connection closes next.
    Bye,
    /// `STATUS` summary.
    Status(DeviceStatus),
    /// `READ` of a non-empty buffer; sent verbatim.
    Payload(Vec<u8>),
    /// `READ` of an empty buffer.
    Empty,
    /// The line did not parse.
    UnknownCommand,
}

impl Response {
    /// Builds the `READ` reply for a buffer snapshot.
    #[must_use]
    pub fn from_snapshot(snapshot: Vec<u8>) -> Self {
        if snapshot.is_empty() {
            Self::Empty
        } else {
            Self::Payload(snapshot)
        }
    }

    /// Wire bytes for this reply.
    #[must_use]
    pub fn render(&self) -> Cow<'_, [u8]> {
        match self {
            Self::Written => Cow::Borrowed(b"OK: written\n"),
            Self::Busy => Cow::Borrowed(b"ERR: device busy\n"),
            Self::Cleared => Cow::Borrowed(b"OK: buffer cleared\n"),
            Self::Bye => Cow::Borrowed(b"OK: bye\n"),
            Self::Empty => Cow::Borrowed(b"(empty)\n"),
            Self::UnknownCommand => Cow::Borrowed(b"ERR: unknown command\n"),
            Self::Payload(bytes) => Cow::Borrowed(bytes.as_slice()),
            Self::Status(status) => Cow::Owned(
                format!(
                    "BUF_LEN={}, WRITER={}\n",
                    status.length,
                    if status.writer_active {
                        "active"
                    } else {
                        "none"
                    }
                )
                .into_bytes(),
            ),
        }
    }
}

/// Writes rendered replies to a client stream.
pub struct ResponseWriter<W> {
    writer: W,
}

impl<W: Write> ResponseWriter<W> {
    /// Wraps the client's output stream.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Writes one reply and flushes it before the next request is handled.
    ///
    /// # Errors
    ///
    /// Returns the underlying IO error when the peer cannot be written to.
    pub fn send(&mut self, response: &Response) -> io::Result<()> {
        self.writer.write_all(&response.render())?;
        self.writer.flush()
    }
}
