//! Per-connection session workers.
//!
//! Each accepted connection gets one [`SessionWorker`] on its own thread. The
//! worker frames incoming bytes into lines, dispatches every complete line
//! against the shared [`Device`] in arrival order, and answers each request
//! before looking at the next one. However the session ends, the worker drops
//! any writer claim it holds.

mod errors;
mod registry;

use std::io::{self, Read, Write};
use std::os::unix::net::UnixStream;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::device::{Device, SessionId, WriteOutcome};
use crate::protocol::{Command, LineFramer, Response, ResponseWriter};
use crate::transport::ConnectionHandler;

pub use self::errors::SessionError;
pub use self::registry::SessionRegistry;

pub(crate) const SESSION_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::session");

const READ_CHUNK_BYTES: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Active,
    Closing,
    Closed,
}

/// How a session finished.
#[derive(Debug)]
pub enum SessionEnd {
    /// The client sent `QUIT` or `EXIT`.
    Quit,
    /// The client closed its side of the connection.
    PeerClosed,
    /// An IO or framing failure ended the session.
    Failed(SessionError),
}

/// Drives one client connection from first byte to cleanup.
pub struct SessionWorker<S> {
    id: SessionId,
    device: Arc<dyn Device>,
    stream: S,
    framer: LineFramer,
    state: SessionState,
}

impl<S: Read + Write> SessionWorker<S> {
    /// Builds a worker for an accepted stream.
    pub fn new(id: SessionId, device: Arc<dyn Device>, stream: S) -> Self {
        Self {
            id,
            device,
            stream,
            framer: LineFramer::new(),
            state: SessionState::Active,
        }
    }

    /// Serves the connection until it ends, then releases the writer claim.
    pub fn run(mut self) -> SessionEnd {
        debug!(target: SESSION_TARGET, session = %self.id, "session opened");
        let end = self.receive_loop();
        self.close(&end);
        end
    }

    fn receive_loop(&mut self) -> SessionEnd {
        let mut chunk = [0_u8; READ_CHUNK_BYTES];
        while self.state == SessionState::Active {
            let read = match read_chunk_with_retry(&mut self.stream, &mut chunk) {
                Ok(read) => read,
                Err(source) => return SessionEnd::Failed(SessionError::Read { source }),
            };
            if read == 0 {
                return self.finish_stream();
            }

            self.framer.push(&chunk[..read]);
            if let Err(error) = self.process_complete_lines() {
                return SessionEnd::Failed(error);
            }
            if self.state == SessionState::Active && self.framer.is_overflowing() {
                return SessionEnd::Failed(SessionError::LineTooLong {
                    size: self.framer.residue_len(),
                });
            }
        }
        SessionEnd::Quit
    }

    // Only newline-terminated lines are requests. A partial line left at end
    // of stream, including one cut off by shutdown, never reaches the device.
    fn finish_stream(&mut self) -> SessionEnd {
        let dropped = self.framer.discard_residue();
        if dropped > 0 {
            debug!(
                target: SESSION_TARGET,
                session = %self.id,
                bytes = dropped,
                "discarding unterminated request at end of stream"
            );
        }
        SessionEnd::PeerClosed
    }

    fn process_complete_lines(&mut self) -> Result<(), SessionError> {
        while self.state == SessionState::Active {
            let Some(line) = self.framer.next_line() else {
                break;
            };
            self.handle_line(&line)?;
        }
        Ok(())
    }

    fn handle_line(&mut self, line: &[u8]) -> Result<(), SessionError> {
        let command = Command::parse(line);
        debug!(
            target: SESSION_TARGET,
            session = %self.id,
            command = command.name(),
            bytes = line.len(),
            "command received"
        );
        let response = self.dispatch(&command);
        ResponseWriter::new(&mut self.stream)
            .send(&response)
            .map_err(|source| SessionError::Write { source })?;
        if command == Command::Quit {
            self.state = SessionState::Closing;
        }
        Ok(())
    }

    fn dispatch(&self, command: &Command) -> Response {
        match command {
            Command::Quit => Response::Bye,
            Command::Status => Response::Status(self.device.status()),
            Command::Read => Response::from_snapshot(self.device.read_snapshot()),
            Command::Clear => {
                self.device.clear();
                Response::Cleared
            }
            Command::Write(text) => match self.device.claim_and_append(self.id, text) {
                WriteOutcome::Written(stored) => {
                    if stored < text.len() {
                        debug!(
                            target: SESSION_TARGET,
                            session = %self.id,
                            requested = text.len(),
                            stored,
                            "write truncated at buffer capacity"
                        );
                    }
                    Response::Written
                }
                WriteOutcome::Busy => Response::Busy,
            },
            Command::Unknown(_) => Response::UnknownCommand,
        }
    }

    fn close(&mut self, end: &SessionEnd) {
        self.state = SessionState::Closing;
        self.device.release_writer_if_owner(self.id);
        match end {
            SessionEnd::Failed(error) => warn!(
                target: SESSION_TARGET,
                session = %self.id,
                error = %error,
                "session terminated"
            ),
            SessionEnd::Quit | SessionEnd::PeerClosed => debug!(
                target: SESSION_TARGET,
                session = %self.id,
                reason = ?end,
                "session closed"
            ),
        }
        self.state = SessionState::Closed;
    }
}

fn read_chunk_with_retry<S: Read>(stream: &mut S, chunk: &mut [u8]) -> io::Result<usize> {
    loop {
        match stream.read(chunk) {
            Ok(read) => return Ok(read),
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => return Err(error),
        }
    }
}

/// Connection handler that runs a [`SessionWorker`] per accepted stream.
pub struct SessionConnectionHandler {
    device: Arc<dyn Device>,
    registry: Arc<SessionRegistry>,
}

impl SessionConnectionHandler {
    /// Shares `device` with every session and tracks them in `registry`.
    pub fn new(device: Arc<dyn Device>, registry: Arc<SessionRegistry>) -> Self {
        Self { device, registry }
    }
}

impl ConnectionHandler for SessionConnectionHandler {
    fn handle(&self, stream: UnixStream) {
        let id = self.registry.open(&stream);
        let worker = SessionWorker::new(id, Arc::clone(&self.device), stream);
        let _end = worker.run();
        self.registry.close(id);
    }
}
