//! Minimal blocking client for the device protocol.

use std::io::{Read, Write};
use std::os::unix::net::UnixStream;

use camino::Utf8Path;

use super::WAIT_TIMEOUT;

/// One client connection with a bounded read timeout.
pub struct Client {
    stream: UnixStream,
}

impl Client {
    pub fn connect(path: &Utf8Path) -> Self {
        let stream = UnixStream::connect(path).expect("connect to daemon socket");
        stream
            .set_read_timeout(Some(WAIT_TIMEOUT))
            .expect("set read timeout");
        Self { stream }
    }

    pub fn send(&mut self, line: &str) {
        self.stream
            .write_all(format!("{line}\n").as_bytes())
            .expect("send request");
    }

    /// Reads one reply.
    ///
    /// Every reply is written with a single `write_all`, so a short reply
    /// arrives in one read when requests are sent one at a time.
    pub fn receive(&mut self) -> String {
        let mut buffer = [0_u8; 4096];
        let read = self.stream.read(&mut buffer).expect("read reply");
        String::from_utf8_lossy(&buffer[..read]).into_owned()
    }

    pub fn request(&mut self, line: &str) -> String {
        self.send(line);
        self.receive()
    }

    /// Whether the daemon closed its side of the connection.
    pub fn sees_end_of_stream(&mut self) -> bool {
        let mut buffer = [0_u8; 64];
        matches!(self.stream.read(&mut buffer), Ok(0))
    }
}
