//! Stream-to-line framing.
//!
//! Bytes arrive in arbitrary chunks. The framer keeps whatever follows the
//! last newline as residue and hands out complete lines in arrival order, so
//! a line may span several reads and one read may carry several lines.

/// Longest residue accepted without a terminating newline.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Accumulates received bytes and yields complete lines.
#[derive(Debug, Default)]
pub struct LineFramer {
    residue: Vec<u8>,
    // Bytes before this offset are known to hold no newline.
    scanned: usize,
}

impl LineFramer {
    /// Creates an empty framer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends freshly received bytes.
    pub fn push(&mut self, bytes: &[u8]) {
        self.residue.extend_from_slice(bytes);
    }

    /// Removes and returns the next complete line without its terminator.
    ///
    /// A single `\r` before the `\n` is stripped as well. Bytes are passed
    /// through untouched.
    pub fn next_line(&mut self) -> Option<Vec<u8>> {
        let offset = self.residue[self.scanned..]
            .iter()
            .position(|byte| *byte == b'\n');
        let Some(offset) = offset else {
            self.scanned = self.residue.len();
            return None;
        };
        let end = self.scanned + offset;
        let mut line: Vec<u8> = self.residue.drain(..=end).collect();
        self.scanned = 0;
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(line)
    }

    /// Drops the unterminated tail and returns how many bytes it held.
    pub fn discard_residue(&mut self) -> usize {
        self.scanned = 0;
        let dropped = self.residue.len();
        self.residue.clear();
        dropped
    }

    /// Bytes buffered after the last complete line.
    #[must_use]
    pub fn residue_len(&self) -> usize {
        self.residue.len()
    }

    /// Whether the residue has outgrown [`MAX_LINE_BYTES`].
    #[must_use]
    pub fn is_overflowing(&self) -> bool {
        self.residue.len() > MAX_LINE_BYTES
    }
}
