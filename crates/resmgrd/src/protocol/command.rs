//! Typed requests parsed from a single protocol line.

const WRITE_PREFIX: &[u8] = b"WRITE ";

/// A parsed client request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Append the raw payload to the device, claiming the writer role.
    Write(Vec<u8>),
    /// Return the buffer contents.
    Read,
    /// Empty the buffer.
    Clear,
    /// Report buffer length and writer state.
    Status,
    /// Close the session (`EXIT` or `QUIT`).
    Quit,
    /// Anything that does not match the grammar, decoded for diagnostics.
    Unknown(String),
}

impl Command {
    /// Parses one line with its terminator already removed.
    ///
    /// `WRITE` takes every byte after its first following space as the
    /// payload, unmodified. The argument-less keywords must match the whole
    /// line.
    #[must_use]
    pub fn parse(line: &[u8]) -> Self {
        if let Some(payload) = strip_prefix_ignore_case(line, WRITE_PREFIX) {
            return Self::Write(payload.to_vec());
        }

        const KEYWORDS: [(&[u8], Command); 5] = [
            (b"READ".as_slice(), Command::Read),
            (b"CLEAR".as_slice(), Command::Clear),
            (b"STATUS".as_slice(), Command::Status),
            (b"EXIT".as_slice(), Command::Quit),
            (b"QUIT".as_slice(), Command::Quit),
        ];
        KEYWORDS
            .into_iter()
            .find(|(keyword, _)| line.eq_ignore_ascii_case(keyword))
            .map_or_else(
                || Self::Unknown(String::from_utf8_lossy(line).into_owned()),
                |(_, command)| command,
            )
    }

    /// Keyword used in diagnostics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Write(_) => "write",
            Self::Read => "read",
            Self::Clear => "clear",
            Self::Status => "status",
            Self::Quit => "quit",
            Self::Unknown(_) => "unknown",
        }
    }
}

fn strip_prefix_ignore_case<'a>(line: &'a [u8], prefix: &[u8]) -> Option<&'a [u8]> {
    let (head, rest) = line.split_at_checked(prefix.len())?;
    head.eq_ignore_ascii_case(prefix).then_some(rest)
}
