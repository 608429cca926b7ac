//! Line-oriented text protocol spoken by device clients.
//!
//! Requests are newline-terminated lines with case-insensitive keywords.
//! [`LineFramer`] turns the byte stream into lines, [`Command::parse`] types
//! each line, and [`Response`] renders the reply bytes.

mod command;
mod framing;
mod response;

pub use self::command::Command;
pub use self::framing::{LineFramer, MAX_LINE_BYTES};
pub use self::response::{Response, ResponseWriter};
