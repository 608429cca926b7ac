//! Unix socket listener for the device endpoint.
//!
//! The transport module binds the configured socket path and accepts
//! connections on a background thread, running every connection on its own
//! worker thread.

mod errors;
mod handler;
mod listener;
#[cfg(test)]
mod test_utils;

pub(crate) use self::errors::ListenerError;
pub(crate) use self::handler::ConnectionHandler;
pub(crate) use self::listener::SocketListener;
#[cfg(test)]
pub(crate) use self::listener::ListenerHandle;
#[cfg(test)]
pub(crate) use self::test_utils::CountingHandler;

const LISTENER_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
