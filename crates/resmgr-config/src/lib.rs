//! Shared configuration for the device resource-manager daemon.
//!
//! Values are layered by [`ortho_config`]: built-in defaults, then an optional
//! configuration file, then `RESMGR_*` environment variables, and finally
//! command-line flags. The daemon only ever reads the resolved [`Config`].

mod defaults;
mod logging;
mod socket;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_BUFFER_CAPACITY, DEFAULT_LOG_FILTER, DEFAULT_SOCKET_PATH, VERBOSE_LOG_FILTER,
    default_buffer_capacity, default_log_filter, default_log_filter_string, default_log_format,
    default_socket_path,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use socket::SocketPreparationError;

/// Resolved daemon configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, OrthoConfig)]
#[ortho_config(prefix = "RESMGR")]
pub struct Config {
    /// Filesystem path of the Unix socket clients connect to.
    #[serde(default = "default_socket_path")]
    #[ortho_config(default = default_socket_path())]
    pub socket_path: Utf8PathBuf,
    /// `tracing` filter expression applied to daemon output.
    #[serde(default = "default_log_filter_string")]
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format for log records.
    #[serde(default = "default_log_format")]
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
    /// Enables per-event diagnostics for connections and commands.
    #[serde(default)]
    #[ortho_config(cli_short = 'v')]
    pub verbose: bool,
    /// Capacity of the shared device buffer in bytes.
    #[serde(default = "default_buffer_capacity")]
    #[ortho_config(default = default_buffer_capacity())]
    pub buffer_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            socket_path: default_socket_path(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            verbose: false,
            buffer_capacity: default_buffer_capacity(),
        }
    }
}

impl Config {
    /// Path of the listening socket.
    #[must_use]
    pub fn socket_path(&self) -> &camino::Utf8Path {
        self.socket_path.as_path()
    }

    /// Configured log filter, before verbosity is applied.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Filter handed to the subscriber.
    ///
    /// `--verbose` only raises the daemon's own targets to `debug` when the
    /// operator kept the default filter; an explicit filter always wins.
    #[must_use]
    pub fn effective_log_filter(&self) -> &str {
        if self.verbose && self.log_filter == DEFAULT_LOG_FILTER {
            VERBOSE_LOG_FILTER
        } else {
            self.log_filter()
        }
    }

    /// Configured log format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Whether per-event diagnostics were requested.
    #[must_use]
    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Device buffer capacity, never less than one byte.
    #[must_use]
    pub fn buffer_capacity(&self) -> usize {
        self.buffer_capacity.max(1)
    }

    /// Ensures the socket's parent directory exists with restrictive permissions.
    pub fn prepare_socket_directory(&self) -> Result<(), SocketPreparationError> {
        socket::prepare_parent_directory(self.socket_path())
    }
}
