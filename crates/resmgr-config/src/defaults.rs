use camino::Utf8PathBuf;

use crate::logging::LogFormat;

/// Well-known rendezvous point used when no socket path is configured.
pub const DEFAULT_SOCKET_PATH: &str = "/tmp/example_resmgr.sock";

/// Default log filter expression used by the daemon.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Filter applied when `--verbose` is set and the default filter is in use.
pub const VERBOSE_LOG_FILTER: &str = "info,resmgrd=debug";

/// Default capacity of the shared device buffer in bytes.
pub const DEFAULT_BUFFER_CAPACITY: usize = 4096;

/// Default log filter expression used by the daemon.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the daemon.
pub fn default_log_format() -> LogFormat {
    LogFormat::Compact
}

/// Default socket path for the daemon.
pub fn default_socket_path() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_SOCKET_PATH)
}

/// Default device buffer capacity.
pub fn default_buffer_capacity() -> usize {
    DEFAULT_BUFFER_CAPACITY
}
