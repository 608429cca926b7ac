//! Listener implementation for the daemon's Unix socket.

use std::fs;
use std::io;
use std::os::unix::fs::FileTypeExt;
use std::os::unix::net::{UnixListener, UnixStream};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread;
use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, info, warn};

use crate::process::{ShutdownNotifier, ShutdownReason};

use super::{ConnectionHandler, LISTENER_TARGET, ListenerError};

const ACCEPT_BACKOFF: Duration = Duration::from_millis(25);

/// Listener bound to the device socket path.
#[derive(Debug)]
pub(crate) struct SocketListener {
    path: Utf8PathBuf,
    listener: UnixListener,
}

impl SocketListener {
    /// Binds `path`, replacing a stale socket file left by a dead process.
    pub(crate) fn bind(path: &Utf8Path) -> Result<Self, ListenerError> {
        let listener = bind_unix(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            listener,
        })
    }

    pub(crate) fn path(&self) -> &Utf8Path {
        self.path.as_path()
    }

    /// Starts the accept loop on a background thread.
    ///
    /// `notifier` is told when the loop stops because accepting failed, so the
    /// process can shut down instead of idling without a listener.
    pub(crate) fn start(
        self,
        handler: Arc<dyn ConnectionHandler>,
        notifier: ShutdownNotifier,
    ) -> Result<ListenerHandle, ListenerError> {
        if let Err(source) = self.listener.set_nonblocking(true) {
            cleanup_unix_socket(&self.path);
            return Err(ListenerError::NonBlocking { source });
        }
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_flag = Arc::clone(&shutdown);
        let path = self.path.clone();
        let handle = thread::Builder::new()
            .name(String::from("resmgr-accept"))
            .spawn(move || run_accept_loop(&self, &shutdown_flag, &handler, &notifier))
            .map_err(|source| {
                cleanup_unix_socket(&path);
                ListenerError::Spawn { source }
            })?;
        Ok(ListenerHandle {
            shutdown,
            handle: Some(handle),
        })
    }
}

/// Handle to the background accept thread.
pub(crate) struct ListenerHandle {
    shutdown: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

impl ListenerHandle {
    /// Asks the accept loop to stop; it notices within one backoff interval.
    pub(crate) fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }

    /// Waits for the accept thread, which removes the socket file on exit.
    pub(crate) fn join(mut self) -> Result<(), ListenerError> {
        if let Some(handle) = self.handle.take() {
            match handle.join() {
                Ok(()) => Ok(()),
                Err(_) => Err(ListenerError::ThreadPanic),
            }
        } else {
            Ok(())
        }
    }
}

impl Drop for ListenerHandle {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
    }
}

fn run_accept_loop(
    listener: &SocketListener,
    shutdown: &AtomicBool,
    handler: &Arc<dyn ConnectionHandler>,
    notifier: &ShutdownNotifier,
) {
    info!(
        target: LISTENER_TARGET,
        path = %listener.path,
        "socket listener active"
    );
    let mut failure = None;
    while !shutdown.load(Ordering::SeqCst) {
        match listener.listener.accept() {
            Ok((stream, _)) => spawn_session(stream, handler),
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_BACKOFF);
            }
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error) => {
                warn!(
                    target: LISTENER_TARGET,
                    error = %error,
                    "socket accept failed; stopping listener"
                );
                failure = Some(error);
                break;
            }
        }
    }

    cleanup_unix_socket(&listener.path);
    if let Some(error) = failure {
        notifier.notify(ShutdownReason::AcceptFailed {
            kind: error.kind(),
            message: error.to_string(),
        });
    }
}

fn spawn_session(stream: UnixStream, handler: &Arc<dyn ConnectionHandler>) {
    if let Err(error) = stream.set_nonblocking(false) {
        warn!(
            target: LISTENER_TARGET,
            error = %error,
            "dropping connection that cannot block"
        );
        return;
    }
    debug!(target: LISTENER_TARGET, "connection accepted");
    let handler = Arc::clone(handler);
    let spawned = thread::Builder::new()
        .name(String::from("resmgr-session"))
        .spawn(move || handler.handle(stream));
    if let Err(error) = spawned {
        warn!(
            target: LISTENER_TARGET,
            error = %error,
            "failed to spawn session thread; connection dropped"
        );
    }
}

fn bind_unix(path: &Utf8Path) -> Result<UnixListener, ListenerError> {
    if path.exists() {
        let metadata = fs::symlink_metadata(path).map_err(|source| ListenerError::Metadata {
            path: path.to_string(),
            source,
        })?;
        if !metadata.file_type().is_socket() {
            return Err(ListenerError::NotSocket {
                path: path.to_string(),
            });
        }
        match UnixStream::connect(path) {
            Ok(_stream) => {
                return Err(ListenerError::InUse {
                    path: path.to_string(),
                });
            }
            Err(error)
                if error.kind() == io::ErrorKind::ConnectionRefused
                    || error.kind() == io::ErrorKind::NotFound =>
            {
                info!(
                    target: LISTENER_TARGET,
                    path = %path,
                    "removing stale unix socket"
                );
                fs::remove_file(path).map_err(|source| ListenerError::Cleanup {
                    path: path.to_string(),
                    source,
                })?;
            }
            Err(error) => {
                return Err(ListenerError::Probe {
                    path: path.to_string(),
                    source: error,
                });
            }
        }
    }

    UnixListener::bind(path).map_err(|source| ListenerError::Bind {
        path: path.to_string(),
        source,
    })
}

fn cleanup_unix_socket(path: &Utf8Path) {
    if let Err(error) = fs::remove_file(path)
        && error.kind() != io::ErrorKind::NotFound
    {
        warn!(
            target: LISTENER_TARGET,
            error = %error,
            path = %path,
            "failed to remove unix socket file"
        );
    }
}
