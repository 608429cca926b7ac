//! In-process server wiring a real listener to real sessions.

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::TempDir;

use crate::device::{Device, DeviceState};
use crate::process::ShutdownCoordinator;
use crate::session::{SessionConnectionHandler, SessionRegistry};
use crate::transport::{ListenerHandle, SocketListener};

/// Returns a socket path inside `dir`.
pub fn socket_in(dir: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().join("resmgrd.sock")).expect("utf8 temp path")
}

/// Listener and device running on a temporary socket.
pub struct RunningServer {
    _dir: TempDir,
    socket: Utf8PathBuf,
    device: Arc<DeviceState>,
    registry: Arc<SessionRegistry>,
    handle: Option<ListenerHandle>,
    _coordinator: ShutdownCoordinator,
}

impl RunningServer {
    pub fn start(capacity: usize) -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let socket = socket_in(&dir);
        let device = Arc::new(DeviceState::new(capacity));
        let registry = Arc::new(SessionRegistry::new());
        let shared: Arc<dyn Device> = Arc::clone(&device) as Arc<dyn Device>;
        let handler = Arc::new(SessionConnectionHandler::new(shared, Arc::clone(&registry)));
        let coordinator = ShutdownCoordinator::new();
        let handle = SocketListener::bind(&socket)
            .expect("bind listener")
            .start(handler, coordinator.notifier())
            .expect("start listener");
        Self {
            _dir: dir,
            socket,
            device,
            registry,
            handle: Some(handle),
            _coordinator: coordinator,
        }
    }

    pub fn socket(&self) -> &Utf8Path {
        self.socket.as_path()
    }

    pub fn device(&self) -> &DeviceState {
        &self.device
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }
}

impl Drop for RunningServer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.shutdown();
            let _ = handle.join();
        }
        self.registry.cancel_all();
    }
}
