//! Supervises daemon launch sequencing and orderly shutdown.

use std::sync::Arc;

use tracing::{info, warn};

use crate::bootstrap::{ConfigLoader, SystemConfigLoader};
use crate::device::{Device, DeviceState};
use crate::session::{SessionConnectionHandler, SessionRegistry};
use crate::telemetry;
use crate::transport::SocketListener;

use super::errors::LaunchError;
use super::shutdown::{ShutdownCoordinator, ShutdownReason, ShutdownSignal, SystemShutdownSignal};
use super::{PROCESS_TARGET, SHUTDOWN_TIMEOUT};

/// Collaborators required to launch the daemon runtime.
pub(crate) struct LaunchPlan<L, S> {
    pub(crate) loader: L,
    pub(crate) shutdown: S,
}

/// Runs the daemon using the production collaborators.
///
/// Returns once a termination signal has been handled and every session has
/// been cancelled, or with an error if startup or accepting failed.
pub fn run_daemon() -> Result<(), LaunchError> {
    run_daemon_with(LaunchPlan {
        loader: SystemConfigLoader,
        shutdown: SystemShutdownSignal,
    })
}

/// Runs the daemon with injected collaborators.
pub(crate) fn run_daemon_with<L, S>(plan: LaunchPlan<L, S>) -> Result<(), LaunchError>
where
    L: ConfigLoader,
    S: ShutdownSignal,
{
    let LaunchPlan { loader, shutdown } = plan;
    let config = loader.load()?;
    let _telemetry = telemetry::initialise(&config)?;
    info!(
        target: PROCESS_TARGET,
        socket = %config.socket_path(),
        capacity = config.buffer_capacity(),
        "starting resource manager"
    );
    config.prepare_socket_directory()?;

    let coordinator = ShutdownCoordinator::new();
    shutdown.install(coordinator.notifier())?;
    let listener = SocketListener::bind(config.socket_path())?;

    let device: Arc<dyn Device> = Arc::new(DeviceState::new(config.buffer_capacity()));
    let registry = Arc::new(SessionRegistry::new());
    let handler = Arc::new(SessionConnectionHandler::new(
        Arc::clone(&device),
        Arc::clone(&registry),
    ));
    let socket = listener.path().to_owned();
    let listener_handle = listener.start(handler, coordinator.notifier())?;
    info!(
        target: PROCESS_TARGET,
        %socket,
        "resource manager ready"
    );

    let reason = coordinator.wait();
    info!(target: PROCESS_TARGET, ?reason, "shutdown requested");
    listener_handle.shutdown();
    let joined = listener_handle.join();
    drain_sessions(&registry);
    joined?;

    if let ShutdownReason::AcceptFailed { kind, message } = reason {
        return Err(LaunchError::AcceptFailed { kind, message });
    }
    info!(
        target: PROCESS_TARGET,
        "shutdown sequence completed"
    );
    Ok(())
}

fn drain_sessions(registry: &SessionRegistry) {
    let cancelled = registry.cancel_all();
    if registry.wait_for_drain(SHUTDOWN_TIMEOUT) {
        info!(target: PROCESS_TARGET, cancelled, "sessions drained");
    } else {
        warn!(
            target: PROCESS_TARGET,
            remaining = registry.live_count(),
            timeout_ms = SHUTDOWN_TIMEOUT.as_millis(),
            "sessions still running after shutdown timeout"
        );
    }
}
