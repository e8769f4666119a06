//! Embedded Broker Engine
//!
//! In-process service lifecycle engine owning the destination services of
//! one or more named messaging servers. Installation is accepted
//! synchronously; a per-destination task then drives the service through
//! its states, publishing every transition in order on the controller's
//! channel. This adapter is the only component that mutates a backing
//! service after creation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use bidali_core::{
    Destination, DestinationKind, ResolvedIdentity, ServiceState, ServiceTransition,
    DEFAULT_SERVER_NAME,
};
use bidali_ports::{ServiceController, ServiceLifecycleError, ServiceLifecyclePort};
use parking_lot::Mutex;
use tokio::sync::{broadcast, watch, Notify};
use tracing::{debug, info};

const TRANSITION_CHANNEL_CAPACITY: usize = 16;

/// How installed services are started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartMode {
    /// Services start as soon as installation is accepted.
    Automatic,
    /// Services stay down until [`EmbeddedBrokerEngine::start`] is called.
    Manual,
}

type ServiceKey = (String, String);

struct ServiceEntry {
    start_gate: Arc<Notify>,
    remove_gate: Arc<Notify>,
}

struct EngineInner {
    start_mode: StartMode,
    servers: Mutex<HashSet<String>>,
    services: Mutex<HashMap<ServiceKey, ServiceEntry>>,
    failing: Mutex<HashSet<ServiceKey>>,
}

/// In-process messaging server engine
#[derive(Clone)]
pub struct EmbeddedBrokerEngine {
    inner: Arc<EngineInner>,
}

impl EmbeddedBrokerEngine {
    /// Engine with the default server and automatic start.
    pub fn new() -> Self {
        Self::with_start_mode(StartMode::Automatic)
    }

    pub fn with_start_mode(start_mode: StartMode) -> Self {
        let mut servers = HashSet::new();
        servers.insert(DEFAULT_SERVER_NAME.to_string());
        Self {
            inner: Arc::new(EngineInner {
                start_mode,
                servers: Mutex::new(servers),
                services: Mutex::new(HashMap::new()),
                failing: Mutex::new(HashSet::new()),
            }),
        }
    }

    /// Register an additional named messaging server.
    pub fn add_server(&self, name: impl Into<String>) {
        self.inner.servers.lock().insert(name.into());
    }

    /// Release a held service in [`StartMode::Manual`].
    pub fn start(
        &self,
        server_name: &str,
        identity: &ResolvedIdentity,
    ) -> Result<(), ServiceLifecycleError> {
        let key = (server_name.to_string(), identity.to_string());
        let services = self.inner.services.lock();
        let entry = services
            .get(&key)
            .ok_or_else(|| ServiceLifecycleError::NotInstalled {
                identity: identity.to_string(),
                server_name: server_name.to_string(),
            })?;
        entry.start_gate.notify_one();
        Ok(())
    }

    /// Make the next installation of (server, identity) fail its start,
    /// ending `Starting→Down` instead of `Starting→Up`.
    pub fn inject_start_failure(&self, server_name: &str, identity: &str) {
        self.inner
            .failing
            .lock()
            .insert((server_name.to_string(), identity.to_string()));
    }

    fn install(
        &self,
        server_name: &str,
        identity: &ResolvedIdentity,
        kind: DestinationKind,
    ) -> Result<ServiceController, ServiceLifecycleError> {
        if !self.inner.servers.lock().contains(server_name) {
            return Err(ServiceLifecycleError::UnknownServer(
                server_name.to_string(),
            ));
        }

        let key = (server_name.to_string(), identity.to_string());
        let mut services = self.inner.services.lock();
        if services.contains_key(&key) {
            return Err(ServiceLifecycleError::DuplicateService {
                identity: identity.to_string(),
                server_name: server_name.to_string(),
            });
        }

        let destination = Arc::new(Destination {
            identity: identity.clone(),
            kind,
            server_name: server_name.to_string(),
        });
        let (state_tx, state_rx) = watch::channel(ServiceState::Down);
        let (transition_tx, _) = broadcast::channel(TRANSITION_CHANNEL_CAPACITY);
        let controller =
            ServiceController::new(destination, state_rx, transition_tx.clone());

        let start_gate = Arc::new(Notify::new());
        let remove_gate = Arc::new(Notify::new());
        let fail_start = self.inner.failing.lock().remove(&key);
        services.insert(
            key,
            ServiceEntry {
                start_gate: start_gate.clone(),
                remove_gate: remove_gate.clone(),
            },
        );

        tokio::spawn(drive_service(
            identity.clone(),
            server_name.to_string(),
            self.inner.start_mode,
            fail_start,
            state_tx,
            transition_tx,
            start_gate,
            remove_gate,
        ));

        info!(
            identity = %identity,
            server = %server_name,
            kind = %kind,
            "destination service installed"
        );
        Ok(controller)
    }
}

impl Default for EmbeddedBrokerEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ServiceLifecyclePort for EmbeddedBrokerEngine {
    async fn install_queue(
        &self,
        server_name: &str,
        identity: &ResolvedIdentity,
        durable: bool,
        selector: Option<&str>,
    ) -> Result<ServiceController, ServiceLifecycleError> {
        debug!(
            identity = %identity,
            durable,
            selector = selector.unwrap_or(""),
            "queue service requested"
        );
        self.install(server_name, identity, DestinationKind::Queue)
    }

    async fn install_topic(
        &self,
        server_name: &str,
        identity: &ResolvedIdentity,
    ) -> Result<ServiceController, ServiceLifecycleError> {
        self.install(server_name, identity, DestinationKind::Topic)
    }

    async fn remove(
        &self,
        server_name: &str,
        identity: &ResolvedIdentity,
    ) -> Result<(), ServiceLifecycleError> {
        let key = (server_name.to_string(), identity.to_string());
        let entry = self.inner.services.lock().remove(&key).ok_or_else(|| {
            ServiceLifecycleError::NotInstalled {
                identity: identity.to_string(),
                server_name: server_name.to_string(),
            }
        })?;
        entry.remove_gate.notify_one();
        info!(
            identity = %identity,
            server = %server_name,
            "destination service removal requested"
        );
        Ok(())
    }
}

/// Drives one destination service through its lifetime, publishing each
/// transition in order. Exactly one driver task exists per destination.
#[allow(clippy::too_many_arguments)]
async fn drive_service(
    identity: ResolvedIdentity,
    server_name: String,
    start_mode: StartMode,
    fail_start: bool,
    state_tx: watch::Sender<ServiceState>,
    transitions: broadcast::Sender<ServiceTransition>,
    start_gate: Arc<Notify>,
    remove_gate: Arc<Notify>,
) {
    let publish = |from: ServiceState, to: ServiceState| {
        state_tx.send_replace(to);
        let transition = ServiceTransition::new(from, to);
        debug!(identity = %identity, server = %server_name, %transition, "service transition");
        let _ = transitions.send(transition);
    };

    if start_mode == StartMode::Manual {
        // Removal may be requested before the service was ever started.
        tokio::select! {
            _ = start_gate.notified() => {}
            _ = remove_gate.notified() => {
                publish(ServiceState::Down, ServiceState::Removing);
                publish(ServiceState::Removing, ServiceState::Removed);
                return;
            }
        }
    }

    publish(ServiceState::Down, ServiceState::Starting);
    tokio::task::yield_now().await;

    if fail_start {
        publish(ServiceState::Starting, ServiceState::Down);
        remove_gate.notified().await;
        publish(ServiceState::Down, ServiceState::Removing);
        publish(ServiceState::Removing, ServiceState::Removed);
        return;
    }

    publish(ServiceState::Starting, ServiceState::Up);

    remove_gate.notified().await;
    publish(ServiceState::Up, ServiceState::StartRequested);
    publish(ServiceState::StartRequested, ServiceState::Down);
    publish(ServiceState::Down, ServiceState::Removing);
    publish(ServiceState::Removing, ServiceState::Removed);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(name: &str) -> ResolvedIdentity {
        ResolvedIdentity::new(name)
    }

    async fn wait_for_state(
        controller: &ServiceController,
        wanted: ServiceState,
    ) {
        let mut state = controller.state_receiver();
        while *state.borrow() != wanted {
            state.changed().await.expect("engine dropped state channel");
        }
    }

    #[tokio::test]
    async fn test_automatic_start_reaches_up() {
        let engine = EmbeddedBrokerEngine::new();
        let controller = engine
            .install_queue("default", &identity("q1"), true, None)
            .await
            .unwrap();

        wait_for_state(&controller, ServiceState::Up).await;
        assert_eq!(controller.destination().identity.as_str(), "q1");
    }

    #[tokio::test]
    async fn test_manual_mode_transitions_in_canonical_order() {
        let engine = EmbeddedBrokerEngine::with_start_mode(StartMode::Manual);
        let id = identity("q1");
        let controller = engine
            .install_queue("default", &id, true, None)
            .await
            .unwrap();
        let mut transitions = controller.subscribe();

        assert_eq!(controller.state(), ServiceState::Down);
        engine.start("default", &id).unwrap();

        assert_eq!(
            transitions.recv().await,
            Some(ServiceTransition::new(ServiceState::Down, ServiceState::Starting))
        );
        assert_eq!(
            transitions.recv().await,
            Some(ServiceTransition::new(ServiceState::Starting, ServiceState::Up))
        );

        engine.remove("default", &id).await.unwrap();
        assert_eq!(
            transitions.recv().await,
            Some(ServiceTransition::new(ServiceState::Up, ServiceState::StartRequested))
        );
        assert_eq!(
            transitions.recv().await,
            Some(ServiceTransition::new(
                ServiceState::StartRequested,
                ServiceState::Down
            ))
        );
        assert_eq!(
            transitions.recv().await,
            Some(ServiceTransition::new(ServiceState::Down, ServiceState::Removing))
        );
        assert_eq!(
            transitions.recv().await,
            Some(ServiceTransition::new(ServiceState::Removing, ServiceState::Removed))
        );
    }

    #[tokio::test]
    async fn test_duplicate_install_is_rejected() {
        let engine = EmbeddedBrokerEngine::new();
        let id = identity("q1");
        engine
            .install_queue("default", &id, true, None)
            .await
            .unwrap();

        let err = engine
            .install_queue("default", &id, true, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceLifecycleError::DuplicateService { .. }));
    }

    #[tokio::test]
    async fn test_same_identity_on_other_server_is_allowed() {
        let engine = EmbeddedBrokerEngine::new();
        engine.add_server("backup");
        let id = identity("q1");

        engine
            .install_queue("default", &id, true, None)
            .await
            .unwrap();
        let controller = engine
            .install_queue("backup", &id, true, None)
            .await
            .unwrap();
        assert_eq!(controller.destination().server_name, "backup");
    }

    #[tokio::test]
    async fn test_unknown_server_is_rejected() {
        let engine = EmbeddedBrokerEngine::new();
        let err = engine
            .install_topic("missing", &identity("t1"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceLifecycleError::UnknownServer(_)));
    }

    #[tokio::test]
    async fn test_injected_start_failure_ends_down() {
        let engine = EmbeddedBrokerEngine::with_start_mode(StartMode::Manual);
        let id = identity("q1");
        engine.inject_start_failure("default", "q1");
        let controller = engine
            .install_queue("default", &id, true, None)
            .await
            .unwrap();
        let mut transitions = controller.subscribe();

        engine.start("default", &id).unwrap();
        assert_eq!(
            transitions.recv().await,
            Some(ServiceTransition::new(ServiceState::Down, ServiceState::Starting))
        );
        let failed = transitions.recv().await.unwrap();
        assert!(failed.is_start_failure());
        assert_eq!(controller.state(), ServiceState::Down);
    }

    #[tokio::test]
    async fn test_remove_unknown_service_fails() {
        let engine = EmbeddedBrokerEngine::new();
        let err = engine.remove("default", &identity("ghost")).await.unwrap_err();
        assert!(matches!(err, ServiceLifecycleError::NotInstalled { .. }));
    }

    #[tokio::test]
    async fn test_identity_reusable_after_removal() {
        let engine = EmbeddedBrokerEngine::new();
        let id = identity("q1");
        let controller = engine
            .install_queue("default", &id, true, None)
            .await
            .unwrap();
        wait_for_state(&controller, ServiceState::Up).await;

        engine.remove("default", &id).await.unwrap();
        engine
            .install_queue("default", &id, true, None)
            .await
            .unwrap();
    }
}
