//! Service Lifecycle Engine Port
//!
//! Defines the contract against the engine that owns the actual start/stop
//! of destination services. Installation is a non-blocking registration:
//! the call returns once the request is accepted, and the engine drives the
//! service through its states asynchronously on its own scheduler.

use std::sync::Arc;

use async_trait::async_trait;
use bidali_core::{Destination, ResolvedIdentity, ServiceState, ServiceTransition};
use tokio::sync::{broadcast, watch};
use tracing::warn;

/// Lifecycle engine error types
#[derive(thiserror::Error, Debug)]
pub enum ServiceLifecycleError {
    #[error("destination service '{identity}' already installed on server '{server_name}'")]
    DuplicateService {
        identity: String,
        server_name: String,
    },

    #[error("no messaging server named '{0}'")]
    UnknownServer(String),

    #[error("destination service '{identity}' is not installed on server '{server_name}'")]
    NotInstalled {
        identity: String,
        server_name: String,
    },

    #[error("engine error: {0}")]
    Internal(String),
}

/// Service lifecycle engine port
///
/// Creation requests are keyed by (identity, server, kind). Installing a
/// destination never binds it into the naming layer; binding is handled
/// separately once the service signals availability.
#[async_trait]
pub trait ServiceLifecyclePort: Send + Sync {
    /// Install a queue service on the given server.
    async fn install_queue(
        &self,
        server_name: &str,
        identity: &ResolvedIdentity,
        durable: bool,
        selector: Option<&str>,
    ) -> Result<ServiceController, ServiceLifecycleError>;

    /// Install a topic service on the given server.
    async fn install_topic(
        &self,
        server_name: &str,
        identity: &ResolvedIdentity,
    ) -> Result<ServiceController, ServiceLifecycleError>;

    /// Request teardown of an installed destination service.
    ///
    /// Drives the service through `StartRequested→Down` and
    /// `Removing→Removed` asynchronously.
    async fn remove(
        &self,
        server_name: &str,
        identity: &ResolvedIdentity,
    ) -> Result<(), ServiceLifecycleError>;
}

/// Controller over an installed destination service
///
/// Returned by the engine on acceptance of a creation request. Supports
/// lifecycle-transition subscription and access to the backing destination
/// object. Transitions per destination are delivered strictly in the order
/// the engine performed them.
#[derive(Debug, Clone)]
pub struct ServiceController {
    destination: Arc<Destination>,
    state: watch::Receiver<ServiceState>,
    transitions: broadcast::Sender<ServiceTransition>,
}

impl ServiceController {
    pub fn new(
        destination: Arc<Destination>,
        state: watch::Receiver<ServiceState>,
        transitions: broadcast::Sender<ServiceTransition>,
    ) -> Self {
        Self {
            destination,
            state,
            transitions,
        }
    }

    /// The backing destination object managed by this controller.
    pub fn destination(&self) -> Arc<Destination> {
        self.destination.clone()
    }

    /// Current state of the backing service.
    pub fn state(&self) -> ServiceState {
        *self.state.borrow()
    }

    /// Watch handle over the backing service's state.
    pub fn state_receiver(&self) -> watch::Receiver<ServiceState> {
        self.state.clone()
    }

    /// Subscribe to lifecycle transitions of the backing service.
    ///
    /// Only transitions performed after subscription are delivered; the
    /// current state is available through [`ServiceController::state`].
    pub fn subscribe(&self) -> TransitionReceiver {
        TransitionReceiver {
            receiver: self.transitions.subscribe(),
        }
    }
}

/// Transition subscription wrapper
#[derive(Debug)]
pub struct TransitionReceiver {
    pub receiver: broadcast::Receiver<ServiceTransition>,
}

impl TransitionReceiver {
    /// Receive the next transition; `None` once the engine has dropped the
    /// service (no further transitions will ever arrive).
    ///
    /// A lagging subscriber skips the overwritten transitions and keeps
    /// receiving instead of ending the stream.
    pub async fn recv(&mut self) -> Option<ServiceTransition> {
        loop {
            match self.receiver.recv().await {
                Ok(transition) => return Some(transition),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "transition subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lagged_subscriber_keeps_receiving() {
        let (tx, receiver) = broadcast::channel(1);
        let mut transitions = TransitionReceiver { receiver };

        // The second send overwrites the first in the size-1 channel.
        tx.send(ServiceTransition::new(ServiceState::Down, ServiceState::Starting))
            .unwrap();
        tx.send(ServiceTransition::new(ServiceState::Starting, ServiceState::Up))
            .unwrap();

        assert_eq!(
            transitions.recv().await,
            Some(ServiceTransition::new(ServiceState::Starting, ServiceState::Up))
        );

        drop(tx);
        assert_eq!(transitions.recv().await, None);
    }
}
