//! Binding Adapter
//!
//! Wraps a backing destination service behind a reference factory in the
//! naming layer and attaches a lifecycle observer to its controller. The
//! lookup slot becomes resolvable only once the service reports up; before
//! that, resolution yields a "not yet available" condition from the naming
//! layer rather than a stale or partial object.

use std::sync::Arc;

use bidali_core::{
    Destination, DestinationHandle, LifecycleEvent, ResolvedIdentity, ServiceState,
};
use bidali_ports::{NamingError, NamingPort, ReferenceFactory, ServiceController};
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Reference factory gated on the backing service's lifecycle state
struct ServiceBackedReferenceFactory {
    destination: Arc<Destination>,
    state: watch::Receiver<ServiceState>,
}

impl ReferenceFactory for ServiceBackedReferenceFactory {
    fn create_reference(&self) -> Result<Arc<Destination>, NamingError> {
        match *self.state.borrow() {
            ServiceState::Up => Ok(self.destination.clone()),
            _ => Err(NamingError::NotAvailable {
                name: self.destination.identity.to_string(),
            }),
        }
    }
}

/// Subscription to the lifecycle events of one bound destination
///
/// Events arrive strictly in the order the backing service transitioned;
/// the stream ends after `Removed`.
#[derive(Debug)]
pub struct LifecycleEventReceiver {
    receiver: broadcast::Receiver<LifecycleEvent>,
}

impl LifecycleEventReceiver {
    /// Receive the next event; a lagging subscriber skips the overwritten
    /// events and keeps receiving instead of ending the stream.
    pub async fn recv(&mut self) -> Option<LifecycleEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "lifecycle event subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}

/// Binds destination services into the naming layer
pub struct BindingAdapter {
    naming: Arc<dyn NamingPort>,
}

impl BindingAdapter {
    pub fn new(naming: Arc<dyn NamingPort>) -> Self {
        Self { naming }
    }

    /// Bind the destination behind `controller` under `lookup_name`.
    ///
    /// Registers the state-gated reference factory and spawns the
    /// lifecycle observer for this destination. The returned receiver was
    /// subscribed before the observer starts, so no event is missed.
    pub async fn bind(
        &self,
        handle: &DestinationHandle,
        controller: ServiceController,
        lookup_name: &str,
    ) -> Result<LifecycleEventReceiver, NamingError> {
        let factory = Arc::new(ServiceBackedReferenceFactory {
            destination: controller.destination(),
            state: controller.state_receiver(),
        });
        self.naming.bind(lookup_name, factory).await?;

        let (events, receiver) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        spawn_observer(
            handle.identity.clone(),
            lookup_name.to_string(),
            controller,
            events,
        );

        Ok(LifecycleEventReceiver { receiver })
    }
}

/// One observer task per destination, consuming engine transitions in
/// order and emitting the corresponding lifecycle events.
fn spawn_observer(
    identity: ResolvedIdentity,
    lookup_name: String,
    controller: ServiceController,
    events: broadcast::Sender<LifecycleEvent>,
) {
    let mut transitions = controller.subscribe();
    tokio::spawn(async move {
        let mut bound = false;

        // The engine may have brought the service up between installation
        // and observer attachment; replay the current state so Bound is
        // never skipped, and suppress the duplicate if the transition was
        // also delivered through the subscription.
        if controller.state() == ServiceState::Up {
            bound = true;
            info!(name = %lookup_name, identity = %identity, "bound messaging destination");
            let _ = events.send(LifecycleEvent::Bound(identity.clone()));
        }

        while let Some(transition) = transitions.recv().await {
            if transition.is_start_failure() {
                error!(
                    identity = %identity,
                    transition = %transition,
                    "destination service failed to start"
                );
                continue;
            }

            let Some(event) = transition.lifecycle_event(&identity) else {
                continue;
            };

            match &event {
                LifecycleEvent::Bound(_) => {
                    if bound {
                        continue;
                    }
                    bound = true;
                    info!(name = %lookup_name, identity = %identity, "bound messaging destination");
                }
                LifecycleEvent::Unbound(_) => {
                    bound = false;
                    info!(name = %lookup_name, identity = %identity, "unbound messaging destination");
                }
                LifecycleEvent::Removed(_) => {
                    debug!(identity = %identity, "removed messaging destination service");
                }
            }

            let finished = matches!(event, LifecycleEvent::Removed(_));
            let _ = events.send(event);
            if finished {
                break;
            }
        }
    });
}
