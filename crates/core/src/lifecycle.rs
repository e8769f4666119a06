//! Service Lifecycle Model
//!
//! States and transitions of a backing destination service as driven by the
//! lifecycle engine, and the binding-level events derived from them.

use serde::{Deserialize, Serialize};

use crate::resolution::ResolvedIdentity;

/// State of a backing destination service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceState {
    Down,
    Starting,
    Up,
    StartRequested,
    Removing,
    Removed,
}

impl ServiceState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceState::Down => "DOWN",
            ServiceState::Starting => "STARTING",
            ServiceState::Up => "UP",
            ServiceState::StartRequested => "START_REQUESTED",
            ServiceState::Removing => "REMOVING",
            ServiceState::Removed => "REMOVED",
        }
    }
}

impl std::fmt::Display for ServiceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single state change of a backing service
///
/// Per destination, transitions are observed in the canonical order
/// `Starting→Up`, then `StartRequested→Down`, then `Removing→Removed`,
/// with no reordering or skipping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceTransition {
    pub from: ServiceState,
    pub to: ServiceState,
}

impl ServiceTransition {
    pub fn new(from: ServiceState, to: ServiceState) -> Self {
        Self { from, to }
    }

    /// The service attempted to start and ended down instead of up.
    pub fn is_start_failure(&self) -> bool {
        matches!(
            (self.from, self.to),
            (ServiceState::Starting, ServiceState::Down)
        )
    }

    /// Binding-level event observed for this transition, if any.
    pub fn lifecycle_event(&self, identity: &ResolvedIdentity) -> Option<LifecycleEvent> {
        match (self.from, self.to) {
            (ServiceState::Starting, ServiceState::Up) => {
                Some(LifecycleEvent::Bound(identity.clone()))
            }
            (ServiceState::StartRequested, ServiceState::Down) => {
                Some(LifecycleEvent::Unbound(identity.clone()))
            }
            (ServiceState::Removing, ServiceState::Removed) => {
                Some(LifecycleEvent::Removed(identity.clone()))
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for ServiceTransition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}->{}", self.from, self.to)
    }
}

/// Availability event emitted as a bound destination transitions state
///
/// Consumed by logging and observers only; no retained state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    Bound(ResolvedIdentity),
    Unbound(ResolvedIdentity),
    Removed(ResolvedIdentity),
}

impl LifecycleEvent {
    pub fn identity(&self) -> &ResolvedIdentity {
        match self {
            LifecycleEvent::Bound(identity)
            | LifecycleEvent::Unbound(identity)
            | LifecycleEvent::Removed(identity) => identity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> ResolvedIdentity {
        ResolvedIdentity::new("shop_orders-ejb_orders")
    }

    #[test]
    fn test_starting_to_up_maps_to_bound() {
        let transition = ServiceTransition::new(ServiceState::Starting, ServiceState::Up);
        let event = transition.lifecycle_event(&identity());
        assert_eq!(event, Some(LifecycleEvent::Bound(identity())));
    }

    #[test]
    fn test_start_requested_to_down_maps_to_unbound() {
        let transition = ServiceTransition::new(ServiceState::StartRequested, ServiceState::Down);
        let event = transition.lifecycle_event(&identity());
        assert_eq!(event, Some(LifecycleEvent::Unbound(identity())));
    }

    #[test]
    fn test_removing_to_removed_maps_to_removed() {
        let transition = ServiceTransition::new(ServiceState::Removing, ServiceState::Removed);
        let event = transition.lifecycle_event(&identity());
        assert_eq!(event, Some(LifecycleEvent::Removed(identity())));
    }

    #[test]
    fn test_intermediate_transitions_map_to_no_event() {
        let silent = [
            ServiceTransition::new(ServiceState::Down, ServiceState::Starting),
            ServiceTransition::new(ServiceState::Up, ServiceState::StartRequested),
            ServiceTransition::new(ServiceState::Down, ServiceState::Removing),
        ];
        for transition in silent {
            assert_eq!(transition.lifecycle_event(&identity()), None);
        }
    }

    #[test]
    fn test_start_failure_detection() {
        let failed = ServiceTransition::new(ServiceState::Starting, ServiceState::Down);
        assert!(failed.is_start_failure());
        assert_eq!(failed.lifecycle_event(&identity()), None);

        let started = ServiceTransition::new(ServiceState::Starting, ServiceState::Up);
        assert!(!started.is_start_failure());
    }
}
