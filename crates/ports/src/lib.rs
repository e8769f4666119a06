//! Ports - Abstraction Layer
//!
//! This crate defines ports (traits) for the external collaborators the
//! provisioning layer depends on: the service lifecycle engine, the
//! management/introspection layer, and the naming/lookup layer. Adapters
//! implement them in the infrastructure layer.

pub mod management;
pub mod naming;
pub mod service_lifecycle;

pub use crate::management::{ManagementError, ManagementPort};
pub use crate::naming::{NamingError, NamingPort, ReferenceFactory};
pub use crate::service_lifecycle::{
    ServiceController, ServiceLifecycleError, ServiceLifecyclePort, TransitionReceiver,
};
