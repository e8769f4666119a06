//! Domain Core - Destination Model and Shared Types
//!
//! This crate contains the destination domain entities, value objects,
//! identity resolution, and the lifecycle model shared by the
//! provisioning layers.

pub mod config;
pub mod destination;
pub mod error;
pub mod lifecycle;
pub mod resolution;

pub use crate::error::DestinationError;

// Re-export all types for easy importing
pub use crate::config::{
    DEFAULT_SERVER_NAME, DURABLE_PROPERTY, ProvisionerConfig, SELECTOR_PROPERTY,
    SERVER_NAME_PROPERTY,
};
pub use crate::destination::{
    Destination, DestinationDescriptor, DestinationHandle, DestinationKind, DestinationRequest,
    ManagementEntry,
};
pub use crate::lifecycle::{LifecycleEvent, ServiceState, ServiceTransition};
pub use crate::resolution::{ResolutionContext, ResolvedIdentity};

// Domain result type
pub type Result<T> = std::result::Result<T, DestinationError>;
