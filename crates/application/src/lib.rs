//! Application Layer - Destination Provisioning Orchestration
//!
//! Couples the identity resolver, the lifecycle engine, the management
//! registrar, and the binding adapter into the deployment-time flow that
//! turns a declared destination reference into a running, resolvable
//! destination service.

pub mod binding;
pub mod provisioner;

pub use crate::binding::{BindingAdapter, LifecycleEventReceiver};
pub use crate::provisioner::{DestinationBinding, DestinationProvisioner};

use bidali_core::DestinationError;
use thiserror::Error;

/// Deployment-processing failure
///
/// Synchronous configuration and identity errors are wrapped into this
/// single failure, aborting the enclosing deployment unit. Asynchronous
/// lifecycle failures never surface here; they are only observable through
/// the lifecycle events.
#[derive(Error, Debug)]
pub enum DeploymentError {
    #[error("failed to set up destination '{identity}': {source}")]
    DestinationSetup {
        identity: String,
        #[source]
        source: DestinationError,
    },

    #[error("failed to tear down destination '{identity}': {reason}")]
    DestinationTeardown { identity: String, reason: String },
}
