//! Adapters - Infrastructure Layer
//!
//! In-process implementations of the ports: an embedded broker engine that
//! owns destination service lifecycles, and in-memory management and
//! naming registries.

pub mod engine;
pub mod management;
pub mod naming;

pub use crate::engine::{EmbeddedBrokerEngine, StartMode};
pub use crate::management::InMemoryManagementRegistry;
pub use crate::naming::InMemoryNamingRegistry;
