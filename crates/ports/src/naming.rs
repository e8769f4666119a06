//! Naming / Lookup Port
//!
//! The lookup layer carries reference factories rather than destination
//! stubs: resolving a name invokes the factory, which yields the live
//! destination object or reports that the backing service is not yet
//! available.

use std::sync::Arc;

use async_trait::async_trait;
use bidali_core::Destination;

/// Naming layer error types
#[derive(thiserror::Error, Debug)]
pub enum NamingError {
    #[error("nothing bound under '{0}'")]
    NotBound(String),

    #[error("'{name}' is bound but the backing service is not yet available")]
    NotAvailable { name: String },

    #[error("'{0}' is already bound")]
    AlreadyBound(String),
}

/// Indirection yielding the live destination object on resolution
pub trait ReferenceFactory: Send + Sync {
    fn create_reference(&self) -> Result<Arc<Destination>, NamingError>;
}

/// Naming registry port
#[async_trait]
pub trait NamingPort: Send + Sync {
    /// Bind a reference factory under a logical name.
    async fn bind(&self, name: &str, factory: Arc<dyn ReferenceFactory>)
        -> Result<(), NamingError>;

    /// Resolve a logical name to the live destination object.
    async fn resolve(&self, name: &str) -> Result<Arc<Destination>, NamingError>;

    /// Drop the binding registered under a logical name.
    async fn unbind(&self, name: &str) -> Result<(), NamingError>;
}
