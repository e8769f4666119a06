//! Management Registry Port
//!
//! Publishes introspectable destination records under a two-level path,
//! server scope then destination scope. Registration happens exactly once
//! per successful provisioning; unregistration exactly once on teardown.
//! Failures here are an observability concern, never fatal to delivery.

use async_trait::async_trait;
use bidali_core::{DestinationDescriptor, DestinationKind, ManagementEntry, ResolvedIdentity};

/// Management layer error types
#[derive(thiserror::Error, Debug)]
pub enum ManagementError {
    #[error("entry already registered at {server_name}/{kind}/{identity}")]
    AlreadyRegistered {
        server_name: String,
        kind: DestinationKind,
        identity: String,
    },

    #[error("no entry registered at {server_name}/{kind}/{identity}")]
    NotRegistered {
        server_name: String,
        kind: DestinationKind,
        identity: String,
    },

    #[error("management layer error: {0}")]
    Internal(String),
}

/// Management registrar port
#[async_trait]
pub trait ManagementPort: Send + Sync {
    /// Publish a descriptor under (server, kind, identity).
    async fn register(
        &self,
        server_name: &str,
        kind: DestinationKind,
        identity: &ResolvedIdentity,
        descriptor: DestinationDescriptor,
    ) -> Result<(), ManagementError>;

    /// Remove the entry registered under (server, kind, identity).
    async fn unregister(
        &self,
        server_name: &str,
        kind: DestinationKind,
        identity: &ResolvedIdentity,
    ) -> Result<(), ManagementError>;

    /// Query a single entry by path.
    async fn lookup(
        &self,
        server_name: &str,
        kind: DestinationKind,
        identity: &ResolvedIdentity,
    ) -> Option<ManagementEntry>;

    /// List all entries registered under a server scope.
    async fn list(&self, server_name: &str) -> Vec<ManagementEntry>;
}
