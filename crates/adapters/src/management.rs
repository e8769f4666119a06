//! In-Memory Management Registry
//!
//! Keeps published destination records in process memory, keyed by the
//! server/kind/identity path. Registration and unregistration are strict:
//! double registration and removal of an absent entry are errors, so the
//! provisioner's exactly-once discipline is verifiable in tests.

use std::collections::HashMap;

use async_trait::async_trait;
use bidali_core::{DestinationDescriptor, DestinationKind, ManagementEntry, ResolvedIdentity};
use bidali_ports::{ManagementError, ManagementPort};
use parking_lot::RwLock;
use tracing::debug;

type EntryKey = (String, DestinationKind, String);

/// In-memory management registrar
#[derive(Default)]
pub struct InMemoryManagementRegistry {
    entries: RwLock<HashMap<EntryKey, ManagementEntry>>,
}

impl InMemoryManagementRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(server_name: &str, kind: DestinationKind, identity: &ResolvedIdentity) -> EntryKey {
        (server_name.to_string(), kind, identity.to_string())
    }
}

#[async_trait]
impl ManagementPort for InMemoryManagementRegistry {
    async fn register(
        &self,
        server_name: &str,
        kind: DestinationKind,
        identity: &ResolvedIdentity,
        descriptor: DestinationDescriptor,
    ) -> Result<(), ManagementError> {
        let key = Self::key(server_name, kind, identity);
        let mut entries = self.entries.write();
        if entries.contains_key(&key) {
            return Err(ManagementError::AlreadyRegistered {
                server_name: server_name.to_string(),
                kind,
                identity: identity.to_string(),
            });
        }
        entries.insert(key, ManagementEntry::new(server_name, kind, descriptor));
        debug!(
            server = %server_name,
            kind = %kind,
            identity = %identity,
            "management entry registered"
        );
        Ok(())
    }

    async fn unregister(
        &self,
        server_name: &str,
        kind: DestinationKind,
        identity: &ResolvedIdentity,
    ) -> Result<(), ManagementError> {
        let key = Self::key(server_name, kind, identity);
        let mut entries = self.entries.write();
        if entries.remove(&key).is_none() {
            return Err(ManagementError::NotRegistered {
                server_name: server_name.to_string(),
                kind,
                identity: identity.to_string(),
            });
        }
        debug!(
            server = %server_name,
            kind = %kind,
            identity = %identity,
            "management entry unregistered"
        );
        Ok(())
    }

    async fn lookup(
        &self,
        server_name: &str,
        kind: DestinationKind,
        identity: &ResolvedIdentity,
    ) -> Option<ManagementEntry> {
        self.entries
            .read()
            .get(&Self::key(server_name, kind, identity))
            .cloned()
    }

    async fn list(&self, server_name: &str) -> Vec<ManagementEntry> {
        let mut entries: Vec<ManagementEntry> = self
            .entries
            .read()
            .iter()
            .filter(|((server, _, _), _)| server == server_name)
            .map(|(_, entry)| entry.clone())
            .collect();
        entries.sort_by(|a, b| a.descriptor.name.cmp(&b.descriptor.name));
        entries
    }
}
