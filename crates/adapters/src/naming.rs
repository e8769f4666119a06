//! In-Memory Naming Registry
//!
//! Registry of reference factories keyed by lookup name. Bindings are
//! exclusive; resolution clones the factory handle out of the map before
//! invoking it, so a slow factory never holds the registry lock.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bidali_core::Destination;
use bidali_ports::{NamingError, NamingPort, ReferenceFactory};
use parking_lot::RwLock;
use tracing::debug;

/// In-memory naming registry
#[derive(Default)]
pub struct InMemoryNamingRegistry {
    bindings: RwLock<HashMap<String, Arc<dyn ReferenceFactory>>>,
}

impl InMemoryNamingRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NamingPort for InMemoryNamingRegistry {
    async fn bind(
        &self,
        name: &str,
        factory: Arc<dyn ReferenceFactory>,
    ) -> Result<(), NamingError> {
        let mut bindings = self.bindings.write();
        if bindings.contains_key(name) {
            return Err(NamingError::AlreadyBound(name.to_string()));
        }
        bindings.insert(name.to_string(), factory);
        debug!(name = %name, "lookup name bound");
        Ok(())
    }

    async fn resolve(&self, name: &str) -> Result<Arc<Destination>, NamingError> {
        let factory = self
            .bindings
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| NamingError::NotBound(name.to_string()))?;
        factory.create_reference()
    }

    async fn unbind(&self, name: &str) -> Result<(), NamingError> {
        if self.bindings.write().remove(name).is_none() {
            return Err(NamingError::NotBound(name.to_string()));
        }
        debug!(name = %name, "lookup name unbound");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bidali_core::{DestinationKind, ResolvedIdentity};

    struct FixedFactory {
        destination: Arc<Destination>,
    }

    impl ReferenceFactory for FixedFactory {
        fn create_reference(&self) -> Result<Arc<Destination>, NamingError> {
            Ok(self.destination.clone())
        }
    }

    struct UnavailableFactory;

    impl ReferenceFactory for UnavailableFactory {
        fn create_reference(&self) -> Result<Arc<Destination>, NamingError> {
            Err(NamingError::NotAvailable {
                name: "orders".to_string(),
            })
        }
    }

    fn factory(identity: &str) -> Arc<dyn ReferenceFactory> {
        Arc::new(FixedFactory {
            destination: Arc::new(Destination {
                identity: ResolvedIdentity::new(identity),
                kind: DestinationKind::Queue,
                server_name: "default".to_string(),
            }),
        })
    }

    #[tokio::test]
    async fn test_bind_then_resolve() {
        let registry = InMemoryNamingRegistry::new();
        registry.bind("orders", factory("app_mod_orders")).await.unwrap();

        let destination = registry.resolve("orders").await.unwrap();
        assert_eq!(destination.identity.as_str(), "app_mod_orders");
    }

    #[tokio::test]
    async fn test_bindings_are_exclusive() {
        let registry = InMemoryNamingRegistry::new();
        registry.bind("orders", factory("a")).await.unwrap();

        let err = registry.bind("orders", factory("b")).await.unwrap_err();
        assert!(matches!(err, NamingError::AlreadyBound(_)));
    }

    #[tokio::test]
    async fn test_resolve_propagates_factory_unavailability() {
        let registry = InMemoryNamingRegistry::new();
        registry
            .bind("orders", Arc::new(UnavailableFactory))
            .await
            .unwrap();

        let err = registry.resolve("orders").await.unwrap_err();
        assert!(matches!(err, NamingError::NotAvailable { .. }));
    }

    #[tokio::test]
    async fn test_unbind_frees_the_name() {
        let registry = InMemoryNamingRegistry::new();
        registry.bind("orders", factory("a")).await.unwrap();
        registry.unbind("orders").await.unwrap();

        assert!(matches!(
            registry.resolve("orders").await.unwrap_err(),
            NamingError::NotBound(_)
        ));
        registry.bind("orders", factory("b")).await.unwrap();
    }

    #[tokio::test]
    async fn test_unbind_absent_name_fails() {
        let registry = InMemoryNamingRegistry::new();
        let err = registry.unbind("ghost").await.unwrap_err();
        assert!(matches!(err, NamingError::NotBound(_)));
    }
}
