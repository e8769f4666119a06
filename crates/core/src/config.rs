//! Provisioner Configuration
//!
//! Global defaults are explicit values handed to the provisioner instead of
//! ambient lookups, so the resolution and provisioning paths stay pure.

/// Property key selecting the target messaging server instance.
///
/// A destination may be deployed to another server by passing
/// `hornetq-server=<name of the server>` in its properties; otherwise the
/// configured default server is used.
pub const SERVER_NAME_PROPERTY: &str = "hornetq-server";

/// Property key for the queue durability flag (`"true"` / `"false"`).
pub const DURABLE_PROPERTY: &str = "durable";

/// Property key for the queue message selector expression.
pub const SELECTOR_PROPERTY: &str = "selector";

/// Name of the messaging server used when none is configured.
pub const DEFAULT_SERVER_NAME: &str = "default";

/// Configuration for the destination provisioner
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionerConfig {
    /// Server targeted when a request carries no server-name property.
    pub default_server_name: String,
    /// Durability applied to queues that do not set the durable property.
    pub default_durable: bool,
}

impl Default for ProvisionerConfig {
    fn default() -> Self {
        Self {
            default_server_name: DEFAULT_SERVER_NAME.to_string(),
            default_durable: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProvisionerConfig::default();
        assert_eq!(config.default_server_name, "default");
        assert!(config.default_durable);
    }
}
