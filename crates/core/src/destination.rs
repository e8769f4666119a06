//! Destination Domain Entities
//!
//! This module contains the destination request/handle value objects and
//! the management descriptor records.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::resolution::ResolvedIdentity;

/// Kind of messaging destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DestinationKind {
    /// Point-to-point destination
    Queue,
    /// Publish/subscribe destination
    Topic,
}

impl DestinationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DestinationKind::Queue => "queue",
            DestinationKind::Topic => "topic",
        }
    }
}

impl std::fmt::Display for DestinationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A declared destination reference, created when a component requests a
/// queue or topic.
///
/// Built once through the constructor and `with_*` methods; treated as
/// immutable afterwards, so it is safely shared across observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationRequest {
    /// Logical name the destination is looked up under.
    pub logical_name: String,
    pub kind: DestinationKind,
    /// Destination interface the component expects to receive.
    pub interface_name: String,
    /// Explicit destination name overriding identity resolution.
    pub explicit_destination_name: Option<String>,
    pub description: Option<String>,
    pub implementation_class: Option<String>,
    pub resource_adapter: Option<String>,
    /// Free-form configuration properties (selector, durable, server name).
    pub properties: HashMap<String, String>,
}

impl DestinationRequest {
    pub fn new(
        logical_name: impl Into<String>,
        kind: DestinationKind,
        interface_name: impl Into<String>,
    ) -> Self {
        Self {
            logical_name: logical_name.into(),
            kind,
            interface_name: interface_name.into(),
            explicit_destination_name: None,
            description: None,
            implementation_class: None,
            resource_adapter: None,
            properties: HashMap::new(),
        }
    }

    pub fn with_destination_name(mut self, destination_name: impl Into<String>) -> Self {
        self.explicit_destination_name = Some(destination_name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_implementation_class(mut self, class_name: impl Into<String>) -> Self {
        self.implementation_class = Some(class_name.into());
        self
    }

    pub fn with_resource_adapter(mut self, resource_adapter: impl Into<String>) -> Self {
        self.resource_adapter = Some(resource_adapter.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

/// The live destination endpoint yielded by lookup resolution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub identity: ResolvedIdentity,
    pub kind: DestinationKind,
    pub server_name: String,
}

/// Handle to a provisioned destination service
///
/// Returned once the creation request is accepted by the lifecycle engine;
/// torn down when the owning deployment is undeployed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationHandle {
    pub identity: ResolvedIdentity,
    pub kind: DestinationKind,
    pub server_name: String,
}

/// Introspectable description of a provisioned destination
///
/// Topics never carry durability or selector attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationDescriptor {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub durable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    /// Lookup names this destination is reachable under.
    pub entries: Vec<String>,
}

impl DestinationDescriptor {
    pub fn queue(
        name: impl Into<String>,
        durable: bool,
        selector: Option<String>,
        entries: Vec<String>,
    ) -> Self {
        Self {
            name: name.into(),
            durable: Some(durable),
            selector,
            entries,
        }
    }

    pub fn topic(name: impl Into<String>, entries: Vec<String>) -> Self {
        Self {
            name: name.into(),
            durable: None,
            selector: None,
            entries,
        }
    }
}

/// Management record published under the (server, destination) path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagementEntry {
    pub server_name: String,
    pub kind: DestinationKind,
    pub descriptor: DestinationDescriptor,
    pub registered_at: chrono::DateTime<chrono::Utc>,
}

impl ManagementEntry {
    pub fn new(
        server_name: impl Into<String>,
        kind: DestinationKind,
        descriptor: DestinationDescriptor,
    ) -> Self {
        Self {
            server_name: server_name.into(),
            kind,
            descriptor,
            registered_at: chrono::Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_builder() {
        let request = DestinationRequest::new("orders", DestinationKind::Queue, "jakarta.jms.Queue")
            .with_description("order intake")
            .with_property("durable", "true")
            .with_property("selector", "JMSPriority>5");

        assert_eq!(request.logical_name, "orders");
        assert_eq!(request.kind, DestinationKind::Queue);
        assert_eq!(request.description.as_deref(), Some("order intake"));
        assert_eq!(request.property("durable"), Some("true"));
        assert_eq!(request.property("selector"), Some("JMSPriority>5"));
        assert_eq!(request.property("missing"), None);
    }

    #[test]
    fn test_queue_descriptor_carries_attributes() {
        let descriptor = DestinationDescriptor::queue(
            "shop_orders-ejb_orders",
            true,
            Some("JMSPriority>5".to_string()),
            vec!["orders".to_string()],
        );

        assert_eq!(descriptor.durable, Some(true));
        assert_eq!(descriptor.selector.as_deref(), Some("JMSPriority>5"));
        assert_eq!(descriptor.entries, vec!["orders".to_string()]);
    }

    #[test]
    fn test_topic_descriptor_has_no_queue_attributes() {
        let descriptor =
            DestinationDescriptor::topic("shop_news-ejb_news", vec!["news".to_string()]);

        assert_eq!(descriptor.durable, None);
        assert_eq!(descriptor.selector, None);
    }

    #[test]
    fn test_topic_descriptor_serialization_omits_queue_attributes() {
        let descriptor = DestinationDescriptor::topic("t", vec!["news".to_string()]);
        let json = serde_json::to_value(&descriptor).unwrap();

        assert!(json.get("durable").is_none());
        assert!(json.get("selector").is_none());
        assert_eq!(json["name"], "t");
    }

    #[test]
    fn test_management_entry_roundtrip() {
        let entry = ManagementEntry::new(
            "default",
            DestinationKind::Queue,
            DestinationDescriptor::queue("q", false, None, vec!["orders".to_string()]),
        );

        let json = serde_json::to_string(&entry).unwrap();
        let decoded: ManagementEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, entry);
    }
}
