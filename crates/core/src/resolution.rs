//! Destination Identity Resolution
//!
//! Computes the globally unique name of a destination from its request and
//! the naming scope it was declared under.

use serde::{Deserialize, Serialize};

use crate::destination::DestinationRequest;

/// Naming scope under which a destination reference is declared.
///
/// Supplied by the deployment pipeline; read-only input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionContext {
    pub application_name: String,
    pub module_name: String,
    pub component_name: Option<String>,
}

impl ResolutionContext {
    pub fn new(application_name: impl Into<String>, module_name: impl Into<String>) -> Self {
        Self {
            application_name: application_name.into(),
            module_name: module_name.into(),
            component_name: None,
        }
    }

    pub fn with_component(mut self, component_name: impl Into<String>) -> Self {
        self.component_name = Some(component_name.into());
        self
    }
}

/// Unique destination name within a server's namespace.
///
/// Stable for the lifetime of the deployment: either the explicit
/// destination name, or a deterministic composition of the naming scope
/// and the logical name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedIdentity(String);

impl ResolvedIdentity {
    pub fn new(identity: impl Into<String>) -> Self {
        let identity = identity.into();
        debug_assert!(!identity.is_empty(), "destination identity must be non-empty");
        Self(identity)
    }

    /// Resolves the unique name for a destination request.
    ///
    /// An explicit destination name wins and is returned verbatim.
    /// Otherwise the identity is
    /// `<application>_<module>_[<component>_]<logical name>`.
    pub fn resolve(request: &DestinationRequest, context: &ResolutionContext) -> Self {
        if let Some(name) = &request.explicit_destination_name {
            if !name.is_empty() {
                return Self(name.clone());
            }
        }

        let mut unique_name = String::new();
        unique_name.push_str(&context.application_name);
        unique_name.push('_');
        unique_name.push_str(&context.module_name);
        unique_name.push('_');
        if let Some(component_name) = &context.component_name {
            unique_name.push_str(component_name);
            unique_name.push('_');
        }
        unique_name.push_str(&request.logical_name);
        Self(unique_name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResolvedIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
