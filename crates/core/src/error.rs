//! Error types shared across the system

use thiserror::Error;

/// Base error type for destination provisioning
#[derive(Error, Debug)]
pub enum DestinationError {
    #[error("invalid configuration for property '{property}' (value '{value}'): {reason}")]
    InvalidConfiguration {
        property: String,
        value: String,
        reason: String,
    },

    #[error("destination '{identity}' already exists on server '{server_name}'")]
    DuplicateIdentity {
        identity: String,
        server_name: String,
    },

    #[error("destination service '{identity}' failed to start: {reason}")]
    ServiceStartFailure { identity: String, reason: String },

    #[error("management registration failed: {0}")]
    RegistrationFailure(String),
}

impl DestinationError {
    pub fn invalid_configuration(property: &str, value: &str, reason: &str) -> Self {
        Self::InvalidConfiguration {
            property: property.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn duplicate_identity(identity: &str, server_name: &str) -> Self {
        Self::DuplicateIdentity {
            identity: identity.to_string(),
            server_name: server_name.to_string(),
        }
    }

    pub fn service_start_failure(identity: &str, reason: &str) -> Self {
        Self::ServiceStartFailure {
            identity: identity.to_string(),
            reason: reason.to_string(),
        }
    }
}
