//! Destination Provisioner
//!
//! Deployment-time orchestration for a declared destination reference:
//! resolve the unique identity, create the backing service on the target
//! server, publish the management entry, and hand the controller to the
//! binding adapter. Creation and binding are deliberately two distinct
//! phases: the service is installed without any naming binding, and the
//! lookup slot is wired separately against the service's availability
//! signal, so the naming layer never races the container's own registry.

use std::sync::Arc;

use bidali_core::{
    DestinationDescriptor, DestinationError, DestinationHandle, DestinationKind,
    DestinationRequest, ProvisionerConfig, ResolutionContext, ResolvedIdentity, DURABLE_PROPERTY,
    SELECTOR_PROPERTY, SERVER_NAME_PROPERTY,
};
use bidali_ports::{
    ManagementPort, NamingError, NamingPort, ServiceController, ServiceLifecycleError,
    ServiceLifecyclePort,
};
use tracing::{info, warn};

use crate::binding::{BindingAdapter, LifecycleEventReceiver};
use crate::DeploymentError;

/// A provisioned and bound destination, owned by its deployment unit
#[derive(Debug)]
pub struct DestinationBinding {
    pub handle: DestinationHandle,
    /// Logical name the destination is bound under in the naming layer.
    pub lookup_name: String,
    /// Lifecycle events of this destination, subscribed before the
    /// observer started so the initial `Bound` is never missed.
    pub events: LifecycleEventReceiver,
}

/// Provisions destination services for deployment units
pub struct DestinationProvisioner {
    lifecycle: Arc<dyn ServiceLifecyclePort>,
    management: Arc<dyn ManagementPort>,
    naming: Arc<dyn NamingPort>,
    config: ProvisionerConfig,
}

impl DestinationProvisioner {
    pub fn new(
        lifecycle: Arc<dyn ServiceLifecyclePort>,
        management: Arc<dyn ManagementPort>,
        naming: Arc<dyn NamingPort>,
        config: ProvisionerConfig,
    ) -> Self {
        Self {
            lifecycle,
            management,
            naming,
            config,
        }
    }

    /// Provision the destination declared by `request` within `context`.
    ///
    /// Called once per deployment unit per destination. Configuration and
    /// identity errors are raised synchronously; the actual service start
    /// happens asynchronously and is observable through the returned
    /// binding's events.
    pub async fn provision(
        &self,
        request: &DestinationRequest,
        context: &ResolutionContext,
    ) -> Result<DestinationBinding, DeploymentError> {
        let identity = ResolvedIdentity::resolve(request, context);
        self.provision_resolved(request, &identity)
            .await
            .map_err(|source| DeploymentError::DestinationSetup {
                identity: identity.to_string(),
                source,
            })
    }

    /// Tear down a destination on undeploy of its owning unit.
    ///
    /// Unbinds the lookup slot, removes the management entry, and requests
    /// removal of the backing service; observers see `Unbound` and then
    /// `Removed` as the engine winds the service down.
    pub async fn teardown(&self, binding: &DestinationBinding) -> Result<(), DeploymentError> {
        let handle = &binding.handle;

        if let Err(err) = self.naming.unbind(&binding.lookup_name).await {
            warn!(
                name = %binding.lookup_name,
                identity = %handle.identity,
                error = %err,
                "lookup unbind failed during teardown"
            );
        }

        if let Err(err) = self
            .management
            .unregister(&handle.server_name, handle.kind, &handle.identity)
            .await
        {
            warn!(
                identity = %handle.identity,
                server = %handle.server_name,
                error = %err,
                "management unregistration failed during teardown"
            );
        }

        self.lifecycle
            .remove(&handle.server_name, &handle.identity)
            .await
            .map_err(|err| DeploymentError::DestinationTeardown {
                identity: handle.identity.to_string(),
                reason: err.to_string(),
            })?;

        info!(
            identity = %handle.identity,
            server = %handle.server_name,
            "destination teardown requested"
        );
        Ok(())
    }

    async fn provision_resolved(
        &self,
        request: &DestinationRequest,
        identity: &ResolvedIdentity,
    ) -> Result<DestinationBinding, DestinationError> {
        let server_name = request
            .property(SERVER_NAME_PROPERTY)
            .unwrap_or(&self.config.default_server_name)
            .to_string();

        let (controller, descriptor) = match request.kind {
            DestinationKind::Queue => self.install_queue(request, identity, &server_name).await?,
            DestinationKind::Topic => self.install_topic(request, identity, &server_name).await?,
        };

        // Management publishing is surfaced to operators, never to the
        // deployer: delivery does not depend on the entry existing.
        if let Err(err) = self
            .management
            .register(&server_name, request.kind, identity, descriptor)
            .await
        {
            let failure = DestinationError::RegistrationFailure(err.to_string());
            warn!(
                identity = %identity,
                server = %server_name,
                error = %failure,
                "management registration failed"
            );
        }

        let handle = DestinationHandle {
            identity: identity.clone(),
            kind: request.kind,
            server_name: server_name.clone(),
        };

        let binder = BindingAdapter::new(self.naming.clone());
        let events = match binder.bind(&handle, controller, &request.logical_name).await {
            Ok(events) => events,
            Err(err) => {
                self.rollback(&handle).await;
                return Err(map_bind_error(err, &request.logical_name));
            }
        };

        info!(
            identity = %identity,
            kind = %request.kind,
            server = %server_name,
            name = %request.logical_name,
            "destination provisioned"
        );

        Ok(DestinationBinding {
            handle,
            lookup_name: request.logical_name.clone(),
            events,
        })
    }

    /// Undo the installed service and management entry after a failed bind,
    /// so a rejected provisioning leaves no partial state behind.
    async fn rollback(&self, handle: &DestinationHandle) {
        if let Err(err) = self
            .management
            .unregister(&handle.server_name, handle.kind, &handle.identity)
            .await
        {
            warn!(
                identity = %handle.identity,
                server = %handle.server_name,
                error = %err,
                "management unregistration failed during rollback"
            );
        }

        if let Err(err) = self
            .lifecycle
            .remove(&handle.server_name, &handle.identity)
            .await
        {
            warn!(
                identity = %handle.identity,
                server = %handle.server_name,
                error = %err,
                "service removal failed during rollback"
            );
        }
    }

    async fn install_queue(
        &self,
        request: &DestinationRequest,
        identity: &ResolvedIdentity,
        server_name: &str,
    ) -> Result<(ServiceController, DestinationDescriptor), DestinationError> {
        let durable = match request.property(DURABLE_PROPERTY) {
            None => self.config.default_durable,
            Some(raw) => parse_durable(raw)?,
        };
        let selector = request.property(SELECTOR_PROPERTY).map(str::to_string);

        let controller = self
            .lifecycle
            .install_queue(server_name, identity, durable, selector.as_deref())
            .await
            .map_err(|err| map_install_error(err, identity, server_name))?;

        let descriptor = DestinationDescriptor::queue(
            identity.to_string(),
            durable,
            selector,
            vec![request.logical_name.clone()],
        );
        Ok((controller, descriptor))
    }

    async fn install_topic(
        &self,
        request: &DestinationRequest,
        identity: &ResolvedIdentity,
        server_name: &str,
    ) -> Result<(ServiceController, DestinationDescriptor), DestinationError> {
        let controller = self
            .lifecycle
            .install_topic(server_name, identity)
            .await
            .map_err(|err| map_install_error(err, identity, server_name))?;

        let descriptor = DestinationDescriptor::topic(
            identity.to_string(),
            vec![request.logical_name.clone()],
        );
        Ok((controller, descriptor))
    }
}

fn parse_durable(raw: &str) -> Result<bool, DestinationError> {
    match raw {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(DestinationError::invalid_configuration(
            DURABLE_PROPERTY,
            other,
            "expected 'true' or 'false'",
        )),
    }
}

fn map_install_error(
    err: ServiceLifecycleError,
    identity: &ResolvedIdentity,
    server_name: &str,
) -> DestinationError {
    match err {
        ServiceLifecycleError::DuplicateService { .. } => {
            DestinationError::duplicate_identity(identity.as_str(), server_name)
        }
        ServiceLifecycleError::UnknownServer(server) => DestinationError::invalid_configuration(
            SERVER_NAME_PROPERTY,
            &server,
            "no such messaging server",
        ),
        other => DestinationError::service_start_failure(identity.as_str(), &other.to_string()),
    }
}

fn map_bind_error(err: NamingError, lookup_name: &str) -> DestinationError {
    DestinationError::invalid_configuration("name", lookup_name, &err.to_string())
}
