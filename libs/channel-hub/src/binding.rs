//! Fluent registration: `hub.bind::<C>().to_service_channel_*(..)`.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::endpoint::{Binding, EndpointAddress, ServiceEndpoint};
use crate::error::ChannelError;
use crate::factory::ServiceContract;
use crate::hub::{BindingId, ChannelHub, FactoryHandle};
use crate::spec::{ChannelParams, ChannelShape, ChannelSpec};

/// Binding in progress for contract `C`; pick one configuration shape.
///
/// Every method validates its arguments before the hub is touched, so a
/// rejected call leaves no factory or binding behind.
pub struct BindingSyntax<'hub, C> {
    hub: &'hub ChannelHub,
    _contract: PhantomData<fn() -> C>,
}

impl<'hub, C: ServiceContract> BindingSyntax<'hub, C> {
    pub(crate) fn new(hub: &'hub ChannelHub) -> Self {
        Self {
            hub,
            _contract: PhantomData,
        }
    }

    /// First endpoint configured for `C`, equivalent to
    /// `to_service_channel_named("*")`.
    ///
    /// # Errors
    /// Never fails today; the signature matches the other shapes.
    pub fn to_service_channel(self) -> Result<BindingBuilder<'hub, C>, ChannelError> {
        self.to_spec(ChannelSpec::Default)
    }

    /// Configured endpoint `endpoint_configuration_name`. The name is looked up
    /// when the factory is first constructed.
    ///
    /// # Errors
    /// Never fails today; the signature matches the other shapes.
    pub fn to_service_channel_named(
        self,
        endpoint_configuration_name: &str,
    ) -> Result<BindingBuilder<'hub, C>, ChannelError> {
        self.to_spec(ChannelSpec::named(endpoint_configuration_name))
    }

    /// # Errors
    /// Never fails today; a malformed address is reported on resolution.
    pub fn to_service_channel_named_with_uri(
        self,
        endpoint_configuration_name: &str,
        remote_address: &str,
    ) -> Result<BindingBuilder<'hub, C>, ChannelError> {
        self.to_spec(ChannelSpec::named_with_uri(
            endpoint_configuration_name,
            remote_address,
        ))
    }

    /// # Errors
    /// Never fails today; the signature matches the other shapes.
    pub fn to_service_channel_named_with_address(
        self,
        endpoint_configuration_name: &str,
        remote_address: Arc<EndpointAddress>,
    ) -> Result<BindingBuilder<'hub, C>, ChannelError> {
        self.to_spec(ChannelSpec::named_with_address(
            endpoint_configuration_name,
            remote_address,
        ))
    }

    /// # Errors
    /// Never fails today; a malformed address is reported on resolution.
    pub fn to_service_channel_with_binding(
        self,
        binding: Arc<Binding>,
        remote_address: &str,
    ) -> Result<BindingBuilder<'hub, C>, ChannelError> {
        self.to_spec(ChannelSpec::binding_with_uri(binding, remote_address))
    }

    /// # Errors
    /// Never fails today; the signature matches the other shapes.
    pub fn to_service_channel_with_binding_address(
        self,
        binding: Arc<Binding>,
        remote_address: Arc<EndpointAddress>,
    ) -> Result<BindingBuilder<'hub, C>, ChannelError> {
        self.to_spec(ChannelSpec::binding_with_address(binding, remote_address))
    }

    /// # Errors
    /// Never fails today; the signature matches the other shapes.
    pub fn to_service_channel_endpoint(
        self,
        endpoint: Arc<ServiceEndpoint>,
    ) -> Result<BindingBuilder<'hub, C>, ChannelError> {
        self.to_spec(ChannelSpec::endpoint(endpoint))
    }

    /// Nullable form: any parameter may be `None`.
    ///
    /// # Errors
    /// `InvalidArgument` naming the first missing or foreign parameter.
    pub fn to_service_channel_from(
        self,
        shape: ChannelShape,
        params: ChannelParams,
    ) -> Result<BindingBuilder<'hub, C>, ChannelError> {
        self.to_spec(ChannelSpec::from_params(shape, params)?)
    }

    /// Bind an already validated spec.
    ///
    /// # Errors
    /// `TypeMismatch` if the hub's factory store is inconsistent for `C`.
    pub fn to_spec(self, spec: ChannelSpec) -> Result<BindingBuilder<'hub, C>, ChannelError> {
        self.hub.install::<C>(spec)
    }
}

/// A registered binding; refine it with a name or metadata.
pub struct BindingBuilder<'hub, C> {
    hub: &'hub ChannelHub,
    id: BindingId,
    factory: FactoryHandle,
    _contract: PhantomData<fn() -> C>,
}

impl<'hub, C> BindingBuilder<'hub, C> {
    pub(crate) fn new(hub: &'hub ChannelHub, id: BindingId, factory: FactoryHandle) -> Self {
        Self {
            hub,
            id,
            factory,
            _contract: PhantomData,
        }
    }

    /// Name this binding for [`ChannelHub::resolve_named`].
    #[must_use]
    pub fn named(self, name: impl Into<String>) -> Self {
        self.hub.set_binding_name(self.id, name.into());
        self
    }

    #[must_use]
    pub fn with_metadata(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.hub
            .set_binding_attribute(self.id, key.into(), value.into());
        self
    }

    #[must_use]
    pub fn id(&self) -> BindingId {
        self.id
    }

    /// The cached factory entry this binding shares with every equivalent registration.
    #[must_use]
    pub fn factory_handle(&self) -> FactoryHandle {
        self.factory
    }
}
