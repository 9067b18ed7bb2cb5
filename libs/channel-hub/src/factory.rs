//! Client factories: a resolved endpoint plus the transport settings derived
//! from it, producing a new channel per call.

use std::fmt;
use std::marker::PhantomData;

use tonic::transport::{Channel, Endpoint};

use crate::catalog::{ANY_ENDPOINT, EndpointCatalog};
use crate::endpoint::{EndpointAddress, ServiceEndpoint};
use crate::error::ChannelError;
use crate::spec::ChannelSpec;

fn duration_to_u64_ms(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// A service contract a channel can be wrapped into.
///
/// `NAME` is the contract name endpoints declare in configuration; a generated
/// tonic client would use its fully qualified service name.
pub trait ServiceContract: Send + 'static {
    const NAME: &'static str;

    fn from_channel(channel: Channel) -> Self;
}

/// Produces channels for one contract and one endpoint.
pub struct ChannelFactory<C> {
    endpoint: ServiceEndpoint,
    transport: Endpoint,
    _contract: PhantomData<fn() -> C>,
}

impl<C: ServiceContract> ChannelFactory<C> {
    #[must_use]
    pub fn new(endpoint: ServiceEndpoint) -> Self {
        let transport = endpoint.to_transport();
        Self {
            endpoint,
            transport,
            _contract: PhantomData,
        }
    }

    /// Build the factory a channel spec describes.
    ///
    /// Named shapes consult `catalog`; a remote address given alongside a name
    /// replaces the configured one. Explicit bindings never touch the catalog.
    ///
    /// # Errors
    /// Returns configuration-not-found errors from the catalog,
    /// `InvalidAddress` if an address does not parse, or `ContractMismatch`
    /// for an endpoint descriptor declared for another contract.
    pub fn from_spec(spec: &ChannelSpec, catalog: &EndpointCatalog) -> Result<Self, ChannelError> {
        let endpoint = match spec {
            ChannelSpec::Default => catalog.resolve(ANY_ENDPOINT, C::NAME)?,
            ChannelSpec::Named {
                endpoint_configuration_name,
            } => catalog.resolve(endpoint_configuration_name, C::NAME)?,
            ChannelSpec::NamedWithUri {
                endpoint_configuration_name,
                remote_uri,
            } => catalog
                .resolve(endpoint_configuration_name, C::NAME)?
                .with_address(EndpointAddress::parse(remote_uri)?),
            ChannelSpec::NamedWithAddress {
                endpoint_configuration_name,
                remote_address,
            } => catalog
                .resolve(endpoint_configuration_name, C::NAME)?
                .with_address((**remote_address).clone()),
            ChannelSpec::BindingWithUri {
                binding,
                remote_uri,
            } => ServiceEndpoint::new(
                C::NAME,
                EndpointAddress::parse(remote_uri)?,
                (**binding).clone(),
            ),
            ChannelSpec::BindingWithAddress {
                binding,
                remote_address,
            } => ServiceEndpoint::new(C::NAME, (**remote_address).clone(), (**binding).clone()),
            ChannelSpec::Endpoint { endpoint } => {
                if endpoint.contract != C::NAME {
                    return Err(ChannelError::ContractMismatch {
                        expected: C::NAME,
                        found: endpoint.contract.clone(),
                    });
                }
                (**endpoint).clone()
            }
        };
        Ok(Self::new(endpoint))
    }

    #[must_use]
    pub fn endpoint(&self) -> &ServiceEndpoint {
        &self.endpoint
    }

    /// Create a new channel. No I/O happens here; the connection is
    /// established on the first call made through the channel.
    ///
    /// # Errors
    /// Returns `ChannelError::NoRuntime` outside a Tokio runtime.
    pub fn create_channel(&self) -> Result<C, ChannelError> {
        if tokio::runtime::Handle::try_current().is_err() {
            return Err(ChannelError::NoRuntime);
        }
        let channel = self.transport.connect_lazy();
        tracing::trace!(
            contract = C::NAME,
            address = %self.endpoint.address,
            "channel created"
        );
        Ok(C::from_channel(channel))
    }

    pub(crate) fn log_constructed(&self) {
        let b = &self.endpoint.binding;
        tracing::info!(
            contract = C::NAME,
            endpoint = self.endpoint.name.as_deref().unwrap_or("<explicit>"),
            address = %self.endpoint.address,
            binding = %b.name,
            open_timeout_ms = duration_to_u64_ms(b.open_timeout),
            send_timeout_ms = duration_to_u64_ms(b.send_timeout),
            "channel factory constructed"
        );
    }
}

impl<C> fmt::Debug for ChannelFactory<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelFactory")
            .field("contract", &self.endpoint.contract)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}
