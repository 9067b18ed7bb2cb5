//! External endpoint configuration store.
//!
//! Lookups happen when a client factory is constructed, never at registration:
//! a binding may name an endpoint that only matters (and only fails) once
//! something actually resolves it.

use std::collections::BTreeMap;
use std::path::Path;

use figment::Figment;

use crate::config::{BindingConfig, ClientSection, EndpointConfig};
use crate::endpoint::{Binding, EndpointAddress, ServiceEndpoint};
use crate::error::ChannelError;

/// Endpoint configuration name that selects the first endpoint declared for the contract.
pub const ANY_ENDPOINT: &str = "*";

/// Named endpoints and binding configurations, as declared in configuration.
#[derive(Debug, Clone, Default)]
pub struct EndpointCatalog {
    bindings: BTreeMap<String, BindingConfig>,
    endpoints: Vec<EndpointConfig>,
}

impl EndpointCatalog {
    #[must_use]
    pub fn new(section: ClientSection) -> Self {
        Self {
            bindings: section.bindings,
            endpoints: section.endpoints,
        }
    }

    /// # Errors
    /// Returns `ChannelError::Config` if the `client` section is invalid.
    pub fn from_figment(figment: &Figment) -> Result<Self, ChannelError> {
        ClientSection::from_figment(figment).map(Self::new)
    }

    /// # Errors
    /// Returns `ChannelError::Config` if the file cannot be read or is invalid.
    pub fn load(path: &Path) -> Result<Self, ChannelError> {
        ClientSection::load(path).map(Self::new)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    pub fn endpoints(&self) -> impl Iterator<Item = &EndpointConfig> {
        self.endpoints.iter()
    }

    /// Resolve the endpoint named `name` for `contract`.
    ///
    /// `"*"` picks the first endpoint declared for the contract. An endpoint
    /// without a binding configuration gets [`Binding::default`].
    ///
    /// # Errors
    /// - `EndpointNotConfigured` when no endpoint matches name and contract
    /// - `BindingNotConfigured` when the endpoint references an unknown binding configuration
    /// - `InvalidAddress` when the configured address does not parse
    pub fn resolve(
        &self,
        name: &str,
        contract: &'static str,
    ) -> Result<ServiceEndpoint, ChannelError> {
        let config = self
            .endpoints
            .iter()
            .find(|e| e.contract == contract && (name == ANY_ENDPOINT || e.name == name))
            .ok_or_else(|| ChannelError::EndpointNotConfigured {
                name: name.to_owned(),
                contract,
            })?;

        let binding = match config.binding_configuration.as_deref() {
            Some(binding_name) => self
                .bindings
                .get(binding_name)
                .ok_or_else(|| ChannelError::BindingNotConfigured {
                    binding: binding_name.to_owned(),
                    endpoint: config.name.clone(),
                })?
                .to_binding(binding_name),
            None => Binding::default(),
        };

        let address = EndpointAddress::parse(&config.address)?;
        Ok(ServiceEndpoint::new(contract, address, binding).with_name(config.name.clone()))
    }
}
