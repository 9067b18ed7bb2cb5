//! Channel configuration shapes and their validation.
//!
//! Every registration goes through [`ChannelSpec::from_params`], so a missing
//! required parameter is rejected the same way for all seven shapes, and before
//! anything is registered. Values are not interpreted here: a blank name or a
//! malformed address surfaces when the factory is constructed.

use std::sync::Arc;

use crate::catalog::ANY_ENDPOINT;
use crate::endpoint::{Binding, EndpointAddress, ServiceEndpoint};
use crate::error::ChannelError;
use crate::identity::ConfigurationIdentity;

pub const BINDING: &str = "binding";
pub const ENDPOINT: &str = "endpoint";
pub const ENDPOINT_CONFIGURATION_NAME: &str = "endpoint_configuration_name";
pub const REMOTE_ADDRESS: &str = "remote_address";

const REQUIRED: &str = "is required";
const NOT_ACCEPTED: &str = "is not accepted by this channel shape";

/// Which combination of parameters a registration uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelShape {
    /// First configured endpoint for the contract (`"*"`).
    Default,
    /// Configured endpoint by name.
    Named,
    /// Configured endpoint by name, address overridden by text.
    NamedWithUri,
    /// Configured endpoint by name, address overridden by an address object.
    NamedWithAddress,
    /// Explicit binding and address text.
    BindingWithUri,
    /// Explicit binding and address object.
    BindingWithAddress,
    /// Pre-built endpoint descriptor.
    Endpoint,
}

/// Raw, nullable registration parameters.
///
/// `remote_uri` and `remote_address` are the text and object forms of the same
/// parameter and are reported as `remote_address` in errors.
#[derive(Debug, Clone, Default)]
pub struct ChannelParams {
    pub binding: Option<Arc<Binding>>,
    pub endpoint: Option<Arc<ServiceEndpoint>>,
    pub endpoint_configuration_name: Option<String>,
    pub remote_uri: Option<String>,
    pub remote_address: Option<Arc<EndpointAddress>>,
}

impl ChannelShape {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Named => "named",
            Self::NamedWithUri => "named_with_uri",
            Self::NamedWithAddress => "named_with_address",
            Self::BindingWithUri => "binding_with_uri",
            Self::BindingWithAddress => "binding_with_address",
            Self::Endpoint => "endpoint",
        }
    }
}

impl ChannelParams {
    fn ensure_consumed(&self) -> Result<(), ChannelError> {
        let leftovers = [
            (self.binding.is_some(), BINDING),
            (self.endpoint.is_some(), ENDPOINT),
            (
                self.endpoint_configuration_name.is_some(),
                ENDPOINT_CONFIGURATION_NAME,
            ),
            (
                self.remote_uri.is_some() || self.remote_address.is_some(),
                REMOTE_ADDRESS,
            ),
        ];
        match leftovers.iter().find(|(supplied, _)| *supplied) {
            Some(&(_, param)) => Err(ChannelError::invalid_argument(param, NOT_ACCEPTED)),
            None => Ok(()),
        }
    }
}

/// A validated channel configuration; each variant carries exactly its required fields.
#[derive(Debug, Clone)]
pub enum ChannelSpec {
    Default,
    Named {
        endpoint_configuration_name: String,
    },
    NamedWithUri {
        endpoint_configuration_name: String,
        remote_uri: String,
    },
    NamedWithAddress {
        endpoint_configuration_name: String,
        remote_address: Arc<EndpointAddress>,
    },
    BindingWithUri {
        binding: Arc<Binding>,
        remote_uri: String,
    },
    BindingWithAddress {
        binding: Arc<Binding>,
        remote_address: Arc<EndpointAddress>,
    },
    Endpoint {
        endpoint: Arc<ServiceEndpoint>,
    },
}

fn required<T>(value: Option<T>, param: &'static str) -> Result<T, ChannelError> {
    value.ok_or_else(|| ChannelError::invalid_argument(param, REQUIRED))
}

impl ChannelSpec {
    /// Validate `params` against `shape`.
    ///
    /// Required parameters are checked in declaration order (name or binding
    /// first, then address); parameters the shape does not use are rejected.
    ///
    /// # Errors
    /// Returns `ChannelError::InvalidArgument` naming the offending parameter.
    pub fn from_params(
        shape: ChannelShape,
        mut params: ChannelParams,
    ) -> Result<Self, ChannelError> {
        let spec = match shape {
            ChannelShape::Default => Self::Default,
            ChannelShape::Named => Self::Named {
                endpoint_configuration_name: required(
                    params.endpoint_configuration_name.take(),
                    ENDPOINT_CONFIGURATION_NAME,
                )?,
            },
            ChannelShape::NamedWithUri => Self::NamedWithUri {
                endpoint_configuration_name: required(
                    params.endpoint_configuration_name.take(),
                    ENDPOINT_CONFIGURATION_NAME,
                )?,
                remote_uri: required(params.remote_uri.take(), REMOTE_ADDRESS)?,
            },
            ChannelShape::NamedWithAddress => Self::NamedWithAddress {
                endpoint_configuration_name: required(
                    params.endpoint_configuration_name.take(),
                    ENDPOINT_CONFIGURATION_NAME,
                )?,
                remote_address: required(params.remote_address.take(), REMOTE_ADDRESS)?,
            },
            ChannelShape::BindingWithUri => Self::BindingWithUri {
                binding: required(params.binding.take(), BINDING)?,
                remote_uri: required(params.remote_uri.take(), REMOTE_ADDRESS)?,
            },
            ChannelShape::BindingWithAddress => Self::BindingWithAddress {
                binding: required(params.binding.take(), BINDING)?,
                remote_address: required(params.remote_address.take(), REMOTE_ADDRESS)?,
            },
            ChannelShape::Endpoint => Self::Endpoint {
                endpoint: required(params.endpoint.take(), ENDPOINT)?,
            },
        };
        params.ensure_consumed()?;
        Ok(spec)
    }

    #[must_use]
    pub fn named(endpoint_configuration_name: impl Into<String>) -> Self {
        Self::Named {
            endpoint_configuration_name: endpoint_configuration_name.into(),
        }
    }

    #[must_use]
    pub fn named_with_uri(
        endpoint_configuration_name: impl Into<String>,
        remote_uri: impl Into<String>,
    ) -> Self {
        Self::NamedWithUri {
            endpoint_configuration_name: endpoint_configuration_name.into(),
            remote_uri: remote_uri.into(),
        }
    }

    #[must_use]
    pub fn named_with_address(
        endpoint_configuration_name: impl Into<String>,
        remote_address: Arc<EndpointAddress>,
    ) -> Self {
        Self::NamedWithAddress {
            endpoint_configuration_name: endpoint_configuration_name.into(),
            remote_address,
        }
    }

    #[must_use]
    pub fn binding_with_uri(binding: Arc<Binding>, remote_uri: impl Into<String>) -> Self {
        Self::BindingWithUri {
            binding,
            remote_uri: remote_uri.into(),
        }
    }

    #[must_use]
    pub fn binding_with_address(
        binding: Arc<Binding>,
        remote_address: Arc<EndpointAddress>,
    ) -> Self {
        Self::BindingWithAddress {
            binding,
            remote_address,
        }
    }

    #[must_use]
    pub fn endpoint(endpoint: Arc<ServiceEndpoint>) -> Self {
        Self::Endpoint { endpoint }
    }

    #[must_use]
    pub fn shape(&self) -> ChannelShape {
        match self {
            Self::Default => ChannelShape::Default,
            Self::Named { .. } => ChannelShape::Named,
            Self::NamedWithUri { .. } => ChannelShape::NamedWithUri,
            Self::NamedWithAddress { .. } => ChannelShape::NamedWithAddress,
            Self::BindingWithUri { .. } => ChannelShape::BindingWithUri,
            Self::BindingWithAddress { .. } => ChannelShape::BindingWithAddress,
            Self::Endpoint { .. } => ChannelShape::Endpoint,
        }
    }

    /// Endpoint configuration name this spec looks up, if any; `"*"` for the default shape.
    #[must_use]
    pub fn endpoint_configuration_name(&self) -> Option<&str> {
        match self {
            Self::Default => Some(ANY_ENDPOINT),
            Self::Named {
                endpoint_configuration_name,
            }
            | Self::NamedWithUri {
                endpoint_configuration_name,
                ..
            }
            | Self::NamedWithAddress {
                endpoint_configuration_name,
                ..
            } => Some(endpoint_configuration_name),
            Self::BindingWithUri { .. }
            | Self::BindingWithAddress { .. }
            | Self::Endpoint { .. } => None,
        }
    }

    /// Identity of this configuration. The default shape and `Named("*")` coincide.
    #[must_use]
    pub fn identity(&self) -> ConfigurationIdentity {
        let id = ConfigurationIdentity::builder();
        let builder = match self {
            Self::Default => id.endpoint_configuration_name(ANY_ENDPOINT),
            Self::Named {
                endpoint_configuration_name,
            } => id.endpoint_configuration_name(endpoint_configuration_name),
            Self::NamedWithUri {
                endpoint_configuration_name,
                remote_uri,
            } => id
                .endpoint_configuration_name(endpoint_configuration_name)
                .remote_uri(remote_uri),
            Self::NamedWithAddress {
                endpoint_configuration_name,
                remote_address,
            } => id
                .endpoint_configuration_name(endpoint_configuration_name)
                .remote_address(remote_address),
            Self::BindingWithUri {
                binding,
                remote_uri,
            } => id.binding(binding).remote_uri(remote_uri),
            Self::BindingWithAddress {
                binding,
                remote_address,
            } => id.binding(binding).remote_address(remote_address),
            Self::Endpoint { endpoint } => id.endpoint(endpoint),
        };
        builder.build()
    }
}
