//! Error taxonomy shared by registration and resolution.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::hub::{BindingId, FactoryHandle};

/// Stable key for a contract type.
///
/// Identity is the `TypeId`; the `type_name::<T>()` text is kept for messages only.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    #[inline]
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// A registration parameter was missing or not accepted by the shape.
    /// Raised before any registration state is touched.
    #[error("invalid argument '{param}': {reason}")]
    InvalidArgument {
        param: &'static str,
        reason: &'static str,
    },

    /// The endpoint configuration store has no endpoint with this name for the contract.
    #[error("no endpoint configuration named '{name}' for contract '{contract}'")]
    EndpointNotConfigured {
        name: String,
        contract: &'static str,
    },

    /// A configured endpoint references a binding configuration that does not exist.
    #[error("binding configuration '{binding}' referenced by endpoint '{endpoint}' is not configured")]
    BindingNotConfigured { binding: String, endpoint: String },

    /// A pre-built endpoint descriptor declares a different contract than the one bound.
    #[error("endpoint declares contract '{found}', expected '{expected}'")]
    ContractMismatch {
        expected: &'static str,
        found: String,
    },

    #[error("invalid remote address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("no channel bound: type={type_key}, name={}", .name.as_deref().unwrap_or("<any>"))]
    NotBound {
        type_key: TypeKey,
        name: Option<String>,
    },

    #[error("{count} channel bindings match type={type_key}; qualify the request by name or constraint")]
    AmbiguousBinding { type_key: TypeKey, count: usize },

    #[error("type mismatch in hub for type={type_key}")]
    TypeMismatch { type_key: TypeKey },

    #[error("unknown factory handle #{}", .0.index())]
    UnknownFactory(FactoryHandle),

    #[error("unknown binding #{}", .0.index())]
    UnknownBinding(BindingId),

    /// Channels spawn their connection worker on the current Tokio runtime.
    #[error("channels must be created from within a Tokio runtime")]
    NoRuntime,

    #[error("invalid endpoint configuration: {0}")]
    Config(#[source] Box<figment::Error>),
}

impl ChannelError {
    /// True when a named endpoint (or the binding configuration it references)
    /// is absent from the endpoint configuration store.
    #[must_use]
    pub fn is_configuration_not_found(&self) -> bool {
        matches!(
            self,
            Self::EndpointNotConfigured { .. } | Self::BindingNotConfigured { .. }
        )
    }

    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument { .. })
    }

    pub(crate) fn invalid_argument(param: &'static str, reason: &'static str) -> Self {
        Self::InvalidArgument { param, reason }
    }
}

impl From<figment::Error> for ChannelError {
    fn from(err: figment::Error) -> Self {
        Self::Config(Box::new(err))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    trait Api {}

    #[test]
    fn type_key_compares_by_type_id() {
        assert_eq!(TypeKey::of::<String>(), TypeKey::of::<String>());
        assert_ne!(TypeKey::of::<String>(), TypeKey::of::<u32>());
        assert!(format!("{}", TypeKey::of::<dyn Api>()).contains("Api"));
    }

    #[test]
    fn configuration_not_found_is_recognizable() {
        let missing = ChannelError::EndpointNotConfigured {
            name: "TestEndpoint2".to_owned(),
            contract: "IMockInterface1",
        };
        assert!(missing.is_configuration_not_found());
        assert!(!missing.is_invalid_argument());
        assert_eq!(
            missing.to_string(),
            "no endpoint configuration named 'TestEndpoint2' for contract 'IMockInterface1'"
        );

        let null_arg = ChannelError::invalid_argument("binding", "is required");
        assert!(null_arg.is_invalid_argument());
        assert!(!null_arg.is_configuration_not_found());
        assert_eq!(null_arg.to_string(), "invalid argument 'binding': is required");
    }

    #[test]
    fn not_bound_message_names_the_request() {
        let err = ChannelError::NotBound {
            type_key: TypeKey::of::<String>(),
            name: None,
        };
        assert!(err.to_string().ends_with("name=<any>"));
    }
}
