//! Configuration identity: the matcher value that decides factory reuse.
//!
//! Two identities are equivalent iff they populate the same attributes with
//! equal values. Object-valued attributes (binding, endpoint descriptor, address
//! object) compare by reference, so two distinct `EndpointAddress` objects with
//! the same text are two identities. Strings compare by value.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::endpoint::{Binding, EndpointAddress, ServiceEndpoint};

/// `Arc` that compares and hashes by pointer.
///
/// The key holds a strong reference, so the address cannot be reused by another
/// allocation while the key is alive.
pub struct ArcKey<T>(Arc<T>);

impl<T> ArcKey<T> {
    #[must_use]
    pub fn new(value: Arc<T>) -> Self {
        Self(value)
    }

    #[must_use]
    pub fn get(&self) -> &Arc<T> {
        &self.0
    }
}

impl<T> Clone for ArcKey<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> PartialEq for ArcKey<T> {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl<T> Eq for ArcKey<T> {}

impl<T> Hash for ArcKey<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::ptr::hash(Arc::as_ptr(&self.0), state);
    }
}

impl<T> fmt::Pointer for ArcKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(&Arc::as_ptr(&self.0), f)
    }
}

impl<T> fmt::Debug for ArcKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(self, f)
    }
}

/// Remote address as supplied at registration: text, or a shared address object.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum RemoteAddressKey {
    Uri(Arc<str>),
    Object(ArcKey<EndpointAddress>),
}

impl fmt::Display for RemoteAddressKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uri(uri) => f.write_str(uri),
            Self::Object(addr) => write!(f, "{}@{addr:p}", addr.get()),
        }
    }
}

/// Canonical set of populated configuration attributes for one registration.
#[derive(Clone, Default, PartialEq, Eq, Hash, Debug)]
pub struct ConfigurationIdentity {
    binding: Option<ArcKey<Binding>>,
    endpoint: Option<ArcKey<ServiceEndpoint>>,
    endpoint_configuration_name: Option<Arc<str>>,
    remote_address: Option<RemoteAddressKey>,
}

impl ConfigurationIdentity {
    #[must_use]
    pub fn builder() -> IdentityBuilder {
        IdentityBuilder::default()
    }

    /// Equivalence predicate used to find a previously registered factory.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        self == other
    }

    #[must_use]
    pub fn binding(&self) -> Option<&Arc<Binding>> {
        self.binding.as_ref().map(ArcKey::get)
    }

    #[must_use]
    pub fn endpoint(&self) -> Option<&Arc<ServiceEndpoint>> {
        self.endpoint.as_ref().map(ArcKey::get)
    }

    #[must_use]
    pub fn endpoint_configuration_name(&self) -> Option<&str> {
        self.endpoint_configuration_name.as_deref()
    }

    #[must_use]
    pub fn remote_address(&self) -> Option<&RemoteAddressKey> {
        self.remote_address.as_ref()
    }
}

impl fmt::Display for ConfigurationIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = "";
        if let Some(b) = &self.binding {
            write!(f, "binding={}@{b:p}", b.get().name)?;
            sep = " ";
        }
        if let Some(e) = &self.endpoint {
            write!(f, "{sep}endpoint={}@{e:p}", e.get().address)?;
            sep = " ";
        }
        if let Some(name) = &self.endpoint_configuration_name {
            write!(f, "{sep}endpoint_configuration_name={name}")?;
            sep = " ";
        }
        if let Some(addr) = &self.remote_address {
            write!(f, "{sep}remote_address={addr}")?;
        }
        Ok(())
    }
}

/// Builds an identity attribute by attribute.
#[derive(Default)]
pub struct IdentityBuilder {
    inner: ConfigurationIdentity,
}

impl IdentityBuilder {
    #[must_use]
    pub fn binding(mut self, binding: &Arc<Binding>) -> Self {
        self.inner.binding = Some(ArcKey::new(Arc::clone(binding)));
        self
    }

    #[must_use]
    pub fn endpoint(mut self, endpoint: &Arc<ServiceEndpoint>) -> Self {
        self.inner.endpoint = Some(ArcKey::new(Arc::clone(endpoint)));
        self
    }

    #[must_use]
    pub fn endpoint_configuration_name(mut self, name: &str) -> Self {
        self.inner.endpoint_configuration_name = Some(Arc::from(name));
        self
    }

    #[must_use]
    pub fn remote_uri(mut self, uri: &str) -> Self {
        self.inner.remote_address = Some(RemoteAddressKey::Uri(Arc::from(uri)));
        self
    }

    #[must_use]
    pub fn remote_address(mut self, address: &Arc<EndpointAddress>) -> Self {
        self.inner.remote_address = Some(RemoteAddressKey::Object(ArcKey::new(Arc::clone(
            address,
        ))));
        self
    }

    #[must_use]
    pub fn build(self) -> ConfigurationIdentity {
        self.inner
    }
}
