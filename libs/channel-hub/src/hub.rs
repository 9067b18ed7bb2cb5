//! The channel hub: factory cache, contract bindings and resolution.
//!
//! Implementation details:
//! - Factory key = (contract `TypeKey`, `ConfigurationIdentity`). At most one
//!   entry exists per key; later registrations with an equivalent identity
//!   reuse it and their recipe is discarded.
//! - Factory value = `Arc<FactoryCell<ChannelFactory<C>>>` stored as
//!   `Arc<dyn Any + Send + Sync>` (downcast on read).
//! - Contract bindings are kept in registration order and point at a factory
//!   entry. Their producer captures the cell, so resolving never touches the
//!   factory store once the binding is found.
//!
//! Entries live as long as the hub; there is no removal.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use figment::Figment;
use parking_lot::RwLock;

use crate::binding::{BindingBuilder, BindingSyntax};
use crate::catalog::EndpointCatalog;
use crate::cell::{CellState, FactoryCell};
use crate::error::{ChannelError, TypeKey};
use crate::factory::{ChannelFactory, ServiceContract};
use crate::identity::ConfigurationIdentity;
use crate::module::ChannelModule;
use crate::spec::{ChannelShape, ChannelSpec};

/// Index of a cached factory entry.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct FactoryHandle(usize);

impl FactoryHandle {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Index of a contract binding entry.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct BindingId(usize);

impl BindingId {
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// What a contract binding was registered with; constraints in
/// [`ChannelHub::resolve_where`] are evaluated against it.
#[derive(Clone, Debug)]
pub struct BindingMetadata {
    pub contract: TypeKey,
    pub name: Option<String>,
    pub shape: ChannelShape,
    pub identity: ConfigurationIdentity,
    pub attributes: BTreeMap<String, String>,
}

impl BindingMetadata {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn has(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }
}

type Producer<C> = Arc<dyn Fn() -> Result<C, ChannelError> + Send + Sync>;
type Shared = Arc<dyn Any + Send + Sync>;

struct FactoryEntry {
    contract: TypeKey,
    identity: ConfigurationIdentity,
    cell: Shared,
    state: Arc<dyn CellState>,
}

#[derive(Default)]
struct FactoryStore {
    entries: Vec<FactoryEntry>,
    index: HashMap<(TypeKey, ConfigurationIdentity), FactoryHandle>,
}

struct BindingEntry {
    meta: BindingMetadata,
    factory: FactoryHandle,
    producer: Shared,
}

/// Registry of contract bindings and the client factories behind them.
pub struct ChannelHub {
    catalog: Arc<EndpointCatalog>,
    factories: RwLock<FactoryStore>,
    bindings: RwLock<Vec<BindingEntry>>,
}

impl ChannelHub {
    #[must_use]
    pub fn new(catalog: EndpointCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
            factories: RwLock::new(FactoryStore::default()),
            bindings: RwLock::new(Vec::new()),
        }
    }

    /// Hub whose catalog is read from the `client` section of `figment`.
    ///
    /// # Errors
    /// Returns `ChannelError::Config` if the section is invalid.
    pub fn from_figment(figment: &Figment) -> Result<Self, ChannelError> {
        EndpointCatalog::from_figment(figment).map(Self::new)
    }

    #[must_use]
    pub fn catalog(&self) -> &EndpointCatalog {
        &self.catalog
    }

    /// Start a binding for contract `C`.
    #[must_use]
    pub fn bind<C: ServiceContract>(&self) -> BindingSyntax<'_, C> {
        BindingSyntax::new(self)
    }

    /// Run a module's wiring against this hub.
    ///
    /// # Errors
    /// Propagates the first error the module returns.
    pub fn load(&self, module: &dyn ChannelModule) -> Result<(), ChannelError> {
        tracing::debug!(module = module.name(), "loading channel module");
        module.load(self)
    }

    /// Find the factory entry for `(C, identity)` or install one with `recipe`.
    ///
    /// The recipe is not run here. If an equivalent entry already exists its
    /// recipe stays in charge and `recipe` is dropped.
    #[must_use]
    pub fn register_or_reuse<C, R>(
        &self,
        identity: ConfigurationIdentity,
        recipe: R,
    ) -> FactoryHandle
    where
        C: ServiceContract,
        R: Fn() -> Result<ChannelFactory<C>, ChannelError> + Send + Sync + 'static,
    {
        let contract = TypeKey::of::<C>();
        let key = (contract, identity);

        if let Some(handle) = self.factories.read().index.get(&key) {
            tracing::debug!(
                contract = C::NAME,
                identity = %key.1,
                handle = handle.0,
                "reusing channel factory"
            );
            return *handle;
        }

        let mut store = self.factories.write();
        if let Some(handle) = store.index.get(&key) {
            tracing::debug!(
                contract = C::NAME,
                identity = %key.1,
                handle = handle.0,
                "reusing channel factory"
            );
            return *handle;
        }

        let handle = FactoryHandle(store.entries.len());
        let span_identity = key.1.to_string();
        let cell = Arc::new(FactoryCell::new(move || {
            let span = tracing::debug_span!(
                "channel_factory_construct",
                contract = C::NAME,
                identity = %span_identity
            );
            let _entered = span.enter();
            match recipe() {
                Ok(factory) => {
                    factory.log_constructed();
                    Ok(factory)
                }
                Err(err) => {
                    tracing::warn!(
                        contract = C::NAME,
                        error = %err,
                        "channel factory construction failed"
                    );
                    Err(err)
                }
            }
        }));

        tracing::debug!(
            contract = C::NAME,
            identity = %key.1,
            handle = handle.0,
            "registered channel factory"
        );
        store.entries.push(FactoryEntry {
            contract,
            identity: key.1.clone(),
            cell: Arc::clone(&cell) as Shared,
            state: cell,
        });
        store.index.insert(key, handle);
        handle
    }

    /// Register a validated spec for `C`: factory entry (shared) plus a new
    /// contract binding pointing at it.
    pub(crate) fn install<C: ServiceContract>(
        &self,
        spec: ChannelSpec,
    ) -> Result<BindingBuilder<'_, C>, ChannelError> {
        let identity = spec.identity();
        let shape = spec.shape();
        let catalog = Arc::clone(&self.catalog);
        let handle = self.register_or_reuse::<C, _>(identity.clone(), move || {
            ChannelFactory::<C>::from_spec(&spec, &catalog)
        });

        let cell = self.cell::<C>(handle)?;
        let producer: Producer<C> = Arc::new(move || cell.get_or_construct()?.create_channel());

        let mut bindings = self.bindings.write();
        let id = BindingId(bindings.len());
        bindings.push(BindingEntry {
            meta: BindingMetadata {
                contract: TypeKey::of::<C>(),
                name: None,
                shape,
                identity,
                attributes: BTreeMap::new(),
            },
            factory: handle,
            producer: Arc::new(producer),
        });
        tracing::debug!(
            contract = C::NAME,
            shape = shape.as_str(),
            binding = id.0,
            factory = handle.0,
            "bound contract"
        );
        Ok(BindingBuilder::new(self, id, handle))
    }

    pub(crate) fn set_binding_name(&self, id: BindingId, name: String) {
        if let Some(entry) = self.bindings.write().get_mut(id.0) {
            entry.meta.name = Some(name);
        }
    }

    pub(crate) fn set_binding_attribute(&self, id: BindingId, key: String, value: String) {
        if let Some(entry) = self.bindings.write().get_mut(id.0) {
            entry.meta.attributes.insert(key, value);
        }
    }

    /// Resolve the single binding for `C` and return a new channel.
    ///
    /// # Errors
    /// `NotBound` / `AmbiguousBinding` when not exactly one binding exists;
    /// otherwise any error from factory construction or channel creation.
    pub fn resolve<C: ServiceContract>(&self) -> Result<C, ChannelError> {
        self.resolve_matching::<C, _>(None, |_| true)
    }

    /// Resolve the binding for `C` registered under `name`.
    ///
    /// # Errors
    /// As [`resolve`](Self::resolve).
    pub fn resolve_named<C: ServiceContract>(&self, name: &str) -> Result<C, ChannelError> {
        self.resolve_matching::<C, _>(Some(name), |meta| meta.name.as_deref() == Some(name))
    }

    /// Resolve the binding for `C` whose metadata satisfies `constraint`.
    ///
    /// # Errors
    /// As [`resolve`](Self::resolve).
    pub fn resolve_where<C, F>(&self, constraint: F) -> Result<C, ChannelError>
    where
        C: ServiceContract,
        F: Fn(&BindingMetadata) -> bool,
    {
        self.resolve_matching::<C, _>(None, constraint)
    }

    fn resolve_matching<C, F>(&self, name: Option<&str>, constraint: F) -> Result<C, ChannelError>
    where
        C: ServiceContract,
        F: Fn(&BindingMetadata) -> bool,
    {
        let type_key = TypeKey::of::<C>();
        let producer = {
            let bindings = self.bindings.read();
            let mut matching = bindings
                .iter()
                .filter(|b| b.meta.contract == type_key && constraint(&b.meta));
            let Some(first) = matching.next() else {
                return Err(ChannelError::NotBound {
                    type_key,
                    name: name.map(str::to_owned),
                });
            };
            let extra = matching.count();
            if extra > 0 {
                return Err(ChannelError::AmbiguousBinding {
                    type_key,
                    count: extra + 1,
                });
            }
            first
                .producer
                .downcast_ref::<Producer<C>>()
                .cloned()
                .ok_or(ChannelError::TypeMismatch { type_key })?
        };
        producer()
    }

    /// New channel from the factory registered for `(C, identity)`, bound or not.
    ///
    /// # Errors
    /// `NotBound` if no such factory exists; otherwise construction errors.
    pub fn resolve_channel<C: ServiceContract>(
        &self,
        identity: &ConfigurationIdentity,
    ) -> Result<C, ChannelError> {
        self.factory_for::<C>(identity)?.create_channel()
    }

    /// Shared factory behind `handle`, constructing it if needed.
    ///
    /// # Errors
    /// `UnknownFactory`, `TypeMismatch`, or construction errors.
    pub fn factory<C: ServiceContract>(
        &self,
        handle: FactoryHandle,
    ) -> Result<Arc<ChannelFactory<C>>, ChannelError> {
        self.cell::<C>(handle)?.get_or_construct()
    }

    /// Shared factory registered for `(C, identity)`, constructing it if needed.
    ///
    /// # Errors
    /// `NotBound` if no such factory exists; otherwise construction errors.
    pub fn factory_for<C: ServiceContract>(
        &self,
        identity: &ConfigurationIdentity,
    ) -> Result<Arc<ChannelFactory<C>>, ChannelError> {
        let handle = self
            .factory_handle::<C>(identity)
            .ok_or_else(|| ChannelError::NotBound {
                type_key: TypeKey::of::<C>(),
                name: identity.endpoint_configuration_name().map(str::to_owned),
            })?;
        self.factory::<C>(handle)
    }

    #[must_use]
    pub fn factory_handle<C: ServiceContract>(
        &self,
        identity: &ConfigurationIdentity,
    ) -> Option<FactoryHandle> {
        self.factories
            .read()
            .index
            .get(&(TypeKey::of::<C>(), identity.clone()))
            .copied()
    }

    fn cell<C: ServiceContract>(
        &self,
        handle: FactoryHandle,
    ) -> Result<Arc<FactoryCell<ChannelFactory<C>>>, ChannelError> {
        let type_key = TypeKey::of::<C>();
        let shared = {
            let store = self.factories.read();
            let entry = store
                .entries
                .get(handle.0)
                .ok_or(ChannelError::UnknownFactory(handle))?;
            if entry.contract != type_key {
                return Err(ChannelError::TypeMismatch { type_key });
            }
            Arc::clone(&entry.cell)
        };
        shared
            .downcast::<FactoryCell<ChannelFactory<C>>>()
            .map_err(|_| ChannelError::TypeMismatch { type_key })
    }

    #[must_use]
    pub fn factory_count(&self) -> usize {
        self.factories.read().entries.len()
    }

    #[must_use]
    pub fn binding_count(&self) -> usize {
        self.bindings.read().len()
    }

    /// Metadata of a binding.
    ///
    /// # Errors
    /// Returns `UnknownBinding` for an id this hub did not issue.
    pub fn metadata(&self, id: BindingId) -> Result<BindingMetadata, ChannelError> {
        self.bindings
            .read()
            .get(id.0)
            .map(|b| b.meta.clone())
            .ok_or(ChannelError::UnknownBinding(id))
    }

    /// Factory a binding points at.
    ///
    /// # Errors
    /// Returns `UnknownBinding` for an id this hub did not issue.
    pub fn binding_factory(&self, id: BindingId) -> Result<FactoryHandle, ChannelError> {
        self.bindings
            .read()
            .get(id.0)
            .map(|b| b.factory)
            .ok_or(ChannelError::UnknownBinding(id))
    }

    /// Identity the factory entry was registered with.
    ///
    /// # Errors
    /// Returns `UnknownFactory` for a handle this hub did not issue.
    pub fn factory_identity(
        &self,
        handle: FactoryHandle,
    ) -> Result<ConfigurationIdentity, ChannelError> {
        self.factories
            .read()
            .entries
            .get(handle.0)
            .map(|e| e.identity.clone())
            .ok_or(ChannelError::UnknownFactory(handle))
    }

    /// Whether the factory behind `handle` has been constructed.
    ///
    /// # Errors
    /// Returns `UnknownFactory` for a handle this hub did not issue.
    pub fn is_constructed(&self, handle: FactoryHandle) -> Result<bool, ChannelError> {
        Ok(self.state(handle)?.is_constructed())
    }

    /// How many times construction has been attempted for `handle`.
    ///
    /// # Errors
    /// Returns `UnknownFactory` for a handle this hub did not issue.
    pub fn construction_attempts(&self, handle: FactoryHandle) -> Result<usize, ChannelError> {
        Ok(self.state(handle)?.attempts())
    }

    fn state(&self, handle: FactoryHandle) -> Result<Arc<dyn CellState>, ChannelError> {
        self.factories
            .read()
            .entries
            .get(handle.0)
            .map(|e| Arc::clone(&e.state))
            .ok_or(ChannelError::UnknownFactory(handle))
    }
}

impl Default for ChannelHub {
    fn default() -> Self {
        Self::new(EndpointCatalog::default())
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::endpoint::Binding;
    use tonic::transport::Channel;
    use tracing_test::traced_test;

    struct Probe;

    impl ServiceContract for Probe {
        const NAME: &'static str = "IProbe";

        fn from_channel(_channel: Channel) -> Self {
            Self
        }
    }

    fn explicit() -> ChannelSpec {
        ChannelSpec::binding_with_uri(Arc::new(Binding::default()), "http://localhost:50051")
    }

    #[test]
    fn registration_is_deferred() {
        let hub = ChannelHub::default();
        let builder = hub.install::<Probe>(explicit()).unwrap();
        assert_eq!(hub.factory_count(), 1);
        assert_eq!(hub.binding_count(), 1);
        assert!(!hub.is_constructed(builder.factory_handle()).unwrap());
        assert_eq!(hub.construction_attempts(builder.factory_handle()).unwrap(), 0);
    }

    #[test]
    fn foreign_handles_are_rejected() {
        let hub = ChannelHub::default();
        let other = ChannelHub::default();
        let handle = other.install::<Probe>(explicit()).unwrap().factory_handle();

        assert!(matches!(
            hub.factory::<Probe>(handle),
            Err(ChannelError::UnknownFactory(h)) if h == handle
        ));
        assert!(matches!(
            hub.metadata(BindingId(3)),
            Err(ChannelError::UnknownBinding(_))
        ));
    }

    #[test]
    fn explicit_spec_never_reads_the_catalog() {
        let hub = ChannelHub::default();
        let handle = hub.install::<Probe>(explicit()).unwrap().factory_handle();
        let factory = hub.factory::<Probe>(handle).unwrap();
        assert_eq!(factory.endpoint().contract, "IProbe");
    }

    #[traced_test]
    #[tokio::test]
    async fn construction_is_logged_once() {
        let hub = ChannelHub::default();
        hub.install::<Probe>(explicit()).unwrap();

        hub.resolve::<Probe>().unwrap();
        hub.resolve::<Probe>().unwrap();

        assert!(logs_contain("registered channel factory"));
        assert!(logs_contain("channel factory constructed"));
        assert!(logs_contain("open_timeout_ms=10000"));
        logs_assert(|lines: &[&str]| {
            let n = lines
                .iter()
                .filter(|l| l.contains("channel factory constructed"))
                .count();
            if n == 1 {
                Ok(())
            } else {
                Err(format!("expected one construction, saw {n}"))
            }
        });
    }

    #[traced_test]
    #[test]
    fn failed_construction_is_logged() {
        let hub = ChannelHub::default();
        hub.install::<Probe>(ChannelSpec::Default).unwrap();

        let err = hub.resolve::<Probe>().err().unwrap();
        assert!(err.is_configuration_not_found());
        assert!(logs_contain("channel factory construction failed"));
    }
}
