#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Channel Hub: cached RPC client factories for service contracts.
//!
//! Wiring code binds a service contract to one of several configuration shapes
//! (endpoint declared in configuration, explicit address, explicit transport
//! binding, or a pre-built endpoint descriptor). Business code then resolves the
//! contract and gets a fresh, ready-to-use channel.
//!
//! The hub keeps exactly one client factory per distinct configuration. Factories
//! are expensive to build, so construction is deferred to the first resolution
//! and memoized; channels are cheap and are created anew on every resolution.
//!
//! # Example
//! ```rust,no_run
//! use channel_hub::{ChannelHub, EndpointCatalog, ServiceContract};
//! use tonic::transport::Channel;
//!
//! struct CalculatorClient {
//!     channel: Channel,
//! }
//!
//! impl ServiceContract for CalculatorClient {
//!     const NAME: &'static str = "calculator.v1.Calculator";
//!
//!     fn from_channel(channel: Channel) -> Self {
//!         Self { channel }
//!     }
//! }
//!
//! # async fn demo(catalog: EndpointCatalog) -> Result<(), channel_hub::ChannelError> {
//! let hub = ChannelHub::new(catalog);
//! hub.bind::<CalculatorClient>().to_service_channel()?;
//!
//! // Every call returns a new channel backed by the same cached factory.
//! let client: CalculatorClient = hub.resolve()?;
//! # let _ = client.channel;
//! # Ok(())
//! # }
//! ```

pub mod binding;
pub mod catalog;
pub mod cell;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod factory;
pub mod hub;
pub mod identity;
pub mod module;
pub mod serde_duration;
pub mod spec;

pub use binding::{BindingBuilder, BindingSyntax};
pub use catalog::{ANY_ENDPOINT, EndpointCatalog};
pub use cell::FactoryCell;
pub use config::{BindingConfig, ClientSection, ENV_PREFIX, EndpointConfig};
pub use endpoint::{Binding, EndpointAddress, ServiceEndpoint};
pub use error::{ChannelError, TypeKey};
pub use factory::{ChannelFactory, ServiceContract};
pub use hub::{BindingId, BindingMetadata, ChannelHub, FactoryHandle};
pub use identity::{ArcKey, ConfigurationIdentity, IdentityBuilder, RemoteAddressKey};
pub use module::ChannelModule;
pub use spec::{ChannelParams, ChannelShape, ChannelSpec};
