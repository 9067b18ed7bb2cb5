//! Wiring modules: a named unit of binding declarations.

use crate::error::ChannelError;
use crate::hub::ChannelHub;

/// A group of bindings installed together with [`ChannelHub::load`].
///
/// ```rust,no_run
/// # use channel_hub::{ChannelError, ChannelHub, ChannelModule, ServiceContract};
/// # struct Service1Client;
/// # impl ServiceContract for Service1Client {
/// #     const NAME: &'static str = "sample.Service1";
/// #     fn from_channel(_: tonic::transport::Channel) -> Self { Self }
/// # }
/// struct ServiceModule;
///
/// impl ChannelModule for ServiceModule {
///     fn load(&self, hub: &ChannelHub) -> Result<(), ChannelError> {
///         hub.bind::<Service1Client>().to_service_channel()?;
///         Ok(())
///     }
/// }
/// ```
pub trait ChannelModule: Send + Sync {
    #[must_use]
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Declare this module's bindings.
    ///
    /// # Errors
    /// Returns the first registration error.
    fn load(&self, hub: &ChannelHub) -> Result<(), ChannelError>;
}
