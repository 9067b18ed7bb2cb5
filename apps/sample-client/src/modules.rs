use channel_hub::{ChannelError, ChannelHub, ChannelModule};

use crate::contracts::Service1Client;

/// Declares the sample's service bindings.
pub struct ServiceModule;

impl ChannelModule for ServiceModule {
    fn name(&self) -> &str {
        "sample-services"
    }

    fn load(&self, hub: &ChannelHub) -> Result<(), ChannelError> {
        hub.bind::<Service1Client>().to_service_channel()?;
        Ok(())
    }
}
