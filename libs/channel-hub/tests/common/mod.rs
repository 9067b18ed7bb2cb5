#![allow(dead_code)]

//! Shared contracts and configuration for integration tests.

use channel_hub::{ChannelHub, EndpointCatalog, ServiceContract};
use figment::Figment;
use figment::providers::{Format, Yaml};
use tonic::transport::Channel;

pub const CLIENT_YAML: &str = r"
client:
  bindings:
    short-open:
      open_timeout: 42s
    slow-send:
      send_timeout: 2m
  endpoints:
    - name: TestEndpoint1
      address: http://localhost/TestService1.svc
      contract: IMockInterface1
      binding_configuration: short-open
    - name: TestEndpoint3
      address: http://localhost/TestService3.svc
      contract: IMockInterface1
      binding_configuration: slow-send
    - name: Mock2Endpoint
      address: http://localhost:50051
      contract: IMockInterface2
";

pub struct MockInterface1 {
    pub channel: Channel,
}

impl ServiceContract for MockInterface1 {
    const NAME: &'static str = "IMockInterface1";

    fn from_channel(channel: Channel) -> Self {
        Self { channel }
    }
}

pub struct MockInterface2 {
    pub channel: Channel,
}

impl ServiceContract for MockInterface2 {
    const NAME: &'static str = "IMockInterface2";

    fn from_channel(channel: Channel) -> Self {
        Self { channel }
    }
}

/// Contract with no endpoint in the catalog.
pub struct Unconfigured {
    pub channel: Channel,
}

impl ServiceContract for Unconfigured {
    const NAME: &'static str = "IUnconfigured";

    fn from_channel(channel: Channel) -> Self {
        Self { channel }
    }
}

pub fn catalog() -> EndpointCatalog {
    EndpointCatalog::from_figment(&Figment::new().merge(Yaml::string(CLIENT_YAML)))
        .expect("test catalog parses")
}

pub fn hub() -> ChannelHub {
    ChannelHub::new(catalog())
}
