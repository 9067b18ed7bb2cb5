//! Endpoint descriptors: remote address, transport binding, and the pair of them
//! bound to a contract.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use http::Uri;
use tonic::transport::Endpoint;

use crate::error::ChannelError;

/// Absolute location of a remote service (`scheme://authority/path`).
#[derive(Clone, PartialEq, Eq)]
pub struct EndpointAddress {
    uri: Uri,
}

impl EndpointAddress {
    /// Parses an absolute address.
    ///
    /// # Errors
    /// Returns `ChannelError::InvalidAddress` if the text is not a URI or lacks
    /// a scheme or authority.
    pub fn parse(address: &str) -> Result<Self, ChannelError> {
        let uri: Uri = address
            .parse()
            .map_err(|e: http::uri::InvalidUri| ChannelError::InvalidAddress {
                address: address.to_owned(),
                reason: e.to_string(),
            })?;

        if uri.scheme().is_none() || uri.authority().is_none() {
            return Err(ChannelError::InvalidAddress {
                address: address.to_owned(),
                reason: "address must be absolute (scheme and host)".to_owned(),
            });
        }

        Ok(Self { uri })
    }

    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }
}

impl FromStr for EndpointAddress {
    type Err = ChannelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for EndpointAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.uri, f)
    }
}

impl fmt::Debug for EndpointAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EndpointAddress")
            .field(&format_args!("{}", self.uri))
            .finish()
    }
}

/// Transport settings applied to every channel a factory creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// Name of the binding configuration this was built from (`"default"` otherwise).
    pub name: String,

    /// Timeout for establishing a connection.
    pub open_timeout: Duration,

    /// Timeout for an individual call.
    pub send_timeout: Duration,

    /// TCP keepalive; `None` disables it.
    pub tcp_keepalive: Option<Duration>,

    /// HTTP/2 keepalive ping interval.
    pub keepalive_interval: Duration,

    /// How long to wait for a keepalive ping acknowledgement.
    pub keepalive_timeout: Duration,

    /// Send keepalive pings while no call is in flight.
    pub keep_alive_while_idle: bool,
}

pub const DEFAULT_BINDING_NAME: &str = "default";

impl Default for Binding {
    fn default() -> Self {
        Self {
            name: DEFAULT_BINDING_NAME.to_owned(),
            open_timeout: Duration::from_secs(10),
            send_timeout: Duration::from_secs(30),
            tcp_keepalive: Some(Duration::from_secs(30)),
            keepalive_interval: Duration::from_secs(30),
            keepalive_timeout: Duration::from_secs(10),
            keep_alive_while_idle: true,
        }
    }
}

impl Binding {
    /// Create a binding with default settings under the given name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_open_timeout(mut self, timeout: Duration) -> Self {
        self.open_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_tcp_keepalive(mut self, keepalive: Option<Duration>) -> Self {
        self.tcp_keepalive = keepalive;
        self
    }

    #[must_use]
    pub fn with_keepalive(mut self, interval: Duration, timeout: Duration) -> Self {
        self.keepalive_interval = interval;
        self.keepalive_timeout = timeout;
        self
    }

    #[must_use]
    pub fn without_idle_keepalive(mut self) -> Self {
        self.keep_alive_while_idle = false;
        self
    }
}

/// A fully specified endpoint: where to call, how, and for which contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoint {
    /// Configuration name, when the endpoint came from the configuration store.
    pub name: Option<String>,
    pub contract: String,
    pub address: EndpointAddress,
    pub binding: Binding,
}

impl ServiceEndpoint {
    #[must_use]
    pub fn new(contract: impl Into<String>, address: EndpointAddress, binding: Binding) -> Self {
        Self {
            name: None,
            contract: contract.into(),
            address,
            binding,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Same endpoint, different address.
    #[must_use]
    pub fn with_address(mut self, address: EndpointAddress) -> Self {
        self.address = address;
        self
    }

    /// Build the tonic endpoint with this binding's timeouts and keepalive settings.
    pub(crate) fn to_transport(&self) -> Endpoint {
        let b = &self.binding;
        Endpoint::from(self.address.uri().clone())
            .connect_timeout(b.open_timeout)
            .timeout(b.send_timeout)
            .tcp_keepalive(b.tcp_keepalive)
            .http2_keep_alive_interval(b.keepalive_interval)
            .keep_alive_timeout(b.keepalive_timeout)
            .keep_alive_while_idle(b.keep_alive_while_idle)
    }
}
