//! Serde model of the `client` configuration section.
//!
//! ```yaml
//! client:
//!   bindings:
//!     short-open:
//!       open_timeout: 42s
//!   endpoints:
//!     - name: TestEndpoint1
//!       address: http://localhost/TestService1.svc
//!       contract: IMockInterface1
//!       binding_configuration: short-open
//! ```
//!
//! Sources are layered with figment: YAML file first, then environment variables
//! prefixed with [`ENV_PREFIX`] (`CHANNEL_HUB__CLIENT__BINDINGS__FAST__OPEN_TIMEOUT=43s`).

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use serde::{Deserialize, Serialize};

use crate::endpoint::Binding;
use crate::error::ChannelError;

/// Environment variable prefix for configuration overrides; `__` separates nesting levels.
pub const ENV_PREFIX: &str = "CHANNEL_HUB__";

/// Configuration document; only the `client` section is read, other keys are ignored.
#[derive(Deserialize)]
struct ClientDocument {
    #[serde(default)]
    client: ClientSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientSection {
    /// Named binding configurations, referenced by endpoints.
    #[serde(default)]
    pub bindings: BTreeMap<String, BindingConfig>,

    /// Named endpoints, in declaration order.
    #[serde(default)]
    pub endpoints: Vec<EndpointConfig>,
}

/// Overrides on top of [`Binding::default`]; absent fields keep the default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BindingConfig {
    #[serde(default, with = "crate::serde_duration::option")]
    pub open_timeout: Option<Duration>,

    #[serde(default, with = "crate::serde_duration::option")]
    pub send_timeout: Option<Duration>,

    #[serde(default, with = "crate::serde_duration::option")]
    pub tcp_keepalive: Option<Duration>,

    #[serde(default, with = "crate::serde_duration::option")]
    pub keepalive_interval: Option<Duration>,

    #[serde(default, with = "crate::serde_duration::option")]
    pub keepalive_timeout: Option<Duration>,

    #[serde(default)]
    pub keep_alive_while_idle: Option<bool>,
}

impl BindingConfig {
    /// Materialize the binding this configuration describes.
    #[must_use]
    pub fn to_binding(&self, name: &str) -> Binding {
        let defaults = Binding::new(name);
        Binding {
            open_timeout: self.open_timeout.unwrap_or(defaults.open_timeout),
            send_timeout: self.send_timeout.unwrap_or(defaults.send_timeout),
            tcp_keepalive: self.tcp_keepalive.or(defaults.tcp_keepalive),
            keepalive_interval: self.keepalive_interval.unwrap_or(defaults.keepalive_interval),
            keepalive_timeout: self.keepalive_timeout.unwrap_or(defaults.keepalive_timeout),
            keep_alive_while_idle: self
                .keep_alive_while_idle
                .unwrap_or(defaults.keep_alive_while_idle),
            ..defaults
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointConfig {
    pub name: String,
    pub address: String,
    pub contract: String,

    /// Name of an entry in `bindings`; the default binding is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding_configuration: Option<String>,
}

impl ClientSection {
    /// Extract the `client` section; a document without one yields an empty section.
    ///
    /// # Errors
    /// Returns `ChannelError::Config` if the section exists but does not deserialize.
    pub fn from_figment(figment: &Figment) -> Result<Self, ChannelError> {
        let document: ClientDocument = figment.extract()?;
        Ok(document.client)
    }

    /// Layered load: YAML file, then `CHANNEL_HUB__*` environment overrides.
    ///
    /// # Errors
    /// Returns `ChannelError::Config` if the file cannot be read or the section is invalid.
    pub fn load(path: &Path) -> Result<Self, ChannelError> {
        Self::from_figment(&layered_figment(path))
    }
}

/// Figment with the YAML file merged first and environment overrides on top.
#[must_use]
pub fn layered_figment(path: &Path) -> Figment {
    Figment::new()
        .merge(Yaml::file_exact(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use figment::providers::Serialized;

    const YAML: &str = r"
client:
  bindings:
    short-open:
      open_timeout: 42s
      send_timeout: 1m
  endpoints:
    - name: TestEndpoint1
      address: http://localhost/TestService1.svc
      contract: IMockInterface1
      binding_configuration: short-open
    - name: Plain
      address: http://localhost:50051
      contract: IMockInterface2
";

    #[test]
    fn loads_client_section_from_yaml() {
        let figment = Figment::new().merge(Yaml::string(YAML));
        let section = ClientSection::from_figment(&figment).unwrap();

        assert_eq!(section.endpoints.len(), 2);
        assert_eq!(section.endpoints[0].name, "TestEndpoint1");
        assert_eq!(
            section.endpoints[0].binding_configuration.as_deref(),
            Some("short-open")
        );
        assert_eq!(section.endpoints[1].binding_configuration, None);

        let binding = section.bindings["short-open"].to_binding("short-open");
        assert_eq!(binding.name, "short-open");
        assert_eq!(binding.open_timeout, Duration::from_secs(42));
        assert_eq!(binding.send_timeout, Duration::from_secs(60));
        assert_eq!(binding.keepalive_interval, Binding::default().keepalive_interval);
    }

    #[test]
    fn missing_section_is_empty() {
        let figment = Figment::new().merge(Serialized::defaults(serde_json::json!({
            "server": { "port": 8080 }
        })));
        let section = ClientSection::from_figment(&figment).unwrap();
        assert_eq!(section, ClientSection::default());
    }

    #[test]
    fn invalid_duration_is_a_config_error() {
        let figment = Figment::new().merge(Yaml::string(
            "client:\n  bindings:\n    bad:\n      open_timeout: whenever\n",
        ));
        let err = ClientSection::from_figment(&figment).unwrap_err();
        assert!(matches!(err, ChannelError::Config(_)), "got {err}");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let figment = Figment::new().merge(Yaml::string(
            "client:\n  endpoints:\n    - name: a\n      address: http://a\n      contract: c\n      bindingConfiguration: x\n",
        ));
        assert!(ClientSection::from_figment(&figment).is_err());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("channels.yaml");
        std::fs::write(&path, YAML).unwrap();

        let section = ClientSection::load(&path).unwrap();
        assert_eq!(section.endpoints.len(), 2);
        assert_eq!(section.bindings.len(), 1);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ClientSection::load(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, ChannelError::Config(_)));
    }
}
