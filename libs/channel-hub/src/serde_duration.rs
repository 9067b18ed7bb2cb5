//! Human-readable `Duration` fields (`"42s"`, `"1m 30s"`) via the humantime crate.
//!
//! ```
//! use serde::Deserialize;
//! use std::time::Duration;
//!
//! #[derive(Deserialize)]
//! struct Timeouts {
//!     #[serde(with = "channel_hub::serde_duration")]
//!     open: Duration,
//!     #[serde(default, with = "channel_hub::serde_duration::option")]
//!     send: Option<Duration>,
//! }
//! ```

use std::fmt;
use std::time::Duration;

use serde::{Deserializer, Serializer, de};

struct DurationVisitor;

impl de::Visitor<'_> for DurationVisitor {
    type Value = Duration;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a duration such as \"42s\" or \"1m 30s\"")
    }

    fn visit_str<E>(self, v: &str) -> Result<Duration, E>
    where
        E: de::Error,
    {
        humantime::parse_duration(v).map_err(|_| E::invalid_value(de::Unexpected::Str(v), &self))
    }
}

/// Deserializes a humantime string into a `Duration`.
///
/// # Errors
/// Returns the deserializer's error when the value is not a valid duration string.
pub fn deserialize<'de, D>(d: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    d.deserialize_str(DurationVisitor)
}

/// Serializes a `Duration` as a humantime string.
///
/// # Errors
/// Propagates the serializer's error.
pub fn serialize<S>(d: &Duration, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.collect_str(&humantime::format_duration(*d))
}

pub mod option {
    //! `Option<Duration>` counterpart; pair with `#[serde(default)]`.

    use std::fmt;
    use std::time::Duration;

    use serde::{Deserializer, Serializer, de};

    struct OptionVisitor;

    impl<'de> de::Visitor<'de> for OptionVisitor {
        type Value = Option<Duration>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an optional duration")
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D>(self, d: D) -> Result<Self::Value, D::Error>
        where
            D: Deserializer<'de>,
        {
            super::deserialize(d).map(Some)
        }
    }

    /// # Errors
    /// Returns the deserializer's error when a present value is not a valid duration string.
    pub fn deserialize<'de, D>(d: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        d.deserialize_option(OptionVisitor)
    }

    /// # Errors
    /// Propagates the serializer's error.
    #[allow(clippy::ref_option)]
    pub fn serialize<S>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match d {
            Some(d) => s.collect_str(&humantime::format_duration(*d)),
            None => s.serialize_none(),
        }
    }
}
