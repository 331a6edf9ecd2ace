//! Closed enumerations for constrained wire values.

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::debug;

/// Raised when a string does not name a known variant.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("unknown {kind} '{value}' (expected one of: {expected})")]
pub struct UnknownVariant {
    /// Human readable name of the enumeration.
    pub kind: &'static str,
    /// Rejected input.
    pub value: String,
    /// Comma separated list of accepted values.
    pub expected: String,
}

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Wire representation of the variant.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|candidate| candidate.as_str().eq_ignore_ascii_case(value.trim()))
                    .ok_or_else(|| UnknownVariant {
                        kind: $kind,
                        value: value.to_owned(),
                        expected: Self::ALL
                            .iter()
                            .map(|candidate| candidate.as_str())
                            .collect::<Vec<_>>()
                            .join(", "),
                    })
            }
        }
    };
}

wire_enum! {
    /// Virtual hardware profile of a server.
    HardwareProfile, "hardware profile" {
        /// Standard profile.
        Default => "default",
        /// Nested virtualisation.
        Nested => "nested",
        /// Legacy hardware.
        Legacy => "legacy",
        /// Cisco CSR appliance.
        CiscoCsr => "cisco_csr",
        /// Sophos UTM appliance.
        SophosUtm => "sophos_utm",
        /// F5 BIG-IP appliance.
        F5Bigip => "f5_bigip",
        /// Q35 chipset.
        Q35 => "q35",
        /// Q35 chipset with nested virtualisation.
        Q35Nested => "q35_nested",
    }
}

wire_enum! {
    /// Performance class of a storage.
    StorageType, "storage type" {
        /// Standard storage.
        Storage => "storage",
        /// High performance storage.
        StorageHigh => "storage_high",
        /// Highest performance storage.
        StorageInsane => "storage_insane",
    }
}

wire_enum! {
    /// Balancing algorithm of a load balancer.
    LoadBalancerAlgorithm, "load balancer algorithm" {
        /// Round robin.
        RoundRobin => "roundrobin",
        /// Least connections.
        LeastConn => "leastconn",
    }
}

wire_enum! {
    /// Encoding of a password passed to template based storage creation.
    PasswordType, "password type" {
        /// Clear text password.
        Plain => "plain",
        /// Pre-hashed `crypt(3)` password.
        Crypt => "crypt",
    }
}

wire_enum! {
    /// Transport protocol of a firewall rule.
    TransportProtocol, "transport protocol" {
        /// TCP.
        Tcp => "tcp",
        /// UDP.
        Udp => "udp",
        /// ICMP.
        Icmp => "icmp",
    }
}

/// IP address family, serialized as the integer `4` or `6`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum IpFamily {
    /// IPv4.
    V4,
    /// IPv6.
    V6,
}

impl From<IpFamily> for u8 {
    fn from(value: IpFamily) -> Self {
        match value {
            IpFamily::V4 => 4,
            IpFamily::V6 => 6,
        }
    }
}

impl TryFrom<u8> for IpFamily {
    type Error = UnknownVariant;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            4 => Ok(Self::V4),
            6 => Ok(Self::V6),
            other => Err(UnknownVariant {
                kind: "ip family",
                value: other.to_string(),
                expected: "4, 6".to_owned(),
            }),
        }
    }
}

impl fmt::Display for IpFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", u8::from(*self))
    }
}

impl FromStr for IpFamily {
    type Err = UnknownVariant;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "4" | "v4" | "ipv4" => Ok(Self::V4),
            "6" | "v6" | "ipv6" => Ok(Self::V6),
            _ => Err(UnknownVariant {
                kind: "ip family",
                value: value.to_owned(),
                expected: "4, 6".to_owned(),
            }),
        }
    }
}

/// Deserializes an optional enumeration from a response record. Values this
/// client does not know decode as `None` so one new server-side value cannot
/// fail a whole listing.
///
/// # Errors
///
/// Fails only when the input is not valid JSON for the surrounding format.
pub fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Some(raw) = Option::<serde_json::Value>::deserialize(deserializer)? else {
        return Ok(None);
    };
    if raw.is_null() {
        return Ok(None);
    }
    match serde_json::from_value(raw.clone()) {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            debug!(value = %raw, error = %err, "ignoring unknown enumeration value");
            Ok(None)
        }
    }
}
