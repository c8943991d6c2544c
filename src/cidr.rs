//! Parsed `<address>/<prefix>` ranges.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::key::{ipv4_key, ipv6_key, AddressFamily, BitKey};

/// Family-tagged key and prefix length of a validated range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Network {
    V4 { key: u32, prefix_len: u8 },
    V6 { key: u128, prefix_len: u8 },
}

/// A validated CIDR range that remembers the exact text it was parsed from.
///
/// Equality and hashing compare the original text, so `"10.0.0.0/8"` and
/// `"10.1.2.3/8"` are distinct values even though they cover the same
/// addresses.
///
/// ```rust
/// use cidr_trie::{AddressFamily, Cidr};
///
/// let cidr: Cidr = "2001:db8::/32".parse().unwrap();
/// assert_eq!(cidr.family(), AddressFamily::V6);
/// assert_eq!(cidr.prefix_len(), 32);
/// assert_eq!(cidr.as_str(), "2001:db8::/32");
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Cidr {
    text: String,
    network: Network,
}

impl Cidr {
    /// Parses `<address>/<prefix>`.
    ///
    /// The family is picked by syntax (a `:` anywhere means IPv6) before the
    /// address is validated. Surrounding whitespace is not trimmed.
    pub fn parse(input: &str) -> Result<Self> {
        if input.trim().is_empty() {
            return Err(Error::InvalidArgument { what: "CIDR range" });
        }

        let (literal, prefix) = input
            .split_once('/')
            .ok_or_else(|| Error::cidr_format(input))?;
        if prefix.contains('/') {
            return Err(Error::cidr_format(input));
        }

        let family = AddressFamily::sniff(literal);
        let network = match family {
            AddressFamily::V4 => Network::V4 {
                key: ipv4_key(literal)?,
                prefix_len: parse_prefix(input, prefix, family)?,
            },
            AddressFamily::V6 => Network::V6 {
                key: ipv6_key(literal)?,
                prefix_len: parse_prefix(input, prefix, family)?,
            },
        };

        Ok(Self {
            text: input.to_owned(),
            network,
        })
    }

    /// Builds a range from an address value, rendering it canonically
    /// (`a.b.c.d/n` or compressed IPv6).
    pub fn new(address: IpAddr, prefix_len: u8) -> Result<Self> {
        let family = match address {
            IpAddr::V4(_) => AddressFamily::V4,
            IpAddr::V6(_) => AddressFamily::V6,
        };
        if u32::from(prefix_len) > family.bits() {
            return Err(Error::InvalidPrefixLength {
                prefix: i64::from(prefix_len),
                max: family.bits(),
            });
        }

        let network = match address {
            IpAddr::V4(addr) => Network::V4 {
                key: u32::from(addr),
                prefix_len,
            },
            IpAddr::V6(addr) => Network::V6 {
                key: u128::from(addr),
                prefix_len,
            },
        };
        Ok(Self {
            text: format!("{address}/{prefix_len}"),
            network,
        })
    }

    /// The original text this range was parsed from.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn family(&self) -> AddressFamily {
        match self.network {
            Network::V4 { .. } => AddressFamily::V4,
            Network::V6 { .. } => AddressFamily::V6,
        }
    }

    pub fn prefix_len(&self) -> u8 {
        match self.network {
            Network::V4 { prefix_len, .. } | Network::V6 { prefix_len, .. } => prefix_len,
        }
    }

    /// The address part as written, host bits included.
    pub fn address(&self) -> IpAddr {
        match self.network {
            Network::V4 { key, .. } => IpAddr::V4(Ipv4Addr::from(key)),
            Network::V6 { key, .. } => IpAddr::V6(Ipv6Addr::from(key)),
        }
    }

    /// Returns whether `addr` falls inside this single range. Addresses of the
    /// other family never match.
    pub fn contains(&self, addr: IpAddr) -> bool {
        match (self.network, addr) {
            (Network::V4 { key, prefix_len }, IpAddr::V4(addr)) => {
                let len = u32::from(prefix_len);
                u32::from(addr).network(len) == key.network(len)
            }
            (Network::V6 { key, prefix_len }, IpAddr::V6(addr)) => {
                let len = u32::from(prefix_len);
                u128::from(addr).network(len) == key.network(len)
            }
            _ => false,
        }
    }

    #[inline]
    pub(crate) fn network(&self) -> Network {
        self.network
    }
}

/// Parses the decimal prefix. Non-numeric text is a format error; a number
/// outside the family width is a prefix-length error.
fn parse_prefix(input: &str, prefix: &str, family: AddressFamily) -> Result<u8> {
    let value: i64 = prefix.parse().map_err(|_| Error::cidr_format(input))?;
    let max = family.bits();
    if !(0..=i64::from(max)).contains(&value) {
        return Err(Error::InvalidPrefixLength { prefix: value, max });
    }
    // Bounded by 128 above.
    Ok(value as u8)
}

impl FromStr for Cidr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for Cidr {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl AsRef<str> for Cidr {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl fmt::Debug for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cidr({:?})", self.text)
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl serde::Serialize for Cidr {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.text)
    }
}

#[cfg(feature = "serde")]
struct CidrVisitor;

#[cfg(feature = "serde")]
impl serde::de::Visitor<'_> for CidrVisitor {
    type Value = Cidr;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a CIDR string such as \"10.0.0.0/8\"")
    }

    fn visit_str<E>(self, value: &str) -> std::result::Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        Cidr::parse(value).map_err(E::custom)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for Cidr {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_str(CidrVisitor)
    }
}
