//! Dual-stack range set: one trie per address family plus the ordered
//! history of ranges added.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use tracing::{debug, trace_span};

use crate::cidr::{Cidr, Network};
use crate::error::{Error, Result};
use crate::key::{ipv4_key, ipv6_key, AddressFamily};
use crate::trie::{Ipv4Trie, Ipv6Trie};

/// A set of IPv4 and IPv6 CIDR ranges with constant-time membership tests.
///
/// Text inputs are routed by syntax: anything containing `:` goes to the
/// IPv6 trie, everything else to the IPv4 trie. There is no cross-family
/// matching, so `::ffff:10.0.0.1` is only checked against IPv6 ranges.
///
/// The set only grows. To update a set that is being read concurrently,
/// clone it, mutate the clone, and publish the clone (for example by swapping
/// an `Arc`).
///
/// ```rust
/// use cidr_trie::RangeSet;
///
/// let mut set = RangeSet::new();
/// set.add_range("10.0.0.0/8")?.add_range("2001:db8::/32")?;
///
/// assert!(set.contains("10.1.2.3")?);
/// assert!(set.contains("2001:db8::1")?);
/// assert!(!set.contains("8.8.8.8")?);
/// # Ok::<(), cidr_trie::Error>(())
/// ```
pub struct RangeSet {
    v4: Ipv4Trie,
    v6: Ipv6Trie,
    /// Every range added, in order, duplicates included.
    ranges: Vec<Cidr>,
}

impl RangeSet {
    pub fn new() -> Self {
        Self {
            v4: Ipv4Trie::new(),
            v6: Ipv6Trie::new(),
            ranges: Vec::new(),
        }
    }

    pub fn builder() -> RangeSetBuilder {
        RangeSetBuilder::new()
    }

    /// Builds a set from CIDR strings. Fails on the first invalid entry.
    pub fn from_ranges<I, S>(ranges: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();
        set.add_ranges(ranges)?;
        Ok(set)
    }

    /// Parses and adds one CIDR range. On error the set is left unchanged.
    pub fn add_range(&mut self, cidr: &str) -> Result<&mut Self> {
        match Cidr::parse(cidr) {
            Ok(cidr) => Ok(self.add_cidr(cidr)),
            Err(err) => {
                debug!(input = cidr, error = %err, "rejected CIDR range");
                Err(err)
            }
        }
    }

    /// Adds a batch of CIDR ranges. Every entry is validated before any is
    /// inserted, so a failing batch leaves the set unchanged.
    pub fn add_ranges<I, S>(&mut self, ranges: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let parsed = ranges
            .into_iter()
            .map(|cidr| {
                let cidr = cidr.as_ref();
                Cidr::parse(cidr).inspect_err(|err| {
                    debug!(input = cidr, error = %err, "rejected CIDR range");
                })
            })
            .collect::<Result<Vec<_>>>()?;
        for cidr in parsed {
            self.add_cidr(cidr);
        }
        Ok(self)
    }

    /// Adds an already validated range.
    pub fn add_cidr(&mut self, cidr: Cidr) -> &mut Self {
        let inserted = match cidr.network() {
            Network::V4 { key, prefix_len } => self.v4.mark(key, u32::from(prefix_len)),
            Network::V6 { key, prefix_len } => self.v6.mark(key, u32::from(prefix_len)),
        };
        debug!(
            cidr = %cidr,
            family = %cidr.family(),
            prefix_len = cidr.prefix_len(),
            new_range = inserted,
            "added CIDR range"
        );
        self.ranges.push(cidr);
        self
    }

    /// Adds an IPv4 range from a numeric address.
    pub fn add_ipv4_range(&mut self, addr: u32, prefix_len: u8) -> Result<&mut Self> {
        let cidr = Cidr::new(IpAddr::V4(Ipv4Addr::from(addr)), prefix_len)?;
        Ok(self.add_cidr(cidr))
    }

    /// Adds an IPv6 range from a 16-byte network-order address.
    pub fn add_ipv6_range(&mut self, addr: [u8; 16], prefix_len: u8) -> Result<&mut Self> {
        let cidr = Cidr::new(IpAddr::V6(Ipv6Addr::from(addr)), prefix_len)?;
        Ok(self.add_cidr(cidr))
    }

    /// Returns whether `ip` is covered by any range of its family.
    pub fn contains(&self, ip: &str) -> Result<bool> {
        if ip.trim().is_empty() {
            return Err(Error::InvalidArgument { what: "IP address" });
        }
        Ok(match AddressFamily::sniff(ip) {
            AddressFamily::V4 => self.v4.contains(ipv4_key(ip)?),
            AddressFamily::V6 => self.v6.contains(ipv6_key(ip)?),
        })
    }

    pub fn contains_addr(&self, ip: IpAddr) -> bool {
        match ip {
            IpAddr::V4(ip) => self.contains_ipv4_addr(ip),
            IpAddr::V6(ip) => self.contains_ipv6_addr(ip),
        }
    }

    #[inline]
    pub fn contains_ipv4_addr(&self, ip: Ipv4Addr) -> bool {
        self.v4.contains(u32::from(ip))
    }

    #[inline]
    pub fn contains_ipv6_addr(&self, ip: Ipv6Addr) -> bool {
        self.v6.contains(u128::from(ip))
    }

    /// Membership test for a pre-parsed IPv4 address (`a.b.c.d` as
    /// `a << 24 | b << 16 | c << 8 | d`).
    #[inline]
    pub fn contains_ipv4(&self, ip: u32) -> bool {
        self.v4.contains(ip)
    }

    /// Membership test for a pre-parsed IPv6 address in network byte order.
    #[inline]
    pub fn contains_ipv6(&self, ip: [u8; 16]) -> bool {
        self.v6.contains(u128::from_be_bytes(ip))
    }

    /// Ranges in insertion order, duplicates included.
    #[inline]
    pub fn ranges(&self) -> &[Cidr] {
        &self.ranges
    }

    /// Number of ranges added, duplicates included.
    #[inline]
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn ipv4_trie(&self) -> &Ipv4Trie {
        &self.v4
    }

    pub fn ipv6_trie(&self) -> &Ipv6Trie {
        &self.v6
    }

    pub fn memory_usage(&self) -> usize {
        self.v4.memory_usage()
            + self.v6.memory_usage()
            + self.ranges.capacity() * std::mem::size_of::<Cidr>()
            + self.ranges.iter().map(|c| c.as_str().len()).sum::<usize>()
    }

    pub fn shrink_to_fit(&mut self) {
        self.v4.shrink_to_fit();
        self.v6.shrink_to_fit();
        self.ranges.shrink_to_fit();
    }
}

impl Default for RangeSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Rebuilds both tries from scratch by replaying the range history, so the
/// copy shares nothing with `self`.
impl Clone for RangeSet {
    fn clone(&self) -> Self {
        let _span = trace_span!("range_set_copy", ranges = self.ranges.len()).entered();
        let mut copy = Self::new();
        copy.ranges.reserve(self.ranges.len());
        for cidr in &self.ranges {
            copy.add_cidr(cidr.clone());
        }
        copy
    }
}

impl fmt::Debug for RangeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RangeSet")
            .field("ranges", &self.ranges)
            .field("v4", &self.v4)
            .field("v6", &self.v6)
            .finish()
    }
}

impl FromIterator<Cidr> for RangeSet {
    fn from_iter<I: IntoIterator<Item = Cidr>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl Extend<Cidr> for RangeSet {
    fn extend<I: IntoIterator<Item = Cidr>>(&mut self, iter: I) {
        for cidr in iter {
            self.add_cidr(cidr);
        }
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Fluent accumulator for a [`RangeSet`].
///
/// ```rust
/// use cidr_trie::RangeSet;
///
/// let set = RangeSet::builder()
///     .add_range("192.168.0.0/16")?
///     .add_ranges(["10.0.0.0/8", "fd00::/8"])?
///     .build();
/// assert_eq!(set.len(), 3);
/// # Ok::<(), cidr_trie::Error>(())
/// ```
#[derive(Clone, Debug, Default)]
pub struct RangeSetBuilder {
    set: RangeSet,
}

impl RangeSetBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_range(mut self, cidr: &str) -> Result<Self> {
        self.set.add_range(cidr)?;
        Ok(self)
    }

    pub fn add_ranges<I, S>(mut self, ranges: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.set.add_ranges(ranges)?;
        Ok(self)
    }

    pub fn add_cidr(mut self, cidr: Cidr) -> Self {
        self.set.add_cidr(cidr);
        self
    }

    pub fn build(self) -> RangeSet {
        self.set
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl serde::Serialize for RangeSet {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeSeq;
        let mut seq = serializer.serialize_seq(Some(self.ranges.len()))?;
        for cidr in &self.ranges {
            seq.serialize_element(cidr)?;
        }
        seq.end()
    }
}

#[cfg(feature = "serde")]
struct RangeSetVisitor;

#[cfg(feature = "serde")]
impl<'de> serde::de::Visitor<'de> for RangeSetVisitor {
    type Value = RangeSet;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a sequence of CIDR strings")
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: serde::de::SeqAccess<'de>,
    {
        let mut set = RangeSet::new();
        while let Some(cidr) = seq.next_element::<Cidr>()? {
            set.add_cidr(cidr);
        }
        Ok(set)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for RangeSet {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_seq(RangeSetVisitor)
    }
}
