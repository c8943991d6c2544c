//! Fixed-width bit keys and textual address conversion.
//!
//! Bit index `0` is always the most significant bit of the address, so a key
//! is walked in network byte order.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use crate::error::{Error, Result};

// =============================================================================
// BitKey
// =============================================================================

/// A fixed-width unsigned key that a [`PrefixTrie`](crate::PrefixTrie) is
/// indexed by.
pub trait BitKey: Copy + Eq + fmt::Debug {
    /// Key width in bits (32 for IPv4, 128 for IPv6).
    const BITS: u32;

    /// Bit at `index`, where `0` is the MSB.
    fn bit(self, index: u32) -> bool;

    /// Key with every bit at or after `prefix_len` cleared.
    fn network(self, prefix_len: u32) -> Self;
}

impl BitKey for u32 {
    const BITS: u32 = 32;

    #[inline]
    fn bit(self, index: u32) -> bool {
        debug_assert!(index < Self::BITS);
        (self >> (31 - index)) & 1 == 1
    }

    #[inline]
    fn network(self, prefix_len: u32) -> Self {
        debug_assert!(prefix_len <= Self::BITS);
        if prefix_len == 0 {
            0
        } else {
            self & (u32::MAX << (32 - prefix_len))
        }
    }
}

impl BitKey for u128 {
    const BITS: u32 = 128;

    #[inline]
    fn bit(self, index: u32) -> bool {
        debug_assert!(index < Self::BITS);
        (self >> (127 - index)) & 1 == 1
    }

    #[inline]
    fn network(self, prefix_len: u32) -> Self {
        debug_assert!(prefix_len <= Self::BITS);
        if prefix_len == 0 {
            0
        } else {
            self & (u128::MAX << (128 - prefix_len))
        }
    }
}

// =============================================================================
// Address family
// =============================================================================

/// The address space a literal belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    V4,
    V6,
}

impl AddressFamily {
    /// Classifies a literal by syntax alone: anything containing `:` is IPv6.
    ///
    /// This does not validate the literal.
    #[inline]
    pub fn sniff(literal: &str) -> Self {
        if literal.contains(':') {
            AddressFamily::V6
        } else {
            AddressFamily::V4
        }
    }

    /// Key width of the family.
    #[inline]
    pub fn bits(self) -> u32 {
        match self {
            AddressFamily::V4 => u32::BITS,
            AddressFamily::V6 => u128::BITS,
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AddressFamily::V4 => "IPv4",
            AddressFamily::V6 => "IPv6",
        })
    }
}

// =============================================================================
// Textual conversion
// =============================================================================

/// Parses a dotted-quad IPv4 literal into its 32-bit key.
pub fn ipv4_key(literal: &str) -> Result<u32> {
    literal
        .parse::<Ipv4Addr>()
        .map(u32::from)
        .map_err(|_| Error::address_format(literal, AddressFamily::V4))
}

/// Parses any textual IPv6 form (compressed, expanded or with an embedded
/// dotted quad) into its 128-bit key.
pub fn ipv6_key(literal: &str) -> Result<u128> {
    literal
        .parse::<Ipv6Addr>()
        .map(u128::from)
        .map_err(|_| Error::address_format(literal, AddressFamily::V6))
}
