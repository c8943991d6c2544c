//! # cidr-trie
//!
//! Constant-time membership tests of IPv4 and IPv6 addresses against a set of
//! CIDR ranges.
//!
//! Each address family is stored in an uncompressed binary prefix trie keyed
//! by the address bits, most significant first. A lookup walks at most 32
//! (IPv4) or 128 (IPv6) nodes no matter how many ranges are stored, and stops
//! at the first stored prefix on its path: overlapping ranges all match, there
//! is no longest-prefix ranking.
//!
//! ## Example
//!
//! ```rust
//! use cidr_trie::RangeSet;
//!
//! let allow = RangeSet::builder()
//!     .add_range("10.0.0.0/8")?
//!     .add_range("192.168.0.0/16")?
//!     .add_range("fd00::/8")?
//!     .build();
//!
//! assert!(allow.contains("10.1.2.3")?);
//! assert!(allow.contains("fd00::1")?);
//! assert!(!allow.contains("8.8.8.8")?);
//! # Ok::<(), cidr_trie::Error>(())
//! ```
//!
//! ## Concurrency
//!
//! [`RangeSet`] has no interior mutability. Any number of threads may call
//! the `contains*` methods through a shared reference. Updates need either an
//! external lock, or the copy-and-publish pattern: clone the set, add ranges
//! to the clone, then swap it in (e.g. behind an `Arc`).
//!
//! ## Logging
//!
//! Range insertions and rejections are reported as `tracing` events at
//! `DEBUG`; lookups emit nothing.

#![deny(unsafe_code)]

mod cidr;
mod error;
mod key;
mod range_set;
mod trie;

pub use cidr::Cidr;
pub use error::{Error, ErrorKind, Result};
pub use key::{ipv4_key, ipv6_key, AddressFamily, BitKey};
pub use range_set::{RangeSet, RangeSetBuilder};
pub use trie::{Ipv4Trie, Ipv6Trie, PrefixTrie};

#[cfg(test)]
mod proptests;
