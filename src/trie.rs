//! Uncompressed binary prefix trie over fixed-width keys.
//!
//! Nodes live in a single arena (`Vec<Node>`) and refer to their children by
//! index. The root is always slot `0` and stands for the empty prefix. Nodes
//! are only created along paths that have been inserted, and are never freed:
//! the trie grows monotonically.

use std::fmt;
use std::marker::PhantomData;

use crate::error::{Error, Result};
use crate::key::BitKey;

// =============================================================================
// Node arena
// =============================================================================

/// Arena index of a node. `NULL` marks an absent child.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct NodeId(u32);

impl NodeId {
    const ROOT: NodeId = NodeId(0);
    const NULL: NodeId = NodeId(u32::MAX);

    #[inline]
    fn is_null(self) -> bool {
        self == Self::NULL
    }

    #[inline]
    fn index(self) -> usize {
        debug_assert!(!self.is_null());
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug)]
struct Node {
    /// `children[0]` follows a 0 bit, `children[1]` a 1 bit.
    children: [NodeId; 2],
    /// The path from the root to this node is a stored range.
    range_end: bool,
}

impl Node {
    const EMPTY: Node = Node {
        children: [NodeId::NULL, NodeId::NULL],
        range_end: false,
    };
}

// =============================================================================
// PrefixTrie
// =============================================================================

/// Binary trie answering "is this key covered by any stored prefix?".
///
/// Lookups touch at most `K::BITS` nodes regardless of how many ranges are
/// stored. Overlapping ranges are all kept; any covering range is a match.
///
/// ```rust
/// use cidr_trie::{ipv4_key, Ipv4Trie};
///
/// let mut trie = Ipv4Trie::new();
/// trie.insert(ipv4_key("10.0.0.0").unwrap(), 8).unwrap();
///
/// assert!(trie.contains(ipv4_key("10.20.30.40").unwrap()));
/// assert!(!trie.contains(ipv4_key("11.0.0.0").unwrap()));
/// ```
#[derive(Clone)]
pub struct PrefixTrie<K: BitKey> {
    nodes: Vec<Node>,
    /// Number of distinct nodes with `range_end` set.
    ranges: usize,
    _marker: PhantomData<K>,
}

/// Trie over 32-bit IPv4 keys.
pub type Ipv4Trie = PrefixTrie<u32>;
/// Trie over 128-bit IPv6 keys.
pub type Ipv6Trie = PrefixTrie<u128>;

impl<K: BitKey> PrefixTrie<K> {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::EMPTY],
            ranges: 0,
            _marker: PhantomData,
        }
    }

    /// Stores the range made of the first `prefix_len` bits of `key`.
    ///
    /// Bits of `key` past `prefix_len` are ignored. Returns `true` if the
    /// range was not stored before; re-inserting a stored range is a no-op.
    pub fn insert(&mut self, key: K, prefix_len: u32) -> Result<bool> {
        if prefix_len > K::BITS {
            return Err(Error::InvalidPrefixLength {
                prefix: i64::from(prefix_len),
                max: K::BITS,
            });
        }
        Ok(self.mark(key, prefix_len))
    }

    /// Walks (creating as needed) `prefix_len` bits of `key` and marks the
    /// node reached. `prefix_len` must already be validated.
    pub(crate) fn mark(&mut self, key: K, prefix_len: u32) -> bool {
        debug_assert!(prefix_len <= K::BITS);

        let mut current = NodeId::ROOT;
        for i in 0..prefix_len {
            let slot = usize::from(key.bit(i));
            let child = self.nodes[current.index()].children[slot];
            current = if child.is_null() {
                let created = self.push_node();
                self.nodes[current.index()].children[slot] = created;
                created
            } else {
                child
            };
        }

        let node = &mut self.nodes[current.index()];
        if node.range_end {
            return false;
        }
        node.range_end = true;
        self.ranges += 1;
        true
    }

    #[inline]
    fn push_node(&mut self) -> NodeId {
        debug_assert!(self.nodes.len() < NodeId::NULL.0 as usize);
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::EMPTY);
        id
    }

    /// Returns whether any stored range covers `key`.
    pub fn contains(&self, key: K) -> bool {
        let mut node = &self.nodes[NodeId::ROOT.index()];
        for i in 0..K::BITS {
            // A shorter range already covers everything below this node.
            if node.range_end {
                return true;
            }
            let child = node.children[usize::from(key.bit(i))];
            if child.is_null() {
                return false;
            }
            node = &self.nodes[child.index()];
        }
        node.range_end
    }

    /// Number of distinct ranges stored.
    #[inline]
    pub fn range_count(&self) -> usize {
        self.ranges
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ranges == 0
    }

    /// Number of allocated nodes, root included.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn memory_usage(&self) -> usize {
        self.nodes.capacity() * std::mem::size_of::<Node>()
    }

    pub fn shrink_to_fit(&mut self) {
        self.nodes.shrink_to_fit();
    }

    /// Asserts the arena forms a strict tree rooted at slot 0 with consistent
    /// counters.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        let mut seen = vec![false; self.nodes.len()];
        let mut stack = vec![(NodeId::ROOT, 0u32)];
        let mut reachable = 0usize;
        let mut marked = 0usize;

        while let Some((id, depth)) = stack.pop() {
            assert!(!seen[id.index()], "node {} reached twice", id.0);
            seen[id.index()] = true;
            reachable += 1;
            assert!(depth <= K::BITS, "node deeper than key width");

            let node = &self.nodes[id.index()];
            if node.range_end {
                marked += 1;
            }
            for child in node.children {
                if !child.is_null() {
                    assert!(depth < K::BITS, "child below a full-width node");
                    stack.push((child, depth + 1));
                }
            }
        }

        assert_eq!(reachable, self.nodes.len(), "unreachable nodes in arena");
        assert_eq!(marked, self.ranges, "range counter out of sync");
    }
}

impl<K: BitKey> Default for PrefixTrie<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: BitKey> fmt::Debug for PrefixTrie<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrefixTrie")
            .field("bits", &K::BITS)
            .field("ranges", &self.ranges)
            .field("nodes", &self.nodes.len())
            .finish()
    }
}
