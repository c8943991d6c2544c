use super::*;

use proptest::prelude::*;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Naive reference: a list of `(network, prefix_len)` pairs scanned linearly.
fn covered<K: BitKey>(ranges: &[(K, u32)], key: K) -> bool {
    ranges
        .iter()
        .any(|&(net, len)| key.network(len) == net.network(len))
}

#[derive(Clone, Debug)]
enum Op<K> {
    Insert(K, u32),
    Contains(K),
}

fn ops_strategy_v4() -> impl Strategy<Value = Vec<Op<u32>>> {
    // Short prefixes from a narrow key space keep hit rates high.
    let key = prop_oneof![any::<u32>(), (0u32..16).prop_map(|k| k << 28)];
    let op = prop_oneof![
        30 => (key.clone(), 0u32..=32).prop_map(|(k, l)| Op::Insert(k, l)),
        70 => key.prop_map(Op::Contains),
    ];
    prop::collection::vec(op, 0..=500)
}

fn ops_strategy_v6() -> impl Strategy<Value = Vec<Op<u128>>> {
    let key = prop_oneof![any::<u128>(), (0u128..256).prop_map(|k| k << 120)];
    let op = prop_oneof![
        30 => (key.clone(), 0u32..=128).prop_map(|(k, l)| Op::Insert(k, l)),
        70 => key.prop_map(Op::Contains),
    ];
    prop::collection::vec(op, 0..=500)
}

fn cidr_strategy() -> impl Strategy<Value = Cidr> {
    prop_oneof![
        (any::<u32>(), 0u8..=32)
            .prop_map(|(k, l)| Cidr::new(IpAddr::V4(Ipv4Addr::from(k)), l).unwrap()),
        (any::<u128>(), 0u8..=128)
            .prop_map(|(k, l)| Cidr::new(IpAddr::V6(Ipv6Addr::from(k)), l).unwrap()),
    ]
}

fn addr_strategy() -> impl Strategy<Value = IpAddr> {
    prop_oneof![
        any::<u32>().prop_map(|k| IpAddr::V4(Ipv4Addr::from(k))),
        any::<u128>().prop_map(|k| IpAddr::V6(Ipv6Addr::from(k))),
    ]
}

fn run_ops<K: BitKey>(ops: Vec<Op<K>>) -> std::result::Result<(), TestCaseError> {
    let mut t: PrefixTrie<K> = PrefixTrie::new();
    let mut m: Vec<(K, u32)> = Vec::new();

    for op in ops {
        match op {
            Op::Insert(key, len) => {
                let was_covered_exactly = m
                    .iter()
                    .any(|&(net, l)| l == len && net.network(len) == key.network(len));
                let inserted = t.insert(key, len).unwrap();
                prop_assert_eq!(inserted, !was_covered_exactly);
                m.push((key, len));
                // The inserted network itself must now match.
                prop_assert!(t.contains(key.network(len)));
            }
            Op::Contains(key) => {
                prop_assert_eq!(t.contains(key), covered(&m, key));
            }
        }
    }

    t.check_invariants();
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence_v4(ops in ops_strategy_v4()) {
        run_ops(ops)?;
    }

    #[test]
    fn prop_equivalence_v6(ops in ops_strategy_v6()) {
        run_ops(ops)?;
    }

    #[test]
    fn prop_range_set_matches_any_cidr(
        cidrs in prop::collection::vec(cidr_strategy(), 0..=64),
        probes in prop::collection::vec(addr_strategy(), 0..=256),
    ) {
        let set: RangeSet = cidrs.iter().cloned().collect();
        for cidr in &cidrs {
            prop_assert!(set.contains_addr(cidr.address()));
            prop_assert!(set.contains(&cidr.address().to_string()).unwrap());
        }
        for probe in probes {
            let expected = cidrs.iter().any(|c| c.contains(probe));
            prop_assert_eq!(set.contains_addr(probe), expected);
            prop_assert_eq!(set.contains(&probe.to_string()).unwrap(), expected);
        }
    }

    #[test]
    fn prop_duplicate_insert_keeps_shape(cidrs in prop::collection::vec(cidr_strategy(), 1..=32)) {
        let mut set: RangeSet = cidrs.iter().cloned().collect();
        let v4_nodes = set.ipv4_trie().node_count();
        let v6_nodes = set.ipv6_trie().node_count();

        set.extend(cidrs.iter().cloned());

        prop_assert_eq!(set.len(), cidrs.len() * 2);
        prop_assert_eq!(set.ipv4_trie().node_count(), v4_nodes);
        prop_assert_eq!(set.ipv6_trie().node_count(), v6_nodes);
    }

    #[test]
    fn prop_copy_is_equivalent_and_independent(
        cidrs in prop::collection::vec(cidr_strategy(), 0..=32),
        extra in cidr_strategy(),
        probes in prop::collection::vec(addr_strategy(), 0..=128),
    ) {
        let source: RangeSet = cidrs.iter().cloned().collect();
        let mut copy = source.clone();

        prop_assert_eq!(copy.ranges(), source.ranges());
        prop_assert_eq!(copy.ipv4_trie().node_count(), source.ipv4_trie().node_count());
        prop_assert_eq!(copy.ipv6_trie().node_count(), source.ipv6_trie().node_count());
        for &probe in &probes {
            prop_assert_eq!(copy.contains_addr(probe), source.contains_addr(probe));
        }

        copy.add_cidr(extra.clone());
        prop_assert!(copy.contains_addr(extra.address()));
        prop_assert_eq!(
            source.contains_addr(extra.address()),
            cidrs.iter().any(|c| c.contains(extra.address()))
        );
        prop_assert_eq!(source.len(), cidrs.len());
        source.ipv4_trie().check_invariants();
        copy.ipv6_trie().check_invariants();
    }
}

#[test]
fn prefix_boundaries_v4() {
    for len in 0..=32u32 {
        let mut t = Ipv4Trie::new();
        let net = 0xC0A8_0000u32.network(len);
        t.insert(net, len).unwrap();

        // First and last address of the range.
        let last = if len == 32 { net } else { net | (u32::MAX >> len) };
        assert!(t.contains(net), "/{len}");
        assert!(t.contains(last), "/{len}");

        if len > 0 {
            // Flip the last prefix bit: just outside the range.
            let outside = net ^ (1u32 << (32 - len));
            assert!(!t.contains(outside), "/{len}");
        }
        t.check_invariants();
    }
}

#[test]
fn prefix_boundaries_v6() {
    let base = u128::from("2001:db8:1234:5678:9abc:def0:1234:5678".parse::<Ipv6Addr>().unwrap());
    for len in 0..=128u32 {
        let mut t = Ipv6Trie::new();
        let net = base.network(len);
        t.insert(net, len).unwrap();

        let last = if len == 128 { net } else { net | (u128::MAX >> len) };
        assert!(t.contains(net), "/{len}");
        assert!(t.contains(last), "/{len}");
        if len > 0 {
            let outside = net ^ (1u128 << (128 - len));
            assert!(!t.contains(outside), "/{len}");
        }
    }
}
