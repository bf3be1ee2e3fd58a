// SPDX-FileCopyrightText: 2025 xfnw
//
// SPDX-License-Identifier: MIT

use crate::{DuplicatePolicy, InvalidPrefix, IpPrefix, MergeOutcome, PrefixTrie, RouteEntry};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// a pair of [`PrefixTrie`]s, one per address family
///
/// the families never mix, an ipv4 address is only ever matched against
/// ipv4 networks
#[derive(Debug, Clone)]
pub struct RouteTable<T> {
    v4: PrefixTrie<Ipv4Addr, T>,
    v6: PrefixTrie<Ipv6Addr, T>,
}

impl<T> Default for RouteTable<T> {
    fn default() -> Self {
        Self {
            v4: PrefixTrie::default(),
            v6: PrefixTrie::default(),
        }
    }
}

impl<T> RouteTable<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_duplicate_policy(policy: DuplicatePolicy) -> Self {
        Self {
            v4: PrefixTrie::with_duplicate_policy(policy),
            v6: PrefixTrie::with_duplicate_policy(policy),
        }
    }

    #[must_use]
    pub fn v4(&self) -> &PrefixTrie<Ipv4Addr, T> {
        &self.v4
    }

    #[must_use]
    pub fn v6(&self) -> &PrefixTrie<Ipv6Addr, T> {
        &self.v6
    }

    /// number of stored networks of both families
    #[must_use]
    pub fn len(&self) -> usize {
        self.v4.len() + self.v6.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.v4.is_empty() && self.v6.is_empty()
    }

    /// store a network unless something already covers it, see [`PrefixTrie::insert`]
    pub fn insert(
        &mut self,
        prefix: IpPrefix,
        payload: T,
    ) -> Result<MergeOutcome<IpPrefix, T>, InvalidPrefix> {
        Ok(match prefix {
            IpPrefix::V4(prefix) => self.v4.insert(prefix, payload)?.map_prefix(IpPrefix::V4),
            IpPrefix::V6(prefix) => self.v6.insert(prefix, payload)?.map_prefix(IpPrefix::V6),
        })
    }

    #[must_use]
    pub fn contains(&self, addr: IpAddr) -> bool {
        match addr {
            IpAddr::V4(addr) => self.v4.contains(addr),
            IpAddr::V6(addr) => self.v6.contains(addr),
        }
    }

    /// every stored network containing `addr`, least specific first
    #[must_use]
    pub fn containing_networks(&self, addr: IpAddr) -> Vec<RouteEntry<IpPrefix, &T>> {
        match addr {
            IpAddr::V4(addr) => self
                .v4
                .containing_networks(addr)
                .into_iter()
                .map(|e| RouteEntry::new((*e.prefix()).into(), e.payload()))
                .collect(),
            IpAddr::V6(addr) => self
                .v6
                .containing_networks(addr)
                .into_iter()
                .map(|e| RouteEntry::new((*e.prefix()).into(), e.payload()))
                .collect(),
        }
    }

    /// the most specific stored network containing `addr`
    #[must_use]
    pub fn longest_match(&self, addr: IpAddr) -> Option<RouteEntry<IpPrefix, &T>> {
        match addr {
            IpAddr::V4(addr) => self
                .v4
                .longest_match(addr)
                .map(|e| RouteEntry::new((*e.prefix()).into(), e.payload())),
            IpAddr::V6(addr) => self
                .v6
                .longest_match(addr)
                .map(|e| RouteEntry::new((*e.prefix()).into(), e.payload())),
        }
    }

    /// remove exactly `prefix`
    pub fn remove(&mut self, prefix: &IpPrefix) -> Option<RouteEntry<IpPrefix, T>> {
        match prefix {
            IpPrefix::V4(prefix) => self.v4.remove(prefix).map(|e| e.map_prefix(IpPrefix::V4)),
            IpPrefix::V6(prefix) => self.v6.remove(prefix).map(|e| e.map_prefix(IpPrefix::V6)),
        }
    }

    /// iterate over the stored entries, ipv4 first, each family in address order
    pub fn iter(&self) -> impl Iterator<Item = RouteEntry<IpPrefix, &T>> {
        let v4 = self
            .v4
            .iter()
            .map(|e| RouteEntry::new(IpPrefix::V4(*e.prefix()), e.payload()));
        let v6 = self
            .v6
            .iter()
            .map(|e| RouteEntry::new(IpPrefix::V6(*e.prefix()), e.payload()));
        v4.chain(v6)
    }
}

#[cfg(test)]
mod tests {
    use super::RouteTable;
    use crate::{DuplicatePolicy, IpPrefix, MergeOutcome};

    fn net(s: &str) -> IpPrefix {
        s.parse().unwrap()
    }

    #[test]
    fn families_stay_apart() {
        let mut table = RouteTable::new();
        _ = table.insert(net("0.0.0.0/0"), "v4 default").unwrap();
        _ = table.insert(net("2001:db8::/32"), "docs").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.v4().len(), 1);
        assert_eq!(table.v6().len(), 1);

        assert!(table.contains("192.0.2.1".parse().unwrap()));
        assert!(!table.contains("::ffff:192.0.2.1".parse().unwrap()));
        assert!(table.contains("2001:db8::1".parse().unwrap()));

        let found = table.containing_networks("2001:db8::1".parse().unwrap());
        assert_eq!(found.len(), 1);
        assert_eq!(*found[0].prefix(), net("2001:db8::/32"));
        assert_eq!(**found[0].payload(), "docs");
    }

    #[test]
    fn outcomes_carry_either_family() {
        let mut table = RouteTable::with_duplicate_policy(DuplicatePolicy::Replace);
        _ = table.insert(net("2001:db8:1::/48"), 1).unwrap();
        _ = table.insert(net("2001:db8:2::/48"), 2).unwrap();
        let outcome = table.insert(net("2001:db8::/32"), 3).unwrap();
        let MergeOutcome::Inserted { subsumed } = outcome else {
            panic!("wide network was not inserted");
        };
        let subsumed: Vec<_> = subsumed.into_iter().map(|e| e.into_parts()).collect();
        assert_eq!(
            subsumed,
            [(net("2001:db8:1::/48"), 1), (net("2001:db8:2::/48"), 2)]
        );
        assert_eq!(
            table.insert(net("2001:db8::/32"), 4).unwrap(),
            MergeOutcome::Replaced { previous: 3 }
        );
        assert_eq!(
            table.insert(net("2001:db8:3::/48"), 5).unwrap(),
            MergeOutcome::Skipped {
                covering: net("2001:db8::/32"),
                payload: 5
            }
        );
    }

    #[test]
    fn iter_and_remove() {
        let mut table = RouteTable::new();
        for n in ["2001:db8::/32", "10.0.0.0/8", "192.168.0.0/16"] {
            _ = table.insert(net(n), n).unwrap();
        }
        let order: Vec<_> = table.iter().map(|e| e.prefix().to_string()).collect();
        assert_eq!(order, ["10.0.0.0/8", "192.168.0.0/16", "2001:db8::/32"]);

        let removed = table.remove(&net("10.0.0.0/8")).unwrap();
        assert_eq!(removed.into_payload(), "10.0.0.0/8");
        assert!(table.remove(&net("10.0.0.0/8")).is_none());
        assert!(table.longest_match("10.1.1.1".parse().unwrap()).is_none());
        assert_eq!(
            *table
                .longest_match("192.168.7.7".parse().unwrap())
                .unwrap()
                .prefix(),
            net("192.168.0.0/16")
        );
        assert_eq!(table.len(), 2);
    }
}
