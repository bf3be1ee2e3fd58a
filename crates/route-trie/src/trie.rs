// SPDX-FileCopyrightText: 2025 xfnw
//
// SPDX-License-Identifier: MIT

use crate::{Address, InvalidPrefix, NetworkPrefix};

/// a network along with whatever was attached to it
///
/// entries are identified by their network, the payload is along for the ride
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteEntry<P, T> {
    prefix: P,
    payload: T,
}

/// the entries stored in a [`PrefixTrie`]
pub type TrieEntry<A, T> = RouteEntry<NetworkPrefix<A>, T>;

impl<P, T> RouteEntry<P, T> {
    #[must_use]
    pub const fn new(prefix: P, payload: T) -> Self {
        Self { prefix, payload }
    }

    #[must_use]
    pub const fn prefix(&self) -> &P {
        &self.prefix
    }

    #[must_use]
    pub const fn payload(&self) -> &T {
        &self.payload
    }

    #[must_use]
    pub fn into_payload(self) -> T {
        self.payload
    }

    #[must_use]
    pub fn into_parts(self) -> (P, T) {
        (self.prefix, self.payload)
    }

    /// swap the network for another representation of it
    pub fn map_prefix<Q>(self, f: impl FnOnce(P) -> Q) -> RouteEntry<Q, T> {
        RouteEntry::new(f(self.prefix), self.payload)
    }
}

/// what happens when inserting a network that is already stored
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// the first payload stays and the insert is skipped
    #[default]
    KeepExisting,
    /// the new payload replaces the old one
    Replace,
}

/// result of [`PrefixTrie::insert`]
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum MergeOutcome<P, T> {
    /// a stored network already covers the new one, which was not stored
    ///
    /// the payload that was passed in is handed back
    Skipped { covering: P, payload: T },
    /// the exact network was stored already and got its payload replaced
    Replaced { previous: T },
    /// the network was stored, and any stored networks it covers were removed
    Inserted { subsumed: Vec<RouteEntry<P, T>> },
}

impl<P, T> MergeOutcome<P, T> {
    /// whether the network ended up stored by this insert
    #[must_use]
    pub fn is_inserted(&self) -> bool {
        matches!(self, Self::Inserted { .. })
    }

    /// swap every network for another representation of it
    pub fn map_prefix<Q>(self, mut f: impl FnMut(P) -> Q) -> MergeOutcome<Q, T> {
        match self {
            Self::Skipped { covering, payload } => MergeOutcome::Skipped {
                covering: f(covering),
                payload,
            },
            Self::Replaced { previous } => MergeOutcome::Replaced { previous },
            Self::Inserted { subsumed } => MergeOutcome::Inserted {
                subsumed: subsumed.into_iter().map(|e| e.map_prefix(&mut f)).collect(),
            },
        }
    }
}

#[derive(Debug, Clone)]
struct Node<A, T> {
    entry: Option<TrieEntry<A, T>>,
    children: [Option<Box<Node<A, T>>>; 2],
}

impl<A, T> Default for Node<A, T> {
    fn default() -> Self {
        Self {
            entry: None,
            children: [None, None],
        }
    }
}

impl<A, T> Node<A, T> {
    fn is_empty(&self) -> bool {
        self.entry.is_none() && self.children.iter().all(Option::is_none)
    }

    fn child(&self, bit: bool) -> Option<&Self> {
        self.children[usize::from(bit)].as_deref()
    }

    /// move every entry at or below this node into `out`, in address order
    fn drain_into(&mut self, out: &mut Vec<TrieEntry<A, T>>) {
        out.extend(self.entry.take());
        for child in &mut self.children {
            if let Some(mut child) = child.take() {
                child.drain_into(out);
            }
        }
    }

    fn remove(&mut self, mut bits: impl Iterator<Item = bool>) -> Option<TrieEntry<A, T>> {
        let Some(bit) = bits.next() else {
            return self.entry.take();
        };
        let slot = &mut self.children[usize::from(bit)];
        let child = slot.as_mut()?;
        let removed = child.remove(bits);
        if child.is_empty() {
            *slot = None;
        }
        removed
    }
}

/// a binary trie of networks where no stored network contains another
///
/// each level of the trie consumes one bit of the address, and a node holds
/// an entry when a stored network ends there. inserting a network that is
/// already covered does nothing, while inserting one that covers stored
/// networks throws those away.
#[derive(Debug, Clone)]
pub struct PrefixTrie<A, T> {
    root: Node<A, T>,
    len: usize,
    policy: DuplicatePolicy,
}

impl<A, T> Default for PrefixTrie<A, T> {
    fn default() -> Self {
        Self {
            root: Node::default(),
            len: 0,
            policy: DuplicatePolicy::default(),
        }
    }
}

impl<A: Address, T> PrefixTrie<A, T> {
    /// create an empty trie
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// create an empty trie that handles repeated networks with `policy`
    #[must_use]
    pub fn with_duplicate_policy(policy: DuplicatePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// number of stored networks
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// store a network unless something already covers it
    ///
    /// stored networks that the new one covers are removed and returned in
    /// [`MergeOutcome::Inserted`]. the network must have no host bits set.
    pub fn insert(
        &mut self,
        prefix: NetworkPrefix<A>,
        payload: T,
    ) -> Result<MergeOutcome<NetworkPrefix<A>, T>, InvalidPrefix> {
        prefix.check()?;

        if let Some(covering) = self.covering(&prefix).map(|e| *e.prefix()) {
            if covering == prefix && self.policy == DuplicatePolicy::Replace {
                if let Some(entry) = self.node_mut(&prefix).and_then(|n| n.entry.as_mut()) {
                    let previous = std::mem::replace(&mut entry.payload, payload);
                    return Ok(MergeOutcome::Replaced { previous });
                }
            }
            return Ok(MergeOutcome::Skipped { covering, payload });
        }

        let mut node = &mut self.root;
        for bit in prefix.bits() {
            node = &mut **node.children[usize::from(bit)].get_or_insert_with(Box::default);
        }
        let mut subsumed = vec![];
        node.drain_into(&mut subsumed);
        node.entry = Some(RouteEntry::new(prefix, payload));

        self.len = self.len + 1 - subsumed.len();
        Ok(MergeOutcome::Inserted { subsumed })
    }

    /// the stored network that contains `prefix`, if any
    fn covering(&self, prefix: &NetworkPrefix<A>) -> Option<&TrieEntry<A, T>> {
        let mut node = &self.root;
        let mut bits = prefix.bits();
        loop {
            if let Some(entry) = &node.entry {
                return Some(entry);
            }
            node = node.child(bits.next()?)?;
        }
    }

    /// walk towards `addr`, yielding every entry on the way
    fn path(&self, addr: A) -> impl Iterator<Item = &TrieEntry<A, T>> {
        let mut bits = addr.bits(A::WIDTH);
        std::iter::successors(Some(&self.root), move |node| node.child(bits.next()?))
            .filter_map(|node| node.entry.as_ref())
    }

    /// whether any stored network contains `addr`
    #[must_use]
    pub fn contains(&self, addr: A) -> bool {
        self.path(addr).next().is_some()
    }

    /// every stored network containing `addr`, least specific first
    ///
    /// since stored networks never contain each other, this has at most one
    /// item
    #[must_use]
    pub fn containing_networks(&self, addr: A) -> Vec<&TrieEntry<A, T>> {
        self.path(addr).collect()
    }

    /// the most specific stored network containing `addr`
    #[must_use]
    pub fn longest_match(&self, addr: A) -> Option<&TrieEntry<A, T>> {
        self.path(addr).last()
    }

    /// the entry stored for exactly `prefix`
    ///
    /// a prefix [`PrefixTrie::insert`] would reject is never stored, so it
    /// finds nothing
    #[must_use]
    pub fn get(&self, prefix: &NetworkPrefix<A>) -> Option<&TrieEntry<A, T>> {
        self.node(prefix)?.entry.as_ref()
    }

    fn node(&self, prefix: &NetworkPrefix<A>) -> Option<&Node<A, T>> {
        prefix.check().ok()?;
        prefix
            .bits()
            .try_fold(&self.root, |node, bit| node.child(bit))
    }

    fn node_mut(&mut self, prefix: &NetworkPrefix<A>) -> Option<&mut Node<A, T>> {
        let mut node = &mut self.root;
        for bit in prefix.bits() {
            node = node.children[usize::from(bit)].as_deref_mut()?;
        }
        Some(node)
    }

    /// every stored network inside `prefix`, in address order
    ///
    /// empty when `prefix` has host bits set
    #[must_use]
    pub fn covered_networks(&self, prefix: &NetworkPrefix<A>) -> Vec<&TrieEntry<A, T>> {
        self.node(prefix)
            .map(|node| Iter::from_node(node).collect())
            .unwrap_or_default()
    }

    /// remove exactly `prefix`, pruning branches that end up empty
    ///
    /// like [`PrefixTrie::get`], a prefix with host bits set matches nothing
    pub fn remove(&mut self, prefix: &NetworkPrefix<A>) -> Option<TrieEntry<A, T>> {
        prefix.check().ok()?;
        let removed = self.root.remove(prefix.bits());
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    /// iterate over the stored entries in address order
    pub fn iter(&self) -> Iter<'_, A, T> {
        Iter::from_node(&self.root)
    }
}

impl<'a, A: Address, T> IntoIterator for &'a PrefixTrie<A, T> {
    type Item = &'a TrieEntry<A, T>;
    type IntoIter = Iter<'a, A, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// an [`Iterator`] over the entries of a [`PrefixTrie`]
///
/// walks the trie depth first without recursion, so entries come out in
/// address order
#[derive(Debug, Clone)]
#[must_use = "iterators do not do anything until consumed"]
pub struct Iter<'a, A, T> {
    stack: Vec<&'a Node<A, T>>,
}

impl<'a, A, T> Iter<'a, A, T> {
    fn from_node(node: &'a Node<A, T>) -> Self {
        Self { stack: vec![node] }
    }
}

impl<'a, A, T> Iterator for Iter<'a, A, T> {
    type Item = &'a TrieEntry<A, T>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            let [a, b] = &node.children;
            self.stack.extend(b.as_deref());
            self.stack.extend(a.as_deref());
            if let Some(entry) = &node.entry {
                return Some(entry);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::{DuplicatePolicy, MergeOutcome, Node, PrefixTrie, RouteEntry};
    use crate::{InvalidPrefix, NetworkPrefix};
    use std::net::{Ipv4Addr, Ipv6Addr};

    fn net(s: &str) -> NetworkPrefix<Ipv4Addr> {
        s.parse().unwrap()
    }

    fn addr(s: &str) -> Ipv4Addr {
        s.parse().unwrap()
    }

    fn node_count<A, T>(node: &Node<A, T>) -> usize {
        1 + node
            .children
            .iter()
            .flatten()
            .map(|child| node_count(child))
            .sum::<usize>()
    }

    fn stored(trie: &PrefixTrie<Ipv4Addr, &'static str>) -> Vec<String> {
        trie.iter().map(|e| e.prefix().to_string()).collect()
    }

    #[test]
    fn duplicate_is_skipped() {
        let mut trie = PrefixTrie::new();
        let first = trie.insert(net("10.10.10.0/24"), "a").unwrap();
        assert_eq!(first, MergeOutcome::Inserted { subsumed: vec![] });
        let second = trie.insert(net("10.10.10.0/24"), "b").unwrap();
        assert_eq!(
            second,
            MergeOutcome::Skipped {
                covering: net("10.10.10.0/24"),
                payload: "b"
            }
        );
        assert_eq!(trie.len(), 1);
        assert_eq!(*trie.get(&net("10.10.10.0/24")).unwrap().payload(), "a");
    }

    #[test]
    fn duplicate_replaces() {
        let mut trie = PrefixTrie::with_duplicate_policy(DuplicatePolicy::Replace);
        _ = trie.insert(net("10.10.10.0/24"), "a").unwrap();
        let outcome = trie.insert(net("10.10.10.0/24"), "b").unwrap();
        assert_eq!(outcome, MergeOutcome::Replaced { previous: "a" });
        assert_eq!(trie.len(), 1);
        assert_eq!(*trie.get(&net("10.10.10.0/24")).unwrap().payload(), "b");

        // only exact matches get replaced
        let outcome = trie.insert(net("10.10.10.128/30"), "c").unwrap();
        assert!(matches!(outcome, MergeOutcome::Skipped { .. }));
    }

    #[test]
    fn subset_is_skipped() {
        let mut trie = PrefixTrie::new();
        _ = trie.insert(net("10.10.10.0/24"), "a").unwrap();
        let outcome = trie.insert(net("10.10.10.128/30"), "b").unwrap();
        assert_eq!(
            outcome,
            MergeOutcome::Skipped {
                covering: net("10.10.10.0/24"),
                payload: "b"
            }
        );
        assert_eq!(stored(&trie), ["10.10.10.0/24"]);
        // the skipped insert must not leave branches behind
        assert_eq!(node_count(&trie.root), 25);
        assert_eq!(trie.covered_networks(&net("10.10.10.0/24")).len(), 1);
    }

    #[test]
    fn superset_collapses() {
        let mut trie = PrefixTrie::new();
        _ = trie.insert(net("10.10.10.0/24"), "a").unwrap();
        _ = trie.insert(net("10.10.20.0/24"), "b").unwrap();
        let outcome = trie.insert(net("10.10.0.0/16"), "c").unwrap();
        assert_eq!(
            outcome,
            MergeOutcome::Inserted {
                subsumed: vec![
                    RouteEntry::new(net("10.10.10.0/24"), "a"),
                    RouteEntry::new(net("10.10.20.0/24"), "b"),
                ]
            }
        );
        assert_eq!(stored(&trie), ["10.10.0.0/16"]);
        assert_eq!(trie.len(), 1);

        let found = trie.containing_networks(addr("10.10.10.5"));
        assert_eq!(found.len(), 1);
        assert_eq!(*found[0].prefix(), net("10.10.0.0/16"));
        assert_eq!(*found[0].payload(), "c");
        assert!(trie.get(&net("10.10.10.0/24")).is_none());
        assert!(trie.get(&net("10.10.20.0/24")).is_none());
    }

    #[test]
    fn disjoint_accumulates() {
        let mut trie = PrefixTrie::new();
        _ = trie.insert(net("10.10.10.0/24"), "a").unwrap();
        _ = trie.insert(net("11.11.11.0/24"), "b").unwrap();
        assert_eq!(stored(&trie), ["10.10.10.0/24", "11.11.11.0/24"]);
        assert!(trie.contains(addr("10.10.10.1")));
        assert!(trie.contains(addr("11.11.11.255")));
        assert!(!trie.contains(addr("12.0.0.1")));
        assert!(trie.containing_networks(addr("12.0.0.1")).is_empty());
        assert!(trie.longest_match(addr("12.0.0.1")).is_none());
    }

    #[test]
    fn empty_queries() {
        let trie: PrefixTrie<Ipv4Addr, ()> = PrefixTrie::new();
        assert!(trie.is_empty());
        assert!(!trie.contains(addr("0.0.0.0")));
        assert!(trie.containing_networks(addr("255.255.255.255")).is_empty());
        assert_eq!(trie.iter().count(), 0);
    }

    #[test]
    fn default_route_covers_everything() {
        let mut trie = PrefixTrie::new();
        _ = trie.insert(net("10.0.0.0/8"), "a").unwrap();
        _ = trie.insert(net("192.168.0.0/16"), "b").unwrap();
        let outcome = trie.insert(NetworkPrefix::everything(), "default").unwrap();
        let MergeOutcome::Inserted { subsumed } = outcome else {
            panic!("default route was not inserted");
        };
        assert_eq!(subsumed.len(), 2);
        assert_eq!(trie.len(), 1);
        assert!(trie.contains(addr("8.8.8.8")));
        assert!(matches!(
            trie.insert(net("1.2.3.4/32"), "host").unwrap(),
            MergeOutcome::Skipped { .. }
        ));
    }

    #[test]
    fn host_routes() {
        let mut trie = PrefixTrie::new();
        _ = trie.insert(net("1.2.3.4/32"), "a").unwrap();
        _ = trie.insert(net("1.2.3.5/32"), "b").unwrap();
        assert!(trie.contains(addr("1.2.3.4")));
        assert!(!trie.contains(addr("1.2.3.6")));
        assert_eq!(*trie.longest_match(addr("1.2.3.5")).unwrap().payload(), "b");
    }

    #[test]
    fn rejects_bad_prefixes() {
        let mut trie = PrefixTrie::new();
        let sloppy = NetworkPrefix::from_parts(addr("10.10.10.1"), 24);
        assert_eq!(
            trie.insert(sloppy, ()),
            Err(InvalidPrefix::NotCanonical("10.10.10.1/24".to_string()))
        );
        let long = NetworkPrefix::from_parts(addr("10.10.10.0"), 40);
        assert_eq!(
            trie.insert(long, ()),
            Err(InvalidPrefix::LengthOutOfRange { len: 40, width: 32 })
        );
        assert!(trie.is_empty());
    }

    #[test]
    fn remove_prunes() {
        let mut trie = PrefixTrie::new();
        _ = trie.insert(net("10.10.10.0/24"), "a").unwrap();
        _ = trie.insert(net("11.11.11.0/24"), "b").unwrap();
        assert!(trie.remove(&net("10.10.0.0/16")).is_none());
        let removed = trie.remove(&net("10.10.10.0/24")).unwrap();
        assert_eq!(removed.into_parts(), (net("10.10.10.0/24"), "a"));
        assert_eq!(trie.len(), 1);
        assert!(!trie.contains(addr("10.10.10.1")));
        // 10/8 and 11/8 share the first seven bits, everything below that on
        // the removed side should be gone
        let mut node = &trie.root;
        for bit in net("10.0.0.0/7").bits() {
            node = node.child(bit).unwrap();
        }
        assert!(node.child(false).is_none());

        _ = trie.remove(&net("11.11.11.0/24")).unwrap();
        assert!(trie.is_empty());
        assert!(trie.root.is_empty());
    }

    #[test]
    fn host_bits_match_nothing() {
        let mut trie = PrefixTrie::new();
        _ = trie.insert(net("10.10.10.0/24"), "a").unwrap();
        let sloppy = NetworkPrefix::from_parts(addr("10.10.10.1"), 24);
        assert!(trie.get(&sloppy).is_none());
        assert!(trie.covered_networks(&sloppy).is_empty());
        assert!(trie.remove(&sloppy).is_none());
        let long = NetworkPrefix::from_parts(addr("10.10.10.0"), 40);
        assert!(trie.get(&long).is_none());
        assert!(trie.remove(&long).is_none());

        assert_eq!(trie.len(), 1);
        assert_eq!(*trie.get(&net("10.10.10.0/24")).unwrap().payload(), "a");
    }

    #[test]
    fn covered_networks() {
        let mut trie = PrefixTrie::new();
        for n in ["10.1.0.0/16", "10.2.0.0/16", "10.200.0.0/16", "11.0.0.0/8"] {
            _ = trie.insert(net(n), n).unwrap();
        }
        let inside: Vec<_> = trie
            .covered_networks(&net("10.0.0.0/8"))
            .into_iter()
            .map(|e| *e.payload())
            .collect();
        assert_eq!(inside, ["10.1.0.0/16", "10.2.0.0/16", "10.200.0.0/16"]);
        assert!(trie.covered_networks(&net("12.0.0.0/8")).is_empty());
        assert_eq!(trie.covered_networks(&NetworkPrefix::everything()).len(), 4);
    }

    #[test]
    fn address_order() {
        let mut trie = PrefixTrie::new();
        for n in ["192.168.1.0/24", "10.0.0.0/8", "172.16.0.0/12", "10.0.0.0/8"] {
            _ = trie.insert(net(n), n).unwrap();
        }
        let order: Vec<_> = (&trie).into_iter().map(|e| *e.payload()).collect();
        assert_eq!(order, ["10.0.0.0/8", "172.16.0.0/12", "192.168.1.0/24"]);
    }

    #[test]
    fn ipv6() {
        let mut trie = PrefixTrie::new();
        let wide: NetworkPrefix<Ipv6Addr> = "2001:db8::/32".parse().unwrap();
        let narrow: NetworkPrefix<Ipv6Addr> = "2001:db8:1::/48".parse().unwrap();
        _ = trie.insert(narrow, "narrow").unwrap();
        assert!(trie.insert(wide, "wide").unwrap().is_inserted());
        assert_eq!(trie.len(), 1);
        assert!(trie.contains("2001:db8:ffff::1".parse().unwrap()));
        assert!(!trie.contains("2001:db9::1".parse().unwrap()));
    }
}
