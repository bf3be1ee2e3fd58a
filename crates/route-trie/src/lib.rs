// SPDX-FileCopyrightText: 2025 xfnw
//
// SPDX-License-Identifier: MIT

//! binary trie that merges cidr networks into a minimal covering set
//!
//! networks are inserted one at a time. a network that is already covered by
//! a stored one gets skipped, and a network that covers stored ones replaces
//! them, so no stored network ever contains another.
//!
//! ```rust
//! use route_trie::{IpPrefix, MergeOutcome, RouteTable};
//!
//! let mut table = RouteTable::new();
//! for net in ["10.10.10.0/24", "10.10.20.0/24", "10.10.0.0/16"] {
//!     let prefix: IpPrefix = net.parse().unwrap();
//!     _ = table.insert(prefix, net).unwrap();
//! }
//! assert_eq!(table.len(), 1);
//!
//! let found = table.containing_networks("10.10.10.5".parse().unwrap());
//! assert_eq!(found.len(), 1);
//! assert_eq!(*found[0].payload(), &"10.10.0.0/16");
//!
//! let prefix: IpPrefix = "10.10.10.128/30".parse().unwrap();
//! let outcome = table.insert(prefix, "again").unwrap();
//! assert!(matches!(outcome, MergeOutcome::Skipped { .. }));
//! ```

use std::{
    fmt,
    hash::Hash,
    net::{AddrParseError, Ipv4Addr, Ipv6Addr},
    str::FromStr,
};

mod parse;
mod prefix;
mod table;
mod trie;

pub use parse::{RouteLine, parse_route_line};
pub use prefix::{InvalidPrefix, IpPrefix, NetworkPrefix, ParseError};
pub use table::RouteTable;
pub use trie::{DuplicatePolicy, Iter, MergeOutcome, PrefixTrie, RouteEntry, TrieEntry};

/// an [`Iterator`] over a number of the most significant bits in a `u128`
///
/// this goes most significant to least significant. if the range is larger than the number of
/// bits, it will act like the remaining items are unset bits
#[must_use = "iterators do not do anything until consumed"]
#[derive(Debug, Clone)]
pub struct BitRangeIter {
    inner: u128,
    range: usize,
}

impl BitRangeIter {
    #[must_use]
    pub const fn new(inner: u128, range: usize) -> Self {
        Self { inner, range }
    }
}

impl From<(u128, usize)> for BitRangeIter {
    fn from(item: (u128, usize)) -> Self {
        Self::new(item.0, item.1)
    }
}

impl Iterator for BitRangeIter {
    type Item = bool;

    fn next(&mut self) -> Option<Self::Item> {
        if self.range == 0 {
            return None;
        }
        self.range -= 1;

        let is_set = self.inner & 1 << (u128::BITS - 1);
        self.inner <<= 1;
        Some(is_set != 0)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.range, Some(self.range))
    }
}

impl ExactSizeIterator for BitRangeIter {}

/// mask keeping the `len` most significant bits of a `u128`
#[must_use]
pub(crate) fn leading_mask(len: u8) -> u128 {
    u128::MAX
        .checked_shl(u128::BITS - u32::from(len.min(128)))
        .unwrap_or(0)
}

/// a fixed width network address
///
/// addresses are handled as a `u128` with the address bits at the top, so
/// both families can share the same bit walking code
pub trait Address:
    Copy + Eq + Ord + Hash + fmt::Debug + fmt::Display + FromStr<Err = AddrParseError>
{
    /// number of bits in the address
    const WIDTH: u8;

    /// the address bits, most significant first, padded with zeros on the right
    fn to_aligned(self) -> u128;

    /// inverse of [`Address::to_aligned`], padding bits are ignored
    fn from_aligned(bits: u128) -> Self;

    /// iterate over the first `len` bits of the address
    fn bits(self, len: u8) -> BitRangeIter {
        BitRangeIter::new(self.to_aligned(), len.into())
    }

    /// zero every bit past the first `len`
    #[must_use]
    fn truncate(self, len: u8) -> Self {
        Self::from_aligned(self.to_aligned() & leading_mask(len))
    }
}

impl Address for Ipv4Addr {
    const WIDTH: u8 = 32;

    fn to_aligned(self) -> u128 {
        u128::from(self.to_bits()) << 96
    }

    #[allow(clippy::cast_possible_truncation)]
    fn from_aligned(bits: u128) -> Self {
        Self::from_bits((bits >> 96) as u32)
    }
}

impl Address for Ipv6Addr {
    const WIDTH: u8 = 128;

    fn to_aligned(self) -> u128 {
        self.to_bits()
    }

    fn from_aligned(bits: u128) -> Self {
        Self::from_bits(bits)
    }
}
