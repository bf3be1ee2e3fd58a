// SPDX-FileCopyrightText: 2025 xfnw
//
// SPDX-License-Identifier: MIT

use crate::{Address, BitRangeIter, leading_mask};
use std::{
    fmt,
    net::{IpAddr, Ipv4Addr, Ipv6Addr},
    str::FromStr,
};

#[derive(Debug, Clone, PartialEq, Eq, foxerror::FoxError)]
pub enum InvalidPrefix {
    /// prefix length does not fit in the address
    LengthOutOfRange { len: u8, width: u8 },
    /// address has bits set past the prefix length
    NotCanonical(String),
}

#[derive(Debug, Clone, PartialEq, Eq, foxerror::FoxError)]
pub enum ParseError {
    /// missing slash before the prefix length
    MissingSlash,
    /// invalid address
    #[err(from)]
    Addr(std::net::AddrParseError),
    /// invalid prefix length
    #[err(from)]
    Length(std::num::ParseIntError),
    /// invalid network
    #[err(from)]
    Prefix(InvalidPrefix),
}

/// a network, as a base address and the number of leading bits that identify it
///
/// the usual form has every bit past the prefix length unset. values built
/// with [`NetworkPrefix::from_parts`] are not checked, use
/// [`NetworkPrefix::check`] or one of the other constructors when that
/// matters.
///
/// ordering is by base address, then by prefix length, so a network sorts
/// right before the networks it contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NetworkPrefix<A> {
    base: A,
    len: u8,
}

impl<A: Address> NetworkPrefix<A> {
    /// assemble a network without any validation
    #[must_use]
    pub const fn from_parts(base: A, len: u8) -> Self {
        Self { base, len }
    }

    /// create a network, rejecting bad lengths and set host bits
    pub fn new(base: A, len: u8) -> Result<Self, InvalidPrefix> {
        let prefix = Self::from_parts(base, len);
        prefix.check()?;
        Ok(prefix)
    }

    /// create a network, clearing any host bits instead of complaining
    pub fn truncated(base: A, len: u8) -> Result<Self, InvalidPrefix> {
        Self::new(base.truncate(len), len)
    }

    /// the network covering every address
    #[must_use]
    pub fn everything() -> Self {
        Self::from_parts(A::from_aligned(0), 0)
    }

    /// a network of exactly one address
    #[must_use]
    pub fn host(addr: A) -> Self {
        Self::from_parts(addr, A::WIDTH)
    }

    /// make sure the prefix length fits and no host bits are set
    pub fn check(&self) -> Result<(), InvalidPrefix> {
        if self.len > A::WIDTH {
            return Err(InvalidPrefix::LengthOutOfRange {
                len: self.len,
                width: A::WIDTH,
            });
        }
        if !self.is_canonical() {
            return Err(InvalidPrefix::NotCanonical(self.to_string()));
        }
        Ok(())
    }

    #[must_use]
    pub fn is_canonical(&self) -> bool {
        self.base.truncate(self.len) == self.base
    }

    #[must_use]
    pub fn base(&self) -> A {
        self.base
    }

    #[must_use]
    pub fn prefix_len(&self) -> u8 {
        self.len
    }

    /// iterate over the bits that identify the network
    pub fn bits(&self) -> BitRangeIter {
        self.base.bits(self.len)
    }

    /// whether every address of `other` is also in this network
    ///
    /// a network contains itself
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        let mask = leading_mask(self.len);
        self.len <= other.len && self.base.to_aligned() & mask == other.base.to_aligned() & mask
    }

    #[must_use]
    pub fn contains_addr(&self, addr: A) -> bool {
        self.contains(&Self::host(addr))
    }

    /// the last address in the network
    #[must_use]
    pub fn last(&self) -> A {
        let host_bits = !leading_mask(self.len) & leading_mask(A::WIDTH);
        A::from_aligned(self.base.to_aligned() | host_bits)
    }

    /// parse `address/length`, rejecting set host bits
    pub fn parse_strict(s: &str) -> Result<Self, ParseError> {
        parse_with(s, true)
    }
}

fn split_cidr(s: &str) -> Result<(&str, u8), ParseError> {
    let (addr, len) = s.split_once('/').ok_or(ParseError::MissingSlash)?;
    Ok((addr, len.parse()?))
}

fn parse_with<A: Address>(s: &str, strict: bool) -> Result<NetworkPrefix<A>, ParseError> {
    let (addr, len) = split_cidr(s)?;
    let addr: A = addr.parse()?;
    Ok(if strict {
        NetworkPrefix::new(addr, len)?
    } else {
        NetworkPrefix::truncated(addr, len)?
    })
}

impl<A: Address> fmt::Display for NetworkPrefix<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.len)
    }
}

/// parses `address/length`, clearing any host bits
impl<A: Address> FromStr for NetworkPrefix<A> {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_with(s, false)
    }
}

/// a network of either address family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IpPrefix {
    V4(NetworkPrefix<Ipv4Addr>),
    V6(NetworkPrefix<Ipv6Addr>),
}

impl IpPrefix {
    /// create a network, rejecting bad lengths and set host bits
    pub fn new(addr: IpAddr, len: u8) -> Result<Self, InvalidPrefix> {
        Ok(match addr {
            IpAddr::V4(addr) => Self::V4(NetworkPrefix::new(addr, len)?),
            IpAddr::V6(addr) => Self::V6(NetworkPrefix::new(addr, len)?),
        })
    }

    /// create a network, clearing any host bits instead of complaining
    pub fn truncated(addr: IpAddr, len: u8) -> Result<Self, InvalidPrefix> {
        Ok(match addr {
            IpAddr::V4(addr) => Self::V4(NetworkPrefix::truncated(addr, len)?),
            IpAddr::V6(addr) => Self::V6(NetworkPrefix::truncated(addr, len)?),
        })
    }

    /// parse `address/length`, rejecting set host bits
    pub fn parse_strict(s: &str) -> Result<Self, ParseError> {
        Self::parse_with(s, true)
    }

    fn parse_with(s: &str, strict: bool) -> Result<Self, ParseError> {
        let (addr, len) = split_cidr(s)?;
        let addr: IpAddr = addr.parse()?;
        Ok(if strict {
            Self::new(addr, len)?
        } else {
            Self::truncated(addr, len)?
        })
    }

    #[must_use]
    pub fn base(&self) -> IpAddr {
        match self {
            Self::V4(p) => p.base().into(),
            Self::V6(p) => p.base().into(),
        }
    }

    #[must_use]
    pub fn prefix_len(&self) -> u8 {
        match self {
            Self::V4(p) => p.prefix_len(),
            Self::V6(p) => p.prefix_len(),
        }
    }

    /// whether every address of `other` is also in this network
    ///
    /// networks of different families never contain each other
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::V4(a), Self::V4(b)) => a.contains(b),
            (Self::V6(a), Self::V6(b)) => a.contains(b),
            _ => false,
        }
    }

    #[must_use]
    pub fn contains_addr(&self, addr: IpAddr) -> bool {
        match (self, addr) {
            (Self::V4(p), IpAddr::V4(addr)) => p.contains_addr(addr),
            (Self::V6(p), IpAddr::V6(addr)) => p.contains_addr(addr),
            _ => false,
        }
    }
}

impl From<NetworkPrefix<Ipv4Addr>> for IpPrefix {
    fn from(prefix: NetworkPrefix<Ipv4Addr>) -> Self {
        Self::V4(prefix)
    }
}

impl From<NetworkPrefix<Ipv6Addr>> for IpPrefix {
    fn from(prefix: NetworkPrefix<Ipv6Addr>) -> Self {
        Self::V6(prefix)
    }
}

impl fmt::Display for IpPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V4(p) => p.fmt(f),
            Self::V6(p) => p.fmt(f),
        }
    }
}

/// parses `address/length`, clearing any host bits
impl FromStr for IpPrefix {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_with(s, false)
    }
}

#[cfg(feature = "serde")]
impl<A: Address> serde::Serialize for NetworkPrefix<A> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for IpPrefix {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}
