// SPDX-FileCopyrightText: 2025 xfnw
//
// SPDX-License-Identifier: MPL-2.0

use route_trie::{IpPrefix, RouteEntry};
use serde::Serialize;
use std::{io::Write, net::IpAddr};

#[derive(Debug, Clone, Serialize)]
pub struct Route<'a> {
    pub prefix: IpPrefix,
    pub label: &'a str,
}

impl<'a> From<RouteEntry<IpPrefix, &'a String>> for Route<'a> {
    fn from(entry: RouteEntry<IpPrefix, &'a String>) -> Self {
        let (prefix, label) = entry.into_parts();
        Self { prefix, label }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Lookup<'a> {
    pub address: IpAddr,
    pub networks: Vec<Route<'a>>,
}

/// everything that gets printed
#[derive(Debug, Default, Serialize)]
pub struct Report<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<Vec<Route<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lookups: Option<Vec<Lookup<'a>>>,
}

impl Report<'_> {
    /// one line per network, then one line per match
    ///
    /// addresses without any match get a `-` where the network would be
    pub fn write_text(&self, out: &mut impl Write) -> std::io::Result<()> {
        for route in self.table.iter().flatten() {
            writeln!(out, "{} {}", route.prefix, route.label)?;
        }
        for lookup in self.lookups.iter().flatten() {
            if lookup.networks.is_empty() {
                writeln!(out, "{} -", lookup.address)?;
            }
            for route in &lookup.networks {
                writeln!(out, "{} {} {}", lookup.address, route.prefix, route.label)?;
            }
        }
        Ok(())
    }
}
