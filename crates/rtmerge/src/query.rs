// SPDX-FileCopyrightText: 2025 xfnw
//
// SPDX-License-Identifier: MPL-2.0

use crate::output::{Lookup, Route};
use rayon::prelude::*;
use route_trie::RouteTable;
use std::{
    io::{self, BufRead},
    net::IpAddr,
};

#[derive(Debug, foxerror::FoxError)]
pub enum Error {
    /// could not read addresses
    #[err(from)]
    Read(io::Error),
    /// invalid address
    Address(String, std::net::AddrParseError),
}

/// read one address per line, ignoring blank lines and `#` comments
pub fn read_addresses(
    reader: impl BufRead,
    keep_going: bool,
    out: &mut Vec<IpAddr>,
) -> Result<(), Error> {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) if keep_going && e.kind() == io::ErrorKind::InvalidData => {
                tracing::warn!("skipping address line: {e}");
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        let text = line.split_once('#').map_or(line.as_str(), |(keep, _)| keep).trim();
        if text.is_empty() {
            continue;
        }
        match text.parse() {
            Ok(addr) => out.push(addr),
            Err(e) if keep_going => tracing::warn!("skipping address {text:?}: {e}"),
            Err(e) => return Err(Error::Address(text.to_string(), e)),
        }
    }
    Ok(())
}

/// find the networks containing each address
///
/// the table is not touched while looking things up, so the addresses are
/// spread over rayon's pool. results keep the order of `addrs`.
pub fn lookup<'a>(table: &'a RouteTable<String>, addrs: &[IpAddr]) -> Vec<Lookup<'a>> {
    addrs
        .par_iter()
        .map(|&address| Lookup {
            address,
            networks: table
                .containing_networks(address)
                .into_iter()
                .map(Route::from)
                .collect(),
        })
        .collect()
}
