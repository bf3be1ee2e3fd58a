// SPDX-FileCopyrightText: 2025 xfnw
//
// SPDX-License-Identifier: MIT

use crate::{IpPrefix, ParseError};

/// one network read out of a route table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteLine {
    pub prefix: IpPrefix,
    pub label: String,
}

/// parse a single line of a route table
///
/// lines look like `10.0.0.0/8 gateway`: a network in cidr notation,
/// optionally followed by a label that runs up to the next whitespace or
/// slash. the network's own text is used as the label when there is none.
/// everything after a `#` is ignored, and blank lines give `Ok(None)`.
///
/// host bits set past the prefix length are cleared, unless `strict` is set,
/// in which case they are an error.
pub fn parse_route_line(line: &str, strict: bool) -> Result<Option<RouteLine>, ParseError> {
    let line = line.split_once('#').map_or(line, |(keep, _)| keep).trim();
    let Some((cidr, rest)) = line
        .split_once(char::is_whitespace)
        .or((!line.is_empty()).then_some((line, "")))
    else {
        return Ok(None);
    };

    let prefix = if strict {
        IpPrefix::parse_strict(cidr)?
    } else {
        cidr.parse()?
    };
    let label = rest
        .trim_start()
        .split(|c: char| c.is_whitespace() || c == '/')
        .next()
        .filter(|l| !l.is_empty())
        .unwrap_or(cidr);

    Ok(Some(RouteLine {
        prefix,
        label: label.to_string(),
    }))
}
