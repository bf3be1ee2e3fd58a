// SPDX-FileCopyrightText: 2025 xfnw
//
// SPDX-License-Identifier: MPL-2.0

use route_trie::{MergeOutcome, ParseError, RouteTable, parse_route_line};
use std::{
    fmt,
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

#[derive(Debug, PartialEq, Eq)]
pub struct LineError {
    file: String,
    line: usize,
    error: ParseError,
}

impl fmt::Display for LineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.file, self.line, self.error)
    }
}

#[derive(Debug, foxerror::FoxError)]
pub enum Error {
    /// could not open route table
    Open(String, io::Error),
    /// could not read route table
    Read(String, io::Error),
    /// invalid route
    #[err(from)]
    Route(LineError),
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Options {
    /// reject host bits instead of clearing them
    pub strict: bool,
    /// warn about bad lines instead of failing
    pub keep_going: bool,
}

/// what happened to the lines of one route table
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub inserted: usize,
    pub subsumed: usize,
    pub skipped: usize,
    pub replaced: usize,
    pub rejected: usize,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} inserted, {} merged away, {} already covered, {} relabelled, {} rejected",
            self.inserted, self.subsumed, self.skipped, self.replaced, self.rejected
        )
    }
}

/// merge every route in the file at `path` into `table`
pub fn read_file(
    table: &mut RouteTable<String>,
    path: &Path,
    options: Options,
) -> Result<Stats, Error> {
    let name = path.display().to_string();
    let file = File::open(path).map_err(|e| Error::Open(name.clone(), e))?;
    read_routes(table, BufReader::new(file), &name, options)
}

/// merge every route read from `reader` into `table`
///
/// `name` is only used for messages
pub fn read_routes(
    table: &mut RouteTable<String>,
    reader: impl BufRead,
    name: &str,
    options: Options,
) -> Result<Stats, Error> {
    let mut stats = Stats::default();

    for (n, line) in reader.lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            // the bad bytes are already consumed, so the next line reads fine
            Err(e) if options.keep_going && e.kind() == io::ErrorKind::InvalidData => {
                tracing::warn!("skipping {name}:{}: {e}", n + 1);
                stats.rejected += 1;
                continue;
            }
            Err(e) => return Err(Error::Read(name.to_string(), e)),
        };
        let context = |error: ParseError| LineError {
            file: name.to_string(),
            line: n + 1,
            error,
        };
        tracing::debug!("{name}:{}: read {line:?}", n + 1);

        let route = match parse_route_line(&line, options.strict) {
            Ok(Some(route)) => route,
            Ok(None) => continue,
            Err(e) if options.keep_going => {
                tracing::warn!("skipping {}", context(e));
                stats.rejected += 1;
                continue;
            }
            Err(e) => return Err(context(e).into()),
        };

        let prefix = route.prefix;
        let outcome = table
            .insert(prefix, route.label)
            .map_err(|e| context(e.into()))?;
        match outcome {
            MergeOutcome::Inserted { subsumed } => {
                tracing::debug!("inserted {prefix}");
                for entry in &subsumed {
                    tracing::debug!(
                        "{} ({}) merged into {prefix}",
                        entry.prefix(),
                        entry.payload()
                    );
                }
                stats.inserted += 1;
                stats.subsumed += subsumed.len();
            }
            MergeOutcome::Skipped { covering, .. } => {
                tracing::debug!("{prefix} already covered by {covering}");
                stats.skipped += 1;
            }
            MergeOutcome::Replaced { previous } => {
                tracing::debug!("{prefix} relabelled, was {previous}");
                stats.replaced += 1;
            }
        }
    }

    Ok(stats)
}
