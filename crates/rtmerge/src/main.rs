// SPDX-FileCopyrightText: 2025 xfnw
//
// SPDX-License-Identifier: MPL-2.0

use argh::{FromArgs, from_env};
use route_trie::{DuplicatePolicy, RouteTable};
use std::{io::Write, net::IpAddr, path::PathBuf, process::ExitCode};

mod ingest;
mod logging;
mod output;
mod query;

/// merge route tables into a minimal set of networks and look up addresses in it
#[derive(Debug, FromArgs)]
#[argh(help_triggers("-h", "--help"))]
struct Opt {
    /// reject networks with host bits set instead of clearing them
    #[argh(switch, short = 's')]
    strict: bool,
    /// skip malformed lines instead of giving up
    #[argh(switch, short = 'k')]
    keep_going: bool,
    /// let a repeated network replace the label of the stored one
    #[argh(switch)]
    replace_duplicates: bool,
    /// address to look up, may be repeated
    #[argh(option, short = 'a')]
    addr: Vec<IpAddr>,
    /// also look up addresses read from stdin, one per line
    #[argh(switch)]
    stdin: bool,
    /// print the merged table (the default when nothing is looked up)
    #[argh(switch, short = 'd')]
    dump: bool,
    /// print json instead of text
    #[argh(switch, short = 'j')]
    json: bool,
    /// log what happens to every line
    #[argh(switch, short = 'v')]
    verbose: bool,
    /// route tables to merge
    #[argh(positional)]
    files: Vec<PathBuf>,
}

#[derive(Debug, foxerror::FoxError)]
enum Error {
    /// no route tables given
    NoInput,
    /// could not load route table
    #[err(from)]
    Ingest(ingest::Error),
    /// could not read addresses
    #[err(from)]
    Query(query::Error),
    /// could not write output
    #[err(from)]
    Io(std::io::Error),
    /// could not serialize output
    #[err(from)]
    Json(serde_json::Error),
}

fn main() -> ExitCode {
    let opt: Opt = from_env();
    logging::init(opt.verbose);

    match run(&opt) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::from(2)
        }
    }
}

fn run(opt: &Opt) -> Result<ExitCode, Error> {
    if opt.files.is_empty() {
        return Err(Error::NoInput);
    }

    let policy = if opt.replace_duplicates {
        DuplicatePolicy::Replace
    } else {
        DuplicatePolicy::KeepExisting
    };
    let options = ingest::Options {
        strict: opt.strict,
        keep_going: opt.keep_going,
    };
    let mut table = RouteTable::with_duplicate_policy(policy);
    for path in &opt.files {
        let stats = ingest::read_file(&mut table, path, options)?;
        tracing::info!("{}: {stats}", path.display());
    }
    tracing::info!("{} networks after merging", table.len());

    let mut addrs = opt.addr.clone();
    if opt.stdin {
        query::read_addresses(std::io::stdin().lock(), opt.keep_going, &mut addrs)?;
    }

    let mut report = output::Report::default();
    if opt.dump || (opt.addr.is_empty() && !opt.stdin) {
        report.table = Some(table.iter().map(output::Route::from).collect());
    }
    let mut code = ExitCode::SUCCESS;
    if opt.stdin || !addrs.is_empty() {
        let lookups = query::lookup(&table, &addrs);
        if lookups.iter().any(|l| l.networks.is_empty()) {
            code = ExitCode::FAILURE;
        }
        report.lookups = Some(lookups);
    }

    let mut out = std::io::stdout().lock();
    if opt.json {
        serde_json::to_writer_pretty(&mut out, &report)?;
        writeln!(out)?;
    } else {
        report.write_text(&mut out)?;
    }
    out.flush()?;

    Ok(code)
}
