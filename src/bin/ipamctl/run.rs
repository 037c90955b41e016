// Copyright 2022 Matthew Ingwersen.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you
// may not use this file except in compliance with the License. You may
// obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or
// implied. See the License for the specific language governing
// permissions and limitations under the License.

//! Implements the subcommands.

use std::process;

use anyhow::{anyhow, Context, Result};
use env_logger::Env;
use log::{error, info};
use serde::Serialize;

use ipam::export;
use ipam::query::{IpInfo, NameInfo, QueryError, TagFilter};

use crate::args::{Args, Command};
use crate::config::{self, Config};
use crate::database;

/// Runs the command given by `args`.
pub fn run(args: Args) {
    let filter = match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::init_from_env(Env::new().default_filter_or(filter));

    if let Err(e) = try_running(args) {
        let mut message = String::from("Failed to run:");
        for (i, cause) in e.chain().enumerate() {
            message.push_str(&format!("\n[{}] {}", i + 1, cause));
        }
        message.push_str("\nExiting with failure.");
        error!("{}", message);
        process::exit(1);
    }
}

fn try_running(args: Args) -> Result<()> {
    info!(
        "ipamctl v{}.{}.{} starting.",
        env!("CARGO_PKG_VERSION_MAJOR"),
        env!("CARGO_PKG_VERSION_MINOR"),
        env!("CARGO_PKG_VERSION_PATCH"),
    );

    // Get the configuration, either from the file system or from the
    // command line arguments, as appropriate.
    let config = if let Some(ref config_path) = args.config {
        info!("Loading the configuration from {}.", config_path.display());
        config::load_from_path(config_path).context("failed to load the configuration")?
    } else {
        config::load_from_args(&args).context("failed to load the configuration")?
    };

    match args.command {
        Command::Check => check(&config),
        Command::Export { annotate } => export_zones(&config, annotate || config.annotate),
        Command::Name { json, ref names } => {
            let ipam = database::load(&config, true)?;
            run_batch(names, json, |name| ipam.name_info(name), print_name_info)
        }
        Command::Ip { json, ref addresses } => {
            let ipam = database::load(&config, true)?;
            run_batch(addresses, json, |ip| ipam.ip_info(ip), print_ip_info)
        }
        Command::Select {
            json,
            kind,
            ref filter,
        } => {
            let filter = TagFilter::parse(filter).context("failed to parse the tag filter")?;
            let ipam = database::load(&config, true)?;
            let selected = ipam.select(kind, &filter);
            if json {
                println!("{}", serde_json::to_string_pretty(&selected)?);
            } else {
                for name in selected {
                    println!("{}", name);
                }
            }
            Ok(())
        }
    }
}

/// Loads the document (never from the cache) and reports the result.
fn check(config: &Config) -> Result<()> {
    let ipam = database::load(config, false)?;
    let warnings = ipam.warnings().len();
    println!(
        "{}: {} zones, {} networks, {} hosts, {} {}",
        config.database.display(),
        ipam.zones().len(),
        ipam.networks().len(),
        ipam.hosts().count(),
        warnings,
        if warnings == 1 { "warning" } else { "warnings" },
    );
    Ok(())
}

fn export_zones(config: &Config, annotate: bool) -> Result<()> {
    let ipam = database::load(config, true)?;
    let written = export::export(ipam.zones(), &config.export_dir, annotate)
        .context("failed to export the zones")?;
    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}

/// Looks up each of `items`, printing every result. Failed lookups are
/// reported as they occur and do not stop the batch, but make the
/// batch as a whole fail.
fn run_batch<T: Serialize>(
    items: &[String],
    json: bool,
    lookup: impl Fn(&str) -> Result<T, QueryError>,
    print: fn(&T),
) -> Result<()> {
    let mut failed = 0;
    for item in items {
        match lookup(item) {
            Ok(result) if json => println!("{}", serde_json::to_string_pretty(&result)?),
            Ok(result) => print(&result),
            Err(e) => {
                error!("{}", e);
                failed += 1;
            }
        }
    }
    if failed > 0 {
        Err(anyhow!("{} of {} lookups failed", failed, items.len()))
    } else {
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////
// TEXT OUTPUT                                                        //
////////////////////////////////////////////////////////////////////////

fn print_name_info(info: &NameInfo) {
    println!("{}", info.name);
    if let Some(ref zone) = info.zone {
        if info.is_zone {
            println!("  zone:      {} (apex)", zone);
        } else {
            println!("  zone:      {}", zone);
        }
    }
    if let Some(ref iid) = info.iid {
        println!("  iid:       {}", iid);
    }
    if let Some(ref network) = info.network {
        println!("  network:   {}", network);
    }
    if !info.blocks.is_empty() {
        println!("  blocks:    {}", info.blocks.join(", "));
    }
    if let Some(ref host) = info.host {
        println!("  host in:   {}", host.network);
        let addresses: Vec<String> = host.addresses.iter().map(ToString::to_string).collect();
        print_list("addresses", &addresses);
        print_list("aliases", &host.aliases);
        print_list("hosted on", &host.hosted_on);
        print_list("hosting", &host.hosting);
        print_list("tags", &host.tags);
        if let Some(ref description) = host.description {
            println!("  about:     {}", description);
        }
        if !host.dns {
            println!("  dns:       disabled");
        }
    }
    if let Some(ref host) = info.alias_of {
        println!("  alias of:  {}", host);
    }
    if let Some(ref records) = info.records {
        println!("  records:");
        for line in records.lines() {
            println!("    {}", line);
        }
    }
}

fn print_ip_info(info: &IpInfo) {
    println!("{}", info.query);
    if let Some(ref exact) = info.exact {
        match info.id {
            Some(ref id) => println!("  match:     {} ({})", exact, id),
            None => println!("  match:     {}", exact),
        }
    }
    print_list("within", &info.ancestors);
    if let Some(ref network) = info.network {
        println!("  network:   {}", network);
    }
    print_list("hosts", &info.hosts);
    if let Some(ref canonical) = info.canonical {
        println!("  canonical: {}", canonical);
    }
    if info.reserved {
        println!("  reserved");
    }
}

fn print_list(label: &str, items: &[String]) {
    if !items.is_empty() {
        println!("  {:<10} {}", format!("{}:", label), items.join(", "));
    }
}
