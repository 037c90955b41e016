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

//! Implements command-line argument parsing.

use std::path::PathBuf;

use clap::{ArgAction, ArgGroup, Parser, Subcommand};

use ipam::dns::Ttl;
use ipam::query::Kind;

/// Parses the command line arguments.
pub fn parse() -> Args {
    Args::parse()
}

/// The IPAM database tool
#[derive(Debug, Parser)]
#[clap(author, version)]
#[clap(group(ArgGroup::new("source").required(true).args(["config", "database"])))]
pub struct Args {
    /// Set the configuration file to use
    #[clap(
        long,
        conflicts_with_all = ["database", "cache", "export_dir", "default_ttl"],
        value_name = "FILE"
    )]
    pub config: Option<PathBuf>,

    /// Set the database document to load
    #[clap(long, value_name = "FILE")]
    pub database: Option<PathBuf>,

    /// Cache the loaded database in a snapshot file
    #[clap(long, value_name = "FILE")]
    pub cache: Option<PathBuf>,

    /// Set the directory zones without their own directory export to
    #[clap(long, value_name = "DIR")]
    pub export_dir: Option<PathBuf>,

    /// Set the default TTL of zones that do not set one
    #[clap(long, value_name = "TTL")]
    pub default_ttl: Option<Ttl>,

    /// Log more (-v for progress, -vv for debugging output)
    #[clap(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load the database and report any warnings
    Check,

    /// Write every zone to a zone file fragment
    Export {
        /// Annotate each record with where it was defined
        #[clap(long)]
        annotate: bool,
    },

    /// Look up domain names
    Name {
        /// Print results as JSON
        #[clap(long)]
        json: bool,

        #[clap(required = true, value_name = "NAME")]
        names: Vec<String>,
    },

    /// Look up IP addresses and prefixes
    Ip {
        /// Print results as JSON
        #[clap(long)]
        json: bool,

        #[clap(required = true, value_name = "IP[/LEN]")]
        addresses: Vec<String>,
    },

    /// List the blocks, nets, subnets, or hosts matching a tag filter
    Select {
        /// Print results as JSON
        #[clap(long)]
        json: bool,

        /// What to select: blocks, nets, subnets, or hosts
        #[clap(value_parser)]
        kind: Kind,

        /// Tags to require, or to exclude with a `!` prefix
        #[clap(default_value = "", value_name = "TAG,!TAG,...")]
        filter: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_require_a_database_source() {
        assert!(Args::try_parse_from(["ipamctl", "check"]).is_err());
        assert!(Args::try_parse_from(["ipamctl", "--database", "db.toml", "check"]).is_ok());
        assert!(Args::try_parse_from([
            "ipamctl",
            "--config",
            "ipam.toml",
            "--database",
            "db.toml",
            "check"
        ])
        .is_err());
    }

    #[test]
    fn select_parses_kind_and_filter() {
        let args = Args::try_parse_from([
            "ipamctl",
            "--database",
            "db.toml",
            "-vv",
            "select",
            "hosts",
            "corp,!lab",
        ])
        .unwrap();
        assert_eq!(args.verbose, 2);
        match args.command {
            Command::Select { json, kind, filter } => {
                assert!(!json);
                assert_eq!(kind, Kind::Hosts);
                assert_eq!(filter, "corp,!lab");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn default_ttl_accepts_unit_suffixes() {
        let args =
            Args::try_parse_from(["ipamctl", "--database", "db.toml", "--default-ttl", "1h", "check"])
                .unwrap();
        assert_eq!(args.default_ttl, Some(Ttl::from(3600)));
    }
}
