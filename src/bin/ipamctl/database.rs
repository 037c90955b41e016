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

//! Implements database loading, through the snapshot cache when one is
//! configured.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::{debug, info, warn};

use ipam::ipam::{Ipam, LoadOptions};
use ipam::snapshot::Snapshot;
use ipam::source::Document;

use crate::config::Config;

/// Loads the database configured in `config`. If `use_cache` is set and
/// the configured cache holds a snapshot of the current document, the
/// snapshot is used instead of loading the document. After a load, the
/// cache (if any) is refreshed.
pub fn load(config: &Config, use_cache: bool) -> Result<Ipam> {
    let source = fs::read(&config.database).context("failed to read the database document")?;

    if use_cache {
        if let Some(ref cache) = config.cache {
            match Snapshot::load(cache) {
                Ok(snapshot) if snapshot.is_fresh(&source) => {
                    debug!("Using the cached database in {}.", cache.display());
                    let ipam = snapshot.into_ipam();
                    log_cached_warnings(&ipam);
                    return Ok(ipam);
                }
                Ok(_) => debug!("The cache in {} is stale.", cache.display()),
                Err(e) => debug!("The cache in {} is unusable: {}", cache.display(), e),
            }
        }
    }

    let ipam = load_document(&config.database, &source, config)?;
    match config.cache {
        Some(ref cache) => {
            let snapshot = Snapshot::new(&source, ipam);
            if let Err(e) = snapshot.save(cache) {
                warn!("Failed to write the cache {}: {}", cache.display(), e);
            }
            Ok(snapshot.into_ipam())
        }
        None => Ok(ipam),
    }
}

/// Logs the warnings stored in a cached database, which were last
/// logged when the database was loaded. Returns how many there were.
fn log_cached_warnings(ipam: &Ipam) -> usize {
    for warning in ipam.warnings() {
        warn!("{}", warning);
    }
    ipam.warnings().len()
}

/// Parses and loads the document `source`, read from `path`.
fn load_document(path: &Path, source: &[u8], config: &Config) -> Result<Ipam> {
    debug!("Loading the database from {}.", path.display());
    let mut document: Document =
        toml::from_slice(source).context("failed to parse the database document")?;
    document.assign_provenance(&path.display().to_string());

    let options = LoadOptions {
        default_ttl: config.default_ttl.0,
    };
    let ipam = Ipam::load_with(&document, &options).context("failed to load the database")?;
    info!(
        "Loaded {} zones, {} networks, and {} hosts with {} warnings.",
        ipam.zones().len(),
        ipam.networks().len(),
        ipam.hosts().count(),
        ipam.warnings().len(),
    );
    Ok(ipam)
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigTtl;
    use ipam::dns::Ttl;

    const DOCUMENT: &str = r#"
        [[zones]]
        name = "example."

        [[zones]]
        name = "10.in-addr.arpa."

        [[blocks]]
        prefix = "10.0.0.0/8"

        [[blocks.blocks]]
        prefix = "10.1.0.0/24"
        id = "lan"
        stub = true

        [[networks]]
        name = "lan"
        prefixes = ["lan"]

        [[networks.hosts]]
        name = "foo.example."
        addresses = ["10.1.0.10"]

        [[networks.hosts]]
        name = "bare.example."
    "#;

    fn config(dir: &Path) -> Config {
        Config {
            database: dir.join("db.toml"),
            cache: Some(dir.join("cache.json")),
            export_dir: dir.to_owned(),
            default_ttl: ConfigTtl(Ttl::from(300)),
            annotate: false,
        }
    }

    #[test]
    fn load_writes_and_reuses_the_cache() {
        let dir = std::env::temp_dir().join(format!("ipamctl-database-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let config = config(&dir);
        fs::write(&config.database, DOCUMENT).unwrap();

        let loaded = load(&config, true).unwrap();
        assert!(loaded.host("foo.example.").is_some());
        let snapshot = Snapshot::load(config.cache.as_ref().unwrap()).unwrap();
        assert!(snapshot.is_fresh(DOCUMENT.as_bytes()));
        assert_eq!(snapshot.ipam(), &loaded);
        let cached = load(&config, true).unwrap();
        assert_eq!(cached, loaded);
        assert_eq!(cached.warnings(), loaded.warnings());
        assert_eq!(log_cached_warnings(&cached), 1);

        // A changed document invalidates the cache.
        let changed = DOCUMENT.replace("10.1.0.10", "10.1.0.20");
        fs::write(&config.database, &changed).unwrap();
        let reloaded = load(&config, true).unwrap();
        fs::remove_dir_all(&dir).unwrap();
        assert_ne!(reloaded, loaded);
        assert_eq!(
            reloaded.ip_info("10.1.0.20").unwrap().hosts,
            ["foo.example."]
        );
    }

    #[test]
    fn load_reports_parse_errors() {
        let dir = std::env::temp_dir().join(format!("ipamctl-database-bad-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let config = config(&dir);
        fs::write(&config.database, "[[zones]]\nnmae = \"example.\"\n").unwrap();
        let result = load(&config, true);
        fs::remove_dir_all(&dir).unwrap();
        assert!(result.is_err());
    }
}
