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

//! A serialized cache of a loaded [`Ipam`].
//!
//! A [`Snapshot`] records the SHA-256 digest of the source document it
//! was loaded from. A later invocation can check the digest against the
//! current document with [`Snapshot::is_fresh`] and, if it matches, use
//! the cached database instead of running the load pass again.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::ipam::Ipam;

/// The version of the snapshot format. Snapshots of other versions are
/// treated as stale.
pub const FORMAT: u32 = 1;

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    format: u32,
    digest: String,
    ipam: Ipam,
}

impl Snapshot {
    /// Creates a `Snapshot` of `ipam`, which was loaded from the
    /// document `source`.
    pub fn new(source: &[u8], ipam: Ipam) -> Self {
        Self {
            format: FORMAT,
            digest: digest(source),
            ipam,
        }
    }

    /// Returns whether the snapshot was made from `source` with the
    /// current format.
    pub fn is_fresh(&self, source: &[u8]) -> bool {
        self.format == FORMAT && self.digest == digest(source)
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn ipam(&self) -> &Ipam {
        &self.ipam
    }

    pub fn into_ipam(self) -> Ipam {
        self.ipam
    }

    /// Writes the snapshot to `path`.
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Reads a snapshot from `path`.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

/// Returns the lower-case hexadecimal SHA-256 digest of `source`.
fn digest(source: &[u8]) -> String {
    crate::util::hex(&Sha256::digest(source))
}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// Errors that arise when saving or loading a [`Snapshot`].
#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::Io(ref e) => write!(f, "snapshot I/O failed: {}", e),
            Self::Json(ref e) => write!(f, "snapshot is not valid: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Self::Io(ref e) => Some(e),
            Self::Json(ref e) => Some(e),
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Kind, TagFilter};
    use crate::source::Document;

    const SOURCE: &str = r#"{
        "zones": [
            {"name": "example."},
            {"name": "10.in-addr.arpa."},
            {"name": "8.b.d.0.1.0.0.2.ip6.arpa."}
        ],
        "alternatives": [{"label": "site", "states": ["a", "b"]}],
        "iids": [{"name": "foo.example.", "iid": "::1:2"}],
        "blocks": [
            {"prefix": "10.0.0.0/8", "tags": ["corp"], "blocks": [
                {"prefix": "10.1.0.0/24", "id": "lan", "stub": true}
            ]},
            {"prefix": "2001:db8::/32", "blocks": [
                {"prefix": "2001:db8:1::/64", "id": "lan", "stub": true}
            ]}
        ],
        "networks": [{"name": "lan", "prefixes": ["lan"], "reserve": "full", "hosts": [
            {"name": "foo.example.", "addresses": ["10.1.0.10"], "iid": true,
             "aliases": [{"name": "www.example.", "when": "site:b"}]},
            {"name": "bar.example.", "addresses": ["10.1.0.11"], "hosted_on": ["foo.example."]}
        ]}]
    }"#;

    fn load() -> Ipam {
        let mut document: Document = serde_json::from_str(SOURCE).unwrap();
        document.assign_provenance("db.toml");
        Ipam::load(&document).unwrap()
    }

    #[test]
    fn digest_tracks_source() {
        let snapshot = Snapshot::new(SOURCE.as_bytes(), load());
        assert_eq!(snapshot.digest().len(), 64);
        assert!(snapshot.is_fresh(SOURCE.as_bytes()));
        assert!(!snapshot.is_fresh(b"{}"));
        assert_eq!(
            digest(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn round_trip_preserves_query_results() {
        let ipam = load();
        let path = std::env::temp_dir().join(format!("ipam-snapshot-{}.json", std::process::id()));
        Snapshot::new(SOURCE.as_bytes(), ipam.clone()).save(&path).unwrap();
        let restored = Snapshot::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert!(restored.is_fresh(SOURCE.as_bytes()));
        let restored = restored.into_ipam();
        assert_eq!(restored, ipam);
        for name in ["foo.example.", "www.example.", "bar.example.", "lan", "nope.example."] {
            assert_eq!(restored.name_info(name), ipam.name_info(name));
        }
        for ip in ["10.1.0.10", "10.1.0.0/24", "2001:db8:1::1:2", "10.1.0.200", "192.0.2.1"] {
            assert_eq!(restored.ip_info(ip), ipam.ip_info(ip));
        }
        let filter = TagFilter::parse("corp").unwrap();
        assert_eq!(
            restored.select(Kind::Hosts, &filter),
            ["foo.example.", "bar.example."]
        );
        assert_eq!(restored.warnings(), ipam.warnings());
    }

    #[test]
    fn load_reports_missing_and_corrupt_files() {
        let missing = std::env::temp_dir().join("ipam-snapshot-does-not-exist.json");
        assert!(matches!(Snapshot::load(&missing), Err(Error::Io(_))));

        let path = std::env::temp_dir().join(format!("ipam-snapshot-bad-{}.json", std::process::id()));
        std::fs::write(&path, "{\"format\": 1").unwrap();
        let result = Snapshot::load(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(Error::Json(_))));
    }

    #[test]
    fn load_rejects_inconsistent_registries() {
        let mut value = serde_json::to_value(Snapshot::new(SOURCE.as_bytes(), load())).unwrap();
        let networks = value["ipam"]["networks"].as_array_mut().unwrap();
        let first = networks[0].clone();
        networks.push(first);

        let path = std::env::temp_dir().join(format!("ipam-snapshot-dup-{}.json", std::process::id()));
        std::fs::write(&path, value.to_string()).unwrap();
        let result = Snapshot::load(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(Error::Json(_))));
    }
}
