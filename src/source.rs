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

//! The typed records of a database document.
//!
//! A document is deserialized (normally from TOML, by the caller) into
//! a [`Document`], after which [`Document::assign_provenance`] records
//! where each record came from. The loader in [`crate::ipam`] consumes
//! these records; it never sees the markup they were parsed from.

use std::path::PathBuf;

use serde::{de, Deserialize, Deserializer};

use crate::dns::{Ttl, Type};
use crate::thing::Provenance;

////////////////////////////////////////////////////////////////////////
// DOCUMENT                                                           //
////////////////////////////////////////////////////////////////////////

/// A complete database document.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Document {
    #[serde(default)]
    pub zones: Vec<ZoneDef>,
    #[serde(default)]
    pub blocks: Vec<BlockDef>,
    #[serde(default)]
    pub iids: Vec<IidDef>,
    #[serde(default)]
    pub alternatives: Vec<AlternativeDef>,
    #[serde(default)]
    pub networks: Vec<NetworkDef>,
}

impl Document {
    /// Gives every record a [`Provenance`] naming `source` and the
    /// record's path within the document (e.g. `networks[2].hosts[0]`).
    pub fn assign_provenance(&mut self, source: &str) {
        let base = Provenance::new(source);
        for (i, zone) in self.zones.iter_mut().enumerate() {
            zone.provenance = base.at_record(format!("zones[{}]", i));
        }
        for (i, block) in self.blocks.iter_mut().enumerate() {
            block.assign_provenance(&base, format!("blocks[{}]", i));
        }
        for (i, iid) in self.iids.iter_mut().enumerate() {
            iid.provenance = base.at_record(format!("iids[{}]", i));
        }
        for (i, alternative) in self.alternatives.iter_mut().enumerate() {
            alternative.provenance = base.at_record(format!("alternatives[{}]", i));
        }
        for (i, network) in self.networks.iter_mut().enumerate() {
            let path = format!("networks[{}]", i);
            network.provenance = base.at_record(&path);
            for (j, generate) in network.generate.iter_mut().enumerate() {
                generate.provenance = base.at_record(format!("{}.generate[{}]", path, j));
            }
            for (j, host) in network.hosts.iter_mut().enumerate() {
                let path = format!("{}.hosts[{}]", path, j);
                host.provenance = base.at_record(&path);
                for (k, record) in host.records.iter_mut().enumerate() {
                    record.provenance = base.at_record(format!("{}.records[{}]", path, k));
                }
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////
// RECORDS                                                            //
////////////////////////////////////////////////////////////////////////

/// A DNS zone for which records are generated.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ZoneDef {
    pub name: String,
    #[serde(default)]
    pub directory: Option<PathBuf>,
    #[serde(default, deserialize_with = "ttl")]
    pub ttl: Option<Ttl>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(skip)]
    pub provenance: Provenance,
}

/// A prefix of the address map, with the prefixes nested beneath it.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockDef {
    pub prefix: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub stub: bool,
    #[serde(default)]
    pub plen: Option<u8>,
    /// A DNS name at which the prefix is published (APL and PTR).
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "ttl")]
    pub ttl: Option<Ttl>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub blocks: Vec<BlockDef>,
    #[serde(skip)]
    pub provenance: Provenance,
}

impl BlockDef {
    fn assign_provenance(&mut self, base: &Provenance, path: String) {
        for (i, block) in self.blocks.iter_mut().enumerate() {
            block.assign_provenance(base, format!("{}.blocks[{}]", path, i));
        }
        self.provenance = base.at_record(path);
    }
}

/// An IPv6 interface identifier registered for a host name.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IidDef {
    pub name: String,
    pub iid: String,
    #[serde(skip)]
    pub provenance: Provenance,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlternativeDef {
    pub label: String,
    pub states: Vec<String>,
    /// The current state; the first allowed state if unset.
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "ttl")]
    pub ttl: Option<Ttl>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(skip)]
    pub provenance: Provenance,
}

/// How many infrastructure addresses of a network's prefixes to reserve.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReservePolicy {
    #[default]
    None,
    Minimal,
    Full,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkDef {
    pub name: String,
    /// The ids of the stub prefixes making up the network.
    #[serde(default)]
    pub prefixes: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub reserve: ReservePolicy,
    /// Addresses or prefixes to reserve.
    #[serde(default)]
    pub reserved: Vec<String>,
    #[serde(default)]
    pub generate: Vec<GenerateDef>,
    #[serde(default)]
    pub hosts: Vec<HostDef>,
    #[serde(default, deserialize_with = "ttl")]
    pub ttl: Option<Ttl>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(skip)]
    pub provenance: Provenance,
}

/// Hosts generated from a name template over a range of addresses.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerateDef {
    /// The name template. `{n}` is replaced by the address's offset in
    /// the block and `{ip}` by the address with `.` and `:` replaced by
    /// `-`.
    pub template: String,
    pub block: String,
    #[serde(default, deserialize_with = "ttl")]
    pub ttl: Option<Ttl>,
    #[serde(skip)]
    pub provenance: Provenance,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostDef {
    pub name: String,
    #[serde(default)]
    pub addresses: Vec<AddressDef>,
    /// Whether to synthesize an IPv6 address in each of the network's
    /// IPv6 prefixes from the IID registered for the host.
    #[serde(default)]
    pub iid: bool,
    #[serde(default)]
    pub aliases: Vec<AliasDef>,
    #[serde(default)]
    pub hosted_on: Vec<String>,
    #[serde(default)]
    pub records: Vec<RecordDef>,
    #[serde(default = "default_true")]
    pub dns: bool,
    #[serde(default, deserialize_with = "ttl")]
    pub ttl: Option<Ttl>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(skip)]
    pub provenance: Provenance,
}

impl Default for HostDef {
    fn default() -> Self {
        Self {
            name: String::new(),
            addresses: Vec::new(),
            iid: false,
            aliases: Vec::new(),
            hosted_on: Vec::new(),
            records: Vec::new(),
            dns: true,
            ttl: None,
            description: None,
            tags: Vec::new(),
            provenance: Provenance::default(),
        }
    }
}

/// An address of a host: either a bare address string or a table.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(from = "AddressRepr")]
pub struct AddressDef {
    pub address: String,
    /// Whether the host becomes the address's canonical host.
    pub canonical: bool,
    pub when: Option<String>,
}

impl AddressDef {
    pub fn new(address: &str) -> Self {
        Self {
            address: address.to_owned(),
            canonical: true,
            when: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AddressRepr {
    Text(String),
    Table(AddressTable),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct AddressTable {
    address: String,
    #[serde(default = "default_true")]
    canonical: bool,
    #[serde(default)]
    when: Option<String>,
}

impl From<AddressRepr> for AddressDef {
    fn from(repr: AddressRepr) -> Self {
        match repr {
            AddressRepr::Text(address) => Self::new(&address),
            AddressRepr::Table(table) => Self {
                address: table.address,
                canonical: table.canonical,
                when: table.when,
            },
        }
    }
}

/// An alias of a host: either a bare name or a table.
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(from = "AliasRepr")]
pub struct AliasDef {
    pub name: String,
    pub when: Option<String>,
}

impl AliasDef {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            when: None,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AliasRepr {
    Text(String),
    Table(AliasTable),
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct AliasTable {
    name: String,
    #[serde(default)]
    when: Option<String>,
}

impl From<AliasRepr> for AliasDef {
    fn from(repr: AliasRepr) -> Self {
        match repr {
            AliasRepr::Text(name) => Self::new(&name),
            AliasRepr::Table(table) => Self {
                name: table.name,
                when: table.when,
            },
        }
    }
}

/// A raw record owned by a host.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecordDef {
    #[serde(rename = "type")]
    pub rr_type: Type,
    pub rdata: String,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub when: Option<String>,
    #[serde(skip)]
    pub provenance: Provenance,
}

fn default_true() -> bool {
    true
}

/// Deserializes a TTL given either as a number of seconds or as
/// unit-suffixed text such as `1h30m`.
fn ttl<'de, D>(deserializer: D) -> Result<Option<Ttl>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Seconds(u64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Seconds(seconds)) => Ttl::from_seconds(seconds)
            .map(Some)
            .map_err(de::Error::custom),
        Some(Raw::Text(text)) => text.parse().map(Some).map_err(de::Error::custom),
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
