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

//! Read-only queries over a loaded [`Ipam`].
//!
//! The results are plain, serializable data shapes, so front ends can
//! print them as text or emit them as JSON without further access to
//! the registries.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use serde::Serialize;

use crate::addr::{self, Containable, Match};
use crate::ipam::Ipam;
use crate::network::Host;
use crate::thing::{AsThing, TagSet};
use crate::util::fqdn;

////////////////////////////////////////////////////////////////////////
// RESULT SHAPES                                                      //
////////////////////////////////////////////////////////////////////////

/// Everything known about a domain name.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct NameInfo {
    pub name: String,
    /// The zone containing the name.
    pub zone: Option<String>,
    /// Whether the name is itself a zone.
    pub is_zone: bool,
    /// The IID registered under the name.
    pub iid: Option<String>,
    /// The network with this name.
    pub network: Option<String>,
    /// The prefixes whose id is this name.
    pub blocks: Vec<String>,
    pub host: Option<HostInfo>,
    /// The host this name is an alias of.
    pub alias_of: Option<String>,
    /// The name's records, in master-file syntax.
    pub records: Option<String>,
}

/// The details of a [`Host`].
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct HostInfo {
    pub name: String,
    pub network: String,
    pub dns: bool,
    pub addresses: Vec<IpAddr>,
    pub aliases: Vec<String>,
    pub hosted_on: Vec<String>,
    pub hosting: Vec<String>,
    pub tags: Vec<String>,
    pub description: Option<String>,
}

impl From<&Host> for HostInfo {
    fn from(host: &Host) -> Self {
        Self {
            name: host.name().to_owned(),
            network: host.network().to_owned(),
            dns: host.dns(),
            addresses: host.addresses().to_vec(),
            aliases: host.aliases().iter().map(|a| a.name().to_owned()).collect(),
            hosted_on: host.hosted_on().to_vec(),
            hosting: host.hosting().to_vec(),
            tags: host.tags().iter().map(str::to_owned).collect(),
            description: host.description().map(str::to_owned),
        }
    }
}

/// Everything known about an address or prefix.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct IpInfo {
    /// The queried range, in canonical form.
    pub query: String,
    /// The prefix or address identical to the queried range.
    pub exact: Option<String>,
    /// The prefixes strictly containing the queried range, outermost
    /// first.
    pub ancestors: Vec<String>,
    /// The network of the most specific stub prefix containing the
    /// range.
    pub network: Option<String>,
    /// For an address: the hosts bound to it.
    pub hosts: Vec<String>,
    pub canonical: Option<String>,
    pub reserved: bool,
    /// The id of the exact match.
    pub id: Option<String>,
}

////////////////////////////////////////////////////////////////////////
// SELECTION                                                          //
////////////////////////////////////////////////////////////////////////

/// The kinds of entities [`Ipam::select`] chooses from.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Kind {
    /// Prefixes that are not stubs.
    Blocks,
    /// Stub prefixes.
    Nets,
    /// Networks.
    Subnets,
    Hosts,
}

impl FromStr for Kind {
    type Err = QueryError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text.trim().to_ascii_lowercase().as_str() {
            "blocks" => Ok(Self::Blocks),
            "nets" => Ok(Self::Nets),
            "subnets" => Ok(Self::Subnets),
            "hosts" => Ok(Self::Hosts),
            _ => Err(QueryError::InvalidInput(text.to_owned())),
        }
    }
}

/// A tag filter such as `a,b,!c`: every listed tag is required, and
/// every `!`-prefixed tag is excluded. The empty filter matches
/// everything.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TagFilter {
    required: Vec<String>,
    excluded: Vec<String>,
}

impl TagFilter {
    pub fn parse(text: &str) -> Result<Self, QueryError> {
        let mut filter = Self::default();
        for entry in text.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let (list, tag) = match entry.strip_prefix('!') {
                Some(tag) => (&mut filter.excluded, tag.trim()),
                None => (&mut filter.required, entry),
            };
            if tag.is_empty() || tag.contains(char::is_whitespace) {
                return Err(QueryError::InvalidInput(text.to_owned()));
            }
            list.push(tag.to_ascii_lowercase());
        }
        Ok(filter)
    }

    pub fn matches(&self, tags: &TagSet) -> bool {
        self.required.iter().all(|tag| tags.contains(tag))
            && !self.excluded.iter().any(|tag| tags.contains(tag))
    }
}

////////////////////////////////////////////////////////////////////////
// QUERIES                                                            //
////////////////////////////////////////////////////////////////////////

impl Ipam {
    /// Collects everything known about the name `text`.
    pub fn name_info(&self, text: &str) -> Result<NameInfo, QueryError> {
        let bare = text.trim().trim_end_matches('.');
        if bare.is_empty() {
            return Err(QueryError::InvalidInput(text.to_owned()));
        }
        let name = fqdn(bare);

        let mut info = NameInfo {
            zone: self
                .zones()
                .lookup_fqdn(&name)
                .map(|(zone, _)| zone.name().to_owned()),
            is_zone: self.zones().lookup(&name).is_some(),
            iid: self.iids().lookup(&name).map(|iid| iid.text()),
            network: self.network(bare).map(|n| n.name().to_owned()),
            blocks: self
                .map()
                .lookup_by_id(bare, false)
                .iter()
                .map(|p| p.name().to_owned())
                .collect(),
            host: self.host(&name).map(HostInfo::from),
            alias_of: self.alias_owner(&name).map(|h| h.name().to_owned()),
            records: self.zones().render_name(&name, false),
            name,
        };
        if info.blocks.is_empty() {
            info.blocks = self
                .map()
                .lookup_by_id(&info.name, false)
                .iter()
                .map(|p| p.name().to_owned())
                .collect();
        }

        let found = info.is_zone
            || info.iid.is_some()
            || info.network.is_some()
            || !info.blocks.is_empty()
            || info.host.is_some()
            || info.alias_of.is_some()
            || info.records.is_some();
        if found {
            Ok(info)
        } else {
            Err(QueryError::NotFound(info.name))
        }
    }

    /// Collects everything known about the address or prefix `text`.
    pub fn ip_info(&self, text: &str) -> Result<IpInfo, QueryError> {
        let net = addr::parse_net(text).map_err(|_| QueryError::InvalidInput(text.to_owned()))?;
        let lookup = self.map().lookup_by_ip(&net);
        let mut info = IpInfo {
            query: net.to_string(),
            ancestors: self
                .map()
                .ancestors(&net)
                .iter()
                .map(|p| p.name().to_owned())
                .collect(),
            ..Default::default()
        };

        match lookup.exact {
            Some(Match::Prefix(prefix)) => {
                info.exact = Some(prefix.name().to_owned());
                info.id = prefix.id().map(str::to_owned);
                info.network = prefix.network().map(str::to_owned);
            }
            Some(Match::Address(address)) => {
                info.exact = Some(address.name().to_owned());
                info.id = address.id().map(str::to_owned);
                info.hosts = address.hosts().to_vec();
                info.canonical = address.canonical_host().map(str::to_owned);
                info.reserved = address.is_reserved();
            }
            None => {
                if info.ancestors.is_empty() {
                    return Err(QueryError::NotFound(info.query));
                }
            }
        }
        if info.network.is_none() {
            info.network = self
                .map()
                .ancestors(&net)
                .into_iter()
                .rev()
                .find(|p| p.is_stub() && p.contains_net(&net))
                .and_then(|p| p.network())
                .map(str::to_owned);
        }
        Ok(info)
    }

    /// Returns the names of the entities of `kind` whose tags match
    /// `filter`. Prefixes are listed in address-map order, networks and
    /// hosts in load order.
    pub fn select(&self, kind: Kind, filter: &TagFilter) -> Vec<String> {
        match kind {
            Kind::Blocks | Kind::Nets => self
                .map()
                .walk()
                .into_iter()
                .filter(|p| p.is_stub() == (kind == Kind::Nets))
                .filter(|p| filter.matches(p.tags()))
                .map(|p| p.name().to_owned())
                .collect(),
            Kind::Subnets => self
                .networks()
                .iter()
                .filter(|n| filter.matches(n.tags()))
                .map(|n| n.name().to_owned())
                .collect(),
            Kind::Hosts => self
                .hosts()
                .filter(|h| filter.matches(h.tags()))
                .map(|h| h.name().to_owned())
                .collect(),
        }
    }
}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// Errors that arise when answering a query. Neither is fatal: a batch
/// of queries reports them per item.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum QueryError {
    InvalidInput(String),
    NotFound(String),
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::InvalidInput(ref text) => write!(f, "{}: invalid input", text),
            Self::NotFound(ref text) => write!(f, "{}: not found", text),
        }
    }
}

impl std::error::Error for QueryError {}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
