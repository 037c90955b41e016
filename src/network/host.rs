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

//! Implementation of the [`Host`] structure.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::registry::{DuplicateName, Registry};
use crate::thing::{AsThing, Provenance, Thing};
use crate::util::{fqdn, Caseless};

/// A named endpoint within a [`Network`](super::Network).
///
/// Relations to other entities are held by name: the owning network,
/// the hosts this one runs on (`hosted_on`), and the hosts running on
/// this one (`hosting`, filled in once every host is known).
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Host {
    thing: Thing,
    network: String,
    dns: bool,
    addresses: Vec<IpAddr>,
    aliases: Registry<Thing>,
    hosted_on: Vec<String>,
    hosting: Vec<String>,
}

impl Host {
    /// Creates a `Host`. The name is normalized to have a trailing dot.
    /// Hosts emit DNS records unless told otherwise.
    pub fn new(name: &str, network: &str, provenance: Provenance) -> Self {
        Self {
            thing: Thing::new(fqdn(name), provenance),
            network: network.to_owned(),
            dns: true,
            addresses: Vec::new(),
            aliases: Registry::new(),
            hosted_on: Vec::new(),
            hosting: Vec::new(),
        }
    }

    /// Returns the name of the owning network.
    pub fn network(&self) -> &str {
        &self.network
    }

    /// Returns whether the host's records are emitted to DNS.
    pub fn dns(&self) -> bool {
        self.dns
    }

    pub fn set_dns(&mut self, dns: bool) {
        self.dns = dns;
    }

    /// Returns the host's addresses, in the order they were bound.
    pub fn addresses(&self) -> &[IpAddr] {
        &self.addresses
    }

    pub(super) fn push_address(&mut self, ip: IpAddr) {
        if !self.addresses.contains(&ip) {
            self.addresses.push(ip);
        }
    }

    pub fn aliases(&self) -> &Registry<Thing> {
        &self.aliases
    }

    pub fn add_alias(&mut self, alias: Thing) -> Result<&mut Thing, DuplicateName> {
        self.aliases.add(alias)
    }

    pub fn hosted_on(&self) -> &[String] {
        &self.hosted_on
    }

    pub fn add_hosted_on(&mut self, host: &str) {
        push_unique(&mut self.hosted_on, fqdn(host));
    }

    pub fn hosting(&self) -> &[String] {
        &self.hosting
    }

    pub fn add_hosting(&mut self, host: &str) {
        push_unique(&mut self.hosting, fqdn(host));
    }
}

fn push_unique(list: &mut Vec<String>, name: String) {
    if !list.iter().any(|n| Caseless(n) == Caseless(&name)) {
        list.push(name);
    }
}

impl AsThing for Host {
    fn thing(&self) -> &Thing {
        &self.thing
    }

    fn thing_mut(&mut self) -> &mut Thing {
        &mut self.thing
    }
}
