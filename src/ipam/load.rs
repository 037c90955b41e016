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

//! The load pass.
//!
//! The [`Loader`] walks a [`Document`] once, in a fixed order:
//! alternatives, zones, the address map, IIDs, and finally networks
//! with their hosts. DNS records are added to the zones as the facts
//! they derive from are registered. Checks that need the whole database
//! (hosted-on targets, `-admin` hosts, unused IIDs) are deferred to
//! [`Loader::finalize`].

use std::collections::btree_map::Entry;
use std::net::IpAddr;

use ipnet::IpNet;
use log::{debug, info};

use super::error::{At, Error, ErrorKind};
use super::{generate, reserve, Ipam, LoadOptions, NameOwner};
use crate::addr::{self, Address, Containable, Family, Prefix};
use crate::alternative::{self, Alternative, Binding, Mapping};
use crate::diag::{Diagnostics, Warning};
use crate::dns::{self, reverse_name, Record, Ttl, Type, Zone};
use crate::iid::Iid;
use crate::network::{self, Host, Network};
use crate::source::{BlockDef, Document, HostDef, NetworkDef};
use crate::thing::{AsThing, Provenance, Thing};
use crate::util::{fqdn, name_key};

/// The state of a load in progress.
pub(super) struct Loader {
    ipam: Ipam,
    default_ttl: Ttl,
    diag: Diagnostics,
    /// `(host, target, at)` for every hosted-on relation.
    hosted_on: Vec<(String, String, Provenance)>,
    /// `(host, expected, at)` for every host named like `<name>-admin`.
    admin: Vec<(String, String, Provenance)>,
}

impl Loader {
    pub(super) fn new(options: &LoadOptions) -> Self {
        Self {
            ipam: Ipam::default(),
            default_ttl: options.default_ttl,
            diag: Diagnostics::new(),
            hosted_on: Vec::new(),
            admin: Vec::new(),
        }
    }

    pub(super) fn run(mut self, document: &Document) -> Result<Ipam, Error> {
        for def in &document.alternatives {
            let at = &def.provenance;
            let mut alternative = Alternative::new(&def.label, &def.states, at.clone()).at(at)?;
            alternative.thing_mut().set_description(def.description.clone());
            alternative.thing_mut().set_ttl(def.ttl);
            if let Some(ref state) = def.state {
                alternative.set_state(state).at(at)?;
            }
            self.ipam.alternatives.add(alternative).at(at)?;
        }
        debug!("Loaded {} alternatives.", self.ipam.alternatives.len());

        for def in &document.zones {
            let at = &def.provenance;
            let mut zone = Zone::new(&def.name, def.ttl.unwrap_or(self.default_ttl), at.clone());
            zone.set_directory(def.directory.clone());
            zone.thing_mut().set_description(def.description.clone());
            self.ipam.zones.add(zone).at(at)?;
        }
        debug!("Loaded {} zones.", self.ipam.zones.len());

        for def in &document.blocks {
            self.load_block(None, def)?;
        }
        debug!("Loaded the address map.");

        for def in &document.iids {
            let at = &def.provenance;
            let iid = Iid::new(&def.name, &def.iid, at.clone()).at(at)?;
            self.ipam.iids.add(iid).at(at)?;
        }
        debug!("Loaded {} IIDs.", self.ipam.iids.len());

        for def in &document.networks {
            self.load_network(def)?;
        }
        debug!("Loaded {} networks.", self.ipam.networks.len());

        self.finalize()?;
        let Self {
            mut ipam, diag, ..
        } = self;
        ipam.warnings = diag.into_warnings();
        Ok(ipam)
    }

    ////////////////////////////////////////////////////////////////////
    // ADDRESS MAP                                                    //
    ////////////////////////////////////////////////////////////////////

    /// Adds a block (and, recursively, the blocks nested in it) beneath
    /// `parent`, or at the top level.
    fn load_block(&mut self, parent: Option<IpNet>, def: &BlockDef) -> Result<(), Error> {
        let at = &def.provenance;
        let mut prefix = Prefix::new(&def.prefix, def.id.clone(), def.stub, at.clone()).at(at)?;
        if let Some(plen) = def.plen {
            prefix.set_plen(plen).at(at)?;
        }
        prefix.thing_mut().set_description(def.description.clone());
        prefix.thing_mut().set_ttl(def.ttl);
        if let Some(parent) = parent.as_ref().and_then(|net| self.ipam.map.find(net)) {
            prefix.thing_mut().inherit_ttl(parent.ttl());
            prefix
                .thing_mut()
                .tags_mut()
                .inherit(parent.name(), parent.tags());
        }
        prefix.thing_mut().tags_mut().apply_all(&def.tags).at(at)?;

        let net = prefix.net();
        let ttl = prefix.ttl();
        let added = match parent {
            Some(ref parent) => self.ipam.map.add_under(parent, prefix),
            None => self.ipam.map.add(prefix),
        };
        added.at(at)?;

        if let Some(ref name) = def.name {
            self.publish_prefix(&net, name, ttl, at)?;
        }
        for child in &def.blocks {
            self.load_block(Some(net), child)?;
        }
        Ok(())
    }

    /// Publishes a prefix at `name` as an APL record and an A or AAAA
    /// record for its network address, with a PTR record for that
    /// address if a reverse zone covers it.
    fn publish_prefix(
        &mut self,
        net: &IpNet,
        name: &str,
        ttl: Option<Ttl>,
        at: &Provenance,
    ) -> Result<(), Error> {
        let owner = fqdn(name);
        let apl = format!(
            "{}:{}/{}",
            Family::of(net).apl_family(),
            net.network(),
            net.prefix_len(),
        );
        self.add_rr(&owner, ttl, Type::APL, Record::new(apl, at.clone()), at)?;
        let rr_type = match net {
            IpNet::V4(_) => Type::A,
            IpNet::V6(_) => Type::AAAA,
        };
        let address = Record::new(net.network().to_string(), at.clone());
        self.add_rr(&owner, ttl, rr_type, address, at)?;
        let reverse = reverse_name(net.network());
        if self.ipam.zones.covers(&reverse) {
            self.add_rr(&reverse, ttl, Type::PTR, Record::new(owner, at.clone()), at)?;
        }
        Ok(())
    }

    ////////////////////////////////////////////////////////////////////
    // NETWORKS                                                       //
    ////////////////////////////////////////////////////////////////////

    fn load_network(&mut self, def: &NetworkDef) -> Result<(), Error> {
        let at = &def.provenance;
        if def.prefixes.is_empty() {
            return Err(Error::new(at.clone(), ErrorKind::NoPrefixes(def.name.clone())));
        }
        if let Some(existing) = self.ipam.networks.lookup(&def.name) {
            let duplicate = crate::registry::DuplicateName {
                name: def.name.clone(),
                first: existing.provenance().clone(),
                duplicate: at.clone(),
            };
            return Err(Error::new(at.clone(), network::Error::from(duplicate).into()));
        }

        let mut network = Network::new(&def.name, at.clone());
        for id in &def.prefixes {
            let nets: Vec<IpNet> = self
                .ipam
                .map
                .lookup_by_id(id, true)
                .iter()
                .map(|prefix| prefix.net())
                .collect();
            if nets.is_empty() {
                return Err(Error::new(
                    at.clone(),
                    ErrorKind::UnknownPrefixId {
                        network: def.name.clone(),
                        id: id.clone(),
                    },
                ));
            }
            for net in nets {
                match self.ipam.map.find_mut(&net) {
                    Some(prefix) => network.add_prefix(prefix).at(at)?,
                    None => {
                        return Err(Error::new(
                            at.clone(),
                            ErrorKind::Bug(format!("the prefix {} vanished from the map", net)),
                        ))
                    }
                }
            }
        }
        network.set_location(def.location.clone());
        network.thing_mut().set_description(def.description.clone());
        network.thing_mut().set_ttl(def.ttl);
        network.thing_mut().tags_mut().apply_all(&def.tags).at(at)?;

        self.reserve(&network, def)?;
        for generate in &def.generate {
            let hosts = generate::expand(generate, &network, &self.ipam.map).at(&generate.provenance)?;
            debug!(
                "{}: generated {} hosts for {}.",
                generate.provenance,
                hosts.len(),
                network.name(),
            );
            for host in &hosts {
                self.load_host(&mut network, host)?;
            }
        }
        for host in &def.hosts {
            self.load_host(&mut network, host)?;
        }

        self.ipam
            .networks
            .add(network)
            .map_err(network::Error::from)
            .at(at)?;
        Ok(())
    }

    /// Creates the network's reserved addresses: those of its
    /// infrastructure policy, then its explicit reservations.
    fn reserve(&mut self, network: &Network, def: &NetworkDef) -> Result<(), Error> {
        let at = &def.provenance;
        for prefix in network.prefixes(None) {
            for ip in reserve::policy_addresses(def.reserve, &prefix) {
                self.reserve_address(network, ip, at)?;
            }
        }
        for entry in &def.reserved {
            let net = addr::parse_net(entry).at(at)?;
            for (_, ip) in reserve::enumerate(&net).at(at)? {
                self.reserve_address(network, ip, at)?;
            }
        }
        Ok(())
    }

    fn reserve_address(&mut self, network: &Network, ip: IpAddr, at: &Provenance) -> Result<(), Error> {
        if self.ipam.map.address(ip).is_some() {
            debug!("{}: {} is already reserved.", at, ip);
            return Ok(());
        }
        network
            .add_address(&mut self.ipam.map, Address::from_ip(ip, true, at.clone()))
            .at(at)?;
        Ok(())
    }

    ////////////////////////////////////////////////////////////////////
    // HOSTS                                                          //
    ////////////////////////////////////////////////////////////////////

    fn load_host(&mut self, network: &mut Network, def: &HostDef) -> Result<(), Error> {
        let at = &def.provenance;
        let name = fqdn(&def.name);
        let dns = def.dns;
        self.claim_name(
            &name,
            NameOwner::Host {
                network: network.name().to_owned(),
            },
            at,
        )?;
        if dns && !self.ipam.zones.covers(&name) {
            return Err(Error::new(at.clone(), dns::Error::NotInAnyZone(name).into()));
        }

        let mut host = Host::new(&name, network.name(), at.clone());
        host.set_dns(dns);
        host.thing_mut().set_description(def.description.clone());
        host.thing_mut().set_ttl(def.ttl);
        host.thing_mut().inherit_ttl(network.ttl());
        host.thing_mut()
            .tags_mut()
            .inherit(network.name(), network.tags());
        host.thing_mut().tags_mut().apply_all(&def.tags).at(at)?;
        for target in &def.hosted_on {
            host.add_hosted_on(target);
            self.hosted_on.push((name.clone(), fqdn(target), at.clone()));
        }
        if let Some(expected) = admin_target(&name) {
            self.admin.push((name.clone(), expected, at.clone()));
        }
        let ttl = host.ttl();
        network.add_host(host).at(at)?;

        // Addresses.
        let mut addresses: Vec<(IpAddr, bool, Option<&str>)> = Vec::new();
        for def in &def.addresses {
            let ip = Address::new(&def.address, false, at.clone()).at(at)?.ip();
            addresses.push((ip, def.canonical, def.when.as_deref()));
        }
        if def.iid {
            let prefixes = network.prefixes(Some(Family::V6));
            if prefixes.is_empty() {
                return Err(Error::new(
                    at.clone(),
                    ErrorKind::NoIpv6Prefix {
                        host: name,
                        network: network.name().to_owned(),
                    },
                ));
            }
            for prefix in prefixes {
                if let IpNet::V6(prefix) = prefix {
                    let ip = self.ipam.iids.synthesize(&name, &prefix).at(at)?;
                    addresses.push((IpAddr::V6(ip), true, None));
                }
            }
        }
        if addresses.is_empty() {
            self.diag.warn(Warning::HostWithoutAddresses {
                host: name.clone(),
                at: at.clone(),
            });
        }
        for (ip, canonical, when) in addresses {
            network
                .bind_address(&mut self.ipam.map, &name, ip, canonical, at)
                .at(at)?;
            let mapping = Mapping::Address {
                host: name.clone(),
                address: ip,
            };
            let binding = self.gate(when, mapping).at(at)?;
            if !dns {
                continue;
            }
            let ttl = binding.ttl.or(ttl);
            let rr_type = match ip {
                IpAddr::V4(_) => Type::A,
                IpAddr::V6(_) => Type::AAAA,
            };
            let record = Record::new(ip.to_string(), at.clone()).with_active(binding.active);
            self.add_rr(&name, ttl, rr_type, record, at)?;
            let reverse = reverse_name(ip);
            if canonical && self.ipam.zones.covers(&reverse) {
                let record = Record::new(name.clone(), at.clone()).with_active(binding.active);
                self.add_rr(&reverse, ttl, Type::PTR, record, at)?;
            }
        }

        // Aliases.
        for alias in &def.aliases {
            let alias_name = fqdn(&alias.name);
            self.claim_name(
                &alias_name,
                NameOwner::Alias {
                    network: network.name().to_owned(),
                    host: name.clone(),
                },
                at,
            )?;
            if let Some(host) = network.find_host_mut(&name) {
                host.add_alias(Thing::new(alias_name.clone(), at.clone()))
                    .map_err(network::Error::from)
                    .at(at)?;
            }
            let mapping = Mapping::Alias {
                host: name.clone(),
                alias: alias_name.clone(),
            };
            let binding = self.gate(alias.when.as_deref(), mapping).at(at)?;
            if dns {
                let record = Record::new(name.clone(), at.clone()).with_active(binding.active);
                self.add_rr(&alias_name, binding.ttl.or(ttl), Type::CNAME, record, at)?;
            }
        }

        // Raw records.
        for def in &def.records {
            let at = &def.provenance;
            let mapping = Mapping::Record {
                host: name.clone(),
                rr_type: def.rr_type,
                rdata: def.rdata.clone(),
            };
            let binding = self.gate(def.when.as_deref(), mapping).at(at)?;
            if dns {
                let record = Record::new(def.rdata.clone(), at.clone())
                    .with_comment(def.comment.clone())
                    .with_active(binding.active);
                self.add_rr(&name, binding.ttl.or(ttl), def.rr_type, record, at)?;
            }
        }

        if !dns {
            info!("{}: {} is not published in DNS.", at, name);
        } else if let Some(location) = network.location() {
            self.add_rr(&name, ttl, Type::LOC, Record::new(location, at.clone()), at)?;
        }
        Ok(())
    }

    /// Records that `name` belongs to `owner`. Host and alias names
    /// share one namespace.
    fn claim_name(&mut self, name: &str, owner: NameOwner, at: &Provenance) -> Result<(), Error> {
        match self.ipam.names.entry(name_key(name)) {
            Entry::Occupied(entry) => Err(Error::new(
                at.clone(),
                ErrorKind::NameTaken {
                    name: name.to_owned(),
                    first: entry.get().1.clone(),
                },
            )),
            Entry::Vacant(entry) => {
                entry.insert((owner, at.clone()));
                Ok(())
            }
        }
    }

    /// Binds a fact to the alternative state named by `when`. Facts
    /// without a selector are always active.
    fn gate(&mut self, when: Option<&str>, mapping: Mapping) -> Result<Binding, alternative::Error> {
        match when {
            Some(when) => self.ipam.alternatives.bind(when, mapping),
            None => Ok(Binding {
                active: true,
                ttl: None,
            }),
        }
    }

    fn add_rr(
        &mut self,
        owner: &str,
        ttl: Option<Ttl>,
        rr_type: Type,
        record: Record,
        at: &Provenance,
    ) -> Result<(), Error> {
        self.ipam
            .zones
            .add_rr(owner, ttl, rr_type, record, &mut self.diag)
            .at(at)
    }

    ////////////////////////////////////////////////////////////////////
    // FINAL CHECKS                                                   //
    ////////////////////////////////////////////////////////////////////

    fn finalize(&mut self) -> Result<(), Error> {
        for iid in self.ipam.iids.unused() {
            self.diag.warn(Warning::UnusedIid {
                name: iid.name().to_owned(),
                at: iid.provenance().clone(),
            });
        }

        for (host, target, at) in std::mem::take(&mut self.hosted_on) {
            let network = match self.ipam.names.get(&name_key(&target)) {
                Some((NameOwner::Host { network }, _)) => network.clone(),
                _ => return Err(Error::new(at, ErrorKind::DanglingHostedOn { host, target })),
            };
            match self
                .ipam
                .networks
                .lookup_mut(&network)
                .and_then(|network| network.find_host_mut(&target))
            {
                Some(target) => target.add_hosting(&host),
                None => {
                    return Err(Error::new(
                        at,
                        ErrorKind::Bug(format!("the host {} is not in its network {}", target, network)),
                    ))
                }
            }
        }

        for (host, expected, at) in std::mem::take(&mut self.admin) {
            let found = matches!(
                self.ipam.names.get(&name_key(&expected)),
                Some((NameOwner::Host { .. }, _))
            );
            if !found {
                self.diag.warn(Warning::MissingAdminTarget { host, expected, at });
            }
        }
        Ok(())
    }
}

/// For a host named `<name>-admin.<rest>`, returns `<name>.<rest>`.
fn admin_target(name: &str) -> Option<String> {
    let (first, rest) = name.split_once('.')?;
    match first.strip_suffix("-admin") {
        Some(base) if !base.is_empty() => Some(format!("{}.{}", base, rest)),
        _ => None,
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use lazy_static::lazy_static;

    lazy_static! {
        static ref DOCUMENT: Document = fixture();
    }

    fn fixture() -> Document {
        let json = r#"{
            "zones": [
                {"name": "example.", "ttl": "1h"},
                {"name": "10.in-addr.arpa."},
                {"name": "8.b.d.0.1.0.0.2.ip6.arpa."}
            ],
            "alternatives": [
                {"label": "site", "states": ["a", "b"], "state": "a", "ttl": 60}
            ],
            "blocks": [
                {"prefix": "10.0.0.0/8", "tags": ["corp"], "ttl": 7200, "blocks": [
                    {"prefix": "10.1.0.0/24", "id": "lan", "stub": true,
                     "name": "lan.example.", "tags": ["office"]},
                    {"prefix": "10.2.0.0/24", "id": "dmz", "stub": true}
                ]},
                {"prefix": "2001:db8::/32", "blocks": [
                    {"prefix": "2001:db8:1::/64", "id": "lan", "stub": true}
                ]}
            ],
            "iids": [
                {"name": "foo.example.", "iid": "::1:2"},
                {"name": "unused.example.", "iid": "::99"}
            ],
            "networks": [{
                "name": "lan",
                "prefixes": ["lan"],
                "location": "52 22 23.000 N 4 53 32.000 E -2.00m",
                "reserve": "full",
                "reserved": ["10.1.0.128/30"],
                "generate": [{"template": "dhcp-{n}.example.", "block": "10.1.0.200/30"}],
                "hosts": [
                    {"name": "foo.example.", "addresses": ["10.1.0.10"], "iid": true,
                     "aliases": ["www.example.", {"name": "ftp.example.", "when": "site:b"}],
                     "records": [{"type": "TXT", "rdata": "\"hello\"", "comment": "greeting"}],
                     "ttl": 300},
                    {"name": "bar.example.", "addresses": [{"address": "10.1.0.11", "when": "site:b"}],
                     "hosted_on": ["foo.example."]},
                    {"name": "router-admin.example.", "addresses": ["10.1.0.12"]},
                    {"name": "hidden.example.", "dns": false}
                ]
            }]
        }"#;
        let mut document: Document = serde_json::from_str(json).unwrap();
        document.assign_provenance("db.toml");
        document
    }

    fn load_json(json: &str) -> Result<Ipam, Error> {
        let mut document: Document = serde_json::from_str(json).unwrap();
        document.assign_provenance("db.toml");
        Ipam::load(&document)
    }

    fn ip(text: &str) -> IpAddr {
        text.parse().unwrap()
    }

    #[test]
    fn load_builds_registries() {
        let ipam = Ipam::load(&DOCUMENT).unwrap();

        let network = ipam.network("LAN").unwrap();
        assert_eq!(network.prefixes(None).len(), 2);
        assert!(network.tags().contains("corp"));
        assert!(network.tags().contains("office"));
        assert_eq!(network.hosts().len(), 8);

        let foo = ipam.host("foo.example").unwrap();
        assert_eq!(foo.addresses(), [ip("10.1.0.10"), ip("2001:db8:1::1:2")]);
        assert_eq!(foo.ttl(), Some(Ttl::from(300)));
        assert!(foo.tags().contains("office"));
        assert_eq!(foo.hosting(), ["bar.example."]);
        assert_eq!(ipam.alias_owner("ftp.example.").unwrap().name(), "foo.example.");
        assert!(ipam.host("www.example.").is_none());
        assert_eq!(ipam.host("bar.example.").unwrap().hosted_on(), ["foo.example."]);

        let prefix = ipam.map().find(&"10.1.0.0/24".parse().unwrap()).unwrap();
        assert_eq!(prefix.ttl(), Some(Ttl::from(7200)));
        assert_eq!(prefix.network(), Some("lan"));
        let reserved = network
            .addresses(ipam.map())
            .into_iter()
            .filter(|a| a.is_reserved())
            .count();
        assert_eq!(reserved, 9 + 4 + 1);
        assert_eq!(
            ipam.map().address(ip("10.1.0.10")).unwrap().canonical_host(),
            Some("foo.example.")
        );
        assert!(ipam.host("dhcp-3.example.").is_some());
        assert!(ipam.iids().lookup("foo.example.").unwrap().in_use());
    }

    #[test]
    fn load_collects_warnings() {
        let ipam = Ipam::load(&DOCUMENT).unwrap();
        let warnings = ipam.warnings();
        assert_eq!(warnings.len(), 3);
        assert!(matches!(
            warnings[0],
            Warning::HostWithoutAddresses { ref host, .. } if host == "hidden.example."
        ));
        assert!(matches!(
            warnings[1],
            Warning::UnusedIid { ref name, .. } if name == "unused.example."
        ));
        assert!(matches!(
            warnings[2],
            Warning::MissingAdminTarget { ref expected, .. } if expected == "router.example."
        ));
        assert_eq!(
            warnings[2].provenance().to_string(),
            "db.toml [networks[0].hosts[2]]"
        );
    }

    #[test]
    fn load_renders_gated_records() {
        let ipam = Ipam::load(&DOCUMENT).unwrap();
        let zones = ipam.zones();
        assert_eq!(
            zones.render_name("foo.example.", false).unwrap(),
            "foo.example. 300 IN A 10.1.0.10\n\
             foo.example. 300 IN AAAA 2001:db8:1::1:2\n\
             foo.example. 300 IN LOC 52 22 23.000 N 4 53 32.000 E -2.00m\n\
             foo.example. 300 IN TXT \"hello\" ; greeting\n"
        );
        assert_eq!(
            zones.render_name("bar.example.", false).unwrap(),
            "bar.example. 3600 IN LOC 52 22 23.000 N 4 53 32.000 E -2.00m\n\
             ; bar.example. 60 IN A 10.1.0.11\n"
        );
        assert_eq!(
            zones.render_name("ftp.example.", false).unwrap(),
            "; ftp.example. 60 IN CNAME foo.example.\n"
        );
        assert_eq!(
            zones.render_name("www.example.", false).unwrap(),
            "www.example. 300 IN CNAME foo.example.\n"
        );
        assert_eq!(
            zones.render_name("lan.example.", false).unwrap(),
            "lan.example. 7200 IN A 10.1.0.0\n\
             lan.example. 7200 IN APL 1:10.1.0.0/24\n"
        );
        assert_eq!(
            zones.render_name("0.0.1.10.in-addr.arpa.", false).unwrap(),
            "0.0.1.10.in-addr.arpa. 7200 IN PTR lan.example.\n"
        );
        assert_eq!(
            zones.render_name("10.0.1.10.in-addr.arpa.", false).unwrap(),
            "10.0.1.10.in-addr.arpa. 300 IN PTR foo.example.\n"
        );
        assert!(zones.render_name("hidden.example.", false).is_none());
    }

    #[test]
    fn named_prefixes_publish_baseline_records() {
        let ipam = load_json(
            r#"{"zones": [{"name": "example."}, {"name": "8.b.d.0.1.0.0.2.ip6.arpa."}],
                "blocks": [
                    {"prefix": "2001:db8:5::/48", "name": "site.example.", "ttl": 600},
                    {"prefix": "192.0.2.0/24", "name": "test-net.example."}
                ]}"#,
        )
        .unwrap();
        let zones = ipam.zones();
        assert_eq!(
            zones.render_name("site.example.", false).unwrap(),
            "site.example. 600 IN AAAA 2001:db8:5::\n\
             site.example. 600 IN APL 2:2001:db8:5::/48\n"
        );
        assert_eq!(
            zones
                .render_name(
                    "0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.5.0.0.0.8.b.d.0.1.0.0.2.ip6.arpa.",
                    false
                )
                .unwrap(),
            "0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.5.0.0.0.8.b.d.0.1.0.0.2.ip6.arpa. \
             600 IN PTR site.example.\n"
        );
        // No reverse zone covers 192.0.2.0/24, so there is no PTR record.
        assert_eq!(
            zones.render_name("test-net.example.", false).unwrap(),
            "test-net.example. 3600 IN A 192.0.2.0\n\
             test-net.example. 3600 IN APL 1:192.0.2.0/24\n"
        );
        assert!(zones.lookup_fqdn("0.2.0.192.in-addr.arpa.").is_none());
    }

    #[test]
    fn load_is_idempotent() {
        assert_eq!(Ipam::load(&DOCUMENT).unwrap(), Ipam::load(&DOCUMENT).unwrap());
    }

    #[test]
    fn errors_carry_provenance() {
        let error = load_json(
            r#"{"blocks": [{"prefix": "10.0.0.0/24"}, {"prefix": "10.0.0.0/25"}]}"#,
        )
        .unwrap_err();
        assert_eq!(error.provenance().record(), Some("blocks[1]"));
        assert!(matches!(
            error.kind(),
            ErrorKind::Address(addr::Error::Overlap { .. })
        ));

        let error = load_json(
            r#"{"networks": [{"name": "lan", "prefixes": ["nope"]}]}"#,
        )
        .unwrap_err();
        assert!(matches!(error.kind(), ErrorKind::UnknownPrefixId { .. }));
    }

    #[test]
    fn referential_errors_are_fatal() {
        let base = r#""zones": [{"name": "example."}],
            "blocks": [{"prefix": "10.0.0.0/24", "id": "lan", "stub": true}]"#;

        let error = load_json(&format!(
            r#"{{{}, "networks": [{{"name": "lan", "prefixes": ["lan"], "hosts": [
                {{"name": "a.example.", "hosted_on": ["nope.example."]}}]}}]}}"#,
            base,
        ))
        .unwrap_err();
        assert!(matches!(error.kind(), ErrorKind::DanglingHostedOn { .. }));

        let error = load_json(&format!(
            r#"{{{}, "networks": [{{"name": "lan", "prefixes": ["lan"], "hosts": [
                {{"name": "a.example.", "aliases": ["b.example."]}},
                {{"name": "b.example."}}]}}]}}"#,
            base,
        ))
        .unwrap_err();
        assert!(matches!(error.kind(), ErrorKind::NameTaken { .. }));
        assert_eq!(error.provenance().record(), Some("networks[0].hosts[1]"));

        let error = load_json(&format!(
            r#"{{{}, "networks": [{{"name": "lan", "prefixes": ["lan"], "hosts": [
                {{"name": "a.elsewhere."}}]}}]}}"#,
            base,
        ))
        .unwrap_err();
        assert!(matches!(
            error.kind(),
            ErrorKind::Dns(dns::Error::NotInAnyZone(_))
        ));

        let error = load_json(&format!(
            r#"{{{}, "networks": [{{"name": "lan", "prefixes": ["lan"], "hosts": [
                {{"name": "a.example.", "addresses": [{{"address": "10.0.0.1", "when": "site:x"}}]}}]}}]}}"#,
            base,
        ))
        .unwrap_err();
        assert!(matches!(
            error.kind(),
            ErrorKind::Alternative(alternative::Error::UnknownAlternative(_))
        ));

        let error = load_json(&format!(
            r#"{{{}, "networks": [{{"name": "lan", "prefixes": ["lan"], "hosts": [
                {{"name": "a.example.", "iid": true}}]}}]}}"#,
            base,
        ))
        .unwrap_err();
        assert!(matches!(error.kind(), ErrorKind::NoIpv6Prefix { .. }));
    }

    #[test]
    fn reserved_address_cannot_be_canonical() {
        let error = load_json(
            r#"{"zones": [{"name": "example."}],
                "blocks": [{"prefix": "10.0.0.0/24", "id": "lan", "stub": true}],
                "networks": [{"name": "lan", "prefixes": ["lan"], "reserve": "minimal",
                    "hosts": [{"name": "gw.example.", "addresses": ["10.0.0.0"]}]}]}"#,
        )
        .unwrap_err();
        assert!(matches!(
            error.kind(),
            ErrorKind::Network(network::Error::Address(addr::Error::Reserved { .. }))
        ));
        assert!(!error.is_bug());
    }

    #[test]
    fn cname_conflicts_are_fatal() {
        let error = load_json(
            r#"{"zones": [{"name": "example."}],
                "blocks": [{"prefix": "10.0.0.0/24", "id": "lan", "stub": true}],
                "networks": [{"name": "lan", "prefixes": ["lan"], "hosts": [
                    {"name": "a.example.", "addresses": ["10.0.0.1"],
                     "records": [{"type": "CNAME", "rdata": "b.example."}]}]}]}"#,
        )
        .unwrap_err();
        assert!(matches!(
            error.kind(),
            ErrorKind::Dns(dns::Error::CnameConflict { .. })
        ));
        assert_eq!(error.provenance().record(), Some("networks[0].hosts[0].records[0]"));
    }

    #[test]
    fn admin_target_works() {
        assert_eq!(admin_target("sw1-admin.example."), Some("sw1.example.".into()));
        assert_eq!(admin_target("-admin.example."), None);
        assert_eq!(admin_target("sw1.example."), None);
    }
}
