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

//! Networks (logical IP subnets) and the [`Host`]s within them.

use std::net::IpAddr;

use ipnet::IpNet;
use serde::{Deserialize, Serialize};

use crate::addr::{Address, AddressMap, Containable, Family, Prefix};
use crate::registry::Registry;
use crate::thing::{AsThing, Provenance, Thing};
use crate::util::{fqdn, Caseless};

mod error;
mod host;

pub use error::Error;
pub use host::Host;

/// A logical IP subnet: at most one IPv4 and any number of IPv6 stub
/// prefixes sharing one name, together with the hosts attached to it.
///
/// The network refers to its prefixes by value; the prefixes themselves
/// (and their addresses) live in the [`AddressMap`], which is passed to
/// the operations that need it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Network {
    thing: Thing,
    location: Option<String>,
    prefixes: Vec<IpNet>,
    hosts: Registry<Host>,
}

impl Network {
    pub fn new(name: &str, provenance: Provenance) -> Self {
        Self {
            thing: Thing::new(name, provenance),
            location: None,
            prefixes: Vec::new(),
            hosts: Registry::new(),
        }
    }

    /// Returns the network's location, in the text form of a LOC
    /// record's RDATA.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn set_location(&mut self, location: Option<String>) {
        self.location = location;
    }

    /// Binds a stub prefix to the network. The network inherits the
    /// prefix's tags. Binding the same prefix twice has no effect.
    pub fn add_prefix(&mut self, prefix: &mut Prefix) -> Result<(), Error> {
        if !prefix.is_stub() {
            return Err(Error::NotStub(prefix.name().to_owned()));
        }
        if let Some(network) = prefix.network() {
            if Caseless(network) != Caseless(self.name()) {
                return Err(Error::AlreadyBound {
                    prefix: prefix.name().to_owned(),
                    network: network.to_owned(),
                });
            }
        }
        let net = prefix.net();
        if self.prefixes.contains(&net) {
            return Ok(());
        }
        if Family::of(&net) == Family::V4 {
            if let Some(existing) = self.prefixes(Some(Family::V4)).first() {
                return Err(Error::MultipleIpv4 {
                    network: self.name().to_owned(),
                    existing: existing.to_string(),
                    new: net.to_string(),
                });
            }
        }

        prefix.set_network(self.name())?;
        let source = prefix.name().to_owned();
        self.thing.tags_mut().inherit(&source, prefix.tags());
        self.prefixes.push(net);
        Ok(())
    }

    /// Returns the network's prefixes, optionally only those of one
    /// family, in the order they were bound.
    pub fn prefixes(&self, family: Option<Family>) -> Vec<IpNet> {
        self.prefixes
            .iter()
            .filter(|net| family.map_or(true, |f| Family::of(net) == f))
            .copied()
            .collect()
    }

    /// Returns the network's prefix that contains `ip`.
    pub fn covering_prefix(&self, ip: IpAddr) -> Option<IpNet> {
        self.prefixes
            .iter()
            .find(|net| net.contains_net(&IpNet::from(ip)))
            .copied()
    }

    /// Adds `address` to whichever of the network's prefixes contains
    /// it. This fails with [`Error::NotCovered`] if none does.
    pub fn add_address<'m>(
        &self,
        map: &'m mut AddressMap,
        address: Address,
    ) -> Result<&'m mut Address, Error> {
        match self.covering_prefix(address.ip()) {
            Some(prefix) => Ok(map.add_address(&prefix, address)?),
            None => Err(Error::NotCovered {
                network: self.name().to_owned(),
                address: address.name().to_owned(),
            }),
        }
    }

    /// Binds the address `ip` to the host named `host`, creating the
    /// [`Address`] in the map if it does not exist yet. With
    /// `canonical`, the host also becomes the address's canonical host.
    pub fn bind_address(
        &mut self,
        map: &mut AddressMap,
        host: &str,
        ip: IpAddr,
        canonical: bool,
        provenance: &Provenance,
    ) -> Result<(), Error> {
        if map.address(ip).is_none() {
            self.add_address(map, Address::from_ip(ip, false, provenance.clone()))?;
        } else if self.covering_prefix(ip).is_none() {
            return Err(Error::NotCovered {
                network: self.name().to_owned(),
                address: ip.to_string(),
            });
        }

        let network = self.name().to_owned();
        let host = match self.hosts.lookup_mut(&fqdn(host)) {
            Some(host) => host,
            None => {
                return Err(Error::UnknownHost {
                    network,
                    host: host.to_owned(),
                })
            }
        };
        let address = match map.address_mut(ip) {
            Some(address) => address,
            None => {
                return Err(Error::NotCovered {
                    network,
                    address: ip.to_string(),
                })
            }
        };
        if canonical {
            address.set_canonical_host(&*host)?;
        }
        address.add_host(host.name());
        host.push_address(ip);
        Ok(())
    }

    /// Returns every address in the network's prefixes.
    pub fn addresses<'m>(&self, map: &'m AddressMap) -> Vec<&'m Address> {
        self.prefixes
            .iter()
            .filter_map(|net| map.find(net))
            .filter_map(Prefix::addresses)
            .flat_map(|addresses| addresses.iter())
            .collect()
    }

    pub fn add_host(&mut self, host: Host) -> Result<&mut Host, Error> {
        Ok(self.hosts.add(host)?)
    }

    pub fn hosts(&self) -> &Registry<Host> {
        &self.hosts
    }

    pub fn find_host(&self, name: &str) -> Option<&Host> {
        self.hosts.lookup(&fqdn(name))
    }

    pub fn find_host_mut(&mut self, name: &str) -> Option<&mut Host> {
        self.hosts.lookup_mut(&fqdn(name))
    }

    /// Finds the host that has the alias `name`.
    pub fn find_alias(&self, name: &str) -> Option<&Host> {
        let name = fqdn(name);
        self.hosts.iter().find(|host| host.aliases().contains(&name))
    }
}

impl AsThing for Network {
    fn thing(&self) -> &Thing {
        &self.thing
    }

    fn thing_mut(&mut self) -> &mut Thing {
        &mut self.thing
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addr;

    fn net(text: &str) -> IpNet {
        text.parse().unwrap()
    }

    fn ip(text: &str) -> IpAddr {
        text.parse().unwrap()
    }

    fn setup() -> (AddressMap, Network) {
        let mut map = AddressMap::new();
        for text in ["10.0.0.0/24", "10.0.1.0/24", "2001:db8::/64"] {
            let mut prefix = Prefix::new(text, Some("lan".into()), true, Provenance::new("test"))
                .unwrap();
            prefix.thing_mut().tags_mut().apply("office").unwrap();
            map.add(prefix).unwrap();
        }
        let mut network = Network::new("lan", Provenance::new("test"));
        network
            .add_prefix(map.find_mut(&net("10.0.0.0/24")).unwrap())
            .unwrap();
        network
            .add_prefix(map.find_mut(&net("2001:db8::/64")).unwrap())
            .unwrap();
        (map, network)
    }

    #[test]
    fn add_prefix_allows_one_ipv4_prefix() {
        let (mut map, mut network) = setup();
        assert!(matches!(
            network.add_prefix(map.find_mut(&net("10.0.1.0/24")).unwrap()),
            Err(Error::MultipleIpv4 { .. })
        ));
        assert_eq!(network.prefixes(None).len(), 2);
        assert_eq!(network.prefixes(Some(Family::V6)), [net("2001:db8::/64")]);
        assert!(network.tags().contains("office"));
        assert_eq!(
            map.find(&net("10.0.0.0/24")).unwrap().network(),
            Some("lan")
        );

        let mut other = Network::new("dmz", Provenance::new("test"));
        assert!(matches!(
            other.add_prefix(map.find_mut(&net("10.0.0.0/24")).unwrap()),
            Err(Error::AlreadyBound { .. })
        ));
    }

    #[test]
    fn add_address_requires_coverage() {
        let (mut map, network) = setup();
        network
            .add_address(&mut map, Address::new("10.0.0.9", true, Provenance::new("test")).unwrap())
            .unwrap();
        assert!(matches!(
            network.add_address(
                &mut map,
                Address::new("10.0.1.9", false, Provenance::new("test")).unwrap()
            ),
            Err(Error::NotCovered { .. })
        ));
        assert_eq!(network.addresses(&map).len(), 1);
    }

    #[test]
    fn bind_address_sets_canonical_host_and_aliases_are_found() {
        let (mut map, mut network) = setup();
        let host = network
            .add_host(Host::new("foo.example", "lan", Provenance::new("test")))
            .unwrap();
        host.add_alias(Thing::new("www.example.", Provenance::new("test")))
            .unwrap();

        let prov = Provenance::new("test");
        network
            .bind_address(&mut map, "foo.example.", ip("10.0.0.5"), true, &prov)
            .unwrap();
        network
            .bind_address(&mut map, "foo.example.", ip("2001:db8::5"), true, &prov)
            .unwrap();
        assert!(matches!(
            network.bind_address(&mut map, "foo.example.", ip("10.0.0.5"), true, &prov),
            Err(Error::Address(addr::Error::AlreadyCanonical { .. }))
        ));
        assert!(matches!(
            network.bind_address(&mut map, "bar.example.", ip("10.0.0.6"), false, &prov),
            Err(Error::UnknownHost { .. })
        ));

        let host = network.find_host("FOO.example").unwrap();
        assert_eq!(host.addresses(), [ip("10.0.0.5"), ip("2001:db8::5")]);
        assert_eq!(
            map.address(ip("10.0.0.5")).unwrap().canonical_host(),
            Some("foo.example.")
        );
        assert_eq!(
            network.find_alias("www.example").map(|h| h.name()),
            Some("foo.example.")
        );
        assert!(network.find_alias("foo.example.").is_none());
    }
}
