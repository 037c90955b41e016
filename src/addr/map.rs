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

//! Implementation of the [`AddressMap`] structure.

use std::net::IpAddr;

use ipnet::IpNet;
use serde::{Deserialize, Serialize};

use super::{Address, Error, Family, IpLookup, Prefix, PrefixRegistry};
use crate::thing::AsThing;

/// The root of the address map: the top-level [`PrefixRegistry`] and
/// everything beneath it.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct AddressMap {
    root: PrefixRegistry,
}

impl AddressMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a top-level prefix.
    pub fn add(&mut self, prefix: Prefix) -> Result<&mut Prefix, Error> {
        self.root.add(prefix)
    }

    /// Adds `child` beneath the existing prefix `parent`.
    pub fn add_under(&mut self, parent: &IpNet, child: Prefix) -> Result<&mut Prefix, Error> {
        match self.root.find_mut(parent) {
            Some(prefix) => prefix.add(child),
            None => Err(Error::UnknownPrefix(parent.to_string())),
        }
    }

    /// Adds `address` to the stub prefix `stub`.
    pub fn add_address(&mut self, stub: &IpNet, address: Address) -> Result<&mut Address, Error> {
        match self.root.find_mut(stub) {
            Some(prefix) => prefix.add_address(address),
            None => Err(Error::UnknownPrefix(stub.to_string())),
        }
    }

    /// See [`PrefixRegistry::lookup_by_ip`].
    pub fn lookup_by_ip(&self, net: &IpNet) -> IpLookup {
        self.root.lookup_by_ip(net)
    }

    /// See [`PrefixRegistry::lookup_by_id`].
    pub fn lookup_by_id(&self, id: &str, stub_only: bool) -> Vec<&Prefix> {
        self.root.lookup_by_id(id, stub_only)
    }

    pub fn ancestors(&self, net: &IpNet) -> Vec<&Prefix> {
        self.root.ancestors(net)
    }

    pub fn find(&self, net: &IpNet) -> Option<&Prefix> {
        self.root.find(net)
    }

    pub fn find_mut(&mut self, net: &IpNet) -> Option<&mut Prefix> {
        self.root.find_mut(net)
    }

    pub fn address(&self, ip: IpAddr) -> Option<&Address> {
        self.root.address(ip)
    }

    pub fn address_mut(&mut self, ip: IpAddr) -> Option<&mut Address> {
        self.root.address_mut(ip)
    }

    /// Returns the most specific stub prefix containing `ip`.
    pub fn stub_for(&self, ip: IpAddr) -> Option<&Prefix> {
        self.root
            .ancestors(&IpNet::from(ip))
            .into_iter()
            .rev()
            .find(|p| p.is_stub())
    }

    pub fn af_list(&self) -> Vec<Family> {
        self.root.af_list()
    }

    /// Returns every prefix, each before its children.
    pub fn walk(&self) -> Vec<&Prefix> {
        self.root.walk()
    }

    /// Returns every address in every stub, in address-map order.
    pub fn addresses(&self) -> Vec<&Address> {
        self.walk()
            .into_iter()
            .filter_map(Prefix::addresses)
            .flat_map(|addresses| addresses.iter())
            .collect()
    }

    /// Returns the top-level prefixes.
    pub fn top(&self) -> &PrefixRegistry {
        &self.root
    }

    /// Returns the name of the prefix identical to `net`, if any.
    pub fn prefix_name(&self, net: &IpNet) -> Option<&str> {
        self.find(net).map(|p| p.name())
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::addr::Match;
    use crate::thing::{Provenance, Thing};

    fn prefix(text: &str, stub: bool) -> Prefix {
        Prefix::new(text, None, stub, Provenance::new("test")).unwrap()
    }

    fn net(text: &str) -> IpNet {
        text.parse().unwrap()
    }

    #[test]
    fn canonical_host_is_found_by_exact_lookup() {
        let mut map = AddressMap::new();
        map.add(prefix("10.0.0.0/24", true)).unwrap();
        let address = map
            .add_address(
                &net("10.0.0.0/24"),
                Address::new("10.0.0.5", false, Provenance::new("test")).unwrap(),
            )
            .unwrap();
        address
            .set_canonical_host(&Thing::new("foo.example.", Provenance::new("test")))
            .unwrap();

        let lookup = map.lookup_by_ip(&net("10.0.0.5/32"));
        match lookup.exact {
            Some(Match::Address(address)) => {
                assert_eq!(address.canonical_host(), Some("foo.example."))
            }
            other => panic!("expected an address, got {:?}", other),
        }
        assert!(lookup.path.is_empty());
    }

    #[test]
    fn overlapping_top_level_prefixes_are_rejected() {
        let mut map = AddressMap::new();
        map.add(prefix("10.0.0.0/24", true)).unwrap();
        assert!(matches!(
            map.add(prefix("10.0.0.0/25", true)),
            Err(Error::Overlap { .. })
        ));
    }

    #[test]
    fn add_under_and_stub_for() {
        let mut map = AddressMap::new();
        map.add(prefix("10.0.0.0/8", false)).unwrap();
        map.add_under(&net("10.0.0.0/8"), prefix("10.1.0.0/16", false))
            .unwrap();
        map.add_under(&net("10.1.0.0/16"), prefix("10.1.2.0/24", true))
            .unwrap();
        assert!(matches!(
            map.add_under(&net("192.0.2.0/24"), prefix("192.0.2.0/25", true)),
            Err(Error::UnknownPrefix(_))
        ));
        let ip = "10.1.2.3".parse().unwrap();
        assert_eq!(map.stub_for(ip).map(|p| p.name()), Some("10.1.2.0/24"));
        assert!(map.stub_for("10.2.0.1".parse().unwrap()).is_none());
        map.add_address(
            &net("10.1.2.0/24"),
            Address::from_ip(ip, true, Provenance::new("test")),
        )
        .unwrap();
        assert_eq!(map.addresses().len(), 1);
        assert!(map.address(ip).unwrap().is_reserved());
        assert_eq!(map.walk().len(), 3);
        assert_eq!(map.af_list(), [Family::V4]);
    }
}
