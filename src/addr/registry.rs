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

//! Implementation of the [`PrefixRegistry`] structure and of lookups
//! through the prefix hierarchy.

use std::net::IpAddr;

use ipnet::IpNet;
use serde::{Deserialize, Serialize};

use super::{Address, Children, Containable, Error, Family, Prefix};
use crate::registry::Registry;
use crate::thing::AsThing;

/// The result of [`PrefixRegistry::lookup_by_ip`].
#[derive(Clone, Debug, Default)]
pub struct IpLookup<'a> {
    /// The prefix or address identical to the searched-for range.
    pub exact: Option<Match<'a>>,

    /// The prefixes strictly containing the searched-for range, from
    /// the outermost to the most specific. This is empty when there is
    /// an exact match.
    pub path: Vec<&'a Prefix>,
}

/// An exact match found by [`PrefixRegistry::lookup_by_ip`].
#[derive(Clone, Copy, Debug)]
pub enum Match<'a> {
    Prefix(&'a Prefix),
    Address(&'a Address),
}

/// A set of sibling [`Prefix`]es, which never overlap.
///
/// Besides the name index of the underlying [`Registry`], the
/// `PrefixRegistry` keeps the positions of its prefixes partitioned by
/// address family, so that searches only scan prefixes of the relevant
/// family.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(from = "Registry<Prefix>", into = "Registry<Prefix>")]
pub struct PrefixRegistry {
    prefixes: Registry<Prefix>,
    v4: Vec<usize>,
    v6: Vec<usize>,
}

impl From<Registry<Prefix>> for PrefixRegistry {
    fn from(prefixes: Registry<Prefix>) -> Self {
        let mut v4 = Vec::new();
        let mut v6 = Vec::new();
        for (position, prefix) in prefixes.iter().enumerate() {
            match Family::of(&prefix.net()) {
                Family::V4 => v4.push(position),
                Family::V6 => v6.push(position),
            }
        }
        Self { prefixes, v4, v6 }
    }
}

impl From<PrefixRegistry> for Registry<Prefix> {
    fn from(registry: PrefixRegistry) -> Self {
        registry.prefixes
    }
}

impl PrefixRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn positions(&self, family: Family) -> &[usize] {
        match family {
            Family::V4 => &self.v4,
            Family::V6 => &self.v6,
        }
    }

    /// Adds a prefix. This fails if an identical prefix is present, or
    /// if the prefix overlaps one that is present.
    ///
    /// The overlap check scans every sibling of the same family, so
    /// building a level of n prefixes takes O(n²) time. That is fine for
    /// address plans of a few thousand entries; a much larger map would
    /// want an interval index here.
    pub fn add(&mut self, prefix: Prefix) -> Result<&mut Prefix, Error> {
        let family = prefix.family();
        let net = prefix.net();
        for existing in self.iter_family(family) {
            let other = existing.net();
            if other != net && (other.contains(&net) || net.contains(&other)) {
                return Err(Error::Overlap {
                    new: prefix.name().to_owned(),
                    existing: existing.name().to_owned(),
                    first: existing.provenance().clone(),
                });
            }
        }

        let position = self.prefixes.len();
        let added = self.prefixes.add(prefix)?;
        match family {
            Family::V4 => self.v4.push(position),
            Family::V6 => self.v6.push(position),
        }
        Ok(added)
    }

    /// Returns the address families of the prefixes present, in order.
    pub fn af_list(&self) -> Vec<Family> {
        [Family::V4, Family::V6]
            .into_iter()
            .filter(|&family| !self.positions(family).is_empty())
            .collect()
    }

    /// Returns an iterator over the prefixes of one family, in the
    /// order they were added.
    pub fn iter_family(&self, family: Family) -> impl Iterator<Item = &Prefix> {
        self.positions(family)
            .iter()
            .filter_map(move |&position| self.prefixes.get(position))
    }

    /// Returns an iterator over all prefixes, in the order they were
    /// added.
    pub fn iter(&self) -> std::slice::Iter<Prefix> {
        self.prefixes.iter()
    }

    /// Looks up a prefix by its CIDR text.
    pub fn lookup(&self, name: &str) -> Option<&Prefix> {
        self.prefixes.lookup(name)
    }

    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// Performs a longest-prefix-match search for `net`.
    ///
    /// The search descends through the prefixes that contain `net`,
    /// scanning each level linearly, and into the addresses of a stub
    /// when `net` is a single address. It stops at the first prefix or
    /// address identical to `net`, or at the first level where no
    /// prefix contains `net`.
    pub fn lookup_by_ip(&self, net: &IpNet) -> IpLookup {
        let (exact, path) = self.descend(net);
        match exact {
            Some(_) => IpLookup {
                exact,
                path: Vec::new(),
            },
            None => IpLookup { exact, path },
        }
    }

    /// Returns the prefixes strictly containing `net`, from the
    /// outermost to the most specific.
    pub fn ancestors(&self, net: &IpNet) -> Vec<&Prefix> {
        self.descend(net).1
    }

    fn descend(&self, net: &IpNet) -> (Option<Match>, Vec<&Prefix>) {
        let mut path = Vec::new();
        let mut level = self;
        loop {
            let prefix = match level
                .iter_family(Family::of(net))
                .find(|p| p.contains_net(net))
            {
                Some(prefix) => prefix,
                None => break,
            };
            if prefix.net() == *net {
                return (Some(Match::Prefix(prefix)), path);
            }
            path.push(prefix);
            match prefix.children() {
                Children::Blocks(ref blocks) => level = blocks,
                Children::Addresses(ref addresses) => {
                    if net.prefix_len() == net.max_prefix_len() {
                        if let Some(address) = addresses.lookup(&net.addr().to_string()) {
                            return (Some(Match::Address(address)), path);
                        }
                    }
                    break;
                }
            }
        }
        (None, path)
    }

    /// Returns every prefix with the given id, searching depth-first.
    /// Stub prefixes are searched but not descended into. With
    /// `stub_only`, only stub prefixes are returned.
    pub fn lookup_by_id(&self, id: &str, stub_only: bool) -> Vec<&Prefix> {
        let mut found = Vec::new();
        self.collect_by_id(id, stub_only, &mut found);
        found
    }

    fn collect_by_id<'a>(&'a self, id: &str, stub_only: bool, found: &mut Vec<&'a Prefix>) {
        for prefix in self.prefixes.iter() {
            let id_matches = prefix
                .id()
                .map_or(false, |own| own.eq_ignore_ascii_case(id));
            if id_matches && (!stub_only || prefix.is_stub()) {
                found.push(prefix);
            }
            if let Some(blocks) = prefix.blocks() {
                blocks.collect_by_id(id, stub_only, found);
            }
        }
    }

    /// Finds the prefix identical to `net` anywhere in the hierarchy.
    pub fn find(&self, net: &IpNet) -> Option<&Prefix> {
        match self.descend(net).0 {
            Some(Match::Prefix(prefix)) => Some(prefix),
            _ => None,
        }
    }

    pub fn find_mut(&mut self, net: &IpNet) -> Option<&mut Prefix> {
        let position = self.containing_position(net)?;
        let prefix = self.prefixes.get_mut(position)?;
        if prefix.net() == *net {
            Some(prefix)
        } else {
            prefix.blocks_mut()?.find_mut(net)
        }
    }

    /// Finds the address `ip` in whichever stub holds it.
    pub fn address(&self, ip: IpAddr) -> Option<&Address> {
        match self.descend(&IpNet::from(ip)).0 {
            Some(Match::Address(address)) => Some(address),
            _ => None,
        }
    }

    pub fn address_mut(&mut self, ip: IpAddr) -> Option<&mut Address> {
        let net = IpNet::from(ip);
        let position = self.containing_position(&net)?;
        let prefix = self.prefixes.get_mut(position)?;
        if prefix.is_stub() {
            prefix.address_mut(ip)
        } else {
            prefix.blocks_mut()?.address_mut(ip)
        }
    }

    /// Returns the position of the prefix at this level that contains
    /// `net`, if any.
    fn containing_position(&self, net: &IpNet) -> Option<usize> {
        self.positions(Family::of(net)).iter().copied().find(|&position| {
            self.prefixes
                .get(position)
                .map_or(false, |p| p.contains_net(net))
        })
    }

    /// Returns every prefix in the hierarchy, each before its children,
    /// siblings in the order they were added.
    pub fn walk(&self) -> Vec<&Prefix> {
        let mut all = Vec::new();
        self.walk_into(&mut all);
        all
    }

    fn walk_into<'a>(&'a self, all: &mut Vec<&'a Prefix>) {
        for prefix in self.prefixes.iter() {
            all.push(prefix);
            if let Some(blocks) = prefix.blocks() {
                blocks.walk_into(all);
            }
        }
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use ipnet::Ipv4Net;
    use proptest::prelude::*;

    use super::*;
    use crate::thing::Provenance;

    fn prefix(text: &str, stub: bool) -> Prefix {
        Prefix::new(text, None, stub, Provenance::new("test")).unwrap()
    }

    fn net(text: &str) -> IpNet {
        text.parse().unwrap()
    }

    #[test]
    fn overlapping_siblings_are_rejected() {
        let mut registry = PrefixRegistry::new();
        registry.add(prefix("10.0.0.0/24", true)).unwrap();
        match registry.add(prefix("10.0.0.0/25", true)) {
            Err(Error::Overlap {
                new,
                existing,
                first,
            }) => {
                assert_eq!(new, "10.0.0.0/25");
                assert_eq!(existing, "10.0.0.0/24");
                assert_eq!(first, Provenance::new("test"));
            }
            other => panic!("expected an overlap error, got {:?}", other),
        }
        assert!(matches!(
            registry.add(prefix("10.0.0.0/8", false)),
            Err(Error::Overlap { .. })
        ));
        assert!(matches!(
            registry.add(prefix("10.0.0.0/24", false)),
            Err(Error::Duplicate(_))
        ));
        registry.add(prefix("10.0.1.0/24", true)).unwrap();
        registry.add(prefix("2001:db8::/64", true)).unwrap();
        assert_eq!(registry.af_list(), [Family::V4, Family::V6]);
        assert_eq!(registry.iter_family(Family::V6).count(), 1);
    }

    #[test]
    fn deserialization_rebuilds_family_positions() {
        let mut registry = PrefixRegistry::new();
        registry.add(prefix("2001:db8::/64", true)).unwrap();
        registry.add(prefix("10.0.0.0/24", true)).unwrap();
        registry.add(prefix("10.0.1.0/24", true)).unwrap();

        let json = serde_json::to_string(&registry).unwrap();
        let restored: PrefixRegistry = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, registry);
        assert_eq!(restored.iter_family(Family::V4).count(), 2);
        assert!(restored.lookup_by_ip(&net("10.0.1.0/24")).exact.is_some());
    }

    #[test]
    fn lookup_by_ip_finds_exact_match_or_path() {
        let mut registry = PrefixRegistry::new();
        let block = registry.add(prefix("10.0.0.0/16", false)).unwrap();
        let mut stub = prefix("10.0.1.0/24", true);
        stub.add_address(Address::new("10.0.1.5", false, Provenance::new("test")).unwrap())
            .unwrap();
        block.add(stub).unwrap();

        let lookup = registry.lookup_by_ip(&net("10.0.1.5/32"));
        assert!(matches!(lookup.exact, Some(Match::Address(a)) if a.name() == "10.0.1.5"));
        assert!(lookup.path.is_empty());

        let lookup = registry.lookup_by_ip(&net("10.0.1.6/32"));
        assert!(lookup.exact.is_none());
        let path: Vec<_> = lookup.path.iter().map(|p| p.name()).collect();
        assert_eq!(path, ["10.0.0.0/16", "10.0.1.0/24"]);

        let lookup = registry.lookup_by_ip(&net("10.0.1.0/24"));
        assert!(matches!(lookup.exact, Some(Match::Prefix(p)) if p.name() == "10.0.1.0/24"));
        assert!(lookup.path.is_empty());
        assert_eq!(registry.ancestors(&net("10.0.1.0/24")).len(), 1);

        assert!(registry.lookup_by_ip(&net("192.0.2.1/32")).path.is_empty());
        assert!(registry.address_mut("10.0.1.5".parse().unwrap()).is_some());
        assert!(registry.find_mut(&net("10.0.1.0/24")).is_some());
        assert!(registry.find(&net("10.0.2.0/24")).is_none());
    }

    #[test]
    fn lookup_by_id_searches_depth_first() {
        let mut registry = PrefixRegistry::new();
        let block = registry
            .add(Prefix::new("10.0.0.0/16", Some("lan".into()), false, Provenance::new("a")).unwrap())
            .unwrap();
        block
            .add(Prefix::new("10.0.1.0/24", Some("LAN".into()), true, Provenance::new("b")).unwrap())
            .unwrap();
        block
            .add(Prefix::new("10.0.2.0/24", Some("dmz".into()), true, Provenance::new("c")).unwrap())
            .unwrap();

        let names = |found: Vec<&Prefix>| found.iter().map(|p| p.name().to_owned()).collect::<Vec<_>>();
        assert_eq!(names(registry.lookup_by_id("lan", false)), ["10.0.0.0/16", "10.0.1.0/24"]);
        assert_eq!(names(registry.lookup_by_id("lan", true)), ["10.0.1.0/24"]);
        assert!(registry.lookup_by_id("wan", false).is_empty());
        assert_eq!(registry.walk().len(), 3);
    }

    fn arb_ipv4_net() -> impl Strategy<Value = IpNet> {
        (any::<u32>(), 4u8..=30).prop_map(|(bits, len)| {
            IpNet::V4(Ipv4Net::new(Ipv4Addr::from(bits & 0x0fff_ffff), len).unwrap().trunc())
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn siblings_never_overlap(nets in prop::collection::vec(arb_ipv4_net(), 1..40)) {
            let mut registry = PrefixRegistry::new();
            for net in &nets {
                let _ = registry.add(prefix(&net.to_string(), false));
            }
            let siblings: Vec<IpNet> = registry.iter().map(|p| p.net()).collect();
            for (i, a) in siblings.iter().enumerate() {
                for b in &siblings[i + 1..] {
                    prop_assert!(!a.contains(b) && !b.contains(a), "{} and {} overlap", a, b);
                }
            }
        }

        #[test]
        fn lookup_paths_are_shrinking_chains(
            nets in prop::collection::vec(arb_ipv4_net(), 1..40),
            probe in any::<u32>(),
        ) {
            let mut registry = PrefixRegistry::new();
            for net in &nets {
                let child = prefix(&net.to_string(), false);
                let parent = registry.ancestors(net).last().map(|p| p.net());
                let _ = match parent {
                    Some(parent) => match registry.find_mut(&parent) {
                        Some(parent) => parent.add(child).map(|_| ()),
                        None => Ok(()),
                    },
                    None => registry.add(child).map(|_| ()),
                };
            }

            let probe = IpNet::from(IpAddr::from(Ipv4Addr::from(probe & 0x0fff_ffff)));
            let lookup = registry.lookup_by_ip(&probe);
            for pair in lookup.path.windows(2) {
                prop_assert!(pair[0].strictly_contains(&pair[1].net()));
            }
            for prefix in &lookup.path {
                prop_assert!(prefix.contains_net(&probe));
            }
            if lookup.exact.is_some() {
                prop_assert!(lookup.path.is_empty());
            }
        }
    }
}
