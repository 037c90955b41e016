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

//! IPv6 interface identifiers (IIDs) and the synthesis of host
//! addresses from them.

use std::collections::BTreeMap;
use std::fmt;
use std::net::Ipv6Addr;

use ipnet::Ipv6Net;
use serde::{Deserialize, Serialize};

use crate::registry::{DuplicateName, Registry};
use crate::thing::{AsThing, Provenance, Thing};

////////////////////////////////////////////////////////////////////////
// IIDS                                                               //
////////////////////////////////////////////////////////////////////////

/// A 64-bit interface identifier registered under a host name.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Iid {
    thing: Thing,
    value: u64,
    in_use: bool,
}

impl Iid {
    /// Parses an IID. The text may be an IPv6 address whose upper 64
    /// bits are zero (e.g. `::1:2`), or up to four colon-separated
    /// groups of hexadecimal digits (e.g. `0:0:1:2`).
    pub fn new(name: &str, text: &str, provenance: Provenance) -> Result<Self, Error> {
        Ok(Self {
            thing: Thing::new(crate::util::fqdn(name), provenance),
            value: parse_iid(text)?,
            in_use: false,
        })
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn in_use(&self) -> bool {
        self.in_use
    }

    /// Returns the IID as the low half of an otherwise-zero IPv6
    /// address, e.g. `::1:2`.
    pub fn text(&self) -> String {
        Ipv6Addr::from(u128::from(self.value)).to_string()
    }
}

impl AsThing for Iid {
    fn thing(&self) -> &Thing {
        &self.thing
    }

    fn thing_mut(&mut self) -> &mut Thing {
        &mut self.thing
    }
}

fn parse_iid(text: &str) -> Result<u64, Error> {
    let trimmed = text.trim();
    if trimmed.contains("::") {
        let address: Ipv6Addr = trimmed
            .parse()
            .map_err(|_| Error::Malformed(text.to_owned()))?;
        let bits = u128::from(address);
        if bits >> 64 != 0 {
            return Err(Error::Malformed(text.to_owned()));
        }
        return Ok(bits as u64);
    }

    let groups: Vec<&str> = trimmed.split(':').collect();
    if groups.len() > 4 {
        return Err(Error::Malformed(text.to_owned()));
    }
    let mut value = 0u64;
    for group in groups {
        if group.is_empty() || group.len() > 4 {
            return Err(Error::Malformed(text.to_owned()));
        }
        let group = u16::from_str_radix(group, 16).map_err(|_| Error::Malformed(text.to_owned()))?;
        value = (value << 16) | u64::from(group);
    }
    Ok(value)
}

////////////////////////////////////////////////////////////////////////
// IID REGISTRY                                                       //
////////////////////////////////////////////////////////////////////////

/// The registered [`Iid`]s, indexed by name and by value. Both must be
/// unique.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct IidRegistry {
    iids: Registry<Iid>,
    values: BTreeMap<u64, String>,
}

impl IidRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, iid: Iid) -> Result<&mut Iid, Error> {
        if let Some(existing) = self.by_value(iid.value) {
            return Err(Error::DuplicateValue {
                value: iid.text(),
                existing: existing.name().to_owned(),
                first: existing.provenance().clone(),
            });
        }
        let value = iid.value;
        let name = iid.name().to_owned();
        let added = self.iids.add(iid)?;
        self.values.insert(value, name);
        Ok(added)
    }

    pub fn lookup(&self, name: &str) -> Option<&Iid> {
        self.iids.lookup(&crate::util::fqdn(name))
    }

    pub fn by_value(&self, value: u64) -> Option<&Iid> {
        self.values
            .get(&value)
            .and_then(|name| self.iids.lookup(name))
    }

    /// Combines the IID registered under `name` with `prefix`, which
    /// must be a /64 or shorter, and marks the IID as used.
    pub fn synthesize(&mut self, name: &str, prefix: &Ipv6Net) -> Result<Ipv6Addr, Error> {
        if prefix.prefix_len() > 64 {
            return Err(Error::PrefixTooLong(prefix.to_string()));
        }
        let iid = match self.iids.lookup_mut(&crate::util::fqdn(name)) {
            Some(iid) => iid,
            None => return Err(Error::Unknown(name.to_owned())),
        };
        iid.in_use = true;
        let network = u128::from(prefix.network());
        Ok(Ipv6Addr::from(network | u128::from(iid.value)))
    }

    /// Returns the IIDs that were never used to synthesize an address.
    pub fn unused(&self) -> Vec<&Iid> {
        self.iids.iter().filter(|iid| !iid.in_use).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<Iid> {
        self.iids.iter()
    }

    pub fn len(&self) -> usize {
        self.iids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.iids.is_empty()
    }
}

////////////////////////////////////////////////////////////////////////
// ERRORS                                                             //
////////////////////////////////////////////////////////////////////////

/// Errors that arise when registering and using IIDs.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    Malformed(String),
    DuplicateValue {
        value: String,
        existing: String,
        first: Provenance,
    },
    Unknown(String),
    PrefixTooLong(String),
    Duplicate(DuplicateName),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::Malformed(ref text) => write!(f, "{} is not a valid interface identifier", text),
            Self::DuplicateValue {
                ref value,
                ref existing,
                ref first,
            } => write!(
                f,
                "the interface identifier {} is already registered for {} (at {})",
                value, existing, first,
            ),
            Self::Unknown(ref name) => write!(f, "no interface identifier is registered for {}", name),
            Self::PrefixTooLong(ref prefix) => write!(
                f,
                "cannot synthesize an address in {}: the prefix is longer than /64",
                prefix,
            ),
            Self::Duplicate(ref e) => e.fmt(f),
        }
    }
}

impl From<DuplicateName> for Error {
    fn from(error: DuplicateName) -> Self {
        Self::Duplicate(error)
    }
}

impl std::error::Error for Error {}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn iid(name: &str, text: &str) -> Iid {
        Iid::new(name, text, Provenance::new("test")).unwrap()
    }

    #[test]
    fn parse_accepts_both_forms() {
        assert_eq!(iid("a", "::1:2").value(), 0x1_0002);
        assert_eq!(iid("a", "0:0:1:2").value(), 0x1_0002);
        assert_eq!(iid("a", "dead:beef:0:1").value(), 0xdead_beef_0000_0001);
        assert_eq!(iid("a", "dead:beef:0:1").text(), "::dead:beef:0:1");
        for bad in ["1:2:3:4:5", "2001:db8::1", "xyz", "1::2::3", "12345"] {
            assert_eq!(
                Iid::new("a", bad, Provenance::new("test")),
                Err(Error::Malformed(bad.into()))
            );
        }
    }

    #[test]
    fn synthesize_marks_in_use() {
        let mut registry = IidRegistry::new();
        registry.add(iid("foo.example", "::1:2")).unwrap();
        registry.add(iid("bar.example", "::3")).unwrap();
        assert!(matches!(
            registry.add(iid("baz.example", "0:0:0:3")),
            Err(Error::DuplicateValue { ref existing, .. }) if existing == "bar.example."
        ));
        assert!(matches!(
            registry.add(iid("FOO.example.", "::9")),
            Err(Error::Duplicate(_))
        ));

        let prefix: Ipv6Net = "2001:db8:1::/48".parse().unwrap();
        assert_eq!(
            registry.synthesize("foo.example.", &prefix).unwrap(),
            "2001:db8:1::1:2".parse::<Ipv6Addr>().unwrap()
        );
        let long: Ipv6Net = "2001:db8::/96".parse().unwrap();
        assert!(matches!(
            registry.synthesize("bar.example.", &long),
            Err(Error::PrefixTooLong(_))
        ));
        assert!(matches!(
            registry.synthesize("nope.example.", &prefix),
            Err(Error::Unknown(_))
        ));
        let unused: Vec<_> = registry.unused().iter().map(|i| i.name().to_owned()).collect();
        assert_eq!(unused, ["bar.example."]);
        assert_eq!(registry.by_value(0x1_0002).unwrap().name(), "foo.example.");
    }
}
