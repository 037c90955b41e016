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

//! Implementation of the [`Address`] structure.

use std::net::IpAddr;

use ipnet::IpNet;
use serde::{Deserialize, Serialize};

use super::{parse_net, Containable, Error, Family};
use crate::thing::{AsThing, Provenance, Thing};
use crate::util::Caseless;

/// A single IP address within a stub [`Prefix`](super::Prefix).
///
/// An `Address` is named by its address text. It records the names of
/// all hosts bound to it and, separately, the one host (if any) that is
/// its canonical host: the target of its PTR record. Reserved addresses
/// cannot have a canonical host.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Address {
    thing: Thing,
    ip: IpAddr,
    id: Option<String>,
    reserved: bool,
    canonical: Option<String>,
    hosts: Vec<String>,
}

impl Address {
    /// Parses an `Address`. A mask length is accepted only if it is the
    /// maximum for the address family.
    pub fn new(text: &str, reserved: bool, provenance: Provenance) -> Result<Self, Error> {
        let net = parse_net(text)?;
        if net.prefix_len() != Family::of(&net).max_prefix_len() {
            return Err(Error::NotHostAddress(text.to_owned()));
        }
        Ok(Self::from_ip(net.addr(), reserved, provenance))
    }

    pub fn from_ip(ip: IpAddr, reserved: bool, provenance: Provenance) -> Self {
        Self {
            thing: Thing::new(ip.to_string(), provenance),
            ip,
            id: None,
            reserved,
            canonical: None,
            hosts: Vec::new(),
        }
    }

    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    /// Returns the name of the canonical host, which is also the
    /// address's id once one is set.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn is_reserved(&self) -> bool {
        self.reserved
    }

    pub fn canonical_host(&self) -> Option<&str> {
        self.canonical.as_deref()
    }

    /// Returns the names of every host bound to the address, in the
    /// order they were bound.
    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    /// Makes `host` the address's canonical host, taking over its
    /// description and using its name as the address's id.
    pub fn set_canonical_host<H: AsThing>(&mut self, host: &H) -> Result<(), Error> {
        if self.reserved {
            return Err(Error::Reserved {
                address: self.name().to_owned(),
                host: host.name().to_owned(),
            });
        }
        if let Some(ref existing) = self.canonical {
            return Err(Error::AlreadyCanonical {
                address: self.name().to_owned(),
                existing: existing.clone(),
                host: host.name().to_owned(),
            });
        }
        self.thing
            .set_description(host.description().map(str::to_owned));
        self.id = Some(host.name().to_owned());
        self.canonical = Some(host.name().to_owned());
        Ok(())
    }

    /// Binds a host to the address. Binding the same host twice has no
    /// effect.
    pub fn add_host(&mut self, host: &str) {
        if !self.hosts.iter().any(|h| Caseless(h) == Caseless(host)) {
            self.hosts.push(host.to_owned());
        }
    }
}

impl AsThing for Address {
    fn thing(&self) -> &Thing {
        &self.thing
    }

    fn thing_mut(&mut self) -> &mut Thing {
        &mut self.thing
    }
}

impl Containable for Address {
    fn net(&self) -> IpNet {
        IpNet::from(self.ip)
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn host(name: &str, description: &str) -> Thing {
        let mut host = Thing::new(name, Provenance::new("test"));
        host.set_description(Some(description.into()));
        host
    }

    #[test]
    fn new_requires_single_address() {
        let address = Address::new("10.0.0.5/32", false, Provenance::new("test")).unwrap();
        assert_eq!(address.name(), "10.0.0.5");
        assert_eq!(
            Address::new("10.0.0.0/24", false, Provenance::new("test")),
            Err(Error::NotHostAddress("10.0.0.0/24".into()))
        );
        assert!(Address::new("2001:db8::1", false, Provenance::new("test")).is_ok());
    }

    #[test]
    fn canonical_host_is_set_once() {
        let mut address = Address::new("10.0.0.5", false, Provenance::new("test")).unwrap();
        address.set_canonical_host(&host("foo.example.", "Foo")).unwrap();
        assert_eq!(address.canonical_host(), Some("foo.example."));
        assert_eq!(address.id(), Some("foo.example."));
        assert_eq!(address.description(), Some("Foo"));
        assert!(matches!(
            address.set_canonical_host(&host("bar.example.", "Bar")),
            Err(Error::AlreadyCanonical { ref existing, .. }) if existing == "foo.example."
        ));
    }

    #[test]
    fn reserved_address_rejects_canonical_host() {
        let mut address = Address::new("10.0.0.1", true, Provenance::new("test")).unwrap();
        assert!(matches!(
            address.set_canonical_host(&host("gw.example.", "Gateway")),
            Err(Error::Reserved { .. })
        ));
        address.add_host("gw.example.");
        address.add_host("GW.example.");
        assert_eq!(address.hosts(), ["gw.example."]);
    }
}
