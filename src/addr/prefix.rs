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

//! Implementation of the [`Prefix`] structure.

use std::net::IpAddr;

use ipnet::IpNet;
use serde::{Deserialize, Serialize};

use super::{parse_net, Address, Containable, Error, Family, PrefixRegistry};
use crate::registry::Registry;
use crate::thing::{AsThing, Provenance, Thing};

/// The contents of a [`Prefix`]: more-specific prefixes for a block,
/// or addresses for a stub.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Children {
    Blocks(PrefixRegistry),
    Addresses(Registry<Address>),
}

/// A CIDR prefix in the address map.
///
/// A prefix is either a *block*, which only organizes more-specific
/// prefixes beneath it, or a *stub*, which holds the [`Address`]es of
/// one subnet and may be bound to a [`Network`](crate::network::Network).
/// A prefix's name is its canonical CIDR text; its optional `id` is a
/// secondary, non-unique name that networks use to find their stubs.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Prefix {
    thing: Thing,
    net: IpNet,
    id: Option<String>,
    plen: Option<u8>,
    network: Option<String>,
    children: Children,
}

impl Prefix {
    /// Parses a `Prefix`. This fails if the text is not a CIDR prefix or
    /// if it has host bits set.
    pub fn new(
        text: &str,
        id: Option<String>,
        stub: bool,
        provenance: Provenance,
    ) -> Result<Self, Error> {
        let net = parse_net(text)?;
        Ok(Self {
            thing: Thing::new(net.to_string(), provenance),
            net,
            id,
            plen: None,
            network: None,
            children: if stub {
                Children::Addresses(Registry::new())
            } else {
                Children::Blocks(PrefixRegistry::new())
            },
        })
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn is_stub(&self) -> bool {
        matches!(self.children, Children::Addresses(_))
    }

    /// Returns the mask length required of children, if fixed.
    pub fn plen(&self) -> Option<u8> {
        self.plen
    }

    /// Requires every child added from now on to have mask length
    /// `plen`, which must be longer than the prefix's own.
    pub fn set_plen(&mut self, plen: u8) -> Result<(), Error> {
        if plen <= self.net.prefix_len() || plen > self.net.max_prefix_len() {
            return Err(Error::InvalidPlen {
                prefix: self.name().to_owned(),
                plen,
            });
        }
        self.plen = Some(plen);
        Ok(())
    }

    /// Returns the name of the network bound to this (stub) prefix.
    pub fn network(&self) -> Option<&str> {
        self.network.as_deref()
    }

    pub fn set_network(&mut self, network: &str) -> Result<(), Error> {
        if !self.is_stub() {
            return Err(Error::NotStub(self.name().to_owned()));
        }
        self.network = Some(network.to_owned());
        Ok(())
    }

    pub fn children(&self) -> &Children {
        &self.children
    }

    /// Returns the more-specific prefixes of a block.
    pub fn blocks(&self) -> Option<&PrefixRegistry> {
        match self.children {
            Children::Blocks(ref blocks) => Some(blocks),
            Children::Addresses(_) => None,
        }
    }

    pub(super) fn blocks_mut(&mut self) -> Option<&mut PrefixRegistry> {
        match self.children {
            Children::Blocks(ref mut blocks) => Some(blocks),
            Children::Addresses(_) => None,
        }
    }

    /// Returns the addresses of a stub.
    pub fn addresses(&self) -> Option<&Registry<Address>> {
        match self.children {
            Children::Addresses(ref addresses) => Some(addresses),
            Children::Blocks(_) => None,
        }
    }

    pub fn address(&self, ip: IpAddr) -> Option<&Address> {
        self.addresses()?.lookup(&ip.to_string())
    }

    pub fn address_mut(&mut self, ip: IpAddr) -> Option<&mut Address> {
        match self.children {
            Children::Addresses(ref mut addresses) => addresses.lookup_mut(&ip.to_string()),
            Children::Blocks(_) => None,
        }
    }

    /// Adds a more-specific prefix beneath this one. This fails if the
    /// child is of a different address family, is not strictly within
    /// this prefix, does not have the required mask length, or overlaps
    /// an existing child, or if this prefix is a stub.
    pub fn add(&mut self, child: Prefix) -> Result<&mut Prefix, Error> {
        if Family::of(&self.net) != Family::of(&child.net) {
            return Err(Error::AddressFamilyMismatch {
                prefix: self.name().to_owned(),
                child: child.name().to_owned(),
            });
        }
        if !self.strictly_contains(&child.net) {
            return Err(Error::NotMoreSpecific {
                prefix: self.name().to_owned(),
                child: child.name().to_owned(),
            });
        }
        if let Some(plen) = self.plen {
            if child.net.prefix_len() != plen {
                return Err(Error::PlenMismatch {
                    prefix: self.name().to_owned(),
                    child: child.name().to_owned(),
                    plen,
                });
            }
        }
        let name = self.name().to_owned();
        match self.children {
            Children::Blocks(ref mut blocks) => blocks.add(child),
            Children::Addresses(_) => Err(Error::StubViolation {
                prefix: name,
                child: child.name().to_owned(),
            }),
        }
    }

    /// Adds an address to this (stub) prefix.
    pub fn add_address(&mut self, address: Address) -> Result<&mut Address, Error> {
        if !self.contains_net(&address.net()) {
            return Err(if Family::of(&self.net) != Family::of_addr(address.ip()) {
                Error::AddressFamilyMismatch {
                    prefix: self.name().to_owned(),
                    child: address.name().to_owned(),
                }
            } else {
                Error::NotMoreSpecific {
                    prefix: self.name().to_owned(),
                    child: address.name().to_owned(),
                }
            });
        }
        let name = self.name().to_owned();
        match self.children {
            Children::Addresses(ref mut addresses) => Ok(addresses.add(address)?),
            Children::Blocks(_) => Err(Error::NotStub(name)),
        }
    }
}

impl AsThing for Prefix {
    fn thing(&self) -> &Thing {
        &self.thing
    }

    fn thing_mut(&mut self) -> &mut Thing {
        &mut self.thing
    }
}

impl Containable for Prefix {
    fn net(&self) -> IpNet {
        self.net
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn prefix(text: &str, stub: bool) -> Prefix {
        Prefix::new(text, None, stub, Provenance::new("test")).unwrap()
    }

    fn address(text: &str) -> Address {
        Address::new(text, false, Provenance::new("test")).unwrap()
    }

    #[test]
    fn new_rejects_host_bits() {
        assert_eq!(
            Prefix::new("10.0.0.1/24", None, false, Provenance::new("test")),
            Err(Error::NonZeroHostPart("10.0.0.1/24".into()))
        );
        assert_eq!(prefix("10.0.0.0/24", true).name(), "10.0.0.0/24");
    }

    #[test]
    fn add_checks_family_containment_and_stub() {
        let mut block = prefix("10.0.0.0/16", false);
        assert!(matches!(
            block.add(prefix("2001:db8::/64", true)),
            Err(Error::AddressFamilyMismatch { .. })
        ));
        assert!(matches!(
            block.add(prefix("10.1.0.0/24", true)),
            Err(Error::NotMoreSpecific { .. })
        ));
        assert!(matches!(
            block.add(prefix("10.0.0.0/16", true)),
            Err(Error::NotMoreSpecific { .. })
        ));
        block.add(prefix("10.0.1.0/24", true)).unwrap();

        let mut stub = prefix("10.0.2.0/24", true);
        assert!(matches!(
            stub.add(prefix("10.0.2.0/25", true)),
            Err(Error::StubViolation { .. })
        ));
        assert!(matches!(
            block.add_address(address("10.0.0.1")),
            Err(Error::NotStub(_))
        ));
    }

    #[test]
    fn plen_is_enforced() {
        let mut block = prefix("10.0.0.0/16", false);
        assert!(matches!(block.set_plen(16), Err(Error::InvalidPlen { .. })));
        assert!(matches!(block.set_plen(33), Err(Error::InvalidPlen { .. })));
        block.set_plen(24).unwrap();
        assert!(matches!(
            block.add(prefix("10.0.0.0/25", true)),
            Err(Error::PlenMismatch { plen: 24, .. })
        ));
        block.add(prefix("10.0.0.0/24", true)).unwrap();
    }

    #[test]
    fn stub_holds_addresses() {
        let mut stub = prefix("10.0.0.0/24", true);
        stub.add_address(address("10.0.0.5")).unwrap();
        assert!(matches!(
            stub.add_address(address("10.0.0.5")),
            Err(Error::Duplicate(_))
        ));
        assert!(matches!(
            stub.add_address(address("10.0.1.5")),
            Err(Error::NotMoreSpecific { .. })
        ));
        assert!(matches!(
            stub.add_address(address("2001:db8::5")),
            Err(Error::AddressFamilyMismatch { .. })
        ));
        assert!(stub.address("10.0.0.5".parse().unwrap()).is_some());
        assert!(stub.set_network("lan").is_ok());
        assert_eq!(stub.network(), Some("lan"));
    }
}
