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

//! The address map: a hierarchy of non-overlapping CIDR [`Prefix`]es
//! whose leaves (stub prefixes) hold the individual [`Address`]es that
//! are assigned to hosts.

use std::fmt;
use std::net::IpAddr;

use ipnet::IpNet;
use serde::{Deserialize, Serialize};

mod address;
mod error;
mod map;
mod prefix;
mod registry;

pub use address::Address;
pub use error::Error;
pub use map::AddressMap;
pub use prefix::{Children, Prefix};
pub use registry::{IpLookup, Match, PrefixRegistry};

////////////////////////////////////////////////////////////////////////
// ADDRESS FAMILIES                                                   //
////////////////////////////////////////////////////////////////////////

/// An IP address family.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub enum Family {
    V4,
    V6,
}

impl Family {
    pub fn of(net: &IpNet) -> Self {
        match net {
            IpNet::V4(_) => Self::V4,
            IpNet::V6(_) => Self::V6,
        }
    }

    pub fn of_addr(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => Self::V4,
            IpAddr::V6(_) => Self::V6,
        }
    }

    /// Returns the mask length of a single address of this family.
    pub fn max_prefix_len(self) -> u8 {
        match self {
            Self::V4 => 32,
            Self::V6 => 128,
        }
    }

    /// Returns the IANA address family number used in APL records
    /// ([RFC 3123 § 4]).
    ///
    /// [RFC 3123 § 4]: https://datatracker.ietf.org/doc/html/rfc3123#section-4
    pub fn apl_family(self) -> u16 {
        match self {
            Self::V4 => 1,
            Self::V6 => 2,
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::V4 => f.write_str("IPv4"),
            Self::V6 => f.write_str("IPv6"),
        }
    }
}

////////////////////////////////////////////////////////////////////////
// PARSING AND CONTAINMENT                                            //
////////////////////////////////////////////////////////////////////////

/// Parses a prefix in CIDR notation, or a single address (which is
/// treated as a prefix of maximum length). Host bits must be zero.
pub fn parse_net(text: &str) -> Result<IpNet, Error> {
    let trimmed = text.trim();
    if trimmed.contains('/') {
        let net: IpNet = trimmed
            .parse()
            .map_err(|_| Error::MalformedAddress(text.to_owned()))?;
        if net.trunc() != net {
            return Err(Error::NonZeroHostPart(text.to_owned()));
        }
        Ok(net)
    } else {
        trimmed
            .parse::<IpAddr>()
            .map(IpNet::from)
            .map_err(|_| Error::MalformedAddress(text.to_owned()))
    }
}

/// Entities that cover a range of addresses.
pub trait Containable {
    /// Returns the range of addresses the entity covers.
    fn net(&self) -> IpNet;

    fn family(&self) -> Family {
        Family::of(&self.net())
    }

    /// Returns whether `other` lies within (or is identical to) the
    /// entity's range.
    fn contains_net(&self, other: &IpNet) -> bool {
        self.net().contains(other)
    }

    /// Returns whether `other` lies within the entity's range and is
    /// not identical to it.
    fn strictly_contains(&self, other: &IpNet) -> bool {
        self.net() != *other && self.contains_net(other)
    }
}

impl Containable for IpNet {
    fn net(&self) -> IpNet {
        *self
    }
}

////////////////////////////////////////////////////////////////////////
// TESTS                                                              //
////////////////////////////////////////////////////////////////////////
