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

//! Implementation of the [`Error`] type for network and host errors.

use std::fmt;

use crate::addr;
use crate::registry::DuplicateName;

/// Errors that arise when building networks and their hosts.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// A prefix bound to the network is not a stub.
    NotStub(String),

    /// The prefix is already bound to a different network.
    AlreadyBound { prefix: String, network: String },

    /// A second IPv4 prefix was bound to the network.
    MultipleIpv4 {
        network: String,
        existing: String,
        new: String,
    },

    /// The address is not within any of the network's prefixes.
    NotCovered { network: String, address: String },

    /// The host is not part of the network.
    UnknownHost { network: String, host: String },

    /// The address map rejected an operation.
    Address(addr::Error),

    /// A host or alias name was defined twice.
    Duplicate(DuplicateName),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::NotStub(ref prefix) => write!(
                f,
                "{} is not a stub prefix and cannot be bound to a network",
                prefix,
            ),
            Self::AlreadyBound {
                ref prefix,
                ref network,
            } => write!(f, "{} is already bound to the network {}", prefix, network),
            Self::MultipleIpv4 {
                ref network,
                ref existing,
                ref new,
            } => write!(
                f,
                "the network {} already has the IPv4 prefix {}; it cannot also have {}",
                network, existing, new,
            ),
            Self::NotCovered {
                ref network,
                ref address,
            } => write!(
                f,
                "{} is not within any prefix of the network {}",
                address, network,
            ),
            Self::UnknownHost {
                ref network,
                ref host,
            } => write!(f, "the network {} has no host {}", network, host),
            Self::Address(ref e) => e.fmt(f),
            Self::Duplicate(ref e) => e.fmt(f),
        }
    }
}

impl From<addr::Error> for Error {
    fn from(error: addr::Error) -> Self {
        Self::Address(error)
    }
}

impl From<DuplicateName> for Error {
    fn from(error: DuplicateName) -> Self {
        Self::Duplicate(error)
    }
}

impl std::error::Error for Error {}
