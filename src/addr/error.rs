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

//! Implementation of the [`Error`] type for address-map errors.

use std::fmt;

use crate::registry::DuplicateName;
use crate::thing::Provenance;

/// Errors that arise when building the address map.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// The text is not an address or CIDR prefix.
    MalformedAddress(String),

    /// The prefix has bits set beyond its mask length.
    NonZeroHostPart(String),

    /// An address was expected, but the text names a shorter prefix.
    NotHostAddress(String),

    /// A child of a different address family was added to a prefix.
    AddressFamilyMismatch { prefix: String, child: String },

    /// A child that is not strictly within a prefix was added to it.
    NotMoreSpecific { prefix: String, child: String },

    /// A prefix was added beneath a stub prefix, which may only hold
    /// addresses.
    StubViolation { prefix: String, child: String },

    /// An operation that requires a stub prefix was given another kind.
    NotStub(String),

    /// A child's mask length differs from the length the parent
    /// requires of its children.
    PlenMismatch { prefix: String, child: String, plen: u8 },

    /// A required child mask length is not longer than the prefix's own
    /// (or exceeds the address length).
    InvalidPlen { prefix: String, plen: u8 },

    /// The new prefix overlaps a sibling.
    Overlap {
        new: String,
        existing: String,
        first: Provenance,
    },

    /// A prefix the operation refers to does not exist in the map.
    UnknownPrefix(String),

    /// An address already has a canonical host.
    AlreadyCanonical {
        address: String,
        existing: String,
        host: String,
    },

    /// A reserved address cannot be assigned a canonical host.
    Reserved { address: String, host: String },

    /// The same prefix or address was added twice.
    Duplicate(DuplicateName),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Self::MalformedAddress(ref text) => {
                write!(f, "{} is not a valid address or prefix", text)
            }
            Self::NonZeroHostPart(ref text) => {
                write!(f, "{} has bits set beyond its mask length", text)
            }
            Self::NotHostAddress(ref text) => {
                write!(f, "{} is a prefix, not a single address", text)
            }
            Self::AddressFamilyMismatch {
                ref prefix,
                ref child,
            } => write!(
                f,
                "{} cannot be placed within {}: the address families differ",
                child, prefix,
            ),
            Self::NotMoreSpecific {
                ref prefix,
                ref child,
            } => write!(f, "{} is not strictly within {}", child, prefix),
            Self::StubViolation {
                ref prefix,
                ref child,
            } => write!(
                f,
                "{} cannot be placed within {}, which is a stub and may only hold addresses",
                child, prefix,
            ),
            Self::NotStub(ref prefix) => write!(f, "{} is not a stub prefix", prefix),
            Self::PlenMismatch {
                ref prefix,
                ref child,
                plen,
            } => write!(
                f,
                "{} cannot be placed within {}, whose children must be /{}",
                child, prefix, plen,
            ),
            Self::InvalidPlen { ref prefix, plen } => {
                write!(f, "/{} is not a valid child length for {}", plen, prefix)
            }
            Self::Overlap {
                ref new,
                ref existing,
                ref first,
            } => write!(
                f,
                "{} overlaps {} (defined at {})",
                new, existing, first,
            ),
            Self::UnknownPrefix(ref prefix) => {
                write!(f, "{} is not in the address map", prefix)
            }
            Self::AlreadyCanonical {
                ref address,
                ref existing,
                ref host,
            } => write!(
                f,
                "cannot make {} the canonical host of {}: {} already is",
                host, address, existing,
            ),
            Self::Reserved {
                ref address,
                ref host,
            } => write!(
                f,
                "cannot make {} the canonical host of {}: the address is reserved",
                host, address,
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
